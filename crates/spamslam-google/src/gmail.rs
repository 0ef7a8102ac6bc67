//! Gmail REST client.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use spamslam_core::{
    CandidateQuery, DraftReceipt, GatewayResult, Identity, MailGateway, MessageId, OutgoingDraft,
    RawMessage,
};
use tracing::{debug, info};
use url::Url;

use crate::draft;
use crate::error::{Error, Result};
use crate::http::read_json;

/// Gmail API root for the signed-in user.
pub const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/";

/// Google profile endpoint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Largest page the list endpoint serves.
const MAX_PAGE_SIZE: u32 = 500;

/// Gmail client bound to one access token.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http_client: Client,
    api_url: Url,
    userinfo_url: Url,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageResource {
    internal_date: Option<String>,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct DraftResource {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl MessageResource {
    fn header(&self, name: &str) -> String {
        self.payload
            .as_ref()
            .and_then(|payload| {
                payload
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| h.value.clone())
            .unwrap_or_default()
    }

    fn into_raw(self) -> RawMessage {
        let internal_date = self
            .internal_date
            .as_deref()
            .and_then(parse_internal_date);
        RawMessage::new(self.header("From"), self.header("Subject"), internal_date)
    }
}

impl UserInfo {
    fn into_identity(self) -> Result<Identity> {
        let email = self
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| Error::InvalidResponse("profile has no email".into()))?;

        let mut identity = Identity::new(email);
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            identity = identity.with_display_name(name);
        }
        if let Some(picture) = self.picture.filter(|p| !p.is_empty()) {
            identity = identity.with_avatar_url(picture);
        }
        Ok(identity)
    }
}

/// Parses Gmail's `internalDate` (epoch milliseconds as a string).
fn parse_internal_date(value: &str) -> Option<DateTime<Utc>> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

impl GmailClient {
    /// Creates a client using the public Google endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in URLs fail to parse.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http_client: Client::new(),
            api_url: Url::parse(GMAIL_API_URL)?,
            userinfo_url: Url::parse(USERINFO_URL)?,
            access_token: access_token.into(),
        })
    }

    /// Points the client at different endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, api_url: Url, userinfo_url: Url) -> Self {
        self.api_url = api_url;
        self.userinfo_url = userinfo_url;
        self
    }

    /// Fetches the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the profile has no email.
    pub async fn fetch_identity(&self) -> Result<Identity> {
        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let info: UserInfo = read_json(response).await?;
        let identity = info.into_identity()?;
        info!(email = %identity.email, "Fetched profile");
        Ok(identity)
    }

    /// Lists message IDs matching `query`, following page tokens until
    /// `max_results` IDs are collected or the listing ends.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn list_messages(&self, query: &CandidateQuery) -> Result<Vec<MessageId>> {
        let search = query.to_search_string();
        let cap = usize::try_from(query.max_results).unwrap_or(usize::MAX);
        let mut ids: Vec<MessageId> = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < cap {
            let remaining = u32::try_from(cap - ids.len()).unwrap_or(u32::MAX);
            let mut url = self.api_url.join("messages")?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("q", &search);
                pairs.append_pair("maxResults", &remaining.min(MAX_PAGE_SIZE).to_string());
                if let Some(token) = &page_token {
                    pairs.append_pair("pageToken", token);
                }
            }

            let response = self
                .http_client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;
            let page: MessageList = read_json(response).await?;

            debug!(count = page.messages.len(), "Listed message page");
            ids.extend(page.messages.into_iter().map(|m| MessageId::new(m.id)));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        ids.truncate(cap);
        Ok(ids)
    }

    /// Fetches the `From` and `Subject` headers and delivery date of one
    /// message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_message(&self, id: &MessageId) -> Result<RawMessage> {
        let mut url = self.api_url.join(&format!("messages/{}", id.as_str()))?;
        url.query_pairs_mut()
            .append_pair("format", "metadata")
            .append_pair("metadataHeaders", "From")
            .append_pair("metadataHeaders", "Subject");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let resource: MessageResource = read_json(response).await?;
        Ok(resource.into_raw())
    }

    /// Creates a plain-text draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no draft ID comes back.
    pub async fn post_draft(&self, outgoing: &OutgoingDraft) -> Result<DraftReceipt> {
        let url = self.api_url.join("drafts")?;
        let body = json!({ "message": { "raw": draft::encode_raw(outgoing) } });

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let created: DraftResource = read_json(response).await?;

        let draft_id = created
            .id
            .ok_or_else(|| Error::InvalidResponse("draft has no id".into()))?;
        Ok(DraftReceipt { draft_id })
    }
}

impl MailGateway for GmailClient {
    async fn list_candidate_messages(
        &self,
        query: &CandidateQuery,
    ) -> GatewayResult<Vec<MessageId>> {
        Ok(self.list_messages(query).await?)
    }

    async fn fetch_message(&self, id: &MessageId) -> GatewayResult<RawMessage> {
        Ok(self.get_message(id).await?)
    }

    async fn create_draft(&self, draft: &OutgoingDraft) -> GatewayResult<DraftReceipt> {
        Ok(self.post_draft(draft).await?)
    }
}
