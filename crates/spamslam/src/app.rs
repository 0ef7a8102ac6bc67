//! Command handlers wired to the session, the snapshot store and the
//! gateways.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use spamslam_core::classifier::normalize_domain;
use spamslam_core::{
    ActionKind, Error as CoreError, Identity, Session, SnapshotRepository, actions, scan,
};
use spamslam_google::{GmailClient, OpenAiProxy};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cli::{Command, ConfigAction, ViewArgs};
use crate::credentials;
use crate::render;
use crate::settings::{self, Settings};

/// Everything one invocation needs.
pub struct App {
    settings: Settings,
    settings_path: PathBuf,
    snapshots: SnapshotRepository,
    session: Mutex<Session>,
    gmail: Option<Arc<GmailClient>>,
}

impl App {
    /// Loads settings, opens the snapshot store and restores the connected
    /// account's inventory. Without a stored identity and token the session
    /// starts in guest mode.
    pub async fn bootstrap(ai_url: Option<String>) -> Result<Self> {
        let settings_path = settings::settings_path();
        let mut settings = settings::load(&settings_path).await?;
        if let Some(url) = ai_url {
            settings.ai_proxy_url = url;
        }

        let database_path = settings::database_path();
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let snapshots = SnapshotRepository::new(&database_path.to_string_lossy())
            .await
            .context("Failed to open the inventory database")?;

        let mut app = Self {
            settings,
            settings_path,
            snapshots,
            session: Mutex::new(Session::guest()),
            gmail: None,
        };

        if let Some(identity) = app.settings.active_identity.clone() {
            match credentials::get_access_token(&identity.email) {
                Ok(Some(token)) => app.sign_in(identity, &token).await?,
                Ok(None) => warn!(email = %identity.email, "No stored token, staying in guest mode"),
                Err(e) => warn!(email = %identity.email, error = %e, "Keyring unavailable, staying in guest mode"),
            }
        }

        Ok(app)
    }

    async fn sign_in(&mut self, identity: Identity, token: &str) -> Result<()> {
        let snapshot = self.snapshots.load(&identity.storage_key()).await?;
        self.gmail = Some(Arc::new(GmailClient::new(token)?));
        self.session.lock().await.sign_in(identity, snapshot);
        Ok(())
    }

    /// Writes the current inventory for the connected identity.
    async fn persist(&self) -> Result<()> {
        let session = self.session.lock().await;
        if let Some(identity) = session.identity() {
            self.snapshots
                .save(&identity.storage_key(), &session.snapshot())
                .await
                .context("Failed to save the inventory")?;
        }
        Ok(())
    }

    fn gmail(&self) -> Result<&Arc<GmailClient>> {
        self.gmail.as_ref().ok_or_else(|| CoreError::NotSignedIn.into())
    }

    fn ai(&self) -> Result<OpenAiProxy> {
        Ok(OpenAiProxy::new(&self.settings.ai_proxy_url)
            .with_context(|| format!("Invalid AI proxy URL {}", self.settings.ai_proxy_url))?
            .with_model(self.settings.ai_model.clone())
            .with_temperature(self.settings.ai_temperature))
    }

    /// Runs one command.
    pub async fn run(mut self, command: Command) -> Result<()> {
        match command {
            Command::Connect { token } => self.connect(&token).await,
            Command::Disconnect => self.disconnect().await,
            Command::Whoami => {
                let session = self.session.lock().await;
                println!("{}", render::summary(session.identity(), &session.summary()));
                Ok(())
            }
            Command::Scan => self.scan().await,
            Command::List(view) => self.list(&view).await,
            Command::Show { domain } => {
                let domain = normalize_domain(&domain);
                let session = self.session.lock().await;
                session.require_identity()?;
                let record = session
                    .record(&domain)
                    .ok_or_else(|| CoreError::UnknownDomain(domain.clone()))?;
                println!("{}", render::record_details(record));
                Ok(())
            }
            Command::Select { domains } => self.set_selected(&normalize_all(domains), true).await,
            Command::Deselect { domains } => self.set_selected(&normalize_all(domains), false).await,
            Command::SelectPage { view, clear } => self.select_page(&view, !clear).await,
            Command::Unsubscribe { domains } => {
                self.action(ActionKind::Unsubscribe, normalize_all(domains)).await
            }
            Command::RequestDeletion { domains } => {
                self.action(ActionKind::Deletion, normalize_all(domains)).await
            }
            Command::Draft { domain } => self.draft(&normalize_domain(&domain)).await,
            Command::Config { action } => self.config(action).await,
        }
    }

    async fn connect(&mut self, token: &str) -> Result<()> {
        let client = GmailClient::new(token)?;
        let identity = client
            .fetch_identity()
            .await
            .context("Could not load your Google profile; still in guest mode")?;

        credentials::store_access_token(&identity.email, token)
            .context("Failed to store the access token")?;
        self.settings.active_identity = Some(identity.clone());
        settings::save(&self.settings_path, &self.settings).await?;

        self.sign_in(identity, token).await?;
        let session = self.session.lock().await;
        info!(email = ?session.identity().map(|i| &i.email), "Connected");
        println!("{}", render::summary(session.identity(), &session.summary()));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(identity) = self.settings.active_identity.take() else {
            println!("Not connected.");
            return Ok(());
        };

        if let Err(e) = credentials::delete_access_token(&identity.email) {
            warn!(error = %e, "Failed to delete the access token");
        }
        self.snapshots.delete(&identity.storage_key()).await?;
        settings::save(&self.settings_path, &self.settings).await?;

        self.session.lock().await.sign_out();
        self.gmail = None;
        println!("Disconnected {}.", identity.email);
        Ok(())
    }

    async fn scan(&self) -> Result<()> {
        let gmail = self.gmail()?;
        let policy = self.settings.scan_policy();

        let report = scan::run(gmail, &self.session, &policy, |progress| {
            println!("{}", render::progress(progress));
        })
        .await
        .context("Scan failed")?;

        self.persist().await?;
        println!("{}", render::scan_report(&report));
        Ok(())
    }

    async fn apply_view(&self, view: &ViewArgs) {
        let mut session = self.session.lock().await;
        if let Some(query) = &view.query {
            session.set_query(query.clone());
        }
        if let Some(sort) = view.sort {
            session.set_sort(sort);
        }
        if let Some(page) = view.page {
            session.set_page(page);
        }
    }

    async fn list(&self, view: &ViewArgs) -> Result<()> {
        self.apply_view(view).await;
        let mut session = self.session.lock().await;
        let header = render::summary(session.identity(), &session.summary());
        println!("{header}\n");
        println!("{}", render::grid(&session.render()));
        Ok(())
    }

    async fn set_selected(&self, domains: &[String], selected: bool) -> Result<()> {
        {
            let mut session = self.session.lock().await;
            for domain in domains {
                session.set_selected(domain, selected)?;
            }
        }
        self.persist().await?;
        println!("{} {} companies.", if selected { "Selected" } else { "Deselected" }, domains.len());
        Ok(())
    }

    async fn select_page(&self, view: &ViewArgs, selected: bool) -> Result<()> {
        self.apply_view(view).await;
        let affected = self.session.lock().await.select_all_visible(selected)?;
        self.persist().await?;
        println!(
            "{} {} companies on this page.",
            if selected { "Selected" } else { "Deselected" },
            affected.len()
        );
        Ok(())
    }

    async fn action(&self, kind: ActionKind, domains: Vec<String>) -> Result<()> {
        let domains = if domains.is_empty() {
            let session = self.session.lock().await;
            session.require_identity()?;
            session.selected_domains()
        } else {
            domains
        };

        let ai = self.ai()?;
        let report =
            actions::run_action(&ai, &self.session, kind, &domains, &self.settings.action_policy())
                .await?;

        self.persist().await?;
        println!("{}", render::action_report(&report));
        Ok(())
    }

    async fn draft(&self, domain: &str) -> Result<()> {
        let gmail = self.gmail()?;
        let receipt = actions::create_draft(gmail.as_ref(), &self.session, domain).await?;
        println!("Draft created ({}). Review and send it from Gmail.", receipt.draft_id);
        Ok(())
    }

    async fn config(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&self.settings)?);
            }
            ConfigAction::Path => println!("{}", self.settings_path.display()),
            ConfigAction::Init => {
                if self.settings_path.exists() {
                    bail!("{} already exists", self.settings_path.display());
                }
                settings::save(&self.settings_path, &Settings::default()).await?;
                println!("Wrote {}", self.settings_path.display());
            }
        }
        Ok(())
    }
}

/// Normalizes domains typed by the user the same way scanned senders are.
fn normalize_all(domains: Vec<String>) -> Vec<String> {
    domains.into_iter().map(|domain| normalize_domain(&domain)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_user_domains() {
        let domains = vec!["WWW.Netflix.com".to_string(), " spotify.com ".to_string()];
        assert_eq!(normalize_all(domains), ["netflix.com", "spotify.com"]);
    }

    #[test]
    fn test_normalized_domain_finds_record() {
        use spamslam_core::RawMessage;
        use spamslam_core::classifier::classify;

        let mut session = Session::signed_in(Identity::new("me@gmail.com"), None);
        let generation = session.aggregator().generation();
        session.attribute(generation, &classify(&RawMessage::new("info@netflix.com", "Hi", None)));

        assert!(session.record("WWW.Netflix.com").is_none());
        assert!(session.record(&normalize_domain("WWW.Netflix.com")).is_some());
    }
}
