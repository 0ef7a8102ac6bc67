//! Shared response handling.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Decodes a JSON response, turning non-success statuses into
/// [`Error::Status`] with the body text attached.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %body, "Request failed");
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
