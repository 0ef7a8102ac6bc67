//! # spamslam-google
//!
//! HTTP gateways for `SpamSlam`:
//!
//! - [`GmailClient`] - candidate listing, header fetch, draft creation and
//!   the Google profile lookup, all with a bearer access token
//! - [`OpenAiProxy`] - single-turn generation through an OpenAI-compatible
//!   chat-completions proxy
//!
//! Both implement the gateway traits from `spamslam-core`.
//!
//! ```ignore
//! use spamslam_google::{GmailClient, OpenAiProxy};
//!
//! let gmail = GmailClient::new(access_token)?;
//! let identity = gmail.fetch_identity().await?;
//! let ai = OpenAiProxy::new("https://my-proxy.example")?.with_model("gpt-4o-mini");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod draft;
mod error;
pub mod gmail;
mod http;
pub mod openai;

pub use error::{Error, Result};
pub use gmail::GmailClient;
pub use openai::OpenAiProxy;
