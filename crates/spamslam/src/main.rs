//! `SpamSlam` - find the companies that email you and ask them to let go.
//!
//! Scans a Gmail inbox for signup and marketing mail, groups senders by
//! domain, and generates unsubscribe steps or GDPR deletion requests.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod app;
mod cli;
mod credentials;
mod render;
mod settings;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "spamslam=debug,spamslam_core=debug,spamslam_google=debug"
    } else {
        "spamslam=info,spamslam_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(verbose = cli.verbose, "Starting SpamSlam");

    let app = App::bootstrap(cli.ai_url).await?;
    app.run(cli.command).await
}
