//! Simon binary entrypoint wiring configuration, the score file and the console session.

use anyhow::Context;
use tokio::io::{self, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simon::{
    config::AppConfig,
    dao::score_store::JsonFileStore,
    services::{score_service::ScoreBoard, session::Session},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = JsonFileStore::new(&config.scores.path);
    info!(path = %store.path().display(), "using score file");
    let board = ScoreBoard::load(store, config.scores.confirm_above);

    let mut session = Session::new(&config, board, std::io::stdout());
    session
        .run(BufReader::new(io::stdin()), shutdown_signal())
        .await
        .context("reading console input")?;

    info!("bye");
    Ok(())
}

/// Log to stderr so diagnostics never interleave with the board on stdout.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
