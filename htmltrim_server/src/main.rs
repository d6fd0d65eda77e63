use std::sync::Arc;

use htmltrim_common::{error::Result, serve, state::Config};
use scorched::{logf, LogData, LogExpect, LogImportance};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    logf!(
        Info,
        "Loading config from file: {}",
        confy::get_configuration_file_path("htmltrim", None)?.display()
    );

    let config: Arc<Config> = Arc::new(confy::load("htmltrim", None)?);

    logf!(
        Info,
        "Serving {} (trimming {})",
        config.root.display(),
        if config.trim_enabled { "on" } else { "off" }
    );

    serve(config, shutdown_signal())
        .await
        .log_expect(LogImportance::Error, "Server stopped with an error");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
