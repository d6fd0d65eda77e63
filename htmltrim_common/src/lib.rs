pub mod api;
pub mod error;
pub mod interceptor;
pub mod rewriting;
pub mod state;

use std::{future::Future, sync::Arc};

use axum::Router;
use error::Result;
use interceptor::{TrimLayer, TrimSwitch};
use rewriting::html::WhitespaceRewriter;
use scorched::{logf, LogData, LogImportance};
use state::{APIState, Config};
use tower_http::services::ServeDir;

pub use interceptor::{wrap, TrimWriter};
pub use rewriting::html::remove;

/// Builds the application: the API under `/api`, and the files of `config.root` everywhere
/// else, with HTML pages trimmed.
pub fn app(config: Arc<Config>) -> Router {
    let switch = TrimSwitch::new(config.trim_enabled);
    let rewriter = Arc::new(WhitespaceRewriter::default());

    let apistate = APIState {
        config: config.clone(),
        switch: switch.clone(),
        rewriter: rewriter.clone(),
    };

    let apirouter = api::service::service(Arc::new(apistate));

    let siterouter = Router::new()
        .fallback_service(ServeDir::new(&config.root))
        .layer(TrimLayer::with_rewriter(rewriter, switch).max_body_size(config.trim_max_body));

    Router::new().nest("/api", apirouter).merge(siterouter)
}

pub async fn serve<F>(config: Arc<Config>, graceful_shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = app(config.clone());

    let listener = tokio::net::TcpListener::bind(config.host).await?;

    logf!(Info, "Listening on {}", config.host);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
