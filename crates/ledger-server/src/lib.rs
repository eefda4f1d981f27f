pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::Router;
use ledger_core::config::AppConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    // Resource routes live under the configured base path.
    let api = Router::new()
        .merge(routes::lookup_routes())
        .merge(routes::session_routes())
        .merge(routes::stats_routes());

    let base = config.server.base_path.trim_matches('/');
    let mounted = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&format!("/{}", base), api)
    };

    let mut app = mounted
        .merge(routes::health_routes())
        .fallback(routes::not_found)
        .with_state(state.clone());

    // Middleware stack.
    app = app.layer(TraceLayer::new_for_http());

    if config.server.cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the HTTP server.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(config.clone())?;
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Starting server on {} (routes under {:?})",
        addr,
        config.server.base_path
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
