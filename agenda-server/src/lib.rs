//! HTTP server for agenda.
//!
//! Serves the booking pages and the small JSON API in front of the
//! calendar provider.

pub mod backend;
pub mod html;
pub mod routes;
pub mod state;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use crate::backend::CalendarBackend;
pub use crate::state::AppState;

/// Build the application router.
///
/// CORS applies to the JSON API only; the pages are same-origin.
pub fn app(state: AppState) -> Result<Router> {
    let origin: HeaderValue = state
        .config
        .server
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid allowed origin: {}", state.config.server.allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .merge(routes::api::router().layer(cors))
        .merge(routes::pages::router())
        .merge(routes::health::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
