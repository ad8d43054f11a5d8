//! HTTP layer: REST handlers, DTOs, OpenAPI document and router assembly.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "stranger-relay",
        description = "Matchmaking and signaling relay for one-to-one video chat"
    ),
    paths(
        handlers::system::root_handler,
        handlers::system::health_handler,
        handlers::stats::stats_handler,
        handlers::stats::connection_status_handler,
    ),
    components(schemas(
        dto::StatsResponse,
        dto::ConnectionStatusResponse,
        dto::ConnectionState,
        dto::ConnectionRole,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Banner and health"),
        (name = "Stats", description = "Live matchmaking counters"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}

/// Builds the complete application: REST, `/ws`, docs, tracing and CORS.
pub fn build_app(state: AppState, client_url: &str) -> Router {
    let router = Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(client_url))
        .with_state(state)
}

/// CORS policy for the configured client origin. `*` allows any origin.
fn cors_layer(client_url: &str) -> CorsLayer {
    if client_url == "*" {
        return CorsLayer::permissive();
    }
    match client_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!(client_url, "invalid CLIENT_URL, cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}
