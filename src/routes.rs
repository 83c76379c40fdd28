//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Sets/propagates X-Request-Id
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    HMAC Auth     │ ← 401 if timestamp/signature invalid
//! └────────┬─────────┘   (bypassed for /, docs, favicon)
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `GET /` - Service info (no signature required)
//! - `GET /v3/api-docs` - OpenAPI document (no signature required)
//! - `GET /api/demo/sum?a=&b=` - Signed query
//! - `POST /api/demo/sum` - Signed JSON body

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::middleware::HmacAuth;
use crate::state::AppState;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.uses_default_secret() {
        warn!("HMAC_SECRET not set; using the insecure development default");
    }

    let cors = build_cors_layer(&config.cors_allowed_origins);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router = Router::new()
        .route("/", get(handlers::service_info))
        .route(handlers::API_DOCS_PATH, get(handlers::api_docs))
        .route(
            "/api/demo/sum",
            get(handlers::sum).post(handlers::sum_post),
        );

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Body limit for extractors (the auth layer enforces its own limit)
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. HMAC authentication
    info!(
        max_body_bytes = config.max_request_body_size,
        "HMAC authentication enabled"
    );
    router = router.layer(HmacAuth::new(
        state.authenticator.clone(),
        config.max_request_body_size,
    ));

    // 3. CORS
    router = router.layer(cors);

    // 4. Tracing
    router = router.layer(TraceLayer::new_for_http());

    // 5. Request ID (set before tracing, echoed on the response)
    router = router
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// `*` allows any origin; otherwise only the listed origins are allowed.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allow_any {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
