//! # HMAC Sample Application
//!
//! HMAC-SHA256 request signing for an Axum service, with both halves of the
//! protocol:
//!
//! - **Server**: a Tower layer that buffers the body, checks `X-TIMESTAMP`
//!   freshness, recomputes the signature and rejects with `401` on mismatch
//! - **Client**: [`HmacApiClient`] signs outgoing requests the same way
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS → HMAC Auth)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (service info, api docs, demo sum)                │
//! └─────────────────────────────────────────────────────────────┘
//!                ▲ verify                       sign ▲
//! ┌──────────────┴──────────────────────────────────┴───────────┐
//! │  signing: canonical string → HMAC-SHA256 → base64           │
//! │           timestamp window [now - 5min, now + 1min]         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Canonical String
//!
//! ```text
//! <METHOD>\n<PATH>\n<QUERY-OR-EMPTY>\n[<BODY>\n]<TIMESTAMP>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hmac_sample::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Security Configuration
//!
//! ```bash
//! HMAC_SECRET=your-shared-secret cargo run
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod signing;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use client::{ClientError, HmacApiClient};
pub use config::Config;
pub use error::{AppError, AppResult, SigningError};
pub use middleware::{AuthRejection, HmacAuth, HmacAuthenticator, ValidationOutcome};
pub use routes::build_router;
pub use signing::{SignedHeaders, Signature, Signer, SigningContext};
pub use state::AppState;
