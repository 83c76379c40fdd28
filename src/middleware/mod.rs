//! HTTP middleware for request authentication.
//!
//! - **HMAC Authentication**: timestamp window plus HMAC-SHA256 signature check
//! - **Body Cache**: buffers the body once so both the verifier and the
//!   handler can read it
//!
//! # Architecture
//!
//! ```text
//! Request → Request ID → Trace → HMAC Auth → Handler → Response
//!                                   ↓
//!                         401 Unauthorized (plain text)
//! ```
//!
//! Signature comparison is constant-time.

pub mod auth;
pub mod body_cache;

pub use auth::{
    AuthRejection, DecodedQuery, HmacAuth, HmacAuthenticator, ValidationOutcome, is_exempt_path,
    signing_context,
};
pub use body_cache::{BodyCacheError, CachedBody, ReplayableBody, cache_body};
