//! Request signing primitives shared by the client and the server.
//!
//! - [`canonical`]: deterministic string-to-sign construction
//! - [`signer`]: HMAC-SHA256 over the canonical bytes, base64 output
//! - [`timestamp`]: freshness window for `X-TIMESTAMP`

pub mod canonical;
pub mod signer;
pub mod timestamp;

pub use canonical::{CanonicalString, SigningContext, canonicalize, reconstruct_query};
pub use signer::{SignedHeaders, Signature, Signer, sign};
pub use timestamp::{
    Clock, FixedClock, MAX_FUTURE_SKEW, MAX_PAST_SKEW, SharedClock, SystemClock, TimestampError,
    TimestampValidator, current_timestamp,
};

/// Header carrying the request timestamp (milliseconds since the Unix epoch).
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the base64 HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-hmac-signature";
