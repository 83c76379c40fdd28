//! Replayable request bodies.
//!
//! A transport body can be consumed only once, but signature verification
//! has to read it before the handler does. [`cache_body`] drains the body
//! into memory once, stores the bytes in the request extensions as a
//! [`CachedBody`], and puts an in-memory copy back as the request body.
//!
//! Later stages that need the raw bytes go through the [`ReplayableBody`]
//! capability instead of re-reading the body stream. Cloning the cached
//! [`Bytes`] is a reference-count bump, so the body can be replayed any
//! number of times during the request.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

/// Request body bytes held in memory for the lifetime of the request.
#[derive(Debug, Clone, Default)]
pub struct CachedBody(Bytes);

impl CachedBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// A fresh body that yields the cached bytes.
    pub fn replay(&self) -> Body {
        Body::from(self.0.clone())
    }
}

/// Capability of a request whose body has been cached and can be read again.
pub trait ReplayableBody {
    /// The cached body, if this request went through [`cache_body`].
    fn cached_body(&self) -> Option<&CachedBody>;
}

impl<B> ReplayableBody for Request<B> {
    fn cached_body(&self) -> Option<&CachedBody> {
        self.extensions().get::<CachedBody>()
    }
}

/// Reasons the body could not be cached.
#[derive(Error, Debug)]
pub enum BodyCacheError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(String),
}

impl IntoResponse for BodyCacheError {
    fn into_response(self) -> Response {
        match self {
            Self::TooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            }
            Self::Read(_) => (StatusCode::BAD_REQUEST, "Failed to read request body").into_response(),
        }
    }
}

/// Drain the request body into memory, at most `limit` bytes.
///
/// Returns a request whose body replays the cached bytes and whose
/// extensions carry the [`CachedBody`].
///
/// # Errors
///
/// `BodyCacheError::TooLarge` when the body exceeds `limit`, and
/// `BodyCacheError::Read` when the transport fails mid-read.
pub async fn cache_body(req: Request<Body>, limit: usize) -> Result<Request<Body>, BodyCacheError> {
    let (mut parts, body) = req.into_parts();

    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                BodyCacheError::TooLarge { limit }
            } else {
                BodyCacheError::Read(e.to_string())
            }
        })?
        .to_bytes();

    let cached = CachedBody::new(bytes);
    let body = cached.replay();
    parts.extensions.insert(cached);

    Ok(Request::from_parts(parts, body))
}
