//! HMAC request authentication middleware.
//!
//! Every request outside the documentation/root exemptions must carry:
//!
//! - `X-TIMESTAMP`: milliseconds since the Unix epoch, within
//!   `[now - 5min, now + 1min]`
//! - `X-HMAC-SIGNATURE`: base64 HMAC-SHA256 over the canonical request
//!   string (see [`crate::signing::canonical`])
//!
//! # Verification Order
//!
//! ```text
//! exempt path? ──yes──► handler
//!      │no
//!      ▼
//! cache body ──fail──► 400 / 413
//!      ▼
//! X-TIMESTAMP present?        ──no──► 401 "Missing timestamp header"
//! timestamp inside window?    ──no──► 401 "Expired or invalid timestamp"
//! X-HMAC-SIGNATURE present?   ──no──► 401 "Missing HMAC signature header"
//! signature == recomputed?    ──no──► 401 "Invalid HMAC signature"
//!      │yes
//!      ▼
//!   handler (body replayable)
//! ```
//!
//! Rejections are plain text. The status code is 401 for every reason; only
//! the message differs.
//!
//! # Replay
//!
//! There is no nonce store. A captured request verifies again until its
//! timestamp leaves the window.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::body_cache::{ReplayableBody, cache_body};
use crate::metrics;
use crate::signing::{
    SIGNATURE_HEADER, SharedClock, Signer, SigningContext, SystemClock, TIMESTAMP_HEADER,
    TimestampError, TimestampValidator, reconstruct_query,
};

/// Path fragments that bypass authentication (documentation assets).
const EXEMPT_PATH_FRAGMENTS: [&str; 3] = ["/swagger-ui", "/api-docs", "/favicon.ico"];

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingTimestamp,
    ExpiredOrInvalidTimestamp(TimestampError),
    MissingSignature,
    SignatureMismatch,
}

impl AuthRejection {
    /// Client-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingTimestamp => "Missing timestamp header",
            Self::ExpiredOrInvalidTimestamp(_) => "Expired or invalid timestamp",
            Self::MissingSignature => "Missing HMAC signature header",
            Self::SignatureMismatch => "Invalid HMAC signature",
        }
    }

    /// Label used for the `outcome` metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::MissingTimestamp => "missing_timestamp",
            Self::ExpiredOrInvalidTimestamp(_) => "invalid_timestamp",
            Self::MissingSignature => "missing_signature",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response<Body> {
        (StatusCode::UNAUTHORIZED, self.message()).into_response()
    }
}

/// Result of verifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Authorized,
    Unauthorized(AuthRejection),
}

impl ValidationOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Query parameters already decoded by an earlier stage.
///
/// Only consulted when the request URI carries no raw query; the query line
/// is then rebuilt with [`reconstruct_query`].
#[derive(Debug, Clone, Default)]
pub struct DecodedQuery(pub Vec<(String, String)>);

/// Server-side signature verifier.
///
/// Holds the shared secret (as a keyed [`Signer`]), the timestamp window and
/// the clock. Immutable once built; shared across requests behind an `Arc`.
#[derive(Clone)]
pub struct HmacAuthenticator {
    signer: Signer,
    validator: TimestampValidator,
    clock: SharedClock,
}

impl HmacAuthenticator {
    pub fn new(signer: Signer) -> Self {
        Self {
            signer,
            validator: TimestampValidator::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for timestamp checks.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Verify a request described by `ctx` against the supplied signature.
    ///
    /// `ctx.timestamp` is the raw `X-TIMESTAMP` value; blank counts as absent.
    pub fn verify(&self, ctx: &SigningContext, signature: Option<&str>) -> ValidationOutcome {
        let Some(timestamp) = ctx.timestamp.as_deref().filter(|t| has_text(t)) else {
            return ValidationOutcome::Unauthorized(AuthRejection::MissingTimestamp);
        };

        if let Err(cause) = self.validator.check(timestamp, self.clock.now()) {
            return ValidationOutcome::Unauthorized(AuthRejection::ExpiredOrInvalidTimestamp(
                cause,
            ));
        }

        let Some(provided) = signature.filter(|s| has_text(s)) else {
            return ValidationOutcome::Unauthorized(AuthRejection::MissingSignature);
        };

        if self.signer.sign_context(ctx).matches(provided) {
            ValidationOutcome::Authorized
        } else {
            ValidationOutcome::Unauthorized(AuthRejection::SignatureMismatch)
        }
    }

    /// Verify an HTTP request. The body is taken from its [`ReplayableBody`]
    /// cache; a request without one is treated as having an empty body.
    pub fn verify_request<B>(&self, req: &Request<B>) -> ValidationOutcome {
        let ctx = signing_context(req);
        self.verify(&ctx, header_str(req, SIGNATURE_HEADER))
    }
}

/// Build the signing context for an inbound request.
pub fn signing_context<B>(req: &Request<B>) -> SigningContext {
    let query = match req.uri().query() {
        Some(raw) => raw.to_string(),
        None => req
            .extensions()
            .get::<DecodedQuery>()
            .map(|q| reconstruct_query(q.0.iter().map(|(k, v)| (k, v))))
            .unwrap_or_default(),
    };

    let mut ctx = SigningContext::new(req.method().as_str(), req.uri().path()).with_query(query);
    if let Some(cached) = req.cached_body() {
        ctx = ctx.with_body(cached.bytes().clone());
    }
    if let Some(timestamp) = header_str(req, TIMESTAMP_HEADER) {
        ctx = ctx.with_timestamp(timestamp);
    }
    ctx
}

/// Whether `path` skips authentication.
///
/// Fixed list: documentation UI and API document paths, the root, and the favicon.
pub fn is_exempt_path(path: &str) -> bool {
    path == "/" || EXEMPT_PATH_FRAGMENTS.iter().any(|f| path.contains(f))
}

/// HMAC authentication layer.
#[derive(Clone)]
pub struct HmacAuth {
    authenticator: Arc<HmacAuthenticator>,
    max_body_size: usize,
}

impl HmacAuth {
    /// Create a layer that buffers at most `max_body_size` bytes per request.
    pub fn new(authenticator: Arc<HmacAuthenticator>, max_body_size: usize) -> Self {
        Self {
            authenticator,
            max_body_size,
        }
    }
}

impl<S> Layer<S> for HmacAuth {
    type Service = HmacAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HmacAuthService {
            inner,
            authenticator: self.authenticator.clone(),
            max_body_size: self.max_body_size,
        }
    }
}

/// HMAC authentication service wrapper.
#[derive(Clone)]
pub struct HmacAuthService<S> {
    inner: S,
    authenticator: Arc<HmacAuthenticator>,
    max_body_size: usize,
}

impl<S> Service<Request<Body>> for HmacAuthService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        let max_body_size = self.max_body_size;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_exempt_path(req.uri().path()) {
                debug!(path = %req.uri().path(), "Bypassing HMAC auth for exempt path");
                metrics::record_auth_outcome("exempt");
                return inner.call(req).await;
            }

            let started = Instant::now();

            let req = match cache_body(req, max_body_size).await {
                Ok(req) => req,
                Err(e) => {
                    warn!(error = %e, "Could not buffer request body for signing");
                    return Ok(e.into_response());
                }
            };

            let outcome = authenticator.verify_request(&req);
            metrics::record_auth_duration(started.elapsed().as_secs_f64());

            match outcome {
                ValidationOutcome::Authorized => {
                    debug!(
                        method = %req.method(),
                        path = %req.uri().path(),
                        "HMAC authentication successful"
                    );
                    metrics::record_auth_outcome("authorized");
                    inner.call(req).await
                }
                ValidationOutcome::Unauthorized(rejection) => {
                    match rejection {
                        AuthRejection::ExpiredOrInvalidTimestamp(cause) => warn!(
                            method = %req.method(),
                            path = %req.uri().path(),
                            cause = %cause,
                            "Rejected request timestamp"
                        ),
                        _ => warn!(
                            method = %req.method(),
                            path = %req.uri().path(),
                            reason = rejection.metric_label(),
                            "HMAC authentication failed"
                        ),
                    }
                    metrics::record_auth_outcome(rejection.metric_label());
                    Ok(rejection.into_response())
                }
            }
        })
    }
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};

    use super::*;
    use crate::middleware::body_cache::CachedBody;
    use crate::signing::{FixedClock, MAX_FUTURE_SKEW, MAX_PAST_SKEW};

    const SECRET: &str = "test-secret";

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn authenticator() -> HmacAuthenticator {
        HmacAuthenticator::new(Signer::new(SECRET).unwrap()).with_clock(Arc::new(FixedClock(now())))
    }

    fn sum_context(timestamp: &str) -> SigningContext {
        SigningContext::new("GET", "/api/demo/sum")
            .with_query("a=5&b=3")
            .with_timestamp(timestamp)
    }

    fn signed(ctx: &SigningContext, secret: &str) -> String {
        Signer::new(secret).unwrap().sign_context(ctx).to_string()
    }

    fn ts(delta: TimeDelta) -> String {
        (now() + delta).timestamp_millis().to_string()
    }

    #[test]
    fn test_exempt_paths() {
        assert!(is_exempt_path("/"));
        assert!(is_exempt_path("/swagger-ui/index.html"));
        assert!(is_exempt_path("/v3/api-docs"));
        assert!(is_exempt_path("/v3/api-docs/swagger-config"));
        assert!(is_exempt_path("/favicon.ico"));

        assert!(!is_exempt_path("/api/demo/sum"));
        assert!(!is_exempt_path("/api"));
        assert!(!is_exempt_path(""));
    }

    #[test]
    fn test_valid_signature_authorized() {
        let ctx = sum_context(&ts(TimeDelta::zero()));
        let outcome = authenticator().verify(&ctx, Some(&signed(&ctx, SECRET)));
        assert_eq!(outcome, ValidationOutcome::Authorized);
    }

    #[test]
    fn test_wrong_secret_mismatch() {
        let ctx = sum_context(&ts(TimeDelta::zero()));
        let outcome = authenticator().verify(&ctx, Some(&signed(&ctx, "other-secret")));
        assert_eq!(
            outcome,
            ValidationOutcome::Unauthorized(AuthRejection::SignatureMismatch)
        );
    }

    #[test]
    fn test_missing_timestamp_checked_first() {
        let ctx = SigningContext::new("GET", "/api/demo/sum").with_query("a=5&b=3");
        assert_eq!(
            authenticator().verify(&ctx, None),
            ValidationOutcome::Unauthorized(AuthRejection::MissingTimestamp)
        );

        let blank = ctx.with_timestamp("   ");
        assert_eq!(
            authenticator().verify(&blank, Some("sig")),
            ValidationOutcome::Unauthorized(AuthRejection::MissingTimestamp)
        );
    }

    #[test]
    fn test_timestamp_checked_before_signature() {
        let ctx = sum_context("not-a-number");
        assert_eq!(
            authenticator().verify(&ctx, None),
            ValidationOutcome::Unauthorized(AuthRejection::ExpiredOrInvalidTimestamp(
                TimestampError::Malformed
            ))
        );
    }

    #[test]
    fn test_missing_and_blank_signature() {
        let ctx = sum_context(&ts(TimeDelta::zero()));
        for sig in [None, Some(""), Some("  ")] {
            assert_eq!(
                authenticator().verify(&ctx, sig),
                ValidationOutcome::Unauthorized(AuthRejection::MissingSignature)
            );
        }
    }

    #[test]
    fn test_timestamp_window_boundaries() {
        let one_ms = TimeDelta::milliseconds(1);
        let cases = [
            (-MAX_PAST_SKEW + one_ms, None),
            (-MAX_PAST_SKEW - one_ms, Some(TimestampError::Expired)),
            (MAX_FUTURE_SKEW - one_ms, None),
            (MAX_FUTURE_SKEW + one_ms, Some(TimestampError::Future)),
        ];

        for (delta, expected) in cases {
            let ctx = sum_context(&ts(delta));
            let outcome = authenticator().verify(&ctx, Some(&signed(&ctx, SECRET)));
            let expected = match expected {
                None => ValidationOutcome::Authorized,
                Some(cause) => ValidationOutcome::Unauthorized(
                    AuthRejection::ExpiredOrInvalidTimestamp(cause),
                ),
            };
            assert_eq!(outcome, expected, "delta {delta}");
        }
    }

    #[test]
    fn test_signing_context_from_request() {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/demo/sum?x=1")
            .header("X-TIMESTAMP", "123")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(CachedBody::new("{}"));

        let ctx = signing_context(&req);
        assert_eq!(ctx.method, "POST");
        assert_eq!(ctx.path, "/api/demo/sum");
        assert_eq!(ctx.query, "x=1");
        assert_eq!(ctx.body.as_ref(), b"{}");
        assert_eq!(ctx.timestamp.as_deref(), Some("123"));
    }

    #[test]
    fn test_signing_context_reconstructs_decoded_query() {
        let mut req = Request::builder()
            .uri("/api/demo/sum")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(DecodedQuery(vec![
            ("b".to_string(), "3".to_string()),
            ("a".to_string(), "5".to_string()),
            ("b".to_string(), "7".to_string()),
        ]));

        assert_eq!(signing_context(&req).query, "b=3&a=5");
    }

    #[test]
    fn test_raw_query_wins_over_decoded() {
        let mut req = Request::builder()
            .uri("/api/demo/sum?a=5&b=3")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(DecodedQuery(vec![("z".to_string(), "0".to_string())]));

        assert_eq!(signing_context(&req).query, "a=5&b=3");
    }

    #[test]
    fn test_verify_request_uses_headers() {
        let timestamp = ts(TimeDelta::zero());
        let ctx = sum_context(&timestamp);
        let req = Request::builder()
            .uri("/api/demo/sum?a=5&b=3")
            .header(TIMESTAMP_HEADER, &timestamp)
            .header(SIGNATURE_HEADER, signed(&ctx, SECRET))
            .body(Body::empty())
            .unwrap();

        assert!(authenticator().verify_request(&req).is_authorized());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            AuthRejection::MissingTimestamp.message(),
            "Missing timestamp header"
        );
        assert_eq!(
            AuthRejection::ExpiredOrInvalidTimestamp(TimestampError::Future).message(),
            "Expired or invalid timestamp"
        );
        assert_eq!(
            AuthRejection::MissingSignature.message(),
            "Missing HMAC signature header"
        );
        assert_eq!(
            AuthRejection::SignatureMismatch.message(),
            "Invalid HMAC signature"
        );
        assert_eq!(
            AuthRejection::SignatureMismatch.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
