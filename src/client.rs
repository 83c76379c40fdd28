//! Client that signs outgoing requests for the HMAC-protected API.
//!
//! The client builds the canonical string from exactly the bytes it puts on
//! the wire: the same method, path, query string and serialized body. Query
//! strings are produced with [`reconstruct_query`] so the server-side
//! fallback reconstruction yields the identical string.
//!
//! # Example
//!
//! ```rust,no_run
//! use hmac_sample::HmacApiClient;
//!
//! # async fn demo() -> Result<(), hmac_sample::ClientError> {
//! let client = HmacApiClient::new("http://localhost:8080", "YourSecretKeyHere123!")?;
//! let sum = client.sum(5, 3).await?;
//! assert_eq!(sum, 8);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::error::SigningError;
use crate::models::SumRequest;
use crate::signing::{
    SIGNATURE_HEADER, SharedClock, SignedHeaders, Signer, SigningContext, SystemClock,
    TIMESTAMP_HEADER, reconstruct_query,
};

/// Path of the demo sum endpoint.
pub const SUM_PATH: &str = "/api/demo/sum";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by [`HmacApiClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// HTTP client that attaches `X-TIMESTAMP` and `X-HMAC-SIGNATURE` to every
/// request.
#[derive(Clone)]
pub struct HmacApiClient {
    http: reqwest::Client,
    base_url: String,
    signer: Signer,
    clock: SharedClock,
}

impl HmacApiClient {
    /// Create a client for `base_url` signing with `secret`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Signing` for an empty secret and
    /// `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, secret: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: Signer::new(secret)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for request timestamps instead of the wall clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compute the authentication headers for a request.
    ///
    /// `query` is the raw query string without the leading `?`.
    pub fn sign_request(&self, method: &str, path: &str, query: &str, body: &[u8]) -> SignedHeaders {
        let ctx = SigningContext::new(method, path)
            .with_query(query)
            .with_body(body.to_vec());
        self.signer.sign_request(ctx, self.clock.as_ref())
    }

    /// `POST /api/demo/sum` with a JSON body.
    pub async fn sum(&self, a: i32, b: i32) -> Result<i32, ClientError> {
        let body = serde_json::to_vec(&SumRequest::new(a, b))?;
        self.send(Method::POST, SUM_PATH, "", body).await
    }

    /// `GET /api/demo/sum?a=..&b=..`.
    pub async fn sum_query(&self, a: i32, b: i32) -> Result<i32, ClientError> {
        let query = reconstruct_query([("a", a.to_string()), ("b", b.to_string())]);
        self.send(Method::GET, SUM_PATH, &query, Vec::new()).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Vec<u8>,
    ) -> Result<i32, ClientError> {
        let signed = self.sign_request(method.as_str(), path, query, &body);
        let url = self.url(path, query);
        debug!(%method, %url, timestamp = %signed.timestamp, "Sending signed request");

        let mut request = self
            .http
            .request(method, &url)
            .header(TIMESTAMP_HEADER, &signed.timestamp)
            .header(SIGNATURE_HEADER, signed.signature.as_str());
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.json::<i32>().await?)
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        }
    }

    /// Render an equivalent signed `curl` invocation, for manual testing.
    pub fn curl_command(&self, method: &str, path: &str, query: &str, body: Option<&str>) -> String {
        let body_bytes = body.map(str::as_bytes).unwrap_or_default();
        let signed = self.sign_request(method, path, query, body_bytes);

        let mut cmd = format!(
            "curl -X {method} \"{}\" \\\n  -H \"{TIMESTAMP_HEADER}: {}\" \\\n  -H \"{SIGNATURE_HEADER}: {}\"",
            self.url(path, query),
            signed.timestamp,
            signed.signature,
        );
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            cmd.push_str(" \\\n  -H \"Content-Type: application/json\"");
            cmd.push_str(&format!(" \\\n  -d \"{}\"", body.replace('"', "\\\"")));
        }
        cmd
    }
}

impl fmt::Debug for HmacApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
