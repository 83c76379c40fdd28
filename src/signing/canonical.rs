//! Canonical request string construction.
//!
//! Both the client and the server derive the bytes that get signed from the
//! same five request attributes, in a fixed order:
//!
//! ```text
//! <METHOD>\n<PATH>\n<QUERY-OR-EMPTY>\n[<BODY>\n]<TIMESTAMP>
//! ```
//!
//! - The query line is always present; it is empty when there is no query.
//! - The body line (and its terminator) is omitted entirely for an empty body.
//! - The timestamp is the last segment and has no trailing newline.
//!
//! Nothing is escaped. A value containing `\n` aliases with the delimiter.
//!
//! The body is signed as the raw bytes received, never decoded as text.
//! Clients must sign the exact bytes they send: a signature computed over a
//! lossily decoded string will not verify for a body that is not valid UTF-8.

use std::collections::HashSet;
use std::fmt;

use bytes::Bytes;

/// Request attributes covered by a signature.
///
/// Built fresh for every sign or verify call and never mutated. Two contexts
/// with equal fields always canonicalize to equal bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// HTTP method, case preserved as received
    pub method: String,
    /// Request path without scheme, host or query
    pub path: String,
    /// Raw query string without the leading `?` (empty when absent)
    pub query: String,
    /// Request body bytes (empty when there is no body)
    pub body: Bytes,
    /// Milliseconds since epoch as sent in `X-TIMESTAMP`
    pub timestamp: Option<String>,
}

impl SigningContext {
    /// Create a context for a request without query, body or timestamp.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: String::new(),
            body: Bytes::new(),
            timestamp: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Build the canonical string for this context.
    pub fn canonicalize(&self) -> CanonicalString {
        canonicalize(self)
    }
}

/// The exact byte sequence that is fed to the MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalString(Vec<u8>);

impl CanonicalString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_raw(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Canonicalize a signing context.
pub fn canonicalize(ctx: &SigningContext) -> CanonicalString {
    let timestamp = ctx.timestamp.as_deref().filter(|t| !t.is_empty());

    let mut out = Vec::with_capacity(
        ctx.method.len()
            + ctx.path.len()
            + ctx.query.len()
            + ctx.body.len()
            + timestamp.map_or(0, str::len)
            + 4,
    );

    out.extend_from_slice(ctx.method.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(ctx.path.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(ctx.query.as_bytes());
    out.push(b'\n');

    if !ctx.body.is_empty() {
        out.extend_from_slice(&ctx.body);
        out.push(b'\n');
    }

    if let Some(ts) = timestamp {
        out.extend_from_slice(ts.as_bytes());
    }

    CanonicalString(out)
}

/// Rebuild a query string from already-decoded parameters.
///
/// Used when the raw query is not available (and by the client, which builds
/// its URL with the same function so the wire query matches what it signs).
///
/// Keys appear in first-occurrence order and only the first value of each key
/// is kept. Values are emitted as given, without percent-encoding.
pub fn reconstruct_query<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut query = String::new();

    for (key, value) in params {
        let key = key.as_ref();
        if !seen.insert(key.to_string()) {
            continue;
        }

        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(key);
        query.push('=');
        query.push_str(value.as_ref());
    }

    query
}
