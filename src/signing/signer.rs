//! HMAC-SHA256 signer.
//!
//! The key is validated once, when the signer is built at startup. Each
//! `sign` call then works on its own clone of the keyed MAC, so no hashing
//! state is ever shared between concurrently handled requests.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::canonical::{CanonicalString, SigningContext};
use super::timestamp::{Clock, current_timestamp};
use crate::error::SigningError;

type HmacSha256 = Hmac<Sha256>;

/// Base64-encoded MAC output, as carried in `X-HMAC-SIGNATURE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a client-supplied header value in constant time.
    pub fn matches(&self, provided: &str) -> bool {
        self.0.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header values a client attaches to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `X-TIMESTAMP`
    pub timestamp: String,
    /// Value for `X-HMAC-SIGNATURE`
    pub signature: Signature,
}

/// Keyed signer holding the shared secret's MAC key schedule.
#[derive(Clone)]
pub struct Signer {
    keyed: HmacSha256,
}

impl Signer {
    /// Build a signer from the shared secret.
    ///
    /// # Errors
    ///
    /// Returns `SigningError::EmptyKey` when the secret is empty. This is a
    /// configuration error and should stop the process at startup.
    pub fn new(secret: &str) -> Result<Self, SigningError> {
        Self::from_bytes(secret.as_bytes())
    }

    pub fn from_bytes(key: &[u8]) -> Result<Self, SigningError> {
        if key.is_empty() {
            return Err(SigningError::EmptyKey);
        }
        // HMAC accepts keys of any length; `new_from_slice` only returns a
        // `Result` because of the generic `KeyInit` signature
        let keyed =
            HmacSha256::new_from_slice(key).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        Ok(Self { keyed })
    }

    /// Sign a canonical string.
    pub fn sign(&self, canonical: &CanonicalString) -> Signature {
        let mut mac = self.keyed.clone();
        mac.update(canonical.as_bytes());
        Signature(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Canonicalize and sign in one step.
    pub fn sign_context(&self, ctx: &SigningContext) -> Signature {
        self.sign(&ctx.canonicalize())
    }

    /// Stamp `ctx` with the clock's current time and sign it.
    ///
    /// Any timestamp already present in `ctx` is replaced.
    pub fn sign_request(&self, ctx: SigningContext, clock: &dyn Clock) -> SignedHeaders {
        let timestamp = current_timestamp(clock);
        let signature = self.sign_context(&ctx.with_timestamp(timestamp.clone()));
        SignedHeaders {
            timestamp,
            signature,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// One-shot signing with an ad hoc secret.
///
/// # Errors
///
/// Returns `SigningError::EmptyKey` for an empty secret.
pub fn sign(canonical: &CanonicalString, secret: &str) -> Result<Signature, SigningError> {
    Ok(Signer::new(secret)?.sign(canonical))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_context() -> SigningContext {
        SigningContext::new("POST", "/api/demo/sum")
            .with_query("a=5&b=3")
            .with_body(r#"{"a":5,"b":3}"#)
            .with_timestamp("1700000000000")
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(Signer::new(""), Err(SigningError::EmptyKey)));
    }

    #[test]
    fn test_any_non_empty_key_length_accepted() {
        // Shorter than, equal to and longer than the SHA-256 block size
        for len in [1, 64, 131] {
            assert!(Signer::from_bytes(&vec![0xaa; len]).is_ok(), "key length {len}");
        }
    }

    #[test]
    fn test_long_key_known_vector() {
        // HMAC-SHA256 test case 6 from RFC 4231 (131-byte key, hashed first)
        let signer = Signer::from_bytes(&[0xaa; 131]).unwrap();
        let canonical =
            CanonicalString::from_raw(b"Test Using Larger Than Block-Size Key - Hash Key First");
        assert_eq!(
            signer.sign(&canonical).as_str(),
            "YOQxWR7gtn8Niiaqy/W3f44LxiE3KMUUBUYEDw7jf1Q="
        );
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256 test case 2 from RFC 4231
        let signer = Signer::new("Jefe").unwrap();
        let canonical = CanonicalString::from_raw(b"what do ya want for nothing?");
        assert_eq!(
            signer.sign(&canonical).as_str(),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = Signer::new("secret").unwrap();
        let ctx = base_context();
        assert_eq!(signer.sign_context(&ctx), signer.sign_context(&ctx));
        assert_eq!(
            signer.sign_context(&ctx),
            sign(&ctx.canonicalize(), "secret").unwrap()
        );
    }

    #[test]
    fn test_every_field_affects_signature() {
        let signer = Signer::new("secret").unwrap();
        let base = signer.sign_context(&base_context());

        let variants = [
            base_context().with_timestamp("1700000000001"),
            base_context().with_body(r#"{"a":5,"b":4}"#),
            base_context().with_query("a=5&b=4"),
            SigningContext {
                path: "/api/demo/sun".to_string(),
                ..base_context()
            },
            SigningContext {
                method: "PUT".to_string(),
                ..base_context()
            },
        ];

        for variant in variants {
            assert_ne!(signer.sign_context(&variant), base, "{variant:?}");
        }
    }

    #[test]
    fn test_different_secret_different_signature() {
        let ctx = base_context();
        let a = Signer::new("secret-a").unwrap().sign_context(&ctx);
        let b = Signer::new("secret-b").unwrap().sign_context(&ctx);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sign_request_stamps_timestamp() {
        use crate::signing::timestamp::FixedClock;
        use chrono::DateTime;

        let signer = Signer::new("secret").unwrap();
        let clock = FixedClock(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let headers = signer.sign_request(
            SigningContext::new("GET", "/api/demo/sum").with_query("a=5&b=3"),
            &clock,
        );

        assert_eq!(headers.timestamp, "1700000000000");
        let expected = signer.sign_context(
            &SigningContext::new("GET", "/api/demo/sum")
                .with_query("a=5&b=3")
                .with_timestamp("1700000000000"),
        );
        assert_eq!(headers.signature, expected);
    }

    #[test]
    fn test_known_canonical_request_signature() {
        let ctx = SigningContext::new("GET", "/api/demo/sum")
            .with_query("a=5&b=3")
            .with_timestamp("1700000000000");
        let signature = Signer::new("defaultSecretKey").unwrap().sign_context(&ctx);
        assert_eq!(
            signature.as_str(),
            "zKwAk/bsRyBRYEsb8qo67zVfKaI/6RC49KXwZnaBtcA="
        );
    }

    #[test]
    fn test_signature_matches() {
        let signer = Signer::new("secret").unwrap();
        let sig = signer.sign_context(&base_context());
        assert!(sig.matches(sig.as_str()));
        assert!(!sig.matches("invalidSignature"));
        assert!(!sig.matches(""));
    }
}
