//! Shared application state for Axum handlers.
//!
//! Everything in here is immutable after startup. The HMAC authenticator is
//! built once from the configured secret and shared by reference with every
//! request, so no locking is needed.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::HmacAuthenticator;
use crate::signing::{SharedClock, Signer};

/// Shared application state.
///
/// Cloned per request; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Verifier for inbound signatures
    pub authenticator: Arc<HmacAuthenticator>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Signing` if the configured secret cannot be used as
    /// an HMAC key. Callers should treat this as fatal.
    pub fn new(config: Config) -> AppResult<Self> {
        let signer = Signer::new(&config.hmac_secret)?;
        Ok(Self {
            config: Arc::new(config),
            authenticator: Arc::new(HmacAuthenticator::new(signer)),
            started_at: Instant::now(),
        })
    }

    /// Build state whose timestamp checks use `clock` instead of the wall clock.
    ///
    /// # Errors
    ///
    /// Same as [`AppState::new`].
    pub fn with_clock(config: Config, clock: SharedClock) -> AppResult<Self> {
        let signer = Signer::new(&config.hmac_secret)?;
        Ok(Self {
            config: Arc::new(config),
            authenticator: Arc::new(HmacAuthenticator::new(signer).with_clock(clock)),
            started_at: Instant::now(),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.uptime_seconds(), 0);
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let config = Config {
            hmac_secret: String::new(),
            ..Config::default()
        };
        assert!(matches!(AppState::new(config), Err(AppError::Signing(_))));
    }
}
