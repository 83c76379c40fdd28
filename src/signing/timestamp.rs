//! Request timestamp freshness checks.
//!
//! A timestamp is accepted when it falls inside an asymmetric window around
//! the server's clock:
//!
//! ```text
//!   now - 5min  <=  timestamp  <=  now + 1min
//! ```
//!
//! Both bounds are inclusive. The forward tolerance covers client clock skew;
//! the backward tolerance covers network latency and bounds how long a
//! captured request can be replayed. There is no nonce store, so a request
//! can be replayed verbatim while it is still inside the window.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

/// How far in the past a timestamp may be (5 minutes).
pub const MAX_PAST_SKEW: TimeDelta = TimeDelta::minutes(5);

/// How far in the future a timestamp may be (1 minute).
pub const MAX_FUTURE_SKEW: TimeDelta = TimeDelta::minutes(1);

/// Why a timestamp was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    /// Not an integer number of milliseconds since the epoch
    Malformed,
    /// Older than the allowed window
    Expired,
    /// Further ahead than the allowed skew
    Future,
}

impl TimestampError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of "now" for timestamp validation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Current time as milliseconds since the epoch, formatted for `X-TIMESTAMP`.
pub fn current_timestamp(clock: &dyn Clock) -> String {
    clock.now().timestamp_millis().to_string()
}

/// Stateless timestamp validator.
#[derive(Debug, Clone, Copy)]
pub struct TimestampValidator {
    max_past: TimeDelta,
    max_future: TimeDelta,
}

impl Default for TimestampValidator {
    fn default() -> Self {
        Self {
            max_past: MAX_PAST_SKEW,
            max_future: MAX_FUTURE_SKEW,
        }
    }
}

impl TimestampValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a header value against `now`, reporting why it was refused.
    pub fn check(&self, timestamp: &str, now: DateTime<Utc>) -> Result<(), TimestampError> {
        let millis: i64 = timestamp.parse().map_err(|_| TimestampError::Malformed)?;
        let request_time = DateTime::from_timestamp_millis(millis).ok_or(TimestampError::Malformed)?;

        // A bound outside chrono's range cannot be exceeded
        if let Some(latest) = now.checked_add_signed(self.max_future)
            && request_time > latest
        {
            return Err(TimestampError::Future);
        }
        if let Some(earliest) = now.checked_sub_signed(self.max_past)
            && request_time < earliest
        {
            return Err(TimestampError::Expired);
        }
        Ok(())
    }

    pub fn is_valid(&self, timestamp: &str, now: DateTime<Utc>) -> bool {
        self.check(timestamp, now).is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn offset(delta: TimeDelta) -> String {
        (now() + delta).timestamp_millis().to_string()
    }

    #[test]
    fn test_current_time_is_valid() {
        let v = TimestampValidator::new();
        assert!(v.is_valid(&offset(TimeDelta::zero()), now()));
    }

    #[test]
    fn test_past_boundary() {
        let v = TimestampValidator::new();
        let one_ms = TimeDelta::milliseconds(1);

        assert!(v.is_valid(&offset(-MAX_PAST_SKEW + one_ms), now()));
        assert!(v.is_valid(&offset(-MAX_PAST_SKEW), now()));
        assert_eq!(
            v.check(&offset(-MAX_PAST_SKEW - one_ms), now()),
            Err(TimestampError::Expired)
        );
    }

    #[test]
    fn test_future_boundary() {
        let v = TimestampValidator::new();
        let one_ms = TimeDelta::milliseconds(1);

        assert!(v.is_valid(&offset(MAX_FUTURE_SKEW - one_ms), now()));
        assert!(v.is_valid(&offset(MAX_FUTURE_SKEW), now()));
        assert_eq!(
            v.check(&offset(MAX_FUTURE_SKEW + one_ms), now()),
            Err(TimestampError::Future)
        );
    }

    #[test]
    fn test_ten_minutes_old_is_expired() {
        let v = TimestampValidator::new();
        assert_eq!(
            v.check(&offset(TimeDelta::minutes(-10)), now()),
            Err(TimestampError::Expired)
        );
    }

    #[test]
    fn test_malformed_values() {
        let v = TimestampValidator::new();
        for bad in ["", "abc", "1.5", " 1700000000000", "1700000000000ms", "0x10"] {
            assert_eq!(v.check(bad, now()), Err(TimestampError::Malformed), "{bad:?}");
        }
    }

    #[test]
    fn test_out_of_range_millis_is_malformed() {
        let v = TimestampValidator::new();
        assert_eq!(
            v.check(&i64::MAX.to_string(), now()),
            Err(TimestampError::Malformed)
        );
    }

    #[test]
    fn test_fixed_clock_formats_millis() {
        let clock = FixedClock(now());
        assert_eq!(current_timestamp(&clock), "1700000000000");
    }
}
