//! crates/session_core/src/token_clock.rs
//!
//! Offline expiry arithmetic for issued credentials. No state, no I/O.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::domain::TokenRecord;
use crate::ports::Clock;

/// Lifetime assigned to a credential at login. The gateway does not report
/// its own expiry, so this is a client-side policy.
pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;

pub fn default_session_lifetime() -> Duration {
    Duration::hours(DEFAULT_SESSION_LIFETIME_HOURS)
}

pub fn is_expired(token: &TokenRecord, now: DateTime<Utc>) -> bool {
    now >= token.expires_at
}

pub fn issue(credential: String, now: DateTime<Utc>, lifetime: Duration) -> TokenRecord {
    TokenRecord {
        credential,
        expires_at: now + lifetime,
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let token = issue("abc".into(), now, Duration::hours(1));
        assert!(!is_expired(&token, now));
        assert!(!is_expired(&token, now + Duration::minutes(59)));
        assert!(is_expired(&token, now + Duration::hours(1)));
        assert!(is_expired(&token, now + Duration::hours(2)));
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(default_session_lifetime());
        assert_eq!(clock.now(), start + Duration::hours(24));
    }
}
