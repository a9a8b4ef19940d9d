//! Login expiry countdown shown next to the member's name.

use std::fmt;

use crate::domain::foundation::Timestamp;

/// Label rendered once the login window has closed.
pub const EXPIRED_LABEL: &str = "Expirado";

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Remaining time until a login window closes.
///
/// Renders as `"Expirado"`, `"{days}d {hours}h"`, or `"{hours}h"`. Minutes
/// and seconds are truncated, never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCountdown {
    Expired,
    Remaining { days: i64, hours: i64 },
}

impl ExpiryCountdown {
    /// Countdown from `now` until `expires_at`.
    pub fn between(now: &Timestamp, expires_at: &Timestamp) -> Self {
        let remaining_ms = expires_at.duration_since(now).num_milliseconds();
        if remaining_ms <= 0 {
            return ExpiryCountdown::Expired;
        }
        ExpiryCountdown::Remaining {
            days: remaining_ms / MILLIS_PER_DAY,
            hours: (remaining_ms % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ExpiryCountdown::Expired)
    }
}

impl fmt::Display for ExpiryCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryCountdown::Expired => f.write_str(EXPIRED_LABEL),
            ExpiryCountdown::Remaining { days, hours } if *days > 0 => {
                write!(f, "{}d {}h", days, hours)
            }
            ExpiryCountdown::Remaining { hours, .. } => write!(f, "{}h", hours),
        }
    }
}

/// Countdown for an optional expiry; `None` when there is nothing to count to.
pub fn time_until_expiry(expires_at: Option<&Timestamp>, now: &Timestamp) -> Option<ExpiryCountdown> {
    expires_at.map(|expires_at| ExpiryCountdown::between(now, expires_at))
}
