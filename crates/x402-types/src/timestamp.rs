//! Unix timestamps and the payment validity window.
//!
//! Every x402 v1 payload carries the instant the buyer produced it. A verifier
//! accepts the payload only while that instant lies within `max_timeout_seconds`
//! of the verification instant, in either direction. See [`UnixTimestamp::check_window`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};
use std::time::SystemTime;

use crate::proto::PaymentVerificationError;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a JSON integer. A stringified integer is accepted on input,
/// since some clients quote 64-bit values to survive JavaScript's `Number`.
///
/// ```
/// use x402_types::timestamp::UnixTimestamp;
///
/// let a: UnixTimestamp = serde_json::from_str("1699999999").unwrap();
/// let b: UnixTimestamp = serde_json::from_str("\"1699999999\"").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(serde_json::to_string(&a).unwrap(), "1699999999");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            String(String),
        }

        let ts = match Repr::deserialize(deserializer).map_err(|_| {
            serde::de::Error::custom("timestamp must be a non-negative integer")
        })? {
            Repr::Number(n) => n,
            Repr::String(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(serde::de::Error::custom(
                        "timestamp must be a non-negative integer",
                    ));
                }
                s.parse::<u64>()
                    .map_err(|_| serde::de::Error::custom("timestamp does not fit in 64 bits"))?
            }
        };
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl Sub<u64> for UnixTimestamp {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_sub(rhs))
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the Unix epoch reads as `0`.
    ///
    /// ```
    /// use x402_types::timestamp::UnixTimestamp;
    ///
    /// let now = UnixTimestamp::now();
    /// // Timestamp should be after year 2020
    /// assert!(now.as_secs() > 1577836800);
    /// ```
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Checks that `self` lies within `[now - max_timeout_seconds, now + max_timeout_seconds]`.
    ///
    /// Both bounds are inclusive and computed with saturating arithmetic, so a window
    /// reaching past `0` or `u64::MAX` is clamped rather than wrapped.
    ///
    /// ```
    /// use x402_types::timestamp::UnixTimestamp;
    ///
    /// let now = UnixTimestamp::from_secs(1_000);
    /// assert!(UnixTimestamp::from_secs(970).check_window(now, 30).is_ok());
    /// assert!(UnixTimestamp::from_secs(969).check_window(now, 30).is_err());
    /// ```
    pub fn check_window(
        &self,
        now: UnixTimestamp,
        max_timeout_seconds: u64,
    ) -> Result<(), PaymentVerificationError> {
        let earliest = now - max_timeout_seconds;
        let latest = now + max_timeout_seconds;
        if *self < earliest {
            Err(PaymentVerificationError::Expired {
                timestamp: self.0,
                now: now.0,
                max_timeout_seconds,
            })
        } else if *self > latest {
            Err(PaymentVerificationError::NotYetValid {
                timestamp: self.0,
                now: now.0,
                max_timeout_seconds,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ErrorReason;

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let now = UnixTimestamp::from_secs(1_700_000_000);
        assert!((now - 30).check_window(now, 30).is_ok());
        assert!((now + 30).check_window(now, 30).is_ok());
        assert!(now.check_window(now, 30).is_ok());
    }

    #[test]
    fn test_window_outside_bounds() {
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let stale = (now - 31).check_window(now, 30).unwrap_err();
        assert_eq!(stale.reason(), ErrorReason::Expired);
        let future = (now + 31).check_window(now, 30).unwrap_err();
        assert_eq!(future.reason(), ErrorReason::NotYetValid);
    }

    #[test]
    fn test_window_saturates() {
        let zero = UnixTimestamp::from_secs(0);
        assert!(zero.check_window(UnixTimestamp::from_secs(5), u64::MAX).is_ok());
        let max = UnixTimestamp::from_secs(u64::MAX);
        assert!(max.check_window(max, u64::MAX).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_negative_and_fractional() {
        assert!(serde_json::from_str::<UnixTimestamp>("-1").is_err());
        assert!(serde_json::from_str::<UnixTimestamp>("1.5").is_err());
        assert!(serde_json::from_str::<UnixTimestamp>("\"12a\"").is_err());
    }
}
