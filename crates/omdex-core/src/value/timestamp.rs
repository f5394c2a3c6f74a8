use chrono::{DateTime, Utc};
use derive_more::{Add, AddAssign, Display, FromStr, Sub, SubAssign};
use serde::{Deserialize, Serialize};

///
/// Timestamp
/// (in seconds, signed so instants before the epoch stay representable)
///

#[derive(
    Add,
    AddAssign,
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    FromStr,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    Sub,
    SubAssign,
)]
#[repr(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    /// Construct from seconds.
    #[must_use]
    pub const fn from_seconds(secs: i64) -> Self {
        Self(secs)
    }

    /// Construct from milliseconds.
    ///
    /// Floors rather than truncates, so sub-second instants before the epoch
    /// round down instead of toward zero.
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms.div_euclid(1_000))
    }

    /// Construct from microseconds (floor to seconds).
    #[must_use]
    pub const fn from_micros(us: i64) -> Self {
        Self(us.div_euclid(1_000_000))
    }

    /// Construct from nanoseconds (floor to seconds).
    #[must_use]
    pub const fn from_nanos(ns: i64) -> Self {
        Self(ns.div_euclid(1_000_000_000))
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, String> {
        let dt =
            DateTime::parse_from_rfc3339(s).map_err(|e| format!("timestamp parse error: {e}"))?;

        Ok(Self(dt.timestamp()))
    }

    pub fn parse_flexible(s: &str) -> Result<Self, String> {
        // Try integer seconds
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Self(n));
        }

        // Try RFC3339
        Self::parse_rfc3339(s)
    }

    /// Current wall-clock timestamp in seconds.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Back to a chrono instant. `None` only for values chrono cannot hold.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }
}

impl PartialEq<i64> for Timestamp {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i64> for Timestamp {
    fn partial_cmp(&self, other: &i64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl PartialEq<Timestamp> for i64 {
    fn eq(&self, other: &Timestamp) -> bool {
        *self == other.0
    }
}

impl PartialOrd<Timestamp> for i64 {
    fn partial_cmp(&self, other: &Timestamp) -> Option<std::cmp::Ordering> {
        self.partial_cmp(&other.0)
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Self;

    fn add(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl std::ops::AddAssign<i64> for Timestamp {
    fn add_assign(&mut self, rhs: i64) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl std::ops::Sub<i64> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_sub(rhs))
    }
}

impl std::ops::SubAssign<i64> for Timestamp {
    fn sub_assign(&mut self, rhs: i64) {
        self.0 = self.0.saturating_sub(rhs);
    }
}

///
/// TESTS
///
