//! Second based time wrappers so that session ages and timeouts are never
//! confused with raw integers

#![warn(unused_crate_dependencies)]

use std::{fmt::Display, time::Duration};

/// A span of time that is always clear about being in seconds
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    PartialOrd,
    Ord,
)]
pub struct Seconds(u64);

/// Wall clock time in whole seconds since the unix epoch
///
/// Unlike `Instant` this keeps ticking while the machine sleeps, which is what
/// we want when deciding how old a session is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, PartialOrd, Ord,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn now() -> Self {
        // A clock set before 1970 is treated as the epoch itself
        Self(
            web_time::SystemTime::UNIX_EPOCH
                .elapsed()
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
        )
    }

    pub const fn from_secs_since_unix_epoch(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs_since_unix_epoch(&self) -> Seconds {
        self.0.into()
    }

    /// Returns `None` if the value does not fit in a chrono `DateTime`
    pub fn as_utc_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.0.try_into().ok()?, 0)
    }

    /// Returns the number of seconds since `past_time` or None if `past_time`
    /// is in the future
    pub fn seconds_since(self, past_time: Self) -> Option<Seconds> {
        self.0.checked_sub(past_time.0).map(Seconds)
    }

    /// Returns the number of seconds since this timestamp or None if this
    /// timestamp is in the future
    pub fn elapsed(self) -> Option<Seconds> {
        Self::now().seconds_since(self)
    }
}

impl std::ops::Add<Seconds> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Seconds) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl Seconds {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(&self, other: Seconds) -> Seconds {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Seconds {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Seconds> for Duration {
    fn from(value: Seconds) -> Self {
        Duration::from_secs(value.0)
    }
}

impl From<Duration> for Seconds {
    fn from(value: Duration) -> Self {
        value.as_secs().into()
    }
}

impl Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}
