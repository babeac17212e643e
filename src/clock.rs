//! Conversion of time points into Unix seconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time that can be expressed as whole seconds since the Unix
/// epoch (UTC). Instants before the epoch are negative and round towards
/// negative infinity, so half a second before the epoch is `-1`.
pub trait UnixTime {
    fn unix_seconds(&self) -> i64;
}

impl UnixTime for i64 {
    fn unix_seconds(&self) -> i64 {
        *self
    }
}

impl UnixTime for u64 {
    fn unix_seconds(&self) -> i64 {
        i64::try_from(*self).unwrap_or(i64::MAX)
    }
}

impl UnixTime for SystemTime {
    fn unix_seconds(&self) -> i64 {
        match self.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
            Err(before) => {
                let before = before.duration();
                let whole = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);

                if before.subsec_nanos() > 0 {
                    -whole - 1
                } else {
                    -whole
                }
            }
        }
    }
}

impl<T: UnixTime + ?Sized> UnixTime for &T {
    fn unix_seconds(&self) -> i64 {
        (**self).unix_seconds()
    }
}

#[cfg(feature = "chrono")]
impl<Tz: chrono::TimeZone> UnixTime for chrono::DateTime<Tz> {
    fn unix_seconds(&self) -> i64 {
        self.timestamp()
    }
}

#[cfg(feature = "time")]
impl UnixTime for time::OffsetDateTime {
    fn unix_seconds(&self) -> i64 {
        self.unix_timestamp()
    }
}
