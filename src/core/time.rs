//! Wire time conversion.
//!
//! Acquisition sources stamp every sample with a monotonic microsecond
//! count. The publishing layer wants a split (seconds, nanoseconds) pair,
//! so the dispatch loop converts each timestamp on its way out. The
//! conversion is exact: `sec * 1e9 + nsec == timestamp_us * 1000` for
//! every timestamp inside the supported range.

use crate::error::{Error, Result};

const NSEC_PER_SEC: u64 = 1_000_000_000;
const NSEC_PER_USEC: u64 = 1_000;

/// Largest `timestamp_us` whose wire seconds still fit in 32 bits.
///
/// Conversions past this point fail with [`Error::TimestampOverflow`].
pub const MAX_TIMESTAMP_US: u64 = ((u32::MAX as u64 + 1) * NSEC_PER_SEC - 1) / NSEC_PER_USEC;

/// Wire timestamp: whole seconds plus nanoseconds within the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireTime {
    pub sec: u32,
    pub nsec: u32,
}

impl WireTime {
    /// Split a monotonic microsecond timestamp into wire time.
    ///
    /// Returns [`Error::TimestampOverflow`] when `timestamp_us` exceeds
    /// [`MAX_TIMESTAMP_US`].
    pub fn from_micros(timestamp_us: u64) -> Result<Self> {
        if timestamp_us > MAX_TIMESTAMP_US {
            return Err(Error::TimestampOverflow(timestamp_us));
        }
        let total_ns = timestamp_us * NSEC_PER_USEC;
        Ok(Self {
            sec: (total_ns / NSEC_PER_SEC) as u32,
            nsec: (total_ns % NSEC_PER_SEC) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_known_values() {
        let t = WireTime::from_micros(1_000).unwrap();
        assert_eq!((t.sec, t.nsec), (0, 1_000_000));

        let t = WireTime::from_micros(2_000).unwrap();
        assert_eq!((t.sec, t.nsec), (0, 2_000_000));

        let t = WireTime::from_micros(1_500_000).unwrap();
        assert_eq!((t.sec, t.nsec), (1, 500_000_000));

        let t = WireTime::from_micros(0).unwrap();
        assert_eq!((t.sec, t.nsec), (0, 0));
    }

    #[test]
    fn test_round_trip_exact() {
        for &us in &[0u64, 1, 999, 1_000, 999_999, 1_000_000, 123_456_789_012, MAX_TIMESTAMP_US] {
            let t = WireTime::from_micros(us).unwrap();
            assert_eq!(
                t.sec as u64 * 1_000_000_000 + t.nsec as u64,
                us * 1_000,
                "round trip failed for {} us",
                us
            );
            assert!(t.nsec < 1_000_000_000);
        }
    }

    #[test]
    fn test_max_timestamp_boundary() {
        let t = WireTime::from_micros(MAX_TIMESTAMP_US).unwrap();
        assert_eq!(t.sec, u32::MAX);

        match WireTime::from_micros(MAX_TIMESTAMP_US + 1) {
            Err(Error::TimestampOverflow(us)) => assert_eq!(us, MAX_TIMESTAMP_US + 1),
            other => panic!("expected TimestampOverflow, got {:?}", other),
        }
    }
}
