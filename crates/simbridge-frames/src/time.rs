//! Wire time stamps.
//!
//! The engine keeps time as fractional Unix-epoch seconds in an `f64`; wire
//! messages carry a `(secs, nsecs)` pair.  The conversion splits the value
//! into whole and fractional parts before scaling so that the nanosecond
//! field is the nearest nanosecond to the exact `f64` value rather than a
//! truncation of `t * 1e9` (which loses several hundred nanoseconds at
//! present-day epochs).

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Seconds between the Unix epoch and the GPS epoch (1980-01-06).
pub const GPS_EPOCH_OFFSET_SECS: f64 = 315_964_800.0;

/// GPS-UTC leap second offset.
pub const GPS_LEAP_SECONDS: f64 = 18.0;

/// A `(secs, nsecs)` wire stamp with `nsecs < 1e9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct WireTime {
    pub secs: u32,
    pub nsecs: u32,
}

impl WireTime {
    pub fn new(secs: u32, nsecs: u32) -> Self {
        Self { secs, nsecs }
    }

    /// Convert engine seconds to a wire stamp.
    ///
    /// The mapping is total: negative and NaN inputs map to zero and values
    /// beyond the `u32` second range saturate.
    pub fn from_secs_f64(t: f64) -> Self {
        if t.is_nan() || t <= 0.0 {
            return Self::default();
        }
        if t >= u32::MAX as f64 + 1.0 {
            return Self::new(u32::MAX, NANOS_PER_SEC - 1);
        }

        let whole = t.floor();
        // Exact: `t` and `whole` are within a factor of two of each other
        // or `whole` is zero.
        let frac = t - whole;
        let mut secs = whole as u64;
        let mut nsecs = (frac * NANOS_PER_SEC as f64).round() as u64;
        if nsecs >= NANOS_PER_SEC as u64 {
            secs += 1;
            nsecs -= NANOS_PER_SEC as u64;
        }
        if secs > u32::MAX as u64 {
            return Self::new(u32::MAX, NANOS_PER_SEC - 1);
        }
        Self::new(secs as u32, nsecs as u32)
    }

    /// Convert back to engine seconds.
    ///
    /// Lossy at present-day epochs: near 1.6e9 s an f64 resolves only
    /// ~238 ns, so `from_secs_f64(t.as_secs_f64())` returns `t` exactly only
    /// for small `secs` or dyadic fractions.  Otherwise it is within half
    /// an ulp of `t`.  Use [`as_nanos`](Self::as_nanos) for exact values.
    pub fn as_secs_f64(self) -> f64 {
        self.secs as f64 + self.nsecs as f64 / NANOS_PER_SEC as f64
    }

    /// Total nanoseconds since the epoch.
    pub fn as_nanos(self) -> u64 {
        self.secs as u64 * NANOS_PER_SEC as u64 + self.nsecs as u64
    }
}

/// UTC Unix seconds to GPS seconds (GPS epoch, leap seconds applied).
pub fn utc_to_gps_seconds(utc: f64) -> f64 {
    utc - GPS_EPOCH_OFFSET_SECS + GPS_LEAP_SECONDS
}

/// Inverse of [`utc_to_gps_seconds`].
pub fn gps_to_utc_seconds(gps: f64) -> f64 {
    gps + GPS_EPOCH_OFFSET_SECS - GPS_LEAP_SECONDS
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds() {
        assert_eq!(WireTime::from_secs_f64(12.0), WireTime::new(12, 0));
    }

    #[test]
    fn exact_nanosecond_values_roundtrip_exactly() {
        // Dyadic fractions are exact in binary, so these are exact
        // nanosecond counts.
        for t in [0.5, 1.25, 12.0625, 1_600_000_000.25, 1_600_000_000.375, 4_000_000_000.5] {
            let wire = WireTime::from_secs_f64(t);
            assert_eq!(wire.as_secs_f64(), t, "t = {t}");
        }
        assert_eq!(WireTime::from_secs_f64(12.0625).as_nanos(), 12_062_500_000);
    }

    #[test]
    fn wire_engine_wire_is_exact_for_small_or_dyadic_values() {
        for wire in [
            WireTime::new(1, 500_000_000),
            WireTime::new(1_600_000_000, 250_000_000),
            WireTime::new(7, 0),
            WireTime::new(0, 1),
            WireTime::new(3, 123_456_789),
        ] {
            assert_eq!(WireTime::from_secs_f64(wire.as_secs_f64()), wire);
        }
    }

    #[test]
    fn wire_engine_wire_at_present_day_epoch_is_within_half_ulp() {
        let wire = WireTime::new(1_600_000_000, 123_456_789);
        let back = WireTime::from_secs_f64(wire.as_secs_f64());
        assert_eq!(back.secs, wire.secs);
        let drift = (back.as_nanos() as i64 - wire.as_nanos() as i64).abs();
        // ulp at 1.6e9 s is 2^-22 s (~238 ns).
        assert!(drift <= 120, "drift = {drift} ns");
        assert_eq!(wire.as_nanos(), 1_600_000_000_123_456_789);
    }

    #[test]
    fn sub_second_precision_is_kept_to_representation_limit() {
        // 1e9 + 0.123456789 is not representable in f64; the nearest double
        // lies within half an ulp (~60 ns) of it.
        let wire = WireTime::from_secs_f64(1_000_000_000.123_456_789);
        assert_eq!(wire.secs, 1_000_000_000);
        assert!((wire.nsecs as i64 - 123_456_789).abs() <= 100, "nsecs = {}", wire.nsecs);
    }

    #[test]
    fn fraction_rounding_carries_into_seconds() {
        let wire = WireTime::from_secs_f64(5.999_999_999_9);
        assert_eq!(wire, WireTime::new(6, 0));
    }

    #[test]
    fn negative_nan_and_huge_inputs_are_clamped() {
        assert_eq!(WireTime::from_secs_f64(-3.5), WireTime::default());
        assert_eq!(WireTime::from_secs_f64(f64::NAN), WireTime::default());
        assert_eq!(
            WireTime::from_secs_f64(1e12),
            WireTime::new(u32::MAX, 999_999_999)
        );
    }

    #[test]
    fn gps_time_offsets() {
        let utc = 1_600_000_000.0;
        let gps = utc_to_gps_seconds(utc);
        assert_eq!(gps, 1_600_000_000.0 - 315_964_800.0 + 18.0);
        assert_eq!(gps_to_utc_seconds(gps), utc);
    }

    #[test]
    fn wire_time_serializes_as_secs_nsecs() {
        let json = serde_json::to_string(&WireTime::new(2, 3)).unwrap();
        assert_eq!(json, r#"{"secs":2,"nsecs":3}"#);
    }
}
