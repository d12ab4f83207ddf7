//! Amplitude metering.
//!
//! The audio callback measures each converted buffer and publishes the
//! peak level through an [`AmplitudeSlot`], a lock-free cell the
//! application can poll from any thread without touching the capture
//! path.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Level reported for silence, in dBFS.
///
/// Digital silence has no defined level (log of zero), so the meter
/// floors at this value and never reports below it.
pub const SILENCE_FLOOR_DBFS: f32 = -160.0;

/// Peak level of a PCM buffer in dBFS.
///
/// Full scale (±32767) measures 0.0; an empty or all-zero buffer
/// measures [`SILENCE_FLOOR_DBFS`]. Results are clamped to
/// `[SILENCE_FLOOR_DBFS, 0.0]`.
pub fn peak_dbfs(samples: &[i16]) -> f32 {
    let peak = samples
        .iter()
        .map(|&s| i32::from(s).unsigned_abs())
        .max()
        .unwrap_or(0);
    if peak == 0 {
        return SILENCE_FLOOR_DBFS;
    }
    let level = 20.0 * (peak as f32 / f32::from(i16::MAX)).log10();
    level.clamp(SILENCE_FLOOR_DBFS, 0.0)
}

/// Shared cell holding the most recent peak level.
///
/// The writer side lives in the audio callback; readers poll at their
/// own pace and only ever see the latest value. Stores and loads are
/// relaxed, a stale reading by one buffer is fine for a level meter.
#[derive(Debug, Clone)]
pub struct AmplitudeSlot {
    bits: Arc<AtomicU32>,
}

impl AmplitudeSlot {
    /// Creates a slot reading [`SILENCE_FLOOR_DBFS`].
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(SILENCE_FLOOR_DBFS.to_bits())),
        }
    }

    /// Publishes a new peak level.
    pub fn store(&self, dbfs: f32) {
        self.bits.store(dbfs.to_bits(), Ordering::Relaxed);
    }

    /// Reads the most recently published level.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Returns the slot to the silence floor.
    pub fn reset(&self) {
        self.store(SILENCE_FLOOR_DBFS);
    }
}

impl Default for AmplitudeSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_buffer_is_silence() {
        assert_eq!(peak_dbfs(&[]), SILENCE_FLOOR_DBFS);
    }

    #[test]
    fn test_all_zero_buffer_is_silence() {
        assert_eq!(peak_dbfs(&[0; 256]), SILENCE_FLOOR_DBFS);
    }

    #[test]
    fn test_full_scale_is_zero_dbfs() {
        assert_relative_eq!(peak_dbfs(&[0, i16::MAX, 0]), 0.0);
        assert_relative_eq!(peak_dbfs(&[i16::MIN]), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_half_scale_is_minus_six_dbfs() {
        let half = [i16::MAX / 2];
        assert_relative_eq!(peak_dbfs(&half), -6.02, epsilon = 0.01);
    }

    #[test]
    fn test_peak_not_average() {
        // One loud sample among quiet ones sets the reading.
        let mut samples = vec![10i16; 1000];
        samples[500] = i16::MAX;
        assert_relative_eq!(peak_dbfs(&samples), 0.0);
    }

    #[test]
    fn test_never_exceeds_zero() {
        // i16::MIN overshoots full scale slightly; the clamp holds.
        assert!(peak_dbfs(&[i16::MIN]) <= 0.0);
    }

    #[test]
    fn test_slot_roundtrip() {
        let slot = AmplitudeSlot::new();
        assert_eq!(slot.load(), SILENCE_FLOOR_DBFS);
        slot.store(-12.5);
        assert_eq!(slot.load(), -12.5);
        slot.reset();
        assert_eq!(slot.load(), SILENCE_FLOOR_DBFS);
    }

    #[test]
    fn test_slot_shares_state_across_clones() {
        let slot = AmplitudeSlot::new();
        let writer = slot.clone();
        writer.store(-3.0);
        assert_eq!(slot.load(), -3.0);
    }
}
