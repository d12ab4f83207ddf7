//! Streaming sample rate conversion.
//!
//! [`StreamResampler`] converts interleaved audio from one rate to
//! another using Catmull-Rom (cubic) interpolation. It is stateful by
//! design: the fractional read phase and a three-frame history carry
//! across calls, so a continuous signal split into arbitrary-sized
//! buffers resamples without discontinuities at buffer boundaries.

use crate::RecorderError;

/// Frames of history retained between calls for interpolation.
const HISTORY_FRAMES: usize = 3;

/// A stateful resampler for a continuous stream of interleaved frames.
///
/// Create one per session and feed it every buffer in order; recreating
/// it per buffer would discard the interpolation history and produce
/// audible artifacts where buffers meet.
///
/// Each call produces within ±1 frame of
/// `input_frames × target_rate / source_rate` output frames.
#[derive(Debug)]
pub struct StreamResampler {
    channels: usize,
    /// Source frames consumed per output frame.
    step: f64,
    /// Fractional read position within the current input block, in
    /// source frames. Always in `[0, step)` between calls.
    pos: f64,
    /// Last [`HISTORY_FRAMES`] input frames, interleaved, oldest first.
    hist: Vec<f32>,
    passthrough: bool,
}

impl StreamResampler {
    /// Creates a resampler converting `source_rate` to `target_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Unsupported`] if either rate or the
    /// channel count is zero.
    pub fn new(source_rate: u32, target_rate: u32, channels: u16) -> Result<Self, RecorderError> {
        if source_rate == 0 || target_rate == 0 {
            return Err(RecorderError::unsupported(format!(
                "cannot resample {source_rate} Hz to {target_rate} Hz"
            )));
        }
        if channels == 0 {
            return Err(RecorderError::unsupported("cannot resample 0 channels"));
        }

        let channels = channels as usize;
        Ok(Self {
            channels,
            step: f64::from(source_rate) / f64::from(target_rate),
            pos: 0.0,
            hist: vec![0.0; HISTORY_FRAMES * channels],
            passthrough: source_rate == target_rate,
        })
    }

    /// Resamples one block of interleaved frames.
    ///
    /// `output` is cleared and refilled, so the allocation can be
    /// reused across calls. Input length must be a whole number of
    /// frames; a trailing partial frame is ignored.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        output.clear();

        if self.passthrough {
            output.extend_from_slice(input);
            return;
        }

        let ch = self.channels;
        let frames = input.len() / ch;
        if frames == 0 {
            return;
        }

        let expected = ((frames as f64 - self.pos) / self.step).ceil() as usize;
        output.reserve(expected * ch);

        // Interpolation runs two frames behind the newest sample so the
        // right-hand neighbors always exist; indexes -3..-1 read history.
        let frame_at = |idx: isize, c: usize| -> f32 {
            if idx < 0 {
                self.hist[(idx + HISTORY_FRAMES as isize) as usize * ch + c]
            } else {
                input[idx as usize * ch + c]
            }
        };

        let mut pos = self.pos;
        while pos < frames as f64 {
            let i = pos.floor() as isize;
            let t = (pos - pos.floor()) as f32;
            for c in 0..ch {
                output.push(catmull_rom(
                    frame_at(i - 3, c),
                    frame_at(i - 2, c),
                    frame_at(i - 1, c),
                    frame_at(i, c),
                    t,
                ));
            }
            pos += self.step;
        }
        self.pos = pos - frames as f64;

        self.save_history(input, frames);
    }

    /// Retains the last [`HISTORY_FRAMES`] frames of the stream.
    fn save_history(&mut self, input: &[f32], frames: usize) {
        let ch = self.channels;
        if frames >= HISTORY_FRAMES {
            let tail = (frames - HISTORY_FRAMES) * ch;
            self.hist.copy_from_slice(&input[tail..frames * ch]);
        } else {
            // Short block: shift old history left and append the block.
            let keep = (HISTORY_FRAMES - frames) * ch;
            let len = self.hist.len();
            self.hist.copy_within(len - keep.., 0);
            self.hist[keep..].copy_from_slice(&input[..frames * ch]);
        }
    }
}

/// Catmull-Rom interpolation between `p1` and `p2` at fraction `t`.
#[inline]
fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let a = 2.0 * p1;
    let b = p2 - p0;
    let c = 2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3;
    let d = 3.0 * (p1 - p2) + p3 - p0;
    0.5 * (a + b * t + (c + d * t) * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_frames(resampler: &mut StreamResampler, input: &[f32]) -> usize {
        let mut out = Vec::new();
        resampler.process(input, &mut out);
        out.len() / resampler.channels
    }

    #[test]
    fn test_same_rate_passthrough() {
        let mut r = StreamResampler::new(16000, 16000, 1).unwrap();
        let input = vec![0.1f32, 0.2, 0.3];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn test_empty_input() {
        let mut r = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut out = vec![1.0f32];
        r.process(&[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(StreamResampler::new(0, 16000, 1).is_err());
        assert!(StreamResampler::new(48000, 0, 1).is_err());
    }

    #[test]
    fn test_rejects_zero_channels() {
        assert!(StreamResampler::new(48000, 16000, 0).is_err());
    }

    #[test]
    fn test_downsample_frame_count() {
        // 48kHz to 16kHz: 480 frames -> 160
        let mut r = StreamResampler::new(48000, 16000, 1).unwrap();
        let input = vec![0.0f32; 480];
        assert_eq!(output_frames(&mut r, &input), 160);
    }

    #[test]
    fn test_upsample_frame_count() {
        // 16kHz to 48kHz: 160 frames -> 480
        let mut r = StreamResampler::new(16000, 48000, 1).unwrap();
        let input = vec![0.0f32; 160];
        assert_eq!(output_frames(&mut r, &input), 480);
    }

    #[test]
    fn test_irrational_ratio_stays_within_one_frame() {
        // 44.1kHz to 16kHz, repeated buffers: every call within ±1 frame
        // of the exact ratio, with no cumulative drift.
        let mut r = StreamResampler::new(44100, 16000, 1).unwrap();
        let input = vec![0.0f32; 441];
        let exact = 441.0 * 16000.0 / 44100.0;

        let mut total = 0usize;
        for n in 1..=50 {
            let produced = output_frames(&mut r, &input);
            assert!(
                (produced as f64 - exact).abs() <= 1.0,
                "call produced {produced}, expected ~{exact}"
            );
            total += produced;
            let drift = total as f64 - exact * n as f64;
            assert!(drift.abs() <= 1.0, "cumulative drift {drift} after {n} calls");
        }
    }

    #[test]
    fn test_stereo_preserves_channel_identity() {
        // Distinct constant values per channel must stay in their lanes.
        let mut r = StreamResampler::new(48000, 16000, 2).unwrap();
        let mut input = Vec::new();
        for _ in 0..480 {
            input.push(0.25f32);
            input.push(-0.75f32);
        }
        let mut out = Vec::new();
        r.process(&input, &mut out);
        // Skip the first frames where zero-initialized history bleeds in.
        for frame in out.chunks_exact(2).skip(4) {
            assert!((frame[0] - 0.25).abs() < 1e-3);
            assert!((frame[1] + 0.75).abs() < 1e-3);
        }
    }

    #[test]
    fn test_dc_signal_converges_to_dc() {
        // A constant signal resampled is the same constant once history fills.
        let mut r = StreamResampler::new(44100, 16000, 1).unwrap();
        let input = vec![0.5f32; 441];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        r.process(&input, &mut out);
        for &s in out.iter().skip(4) {
            assert!((s - 0.5).abs() < 1e-4, "sample {s} deviates from DC");
        }
    }

    #[test]
    fn test_continuity_across_buffer_split() {
        // A ramp fed whole vs split into two buffers must resample to the
        // same values: state carries across the boundary.
        let ramp: Vec<f32> = (0..600).map(|i| i as f32 / 600.0).collect();

        let mut whole = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut out_whole = Vec::new();
        whole.process(&ramp, &mut out_whole);

        let mut split = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut first = Vec::new();
        let mut second = Vec::new();
        split.process(&ramp[..250], &mut first);
        split.process(&ramp[250..], &mut second);
        first.extend_from_slice(&second);

        assert_eq!(out_whole.len(), first.len());
        for (a, b) in out_whole.iter().zip(&first) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_continuity_with_blocks_shorter_than_history() {
        // Blocks of 1-2 frames force the history shift path; the split
        // stream must still match the whole one sample for sample.
        let ramp: Vec<f32> = (0..120).map(|i| (i as f32 / 30.0).sin()).collect();

        let mut whole = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut out_whole = Vec::new();
        whole.process(&ramp, &mut out_whole);

        let mut split = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut out_split = Vec::new();
        let mut buf = Vec::new();
        let mut i = 0;
        while i < ramp.len() {
            let n = (1 + i % 2).min(ramp.len() - i);
            split.process(&ramp[i..i + n], &mut buf);
            out_split.extend_from_slice(&buf);
            i += n;
        }

        assert_eq!(out_whole.len(), out_split.len());
        for (a, b) in out_whole.iter().zip(&out_split) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_frame_blocks() {
        // Blocks smaller than the history window still work.
        let mut r = StreamResampler::new(48000, 16000, 1).unwrap();
        let mut out = Vec::new();
        let mut total = 0usize;
        for i in 0..48 {
            r.process(&[i as f32 / 48.0], &mut out);
            total += out.len();
        }
        // 48 input frames at 3:1 -> 16 output frames
        assert_eq!(total, 16);
    }
}
