//! Sample representation, channel mixing, and byte serialization.

/// Converts an f32 sample to i16.
///
/// Input should be in the range [-1.0, 1.0]. Values outside this range
/// are clamped.
///
/// Uses × 32767 (not 32768) for symmetric scaling. This means -1.0 maps
/// to -32767 rather than -32768, losing 1 LSB at the negative extreme.
/// This is a common convention that avoids producing out-of-range values.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Converts an i16 sample to f32.
///
/// Output will be in the range [-1.0, 1.0].
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Remixes interleaved frames from `src_channels` to `dst_channels`.
///
/// - Equal counts: copied through.
/// - Down-mix to mono: all source channels averaged per frame.
/// - Up-mix from mono: the sample duplicated into every target channel.
/// - Other mismatches: target channel `c` takes source channel `c`,
///   extra target channels repeat the last source channel, extra source
///   channels are dropped.
///
/// Output is appended to `out`, which is cleared first so callers can
/// reuse the allocation across buffers.
pub fn mix_channels(input: &[f32], src_channels: u16, dst_channels: u16, out: &mut Vec<f32>) {
    out.clear();
    let src = src_channels as usize;
    let dst = dst_channels as usize;
    if src == 0 || dst == 0 {
        return;
    }

    if src == dst {
        out.extend_from_slice(input);
        return;
    }

    let frames = input.len() / src;
    out.reserve(frames * dst);

    if dst == 1 {
        // Average all channels, matching the usual stereo-to-mono mix.
        let scale = 1.0 / src as f32;
        for frame in input.chunks_exact(src) {
            out.push(frame.iter().sum::<f32>() * scale);
        }
    } else if src == 1 {
        for &sample in input {
            for _ in 0..dst {
                out.push(sample);
            }
        }
    } else {
        for frame in input.chunks_exact(src) {
            for c in 0..dst {
                out.push(frame[c.min(src - 1)]);
            }
        }
    }
}

/// Serializes i16 samples to bytes, low byte first.
///
/// This is the wire contract the sink receives: interleaved
/// little-endian signed 16-bit PCM.
pub fn i16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
