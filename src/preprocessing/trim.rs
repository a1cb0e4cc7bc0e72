//! Leading/trailing silence removal on frame RMS.

pub const DEFAULT_TOP_DB: f32 = 60.0;
pub const DEFAULT_FRAME_LENGTH: usize = 2048;
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Returns the sub-slice between the first and last frame whose RMS is
/// within `top_db` decibels of the loudest frame. All-silent input trims to
/// an empty slice.
pub fn trim_silence(samples: &[f32], top_db: f32, frame_length: usize, hop_length: usize) -> &[f32] {
    if samples.is_empty() || frame_length == 0 || hop_length == 0 {
        return samples;
    }

    let rms: Vec<f32> = (0..samples.len())
        .step_by(hop_length)
        .map(|start| {
            let frame = &samples[start..(start + frame_length).min(samples.len())];
            let power = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
            power.sqrt()
        })
        .collect();

    let loudest = rms.iter().copied().fold(0.0f32, f32::max);
    if loudest <= 0.0 {
        return &samples[..0];
    }
    let threshold = loudest * 10f32.powf(-top_db / 20.0);

    let first = rms.iter().position(|&r| r > threshold);
    let last = rms.iter().rposition(|&r| r > threshold);
    match (first, last) {
        (Some(first), Some(last)) => {
            let start = first * hop_length;
            let end = (last * hop_length + frame_length).min(samples.len());
            &samples[start..end]
        }
        _ => &samples[..0],
    }
}
