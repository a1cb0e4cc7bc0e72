use crate::domain::entities::AudioSegment;
use crate::domain::errors::AppError;

/// Cuts a waveform into contiguous, non-overlapping phrases of equal length.
/// A trailing slice shorter than one phrase is dropped.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    segment_duration: f64,
    sample_rate: u32,
    samples_per_segment: usize,
}

impl Segmenter {
    pub fn new(segment_duration: f64, sample_rate: u32) -> Result<Self, AppError> {
        if !segment_duration.is_finite() || segment_duration <= 0.0 {
            return Err(AppError::invalid(format!(
                "segment length must be positive, got {segment_duration}"
            )));
        }
        let samples_per_segment = (segment_duration * sample_rate as f64) as usize;
        if samples_per_segment == 0 {
            return Err(AppError::invalid(format!(
                "segment length {segment_duration}s is shorter than one sample at {sample_rate} Hz"
            )));
        }
        Ok(Segmenter {
            segment_duration,
            sample_rate,
            samples_per_segment,
        })
    }

    pub fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    pub fn segment(&self, samples: &[f32]) -> Vec<AudioSegment> {
        samples
            .chunks_exact(self.samples_per_segment)
            .map(|chunk| AudioSegment::new(chunk.to_vec(), self.sample_rate))
            .collect()
    }
}
