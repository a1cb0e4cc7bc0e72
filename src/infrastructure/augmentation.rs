use crate::domain::entities::AudioSegment;
use crate::domain::errors::AppError;
use crate::infrastructure::vocoder::PhaseVocoder;

pub trait Augmentation {
    fn apply(&self, segment: &AudioSegment) -> Result<AudioSegment, AppError>;
    fn name(&self) -> &'static str;
}

/// Moves a phrase up or down by whole semitones, keeping its length.
#[derive(Debug, Clone, Copy)]
pub struct PitchShift {
    pub n_steps: i32,
    vocoder: PhaseVocoder,
}

impl PitchShift {
    pub fn new(n_steps: i32, vocoder: PhaseVocoder) -> Self {
        PitchShift { n_steps, vocoder }
    }
}

impl Augmentation for PitchShift {
    fn apply(&self, segment: &AudioSegment) -> Result<AudioSegment, AppError> {
        let shifted = self.vocoder.pitch_shift(&segment.samples, self.n_steps)?;
        Ok(AudioSegment::new(shifted, segment.sample_rate))
    }

    fn name(&self) -> &'static str {
        match self.n_steps {
            0 => "pitch_none",
            n if n > 0 => "pitch_up",
            _ => "pitch_down",
        }
    }
}

/// Speeds a phrase up (`rate > 1`) or slows it down (`rate < 1`) without
/// changing pitch. The result holds `round(len / rate)` samples.
#[derive(Debug, Clone, Copy)]
pub struct TimeStretch {
    pub rate: f32,
    vocoder: PhaseVocoder,
}

impl TimeStretch {
    pub fn new(rate: f32, vocoder: PhaseVocoder) -> Self {
        TimeStretch { rate, vocoder }
    }
}

impl Augmentation for TimeStretch {
    fn apply(&self, segment: &AudioSegment) -> Result<AudioSegment, AppError> {
        let stretched = self.vocoder.time_stretch(&segment.samples, self.rate)?;
        Ok(AudioSegment::new(stretched, segment.sample_rate))
    }

    fn name(&self) -> &'static str {
        if self.rate > 1.0 { "stretch_fast" } else { "stretch_slow" }
    }
}
