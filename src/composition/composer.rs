//! Recombination of fixed-length phrases into new pieces.
//!
//! A composition draws `num_phrases` phrases uniformly with replacement from
//! a segment pool and runs each through either a pitch shift (whole
//! semitones in `-2..=2`) or a time stretch (rate in `0.7..=1.3`), chosen
//! with equal odds. Randomness comes from the caller's generator, so a
//! seeded `StdRng` replays the same piece.

use crate::domain::entities::AudioSegment;
use crate::domain::errors::AppError;
use crate::infrastructure::augmentation::{Augmentation, PitchShift, TimeStretch};
use crate::infrastructure::vocoder::PhaseVocoder;
use crate::preprocessing::segmenter::Segmenter;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const DEFAULT_SEGMENT_LENGTH: f64 = 2.0;
pub const DEFAULT_NUM_PHRASES: usize = 6;
pub const DEFAULT_VARIATION_STRENGTH: f32 = 0.1;

const PITCH_SHIFT_PROBABILITY: f64 = 0.5;
const SEMITONE_RANGE: RangeInclusive<i32> = -2..=2;
const STRETCH_RANGE: RangeInclusive<f32> = 0.7..=1.3;

/// Transform applied to one drawn phrase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variation {
    PitchShift { semitones: i32 },
    TimeStretch { rate: f32 },
}

impl Variation {
    fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(PITCH_SHIFT_PROBABILITY) {
            Variation::PitchShift {
                semitones: rng.random_range(SEMITONE_RANGE),
            }
        } else {
            Variation::TimeStretch {
                rate: rng.random_range(STRETCH_RANGE),
            }
        }
    }

    fn augmentation(self, vocoder: PhaseVocoder) -> Box<dyn Augmentation> {
        match self {
            Variation::PitchShift { semitones } => Box::new(PitchShift::new(semitones, vocoder)),
            Variation::TimeStretch { rate } => Box::new(TimeStretch::new(rate, vocoder)),
        }
    }
}

/// One draw of a composition: where it came from and what was done to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub source_index: usize,
    pub variation: Variation,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub audio: AudioSegment,
    pub phrases: Vec<Phrase>,
}

pub struct StyleComposer {
    sample_rate: u32,
    vocoder: PhaseVocoder,
}

impl Default for StyleComposer {
    fn default() -> Self {
        StyleComposer::new(DEFAULT_SAMPLE_RATE)
    }
}

impl StyleComposer {
    pub fn new(sample_rate: u32) -> Self {
        StyleComposer {
            sample_rate,
            vocoder: PhaseVocoder::default(),
        }
    }

    pub fn with_vocoder(mut self, vocoder: PhaseVocoder) -> Self {
        self.vocoder = vocoder;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Splits `y` into phrases of `segment_length` seconds. Nothing is
    /// scored or filtered yet: the phrases come back in source order, minus
    /// any short tail.
    pub fn segment_and_score(&self, y: &[f32], segment_length: f64) -> Result<Vec<AudioSegment>, AppError> {
        let segmenter = Segmenter::new(segment_length, self.sample_rate)?;
        Ok(segmenter.segment(y))
    }

    /// `compose` with the default strength and `DEFAULT_NUM_PHRASES` draws.
    pub fn compose_with_defaults<R: Rng + ?Sized>(
        &self,
        segments: &[AudioSegment],
        rng: &mut R,
    ) -> Result<Composition, AppError> {
        self.compose(segments, DEFAULT_VARIATION_STRENGTH, DEFAULT_NUM_PHRASES, rng)
    }

    /// Builds a new piece from `num_phrases` random, varied draws out of
    /// `segments`.
    ///
    /// `_variation_strength` is accepted for interface parity and currently
    /// has no effect on the draws.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        segments: &[AudioSegment],
        _variation_strength: f32,
        num_phrases: usize,
        rng: &mut R,
    ) -> Result<Composition, AppError> {
        if segments.is_empty() {
            return Err(AppError::invalid("segments must be non-empty"));
        }
        if num_phrases == 0 {
            return Err(AppError::invalid("num_phrases must be positive"));
        }

        let mut samples = Vec::new();
        let mut phrases = Vec::with_capacity(num_phrases);
        for _ in 0..num_phrases {
            let source_index = rng.random_range(0..segments.len());
            let variation = Variation::draw(rng);
            let augmentation = variation.augmentation(self.vocoder);
            let piece = augmentation.apply(&segments[source_index])?;
            log::debug!(
                "phrase {}: segment {} via {} -> {} samples",
                phrases.len(),
                source_index,
                augmentation.name(),
                piece.len()
            );

            samples.extend_from_slice(&piece.samples);
            phrases.push(Phrase {
                source_index,
                variation,
                length: piece.len(),
            });
        }

        Ok(Composition {
            audio: AudioSegment::new(samples, self.sample_rate),
            phrases,
        })
    }
}
