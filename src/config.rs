//! TOML configuration for the composing pipeline. Every field has a
//! default, so an empty file (or no file) is a valid configuration.

use crate::composition::composer::{DEFAULT_SAMPLE_RATE, DEFAULT_SEGMENT_LENGTH, DEFAULT_VARIATION_STRENGTH};
use crate::domain::errors::AppError;
use crate::infrastructure::vocoder::{self, PhaseVocoder};
use crate::preprocessing::trim;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub composition: CompositionConfig,
    pub vocoder: VocoderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sample_rate: u32,
    pub top_db: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub segment_length: f64,
    pub num_phrases: usize,
    pub num_pieces: usize,
    pub variation_strength: f32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocoderConfig {
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            input_dir: PathBuf::from("input_audio"),
            output_dir: PathBuf::from("generated_music"),
            sample_rate: DEFAULT_SAMPLE_RATE,
            top_db: trim::DEFAULT_TOP_DB,
        }
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        CompositionConfig {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            num_phrases: 8,
            num_pieces: 6,
            variation_strength: DEFAULT_VARIATION_STRENGTH,
            seed: None,
        }
    }
}

impl Default for VocoderConfig {
    fn default() -> Self {
        VocoderConfig {
            n_fft: vocoder::DEFAULT_N_FFT,
            hop_length: vocoder::DEFAULT_HOP_LENGTH,
        }
    }
}

impl VocoderConfig {
    pub fn build(&self) -> Result<PhaseVocoder, AppError> {
        PhaseVocoder::new(self.n_fft, self.hop_length)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.audio.sample_rate == 0 {
            return Err(AppError::invalid("sample_rate must be positive"));
        }
        let top_db = self.audio.top_db;
        if !top_db.is_finite() || top_db <= 0.0 {
            return Err(AppError::invalid(format!("top_db must be positive, got {top_db}")));
        }
        let segment_length = self.composition.segment_length;
        if !segment_length.is_finite() || segment_length <= 0.0 {
            return Err(AppError::invalid(format!(
                "segment_length must be positive, got {segment_length}"
            )));
        }
        if self.composition.num_phrases == 0 {
            return Err(AppError::invalid("num_phrases must be positive"));
        }
        if self.composition.num_pieces == 0 {
            return Err(AppError::invalid("num_pieces must be positive"));
        }
        self.vocoder.build()?;
        Ok(())
    }
}
