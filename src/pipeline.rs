use crate::composition::{Phrase, StyleComposer};
use crate::config::Config;
use crate::domain::entities::AudioSegment;
use crate::domain::errors::AppError;
use crate::infrastructure::audio::AudioManager;
use crate::infrastructure::augmentation::{Augmentation, PitchShift, TimeStretch};
use crate::infrastructure::vocoder::PhaseVocoder;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const MANIFEST_FILE: &str = "manifest.json";
const METERS: [&str; 3] = ["6/8", "4/4", "7/8"];
const VARIANT_SEMITONES: [i32; 4] = [-2, -1, 1, 2];
const VARIANT_STRETCH: RangeInclusive<f32> = 0.9..=1.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTrack {
    pub name: String,
    pub file: PathBuf,
    pub meter: String,
    pub tempo: u32,
    pub samples: usize,
    pub phrases: Vec<Phrase>,
}

/// A whole input file re-rendered with one pitch shift and one stretch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedVariant {
    pub source: String,
    pub file: PathBuf,
    pub semitones: i32,
    pub rate: f32,
    pub samples: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub sample_rate: u32,
    pub input_files: usize,
    pub segments: usize,
    pub tracks: Vec<GeneratedTrack>,
}

pub struct Pipeline {
    config: Config,
    manager: AudioManager,
    composer: StyleComposer,
    vocoder: PhaseVocoder,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let manager = AudioManager::new(&config.audio.input_dir, config.audio.sample_rate)
            .with_top_db(config.audio.top_db);
        let vocoder = config.vocoder.build()?;
        let composer = StyleComposer::new(config.audio.sample_rate).with_vocoder(vocoder);
        Ok(Pipeline {
            config,
            manager,
            composer,
            vocoder,
        })
    }

    /// Generator seeded from the configuration, or from OS entropy when no
    /// seed is set.
    fn rng(&self) -> StdRng {
        match self.config.composition.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn run(&self) -> Result<Report, AppError> {
        self.run_with_rng(&mut self.rng())
    }

    pub fn generate_variants(&self) -> Result<Vec<GeneratedVariant>, AppError> {
        self.generate_variants_with_rng(&mut self.rng())
    }

    /// Writes `generated_<file>` for every input: the whole file shifted by
    /// a nonzero semitone step in `-2..=2`, then stretched by a rate in
    /// `0.9..=1.1`.
    pub fn generate_variants_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<GeneratedVariant>, AppError> {
        let audio_data = self.manager.load_all()?;
        let output_dir = &self.config.audio.output_dir;
        let pb = progress_bar(audio_data.len() as u64, "Generating variants");
        let mut variants = Vec::with_capacity(audio_data.len());
        for (name, audio) in audio_data {
            if audio.is_empty() {
                log::warn!("Skipping {}: nothing left after trimming silence", name);
                pb.inc(1);
                continue;
            }
            let semitones = VARIANT_SEMITONES[rng.random_range(0..VARIANT_SEMITONES.len())];
            let rate = rng.random_range(VARIANT_STRETCH);

            let shifted = PitchShift::new(semitones, self.vocoder).apply(&audio)?;
            let stretched = TimeStretch::new(rate, self.vocoder).apply(&shifted)?;
            let file = self
                .manager
                .save_audio(&stretched, &format!("generated_{name}"), output_dir)?;
            log::info!("Generated: {} ({:+} st, x{:.3})", file.display(), semitones, rate);

            variants.push(GeneratedVariant {
                source: name,
                file,
                semitones,
                rate,
                samples: stretched.len(),
            });
            pb.inc(1);
        }
        pb.finish_with_message("Variants completed!");
        Ok(variants)
    }

    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Report, AppError> {
        let mut report = Report {
            sample_rate: self.config.audio.sample_rate,
            ..Report::default()
        };

        let audio_data = self.manager.load_all()?;
        report.input_files = audio_data.len();
        log::info!("Loaded {} WAV file(s).", audio_data.len());
        if audio_data.is_empty() {
            log::warn!(
                "No input audio found. Place WAV files in {}",
                self.config.audio.input_dir.display()
            );
            return Ok(report);
        }

        let all_segments = self.segment_all(&audio_data)?;
        report.segments = all_segments.len();
        if all_segments.is_empty() {
            log::warn!("No usable segments found. Check audio length or input quality.");
            return Ok(report);
        }

        let composition = &self.config.composition;
        let output_dir = &self.config.audio.output_dir;
        let pb = progress_bar(composition.num_pieces as u64, "Composing new audio");
        for i in 1..=composition.num_pieces {
            let piece = self.composer.compose(
                &all_segments,
                composition.variation_strength,
                composition.num_phrases,
                rng,
            )?;
            let file_name = format!("style_composed_{i}.wav");
            let file = self.manager.save_audio(&piece.audio, &file_name, output_dir)?;

            report.tracks.push(GeneratedTrack {
                name: format!("Generated Track {i}"),
                file,
                meter: METERS[rng.random_range(0..METERS.len())].to_string(),
                tempo: rng.random_range(80..=120),
                samples: piece.audio.len(),
                phrases: piece.phrases,
            });
            pb.inc(1);
        }
        pb.finish_with_message("Composition completed!");

        let manifest_path = output_dir.join(MANIFEST_FILE);
        let mut manifest = File::create(&manifest_path)?;
        manifest.write_all(serde_json::to_string_pretty(&report)?.as_bytes())?;
        log::info!("Wrote manifest to {}", manifest_path.display());

        Ok(report)
    }

    fn segment_all(&self, audio_data: &[(String, AudioSegment)]) -> Result<Vec<AudioSegment>, AppError> {
        let segment_length = self.config.composition.segment_length;
        let pb = progress_bar(audio_data.len() as u64, "Segmenting audio files");
        let mut all_segments = Vec::new();
        for (name, audio) in audio_data {
            let segments = self.composer.segment_and_score(&audio.samples, segment_length)?;
            log::info!("Segmenting: {} ({} phrases)", name, segments.len());
            all_segments.extend(segments);
            pb.inc(1);
        }
        pb.finish_with_message("Segmentation completed!");
        Ok(all_segments)
    }
}

fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message);
    pb
}

impl Report {
    /// Fixed-width table of the generated tracks.
    pub fn track_table(&self) -> String {
        let mut table = format!("{:<5} {:<20} {:<10} {:<10}\n", "No.", "Name", "Meter", "Tempo");
        for (idx, track) in self.tracks.iter().enumerate() {
            table.push_str(&format!(
                "{:<5} {:<20} {:<10} {:<10}\n",
                idx + 1,
                track.name,
                track.meter,
                track.tempo
            ));
        }
        table
    }
}
