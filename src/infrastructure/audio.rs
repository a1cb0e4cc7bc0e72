use crate::domain::entities::AudioSegment;
use crate::domain::errors::AppError;
use crate::preprocessing::trim::{self, trim_silence};
use dasp_rs::signal_processing::resampling::resample;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads mono, rate-converted, silence-trimmed WAV inputs from one
/// directory and writes rendered pieces back out.
pub struct AudioManager {
    input_dir: PathBuf,
    sample_rate: u32,
    top_db: f32,
}

impl AudioManager {
    pub fn new(input_dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        AudioManager {
            input_dir: input_dir.into(),
            sample_rate,
            top_db: trim::DEFAULT_TOP_DB,
        }
    }

    pub fn with_top_db(mut self, top_db: f32) -> Self {
        self.top_db = top_db;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Every `.wav` file of the input directory, ordered by file name.
    pub fn load_all(&self) -> Result<Vec<(String, AudioSegment)>, AppError> {
        let mut names: Vec<String> = fs::read_dir(&self.input_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .filter(|name| name.to_lowercase().ends_with(".wav"))
            .collect();
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let audio = self.load_path(&self.input_dir.join(&name))?;
                log::debug!("Loaded {} ({:.2}s)", name, audio.duration());
                Ok((name, audio))
            })
            .collect()
    }

    pub fn load_file(&self, file_name: &str) -> Result<AudioSegment, AppError> {
        let path = self.input_dir.join(file_name);
        if !path.exists() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File {} not found in {}", file_name, self.input_dir.display()),
            )));
        }
        self.load_path(&path)
    }

    pub fn save_audio(
        &self,
        segment: &AudioSegment,
        file_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, AppError> {
        fs::create_dir_all(output_dir)?;
        let output_path = output_dir.join(file_name);
        write_wav(&output_path, segment)?;
        log::info!("Saved audio: {}", output_path.display());
        Ok(output_path)
    }

    fn load_path(&self, path: &Path) -> Result<AudioSegment, AppError> {
        let (samples, original_rate) = read_wav(path)?;
        let resampled = if original_rate != self.sample_rate {
            resample(&samples, original_rate, self.sample_rate)?
        } else {
            samples
        };
        let trimmed = trim_silence(
            &resampled,
            self.top_db,
            trim::DEFAULT_FRAME_LENGTH,
            trim::DEFAULT_HOP_LENGTH,
        );
        Ok(AudioSegment::new(trimmed.to_vec(), self.sample_rate))
    }
}

/// Decodes a WAV file to mono `f32` samples in `[-1, 1]`, averaging
/// channels. Returns the samples and the file's sample rate.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), AppError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok((mono, spec.sample_rate))
}

/// Writes a mono 16-bit PCM WAV file.
pub fn write_wav(path: &Path, segment: &AudioSegment) -> Result<(), AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: segment.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &segment.samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tone(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.1).sin() * 0.5).collect()
    }

    fn write_stereo_float(path: &Path, left: &[f32], right: &[f32], sample_rate: u32) {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for (l, r) in left.iter().zip(right) {
            writer.write_sample(*l).unwrap();
            writer.write_sample(*r).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn write_then_read_keeps_length_and_rate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let segment = AudioSegment::new(tone(1234), 8000);
        write_wav(&path, &segment).unwrap();

        let (samples, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(samples.len(), 1234);
        for (a, b) in samples.iter().zip(&segment.samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn stereo_is_downmixed_by_averaging() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_stereo_float(&path, &[0.2, 0.4, 0.6], &[0.0, 0.2, -0.6], 8000);

        let (samples, _) = read_wav(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert!((samples[0] - 0.1).abs() < 1e-6);
        assert!((samples[1] - 0.3).abs() < 1e-6);
        assert!(samples[2].abs() < 1e-6);
    }

    #[test]
    fn load_all_filters_sorts_and_trims() {
        let dir = TempDir::new().unwrap();
        let mut padded = vec![0.0; 4096];
        padded.extend(tone(8192));
        padded.extend(vec![0.0; 4096]);
        write_wav(&dir.path().join("b.WAV"), &AudioSegment::new(padded, 8000)).unwrap();
        write_wav(&dir.path().join("a.wav"), &AudioSegment::new(tone(8000), 8000)).unwrap();
        fs::write(dir.path().join("notes.txt"), "not audio").unwrap();

        let manager = AudioManager::new(dir.path(), 8000);
        let loaded = manager.load_all().unwrap();

        let names: Vec<&str> = loaded.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.wav", "b.WAV"]);
        assert_eq!(loaded[0].1.len(), 8000);
        // Trimming works at frame granularity, so some padding survives.
        let trimmed = loaded[1].1.len();
        assert!((8192..16384).contains(&trimmed), "trimmed to {trimmed}");
        assert!(loaded.iter().all(|(_, a)| a.sample_rate == 8000));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let manager = AudioManager::new(dir.path(), 8000);
        match manager.load_file("missing.wav") {
            Err(AppError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn save_audio_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("nested/out");
        let manager = AudioManager::new(dir.path(), 8000);
        let path = manager
            .save_audio(&AudioSegment::new(tone(100), 8000), "piece.wav", &out_dir)
            .unwrap();
        assert!(path.exists());
        assert_eq!(read_wav(&path).unwrap().0.len(), 100);
    }
}
