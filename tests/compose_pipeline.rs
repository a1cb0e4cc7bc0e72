use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f32::consts::PI;
use std::fs;
use std::path::Path;
use style_composer::infrastructure::vocoder::stretched_len;
use style_composer::pipeline::MANIFEST_FILE;
use style_composer::{Config, Pipeline, Report, Variation};
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 8000;

/// Write a 16-bit mono sine fixture.
fn write_sine(path: &Path, freq: f32, seconds: f32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    for i in 0..len {
        let s = (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin() * 0.4;
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn test_config(input: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.audio.input_dir = input.to_path_buf();
    config.audio.output_dir = output.to_path_buf();
    config.audio.sample_rate = SAMPLE_RATE;
    config.composition.segment_length = 0.5;
    config.composition.num_phrases = 4;
    config.composition.num_pieces = 3;
    config.composition.seed = Some(1234);
    config.vocoder.n_fft = 512;
    config.vocoder.hop_length = 128;
    config
}

fn setup() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input_audio");
    fs::create_dir_all(&input).unwrap();
    write_sine(&input.join("01.wav"), 220.0, 1.6);
    write_sine(&input.join("02.wav"), 330.0, 1.1);
    fs::write(input.join("readme.txt"), "ignored").unwrap();
    let config = test_config(&input, &dir.path().join("generated_music"));
    (dir, config)
}

#[test]
fn composes_pieces_and_writes_manifest() {
    let (_dir, config) = setup();
    let output_dir = config.audio.output_dir.clone();
    let report = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(report.input_files, 2);
    // 1.6s -> 3 phrases of 4000 samples, 1.1s -> 2 phrases.
    assert_eq!(report.segments, 5);
    assert_eq!(report.tracks.len(), 3);

    for (i, track) in report.tracks.iter().enumerate() {
        let expected = output_dir.join(format!("style_composed_{}.wav", i + 1));
        assert_eq!(track.file, expected);
        assert_eq!(track.phrases.len(), 4);
        assert!((80..=120).contains(&track.tempo));
        assert!(["6/8", "4/4", "7/8"].contains(&track.meter.as_str()));

        let phrase_total: usize = track.phrases.iter().map(|p| p.length).sum();
        assert_eq!(track.samples, phrase_total);
        for phrase in &track.phrases {
            assert!(phrase.source_index < 5);
            let expected_len = match phrase.variation {
                Variation::PitchShift { .. } => 4000,
                Variation::TimeStretch { rate } => stretched_len(4000, rate),
            };
            assert_eq!(phrase.length, expected_len);
        }

        let reader = WavReader::open(&track.file).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len() as usize, track.samples);
    }

    let manifest = fs::read_to_string(output_dir.join(MANIFEST_FILE)).unwrap();
    let parsed: Report = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed.tracks.len(), 3);
    assert_eq!(parsed.tracks[0].phrases, report.tracks[0].phrases);
}

#[test]
fn seeded_runs_are_reproducible() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config).unwrap();
    let first = pipeline.run_with_rng(&mut StdRng::seed_from_u64(99)).unwrap();
    let second = pipeline.run_with_rng(&mut StdRng::seed_from_u64(99)).unwrap();

    for (a, b) in first.tracks.iter().zip(&second.tracks) {
        assert_eq!(a.phrases, b.phrases);
        assert_eq!(a.meter, b.meter);
        assert_eq!(a.tempo, b.tempo);
    }
}

#[test]
fn empty_input_produces_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input_audio");
    fs::create_dir_all(&input).unwrap();
    let output = dir.path().join("generated_music");

    let report = Pipeline::new(test_config(&input, &output)).unwrap().run().unwrap();
    assert_eq!(report.input_files, 0);
    assert!(report.tracks.is_empty());
    assert!(!output.exists());
}

#[test]
fn inputs_shorter_than_a_phrase_produce_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input_audio");
    fs::create_dir_all(&input).unwrap();
    write_sine(&input.join("short.wav"), 440.0, 0.3);
    let output = dir.path().join("generated_music");

    let report = Pipeline::new(test_config(&input, &output)).unwrap().run().unwrap();
    assert_eq!(report.input_files, 1);
    assert_eq!(report.segments, 0);
    assert!(report.tracks.is_empty());
}

#[test]
fn invalid_configuration_is_rejected() {
    let (_dir, mut config) = setup();
    config.composition.num_phrases = 0;
    assert!(Pipeline::new(config).is_err());
}

#[test]
fn variants_shift_then_stretch_each_input() {
    let (_dir, config) = setup();
    let output_dir = config.audio.output_dir.clone();
    let variants = Pipeline::new(config).unwrap().generate_variants().unwrap();

    let sources: Vec<&str> = variants.iter().map(|v| v.source.as_str()).collect();
    assert_eq!(sources, vec!["01.wav", "02.wav"]);

    for (variant, input_len) in variants.iter().zip([12800usize, 8800]) {
        assert_eq!(variant.file, output_dir.join(format!("generated_{}", variant.source)));
        assert!([-2, -1, 1, 2].contains(&variant.semitones));
        assert!((0.9..=1.1).contains(&variant.rate));
        assert_eq!(variant.samples, stretched_len(input_len, variant.rate));

        let reader = WavReader::open(&variant.file).unwrap();
        assert_eq!(reader.len() as usize, variant.samples);
    }
}

#[test]
fn seeded_variants_are_reproducible() {
    let (_dir, config) = setup();
    let pipeline = Pipeline::new(config).unwrap();
    let first = pipeline.generate_variants_with_rng(&mut StdRng::seed_from_u64(5)).unwrap();
    let second = pipeline.generate_variants_with_rng(&mut StdRng::seed_from_u64(5)).unwrap();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.semitones, b.semitones);
        assert_eq!(a.rate, b.rate);
        assert_eq!(a.samples, b.samples);
    }
}
