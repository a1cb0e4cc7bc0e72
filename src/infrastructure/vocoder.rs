//! Phase-vocoder time stretching and pitch shifting on top of `rustfft`.
//!
//! Frames are centered (the signal is zero padded by `n_fft / 2` on both
//! sides) and windowed with a periodic Hann window. Only the non-negative
//! frequency bins are carried between analysis and synthesis; the full
//! spectrum is rebuilt by conjugate symmetry before each inverse FFT.

use crate::domain::errors::AppError;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;

pub const DEFAULT_N_FFT: usize = 2048;
pub const DEFAULT_HOP_LENGTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseVocoder {
    n_fft: usize,
    hop_length: usize,
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        PhaseVocoder {
            n_fft: DEFAULT_N_FFT,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}

impl PhaseVocoder {
    pub fn new(n_fft: usize, hop_length: usize) -> Result<Self, AppError> {
        if n_fft < 2 {
            return Err(AppError::invalid(format!("n_fft must be at least 2, got {n_fft}")));
        }
        if hop_length == 0 || hop_length > n_fft {
            return Err(AppError::invalid(format!(
                "hop length must be in 1..={n_fft}, got {hop_length}"
            )));
        }
        Ok(PhaseVocoder { n_fft, hop_length })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Changes duration by `1 / rate` while keeping pitch. `rate > 1` plays
    /// faster. The result always holds `round(len / rate)` samples.
    pub fn time_stretch(&self, samples: &[f32], rate: f32) -> Result<Vec<f32>, AppError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AppError::invalid(format!("stretch rate must be positive, got {rate}")));
        }
        if samples.is_empty() {
            return Err(AppError::transform("cannot stretch an empty phrase"));
        }

        let target_len = stretched_len(samples.len(), rate);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.n_fft);
        let ifft = planner.plan_fft_inverse(self.n_fft);
        let window = hann(self.n_fft);

        let frames = self.stft(samples, &window, fft.as_ref());
        let stretched = self.advance_phases(&frames, rate);
        let mut output = self.istft(&stretched, &window, ifft.as_ref());

        output.resize(target_len, 0.0);
        Ok(output)
    }

    /// Shifts pitch by `semitones` while keeping the sample count.
    pub fn pitch_shift(&self, samples: &[f32], semitones: i32) -> Result<Vec<f32>, AppError> {
        if semitones == 0 {
            return Ok(samples.to_vec());
        }
        let rate = 2.0f32.powf(-(semitones as f32) / 12.0);
        let stretched = self.time_stretch(samples, rate)?;
        Ok(resample_linear(&stretched, samples.len()))
    }

    fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    fn stft(&self, samples: &[f32], window: &[f32], fft: &dyn Fft<f32>) -> Vec<Vec<Complex<f32>>> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = 1 + (padded.len() - self.n_fft) / self.hop_length;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        (0..n_frames)
            .map(|t| {
                let start = t * self.hop_length;
                buffer.iter_mut().enumerate().for_each(|(i, b)| {
                    *b = Complex::new(padded[start + i] * window[i], 0.0);
                });
                fft.process(&mut buffer);
                buffer[..self.n_bins()].to_vec()
            })
            .collect()
    }

    fn advance_phases(&self, frames: &[Vec<Complex<f32>>], rate: f32) -> Vec<Vec<Complex<f32>>> {
        let n_bins = self.n_bins();
        let silent = vec![Complex::new(0.0, 0.0); n_bins];
        let frame_at = |i: usize| frames.get(i).unwrap_or(&silent);

        let phi_advance: Vec<f32> = (0..n_bins)
            .map(|k| 2.0 * PI * self.hop_length as f32 * k as f32 / self.n_fft as f32)
            .collect();
        let mut phase_acc: Vec<f32> = frame_at(0).iter().map(|c| c.arg()).collect();

        let n_out = (frames.len() as f32 / rate).ceil() as usize;
        let mut out = Vec::with_capacity(n_out);
        for t in 0..n_out {
            let step = t as f32 * rate;
            if step >= frames.len() as f32 {
                break;
            }
            let idx = step.floor() as usize;
            let alpha = step - idx as f32;
            let (left, right) = (frame_at(idx), frame_at(idx + 1));

            let frame: Vec<Complex<f32>> = (0..n_bins)
                .map(|k| {
                    let mag = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                    let bin = Complex::from_polar(mag, phase_acc[k]);
                    let delta = wrap_phase(right[k].arg() - left[k].arg() - phi_advance[k]);
                    phase_acc[k] = wrap_phase(phase_acc[k] + phi_advance[k] + delta);
                    bin
                })
                .collect();
            out.push(frame);
        }
        out
    }

    fn istft(&self, frames: &[Vec<Complex<f32>>], window: &[f32], ifft: &dyn Fft<f32>) -> Vec<f32> {
        let n = self.n_fft;
        let n_bins = self.n_bins();
        let total = n + self.hop_length * frames.len().saturating_sub(1);
        let mut output = vec![0.0f32; total];
        let mut norm = vec![0.0f32; total];
        let mut buffer = vec![Complex::new(0.0, 0.0); n];

        for (t, frame) in frames.iter().enumerate() {
            buffer[..n_bins].copy_from_slice(frame);
            for k in 1..n_bins {
                if n - k >= n_bins {
                    buffer[n - k] = frame[k].conj();
                }
            }
            ifft.process(&mut buffer);

            let start = t * self.hop_length;
            for i in 0..n {
                output[start + i] += buffer[i].re / n as f32 * window[i];
                norm[start + i] += window[i] * window[i];
            }
        }

        output
            .iter_mut()
            .zip(&norm)
            .filter(|(_, w)| **w > 1e-8)
            .for_each(|(s, w)| *s /= w);

        output.split_off(n / 2)
    }
}

/// Sample count of a `len`-sample phrase after stretching by `rate`.
pub fn stretched_len(len: usize, rate: f32) -> usize {
    (len as f64 / rate as f64).round() as usize
}

/// Stretches or squeezes `samples` to exactly `target_len` by linear
/// interpolation.
pub fn resample_linear(samples: &[f32], target_len: usize) -> Vec<f32> {
    if samples.is_empty() {
        return vec![0.0; target_len];
    }
    let ratio = samples.len() as f32 / target_len as f32;
    (0..target_len)
        .map(|i| {
            let orig_idx = i as f32 * ratio;
            let idx_floor = orig_idx.floor() as usize;
            let frac = orig_idx - idx_floor as f32;
            if idx_floor + 1 < samples.len() {
                samples[idx_floor] * (1.0 - frac) + samples[idx_floor + 1] * frac
            } else {
                samples[idx_floor.min(samples.len() - 1)]
            }
        })
        .collect()
}

fn hann(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

fn wrap_phase(phase: f32) -> f32 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}
