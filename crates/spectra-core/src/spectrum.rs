//! Seven-band spectral summary of a frequency-domain magnitude snapshot.
//!
//! The analyzer pulls the newest snapshot from a [`SpectrumSource`] once per
//! frame and averages the bins covering each band's Hz range. Missing input
//! is never an error: with no source attached (or nothing produced yet) the
//! result is all zeros.

use crate::constants::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

/// One of the seven named frequency ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Band {
    SubBass,
    Bass,
    LowerMid,
    Mid,
    UpperMid,
    Presence,
    Brilliance,
}

impl Band {
    /// All bands in ascending frequency order.
    pub const ALL: [Band; 7] = [
        Band::SubBass,
        Band::Bass,
        Band::LowerMid,
        Band::Mid,
        Band::UpperMid,
        Band::Presence,
        Band::Brilliance,
    ];

    /// Inclusive Hz range `(low, high)` covered by the band.
    pub fn range_hz(self) -> (f32, f32) {
        match self {
            Band::SubBass => (20.0, 60.0),
            Band::Bass => (60.0, 250.0),
            Band::LowerMid => (250.0, 500.0),
            Band::Mid => (500.0, 2000.0),
            Band::UpperMid => (2000.0, 4000.0),
            Band::Presence => (4000.0, 6000.0),
            Band::Brilliance => (6000.0, 20000.0),
        }
    }
}

/// Normalized mean energy per band, each value in \[0, 1\].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyBands {
    pub sub_bass: f32,
    pub bass: f32,
    pub lower_mid: f32,
    pub mid: f32,
    pub upper_mid: f32,
    pub presence: f32,
    pub brilliance: f32,
}

impl FrequencyBands {
    pub const ZERO: FrequencyBands = FrequencyBands {
        sub_bass: 0.0,
        bass: 0.0,
        lower_mid: 0.0,
        mid: 0.0,
        upper_mid: 0.0,
        presence: 0.0,
        brilliance: 0.0,
    };

    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::SubBass => self.sub_bass,
            Band::Bass => self.bass,
            Band::LowerMid => self.lower_mid,
            Band::Mid => self.mid,
            Band::UpperMid => self.upper_mid,
            Band::Presence => self.presence,
            Band::Brilliance => self.brilliance,
        }
    }

    pub fn set(&mut self, band: Band, value: f32) {
        let slot = match band {
            Band::SubBass => &mut self.sub_bass,
            Band::Bass => &mut self.bass,
            Band::LowerMid => &mut self.lower_mid,
            Band::Mid => &mut self.mid,
            Band::UpperMid => &mut self.upper_mid,
            Band::Presence => &mut self.presence,
            Band::Brilliance => &mut self.brilliance,
        };
        *slot = value;
    }

    pub fn to_array(&self) -> [f32; 7] {
        Band::ALL.map(|b| self.get(b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f32)> + '_ {
        Band::ALL.iter().map(move |&b| (b, self.get(b)))
    }
}

/// Map a frequency to its bin index for a snapshot of `bin_count` bins.
#[inline]
pub fn bin_for_frequency(freq_hz: f32, bin_count: usize, sample_rate: f32) -> usize {
    (freq_hz * bin_count as f32 / sample_rate).floor().max(0.0) as usize
}

/// Average the byte magnitudes of each band's bins and normalize to \[0, 1\].
///
/// A band whose bin range lies entirely outside the snapshot reads 0. A
/// non-positive or non-finite sample rate yields zero bands.
pub fn analyze(bins: &[u8], sample_rate: f32) -> FrequencyBands {
    let mut bands = FrequencyBands::ZERO;
    if bins.is_empty() || !(sample_rate.is_finite() && sample_rate > 0.0) {
        return bands;
    }
    let n = bins.len();
    for band in Band::ALL {
        let (low, high) = band.range_hz();
        let lo = bin_for_frequency(low, n, sample_rate);
        let hi = bin_for_frequency(high, n, sample_rate).min(n.saturating_sub(1));
        if lo > hi || lo >= n {
            continue;
        }
        let slice = &bins[lo..=hi];
        let sum: u32 = slice.iter().map(|&b| b as u32).sum();
        bands.set(band, sum as f32 / slice.len() as f32 / 255.0);
    }
    bands
}

/// Borrowed view of the newest magnitude snapshot.
#[derive(Clone, Copy, Debug)]
pub struct SpectrumFrame<'a> {
    pub bins: &'a [u8],
    pub sample_rate: f32,
}

/// Non-blocking pull source of magnitude snapshots (the audio collaborator).
pub trait SpectrumSource {
    /// Newest available snapshot, or `None` if nothing has been produced yet.
    fn latest(&mut self) -> Option<SpectrumFrame<'_>>;
}

/// Fixed snapshot source, handy for tests and for replaying captured data.
#[derive(Clone, Debug, Default)]
pub struct StaticSpectrum {
    pub bins: Vec<u8>,
    pub sample_rate: f32,
}

impl StaticSpectrum {
    pub fn new(bins: Vec<u8>, sample_rate: f32) -> Self {
        Self { bins, sample_rate }
    }
}

impl SpectrumSource for StaticSpectrum {
    fn latest(&mut self) -> Option<SpectrumFrame<'_>> {
        Some(SpectrumFrame {
            bins: &self.bins,
            sample_rate: self.sample_rate,
        })
    }
}

/// Polls an optional [`SpectrumSource`] and reduces each snapshot to bands.
#[derive(Default)]
pub struct SpectralAnalyzer {
    source: Option<Box<dyn SpectrumSource>>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self { source: None }
    }

    pub fn with_source(source: Box<dyn SpectrumSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn attach(&mut self, source: Box<dyn SpectrumSource>) {
        self.source = Some(source);
    }

    pub fn detach(&mut self) -> Option<Box<dyn SpectrumSource>> {
        self.source.take()
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    pub fn poll(&mut self) -> FrequencyBands {
        match self.source.as_mut().and_then(|s| s.latest()) {
            Some(frame) => analyze(frame.bins, frame.sample_rate),
            None => FrequencyBands::ZERO,
        }
    }
}

/// Turns raw mono PCM into byte magnitude snapshots.
///
/// Mirrors a browser analyser node: Blackman window, magnitudes normalized
/// by FFT size, exponential smoothing over successive windows, then a
/// linear map of \[min_db, max_db\] onto 0..=255.
pub struct PcmSpectrumSource {
    sample_rate: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    history: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    smoothing: f32,
    dirty: bool,
}

impl PcmSpectrumSource {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_fft_size(sample_rate, ANALYSER_FFT_SIZE)
    }

    pub fn with_fft_size(sample_rate: f32, fft_size: usize) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            sample_rate,
            fft,
            window: blackman_window(fft_size),
            history: Vec::with_capacity(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            bytes: vec![0; fft_size / 2],
            smoothing: ANALYSER_SMOOTHING,
            dirty: false,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn bin_count(&self) -> usize {
        self.bytes.len()
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }

    /// Append samples, keeping only the most recent FFT window.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.fft_size();
        if samples.len() >= size {
            self.history.clear();
            self.history
                .extend_from_slice(&samples[samples.len() - size..]);
        } else {
            self.history.extend_from_slice(samples);
            if self.history.len() > size {
                let excess = self.history.len() - size;
                self.history.drain(..excess);
            }
        }
        self.dirty = !samples.is_empty() || self.dirty;
    }

    fn recompute(&mut self) {
        let size = self.fft_size();
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            *slot = Complex::new(self.history[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let range = ANALYSER_MAX_DB - ANALYSER_MIN_DB;
        for k in 0..self.smoothed.len() {
            let magnitude = self.scratch[k].norm() / size as f32;
            let s = self.smoothing * self.smoothed[k] + (1.0 - self.smoothing) * magnitude;
            self.smoothed[k] = s;
            let db = if s > 0.0 {
                20.0 * s.log10()
            } else {
                ANALYSER_MIN_DB
            };
            let scaled = 255.0 * (db - ANALYSER_MIN_DB) / range;
            self.bytes[k] = scaled.clamp(0.0, 255.0) as u8;
        }
        self.dirty = false;
    }
}

impl SpectrumSource for PcmSpectrumSource {
    fn latest(&mut self) -> Option<SpectrumFrame<'_>> {
        if self.history.len() < self.fft_size() {
            return None;
        }
        if self.dirty {
            self.recompute();
        }
        Some(SpectrumFrame {
            bins: &self.bytes,
            sample_rate: self.sample_rate,
        })
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}
