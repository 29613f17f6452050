// Integration tests for band extraction and the PCM spectrum source.

use proptest::prelude::*;
use spectra_core::*;
use std::f32::consts::TAU;

#[test]
fn all_zero_snapshot_yields_zero_bands() {
    let bands = analyze(&[0u8; 1024], 44_100.0);
    assert_eq!(bands, FrequencyBands::ZERO);
}

#[test]
fn empty_snapshot_and_bad_sample_rate_yield_zero_bands() {
    assert_eq!(analyze(&[], 44_100.0), FrequencyBands::ZERO);
    assert_eq!(analyze(&[255u8; 512], 0.0), FrequencyBands::ZERO);
    assert_eq!(analyze(&[255u8; 512], f32::NAN), FrequencyBands::ZERO);
}

#[test]
fn full_scale_snapshot_yields_unit_bands() {
    let bands = analyze(&[255u8; 1024], 48_000.0);
    for (band, value) in bands.iter() {
        assert!((value - 1.0).abs() < 1e-6, "{band:?} = {value}");
    }
}

#[test]
fn energy_in_sub_bass_bins_only_drives_sub_bass() {
    let n = 16_384;
    let sr = 44_100.0;
    let lo = bin_for_frequency(20.0, n, sr);
    let hi = bin_for_frequency(60.0, n, sr);
    assert_eq!((lo, hi), (7, 22));

    let mut bins = vec![0u8; n];
    for b in &mut bins[lo..=hi] {
        *b = 200;
    }
    let bands = analyze(&bins, sr);
    assert!((bands.sub_bass - 200.0 / 255.0).abs() < 1e-6);
    // bin 22 is shared with the bass range (22..=92)
    assert!(bands.bass > 0.0 && bands.bass < 0.02, "bass = {}", bands.bass);
    assert_eq!(bands.lower_mid, 0.0);
    assert_eq!(bands.mid, 0.0);
    assert_eq!(bands.upper_mid, 0.0);
    assert_eq!(bands.presence, 0.0);
    assert_eq!(bands.brilliance, 0.0);
}

#[test]
fn bands_beyond_nyquist_of_short_snapshot_read_zero() {
    // 16 bins at 8 kHz: brilliance starts at bin 12, presence covers 8..=12
    let bins = [100u8; 16];
    let bands = analyze(&bins, 8_000.0);
    assert!(bands.brilliance > 0.0);
    // 4 bins at 4 kHz: presence starts at bin 4, brilliance at bin 6
    let bands = analyze(&bins[..4], 4_000.0);
    assert!((bands.upper_mid - 100.0 / 255.0).abs() < 1e-6);
    assert_eq!(bands.presence, 0.0);
    assert_eq!(bands.brilliance, 0.0);
}

#[test]
fn analyzer_without_source_reports_zeros() {
    let mut analyzer = SpectralAnalyzer::new();
    assert!(!analyzer.is_attached());
    assert_eq!(analyzer.poll(), FrequencyBands::ZERO);
}

#[test]
fn analyzer_polls_attached_source_and_detaches() {
    let mut analyzer = SpectralAnalyzer::new();
    analyzer.attach(Box::new(StaticSpectrum::new(vec![255; 1024], 44_100.0)));
    assert!(analyzer.poll().mid > 0.99);
    assert!(analyzer.detach().is_some());
    assert_eq!(analyzer.poll(), FrequencyBands::ZERO);
}

#[test]
fn frequency_bands_lookup_matches_fields() {
    let mut bands = FrequencyBands::ZERO;
    for (i, band) in Band::ALL.iter().enumerate() {
        bands.set(*band, i as f32 / 10.0);
    }
    assert_eq!(bands.to_array(), [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    assert_eq!(bands.get(Band::Presence), bands.presence);
}

#[test]
fn pcm_source_yields_nothing_before_a_full_window() {
    let mut pcm = PcmSpectrumSource::new(44_100.0);
    assert_eq!(pcm.fft_size(), 2048);
    assert_eq!(pcm.bin_count(), 1024);
    pcm.push_samples(&[0.5; 1000]);
    assert!(pcm.latest().is_none());

    let mut analyzer = SpectralAnalyzer::with_source(Box::new(pcm));
    assert_eq!(analyzer.poll(), FrequencyBands::ZERO);
}

#[test]
fn pcm_silence_maps_to_zero_bytes() {
    let mut pcm = PcmSpectrumSource::new(44_100.0);
    pcm.push_samples(&[0.0; 2048]);
    let frame = pcm.latest().expect("full window");
    assert!(frame.bins.iter().all(|&b| b == 0));
}

#[test]
fn pcm_tone_lands_in_its_band() {
    let sr = 44_100.0;
    let samples: Vec<f32> = (0..2048)
        .map(|i| (TAU * 800.0 * i as f32 / sr).sin())
        .collect();
    let mut pcm = PcmSpectrumSource::new(sr);
    pcm.push_samples(&samples);

    let frame = pcm.latest().expect("full window");
    let peak = frame
        .bins
        .iter()
        .enumerate()
        .max_by_key(|&(_, &b)| b)
        .map(|(i, _)| i)
        .unwrap();
    assert!((36..=38).contains(&peak), "peak bin {peak}");

    let bands = analyze(frame.bins, frame.sample_rate);
    assert!(bands.mid > 0.05, "mid = {}", bands.mid);
    for band in [Band::SubBass, Band::Bass, Band::LowerMid, Band::UpperMid, Band::Presence, Band::Brilliance] {
        assert!(bands.get(band) < 0.01, "{band:?} = {}", bands.get(band));
    }
}

#[test]
fn pcm_smoothing_accumulates_across_windows() {
    let sr = 44_100.0;
    let tone: Vec<f32> = (0..2048)
        .map(|i| (TAU * 800.0 * i as f32 / sr).sin())
        .collect();
    let mut pcm = PcmSpectrumSource::new(sr);
    pcm.push_samples(&tone);
    let first = pcm.latest().map(|f| f.bins[40]).unwrap();
    pcm.push_samples(&tone);
    let second = pcm.latest().map(|f| f.bins[40]).unwrap();
    assert!(second >= first);
}

proptest! {
    #[test]
    fn bands_stay_in_unit_range(
        bins in proptest::collection::vec(any::<u8>(), 1..4096),
        sr in 8_000.0f32..192_000.0,
    ) {
        let bands = analyze(&bins, sr);
        for value in bands.to_array() {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}
