use std::f32::consts::TAU;
use std::sync::Arc;

use anyhow::Context;
use spectra_core::{
    FrameScheduler, FrameView, PcmSpectrumSource, PerformanceEvent, PresetOverrides,
    PresetResolver, RenderBackend, SchedulerConfig, SpectralAnalyzer, SpectrumFrame,
    SpectrumSource,
};

const SAMPLE_RATE: f32 = 44_100.0;
const DEFAULT_FRAMES: u64 = 600;

/// Test signal: a 40 Hz kick every half second over a sustained 440 Hz tone
/// and a quiet 5 kHz shimmer, rendered one frame's worth at a time.
struct SyntheticSignal {
    pcm: PcmSpectrumSource,
    sample_index: u64,
    samples_per_frame: usize,
}

impl SyntheticSignal {
    fn new(sample_rate: f32, frame_rate: f32) -> Self {
        Self {
            pcm: PcmSpectrumSource::new(sample_rate),
            sample_index: 0,
            samples_per_frame: (sample_rate / frame_rate).round() as usize,
        }
    }

    fn render(&mut self) -> Vec<f32> {
        (0..self.samples_per_frame)
            .map(|_| {
                let t = self.sample_index as f32 / SAMPLE_RATE;
                self.sample_index += 1;
                let beat = t % 0.5;
                let kick = (TAU * 40.0 * t).sin() * (-beat * 12.0).exp();
                let tone = 0.3 * (TAU * 440.0 * t).sin();
                let shimmer = 0.05 * (TAU * 5_000.0 * t).sin();
                kick + tone + shimmer
            })
            .collect()
    }
}

impl SpectrumSource for SyntheticSignal {
    fn latest(&mut self) -> Option<SpectrumFrame<'_>> {
        let block = self.render();
        self.pcm.push_samples(&block);
        self.pcm.latest()
    }
}

#[derive(Default)]
struct LoggingBackend {
    frames: u64,
    uploads: u64,
}

impl RenderBackend for LoggingBackend {
    fn generation_changed(&mut self, view: &FrameView<'_>) {
        self.uploads += 1;
        let particles: usize = view.systems.iter().map(|s| s.len()).sum();
        log::info!(
            "upload generation {}: {} systems, {} particles, overlay {}",
            view.generation,
            view.systems.len(),
            particles,
            view.overlay
                .map(|o| format!("{:?} ({} vertices)", o.kind, o.buffer.vertex_count()))
                .unwrap_or_else(|| "none".to_owned())
        );
    }

    fn draw(&mut self, view: &FrameView<'_>) {
        self.frames += 1;
        if self.frames % 60 != 0 {
            return;
        }
        let b = &view.state.bands;
        let passes: Vec<&str> = view.effects.active().map(|s| s.kind.name()).collect();
        log::info!(
            "t={:.2}s subBass={:.2} bass={:.2} mid={:.2} brilliance={:.2} passes=[{}]",
            view.state.time,
            b.sub_bass,
            b.bass,
            b.mid,
            b.brilliance,
            passes.join(", ")
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let resolver = PresetResolver::new();
    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "default".to_owned());
    if name == "--list" {
        for preset in resolver.preset_names() {
            println!("{preset}");
        }
        return Ok(());
    }
    let frames: u64 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid frame count `{raw}`"))?,
        None => DEFAULT_FRAMES,
    };

    let mut preset = resolver.resolve(&name, &PresetOverrides::default())?;
    let config = SchedulerConfig::default();
    let analyzer = SpectralAnalyzer::with_source(Box::new(SyntheticSignal::new(
        SAMPLE_RATE,
        1.0 / config.fixed_step,
    )));
    let mut scheduler = FrameScheduler::new(config, analyzer);
    scheduler.apply_preset(Arc::new(preset.clone()));

    let mut backend = LoggingBackend::default();
    for _ in 0..frames {
        if !scheduler.tick(&mut backend) {
            break;
        }
        for event in scheduler.drain_events() {
            match event {
                PerformanceEvent::Degraded { fps } if !preset.performance_mode => {
                    log::warn!("frame rate degraded to {fps:.1}, enabling performance mode");
                    let overrides = PresetOverrides {
                        performance_mode: Some(true),
                        ..Default::default()
                    };
                    preset = resolver.update(&preset, &overrides);
                    scheduler.apply_preset(Arc::new(preset.clone()));
                }
                PerformanceEvent::Degraded { .. } => {}
                PerformanceEvent::Recovered { fps } => {
                    log::info!("frame rate recovered to {fps:.1}");
                }
            }
        }
    }

    scheduler.cancel();
    log::info!(
        "ran '{}' for {} frames ({} generations uploaded)",
        preset.name,
        backend.frames,
        backend.uploads
    );
    Ok(())
}
