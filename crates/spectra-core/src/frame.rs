//! Per-frame driver tying the analyzer, engine and effect registry together.
//!
//! One [`FrameScheduler::tick`] is one display refresh: poll bands, advance
//! simulation time by a fixed step, update particles, overlay and effect
//! uniforms, then hand a [`FrameView`] to the render backend. The host loop
//! owns the timing; the scheduler only needs to be ticked and, eventually,
//! cancelled.

use crate::constants::FIXED_STEP_SEC;
use crate::effects::EffectRegistry;
use crate::particles::{ParticleSystem, ParticleSystemEngine, SacredOverlay};
use crate::perf::{FrameRateMonitor, PerformanceConfig, PerformanceEvent};
use crate::preset::VisualPreset;
use crate::spectrum::{FrequencyBands, SpectralAnalyzer};
use instant::Instant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mutable simulation clock and the bands it was last advanced with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationState {
    pub time: f32,
    pub frame_index: u64,
    pub bands: FrequencyBands,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub fixed_step: f32,
    /// Seed for particle placement; the same seed reproduces every generation.
    pub seed: u64,
    pub performance: PerformanceConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_step: FIXED_STEP_SEC,
            seed: 0,
            performance: PerformanceConfig::default(),
        }
    }
}

/// Everything a backend needs to draw one frame. Borrowed for the duration
/// of the callback only.
pub struct FrameView<'a> {
    pub state: &'a SimulationState,
    pub preset: &'a VisualPreset,
    pub generation: u64,
    pub systems: &'a [ParticleSystem],
    pub overlay: Option<&'a SacredOverlay>,
    pub effects: &'a EffectRegistry,
}

/// The external renderer. The core never issues draw calls itself.
pub trait RenderBackend {
    /// A new generation replaced the previous one; release any GPU resources
    /// built from the old buffers before uploading these.
    fn generation_changed(&mut self, _view: &FrameView<'_>) {}

    fn draw(&mut self, view: &FrameView<'_>);
}

/// Cloneable stop flag, usable from whichever owner tears the view down.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct FrameScheduler {
    config: SchedulerConfig,
    state: SimulationState,
    analyzer: SpectralAnalyzer,
    engine: ParticleSystemEngine,
    effects: EffectRegistry,
    monitor: FrameRateMonitor,
    preset: Option<Arc<VisualPreset>>,
    drawn_generation: u64,
    events: Vec<PerformanceEvent>,
    cancel: CancelHandle,
    stopped: bool,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig, analyzer: SpectralAnalyzer) -> Self {
        Self {
            engine: ParticleSystemEngine::new(config.seed),
            monitor: FrameRateMonitor::new(config.performance),
            config,
            state: SimulationState::default(),
            analyzer,
            effects: EffectRegistry::new(),
            preset: None,
            drawn_generation: 0,
            events: Vec::new(),
            cancel: CancelHandle::default(),
            stopped: false,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn engine(&self) -> &ParticleSystemEngine {
        &self.engine
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn analyzer_mut(&mut self) -> &mut SpectralAnalyzer {
        &mut self.analyzer
    }

    pub fn preset(&self) -> Option<&Arc<VisualPreset>> {
        self.preset.as_ref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Swap in a newly resolved preset, rebuilding particles and overlay.
    pub fn apply_preset(&mut self, preset: Arc<VisualPreset>) {
        if self.cancel.is_cancelled() {
            self.stop();
            return;
        }
        self.engine.activate(&preset);
        self.effects.configure(&preset);
        self.preset = Some(preset);
    }

    /// Run one frame using the wall clock for frame-rate sampling.
    pub fn tick(&mut self, backend: &mut dyn RenderBackend) -> bool {
        self.tick_at(backend, Instant::now())
    }

    /// Run one frame presented at `now`. Returns `false` once cancelled, in
    /// which case nothing was mutated or drawn.
    pub fn tick_at(&mut self, backend: &mut dyn RenderBackend, now: Instant) -> bool {
        if self.cancel.is_cancelled() {
            self.stop();
            return false;
        }

        self.state.bands = self.analyzer.poll();
        self.state.time += self.config.fixed_step;
        self.state.frame_index += 1;

        if let Some(preset) = self.preset.clone() {
            self.engine.update(self.state.time, &self.state.bands, &preset);
            self.effects.update(self.state.time, &self.state.bands, &preset);

            let generation = self.engine.generation();
            let view = FrameView {
                state: &self.state,
                preset: &preset,
                generation,
                systems: self.engine.systems(),
                overlay: self.engine.overlay(),
                effects: &self.effects,
            };
            if generation != self.drawn_generation {
                backend.generation_changed(&view);
                self.drawn_generation = generation;
            }
            backend.draw(&view);
        }

        if let Some(event) = self.monitor.record_frame(now) {
            self.events.push(event);
        }
        true
    }

    /// Performance events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<PerformanceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cancel and release the engine immediately.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.stop();
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.engine.shutdown();
        log::info!(
            "[frame] scheduler stopped after {} frames",
            self.state.frame_index
        );
    }
}
