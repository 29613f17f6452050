use crate::constants::{FPS_CONSECUTIVE_SAMPLES, FPS_SAMPLE_WINDOW_SEC, FPS_THRESHOLD};
use instant::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceConfig {
    pub threshold_fps: f32,
    /// Below-threshold samples in a row before degradation is signalled.
    pub consecutive_samples: u32,
    pub sample_window_sec: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            threshold_fps: FPS_THRESHOLD,
            consecutive_samples: FPS_CONSECUTIVE_SAMPLES,
            sample_window_sec: FPS_SAMPLE_WINDOW_SEC,
        }
    }
}

/// Advisory frame-rate conditions. Never fatal; a collaborator may react
/// by enabling performance mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PerformanceEvent {
    Degraded { fps: f32 },
    Recovered { fps: f32 },
}

/// Counts frames per sample window and watches for sustained low FPS.
#[derive(Clone, Debug)]
pub struct FrameRateMonitor {
    config: PerformanceConfig,
    window_start: Option<Instant>,
    frames: u32,
    below: u32,
    degraded: bool,
    last_fps: Option<f32>,
}

impl FrameRateMonitor {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            window_start: None,
            frames: 0,
            below: 0,
            degraded: false,
            last_fps: None,
        }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// FPS of the most recently completed sample window.
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Count one frame presented at `now`; closes the window once it spans
    /// `sample_window_sec`.
    pub fn record_frame(&mut self, now: Instant) -> Option<PerformanceEvent> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.duration_since(start).as_secs_f32();
        if elapsed < self.config.sample_window_sec {
            return None;
        }
        let fps = self.frames as f32 / elapsed;
        self.window_start = Some(now);
        self.frames = 0;
        self.record_sample(fps)
    }

    /// Feed one completed FPS sample.
    pub fn record_sample(&mut self, fps: f32) -> Option<PerformanceEvent> {
        self.last_fps = Some(fps);
        if fps < self.config.threshold_fps {
            self.below = self.below.saturating_add(1);
            if !self.degraded && self.below >= self.config.consecutive_samples {
                self.degraded = true;
                log::warn!(
                    "[perf] {} samples below {} fps (last {:.1})",
                    self.below,
                    self.config.threshold_fps,
                    fps
                );
                return Some(PerformanceEvent::Degraded { fps });
            }
        } else {
            self.below = 0;
            if self.degraded {
                self.degraded = false;
                log::info!("[perf] frame rate recovered ({:.1} fps)", fps);
                return Some(PerformanceEvent::Recovered { fps });
            }
        }
        None
    }
}
