//! Named post-processing passes and their per-frame uniform blocks.
//!
//! The registry holds one slot per pass in draw order. Uniform blocks are
//! `#[repr(C)]` and `Pod`, so a backend can upload `slot.uniforms.as_bytes()`
//! directly.

use crate::constants::PERFORMANCE_MAX_FRACTAL_ITERATIONS;
use crate::preset::VisualPreset;
use crate::spectrum::FrequencyBands;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Bloom,
    PsychedelicTransition,
    FluidDistortion,
    FractalRayMarch,
    ChromaticAberration,
    VolumetricLight,
}

impl EffectKind {
    /// Draw order.
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Bloom,
        EffectKind::PsychedelicTransition,
        EffectKind::FluidDistortion,
        EffectKind::FractalRayMarch,
        EffectKind::ChromaticAberration,
        EffectKind::VolumetricLight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Bloom => "bloom",
            EffectKind::PsychedelicTransition => "psychedelicTransition",
            EffectKind::FluidDistortion => "fluidDistortion",
            EffectKind::FractalRayMarch => "fractalRayMarch",
            EffectKind::ChromaticAberration => "chromaticAberration",
            EffectKind::VolumetricLight => "volumetricLight",
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniforms {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PsychedelicUniforms {
    pub time: f32,
    pub amplitude: f32,
    pub color_cycle: f32,
    pub distortion: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FluidUniforms {
    pub time: f32,
    pub distortion_amount: f32,
    pub frequency: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FractalUniforms {
    pub time: f32,
    pub amplitude: f32,
    pub scale: f32,
    pub morph_factor: f32,
    pub color_shift: f32,
    pub complexity: f32,
    pub max_iterations: f32,
    pub _pad: f32,
    /// subBass, bass, mid, upperMid, presence, brilliance.
    pub frequency_data: [f32; 6],
    pub _pad2: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChromaticUniforms {
    pub time: f32,
    pub distortion: f32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumetricUniforms {
    pub light_position: [f32; 2],
    pub exposure: f32,
    pub decay: f32,
    pub density: f32,
    pub weight: f32,
    pub _pad: [f32; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectUniforms {
    Bloom(BloomUniforms),
    PsychedelicTransition(PsychedelicUniforms),
    FluidDistortion(FluidUniforms),
    FractalRayMarch(FractalUniforms),
    ChromaticAberration(ChromaticUniforms),
    VolumetricLight(VolumetricUniforms),
}

impl EffectUniforms {
    fn zeroed(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Bloom => EffectUniforms::Bloom(BloomUniforms {
                radius: 0.4,
                threshold: 0.85,
                ..Default::default()
            }),
            EffectKind::PsychedelicTransition => {
                EffectUniforms::PsychedelicTransition(Default::default())
            }
            EffectKind::FluidDistortion => EffectUniforms::FluidDistortion(Default::default()),
            EffectKind::FractalRayMarch => EffectUniforms::FractalRayMarch(Default::default()),
            EffectKind::ChromaticAberration => {
                EffectUniforms::ChromaticAberration(Default::default())
            }
            EffectKind::VolumetricLight => EffectUniforms::VolumetricLight(VolumetricUniforms {
                light_position: [0.5, 0.5],
                decay: 0.95,
                weight: 0.4,
                ..Default::default()
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EffectUniforms::Bloom(u) => bytemuck::bytes_of(u),
            EffectUniforms::PsychedelicTransition(u) => bytemuck::bytes_of(u),
            EffectUniforms::FluidDistortion(u) => bytemuck::bytes_of(u),
            EffectUniforms::FractalRayMarch(u) => bytemuck::bytes_of(u),
            EffectUniforms::ChromaticAberration(u) => bytemuck::bytes_of(u),
            EffectUniforms::VolumetricLight(u) => bytemuck::bytes_of(u),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSlot {
    pub kind: EffectKind,
    pub enabled: bool,
    pub uniforms: EffectUniforms,
}

/// Explicit handles to every effect pass, looked up by [`EffectKind`].
#[derive(Clone, Debug)]
pub struct EffectRegistry {
    slots: SmallVec<[EffectSlot; 8]>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        let slots = EffectKind::ALL
            .iter()
            .map(|&kind| EffectSlot {
                kind,
                enabled: true,
                uniforms: EffectUniforms::zeroed(kind),
            })
            .collect();
        Self { slots }
    }

    pub fn get(&self, kind: EffectKind) -> Option<&EffectSlot> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        self.get(kind).is_some_and(|s| s.enabled)
    }

    /// Enabled slots in draw order.
    pub fn active(&self) -> impl Iterator<Item = &EffectSlot> + '_ {
        self.slots.iter().filter(|s| s.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectSlot> + '_ {
        self.slots.iter()
    }

    pub fn fractal(&self) -> Option<&FractalUniforms> {
        match self.get(EffectKind::FractalRayMarch)?.uniforms {
            EffectUniforms::FractalRayMarch(ref u) => Some(u),
            _ => None,
        }
    }

    /// Apply the preset's static settings. Called on every activation.
    pub fn configure(&mut self, preset: &VisualPreset) {
        for slot in &mut self.slots {
            slot.enabled = match slot.kind {
                EffectKind::ChromaticAberration | EffectKind::VolumetricLight => {
                    !preset.performance_mode
                }
                _ => true,
            };
            match &mut slot.uniforms {
                EffectUniforms::Bloom(u) => {
                    u.strength = if preset.performance_mode {
                        preset.bloom_strength.min(crate::constants::PERFORMANCE_MAX_BLOOM)
                    } else {
                        preset.bloom_strength
                    };
                }
                EffectUniforms::PsychedelicTransition(u) => {
                    u.distortion = preset.psychedelic_intensity;
                }
                EffectUniforms::FractalRayMarch(u) => {
                    u.max_iterations = max_fractal_iterations(preset) as f32;
                }
                _ => {}
            }
        }
        log::debug!(
            "[effects] configured for '{}': {} of {} passes enabled",
            preset.name,
            self.active().count(),
            self.slots.len()
        );
    }

    /// Map the current bands onto every pass's uniforms.
    pub fn update(&mut self, time: f32, bands: &FrequencyBands, preset: &VisualPreset) {
        let motion = preset.motion_scale();
        let perf = preset.performance_scale();
        let b = bands;
        for slot in &mut self.slots {
            match &mut slot.uniforms {
                EffectUniforms::Bloom(_) => {}
                EffectUniforms::PsychedelicTransition(u) => {
                    u.time = time;
                    u.amplitude = (b.sub_bass + b.bass) * 0.5;
                    u.color_cycle = time * 0.1;
                    u.distortion = preset.psychedelic_intensity;
                }
                EffectUniforms::FluidDistortion(u) => {
                    u.time = time;
                    u.distortion_amount = (b.sub_bass + b.bass) * 0.15 * motion * perf;
                    u.frequency = (b.presence + b.brilliance) * 12.0 * motion * perf;
                }
                EffectUniforms::FractalRayMarch(u) => {
                    u.time = time;
                    u.amplitude = 0.5 + b.sub_bass * 0.7;
                    u.scale = 1.0 + b.bass * 0.5;
                    u.morph_factor = (b.lower_mid + b.mid) * perf;
                    u.color_shift = (b.presence + b.brilliance) * 0.5;
                    u.complexity = 1.0 + b.upper_mid * 2.0 * perf;
                    u.max_iterations = max_fractal_iterations(preset) as f32;
                    u.frequency_data =
                        [b.sub_bass, b.bass, b.mid, b.upper_mid, b.presence, b.brilliance];
                }
                EffectUniforms::ChromaticAberration(u) => {
                    u.time = time;
                    u.distortion = preset.chromatic_aberration + b.sub_bass * 0.4 + b.bass * 0.3;
                }
                EffectUniforms::VolumetricLight(u) => {
                    u.light_position = [
                        0.5 + (time * 0.5).cos() * 0.3,
                        0.5 + (time * 0.3).sin() * 0.2,
                    ];
                    u.exposure = preset.volumetric_intensity + b.lower_mid * 0.15 + b.mid * 0.15;
                    u.density = 0.4 + b.upper_mid * 0.2 + b.presence * 0.2;
                }
            }
        }
    }
}

fn max_fractal_iterations(preset: &VisualPreset) -> u32 {
    let iterations = preset.fractal_options.iterations;
    if preset.performance_mode {
        iterations.min(PERFORMANCE_MAX_FRACTAL_ITERATIONS)
    } else {
        iterations
    }
}
