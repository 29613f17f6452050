//! Static overlay geometry: sacred-geometry primitives, L-system fractals and
//! hyperbolic tilings.
//!
//! Every builder is a pure function of its arguments and returns a
//! [`GeometryBuffer`] of flat `xyz` triplets plus optional indices. The
//! renderer decides how to upload it; [`Primitive`] tells it how to draw.

pub mod fractal;
pub mod hyperbolic;
pub mod sacred;

pub use fractal::*;
pub use hyperbolic::*;
pub use sacred::*;

use crate::constants::*;
use crate::preset::VisualPreset;
use crate::random::Randomizer;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How a buffer's vertices (or indices) are meant to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// Consecutive vertex (or index) pairs form independent segments.
    LineList,
    /// One continuous polyline through every vertex in order.
    LineStrip,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBuffer {
    pub positions: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub primitive: Primitive,
}

impl GeometryBuffer {
    pub fn empty(primitive: Primitive) -> Self {
        Self {
            positions: Vec::new(),
            indices: None,
            primitive,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    /// Rewrite a non-indexed strip as an indexed line list so it can share
    /// an index buffer with other line lists.
    pub fn into_line_list(self) -> Self {
        if self.primitive == Primitive::LineList || self.indices.is_some() {
            return self;
        }
        let n = self.vertex_count() as u32;
        let indices = (1..n).flat_map(|i| [i - 1, i]).collect();
        Self {
            positions: self.positions,
            indices: Some(indices),
            primitive: Primitive::LineList,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

/// Which overlay shape a preset asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometryKind {
    /// Neural web: a Fibonacci-sphere node cloud with proximity edges.
    Default,
    Flower,
    Metatron,
    Spiral,
    Fractal,
    MergedSacred,
    Hyperbolic,
}

impl GeometryKind {
    const CYCLE: [GeometryKind; 7] = [
        GeometryKind::Flower,
        GeometryKind::Metatron,
        GeometryKind::Spiral,
        GeometryKind::Default,
        GeometryKind::Hyperbolic,
        GeometryKind::MergedSacred,
        GeometryKind::Fractal,
    ];

    /// Next kind in the "cycle geometry" order.
    pub fn next(self) -> Self {
        let i = Self::CYCLE.iter().position(|&k| k == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }
}

/// The three shapes a merged overlay may combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SacredShape {
    Flower,
    Metatron,
    Spiral,
}

impl SacredShape {
    pub fn build(self) -> GeometryBuffer {
        match self {
            SacredShape::Flower => flower_of_life(FLOWER_RADIUS, FLOWER_LAYERS),
            SacredShape::Metatron => metatrons_cube(METATRON_SIZE),
            SacredShape::Spiral => spiral(SPIRAL_TURNS, SPIRAL_POINTS_PER_TURN, SPIRAL_RADIUS),
        }
    }
}

/// Build the overlay buffer a preset asks for.
pub fn build_overlay(preset: &VisualPreset, randomizer: &mut Randomizer) -> GeometryBuffer {
    let kind = preset.geometry_type;
    let buffer = match kind {
        GeometryKind::Default => {
            neural_web(NEURAL_WEB_NODES, NEURAL_WEB_RADIUS, NEURAL_WEB_THRESHOLD)
        }
        GeometryKind::Flower => SacredShape::Flower.build(),
        GeometryKind::Metatron => SacredShape::Metatron.build(),
        GeometryKind::Spiral => SacredShape::Spiral.build(),
        GeometryKind::Hyperbolic => {
            let scale = randomizer.jitter_scale(preset.geometry_scale);
            hyperbolic_tiling(HYPERBOLIC_DEPTH, scale)
        }
        GeometryKind::Fractal => {
            let f = &preset.fractal_options;
            let rules = f.kind.rules();
            l_system_fractal(
                rules.axiom,
                rules.rules,
                f.iterations,
                f.effective_scale(),
                f.effective_angle(),
            )
        }
        GeometryKind::MergedSacred => {
            let m = &preset.merged_geometry_config;
            let primary = m.primary.build().into_line_list();
            let secondary = m.secondary.build().into_line_list();
            merge_buffers(
                &[primary, secondary],
                &[Vec3::ZERO, Vec3::new(0.0, 0.0, m.layer_offset)],
            )
        }
    };
    log::debug!(
        "[geometry] built {:?}: {} vertices, {} indices",
        kind,
        buffer.vertex_count(),
        buffer.index_count()
    );
    buffer
}
