use super::{GeometryBuffer, Primitive};
use crate::constants::FLOWER_SEGMENTS;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Concentric rings of circles.
///
/// Layer 0 is one circle at the origin; layer `k >= 1` places `6k` circles
/// on a ring of radius `radius * (k + 1) / layers`. Every circle has radius
/// `radius / layers` and is sampled as a closed loop of `FLOWER_SEGMENTS + 1`
/// points with one `(v, v + 1, v + 2)` index triple per segment; the final
/// triple wraps to the circle's own first vertex.
pub fn flower_of_life(radius: f32, layers: u32) -> GeometryBuffer {
    if layers == 0 {
        return GeometryBuffer::empty(Primitive::LineList);
    }
    let segments = FLOWER_SEGMENTS;
    let ring_points = segments + 1;
    let circle_radius = radius / layers as f32;
    let circles = 1 + 3 * layers * (layers - 1);

    let mut positions = Vec::with_capacity((circles * ring_points * 3) as usize);
    let mut indices = Vec::with_capacity((circles * segments * 3) as usize);
    let mut base = 0u32;

    for layer in 0..layers {
        let (count, ring_radius) = if layer == 0 {
            (1, 0.0)
        } else {
            (6 * layer, radius * (layer + 1) as f32 / layers as f32)
        };
        let step = TAU / count as f32;
        for c in 0..count {
            let angle = c as f32 * step;
            let cx = ring_radius * angle.cos();
            let cy = ring_radius * angle.sin();
            for s in 0..ring_points {
                let a = s as f32 / segments as f32 * TAU;
                positions.extend_from_slice(&[
                    cx + circle_radius * a.cos(),
                    cy + circle_radius * a.sin(),
                    0.0,
                ]);
                if s < segments {
                    indices.extend_from_slice(&[
                        base + s,
                        base + s + 1,
                        base + (s + 2) % ring_points,
                    ]);
                }
            }
            base += ring_points;
        }
    }

    GeometryBuffer {
        positions,
        indices: Some(indices),
        primitive: Primitive::LineList,
    }
}

/// Cube (half-extent `size / 2`) plus octahedron (extent `size`) skeleton.
///
/// The cube contributes its 12 face edges. All 15 pairs of octahedron
/// vertices are joined, not just the solid's own 12 edges.
///
/// That makes 27 line segments (54 indices). Counting only one face ring
/// of the cube gives 25; every cube edge is emitted here, so both faces'
/// rings are drawn.
pub fn metatrons_cube(size: f32) -> GeometryBuffer {
    const CUBE: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    const OCTA: [[f32; 3]; 6] = [
        [0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];

    let half = size / 2.0;
    let mut positions = Vec::with_capacity(14 * 3);
    for v in CUBE {
        positions.extend(v.map(|c| c * half));
    }
    for v in OCTA {
        positions.extend(v.map(|c| c * size));
    }

    let mut indices = Vec::with_capacity(27 * 2);
    for i in 0..4u32 {
        indices.extend_from_slice(&[i, (i + 1) % 4]);
        indices.extend_from_slice(&[i + 4, (i + 1) % 4 + 4]);
        indices.extend_from_slice(&[i, i + 4]);
    }
    for i in 8..14u32 {
        for j in (i + 1)..14 {
            indices.extend_from_slice(&[i, j]);
        }
    }

    GeometryBuffer {
        positions,
        indices: Some(indices),
        primitive: Primitive::LineList,
    }
}

/// Archimedean spiral rising along +Z, drawn as one strip.
pub fn spiral(turns: u32, points_per_turn: u32, radius: f32) -> GeometryBuffer {
    if turns == 0 || points_per_turn == 0 {
        return GeometryBuffer::empty(Primitive::LineStrip);
    }
    let total = turns * points_per_turn;
    let mut positions = Vec::with_capacity(total as usize * 3);
    for i in 0..total {
        let t = i as f32 / points_per_turn as f32;
        let angle = t * TAU;
        let progress = t / turns as f32;
        let r = progress * radius;
        positions.extend_from_slice(&[r * angle.cos(), r * angle.sin(), progress * radius * 0.5]);
    }
    GeometryBuffer {
        positions,
        indices: None,
        primitive: Primitive::LineStrip,
    }
}

/// Fibonacci-sphere node cloud with an edge between every pair of nodes
/// closer than `threshold`. Pairwise, so keep `node_count` in the hundreds.
pub fn neural_web(node_count: u32, radius: f32, threshold: f32) -> GeometryBuffer {
    let n = node_count as f32;
    let nodes: Vec<Vec3> = (0..node_count)
        .map(|i| {
            let phi = (-1.0 + 2.0 * i as f32 / n).clamp(-1.0, 1.0).acos();
            let theta = (n * PI).sqrt() * phi;
            Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            )
        })
        .collect();

    let mut indices = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            if nodes[i].distance(nodes[j]) < threshold {
                indices.extend_from_slice(&[i as u32, j as u32]);
            }
        }
    }

    GeometryBuffer {
        positions: nodes.iter().flat_map(|v| v.to_array()).collect(),
        indices: Some(indices),
        primitive: Primitive::LineList,
    }
}

/// Concatenate buffers, shifting each by its paired offset and rebasing its
/// indices onto the combined vertex array. Missing offsets count as zero;
/// buffers without indices contribute vertices only.
pub fn merge_buffers(buffers: &[GeometryBuffer], offsets: &[Vec3]) -> GeometryBuffer {
    let total: usize = buffers.iter().map(|b| b.positions.len()).sum();
    let mut positions = Vec::with_capacity(total);
    let mut indices = Vec::new();
    let mut vertex_offset = 0u32;

    for (i, buffer) in buffers.iter().enumerate() {
        let offset = offsets.get(i).copied().unwrap_or(Vec3::ZERO);
        for v in buffer.positions.chunks_exact(3) {
            positions.extend_from_slice(&[v[0] + offset.x, v[1] + offset.y, v[2] + offset.z]);
        }
        if let Some(src) = &buffer.indices {
            indices.extend(src.iter().map(|&ix| ix + vertex_offset));
        }
        vertex_offset += buffer.vertex_count() as u32;
    }

    GeometryBuffer {
        positions,
        indices: Some(indices),
        primitive: Primitive::LineList,
    }
}
