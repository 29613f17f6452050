use super::{GeometryBuffer, Primitive};
use crate::constants::{HYPERBOLIC_EDGE_DISTANCE, HYPERBOLIC_MAX_POINTS, HYPERBOLIC_POLYGON_EDGES};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Project a Poincaré-disk point onto the unit sphere.
#[inline]
pub fn disk_to_sphere(p: Vec2) -> Vec3 {
    let r2 = p.length_squared();
    let denom = 1.0 + r2;
    Vec3::new(2.0 * p.x / denom, 2.0 * p.y / denom, (r2 - 1.0) / denom)
}

/// Sample the rings of a hyperbolic tessellation and project them to 3D.
///
/// Ring `d` sits at disk radius `tanh(d / 2) * scale` and carries
/// `floor(2π r · 7)` evenly spaced points; ring 0 is therefore empty.
/// Projected points are scaled by `scale`, and every pair of scaled points
/// closer than `HYPERBOLIC_EDGE_DISTANCE` is joined. Rings that would push
/// the total past `HYPERBOLIC_MAX_POINTS` are skipped.
pub fn hyperbolic_tiling(depth: u32, scale: f32) -> GeometryBuffer {
    let mut points: Vec<Vec3> = Vec::new();
    for d in 0..depth {
        let r = (d as f32 * 0.5).tanh() * scale;
        let count = (TAU * r * HYPERBOLIC_POLYGON_EDGES).floor().max(0.0) as usize;
        if points.len() + count > HYPERBOLIC_MAX_POINTS {
            log::warn!(
                "[geometry] hyperbolic tiling truncated at ring {} of {} ({} points)",
                d,
                depth,
                points.len()
            );
            break;
        }
        for i in 0..count {
            let theta = TAU * i as f32 / count as f32;
            let disk = Vec2::new(r * theta.cos(), r * theta.sin());
            points.push(disk_to_sphere(disk) * scale);
        }
    }

    let mut indices = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            if points[i].distance(points[j]) < HYPERBOLIC_EDGE_DISTANCE {
                indices.extend_from_slice(&[i as u32, j as u32]);
            }
        }
    }

    GeometryBuffer {
        positions: points.iter().flat_map(|p| p.to_array()).collect(),
        indices: Some(indices),
        primitive: Primitive::LineList,
    }
}
