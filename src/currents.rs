//! Current sources: coils discretized into straight current segments, for Biot-Savart.

use std::f64::consts::TAU;

use lin_alg::f64::{Quaternion, Vec3};

/// One straight segment of a current-carrying conductor.
#[derive(Clone, Copy, Debug)]
pub struct CurrentVector {
    /// Segment start. m
    pub x: Vec3,
    /// Start to end. m
    pub dx: Vec3,
    /// A
    pub i: f64,
}

impl CurrentVector {
    pub fn midpoint(&self) -> Vec3 {
        self.x + self.dx * 0.5
    }
}

/// Chain a ring of points into segments; each `dx` points to the next point, and the last wraps
/// to the first.
fn close_loop(points: &[Vec3], current: f64) -> Vec<CurrentVector> {
    let n = points.len();

    (0..n)
        .map(|k| {
            let next = points[(k + 1) % n];
            CurrentVector {
                x: points[k],
                dx: next - points[k],
                i: current,
            }
        })
        .collect()
}

/// A circular loop of `segments` segments. Current circulates counter-clockwise looking down
/// `normal`.
pub fn current_loop(
    center: Vec3,
    normal: Vec3,
    radius: f64,
    segments: usize,
    current: f64,
) -> Vec<CurrentVector> {
    if segments == 0 {
        return Vec::new();
    }

    let z_axis = Vec3::new(0., 0., 1.);
    let normal = normal.to_normalized();

    // Rotate the ring from the local XY plane, so its normal goes from +Z to `normal`.
    let axis = z_axis.cross(normal);
    let rotator = if axis.magnitude() < 1e-12 {
        if normal.z >= 0. {
            Quaternion::new_identity()
        } else {
            Quaternion::from_axis_angle(Vec3::new(1., 0., 0.), TAU / 2.)
        }
    } else {
        Quaternion::from_axis_angle(axis.to_normalized(), z_axis.dot(normal).clamp(-1., 1.).acos())
    };

    let points: Vec<Vec3> = (0..segments)
        .map(|k| {
            let θ = TAU * k as f64 / segments as f64;
            center + rotator.rotate_vec(Vec3::new(radius * θ.cos(), radius * θ.sin(), 0.))
        })
        .collect();

    close_loop(&points, current)
}

/// The toroidal field coils of a tokamak. The torus is symmetric about +Y, with major radius
/// `r1`; each coil is a ring of radius `r2` around the torus tube, facing the azimuthal
/// direction, so the coils together produce a toroidal B field.
///
/// Pure function of its inputs: same parameters give bit-identical segments.
pub fn toroidal_coils(
    r1: f64,
    r2: f64,
    num_coils: usize,
    coil_loop_segments: usize,
    current: f64,
) -> Vec<Vec<CurrentVector>> {
    let y_axis = Vec3::new(0., 1., 0.);
    let mut result = Vec::with_capacity(num_coils);

    for c in 0..num_coils {
        let φ = TAU * c as f64 / num_coils as f64;
        // The local XY plane, moved out to the major radius at φ = 0, faces the azimuthal
        // direction (±Z) already; rotating about Y places the coil.
        let placement = Quaternion::from_axis_angle(y_axis, φ);

        let points: Vec<Vec3> = (0..coil_loop_segments)
            .map(|k| {
                let θ = TAU * k as f64 / coil_loop_segments as f64;
                let local = Vec3::new(r1 + r2 * θ.cos(), r2 * θ.sin(), 0.);
                placement.rotate_vec(local)
            })
            .collect();

        result.push(close_loop(&points, current));
    }

    result
}

/// Flatten to the buffer format the field solver consumes: per segment, `[x, 0]`, `[dx, 0]`,
/// `[i, 0, 0, 0]`.
pub fn unroll_currents(segments: &[CurrentVector]) -> Vec<[f64; 4]> {
    let mut result = Vec::with_capacity(segments.len() * 3);

    for seg in segments {
        result.push([seg.x.x, seg.x.y, seg.x.z, 0.]);
        result.push([seg.dx.x, seg.dx.y, seg.dx.z, 0.]);
        result.push([seg.i, 0., 0., 0.]);
    }

    result
}
