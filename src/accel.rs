//! This module contains acceleration calculations: the Lorentz force, and the two ways of sampling
//! the field at a particle.
//!
//! Both samplers have the same shape, `(particle id, position) -> EmField`, so the integrator
//! doesn't care which one it's given.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;

use crate::{
    field::{field_at_point, field_from_charge, EmField, FieldSources},
    mesh::{interpolate, particle_stencil, Cell, MeshProperties, ParticleStencil, NO_CELL},
    particles::ParticleBuffers,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode)]
pub enum SamplingMode {
    /// Evaluate the field directly at each particle: all sources, pairwise. O(N²) with particle
    /// contributions on.
    Exact,
    /// Interpolate from the 8 surrounding cells.
    #[default]
    Pic,
}

/// a = (q/m)(E + v × B)
pub fn acc_lorentz(q_m: f64, vel: Vec3, field: &EmField) -> Vec3 {
    (field.e + vel.cross(field.b)) * q_m
}

/// Direct evaluation at the particle's position. The particle being sampled is excluded from its
/// own field.
pub fn sampler_exact<'a>(sources: FieldSources<'a>) -> impl Fn(usize, Vec3) -> EmField + Sync + 'a {
    move |id, posit| field_at_point(posit, &sources, Some(id))
}

fn interpolate_fields(e: &[Vec3], b: &[Vec3], stencil: &ParticleStencil) -> EmField {
    EmField {
        e: interpolate(e, stencil),
        b: interpolate(b, stencil),
    }
}

/// The part of the interpolated cell field that particle `id` put there itself.
fn self_field(
    stencil: &ParticleStencil,
    cells: &[Cell],
    particles: &ParticleBuffers,
    id: usize,
) -> EmField {
    let mut result = EmField::zero();

    let (Some(ps), Some(vel)) = (particles.posits().get(id), particles.vels().get(id)) else {
        return result;
    };
    let q = ps.charge();
    if q == 0. {
        return result;
    }

    for (idx, w) in stencil.indices.iter().zip(stencil.weights) {
        if *idx == NO_CELL {
            continue;
        }
        let Some(cell) = cells.get(*idx as usize) else {
            continue;
        };
        // Inactive cells carry no field, including this particle's.
        if !cell.is_active {
            continue;
        }

        let f = field_from_charge(cell.center, ps.posit, *vel, q);
        result.e += f.e * w;
        result.b += f.b * w;
    }

    result
}

/// Sample the solved cell fields, with trilinear interpolation. Off-mesh corners are zero-padded.
///
/// `particles` must be `Some` exactly when the cell fields include particle contributions. Each
/// particle's own contribution to its stencil cells is then interpolated the same way and
/// subtracted, so a particle doesn't push itself.
pub fn sampler_pic<'a>(
    mesh: &'a MeshProperties,
    cells: &'a [Cell],
    e: &'a [Vec3],
    b: &'a [Vec3],
    particles: Option<&'a ParticleBuffers>,
) -> impl Fn(usize, Vec3) -> EmField + Sync + 'a {
    move |id, posit| {
        let stencil = particle_stencil(posit, mesh);

        let mut result = interpolate_fields(e, b, &stencil);

        if let Some(particles) = particles {
            let own = self_field(&stencil, cells, particles, id);
            result.e = result.e - own.e;
            result.b = result.b - own.b;
        }

        result
    }
}
