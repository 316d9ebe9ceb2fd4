//! The field solver. Computes E and B from coil currents (Biot-Savart), the central solenoid's
//! induced E, and optionally the particles themselves.
//!
//! Every source contributes nothing when it coincides with the field point (separation below
//! `SEPARATION_EPS`), instead of blowing up.

use std::f64::consts::TAU;

use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::{
    currents::CurrentVector,
    mesh::Cell,
    particles::ParticleBuffers,
    units::{K_COULOMB, MU_0_OVER_4PI, SEPARATION_EPS},
};

/// Electric and magnetic field at a point. V/m and T.
#[derive(Clone, Copy, Debug)]
pub struct EmField {
    pub e: Vec3,
    pub b: Vec3,
}

impl EmField {
    pub fn zero() -> Self {
        Self {
            e: Vec3::new_zero(),
            b: Vec3::new_zero(),
        }
    }
}

impl std::ops::Add for EmField {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            e: self.e + rhs.e,
            b: self.b + rhs.b,
        }
    }
}

impl std::ops::AddAssign for EmField {
    fn add_assign(&mut self, rhs: Self) {
        self.e += rhs.e;
        self.b += rhs.b;
    }
}

/// Everything that generates field, for one solve.
#[derive(Clone, Copy)]
pub struct FieldSources<'a> {
    pub currents: &'a [CurrentVector],
    /// Central solenoid loop voltage, -dΦ/dt. V
    pub solenoid_flux: f64,
    /// `None` when particle contributions are disabled.
    pub particles: Option<&'a ParticleBuffers>,
}

/// B at `posit` from one segment, treating it as a point source at its midpoint.
pub fn b_segment(posit: Vec3, seg: &CurrentVector) -> Vec3 {
    let r = posit - seg.midpoint();
    let dist = r.magnitude();
    if dist < SEPARATION_EPS {
        return Vec3::new_zero();
    }

    seg.dx.cross(r) * (MU_0_OVER_4PI * seg.i / dist.powi(3))
}

/// Biot-Savart sum over all segments.
pub fn b_biot_savart(posit: Vec3, segments: &[CurrentVector]) -> Vec3 {
    let mut result = Vec3::new_zero();
    for seg in segments {
        result += b_segment(posit, seg);
    }
    result
}

/// Induced, azimuthal E from a changing flux in a central solenoid along the Y axis:
/// `E_φ = V / (2πρ)`, so that the loop integral at any radius is `V`.
pub fn e_solenoid(posit: Vec3, solenoid_flux: f64) -> Vec3 {
    if solenoid_flux == 0. {
        return Vec3::new_zero();
    }

    let ρ_sq = posit.x.powi(2) + posit.z.powi(2);
    if ρ_sq < SEPARATION_EPS.powi(2) {
        return Vec3::new_zero();
    }

    // φ̂ = ŷ × ρ̂; folding the 1/ρ of the unit vector into the magnitude.
    Vec3::new(posit.z, 0., -posit.x) * (solenoid_flux / (TAU * ρ_sq))
}

/// Coulomb E and the moving charge's B at `posit`, from a point charge.
pub fn field_from_charge(posit: Vec3, src_posit: Vec3, src_vel: Vec3, q: f64) -> EmField {
    let r = posit - src_posit;
    let dist = r.magnitude();
    if dist < SEPARATION_EPS || q == 0. {
        return EmField::zero();
    }

    let inv_r3 = 1. / dist.powi(3);

    EmField {
        e: r * (K_COULOMB * q * inv_r3),
        b: src_vel.cross(r) * (MU_0_OVER_4PI * q * inv_r3),
    }
}

/// Field from coils and the solenoid only.
pub fn external_field(posit: Vec3, currents: &[CurrentVector], solenoid_flux: f64) -> EmField {
    EmField {
        e: e_solenoid(posit, solenoid_flux),
        b: b_biot_savart(posit, currents),
    }
}

/// Direct sum over live particles. `skip` excludes one particle; used so a particle doesn't
/// act on itself.
pub fn particle_field(posit: Vec3, particles: &ParticleBuffers, skip: Option<usize>) -> EmField {
    let mut result = EmField::zero();

    for (j, (ps, vel)) in particles.posits().iter().zip(particles.vels()).enumerate() {
        if Some(j) == skip {
            continue;
        }
        result += field_from_charge(posit, ps.posit, *vel, ps.charge());
    }

    result
}

/// Exact evaluation at an arbitrary point; no mesh.
pub fn field_at_point(posit: Vec3, sources: &FieldSources, skip: Option<usize>) -> EmField {
    let mut result = external_field(posit, sources.currents, sources.solenoid_flux);

    if let Some(particles) = sources.particles {
        result += particle_field(posit, particles, skip);
    }

    result
}

/// Compute E and B at every cell center, in parallel over cells. Both arrays are fully
/// overwritten; inactive cells get zero.
pub fn solve_cells(cells: &[Cell], sources: &FieldSources, e: &mut Vec<Vec3>, b: &mut Vec<Vec3>) {
    e.resize(cells.len(), Vec3::new_zero());
    b.resize(cells.len(), Vec3::new_zero());

    e.par_iter_mut()
        .zip(b.par_iter_mut())
        .zip(cells.par_iter())
        .for_each(|((e_cell, b_cell), cell)| {
            let field = if cell.is_active {
                field_at_point(cell.center, sources, None)
            } else {
                EmField::zero()
            };

            *e_cell = field.e;
            *b_cell = field.b;
        });
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        currents::current_loop,
        mesh::MeshProperties,
        species::Species,
        units::{ELEMENTARY_CHARGE, MU_0},
    };

    fn small_mesh() -> (MeshProperties, Vec<Cell>) {
        let mesh = MeshProperties::new(Vec3::new(-1., -1., -1.), Vec3::new(1., 1., 1.), 0.25);
        let cells = mesh.build_cells(|_| true);
        (mesh, cells)
    }

    #[test]
    fn no_sources_no_field() {
        let (_, cells) = small_mesh();
        let sources = FieldSources {
            currents: &[],
            solenoid_flux: 0.,
            particles: None,
        };

        // Stale values must not survive a solve.
        let mut e = vec![Vec3::new(1., 2., 3.); cells.len()];
        let mut b = vec![Vec3::new(4., 5., 6.); cells.len()];
        solve_cells(&cells, &sources, &mut e, &mut b);

        for (e, b) in e.iter().zip(&b) {
            assert_eq!((e.x, e.y, e.z), (0., 0., 0.));
            assert_eq!((b.x, b.y, b.z), (0., 0., 0.));
        }
    }

    #[test]
    fn loop_center_field_matches_analytic() {
        let radius = 0.5;
        let current = 1_000.;
        let segs = current_loop(Vec3::new_zero(), Vec3::new(0., 0., 1.), radius, 720, current);

        let b = b_biot_savart(Vec3::new_zero(), &segs);
        let expected = MU_0 * current / (2. * radius);

        assert_relative_eq!(b.z, expected, max_relative = 1e-4);
        assert!(b.x.abs() < expected * 1e-9);
        assert!(b.y.abs() < expected * 1e-9);
    }

    #[test]
    fn coincident_source_contributes_nothing() {
        let seg = CurrentVector {
            x: Vec3::new(-0.5, 0., 0.),
            dx: Vec3::new(1., 0., 0.),
            i: 10.,
        };
        let b = b_segment(seg.midpoint(), &seg);
        assert_eq!((b.x, b.y, b.z), (0., 0., 0.));

        let f = field_from_charge(
            Vec3::new(1., 1., 1.),
            Vec3::new(1., 1., 1.),
            Vec3::new(5., 0., 0.),
            ELEMENTARY_CHARGE,
        );
        assert!(f.e.magnitude() == 0. && f.b.magnitude() == 0.);
    }

    #[test]
    fn coulomb_field_of_a_proton() {
        let f = field_from_charge(
            Vec3::new(2., 0., 0.),
            Vec3::new_zero(),
            Vec3::new_zero(),
            ELEMENTARY_CHARGE,
        );
        assert_relative_eq!(f.e.x, K_COULOMB * ELEMENTARY_CHARGE / 4., max_relative = 1e-12);
        assert_eq!(f.b.magnitude(), 0.);
    }

    #[test]
    fn solenoid_field_is_azimuthal_and_linear_in_flux() {
        let p = Vec3::new(1.2, 0.3, -0.4);
        let e1 = e_solenoid(p, 2.0);
        let e2 = e_solenoid(p, 4.0);

        // No radial or axial component.
        assert_relative_eq!(e1.dot(Vec3::new(p.x, 0., p.z)), 0., epsilon = 1e-15);
        assert_eq!(e1.y, 0.);
        assert_relative_eq!(e2.x, 2. * e1.x, max_relative = 1e-12);

        // The loop integral at this radius is the loop voltage.
        let ρ = (p.x.powi(2) + p.z.powi(2)).sqrt();
        assert_relative_eq!(e1.magnitude() * TAU * ρ, 2.0, max_relative = 1e-12);

        let zero = e_solenoid(p, 0.);
        assert_eq!(zero.magnitude(), 0.);
        // On the axis.
        assert_eq!(e_solenoid(Vec3::new(0., 1., 0.), 3.).magnitude(), 0.);
    }

    #[test]
    fn particle_contribution_is_separable() {
        let (_, cells) = small_mesh();
        let segs = current_loop(Vec3::new_zero(), Vec3::new(0., 1., 0.), 0.8, 64, 50.);

        let mut particles = ParticleBuffers::new(4);
        particles
            .push(Vec3::new(0.1, 0.2, 0.3), Vec3::new(1e4, 0., 0.), Species::Proton)
            .unwrap();

        let without = FieldSources {
            currents: &segs,
            solenoid_flux: 1.5,
            particles: None,
        };
        let with = FieldSources {
            particles: Some(&particles),
            ..without
        };

        let (mut e0, mut b0) = (Vec::new(), Vec::new());
        let (mut e1, mut b1) = (Vec::new(), Vec::new());
        solve_cells(&cells, &without, &mut e0, &mut b0);
        solve_cells(&cells, &with, &mut e1, &mut b1);

        for (i, cell) in cells.iter().enumerate() {
            let p = particle_field(cell.center, &particles, None);
            assert_relative_eq!(e1[i].x, e0[i].x + p.e.x, max_relative = 1e-9, epsilon = 1e-20);
            assert_relative_eq!(b1[i].z, b0[i].z + p.b.z, max_relative = 1e-9, epsilon = 1e-20);
        }
    }

    #[test]
    fn inactive_cells_carry_no_field() {
        let mesh = MeshProperties::new(Vec3::new(-1., -1., -1.), Vec3::new(1., 1., 1.), 0.5);
        let cells = mesh.build_cells(|c| c.x > 0.);
        let segs = current_loop(Vec3::new_zero(), Vec3::new(0., 1., 0.), 0.8, 64, 50.);
        let sources = FieldSources {
            currents: &segs,
            solenoid_flux: 1.,
            particles: None,
        };

        let (mut e, mut b) = (Vec::new(), Vec::new());
        solve_cells(&cells, &sources, &mut e, &mut b);

        for (i, cell) in cells.iter().enumerate() {
            if !cell.is_active {
                assert_eq!(e[i].magnitude(), 0.);
                assert_eq!(b[i].magnitude(), 0.);
            } else {
                assert!(b[i].magnitude() > 0.);
            }
        }
    }

    #[test]
    fn solve_is_reproducible() {
        let (_, cells) = small_mesh();
        let segs = current_loop(Vec3::new_zero(), Vec3::new(0., 1., 0.), 0.8, 64, 50.);
        let sources = FieldSources {
            currents: &segs,
            solenoid_flux: 0.7,
            particles: None,
        };

        let (mut e0, mut b0) = (Vec::new(), Vec::new());
        let (mut e1, mut b1) = (Vec::new(), Vec::new());
        solve_cells(&cells, &sources, &mut e0, &mut b0);
        solve_cells(&cells, &sources, &mut e1, &mut b1);

        for i in 0..cells.len() {
            assert_eq!(e0[i].x.to_bits(), e1[i].x.to_bits());
            assert_eq!(b0[i].y.to_bits(), b1[i].y.to_bits());
        }
    }
}
