//! Domain constraints, applied after each integration step: the free-space box, and the tokamak
//! torus wall.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;

use crate::particles::ParticleBuffers;

/// What happens to a particle that leaves the free-space box.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode)]
pub enum BoxPolicy {
    /// Mirror back across the crossed face, and flip that velocity component.
    #[default]
    Reflect,
    /// Remove it from the live set.
    Absorb,
    /// Periodic: re-enter from the opposite face.
    Wrap,
}

/// What happens to a particle that hits the torus wall.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode)]
pub enum TorusPolicy {
    /// Remove it from the live set.
    #[default]
    Absorb,
    /// Mirror back inside along the wall normal, and flip the outward velocity component.
    Reflect,
}

#[derive(Clone, Debug)]
pub enum BoundaryPolicy {
    Box {
        min: Vec3,
        max: Vec3,
        policy: BoxPolicy,
    },
    /// Symmetric about +Y.
    Torus {
        r1: f64,
        r2: f64,
        policy: TorusPolicy,
    },
}

/// Distance from `posit` to the nearest point on the ring of radius `r1` in the XZ plane.
pub fn torus_distance(posit: Vec3, r1: f64) -> f64 {
    let ρ = (posit.x.powi(2) + posit.z.powi(2)).sqrt();
    ((ρ - r1).powi(2) + posit.y.powi(2)).sqrt()
}

/// Nearest point on the ring centerline. On the symmetry axis every ring point is equally near;
/// we pick +X.
fn ring_point(posit: Vec3, r1: f64) -> Vec3 {
    let ρ = (posit.x.powi(2) + posit.z.powi(2)).sqrt();
    if ρ < 1e-12 {
        return Vec3::new(r1, 0., 0.);
    }
    Vec3::new(posit.x * r1 / ρ, 0., posit.z * r1 / ρ)
}

/// Reflect one coordinate into `[lo, hi]`. Returns the new coordinate and velocity component.
fn reflect_axis(x: f64, v: f64, lo: f64, hi: f64) -> (f64, f64) {
    if x < lo {
        // A step longer than the box is width is clamped rather than mirrored out the far side.
        ((2. * lo - x).min(hi), v.abs())
    } else if x > hi {
        ((2. * hi - x).max(lo), -v.abs())
    } else {
        (x, v)
    }
}

fn wrap_axis(x: f64, lo: f64, hi: f64) -> f64 {
    if x >= lo && x < hi {
        return x;
    }
    lo + (x - lo).rem_euclid(hi - lo)
}

fn in_box(p: Vec3, min: Vec3, max: Vec3) -> bool {
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y && p.z >= min.z && p.z <= max.z
}

/// Apply the boundary to all live particles. Returns how many were removed.
pub fn apply_boundary(particles: &mut ParticleBuffers, boundary: &BoundaryPolicy) -> usize {
    match boundary {
        BoundaryPolicy::Box { min, max, policy } => match policy {
            BoxPolicy::Absorb => particles.retain(|ps, _| in_box(ps.posit, *min, *max)),
            BoxPolicy::Reflect => {
                for i in 0..particles.current_count() {
                    let p = particles.position_and_species[i].posit;
                    let v = particles.velocity[i];

                    let (px, vx) = reflect_axis(p.x, v.x, min.x, max.x);
                    let (py, vy) = reflect_axis(p.y, v.y, min.y, max.y);
                    let (pz, vz) = reflect_axis(p.z, v.z, min.z, max.z);

                    particles.position_and_species[i].posit = Vec3::new(px, py, pz);
                    particles.velocity[i] = Vec3::new(vx, vy, vz);
                }
                0
            }
            BoxPolicy::Wrap => {
                for i in 0..particles.current_count() {
                    let p = particles.position_and_species[i].posit;
                    particles.position_and_species[i].posit = Vec3::new(
                        wrap_axis(p.x, min.x, max.x),
                        wrap_axis(p.y, min.y, max.y),
                        wrap_axis(p.z, min.z, max.z),
                    );
                }
                0
            }
        },
        BoundaryPolicy::Torus { r1, r2, policy } => match policy {
            TorusPolicy::Absorb => particles.retain(|ps, _| torus_distance(ps.posit, *r1) <= *r2),
            TorusPolicy::Reflect => {
                for i in 0..particles.current_count() {
                    let p = particles.position_and_species[i].posit;
                    let d = torus_distance(p, *r1);
                    if d <= *r2 {
                        continue;
                    }

                    let center = ring_point(p, *r1);
                    let normal = (p - center) / d;

                    let depth = (2. * r2 - d).max(0.);
                    particles.position_and_species[i].posit = center + normal * depth;

                    let v = particles.velocity[i];
                    let v_n = v.dot(normal);
                    if v_n > 0. {
                        particles.velocity[i] = v - normal * (2. * v_n);
                    }
                }
                0
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::species::Species;

    fn one_particle(posit: Vec3, vel: Vec3) -> ParticleBuffers {
        let mut p = ParticleBuffers::new(2);
        p.push(posit, vel, Species::Proton).unwrap();
        p
    }

    fn unit_box(policy: BoxPolicy) -> BoundaryPolicy {
        BoundaryPolicy::Box {
            min: Vec3::new(-1., -1., -1.),
            max: Vec3::new(1., 1., 1.),
            policy,
        }
    }

    #[test]
    fn box_reflects_normal_component() {
        let mut p = one_particle(Vec3::new(1.2, 0.5, -1.1), Vec3::new(3., 1., -2.));
        let removed = apply_boundary(&mut p, &unit_box(BoxPolicy::Reflect));
        assert_eq!(removed, 0);

        let ps = p.posits()[0].posit;
        let v = p.vels()[0];
        assert_relative_eq!(ps.x, 0.8, epsilon = 1e-12);
        assert_relative_eq!(ps.y, 0.5);
        assert_relative_eq!(ps.z, -0.9, epsilon = 1e-12);
        assert_relative_eq!(v.x, -3.);
        assert_relative_eq!(v.y, 1.);
        assert_relative_eq!(v.z, 2.);
    }

    #[test]
    fn box_reflection_conserves_speed() {
        let vel = Vec3::new(3., -4., 12.);
        let mut p = one_particle(Vec3::new(-1.5, 1.5, 1.5), vel);
        apply_boundary(&mut p, &unit_box(BoxPolicy::Reflect));
        assert_relative_eq!(p.vels()[0].magnitude(), vel.magnitude());
    }

    #[test]
    fn box_absorbs() {
        let mut p = one_particle(Vec3::new(0., 0., 0.), Vec3::new_zero());
        p.push(Vec3::new(0., 2., 0.), Vec3::new_zero(), Species::Electron)
            .unwrap();

        let removed = apply_boundary(&mut p, &unit_box(BoxPolicy::Absorb));
        assert_eq!(removed, 1);
        assert_eq!(p.current_count(), 1);
        assert_eq!(p.posits()[0].species(), Some(Species::Proton));
    }

    #[test]
    fn box_wraps() {
        let mut p = one_particle(Vec3::new(1.25, -1.5, 0.), Vec3::new(1., 0., 0.));
        apply_boundary(&mut p, &unit_box(BoxPolicy::Wrap));

        let ps = p.posits()[0].posit;
        assert_relative_eq!(ps.x, -0.75, epsilon = 1e-12);
        assert_relative_eq!(ps.y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.vels()[0].x, 1.);
    }

    #[test]
    fn torus_distance_from_centerline() {
        assert_relative_eq!(torus_distance(Vec3::new(2., 0., 0.), 2.), 0.);
        assert_relative_eq!(torus_distance(Vec3::new(0., 0.3, -2.4), 2.), 0.5, epsilon = 1e-12);
        assert_relative_eq!(torus_distance(Vec3::new_zero(), 2.), 2.);
    }

    #[test]
    fn torus_absorbs_wall_hits() {
        let wall = BoundaryPolicy::Torus {
            r1: 2.,
            r2: 0.5,
            policy: TorusPolicy::Absorb,
        };
        let mut p = one_particle(Vec3::new(2.2, 0.1, 0.), Vec3::new_zero());
        p.push(Vec3::new(0., 0., 2.6), Vec3::new_zero(), Species::Electron)
            .unwrap();

        assert_eq!(apply_boundary(&mut p, &wall), 1);
        assert_eq!(p.current_count(), 1);
        assert_eq!(p.posits()[0].species(), Some(Species::Proton));
    }

    #[test]
    fn torus_reflects_back_inside() {
        let (r1, r2) = (2., 0.5);
        let wall = BoundaryPolicy::Torus {
            r1,
            r2,
            policy: TorusPolicy::Reflect,
        };
        // Outboard, moving outward.
        let mut p = one_particle(Vec3::new(2.6, 0., 0.), Vec3::new(5., 1., 0.));
        assert_eq!(apply_boundary(&mut p, &wall), 0);

        let ps = p.posits()[0].posit;
        let v = p.vels()[0];
        assert_relative_eq!(ps.x, 2.4, epsilon = 1e-12);
        assert!(torus_distance(ps, r1) <= r2);
        assert_relative_eq!(v.x, -5.);
        assert_relative_eq!(v.y, 1.);
    }
}
