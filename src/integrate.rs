use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::{accel::acc_lorentz, field::EmField, particles::ParticleBuffers};

/// Advance one particle by `dt` with semi-implicit (symplectic) Euler: velocity first, then
/// position from the new velocity. The sampler fn: (id, posit) -> field at that particle.
///
/// Zero-charge particles never sample the field; they coast.
pub fn step_semi_implicit<F>(
    posit: Vec3,
    vel: Vec3,
    q_m: f64,
    id: usize,
    sample: &F,
    dt: f64,
) -> (Vec3, Vec3)
where
    F: Fn(usize, Vec3) -> EmField,
{
    let acc = if q_m == 0. {
        Vec3::new_zero()
    } else {
        acc_lorentz(q_m, vel, &sample(id, posit))
    };

    let vel_new = vel + acc * dt;
    let posit_new = posit + vel_new * dt;

    (posit_new, vel_new)
}

/// Compute the next state of every live particle into `next`, reading only the current state.
/// Inactive slots are skipped. Call `write_back` once the sampler is done with the current state.
pub fn advance_into<F>(
    particles: &ParticleBuffers,
    sample: &F,
    dt: f64,
    next: &mut Vec<(Vec3, Vec3)>,
) where
    F: Fn(usize, Vec3) -> EmField + Sync,
{
    let n = particles.current_count();
    next.clear();

    // Iterate, in parallel, over target particles. The loop over sources, per target, is handled
    // by the sampler.
    particles
        .posits()
        .par_iter()
        .zip(particles.vels().par_iter())
        .enumerate()
        .map(|(id, (ps, vel))| {
            step_semi_implicit(ps.posit, *vel, ps.charge_to_mass(), id, sample, dt)
        })
        .collect_into_vec(next);

    debug_assert_eq!(next.len(), n);
}

/// Swap the computed states in.
pub fn write_back(particles: &mut ParticleBuffers, next: &[(Vec3, Vec3)]) {
    let n = particles.current_count().min(next.len());

    for (i, (posit, vel)) in next.iter().take(n).enumerate() {
        particles.position_and_species[i].posit = *posit;
        particles.velocity[i] = *vel;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::species::Species;

    fn uniform(e: Vec3, b: Vec3) -> impl Fn(usize, Vec3) -> EmField + Sync {
        move |_, _| EmField { e, b }
    }

    #[test]
    fn velocity_updates_before_position() {
        let sample = uniform(Vec3::new(1., 0., 0.), Vec3::new_zero());
        let (p, v) = step_semi_implicit(Vec3::new_zero(), Vec3::new_zero(), 2., 0, &sample, 0.5);

        // v = 0 + 2 * 1 * 0.5 = 1; x = 0 + 1 * 0.5.
        assert_relative_eq!(v.x, 1.);
        assert_relative_eq!(p.x, 0.5);
    }

    #[test]
    fn neutral_particles_ignore_the_field() {
        let sample = |_: usize, _: Vec3| -> EmField { panic!("Neutral particles must not sample") };
        let (p, v) = step_semi_implicit(
            Vec3::new(1., 2., 3.),
            Vec3::new(4., 0., 0.),
            0.,
            0,
            &sample,
            0.25,
        );
        assert_relative_eq!(p.x, 2.);
        assert_relative_eq!(v.x, 4.);
    }

    #[test]
    fn pure_b_turns_velocity() {
        // v × B is perpendicular to v, so one explicit velocity kick grows speed only at
        // second order in dt.
        let sample = uniform(Vec3::new_zero(), Vec3::new(0., 0., 1.));
        let dt = 0.01;
        let (_, v) = step_semi_implicit(Vec3::new_zero(), Vec3::new(1., 0., 0.), 1., 0, &sample, dt);

        assert_relative_eq!(v.y, -dt);
        assert_relative_eq!(v.magnitude(), (1. + dt * dt).sqrt(), max_relative = 1e-12);

        let mut p = Vec3::new_zero();
        let mut v = Vec3::new(1., 0., 0.);
        for _ in 0..100 {
            (p, v) = step_semi_implicit(p, v, 1., 0, &sample, dt);
        }
        // About a radian of gyration around the guiding center at (0, -1).
        assert!(v.y < -0.8);
        assert!(((p - Vec3::new(0., -1., 0.)).magnitude() - 1.).abs() < 0.03);
    }

    #[test]
    fn only_live_slots_advance() {
        let mut particles = ParticleBuffers::new(3);
        particles
            .push(Vec3::new_zero(), Vec3::new(1., 0., 0.), Species::Proton)
            .unwrap();

        let sample = uniform(Vec3::new_zero(), Vec3::new_zero());
        let mut next = Vec::new();
        advance_into(&particles, &sample, 1., &mut next);
        assert_eq!(next.len(), 1);

        write_back(&mut particles, &next);
        assert_relative_eq!(particles.posits()[0].posit.x, 1.);
        assert_eq!(particles.position_and_species[1].posit.x, 0.);
    }
}
