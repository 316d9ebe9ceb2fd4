//! Get the properties of the plasma and fields: energies, populations, confinement.

use std::{fmt, fmt::Formatter};

use lin_alg::f64::Vec3;

use crate::{
    mesh::Cell,
    particles::ParticleBuffers,
    species::Species,
    units::J_PER_EV,
};

#[derive(Debug, Clone)]
pub struct PlasmaProperties {
    /// s
    pub time: f64,
    pub count: usize,
    /// Confined fraction, vs the count at the start of the run.
    pub confined_fraction: f64,
    /// J
    pub kinetic_energy: f64,
    /// (species, count, mean kinetic energy in eV)
    pub populations: Vec<(Species, usize, f64)>,
    /// Over active cells. V/m
    pub e_max: f64,
    pub e_mean: f64,
    /// Over active cells. T
    pub b_max: f64,
    pub b_mean: f64,
}

impl fmt::Display for PlasmaProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "t: {:.3e} s", self.time)?;
        writeln!(
            f,
            "N: {} ({:.1}% confined)",
            self.count,
            self.confined_fraction * 100.
        )?;
        writeln!(f, "KE: {:.4e} J", self.kinetic_energy)?;
        for (species, n, ev) in &self.populations {
            writeln!(f, "  {species}: {n}, <E> {ev:.3} eV")?;
        }
        writeln!(f, "|E|: max {:.3e}, mean {:.3e} V/m", self.e_max, self.e_mean)?;
        writeln!(f, "|B|: max {:.3e}, mean {:.3e} T", self.b_max, self.b_mean)?;

        Ok(())
    }
}

impl PlasmaProperties {
    pub fn new(
        time: f64,
        particles: &ParticleBuffers,
        initial_count: usize,
        cells: &[Cell],
        e: &[Vec3],
        b: &[Vec3],
    ) -> Self {
        let count = particles.current_count();
        let (e_max, e_mean) = field_magnitudes(cells, e);
        let (b_max, b_mean) = field_magnitudes(cells, b);

        Self {
            time,
            count,
            confined_fraction: if initial_count > 0 {
                count as f64 / initial_count as f64
            } else {
                1.
            },
            kinetic_energy: kinetic_energy(particles),
            populations: populations(particles),
            e_max,
            e_mean,
            b_max,
            b_mean,
        }
    }
}

/// Total, non-relativistic. J. Macroparticles count as one particle of their per-particle mass.
pub fn kinetic_energy(particles: &ParticleBuffers) -> f64 {
    particles
        .posits()
        .iter()
        .zip(particles.vels())
        .map(|(ps, v)| 0.5 * ps.mass() * v.magnitude_squared())
        .sum()
}

/// Count and mean energy (eV) of each species present, in `Species::ALL` order.
pub fn populations(particles: &ParticleBuffers) -> Vec<(Species, usize, f64)> {
    let mut counts = [0usize; Species::ALL.len()];
    let mut energy = [0.; Species::ALL.len()];

    for (ps, v) in particles.posits().iter().zip(particles.vels()) {
        let Some(species) = ps.species() else {
            continue;
        };
        let i = species as usize;
        counts[i] += 1;
        energy[i] += 0.5 * species.mass() * v.magnitude_squared();
    }

    Species::ALL
        .iter()
        .filter(|s| counts[**s as usize] > 0)
        .map(|s| {
            let i = *s as usize;
            (*s, counts[i], energy[i] / counts[i] as f64 / J_PER_EV)
        })
        .collect()
}

/// (max, mean) magnitude over active cells.
pub fn field_magnitudes(cells: &[Cell], field: &[Vec3]) -> (f64, f64) {
    let mut max = 0.;
    let mut sum = 0.;
    let mut n = 0;

    for (cell, v) in cells.iter().zip(field) {
        if !cell.is_active {
            continue;
        }
        let mag = v.magnitude();
        if mag > max {
            max = mag;
        }
        sum += mag;
        n += 1;
    }

    if n == 0 {
        (0., 0.)
    } else {
        (max, sum / n as f64)
    }
}
