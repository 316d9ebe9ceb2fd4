//! Particle storage: two parallel, fixed-capacity arrays, and a live count.
//!
//! Slots at or past `current_count` are zeroed placeholders, reserved for particles created
//! later. Nothing reads them for physics.

use lin_alg::f64::Vec3;

use crate::{
    error::{SimError, SimResult},
    species::{charge_of_tag, charge_to_mass_of_tag, mass_of_tag, Species},
};

/// Position, with the species tag packed in as a 4th component.
#[derive(Clone, Copy, Debug)]
pub struct PositSpecies {
    pub posit: Vec3,
    /// See `Species::tag`.
    pub species: f64,
}

impl PositSpecies {
    pub fn zero() -> Self {
        Self {
            posit: Vec3::new_zero(),
            species: 0.,
        }
    }

    pub fn species(&self) -> Option<Species> {
        Species::from_tag(self.species)
    }

    pub fn charge(&self) -> f64 {
        charge_of_tag(self.species)
    }

    pub fn mass(&self) -> f64 {
        mass_of_tag(self.species)
    }

    pub fn charge_to_mass(&self) -> f64 {
        charge_to_mass_of_tag(self.species)
    }
}

#[derive(Clone, Debug)]
pub struct ParticleBuffers {
    pub position_and_species: Vec<PositSpecies>,
    pub velocity: Vec<Vec3>,
    current_count: usize,
}

impl ParticleBuffers {
    /// Allocate once, at full capacity.
    pub fn new(max_particles: usize) -> Self {
        Self {
            position_and_species: vec![PositSpecies::zero(); max_particles],
            velocity: vec![Vec3::new_zero(); max_particles],
            current_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.position_and_species.len()
    }

    pub fn current_count(&self) -> usize {
        self.current_count
    }

    pub fn is_empty(&self) -> bool {
        self.current_count == 0
    }

    /// Add a live particle; returns its slot.
    pub fn push(&mut self, posit: Vec3, vel: Vec3, species: Species) -> SimResult<usize> {
        let capacity = self.capacity();
        debug_assert!(
            self.current_count < capacity,
            "Particle capacity ({capacity}) exceeded"
        );
        if self.current_count >= capacity {
            return Err(SimError::CapacityExceeded { capacity });
        }

        let i = self.current_count;
        self.position_and_species[i] = PositSpecies {
            posit,
            species: species.tag(),
        };
        self.velocity[i] = vel;
        self.current_count += 1;

        Ok(i)
    }

    /// Remove a live particle by moving the last live one into its slot. Order is not preserved.
    pub fn remove(&mut self, i: usize) {
        if i >= self.current_count {
            return;
        }
        let last = self.current_count - 1;

        self.position_and_species.swap(i, last);
        self.velocity.swap(i, last);

        self.position_and_species[last] = PositSpecies::zero();
        self.velocity[last] = Vec3::new_zero();
        self.current_count = last;
    }

    /// Keep live particles for which `keep` is true, compacting them to the front.
    /// Returns the number removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&PositSpecies, &Vec3) -> bool,
    {
        let before = self.current_count;

        let mut i = 0;
        while i < self.current_count {
            if keep(&self.position_and_species[i], &self.velocity[i]) {
                i += 1;
            } else {
                // Don't advance; the swapped-in particle needs checking too.
                self.remove(i);
            }
        }

        before - self.current_count
    }

    pub fn clear(&mut self) {
        for i in 0..self.current_count {
            self.position_and_species[i] = PositSpecies::zero();
            self.velocity[i] = Vec3::new_zero();
        }
        self.current_count = 0;
    }

    /// Live positions.
    pub fn posits(&self) -> &[PositSpecies] {
        &self.position_and_species[..self.current_count]
    }

    /// Live velocities.
    pub fn vels(&self) -> &[Vec3] {
        &self.velocity[..self.current_count]
    }
}
