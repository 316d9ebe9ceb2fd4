//! Run configuration. Saved to and loaded from disk with Bincode. This covers run parameters
//! only; simulation state isn't persisted.

use std::path::Path;

use bincode::{Decode, Encode};

use crate::{
    accel::SamplingMode,
    boundary::TorusPolicy,
    error::{SimError, SimResult},
    scene::SceneKind,
    species::Species,
    util,
};

pub const SAVE_FILE: &str = "config.plasma";

#[derive(Clone, Debug, Encode, Decode)]
pub struct Config {
    pub scene: SceneKind,
    /// Buffer capacity. Fixed for the run.
    pub max_particles: usize,
    /// Seeded at startup.
    pub num_particles: usize,
    /// (species, relative weight)
    pub species_mix: Vec<(Species, f64)>,
    /// Initial, Maxwellian. eV
    pub temperature_ev: f64,
    /// s
    pub dt: f64,
    pub num_steps: usize,
    /// Log a diagnostic summary every this many steps.
    pub snapshot_ratio: usize,
    pub sampling: SamplingMode,
    /// Include particle-sourced fields in the field solve.
    pub enable_particle_field_contributions: bool,
    pub toroidal_current_enabled: bool,
    /// Central solenoid loop voltage, from its changing flux. V
    pub solenoid_flux: f64,
    /// Per field (E and B).
    pub num_tracers: usize,
    /// m
    pub tracer_step: f64,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scene: SceneKind::Tokamak {
                r1: 2.,
                r2: 0.6,
                cell_size: 0.1,
                toroidal_coils: 16,
                coil_loop_segments: 40,
                toroidal_current: 1.0e5,
                torus_policy: TorusPolicy::Absorb,
            },
            max_particles: 4_000,
            num_particles: 2_000,
            species_mix: vec![(Species::Deuteron, 1.), (Species::Electron, 1.)],
            temperature_ev: 10.,
            dt: 5.0e-12,
            num_steps: 1_000,
            snapshot_ratio: 100,
            sampling: SamplingMode::Pic,
            enable_particle_field_contributions: true,
            toroidal_current_enabled: true,
            solenoid_flux: 0.,
            num_tracers: 20,
            tracer_step: 0.02,
            seed: 0,
        }
    }
}

fn invalid<T>(msg: impl Into<String>) -> SimResult<T> {
    Err(SimError::InvalidConfig(msg.into()))
}

impl Config {
    pub fn load(path: &Path) -> SimResult<Self> {
        util::load(path)
    }

    pub fn save(&self, path: &Path) -> SimResult<()> {
        util::save(path, self)
    }

    /// Reject configurations the simulation can't run.
    pub fn validate(&self) -> SimResult<()> {
        if self.max_particles == 0 {
            return invalid("max_particles must be positive");
        }
        if self.num_particles > self.max_particles {
            return invalid(format!(
                "num_particles ({}) exceeds max_particles ({})",
                self.num_particles, self.max_particles
            ));
        }
        if !(self.dt.is_finite() && self.dt > 0.) {
            return invalid("dt must be positive and finite");
        }
        if self.snapshot_ratio == 0 {
            return invalid("snapshot_ratio must be positive");
        }
        if !(self.temperature_ev >= 0.) {
            return invalid("temperature_ev must be non-negative");
        }
        if !self.solenoid_flux.is_finite() {
            return invalid("solenoid_flux must be finite");
        }
        if self.num_tracers > 0 && !(self.tracer_step > 0.) {
            return invalid("tracer_step must be positive");
        }

        if self.num_particles > 0 {
            if self.species_mix.is_empty() {
                return invalid("species_mix is empty");
            }
            if self.species_mix.iter().any(|(_, w)| !(*w >= 0.)) {
                return invalid("species weights must be non-negative");
            }
            if self.species_mix.iter().map(|(_, w)| w).sum::<f64>() <= 0. {
                return invalid("species weights sum to zero");
            }
        }

        match &self.scene {
            SceneKind::FreeSpace {
                min,
                max,
                cell_size,
                loop_radius,
                ..
            } => {
                if !(*cell_size > 0.) {
                    return invalid("cell_size must be positive");
                }
                if (0..3).any(|i| !(min[i] < max[i])) {
                    return invalid("box min must be below max on every axis");
                }
                if *loop_radius < 0. {
                    return invalid("loop_radius must be non-negative");
                }
            }
            SceneKind::Tokamak {
                r1,
                r2,
                cell_size,
                toroidal_coils,
                coil_loop_segments,
                ..
            } => {
                if !(*cell_size > 0.) {
                    return invalid("cell_size must be positive");
                }
                if !(*r2 > 0. && r2 < r1) {
                    return invalid("need 0 < r2 < r1");
                }
                if *toroidal_coils == 0 {
                    return invalid("toroidal_coils must be positive");
                }
                if *coil_loop_segments < 3 {
                    return invalid("coil_loop_segments must be at least 3");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.num_particles = cfg.max_particles + 1;
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));

        let mut cfg = Config::default();
        cfg.dt = 0.;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.species_mix.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.scene = SceneKind::Tokamak {
            r1: 1.,
            r2: 1.5,
            cell_size: 0.1,
            toroidal_coils: 4,
            coil_loop_segments: 8,
            toroidal_current: 1.,
            torus_policy: TorusPolicy::Absorb,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_load() {
        let path = std::env::temp_dir().join(format!("plasma_pic_cfg_{}.plasma", std::process::id()));

        let mut cfg = Config::default();
        cfg.seed = 42;
        cfg.sampling = SamplingMode::Exact;
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.sampling, SamplingMode::Exact);
        assert_eq!(loaded.scene, cfg.scene);
        assert_eq!(loaded.species_mix.len(), 2);
    }
}
