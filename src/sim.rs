//! The simulation context: owns the RNG, the scene's mesh and sources, the particle and field
//! buffers, and the tracers. `step` runs the per-step pipeline:
//! field solve, particle integration, boundary handling, tracers.

use std::time::Instant;

use lin_alg::f64::Vec3;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::{
    accel::{sampler_exact, sampler_pic, SamplingMode},
    boundary::{apply_boundary, BoundaryPolicy},
    config::Config,
    currents::CurrentVector,
    error::{SimError, SimResult},
    field::{solve_cells, FieldSources},
    integrate::{advance_into, write_back},
    mesh::{Cell, MeshProperties},
    particles::ParticleBuffers,
    properties::PlasmaProperties,
    scene::{self, SceneKind},
    species::Species,
    tracer::{TracerField, TracerSet},
};

/// Log step timing every this many steps.
const BENCH_RATIO: usize = 1_000;

pub struct Simulation {
    scene: SceneKind,
    rng: StdRng,
    mesh: MeshProperties,
    cells: Vec<Cell>,
    boundary: BoundaryPolicy,
    currents: Vec<CurrentVector>,
    particles: ParticleBuffers,
    /// Next (posit, vel) per live particle. Filled from the current state, then written back.
    next: Vec<(Vec3, Vec3)>,
    e: Vec<Vec3>,
    b: Vec<Vec3>,
    e_tracers: TracerSet,
    b_tracers: TracerSet,
    dt: f64,
    sampling: SamplingMode,
    particle_field_contributions: bool,
    toroidal_current_enabled: bool,
    solenoid_flux: f64,
    time_elapsed: f64,
    step_count: usize,
    /// For the confined fraction.
    initial_count: usize,
}

impl Simulation {
    /// Validate the config, build the scene, and seed particles and tracers.
    pub fn new(config: &Config) -> SimResult<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);

        let (mesh, cells) = scene::build_mesh(&config.scene);
        let boundary = scene::boundary_policy(&config.scene);
        let currents = scene::currents(&config.scene, config.toroidal_current_enabled);

        let mut particles = ParticleBuffers::new(config.max_particles);
        scene::seed_particles(
            &config.scene,
            &mut particles,
            &mut rng,
            config.num_particles,
            &config.species_mix,
            config.temperature_ev,
        )?;

        let e_seeds = scene::seed_tracers(&config.scene, &mut rng, config.num_tracers)?;
        let b_seeds = scene::seed_tracers(&config.scene, &mut rng, config.num_tracers)?;

        let num_active = cells.iter().filter(|c| c.is_active).count();
        info!(
            scene = config.scene.to_str(),
            dims = ?mesh.dim,
            cells = cells.len(),
            active_cells = num_active,
            segments = currents.len(),
            particles = particles.current_count(),
            "Scene built"
        );

        let num_cells = cells.len();
        let initial_count = particles.current_count();

        Ok(Self {
            scene: config.scene.clone(),
            rng,
            mesh,
            cells,
            boundary,
            currents,
            particles,
            next: Vec::with_capacity(config.max_particles),
            e: vec![Vec3::new_zero(); num_cells],
            b: vec![Vec3::new_zero(); num_cells],
            e_tracers: TracerSet::new(&e_seeds, TracerField::Electric, config.tracer_step),
            b_tracers: TracerSet::new(&b_seeds, TracerField::Magnetic, config.tracer_step),
            dt: config.dt,
            sampling: config.sampling,
            particle_field_contributions: config.enable_particle_field_contributions,
            toroidal_current_enabled: config.toroidal_current_enabled,
            solenoid_flux: config.solenoid_flux,
            time_elapsed: 0.,
            step_count: 0,
            initial_count,
        })
    }

    /// Add one particle. It counts towards the initial population.
    pub fn add_particle(&mut self, posit: Vec3, vel: Vec3, species: Species) -> SimResult<usize> {
        let i = self.particles.push(posit, vel, species)?;
        self.initial_count += 1;
        Ok(i)
    }

    /// Remove all particles, and reset the initial population.
    pub fn clear_particles(&mut self) {
        self.particles.clear();
        self.initial_count = 0;
    }

    /// Seed `count` more particles into the scene's volume, from the context's RNG. Fails without
    /// adding anything if they don't fit. Particles placed before any later failure stay, and
    /// count towards the initial population.
    pub fn seed_particles(
        &mut self,
        count: usize,
        mix: &[(Species, f64)],
        temperature_ev: f64,
    ) -> SimResult<()> {
        let capacity = self.particles.capacity();
        let before = self.particles.current_count();
        if count > capacity - before {
            return Err(SimError::CapacityExceeded { capacity });
        }

        let result = scene::seed_particles(
            &self.scene,
            &mut self.particles,
            &mut self.rng,
            count,
            mix,
            temperature_ev,
        );
        self.initial_count += self.particles.current_count() - before;

        result
    }

    /// Compute E and B at all cells, from the current sources.
    pub fn solve_fields(&mut self) {
        let sources = FieldSources {
            currents: &self.currents,
            solenoid_flux: self.solenoid_flux,
            particles: self.particle_field_contributions.then_some(&self.particles),
        };
        solve_cells(&self.cells, &sources, &mut self.e, &mut self.b);
    }

    /// One timestep. Returns how many particles the boundary removed.
    pub fn step(&mut self) -> usize {
        self.solve_fields();

        let particle_src = self.particle_field_contributions.then_some(&self.particles);

        match self.sampling {
            SamplingMode::Exact => {
                let sources = FieldSources {
                    currents: &self.currents,
                    solenoid_flux: self.solenoid_flux,
                    particles: particle_src,
                };
                let sample = sampler_exact(sources);
                advance_into(&self.particles, &sample, self.dt, &mut self.next);
            }
            SamplingMode::Pic => {
                let sample = sampler_pic(&self.mesh, &self.cells, &self.e, &self.b, particle_src);
                advance_into(&self.particles, &sample, self.dt, &mut self.next);
            }
        }
        write_back(&mut self.particles, &self.next);

        let removed = apply_boundary(&mut self.particles, &self.boundary);
        if removed > 0 {
            debug!(
                removed,
                remaining = self.particles.current_count(),
                "Particles lost to the wall"
            );
        }

        self.e_tracers.advance(&self.mesh, &self.e, &self.b);
        self.b_tracers.advance(&self.mesh, &self.e, &self.b);

        self.time_elapsed += self.dt;
        self.step_count += 1;

        removed
    }

    /// Run `num_steps` steps. Returns the total removed.
    pub fn run(&mut self, num_steps: usize) -> usize {
        let mut removed = 0;
        let mut start = Instant::now();

        for t in 0..num_steps {
            if t % BENCH_RATIO == 0 {
                start = Instant::now();
            }

            removed += self.step();

            if t % BENCH_RATIO == 0 {
                info!(
                    step = self.step_count,
                    count = self.particles.current_count(),
                    step_time_us = start.elapsed().as_micros() as u64,
                    "Stepped"
                );
            }
        }

        removed
    }

    pub fn properties(&self) -> PlasmaProperties {
        PlasmaProperties::new(
            self.time_elapsed,
            &self.particles,
            self.initial_count,
            &self.cells,
            &self.e,
            &self.b,
        )
    }

    /// Rebuild the current segments, after the toroidal excitation changed.
    pub fn refresh_currents(&mut self) {
        self.currents = scene::currents(&self.scene, self.toroidal_current_enabled);
    }

    pub fn set_particle_field_contributions(&mut self, enabled: bool) {
        self.particle_field_contributions = enabled;
    }

    /// Takes effect at the next `refresh_currents`.
    pub fn set_toroidal_current_enabled(&mut self, enabled: bool) {
        self.toroidal_current_enabled = enabled;
    }

    pub fn set_solenoid_flux(&mut self, flux: f64) {
        self.solenoid_flux = flux;
    }

    pub fn set_sampling(&mut self, sampling: SamplingMode) {
        self.sampling = sampling;
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    pub fn scene(&self) -> &SceneKind {
        &self.scene
    }

    pub fn particles(&self) -> &ParticleBuffers {
        &self.particles
    }

    pub fn current_count(&self) -> usize {
        self.particles.current_count()
    }

    pub fn mesh(&self) -> &MeshProperties {
        &self.mesh
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn e_field(&self) -> &[Vec3] {
        &self.e
    }

    pub fn b_field(&self) -> &[Vec3] {
        &self.b
    }

    pub fn e_tracers(&self) -> &TracerSet {
        &self.e_tracers
    }

    pub fn b_tracers(&self) -> &TracerSet {
        &self.b_tracers
    }

    pub fn currents(&self) -> &[CurrentVector] {
        &self.currents
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
