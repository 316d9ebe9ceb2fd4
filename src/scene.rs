//! Scene geometry: free-space or tokamak. One tagged variant, dispatched through a handful of
//! functions, covers the mesh, the boundary, the current sources, and where particles and tracers
//! start.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;
use rand::{rngs::StdRng, Rng};
use rand_distr::{Distribution, Normal};

use crate::{
    boundary::{torus_distance, BoundaryPolicy, BoxPolicy, TorusPolicy},
    currents::{current_loop, toroidal_coils, CurrentVector},
    error::{SimError, SimResult},
    mesh::{Cell, MeshProperties},
    particles::ParticleBuffers,
    species::Species,
    units::J_PER_EV,
};

/// Segments per loop for the free-space loop coil.
const FREE_SPACE_LOOP_SEGMENTS: usize = 64;

/// Rejection sampling gives up after this many tries per point.
const MAX_SAMPLE_TRIES: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum SceneKind {
    /// An axis-aligned box. Optionally, one current loop centered at the origin, in the XZ plane.
    FreeSpace {
        min: [f64; 3],
        max: [f64; 3],
        cell_size: f64,
        box_policy: BoxPolicy,
        /// A. 0 for no loop.
        loop_current: f64,
        /// m
        loop_radius: f64,
    },
    /// A torus symmetric about +Y, ringed by toroidal field coils.
    Tokamak {
        /// Major radius. m
        r1: f64,
        /// Minor radius. m
        r2: f64,
        cell_size: f64,
        toroidal_coils: usize,
        coil_loop_segments: usize,
        /// Per coil. A
        toroidal_current: f64,
        torus_policy: TorusPolicy,
    },
}

fn arr_to_vec(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

impl SceneKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::FreeSpace { .. } => "Free space",
            Self::Tokamak { .. } => "Tokamak",
        }
    }

    /// Whether `posit` is in the volume particles live in: inside the box, or inside the torus
    /// tube. Cells outside this are inactive.
    pub fn contains(&self, posit: Vec3) -> bool {
        match self {
            Self::FreeSpace { min, max, .. } => {
                posit.x >= min[0]
                    && posit.x <= max[0]
                    && posit.y >= min[1]
                    && posit.y <= max[1]
                    && posit.z >= min[2]
                    && posit.z <= max[2]
            }
            Self::Tokamak { r1, r2, .. } => torus_distance(posit, *r1) <= *r2,
        }
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        match self {
            Self::FreeSpace { min, max, .. } => (arr_to_vec(*min), arr_to_vec(*max)),
            Self::Tokamak { r1, r2, .. } => {
                let ext = r1 + r2;
                (Vec3::new(-ext, -r2, -ext), Vec3::new(ext, *r2, ext))
            }
        }
    }
}

/// Build the mesh and its cells. Done once per scene; geometry doesn't change afterwards.
pub fn build_mesh(kind: &SceneKind) -> (MeshProperties, Vec<Cell>) {
    let (min, max) = kind.bounds();
    let cell_size = match kind {
        SceneKind::FreeSpace { cell_size, .. } | SceneKind::Tokamak { cell_size, .. } => *cell_size,
    };

    let mesh = MeshProperties::new(min, max, cell_size);
    let cells = match kind {
        // The box mesh may overhang `max` by part of a cell; keep those active too.
        SceneKind::FreeSpace { .. } => mesh.build_cells(|_| true),
        SceneKind::Tokamak { .. } => mesh.build_cells(|c| kind.contains(c)),
    };

    (mesh, cells)
}

pub fn boundary_policy(kind: &SceneKind) -> BoundaryPolicy {
    match kind {
        SceneKind::FreeSpace {
            min, max, box_policy, ..
        } => BoundaryPolicy::Box {
            min: arr_to_vec(*min),
            max: arr_to_vec(*max),
            policy: *box_policy,
        },
        SceneKind::Tokamak {
            r1,
            r2,
            torus_policy,
            ..
        } => BoundaryPolicy::Torus {
            r1: *r1,
            r2: *r2,
            policy: *torus_policy,
        },
    }
}

/// Current segments for the scene. With `excitation` off, the coils are still generated, with
/// zero current, so segment count doesn't depend on it.
pub fn currents(kind: &SceneKind, excitation: bool) -> Vec<CurrentVector> {
    match kind {
        SceneKind::FreeSpace {
            loop_current,
            loop_radius,
            ..
        } => {
            if *loop_current == 0. || *loop_radius <= 0. {
                return Vec::new();
            }
            let i = if excitation { *loop_current } else { 0. };
            current_loop(
                Vec3::new_zero(),
                Vec3::new(0., 1., 0.),
                *loop_radius,
                FREE_SPACE_LOOP_SEGMENTS,
                i,
            )
        }
        SceneKind::Tokamak {
            r1,
            r2,
            toroidal_coils: n,
            coil_loop_segments,
            toroidal_current,
            ..
        } => {
            let i = if excitation { *toroidal_current } else { 0. };
            toroidal_coils(*r1, *r2, *n, *coil_loop_segments, i).concat()
        }
    }
}

/// A uniformly-distributed point in the scene's live volume.
pub fn random_posit(kind: &SceneKind, rng: &mut StdRng) -> SimResult<Vec3> {
    let (min, max) = kind.bounds();

    for _ in 0..MAX_SAMPLE_TRIES {
        let p = Vec3::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
            rng.random_range(min.z..=max.z),
        );
        if kind.contains(p) {
            return Ok(p);
        }
    }

    Err(SimError::InvalidConfig(format!(
        "Unable to place a point inside the {} volume",
        kind.to_str()
    )))
}

/// Pick a species from `(species, weight)` pairs.
fn pick_species(mix: &[(Species, f64)], total_weight: f64, rng: &mut StdRng) -> Species {
    let mut r = rng.random_range(0.0..total_weight);
    for (species, weight) in mix {
        let weight = weight.max(0.);
        if r < weight {
            return *species;
        }
        r -= weight;
    }
    // Float round-off at the top end.
    mix[mix.len() - 1].0
}

/// Fill the particle buffers with `count` particles: uniform in the live volume, species from
/// `mix`, and Maxwellian velocities at `temperature_ev`. Velocities use the per-particle mass, so
/// macroparticles get the same thermal speed as the real thing.
pub fn seed_particles(
    kind: &SceneKind,
    particles: &mut ParticleBuffers,
    rng: &mut StdRng,
    count: usize,
    mix: &[(Species, f64)],
    temperature_ev: f64,
) -> SimResult<()> {
    if count == 0 {
        return Ok(());
    }

    let total_weight: f64 = mix.iter().map(|(_, w)| w.max(0.)).sum();
    if mix.is_empty() || total_weight <= 0. {
        return Err(SimError::InvalidConfig(
            "Species mix must have a positive total weight".to_string(),
        ));
    }

    for _ in 0..count {
        let species = pick_species(mix, total_weight, rng);
        let posit = random_posit(kind, rng)?;

        // σ of each velocity component: sqrt(kT/m).
        let σ = (temperature_ev * J_PER_EV / species.mass()).sqrt();
        let normal = Normal::new(0., σ).map_err(|e| {
            SimError::InvalidConfig(format!("Bad thermal velocity for {species}: {e}"))
        })?;
        let vel = Vec3::new(normal.sample(rng), normal.sample(rng), normal.sample(rng));

        particles.push(posit, vel, species)?;
    }

    Ok(())
}

/// Start points for tracers, uniform in the live volume.
pub fn seed_tracers(kind: &SceneKind, rng: &mut StdRng, count: usize) -> SimResult<Vec<Vec3>> {
    (0..count).map(|_| random_posit(kind, rng)).collect()
}
