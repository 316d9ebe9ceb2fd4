//! Tracers: massless points stepped along the local E or B direction, to show field topology.
//! They read the solved cell fields only; they never touch particles or fields.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::mesh::{interpolate, particle_stencil, MeshProperties};

/// Trail length, per tracer.
pub const TRACER_LENGTH: usize = 500;

/// Below this, the field has no usable direction and the tracer holds still.
const MIN_FIELD_MAG: f64 = 1e-30;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Encode, Decode)]
pub enum TracerField {
    Electric,
    Magnetic,
}

/// A set of tracers, each with a ring buffer of `TRACER_LENGTH` positions. All tracers share one
/// head index. Tracer `t` owns slots `t * TRACER_LENGTH..(t + 1) * TRACER_LENGTH`.
#[derive(Clone, Debug)]
pub struct TracerSet {
    pub field: TracerField,
    /// Distance moved per advance. m
    pub step: f64,
    points: Vec<Vec3>,
    /// The slot the next advance writes.
    head: usize,
}

impl TracerSet {
    /// Every slot of each trail starts at its seed.
    pub fn new(seeds: &[Vec3], field: TracerField, step: f64) -> Self {
        let mut points = Vec::with_capacity(seeds.len() * TRACER_LENGTH);
        for seed in seeds {
            points.extend(std::iter::repeat(*seed).take(TRACER_LENGTH));
        }

        Self {
            field,
            step,
            points,
            head: 0,
        }
    }

    pub fn num_tracers(&self) -> usize {
        self.points.len() / TRACER_LENGTH
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// All trails, flat. Readers take the whole ring regardless of head position.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn trail(&self, tracer: usize) -> &[Vec3] {
        &self.points[tracer * TRACER_LENGTH..(tracer + 1) * TRACER_LENGTH]
    }

    /// Most recently written point of a tracer.
    pub fn latest(&self, tracer: usize) -> Vec3 {
        let prev = (self.head + TRACER_LENGTH - 1) % TRACER_LENGTH;
        self.points[tracer * TRACER_LENGTH + prev]
    }

    /// Step each tracer along the normalized field, writing into the head slot, then advance
    /// the head. Off-mesh tracers, or ones in zero field, repeat their last point.
    pub fn advance(&mut self, mesh: &MeshProperties, e: &[Vec3], b: &[Vec3]) {
        let field = match self.field {
            TracerField::Electric => e,
            TracerField::Magnetic => b,
        };
        let step = self.step;

        let next: Vec<Vec3> = (0..self.num_tracers())
            .into_par_iter()
            .map(|t| {
                let p = self.latest(t);
                if !mesh.contains(p) {
                    return p;
                }

                let f = interpolate(field, &particle_stencil(p, mesh));
                if f.magnitude() < MIN_FIELD_MAG {
                    return p;
                }
                p + f.to_normalized() * step
            })
            .collect();

        for (t, p) in next.into_iter().enumerate() {
            self.points[t * TRACER_LENGTH + self.head] = p;
        }

        self.head = (self.head + 1) % TRACER_LENGTH;
    }
}
