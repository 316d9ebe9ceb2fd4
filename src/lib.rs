//! Particle-in-cell plasma simulation: charged particles in a tokamak or free-space box, pushed
//! by the Lorentz force from coil currents, a central solenoid, and each other.

#![allow(non_snake_case)]
#![allow(non_ascii_idents)]
#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

pub mod accel;
pub mod boundary;
pub mod config;
pub mod currents;
pub mod error;
pub mod field;
pub mod integrate;
pub mod mesh;
pub mod particles;
pub mod properties;
pub mod scene;
pub mod sim;
pub mod species;
pub mod tracer;
pub mod units;
pub mod util;

pub use config::Config;
pub use error::{SimError, SimResult};
pub use sim::Simulation;
