//! Physical constants, and a definition of the base units used throughout this program.
//!
//! Everything is SI: m, s, kg, C, A, V/m, T.

use std::f64::consts::PI;

/// Elementary charge. C
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Vacuum permittivity. F/m
pub const EPS_0: f64 = 8.854_187_812_8e-12;
/// Vacuum permeability. N/A^2
pub const MU_0: f64 = 1.256_637_062_12e-6;

/// Coulomb constant, 1 / (4πε₀). N m^2 / C^2
pub const K_COULOMB: f64 = 1. / (4. * PI * EPS_0);
/// μ₀ / 4π; the Biot-Savart prefactor. T m / A
pub const MU_0_OVER_4PI: f64 = MU_0 / (4. * PI);

pub const MASS_ELECTRON: f64 = 9.109_383_701_5e-31;
pub const MASS_PROTON: f64 = 1.672_621_923_69e-27;
pub const MASS_NEUTRON: f64 = 1.674_927_498_04e-27;
/// Bare nuclei.
pub const MASS_DEUTERON: f64 = 3.343_583_772_4e-27;
pub const MASS_TRITON: f64 = 5.007_356_744_6e-27;
pub const MASS_ALPHA: f64 = 6.644_657_335_7e-27;
/// Neutral atoms: nucleus plus one electron.
pub const MASS_DEUTERIUM: f64 = MASS_DEUTERON + MASS_ELECTRON;
pub const MASS_TRITIUM: f64 = MASS_TRITON + MASS_ELECTRON;

/// Number of real particles lumped into one macroparticle. Scales charge only.
pub const MACRO_PARTICLE_FACTOR: f64 = 1.0e9;

/// J per eV. Used for temperatures and energy diagnostics.
pub const J_PER_EV: f64 = ELEMENTARY_CHARGE;

/// Below this separation (m), a source and a field point are treated as coincident, and
/// contribute nothing.
pub const SEPARATION_EPS: f64 = 1.0e-9;
