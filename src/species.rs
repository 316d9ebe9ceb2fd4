//! Particle species, and their mass, charge, and charge-to-mass ratio.
//!
//! Particles store their species as a float tag in the 4th slot of their position; see
//! `Species::tag` and `Species::from_tag`. Lookups by tag return 0 for unknown tags instead of
//! failing; a zero mass or charge is a degenerate particle, not a fault.

use std::fmt;

use bincode::{Decode, Encode};

use crate::units::{
    ELEMENTARY_CHARGE, MACRO_PARTICLE_FACTOR, MASS_ALPHA, MASS_DEUTERIUM, MASS_DEUTERON,
    MASS_ELECTRON, MASS_NEUTRON, MASS_PROTON, MASS_TRITIUM, MASS_TRITON,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Encode, Decode)]
#[repr(u8)]
pub enum Species {
    Neutron = 0,
    Electron = 1,
    Proton = 2,
    /// Neutral atom.
    Deuterium = 3,
    /// Neutral atom.
    Tritium = 4,
    /// α particle.
    Helium4Nucleus = 5,
    Deuteron = 6,
    Triton = 7,
    /// `MACRO_PARTICLE_FACTOR` electrons lumped together.
    ElectronMacro = 8,
    /// `MACRO_PARTICLE_FACTOR` protons lumped together.
    ProtonMacro = 9,
}

impl Species {
    pub const ALL: [Self; 10] = [
        Self::Neutron,
        Self::Electron,
        Self::Proton,
        Self::Deuterium,
        Self::Tritium,
        Self::Helium4Nucleus,
        Self::Deuteron,
        Self::Triton,
        Self::ElectronMacro,
        Self::ProtonMacro,
    ];

    /// kg. Macroparticles use the per-particle mass.
    pub fn mass(self) -> f64 {
        match self {
            Self::Neutron => MASS_NEUTRON,
            Self::Electron | Self::ElectronMacro => MASS_ELECTRON,
            Self::Proton | Self::ProtonMacro => MASS_PROTON,
            Self::Deuterium => MASS_DEUTERIUM,
            Self::Tritium => MASS_TRITIUM,
            Self::Helium4Nucleus => MASS_ALPHA,
            Self::Deuteron => MASS_DEUTERON,
            Self::Triton => MASS_TRITON,
        }
    }

    /// C.
    pub fn charge(self) -> f64 {
        match self {
            Self::Neutron | Self::Deuterium | Self::Tritium => 0.,
            Self::Electron => -ELEMENTARY_CHARGE,
            Self::Proton | Self::Deuteron | Self::Triton => ELEMENTARY_CHARGE,
            Self::Helium4Nucleus => 2. * ELEMENTARY_CHARGE,
            Self::ElectronMacro => -ELEMENTARY_CHARGE * MACRO_PARTICLE_FACTOR,
            Self::ProtonMacro => ELEMENTARY_CHARGE * MACRO_PARTICLE_FACTOR,
        }
    }

    /// C/kg
    pub fn charge_to_mass(self) -> f64 {
        self.charge() / self.mass()
    }

    pub fn tag(self) -> f64 {
        self as u8 as f64
    }

    pub fn from_tag(tag: f64) -> Option<Self> {
        if !tag.is_finite() {
            return None;
        }
        let rounded = tag.round();
        if rounded < 0. || rounded > u8::MAX as f64 {
            return None;
        }

        Self::ALL.iter().copied().find(|s| *s as u8 == rounded as u8)
    }

    pub fn to_str(self) -> &'static str {
        match self {
            Self::Neutron => "n",
            Self::Electron => "e⁻",
            Self::Proton => "p",
            Self::Deuterium => "D",
            Self::Tritium => "T",
            Self::Helium4Nucleus => "α",
            Self::Deuteron => "d",
            Self::Triton => "t",
            Self::ElectronMacro => "e⁻ (macro)",
            Self::ProtonMacro => "p (macro)",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

pub fn mass_of_tag(tag: f64) -> f64 {
    Species::from_tag(tag).map(Species::mass).unwrap_or(0.)
}

pub fn charge_of_tag(tag: f64) -> f64 {
    Species::from_tag(tag).map(Species::charge).unwrap_or(0.)
}

pub fn charge_to_mass_of_tag(tag: f64) -> f64 {
    Species::from_tag(tag)
        .map(Species::charge_to_mass)
        .unwrap_or(0.)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn macro_electron_scales_charge_not_mass() {
        let e = Species::Electron;
        let macro_e = Species::ElectronMacro;

        assert_eq!(macro_e.charge(), e.charge() * 1.0e9);
        assert!(macro_e.charge() < 0.);
        assert_eq!(macro_e.mass(), e.mass());
        assert_eq!(macro_e.mass(), MASS_ELECTRON);
        assert_relative_eq!(
            macro_e.charge_to_mass(),
            e.charge_to_mass() * 1.0e9,
            max_relative = 1e-12
        );
    }

    #[test]
    fn macro_proton_scales_charge_not_mass() {
        assert_eq!(Species::ProtonMacro.charge(), Species::Proton.charge() * 1.0e9);
        assert!(Species::ProtonMacro.charge() > 0.);
        assert_eq!(Species::ProtonMacro.mass(), Species::Proton.mass());
    }

    #[test]
    fn neutral_species_have_no_charge() {
        for s in [Species::Neutron, Species::Deuterium, Species::Tritium] {
            assert_eq!(s.charge(), 0.);
            assert_eq!(s.charge_to_mass(), 0.);
            assert!(s.mass() > 0.);
        }
    }

    #[test]
    fn tags_map_back() {
        for s in Species::ALL {
            assert_eq!(Species::from_tag(s.tag()), Some(s));
            // Float tags survive small drift.
            assert_eq!(Species::from_tag(s.tag() + 0.2), Some(s));
        }
    }

    #[test]
    fn unknown_tags_give_zero() {
        for tag in [-3., 42., 255., f64::NAN, f64::INFINITY] {
            assert_eq!(Species::from_tag(tag), None);
            assert_eq!(mass_of_tag(tag), 0.);
            assert_eq!(charge_of_tag(tag), 0.);
            assert_eq!(charge_to_mass_of_tag(tag), 0.);
        }
    }

    #[test]
    fn alpha_is_doubly_charged() {
        assert_relative_eq!(
            Species::Helium4Nucleus.charge(),
            2. * Species::Proton.charge()
        );
    }
}
