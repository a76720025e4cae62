//! Automatic k-point meshes from a density target.

use crate::structure::Structure;
use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accuracy tier for k-point sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KpointAccuracy {
    /// 1000 k-points per reciprocal atom.
    Low,
    /// 3000 k-points per reciprocal atom.
    Medium,
    /// 5000 k-points per reciprocal atom.
    High,
}

impl KpointAccuracy {
    /// Accepted names, lowest first.
    pub const NAMES: [&'static str; 3] = ["Low", "Medium", "High"];

    /// K-points per reciprocal atom.
    pub fn kppa(self) -> u32 {
        match self {
            KpointAccuracy::Low => 1000,
            KpointAccuracy::Medium => 3000,
            KpointAccuracy::High => 5000,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            KpointAccuracy::Low => "Low",
            KpointAccuracy::Medium => "Medium",
            KpointAccuracy::High => "High",
        }
    }
}

impl fmt::Display for KpointAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KpointAccuracy {
    type Err = MasgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(KpointAccuracy::Low),
            "medium" => Ok(KpointAccuracy::Medium),
            "high" => Ok(KpointAccuracy::High),
            other => Err(MasgentError::Structure(format!(
                "unknown k-point accuracy '{other}'"
            ))),
        }
    }
}

/// Mesh centring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KpointStyle {
    /// Gamma-centred.
    Gamma,
    /// Monkhorst-Pack.
    MonkhorstPack,
}

/// An automatic KPOINTS file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpoints {
    /// First line of the file.
    pub comment: String,
    /// Mesh centring.
    pub style: KpointStyle,
    /// Subdivisions along each reciprocal vector.
    pub divisions: [u32; 3],
}

impl Kpoints {
    /// Builds a mesh with roughly `kppa` k-points per reciprocal atom.
    ///
    /// Hexagonal cells get a Gamma-centred mesh, everything else Monkhorst-Pack.
    pub fn automatic_density(structure: &Structure, kppa: u32) -> Self {
        let lengths = structure.lattice().lengths();
        let natoms = structure.num_sites().max(1) as f64;
        let mult = (f64::from(kppa) / natoms * lengths[0] * lengths[1] * lengths[2]).cbrt();
        let divisions = lengths.map(|len| ((mult / len).floor() as u32).max(1));
        let style = if structure.lattice().is_hexagonal() {
            KpointStyle::Gamma
        } else {
            KpointStyle::MonkhorstPack
        };
        Self {
            comment: format!("Automatic kpoint scheme ({kppa} kppa)"),
            style,
            divisions,
        }
    }

    /// Mesh for an accuracy tier.
    pub fn for_accuracy(structure: &Structure, accuracy: KpointAccuracy) -> Self {
        let mut kpoints = Self::automatic_density(structure, accuracy.kppa());
        kpoints.comment = format!("{accuracy} accuracy ({} kppa)", accuracy.kppa());
        kpoints
    }

    /// KPOINTS file text.
    pub fn render(&self) -> String {
        let style = match self.style {
            KpointStyle::Gamma => "Gamma",
            KpointStyle::MonkhorstPack => "Monkhorst",
        };
        let [a, b, c] = self.divisions;
        format!("{}\n0\n{style}\n{a} {b} {c}\n", self.comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builder::{bulk, CrystalStructure};
    use crate::element::Element;

    fn el(s: &str) -> Element {
        Element::from_symbol(s).unwrap()
    }

    #[test]
    fn test_density_increases_with_tier() {
        let s = bulk(el("Cu"), CrystalStructure::Fcc, 3.6, None).unwrap();
        let low = Kpoints::for_accuracy(&s, KpointAccuracy::Low);
        let high = Kpoints::for_accuracy(&s, KpointAccuracy::High);
        assert!(high.divisions[0] > low.divisions[0]);
        assert_eq!(low.style, KpointStyle::MonkhorstPack);
    }

    #[test]
    fn test_hexagonal_uses_gamma() {
        let s = bulk(el("Mg"), CrystalStructure::Hcp, 3.2, None).unwrap();
        let k = Kpoints::for_accuracy(&s, KpointAccuracy::Medium);
        assert_eq!(k.style, KpointStyle::Gamma);
        assert!(k.render().contains("\nGamma\n"));
    }

    #[test]
    fn test_divisions_never_zero() {
        let s = bulk(el("Cu"), CrystalStructure::Sc, 60.0, None).unwrap();
        let k = Kpoints::automatic_density(&s, 1);
        assert_eq!(k.divisions, [1, 1, 1]);
    }

    #[test]
    fn test_accuracy_parsing() {
        assert_eq!("medium".parse::<KpointAccuracy>().unwrap(), KpointAccuracy::Medium);
        assert!("ultra".parse::<KpointAccuracy>().is_err());
    }
}
