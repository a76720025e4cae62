//! Primitive bulk cells for single-element crystals.

use crate::element::Element;
use crate::lattice::Lattice;
use crate::structure::{Site, Structure};
use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported bulk crystal structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrystalStructure {
    /// Simple cubic.
    Sc,
    /// Face-centred cubic (primitive cell).
    Fcc,
    /// Body-centred cubic (primitive cell).
    Bcc,
    /// Hexagonal close-packed.
    Hcp,
    /// Diamond (fcc with a two-atom basis).
    Diamond,
}

impl CrystalStructure {
    /// Canonical lowercase names.
    pub const NAMES: [&'static str; 5] = ["sc", "fcc", "bcc", "hcp", "diamond"];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            CrystalStructure::Sc => "sc",
            CrystalStructure::Fcc => "fcc",
            CrystalStructure::Bcc => "bcc",
            CrystalStructure::Hcp => "hcp",
            CrystalStructure::Diamond => "diamond",
        }
    }
}

impl fmt::Display for CrystalStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CrystalStructure {
    type Err = MasgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sc" => Ok(CrystalStructure::Sc),
            "fcc" => Ok(CrystalStructure::Fcc),
            "bcc" => Ok(CrystalStructure::Bcc),
            "hcp" => Ok(CrystalStructure::Hcp),
            "diamond" => Ok(CrystalStructure::Diamond),
            other => Err(MasgentError::Structure(format!(
                "unsupported crystal structure '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Builds a primitive bulk cell.
///
/// `c` is only meaningful for [`CrystalStructure::Hcp`] and defaults to the ideal
/// `a·√(8/3)`.
pub fn bulk(
    element: Element,
    structure: CrystalStructure,
    a: f64,
    c: Option<f64>,
) -> MasgentResult<Structure> {
    if !(a.is_finite() && a > 0.0) {
        return Err(MasgentError::Structure(format!(
            "lattice constant must be positive, got {a}"
        )));
    }
    if c.is_some() && structure != CrystalStructure::Hcp {
        return Err(MasgentError::Structure(format!(
            "lattice constant c only applies to hcp, not {structure}"
        )));
    }

    let h = a / 2.0;
    let site = |x: f64, y: f64, z: f64| Site {
        species: element,
        frac_coords: [x, y, z],
    };

    let (lattice, sites) = match structure {
        CrystalStructure::Sc => (
            Lattice::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])?,
            vec![site(0.0, 0.0, 0.0)],
        ),
        CrystalStructure::Fcc => (
            Lattice::new([[0.0, h, h], [h, 0.0, h], [h, h, 0.0]])?,
            vec![site(0.0, 0.0, 0.0)],
        ),
        CrystalStructure::Bcc => (
            Lattice::new([[-h, h, h], [h, -h, h], [h, h, -h]])?,
            vec![site(0.0, 0.0, 0.0)],
        ),
        CrystalStructure::Diamond => (
            Lattice::new([[0.0, h, h], [h, 0.0, h], [h, h, 0.0]])?,
            vec![site(0.0, 0.0, 0.0), site(0.25, 0.25, 0.25)],
        ),
        CrystalStructure::Hcp => {
            let c = c.unwrap_or(a * (8.0_f64 / 3.0).sqrt());
            if !(c.is_finite() && c > 0.0) {
                return Err(MasgentError::Structure(format!(
                    "lattice constant c must be positive, got {c}"
                )));
            }
            (
                Lattice::new([
                    [a, 0.0, 0.0],
                    [-a / 2.0, a * 3.0_f64.sqrt() / 2.0, 0.0],
                    [0.0, 0.0, c],
                ])?,
                vec![
                    site(1.0 / 3.0, 2.0 / 3.0, 0.25),
                    site(2.0 / 3.0, 1.0 / 3.0, 0.75),
                ],
            )
        }
    };

    Ok(Structure::new(lattice, sites)?
        .with_comment(format!("{} {structure}", element.symbol())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cu() -> Element {
        Element::from_symbol("Cu").unwrap()
    }

    #[test]
    fn test_fcc_primitive_volume() {
        let s = bulk(cu(), CrystalStructure::Fcc, 3.6, None).unwrap();
        assert_eq!(s.num_sites(), 1);
        assert!((s.lattice().volume().abs() - 3.6_f64.powi(3) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_hcp_defaults_ideal_c() {
        let s = bulk(cu(), CrystalStructure::Hcp, 2.5, None).unwrap();
        assert_eq!(s.num_sites(), 2);
        let [_, _, c] = s.lattice().lengths();
        assert!((c - 2.5 * (8.0_f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!(s.lattice().is_hexagonal());
    }

    #[test]
    fn test_c_rejected_for_cubic() {
        assert!(bulk(cu(), CrystalStructure::Fcc, 3.6, Some(4.0)).is_err());
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!("FCC".parse::<CrystalStructure>().unwrap(), CrystalStructure::Fcc);
        assert!("rocksalt".parse::<CrystalStructure>().is_err());
    }
}
