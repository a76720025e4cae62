use crate::element::Element;
use crate::lattice::{Lattice, Vec3};
use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};

/// One atom in the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Occupying element.
    pub species: Element,
    /// Fractional coordinates.
    pub frac_coords: Vec3,
}

/// A periodic crystal structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
    comment: String,
}

impl Structure {
    /// Creates a structure; at least one site is required.
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> MasgentResult<Self> {
        if sites.is_empty() {
            return Err(MasgentError::Structure("structure has no sites".to_string()));
        }
        let mut structure = Self {
            lattice,
            sites,
            comment: String::new(),
        };
        structure.comment = structure.composition_formula();
        Ok(structure)
    }

    /// Creates a structure from Cartesian positions.
    pub fn from_cartesian(lattice: Lattice, atoms: Vec<(Element, Vec3)>) -> MasgentResult<Self> {
        let sites = atoms
            .into_iter()
            .map(|(species, cart)| Site {
                species,
                frac_coords: lattice.to_fractional(cart),
            })
            .collect();
        Self::new(lattice, sites)
    }

    /// Replaces the free-text comment (first POSCAR line, CIF data block name).
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The cell.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// All sites in file order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Free-text comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Number of sites.
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Cartesian position of every site.
    pub fn cartesian_coords(&self) -> Vec<Vec3> {
        self.sites
            .iter()
            .map(|s| self.lattice.to_cartesian(s.frac_coords))
            .collect()
    }

    /// Distinct species in first-appearance order with their counts.
    pub fn species_counts(&self) -> Vec<(Element, usize)> {
        let mut counts: Vec<(Element, usize)> = Vec::new();
        for site in &self.sites {
            match counts.iter_mut().find(|(e, _)| *e == site.species) {
                Some((_, n)) => *n += 1,
                None => counts.push((site.species, 1)),
            }
        }
        counts
    }

    /// Formula such as `Na4Cl4` in species order.
    pub fn composition_formula(&self) -> String {
        self.species_counts()
            .into_iter()
            .map(|(e, n)| format!("{}{n}", e.symbol()))
            .collect()
    }

    /// A copy whose sites are grouped by species (first-appearance order), as VASP expects.
    pub fn grouped_by_species(&self) -> Self {
        let order = self.species_counts();
        let mut sites = Vec::with_capacity(self.sites.len());
        for (element, _) in order {
            sites.extend(self.sites.iter().filter(|s| s.species == element).cloned());
        }
        Self {
            lattice: self.lattice,
            sites,
            comment: self.comment.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn el(s: &str) -> Element {
        Element::from_symbol(s).unwrap()
    }

    #[test]
    fn test_species_grouping() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap();
        let structure = Structure::new(
            lattice,
            vec![
                Site { species: el("Na"), frac_coords: [0.0, 0.0, 0.0] },
                Site { species: el("Cl"), frac_coords: [0.5, 0.5, 0.5] },
                Site { species: el("Na"), frac_coords: [0.5, 0.5, 0.0] },
            ],
        )
        .unwrap();
        assert_eq!(structure.composition_formula(), "Na2Cl1");
        let grouped = structure.grouped_by_species();
        assert_eq!(grouped.sites()[1].species, el("Na"));
        assert_eq!(grouped.sites()[2].species, el("Cl"));
    }

    #[test]
    fn test_empty_structure_rejected() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap();
        assert!(Structure::new(lattice, vec![]).is_err());
    }
}
