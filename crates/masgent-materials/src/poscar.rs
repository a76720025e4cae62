//! VASP 5 POSCAR reader and writer.

use crate::element::Element;
use crate::lattice::{Lattice, Vec3};
use crate::structure::{Site, Structure};
use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Coordinate convention of the position block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoscarCoordinates {
    /// Fractional coordinates.
    Direct,
    /// Cartesian coordinates in Ångström.
    Cartesian,
}

impl PoscarCoordinates {
    fn header(self) -> &'static str {
        match self {
            PoscarCoordinates::Direct => "Direct",
            PoscarCoordinates::Cartesian => "Cartesian",
        }
    }
}

/// A parsed POSCAR.
#[derive(Debug, Clone, PartialEq)]
pub struct Poscar {
    /// The structure, with sites in file order.
    pub structure: Structure,
    /// The coordinate convention the file used.
    pub coordinates: PoscarCoordinates,
    /// Per-site selective-dynamics flags, when present.
    pub selective_dynamics: Option<Vec<[bool; 3]>>,
}

impl Poscar {
    /// Wraps a structure with no selective dynamics.
    pub fn new(structure: Structure, coordinates: PoscarCoordinates) -> Self {
        Self {
            structure,
            coordinates,
            selective_dynamics: None,
        }
    }

    /// Renders the POSCAR text using `self.coordinates`.
    pub fn render(&self) -> String {
        let structure = &self.structure;
        let mut out = String::new();
        let _ = writeln!(out, "{}", single_line(structure.comment()));
        out.push_str("1.0\n");
        for row in structure.lattice().matrix() {
            let _ = writeln!(out, "{}", format_vec(*row));
        }

        let counts = structure.species_counts();
        let symbols: Vec<&str> = counts.iter().map(|(e, _)| e.symbol()).collect();
        let numbers: Vec<String> = counts.iter().map(|(_, n)| n.to_string()).collect();
        let _ = writeln!(out, "{}", symbols.join(" "));
        let _ = writeln!(out, "{}", numbers.join(" "));
        if self.selective_dynamics.is_some() {
            out.push_str("Selective dynamics\n");
        }
        let _ = writeln!(out, "{}", self.coordinates.header());

        for (idx, site) in structure.sites().iter().enumerate() {
            let coords = match self.coordinates {
                PoscarCoordinates::Direct => site.frac_coords,
                PoscarCoordinates::Cartesian => structure.lattice().to_cartesian(site.frac_coords),
            };
            out.push_str(&format_vec(coords));
            if let Some(flags) = self
                .selective_dynamics
                .as_ref()
                .and_then(|all| all.get(idx))
            {
                for flag in flags {
                    out.push_str(if *flag { " T" } else { " F" });
                }
            }
            let _ = writeln!(out, " {}", site.species.symbol());
        }
        out
    }
}

/// Renders `structure` as a POSCAR; sites are grouped by species first.
pub fn write_poscar(structure: &Structure, coordinates: PoscarCoordinates) -> String {
    Poscar::new(structure.grouped_by_species(), coordinates).render()
}

fn format_vec(v: Vec3) -> String {
    format!("{:22.16}{:22.16}{:22.16}", v[0], v[1], v[2])
}

fn single_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        "Generated by Masgent".to_string()
    } else {
        line.to_string()
    }
}

fn malformed(detail: impl std::fmt::Display) -> MasgentError {
    MasgentError::Structure(format!("malformed POSCAR: {detail}"))
}

fn parse_floats(line: &str, count: usize, what: &str) -> MasgentResult<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(count)
        .map(|t| t.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| malformed(format!("cannot parse {what}: '{}'", line.trim())))?;
    if values.len() < count {
        return Err(malformed(format!("expected {count} values for {what}")));
    }
    Ok(values)
}

/// VASP 5.4 allows `Fe_pv` or `Fe/hash` labels on the species line.
fn species_symbol(token: &str) -> MasgentResult<Element> {
    let bare = token.split(['_', '/', '.']).next().unwrap_or(token);
    Element::from_symbol(bare).ok_or_else(|| malformed(format!("unknown species '{token}'")))
}

const MAX_PREALLOCATED_SITES: usize = 4096;

/// Parses POSCAR text.
pub fn read_poscar(text: &str) -> MasgentResult<Poscar> {
    let mut raw_lines = text.lines();
    // The comment line may be empty; blank lines are only skipped after it.
    let comment = raw_lines
        .next()
        .ok_or_else(|| malformed("unexpected end of file before comment"))?
        .trim()
        .to_string();
    let mut lines = raw_lines.filter(|l| !l.trim().is_empty());
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| malformed(format!("unexpected end of file before {what}")))
    };

    let scale_values: Vec<f64> = next("scale factor")?
        .split_whitespace()
        .map(|t| t.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| malformed("cannot parse scale factor"))?;

    let mut rows = [[0.0; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        let values = parse_floats(next("lattice vectors")?, 3, &format!("lattice vector {}", i + 1))?;
        *row = [values[0], values[1], values[2]];
    }
    let raw_lattice = Lattice::new(rows)?;

    let lattice = match scale_values.as_slice() {
        [s] if *s < 0.0 => {
            let factor = (s.abs() / raw_lattice.volume().abs()).cbrt();
            raw_lattice.scaled(factor)?
        }
        [s] if *s > 0.0 => raw_lattice.scaled(*s)?,
        [sx, sy, sz] if *sx > 0.0 && *sy > 0.0 && *sz > 0.0 => {
            let m = raw_lattice.matrix();
            Lattice::new([
                m[0].map(|x| x * sx),
                m[1].map(|x| x * sy),
                m[2].map(|x| x * sz),
            ])?
        }
        _ => return Err(malformed("invalid scale factor")),
    };
    let cartesian_scale = match scale_values.as_slice() {
        [s] if *s > 0.0 => [*s; 3],
        [sx, sy, sz] => [*sx, *sy, *sz],
        _ => {
            let m = lattice.matrix()[0];
            let r = raw_lattice.matrix()[0];
            let f = crate::lattice::norm(m) / crate::lattice::norm(r);
            [f; 3]
        }
    };

    let species_line = next("species line")?;
    let first = species_line.split_whitespace().next().unwrap_or_default();
    if first.parse::<usize>().is_ok() {
        return Err(malformed(
            "species names are missing (VASP 4 format is not supported)",
        ));
    }
    let species: Vec<Element> = species_line
        .split_whitespace()
        .map(species_symbol)
        .collect::<MasgentResult<_>>()?;

    let counts: Vec<usize> = next("species counts")?
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| malformed("cannot parse species counts"))?;
    if counts.len() != species.len() {
        return Err(malformed(format!(
            "{} species but {} counts",
            species.len(),
            counts.len()
        )));
    }

    let mut mode_line = next("coordinate mode")?.trim().to_string();
    let selective = mode_line.starts_with(['s', 'S']);
    if selective {
        mode_line = next("coordinate mode")?.trim().to_string();
    }
    let coordinates = if mode_line.starts_with(['c', 'C', 'k', 'K']) {
        PoscarCoordinates::Cartesian
    } else {
        PoscarCoordinates::Direct
    };

    let total = counts
        .iter()
        .try_fold(0usize, |acc, n| acc.checked_add(*n))
        .ok_or_else(|| malformed("species counts are too large"))?;
    let mut sites = Vec::with_capacity(total.min(MAX_PREALLOCATED_SITES));
    let mut flags = Vec::new();
    let kinds = species
        .iter()
        .zip(&counts)
        .flat_map(|(e, n)| std::iter::repeat(*e).take(*n));
    for (idx, element) in kinds.enumerate() {
        let line = next("atomic positions")?;
        let values = parse_floats(line, 3, &format!("position {}", idx + 1))?;
        let raw = [values[0], values[1], values[2]];
        let frac_coords = match coordinates {
            PoscarCoordinates::Direct => raw,
            PoscarCoordinates::Cartesian => lattice.to_fractional([
                raw[0] * cartesian_scale[0],
                raw[1] * cartesian_scale[1],
                raw[2] * cartesian_scale[2],
            ]),
        };
        if selective {
            let tokens: Vec<&str> = line.split_whitespace().skip(3).take(3).collect();
            let parsed: Vec<bool> = tokens.iter().map(|t| t.starts_with(['T', 't'])).collect();
            flags.push(match parsed.as_slice() {
                [x, y, z] => [*x, *y, *z],
                _ => [true; 3],
            });
        }
        sites.push(Site {
            species: element,
            frac_coords,
        });
    }

    Ok(Poscar {
        structure: Structure::new(lattice, sites)?.with_comment(comment),
        coordinates,
        selective_dynamics: selective.then_some(flags),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const NACL: &str = "NaCl rocksalt
1.0
0.0 2.82 2.82
2.82 0.0 2.82
2.82 2.82 0.0
Na Cl
1 1
Direct
0.0 0.0 0.0 Na
0.5 0.5 0.5 Cl
";

    #[test]
    fn test_read_direct() {
        let poscar = read_poscar(NACL).unwrap();
        assert_eq!(poscar.coordinates, PoscarCoordinates::Direct);
        assert_eq!(poscar.structure.num_sites(), 2);
        assert_eq!(poscar.structure.comment(), "NaCl rocksalt");
        assert!(poscar.selective_dynamics.is_none());
    }

    #[test]
    fn test_empty_comment_line() {
        let text = NACL.replacen("NaCl rocksalt", "", 1);
        let poscar = read_poscar(&text).unwrap();
        assert_eq!(poscar.structure.comment(), "");
        assert_eq!(poscar.structure.num_sites(), 2);
    }

    #[test]
    fn test_huge_species_count_is_error() {
        let text = NACL.replacen("1 1", "999999999999999 1", 1);
        let err = read_poscar(&text).unwrap_err();
        assert!(err.to_string().contains("atomic positions"));
    }

    #[test]
    fn test_negative_scale_is_volume() {
        let text = NACL.replacen("1.0", "-100.0", 1);
        let poscar = read_poscar(&text).unwrap();
        assert!((poscar.structure.lattice().volume().abs() - 100.0).abs() < 1e-8);
    }

    #[test]
    fn test_selective_dynamics_preserved() {
        let text = NACL.replace("Direct\n0.0 0.0 0.0 Na\n0.5 0.5 0.5 Cl", "Selective dynamics\nDirect\n0.0 0.0 0.0 F F T\n0.5 0.5 0.5 T T T");
        let poscar = read_poscar(&text).unwrap();
        let flags = poscar.selective_dynamics.clone().unwrap();
        assert_eq!(flags[0], [false, false, true]);
        assert!(poscar.render().contains("Selective dynamics"));
        assert!(poscar.render().contains(" F F T Na"));
    }

    #[test]
    fn test_vasp4_rejected() {
        let text = NACL.replace("Na Cl\n", "");
        let err = read_poscar(&text).unwrap_err();
        assert!(err.to_string().contains("VASP 4"));
    }

    #[test]
    fn test_write_then_read_cartesian() {
        let poscar = read_poscar(NACL).unwrap();
        let text = write_poscar(&poscar.structure, PoscarCoordinates::Cartesian);
        assert!(text.contains("Cartesian"));
        let back = read_poscar(&text).unwrap();
        assert_eq!(back.coordinates, PoscarCoordinates::Cartesian);
        let (a, b) = (&poscar.structure.sites()[1], &back.structure.sites()[1]);
        for i in 0..3 {
            assert!((a.frac_coords[i] - b.frac_coords[i]).abs() < 1e-10);
        }
    }
}
