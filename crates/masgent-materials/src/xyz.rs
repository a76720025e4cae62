//! Extended XYZ with a `Lattice="..."` comment line.

use crate::element::Element;
use crate::lattice::Lattice;
use crate::structure::Structure;
use masgent_core::{MasgentError, MasgentResult};
use std::fmt::Write as _;

fn malformed(detail: impl std::fmt::Display) -> MasgentError {
    MasgentError::Structure(format!("malformed XYZ: {detail}"))
}

/// Renders `structure` as extended XYZ with Cartesian positions.
pub fn write_xyz(structure: &Structure) -> String {
    let lattice: Vec<String> = structure
        .lattice()
        .matrix()
        .iter()
        .flatten()
        .map(|x| format!("{x:.8}"))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", structure.num_sites());
    let _ = writeln!(
        out,
        "Lattice=\"{}\" Properties=species:S:1:pos:R:3 pbc=\"T T T\"",
        lattice.join(" ")
    );
    for (site, pos) in structure.sites().iter().zip(structure.cartesian_coords()) {
        let _ = writeln!(
            out,
            "{:<2} {:16.8} {:16.8} {:16.8}",
            site.species.symbol(),
            pos[0],
            pos[1],
            pos[2]
        );
    }
    out
}

/// Pulls the nine numbers out of `Lattice="..."`.
fn lattice_from_comment(comment: &str) -> MasgentResult<Lattice> {
    let lower = comment.to_ascii_lowercase();
    let start = lower
        .find("lattice=\"")
        .ok_or_else(|| malformed("no Lattice=\"...\" in the comment line; plain XYZ has no cell"))?
        + "lattice=\"".len();
    let rest = &comment[start..];
    let end = rest
        .find('"')
        .ok_or_else(|| malformed("unterminated Lattice string"))?;
    let values: Vec<f64> = rest[..end]
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| malformed("non-numeric lattice value"))?;
    if values.len() != 9 {
        return Err(malformed(format!(
            "Lattice needs 9 values, found {}",
            values.len()
        )));
    }
    Lattice::new([
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ])
}

const MAX_PREALLOCATED_ATOMS: usize = 4096;

/// Parses extended XYZ; species must be in the first column and positions in the next three.
pub fn read_xyz(text: &str) -> MasgentResult<Structure> {
    let mut lines = text.lines();
    let count: usize = lines
        .next()
        .map(str::trim)
        .and_then(|l| l.parse().ok())
        .ok_or_else(|| malformed("first line must be the atom count"))?;
    let comment = lines.next().ok_or_else(|| malformed("missing comment line"))?;
    let lattice = lattice_from_comment(comment)?;

    // The count is untrusted until the atom lines are actually there.
    let mut atoms = Vec::with_capacity(count.min(MAX_PREALLOCATED_ATOMS));
    for idx in 0..count {
        let line = lines
            .next()
            .ok_or_else(|| malformed(format!("expected {count} atoms, found {idx}")))?;
        let mut tokens = line.split_whitespace();
        let symbol = tokens.next().unwrap_or_default();
        let species = Element::from_symbol(symbol)
            .ok_or_else(|| malformed(format!("unknown species '{symbol}'")))?;
        let coords: Vec<f64> = tokens
            .take(3)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| malformed(format!("invalid position on atom line {}", idx + 1)))?;
        if coords.len() != 3 {
            return Err(malformed(format!("atom line {} needs 3 coordinates", idx + 1)));
        }
        atoms.push((species, [coords[0], coords[1], coords[2]]));
    }

    let structure = Structure::from_cartesian(lattice, atoms)?;
    let formula = structure.composition_formula();
    Ok(structure.with_comment(formula))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_extended_xyz() {
        let text = "2\nLattice=\"4.0 0 0 0 4.0 0 0 0 4.0\" Properties=species:S:1:pos:R:3\nCs 0 0 0\nCl 2.0 2.0 2.0\n";
        let s = read_xyz(text).unwrap();
        assert_eq!(s.num_sites(), 2);
        assert!((s.sites()[1].frac_coords[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_plain_xyz_rejected() {
        let err = read_xyz("1\nwater-ish\nO 0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("Lattice"));
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(read_xyz("3\nLattice=\"4 0 0 0 4 0 0 0 4\"\nNa 0 0 0\n").is_err());
    }

    #[test]
    fn test_oversized_count_reports_short_file() {
        let err = read_xyz("999999999999999\nLattice=\"3 0 0 0 3 0 0 0 3\"\nCu 0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_write_has_lattice() {
        let s = read_xyz("1\nLattice=\"3 0 0 0 3 0 0 0 3\"\nPo 0 0 0\n").unwrap();
        let text = write_xyz(&s);
        assert!(text.starts_with("1\nLattice=\""));
        assert_eq!(read_xyz(&text).unwrap().num_sites(), 1);
    }
}
