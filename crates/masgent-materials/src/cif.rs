//! Minimal CIF support: P1 writer, and a reader that expands symmetry operations.

use crate::element::Element;
use crate::lattice::Lattice;
use crate::structure::{Site, Structure};
use masgent_core::{MasgentError, MasgentResult};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Renders `structure` as a P1 CIF.
pub fn write_cif(structure: &Structure) -> String {
    let lattice = structure.lattice();
    let [a, b, c] = lattice.lengths();
    let [alpha, beta, gamma] = lattice.angles();
    let formula = structure.composition_formula();
    let formula_sum: Vec<String> = structure
        .species_counts()
        .iter()
        .map(|(e, n)| format!("{}{n}", e.symbol()))
        .collect();

    let mut out = String::new();
    out.push_str("# generated by Masgent\n");
    let _ = writeln!(out, "data_{formula}");
    out.push_str("_symmetry_space_group_name_H-M   'P 1'\n");
    let _ = writeln!(out, "_cell_length_a   {a:.8}");
    let _ = writeln!(out, "_cell_length_b   {b:.8}");
    let _ = writeln!(out, "_cell_length_c   {c:.8}");
    let _ = writeln!(out, "_cell_angle_alpha   {alpha:.8}");
    let _ = writeln!(out, "_cell_angle_beta   {beta:.8}");
    let _ = writeln!(out, "_cell_angle_gamma   {gamma:.8}");
    let _ = writeln!(out, "_symmetry_Int_Tables_number   1");
    let _ = writeln!(out, "_chemical_formula_sum   '{}'", formula_sum.join(" "));
    let _ = writeln!(out, "_cell_volume   {:.8}", lattice.volume().abs());
    out.push_str("loop_\n _symmetry_equiv_pos_site_id\n _symmetry_equiv_pos_as_xyz\n  1  'x, y, z'\n");
    out.push_str("loop_\n _atom_site_type_symbol\n _atom_site_label\n _atom_site_symmetry_multiplicity\n _atom_site_fract_x\n _atom_site_fract_y\n _atom_site_fract_z\n _atom_site_occupancy\n");

    let mut seen: HashMap<Element, usize> = HashMap::new();
    for site in structure.sites() {
        let n = seen.entry(site.species).or_insert(0);
        let [x, y, z] = site.frac_coords;
        let _ = writeln!(
            out,
            "  {sym}  {sym}{n}  1  {x:.8}  {y:.8}  {z:.8}  1",
            sym = site.species.symbol()
        );
        *n += 1;
    }
    out
}

fn malformed(detail: impl std::fmt::Display) -> MasgentError {
    MasgentError::Structure(format!("malformed CIF: {detail}"))
}

#[derive(Debug, Default)]
struct CifLoop {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CifLoop {
    fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }
}

/// Splits a line into CIF tokens, honouring single and double quotes.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch == '#' {
            break;
        }
        let mut token = String::new();
        if ch == '\'' || ch == '"' {
            chars.next();
            for c in chars.by_ref() {
                if c == ch {
                    break;
                }
                token.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}

/// Returns tagged items and loops of the first data block.
fn parse_blocks(text: &str) -> (HashMap<String, String>, Vec<CifLoop>) {
    let mut items = HashMap::new();
    let mut loops = Vec::new();
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    // Collapses `;`-delimited text fields into one token.
    let read_text_field = |start: usize| -> (String, usize) {
        let mut value = lines[start].trim_start_matches(';').to_string();
        let mut j = start + 1;
        while j < lines.len() && !lines[j].starts_with(';') {
            value.push('\n');
            value.push_str(lines[j]);
            j += 1;
        }
        (value.trim().to_string(), j + 1)
    };

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() || line.starts_with('#') {
            i += 1;
            continue;
        }
        if line.starts_with("data_") {
            if !items.is_empty() || !loops.is_empty() {
                break;
            }
            i += 1;
            continue;
        }
        if line.eq_ignore_ascii_case("loop_") {
            let mut current = CifLoop::default();
            i += 1;
            while i < lines.len() && lines[i].trim().starts_with('_') {
                current.headers.push(lines[i].trim().to_string());
                i += 1;
            }
            let mut values = Vec::new();
            while i < lines.len() {
                let raw = lines[i];
                let trimmed = raw.trim();
                if trimmed.starts_with('_')
                    || trimmed.eq_ignore_ascii_case("loop_")
                    || trimmed.starts_with("data_")
                {
                    break;
                }
                if raw.starts_with(';') {
                    let (value, next) = read_text_field(i);
                    values.push(value);
                    i = next;
                    continue;
                }
                values.extend(tokenize(raw));
                i += 1;
            }
            if !current.headers.is_empty() {
                current.rows = values
                    .chunks(current.headers.len())
                    .filter(|row| row.len() == current.headers.len())
                    .map(<[String]>::to_vec)
                    .collect();
                loops.push(current);
            }
            continue;
        }
        if line.starts_with('_') {
            let mut tokens = tokenize(line);
            let tag = tokens.remove(0);
            let value = if let Some(first) = tokens.into_iter().next() {
                i += 1;
                first
            } else if i + 1 < lines.len() && lines[i + 1].starts_with(';') {
                let (value, next) = read_text_field(i + 1);
                i = next;
                value
            } else if i + 1 < lines.len() {
                i += 2;
                tokenize(lines[i - 1]).into_iter().next().unwrap_or_default()
            } else {
                i += 1;
                String::new()
            };
            items.insert(tag.to_ascii_lowercase(), value);
            continue;
        }
        i += 1;
    }
    (items, loops)
}

/// Parses a CIF number, dropping a trailing standard uncertainty such as `5.64(2)`.
fn cif_number(value: &str) -> Option<f64> {
    value.split('(').next()?.trim().parse().ok()
}

fn cif_element(token: &str) -> Option<Element> {
    let mut chars = token.chars().filter(char::is_ascii_alphabetic);
    let first = chars.next()?.to_ascii_uppercase();
    if let Some(second) = chars.next().filter(char::is_ascii_lowercase) {
        let two: String = [first, second].iter().collect();
        if let Some(element) = Element::from_symbol(&two) {
            return Some(element);
        }
    }
    Element::from_symbol(&first.to_string())
}

/// One symmetry operation `x' = R·x + t` in fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
struct SymOp {
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
}

impl SymOp {
    fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    fn parse(text: &str) -> MasgentResult<Self> {
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() != 3 {
            return Err(malformed(format!("invalid symmetry operation '{text}'")));
        }
        let mut op = Self::identity();
        for (row, part) in parts.iter().enumerate() {
            let (coeffs, shift) = parse_component(part)
                .ok_or_else(|| malformed(format!("invalid symmetry operation '{text}'")))?;
            op.rotation[row] = coeffs;
            op.translation[row] = shift;
        }
        Ok(op)
    }

    fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        [0, 1, 2].map(|r| {
            let v = self.rotation[r][0] * p[0]
                + self.rotation[r][1] * p[1]
                + self.rotation[r][2] * p[2]
                + self.translation[r];
            v.rem_euclid(1.0)
        })
    }
}

/// Parses one component such as `-x+1/2` or `x-y`.
fn parse_component(text: &str) -> Option<([f64; 3], f64)> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut coeffs = [0.0; 3];
    let mut shift = 0.0;
    let mut sign = 1.0;
    let mut number = String::new();
    let mut chars = compact.chars().peekable();
    let mut any = false;

    let flush = |number: &mut String, sign: f64, shift: &mut f64| -> Option<()> {
        if number.is_empty() {
            return Some(());
        }
        let value = match number.split_once('/') {
            Some((n, d)) => n.parse::<f64>().ok()? / d.parse::<f64>().ok()?,
            None => number.parse::<f64>().ok()?,
        };
        *shift += sign * value;
        number.clear();
        Some(())
    };

    while let Some(c) = chars.next() {
        match c {
            '+' | '-' => {
                flush(&mut number, sign, &mut shift)?;
                sign = if c == '-' { -1.0 } else { 1.0 };
            }
            'x' | 'X' | 'y' | 'Y' | 'z' | 'Z' => {
                let axis = match c.to_ascii_lowercase() {
                    'x' => 0,
                    'y' => 1,
                    _ => 2,
                };
                let factor = if number.is_empty() {
                    1.0
                } else {
                    let f = number.trim_end_matches('*').parse::<f64>().ok()?;
                    number.clear();
                    f
                };
                coeffs[axis] += sign * factor;
                sign = 1.0;
                any = true;
            }
            '0'..='9' | '.' | '/' | '*' => {
                number.push(c);
                any = true;
            }
            _ => return None,
        }
    }
    flush(&mut number, sign, &mut shift)?;
    any.then_some((coeffs, shift))
}

fn periodic_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d: Vec<f64> = (0..3)
        .map(|i| {
            let x = (a[i] - b[i]).rem_euclid(1.0);
            x.min(1.0 - x)
        })
        .collect();
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// Parses the first data block of a CIF into a structure.
pub fn read_cif(text: &str) -> MasgentResult<Structure> {
    let (items, loops) = parse_blocks(text);

    let cell = |tag: &str| -> MasgentResult<f64> {
        items
            .get(tag)
            .and_then(|v| cif_number(v))
            .ok_or_else(|| malformed(format!("missing or invalid {tag}")))
    };
    let lattice = Lattice::from_parameters(
        cell("_cell_length_a")?,
        cell("_cell_length_b")?,
        cell("_cell_length_c")?,
        cell("_cell_angle_alpha")?,
        cell("_cell_angle_beta")?,
        cell("_cell_angle_gamma")?,
    )?;

    let mut ops = Vec::new();
    for lp in &loops {
        if let Some(col) = lp.column(&[
            "_symmetry_equiv_pos_as_xyz",
            "_space_group_symop_operation_xyz",
        ]) {
            for row in &lp.rows {
                ops.push(SymOp::parse(&row[col])?);
            }
        }
    }
    if ops.is_empty() {
        ops.push(SymOp::identity());
    }

    let atoms = loops
        .iter()
        .find(|lp| lp.column(&["_atom_site_fract_x"]).is_some())
        .ok_or_else(|| malformed("no _atom_site_fract_* loop"))?;
    let col = |name: &str| {
        atoms
            .column(&[name])
            .ok_or_else(|| malformed(format!("missing {name}")))
    };
    let (cx, cy, cz) = (
        col("_atom_site_fract_x")?,
        col("_atom_site_fract_y")?,
        col("_atom_site_fract_z")?,
    );
    let species_col = atoms
        .column(&["_atom_site_type_symbol", "_atom_site_label"])
        .ok_or_else(|| malformed("missing _atom_site_type_symbol and _atom_site_label"))?;
    let occupancy_col = atoms.column(&["_atom_site_occupancy"]);

    let mut sites: Vec<Site> = Vec::new();
    for row in &atoms.rows {
        let species = cif_element(&row[species_col])
            .ok_or_else(|| malformed(format!("unknown species '{}'", row[species_col])))?;
        if let Some(occ) = occupancy_col.and_then(|c| cif_number(&row[c])) {
            if occ < 0.99 {
                return Err(MasgentError::Structure(format!(
                    "partial occupancy ({occ}) is not supported"
                )));
            }
        }
        let coord = |c: usize| {
            cif_number(&row[c]).ok_or_else(|| malformed(format!("invalid coordinate '{}'", row[c])))
        };
        let base = [coord(cx)?, coord(cy)?, coord(cz)?];
        for op in &ops {
            let frac_coords = op.apply(base);
            let duplicate = sites.iter().any(|s| {
                s.species == species && periodic_distance(s.frac_coords, frac_coords) < 1e-3
            });
            if !duplicate {
                sites.push(Site {
                    species,
                    frac_coords,
                });
            }
        }
    }

    let structure = Structure::new(lattice, sites)?;
    let comment = structure.composition_formula();
    Ok(structure.with_comment(comment))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_symop_parsing() {
        let op = SymOp::parse("-x+1/2, y, z-y").unwrap();
        assert_eq!(op.rotation[0], [-1.0, 0.0, 0.0]);
        assert!((op.translation[0] - 0.5).abs() < 1e-12);
        assert_eq!(op.rotation[2], [0.0, -1.0, 1.0]);
        assert!(SymOp::parse("x, y").is_err());
        assert!(SymOp::parse("a, b, c").is_err());
    }

    #[test]
    fn test_expands_symmetry_and_dedupes() {
        // Rocksalt NaCl conventional cell from two inequivalent sites and the F-centring
        // translations.
        let text = "data_NaCl
_cell_length_a 5.64(1)
_cell_length_b 5.64
_cell_length_c 5.64
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_symmetry_equiv_pos_as_xyz
'x, y, z'
'x, y+1/2, z+1/2'
'x+1/2, y, z+1/2'
'x+1/2, y+1/2, z'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Na1 Na+ 0 0 0
Cl1 Cl- 0.5 0.5 0.5
";
        let s = read_cif(text).unwrap();
        assert_eq!(s.num_sites(), 8);
        assert_eq!(s.composition_formula(), "Na4Cl4");
    }

    #[test]
    fn test_element_from_labels() {
        assert_eq!(cif_element("Cl1").unwrap().symbol(), "Cl");
        assert_eq!(cif_element("C12").unwrap().symbol(), "C");
        assert_eq!(cif_element("Fe2+").unwrap().symbol(), "Fe");
        assert_eq!(cif_element("Co").unwrap().symbol(), "Co");
    }
}
