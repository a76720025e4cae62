use crate::cif::{read_cif, write_cif};
use crate::poscar::{read_poscar, write_poscar, PoscarCoordinates};
use crate::structure::Structure;
use crate::xyz::{read_xyz, write_xyz};
use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Structure file formats the codecs understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureFormat {
    /// VASP POSCAR.
    #[serde(rename = "POSCAR")]
    Poscar,
    /// Crystallographic Information File.
    #[serde(rename = "CIF")]
    Cif,
    /// Extended XYZ.
    #[serde(rename = "XYZ")]
    Xyz,
}

impl StructureFormat {
    /// Canonical names, as shown to users.
    pub const NAMES: [&'static str; 3] = ["POSCAR", "CIF", "XYZ"];

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            StructureFormat::Poscar => "POSCAR",
            StructureFormat::Cif => "CIF",
            StructureFormat::Xyz => "XYZ",
        }
    }

    /// File name used when writing a structure converted from `source` into this format.
    ///
    /// POSCAR keeps its conventional name; other formats reuse the source file stem.
    pub fn output_file_name(self, source: &Path) -> String {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("structure");
        match self {
            StructureFormat::Poscar => "POSCAR".to_string(),
            StructureFormat::Cif => format!("{stem}.cif"),
            StructureFormat::Xyz => format!("{stem}.xyz"),
        }
    }

    /// Parses structure text in this format.
    pub fn parse(self, text: &str) -> MasgentResult<Structure> {
        match self {
            StructureFormat::Poscar => read_poscar(text).map(|p| p.structure),
            StructureFormat::Cif => read_cif(text),
            StructureFormat::Xyz => read_xyz(text),
        }
    }

    /// Renders `structure` in this format. POSCAR output uses direct coordinates.
    pub fn render(self, structure: &Structure) -> String {
        match self {
            StructureFormat::Poscar => write_poscar(structure, PoscarCoordinates::Direct),
            StructureFormat::Cif => write_cif(structure),
            StructureFormat::Xyz => write_xyz(structure),
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureFormat {
    type Err = MasgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSCAR" | "VASP" => Ok(StructureFormat::Poscar),
            "CIF" => Ok(StructureFormat::Cif),
            "XYZ" => Ok(StructureFormat::Xyz),
            other => Err(MasgentError::Structure(format!(
                "unsupported structure format '{other}'"
            ))),
        }
    }
}

/// Reads and parses a structure file.
pub fn read_structure(path: &Path, format: StructureFormat) -> MasgentResult<Structure> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        MasgentError::Structure(format!("cannot read {}: {e}", path.display()))
    })?;
    format.parse(&text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("cif".parse::<StructureFormat>().unwrap(), StructureFormat::Cif);
        assert_eq!(" Poscar ".parse::<StructureFormat>().unwrap(), StructureFormat::Poscar);
        assert!("pdb".parse::<StructureFormat>().is_err());
    }

    #[test]
    fn test_output_file_names() {
        let src = Path::new("/tmp/NaCl.vasp");
        assert_eq!(StructureFormat::Poscar.output_file_name(src), "POSCAR");
        assert_eq!(StructureFormat::Cif.output_file_name(src), "NaCl.cif");
        assert_eq!(StructureFormat::Xyz.output_file_name(Path::new("POSCAR")), "POSCAR.xyz");
    }

    #[test]
    fn test_cif_to_xyz_preserves_sites() {
        let poscar = "Si\n1.0\n0 2.7 2.7\n2.7 0 2.7\n2.7 2.7 0\nSi\n2\nDirect\n0 0 0\n0.25 0.25 0.25\n";
        let s = StructureFormat::Poscar.parse(poscar).unwrap();
        let cif = StructureFormat::Cif.render(&s);
        let from_cif = StructureFormat::Cif.parse(&cif).unwrap();
        let xyz = StructureFormat::Xyz.render(&from_cif);
        let back = StructureFormat::Xyz.parse(&xyz).unwrap();
        assert_eq!(back.num_sites(), 2);
        assert!((back.lattice().volume().abs() - s.lattice().volume().abs()).abs() < 1e-5);
    }
}
