//! Materials Project style VASP input presets.

use crate::element::Element;
use crate::kpoints::{KpointStyle, Kpoints};
use crate::structure::Structure;
use masgent_core::MasgentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named VASP input presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaspInputSet {
    /// PBE structure relaxation.
    MPRelaxSet,
    /// Static run on a relaxed cell.
    MPStaticSet,
    /// Non-self-consistent band run.
    MPNonSCFSet,
    /// r2SCAN relaxation.
    MPScanRelaxSet,
    /// r2SCAN static run.
    MPScanStaticSet,
    /// Molecular dynamics.
    MPMDSet,
}

/// Rendered INCAR settings, ordered by key.
pub type Incar = BTreeMap<String, String>;

/// Elements whose MP POTCAR choice carries a suffix.
const POTCAR_SUFFIXES: &[(&str, &str)] = &[
    ("Li", "Li_sv"),
    ("Na", "Na_pv"),
    ("K", "K_sv"),
    ("Rb", "Rb_sv"),
    ("Cs", "Cs_sv"),
    ("Ca", "Ca_sv"),
    ("Sr", "Sr_sv"),
    ("Ba", "Ba_sv"),
    ("Sc", "Sc_sv"),
    ("Ti", "Ti_pv"),
    ("V", "V_pv"),
    ("Cr", "Cr_pv"),
    ("Mn", "Mn_pv"),
    ("Fe", "Fe_pv"),
    ("Cu", "Cu_pv"),
    ("Nb", "Nb_pv"),
    ("Mo", "Mo_pv"),
    ("Y", "Y_sv"),
    ("Zr", "Zr_sv"),
    ("Hf", "Hf_pv"),
    ("Ta", "Ta_pv"),
    ("W", "W_pv"),
    ("Ga", "Ga_d"),
    ("Ge", "Ge_d"),
    ("In", "In_d"),
    ("Sn", "Sn_d"),
    ("Tl", "Tl_d"),
    ("Pb", "Pb_d"),
    ("Bi", "Bi_d"),
];

impl VaspInputSet {
    /// Accepted names, in display order.
    pub const NAMES: [&'static str; 6] = [
        "MPRelaxSet",
        "MPStaticSet",
        "MPNonSCFSet",
        "MPScanRelaxSet",
        "MPScanStaticSet",
        "MPMDSet",
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            VaspInputSet::MPRelaxSet => "MPRelaxSet",
            VaspInputSet::MPStaticSet => "MPStaticSet",
            VaspInputSet::MPNonSCFSet => "MPNonSCFSet",
            VaspInputSet::MPScanRelaxSet => "MPScanRelaxSet",
            VaspInputSet::MPScanStaticSet => "MPScanStaticSet",
            VaspInputSet::MPMDSet => "MPMDSet",
        }
    }

    fn is_scan(self) -> bool {
        matches!(self, VaspInputSet::MPScanRelaxSet | VaspInputSet::MPScanStaticSet)
    }

    /// INCAR settings for `structure`.
    pub fn incar(self, structure: &Structure) -> Incar {
        let natoms = structure.num_sites();
        let mut incar = Incar::new();
        let mut set = |key: &str, value: String| {
            incar.insert(key.to_string(), value);
        };

        set("ENCUT", if self.is_scan() { "680" } else { "520" }.to_string());
        set("PREC", "Accurate".to_string());
        set("LASPH", ".TRUE.".to_string());
        set("LORBIT", "11".to_string());
        set("LREAL", "Auto".to_string());
        set("LWAVE", ".FALSE.".to_string());
        set("NELM", "100".to_string());
        set("ISPIN", "2".to_string());
        set("MAGMOM", magmom(structure));
        set("EDIFF", format!("{:.0e}", 5e-5 * natoms as f64).replace("e-", "E-"));

        match self {
            VaspInputSet::MPRelaxSet => {
                set("ALGO", "Fast".to_string());
                set("IBRION", "2".to_string());
                set("ISIF", "3".to_string());
                set("NSW", "99".to_string());
                set("ISMEAR", "-5".to_string());
                set("SIGMA", "0.05".to_string());
            }
            VaspInputSet::MPStaticSet => {
                set("ALGO", "Normal".to_string());
                set("NSW", "0".to_string());
                set("ISMEAR", "-5".to_string());
                set("SIGMA", "0.05".to_string());
                set("LCHARG", ".TRUE.".to_string());
                set("LAECHG", ".TRUE.".to_string());
            }
            VaspInputSet::MPNonSCFSet => {
                set("ALGO", "Normal".to_string());
                set("NSW", "0".to_string());
                set("ICHARG", "11".to_string());
                set("ISMEAR", "0".to_string());
                set("SIGMA", "0.01".to_string());
                set("NEDOS", "2001".to_string());
                set("LCHARG", ".FALSE.".to_string());
            }
            VaspInputSet::MPScanRelaxSet => {
                set("METAGGA", "R2scan".to_string());
                set("ALGO", "All".to_string());
                set("IBRION", "2".to_string());
                set("ISIF", "3".to_string());
                set("NSW", "99".to_string());
                set("ISMEAR", "0".to_string());
                set("SIGMA", "0.05".to_string());
                set("KSPACING", "0.22".to_string());
                set("EDIFFG", "-0.02".to_string());
            }
            VaspInputSet::MPScanStaticSet => {
                set("METAGGA", "R2scan".to_string());
                set("ALGO", "All".to_string());
                set("NSW", "0".to_string());
                set("ISMEAR", "-5".to_string());
                set("SIGMA", "0.05".to_string());
                set("LCHARG", ".TRUE.".to_string());
                set("LAECHG", ".TRUE.".to_string());
            }
            VaspInputSet::MPMDSet => {
                set("ALGO", "Fast".to_string());
                set("IBRION", "0".to_string());
                set("MDALGO", "2".to_string());
                set("NSW", "1000".to_string());
                set("POTIM", "2".to_string());
                set("TEBEG", "300".to_string());
                set("TEEND", "300".to_string());
                set("SMASS", "0".to_string());
                set("ISYM", "0".to_string());
                set("ISMEAR", "0".to_string());
                set("SIGMA", "0.05".to_string());
                set("ISPIN", "1".to_string());
                set("LCHARG", ".FALSE.".to_string());
            }
        }
        if self == VaspInputSet::MPMDSet {
            incar.remove("MAGMOM");
        }
        incar
    }

    /// KPOINTS for `structure`; MD runs sample only Gamma.
    pub fn kpoints(self, structure: &Structure) -> Kpoints {
        let kppa = match self {
            VaspInputSet::MPRelaxSet => 1000,
            VaspInputSet::MPStaticSet => 1500,
            VaspInputSet::MPNonSCFSet => 3000,
            VaspInputSet::MPScanRelaxSet | VaspInputSet::MPScanStaticSet => 2000,
            VaspInputSet::MPMDSet => {
                return Kpoints {
                    comment: "Gamma only".to_string(),
                    style: KpointStyle::Gamma,
                    divisions: [1, 1, 1],
                }
            }
        };
        let mut kpoints = Kpoints::automatic_density(structure, kppa);
        kpoints.comment = format!("{} ({kppa} kppa)", self.name());
        kpoints
    }

    /// POTCAR labels for each species in first-appearance order.
    pub fn potcar_symbols(self, structure: &Structure) -> Vec<String> {
        structure
            .species_counts()
            .into_iter()
            .map(|(element, _)| potcar_symbol(element))
            .collect()
    }
}

fn potcar_symbol(element: Element) -> String {
    POTCAR_SUFFIXES
        .iter()
        .find(|(sym, _)| *sym == element.symbol())
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| element.symbol().to_string())
}

/// Ferromagnetic starting moments, one group per species.
fn magmom(structure: &Structure) -> String {
    structure
        .species_counts()
        .iter()
        .map(|(_, n)| format!("{n}*0.6"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders INCAR as `KEY = value` lines in key order.
pub fn render_incar(incar: &Incar) -> String {
    incar
        .iter()
        .map(|(key, value)| format!("{key} = {value}\n"))
        .collect()
}

impl fmt::Display for VaspInputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VaspInputSet {
    type Err = MasgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            VaspInputSet::MPRelaxSet,
            VaspInputSet::MPStaticSet,
            VaspInputSet::MPNonSCFSet,
            VaspInputSet::MPScanRelaxSet,
            VaspInputSet::MPScanStaticSet,
            VaspInputSet::MPMDSet,
        ]
        .into_iter()
        .find(|set| set.name().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| MasgentError::Structure(format!("unknown VASP input set '{wanted}'")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builder::{bulk, CrystalStructure};

    fn copper() -> Structure {
        bulk(Element::from_symbol("Cu").unwrap(), CrystalStructure::Fcc, 3.6, None).unwrap()
    }

    #[test]
    fn test_incar_is_sorted_and_deterministic() {
        let s = copper();
        let a = render_incar(&VaspInputSet::MPRelaxSet.incar(&s));
        let b = render_incar(&VaspInputSet::MPRelaxSet.incar(&s));
        assert_eq!(a, b);
        let keys: Vec<&str> = a.lines().map(|l| l.split(" = ").next().unwrap()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert!(a.contains("ISIF = 3\n"));
    }

    #[test]
    fn test_md_set_is_gamma_only() {
        let k = VaspInputSet::MPMDSet.kpoints(&copper());
        assert_eq!(k.divisions, [1, 1, 1]);
        assert!(!VaspInputSet::MPMDSet.incar(&copper()).contains_key("MAGMOM"));
    }

    #[test]
    fn test_potcar_symbols_use_mp_choices() {
        assert_eq!(VaspInputSet::MPStaticSet.potcar_symbols(&copper()), vec!["Cu_pv"]);
    }

    #[test]
    fn test_set_names_parse() {
        assert_eq!("mpscanrelaxset".parse::<VaspInputSet>().unwrap(), VaspInputSet::MPScanRelaxSet);
        assert!("MPFooSet".parse::<VaspInputSet>().is_err());
    }
}
