//! Materials-science collaborators for Masgent.
//!
//! Everything the generation tools need to turn validated parameters into file
//! contents: a periodic table, chemical formula parsing, a small lattice/structure
//! model, POSCAR/CIF/XYZ codecs, a bulk crystal builder, Materials Project style VASP
//! input presets and the Materials Project HTTP client.
//!
//! # Main entry points
//!
//! - [`Formula::parse()`]: Validate a chemical formula.
//! - [`bulk()`]: Build a primitive single-element cell.
//! - [`StructureFormat`]: Read and render structure files.
//! - [`VaspInputSet`]: INCAR, KPOINTS and POTCAR choices for a preset.
//! - [`MaterialsDatabase`]: Best-match structure lookup by formula.

/// Primitive bulk crystal builder.
pub mod builder;
/// CIF reader and P1 writer.
pub mod cif;
/// Materials database trait and the Materials Project client.
pub mod database;
/// Periodic table.
pub mod element;
/// Structure format dispatch.
pub mod format;
/// Chemical formula parsing.
pub mod formula;
/// VASP input presets.
pub mod input_set;
/// K-point meshes.
pub mod kpoints;
/// Periodic lattice.
pub mod lattice;
/// POSCAR codec.
pub mod poscar;
/// Pseudopotential library access.
pub mod potcar;
/// Crystal structure model.
pub mod structure;
/// Extended XYZ codec.
pub mod xyz;

pub use builder::{bulk, CrystalStructure};
pub use database::{MaterialMatch, MaterialsDatabase, MaterialsProjectClient, DEFAULT_MP_BASE_URL};
pub use element::{is_element_symbol, Element};
pub use format::{read_structure, StructureFormat};
pub use formula::Formula;
pub use input_set::{render_incar, Incar, VaspInputSet};
pub use kpoints::{KpointAccuracy, KpointStyle, Kpoints};
pub use lattice::{Lattice, Vec3};
pub use poscar::{read_poscar, write_poscar, Poscar, PoscarCoordinates};
pub use potcar::{potcar_for, PotcarLibrary};
pub use structure::{Site, Structure};
