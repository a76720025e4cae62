/// The `convert_poscar_coordinates` tool.
pub mod convert_coordinates;
/// The `convert_structure_format` tool.
pub mod convert_format;
/// The `customize_vasp_kpoints_with_accuracy` tool.
pub mod kpoints;
/// The `generate_vasp_poscar` tool.
pub mod poscar_from_formula;
/// The `generate_simple_poscar` tool.
pub mod simple_poscar;
/// The `generate_vasp_inputs_from_poscar` tool.
pub mod vasp_inputs;

pub use convert_coordinates::ConvertPoscarCoordinatesTool;
pub use convert_format::ConvertStructureFormatTool;
pub use kpoints::CustomizeKpointsTool;
pub use poscar_from_formula::GenerateVaspPoscarTool;
pub use simple_poscar::GenerateSimplePoscarTool;
pub use vasp_inputs::GenerateVaspInputsTool;
