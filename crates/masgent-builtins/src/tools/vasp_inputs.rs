use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use masgent_materials::{
    potcar_for, read_structure, render_incar, write_poscar, PoscarCoordinates, StructureFormat,
    VaspInputSet,
};
use masgent_tools::{FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec};
use std::sync::Arc;

/// Writes INCAR, KPOINTS, POTCAR and POSCAR for a POSCAR and a named preset.
pub struct GenerateVaspInputsTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl GenerateVaspInputsTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let schema = ParamSchema::new()
            .field(FieldSpec::required(
                "poscar_path",
                "Path to the POSCAR file",
                FieldKind::ExistingFile,
            ))
            .field(FieldSpec::required(
                "vasp_input_set",
                "VASP input set: MPRelaxSet, MPStaticSet, MPNonSCFSet, MPScanRelaxSet, MPScanStaticSet or MPMDSet",
                FieldKind::choice(VaspInputSet::NAMES),
            ));
        Self {
            spec: ToolSpec::new(
                "generate_vasp_inputs_from_poscar",
                "Generate VASP input files (INCAR, KPOINTS, POTCAR, POSCAR) from a POSCAR using a Materials Project input set.",
                schema,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for GenerateVaspInputsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let set: VaspInputSet = params.text("vasp_input_set")?.parse()?;
        let structure = read_structure(params.path("poscar_path")?, StructureFormat::Poscar)?
            .grouped_by_species();

        let incar = render_incar(&set.incar(&structure));
        let kpoints = set.kpoints(&structure).render();
        let symbols = set.potcar_symbols(&structure);
        let library = self.ctx.potcar.clone();
        let poscar = write_poscar(&structure, PoscarCoordinates::Direct);

        let run = self.ctx.new_run();
        let report = ArtifactWriter::write_all(
            &run,
            vec![
                Artifact::text("INCAR", incar),
                Artifact::text("KPOINTS", kpoints),
                Artifact::new("POTCAR", move || potcar_for(library.as_ref(), &symbols)),
                Artifact::text("POSCAR", poscar),
            ],
        )
        .await;

        let names = report.completed.join(", ");
        report.into_output(format!(
            "Updated {names} based on {set} in {}.",
            run.output_dir.display()
        ))
    }
}
