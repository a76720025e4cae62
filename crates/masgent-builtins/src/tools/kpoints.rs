use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use masgent_materials::{read_structure, KpointAccuracy, Kpoints, StructureFormat};
use masgent_tools::{FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec};
use std::sync::Arc;

/// Writes a KPOINTS mesh for a POSCAR at a chosen accuracy tier.
pub struct CustomizeKpointsTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl CustomizeKpointsTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let schema = ParamSchema::new()
            .field(FieldSpec::required(
                "poscar_path",
                "Path to the POSCAR file",
                FieldKind::ExistingFile,
            ))
            .field(FieldSpec::required(
                "accuracy_level",
                "K-point accuracy: Low, Medium or High",
                FieldKind::choice(KpointAccuracy::NAMES),
            ));
        Self {
            spec: ToolSpec::new(
                "customize_vasp_kpoints_with_accuracy",
                "Generate a VASP KPOINTS file for a POSCAR with the requested accuracy level.",
                schema,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for CustomizeKpointsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let accuracy: KpointAccuracy = params.text("accuracy_level")?.parse()?;
        let structure = read_structure(params.path("poscar_path")?, StructureFormat::Poscar)?;
        let kpoints = Kpoints::for_accuracy(&structure, accuracy);

        let run = self.ctx.new_run();
        let report =
            ArtifactWriter::write_all(&run, vec![Artifact::text("KPOINTS", kpoints.render())]).await;
        report.into_output(format!(
            "Updated KPOINTS with {accuracy} accuracy in {}.",
            run.output_dir.display()
        ))
    }
}
