use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use masgent_materials::{read_structure, StructureFormat};
use masgent_tools::{
    Constraint, FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec,
};
use std::sync::Arc;

/// Converts a structure file between POSCAR, CIF and XYZ.
pub struct ConvertStructureFormatTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl ConvertStructureFormatTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let schema = ParamSchema::new()
            .field(FieldSpec::required(
                "input_path",
                "Path to the input structure file",
                FieldKind::ExistingFile,
            ))
            .field(FieldSpec::required(
                "input_format",
                "Format of the input file: POSCAR, CIF or XYZ",
                FieldKind::choice(StructureFormat::NAMES),
            ))
            .field(FieldSpec::required(
                "output_format",
                "Format to convert to: POSCAR, CIF or XYZ",
                FieldKind::choice(StructureFormat::NAMES),
            ))
            .constraint(Constraint::Distinct {
                left: "input_format".to_string(),
                right: "output_format".to_string(),
                reason: "Input format and output format must be different".to_string(),
            });
        Self {
            spec: ToolSpec::new(
                "convert_structure_format",
                "Convert a structure file between POSCAR, CIF and XYZ formats.",
                schema,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for ConvertStructureFormatTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let input = params.path("input_path")?.to_path_buf();
        let from: StructureFormat = params.text("input_format")?.parse()?;
        let to: StructureFormat = params.text("output_format")?.parse()?;

        let structure = read_structure(&input, from)?;
        let name = to.output_file_name(&input);

        let run = self.ctx.new_run();
        let report =
            ArtifactWriter::write_all(&run, vec![Artifact::text(name.clone(), to.render(&structure))])
                .await;
        report.into_output(format!(
            "Converted {from} to {to}: updated {name} in {}.",
            run.output_dir.display()
        ))
    }
}
