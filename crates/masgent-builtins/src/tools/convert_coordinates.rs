use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::{MasgentError, MasgentResult};
use masgent_materials::{read_poscar, PoscarCoordinates};
use masgent_tools::{FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec};
use std::sync::Arc;

/// Rewrites a POSCAR in direct or Cartesian coordinates.
pub struct ConvertPoscarCoordinatesTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl ConvertPoscarCoordinatesTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let schema = ParamSchema::new()
            .field(FieldSpec::required(
                "poscar_path",
                "Path to the POSCAR file",
                FieldKind::ExistingFile,
            ))
            .field(FieldSpec::required(
                "to_cartesian",
                "true to convert to Cartesian coordinates, false for direct",
                FieldKind::Boolean,
            ));
        Self {
            spec: ToolSpec::new(
                "convert_poscar_coordinates",
                "Convert a POSCAR between direct and Cartesian coordinates.",
                schema,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for ConvertPoscarCoordinatesTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let path = params.path("poscar_path")?;
        let target = if params.boolean("to_cartesian")? {
            PoscarCoordinates::Cartesian
        } else {
            PoscarCoordinates::Direct
        };

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            MasgentError::Structure(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut poscar = read_poscar(&text)?;
        poscar.coordinates = target;

        let label = match target {
            PoscarCoordinates::Cartesian => "Cartesian",
            PoscarCoordinates::Direct => "direct",
        };
        let run = self.ctx.new_run();
        let report =
            ArtifactWriter::write_all(&run, vec![Artifact::text("POSCAR", poscar.render())]).await;
        report.into_output(format!(
            "Updated POSCAR with {label} coordinates in {}.",
            run.output_dir.display()
        ))
    }
}
