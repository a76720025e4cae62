use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use masgent_materials::{write_poscar, PoscarCoordinates};
use masgent_tools::{FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec};
use std::sync::Arc;

/// Looks a formula up in the materials database and writes the most stable
/// structure as a POSCAR.
pub struct GenerateVaspPoscarTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl GenerateVaspPoscarTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self {
            spec: ToolSpec::new(
                "generate_vasp_poscar",
                "Generate a VASP POSCAR for a chemical formula from the most stable Materials Project entry.",
                ParamSchema::new().field(FieldSpec::required(
                    "formula",
                    "Chemical formula, e.g. Cu, NaCl, MgO",
                    FieldKind::ChemicalFormula,
                )),
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for GenerateVaspPoscarTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let formula = params.formula("formula")?;
        let found = self.ctx.database.best_match(formula).await?;

        let run = self.ctx.new_run();
        let poscar = write_poscar(&found.structure, PoscarCoordinates::Direct);
        let report = ArtifactWriter::write_all(&run, vec![Artifact::text("POSCAR", poscar)]).await;
        report.into_output(format!("Updated POSCAR in {}.", run.output_dir.display()))
    }
}
