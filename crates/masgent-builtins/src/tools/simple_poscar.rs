use crate::context::ToolContext;
use crate::writer::{Artifact, ArtifactWriter};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use masgent_materials::{bulk, write_poscar, CrystalStructure, PoscarCoordinates};
use masgent_tools::{
    Constraint, FieldKind, FieldSpec, ParamSchema, ParameterSet, Tool, ToolOutput, ToolSpec,
};
use std::sync::Arc;

/// Builds a primitive bulk cell for a single element.
pub struct GenerateSimplePoscarTool {
    spec: ToolSpec,
    ctx: Arc<ToolContext>,
}

impl GenerateSimplePoscarTool {
    /// Builds the tool over shared collaborators.
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let schema = ParamSchema::new()
            .field(FieldSpec::required(
                "symbol",
                "Element symbol, e.g. Cu",
                FieldKind::ElementSymbol,
            ))
            .field(FieldSpec::required(
                "crystal_structure",
                "Crystal structure: sc, fcc, bcc, hcp or diamond",
                FieldKind::choice(CrystalStructure::NAMES),
            ))
            .field(FieldSpec::required(
                "a",
                "Lattice constant a in Angstrom",
                FieldKind::positive_number(),
            ))
            .field(FieldSpec::optional(
                "c",
                "Lattice constant c in Angstrom (hcp only)",
                FieldKind::positive_number(),
            ))
            .constraint(Constraint::OnlyWith {
                field: "c".to_string(),
                other: "crystal_structure".to_string(),
                allowed: vec!["hcp".to_string()],
            });
        Self {
            spec: ToolSpec::new(
                "generate_simple_poscar",
                "Create a simple bulk POSCAR for one element and a standard crystal structure.",
                schema,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl Tool for GenerateSimplePoscarTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput> {
        let element = params.element("symbol")?;
        let structure_kind: CrystalStructure = params.text("crystal_structure")?.parse()?;
        let a = params.number("a")?;
        let c = params.opt_number("c")?;

        let run = self.ctx.new_run();
        let artifacts = vec![Artifact::new("POSCAR", move || {
            let structure = bulk(element, structure_kind, a, c)?;
            Ok(write_poscar(&structure, PoscarCoordinates::Direct))
        })];
        let report = ArtifactWriter::write_all(&run, artifacts).await;
        report.into_output(format!("Updated POSCAR in {}.", run.output_dir.display()))
    }
}
