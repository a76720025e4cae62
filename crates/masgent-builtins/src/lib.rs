//! Built-in generation tools for Masgent.
//!
//! Every tool validates through its schema, asks a materials collaborator for file
//! contents, and writes through the [`ArtifactWriter`] into a fresh [`RunContext`]:
//! once into the timestamped run directory and once into the stable output directory.
//!
//! # Main entry points
//!
//! - [`register_builtins()`]: Register the six generation tools.
//! - [`WorkspaceLayout`]: Derive run/output directories for a working directory.
//! - [`ArtifactWriter`]: Dual-write generated files.

/// Shared tool collaborators.
pub mod context;
/// The generation tools.
pub mod tools;
/// Directory provisioning.
pub mod workspace;
/// Artifact dual-writer.
pub mod writer;

pub use context::ToolContext;
pub use tools::{
    ConvertPoscarCoordinatesTool, ConvertStructureFormatTool, CustomizeKpointsTool,
    GenerateSimplePoscarTool, GenerateVaspInputsTool, GenerateVaspPoscarTool,
};
pub use workspace::{RunContext, WorkspaceConfig, WorkspaceLayout};
pub use writer::{Artifact, ArtifactWriter, WriteFailure, WriteReport};

use masgent_core::MasgentResult;
use masgent_tools::ToolRegistry;
use std::sync::Arc;

/// Registers the six generation tools.
pub fn register_builtins(registry: &mut ToolRegistry, ctx: Arc<ToolContext>) -> MasgentResult<()> {
    registry.register(Arc::new(GenerateVaspPoscarTool::new(ctx.clone())))?;
    registry.register(Arc::new(GenerateSimplePoscarTool::new(ctx.clone())))?;
    registry.register(Arc::new(GenerateVaspInputsTool::new(ctx.clone())))?;
    registry.register(Arc::new(CustomizeKpointsTool::new(ctx.clone())))?;
    registry.register(Arc::new(ConvertStructureFormatTool::new(ctx.clone())))?;
    registry.register(Arc::new(ConvertPoscarCoordinatesTool::new(ctx)))?;
    Ok(())
}
