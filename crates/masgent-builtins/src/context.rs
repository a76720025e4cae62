use crate::workspace::{RunContext, WorkspaceLayout};
use masgent_materials::{MaterialsDatabase, PotcarLibrary};
use std::sync::Arc;

/// Collaborators shared by every generation tool.
#[derive(Clone)]
pub struct ToolContext {
    /// Where run and output directories live.
    pub layout: WorkspaceLayout,
    /// Structure lookups by formula.
    pub database: Arc<dyn MaterialsDatabase>,
    /// Pseudopotentials; POTCAR generation fails without them.
    pub potcar: Option<PotcarLibrary>,
}

impl ToolContext {
    /// A context with no POTCAR library.
    pub fn new(layout: WorkspaceLayout, database: Arc<dyn MaterialsDatabase>) -> Self {
        Self {
            layout,
            database,
            potcar: None,
        }
    }

    /// Enables POTCAR generation from `library`.
    pub fn with_potcar_library(mut self, library: PotcarLibrary) -> Self {
        self.potcar = Some(library);
        self
    }

    /// A fresh run context for one invocation.
    pub fn new_run(&self) -> RunContext {
        self.layout.new_run()
    }
}
