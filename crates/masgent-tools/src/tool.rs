use crate::schema::{ParamSchema, ParameterSet};
use async_trait::async_trait;
use masgent_core::MasgentResult;
use serde_json::Value;
use std::path::PathBuf;

/// Name, description and parameter schema of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Registered name, unique within a registry.
    pub name: String,
    /// What the tool does, shown to the model.
    pub description: String,
    /// Accepted parameters.
    pub schema: ParamSchema,
}

impl ToolSpec {
    /// Describes a tool.
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: ParamSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// JSON schema of the parameters, as sent to the model.
    pub fn parameters_schema(&self) -> Value {
        self.schema.to_json_schema()
    }
}

/// What a handler produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// User-facing result text.
    pub message: String,
    /// Files written, run directory copies first.
    pub artifacts: Vec<PathBuf>,
}

impl ToolOutput {
    /// A successful outcome listing the files written.
    pub fn new(message: impl Into<String>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            message: message.into(),
            artifacts,
        }
    }
}

/// A named operation bound to a schema.
///
/// Handlers receive parameters that already passed the schema and must not
/// re-validate them.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameters.
    fn spec(&self) -> &ToolSpec;

    /// Runs with already validated parameters.
    async fn run(&self, params: ParameterSet) -> MasgentResult<ToolOutput>;
}
