use crate::schema::{ParameterSet, ValidationFailure};
use crate::tool::{Tool, ToolSpec};
use futures_util::FutureExt;
use masgent_core::{MasgentError, MasgentResult, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Dispatch target that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {name}")]
pub struct UnknownTool {
    /// Name the caller asked for.
    pub name: String,
}

/// Why a call could not be accepted for execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// No tool is registered under the name.
    #[error(transparent)]
    UnknownTool(#[from] UnknownTool),
    /// The arguments failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

/// Name → tool mapping, built once at startup.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Adds a tool; names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> MasgentResult<()> {
        let name = tool.spec().name.clone();
        if self.tools.contains_key(&name) {
            return Err(MasgentError::Tool(format!("tool '{name}' is already registered")));
        }
        info!(tool = %name, "Registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Looks up a value by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Specs in registration order.
    pub fn specs(&self) -> Vec<&ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Looks up `name` and validates `raw` against its schema. No side effects.
    pub fn validate(&self, name: &str, raw: &Value) -> Result<ParameterSet, Rejection> {
        let tool = self.lookup(name)?;
        Ok(tool.spec().schema.validate(raw)?)
    }

    /// Validates then executes. Validation and handler failures come back as
    /// error results; only an unknown name is an `Err`.
    pub async fn dispatch(&self, name: &str, raw: &Value) -> Result<ToolResult, UnknownTool> {
        let tool = self.lookup(name)?;
        match tool.spec().schema.validate(raw) {
            Ok(params) => Ok(Self::run(tool, params).await),
            Err(failure) => {
                info!(tool = %name, field = %failure.field, "Parameter validation failed");
                Ok(ToolResult::error(failure.reason))
            }
        }
    }

    /// Executes a tool with parameters that already passed its schema.
    pub async fn execute(&self, name: &str, params: ParameterSet) -> Result<ToolResult, UnknownTool> {
        let tool = self.lookup(name)?;
        Ok(Self::run(tool, params).await)
    }

    fn lookup(&self, name: &str) -> Result<&Arc<dyn Tool>, UnknownTool> {
        self.tools.get(name).ok_or_else(|| {
            warn!(tool = %name, "Unknown tool requested");
            UnknownTool {
                name: name.to_string(),
            }
        })
    }

    async fn run(tool: &Arc<dyn Tool>, params: ParameterSet) -> ToolResult {
        let name = &tool.spec().name;
        info!(tool = %name, params = %params.summary(), "Executing tool");
        match AssertUnwindSafe(tool.run(params)).catch_unwind().await {
            Ok(Ok(output)) => ToolResult::success(output.message, output.artifacts),
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "Tool failed");
                ToolResult::error(format!("{name} failed: {e}"))
            }
            Err(_) => {
                error!(tool = %name, "Tool panicked");
                ToolResult::error(format!("{name} failed unexpectedly"))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec, ParamSchema};
    use crate::tool::ToolOutput;
    use async_trait::async_trait;
    use masgent_core::ToolStatus;
    use parking_lot::Mutex;

    struct CountingTool {
        spec: ToolSpec,
        calls: Mutex<usize>,
        outcome: fn() -> MasgentResult<ToolOutput>,
    }

    impl CountingTool {
        fn new(name: &str, outcome: fn() -> MasgentResult<ToolOutput>) -> Arc<Self> {
            Arc::new(Self {
                spec: ToolSpec::new(
                    name,
                    "test tool",
                    ParamSchema::new().field(FieldSpec::required("symbol", "element", FieldKind::ElementSymbol)),
                ),
                calls: Mutex::new(0),
                outcome,
            })
        }
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn run(&self, _params: ParameterSet) -> MasgentResult<ToolOutput> {
            *self.calls.lock() += 1;
            (self.outcome)()
        }
    }

    fn ok() -> MasgentResult<ToolOutput> {
        Ok(ToolOutput::new("done", vec![]))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.dispatch("nope", &serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool::new("t", ok)).unwrap();
        assert!(registry.register(CountingTool::new("t", ok)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let tool = CountingTool::new("t", ok);
        let mut registry = ToolRegistry::new();
        registry.register(tool.clone()).unwrap();

        let result = registry.dispatch("t", &serde_json::json!({"symbol": "Qq"})).await.unwrap();
        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.message, "Invalid element symbol: Qq");
        assert_eq!(*tool.calls.lock(), 0);

        let result = registry.dispatch("t", &serde_json::json!({"symbol": "Cu"})).await.unwrap();
        assert_eq!(result.status, ToolStatus::Ok);
        assert_eq!(*tool.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_result() {
        let mut registry = ToolRegistry::new();
        registry
            .register(CountingTool::new("t", || Err(MasgentError::Database("no match".into()))))
            .unwrap();
        let result = registry.dispatch("t", &serde_json::json!({"symbol": "Cu"})).await.unwrap();
        assert!(result.is_error());
        assert!(result.message.contains("no match"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let mut registry = ToolRegistry::new();
        registry
            .register(CountingTool::new("t", || panic!("collaborator blew up")))
            .unwrap();
        let result = registry.dispatch("t", &serde_json::json!({"symbol": "Cu"})).await.unwrap();
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_validate_reports_rejection_kind() {
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool::new("t", ok)).unwrap();
        assert!(matches!(
            registry.validate("x", &serde_json::json!({})),
            Err(Rejection::UnknownTool(_))
        ));
        assert!(matches!(
            registry.validate("t", &serde_json::json!({})),
            Err(Rejection::Invalid(f)) if f.is_missing()
        ));
        assert_eq!(registry.specs()[0].name, "t");
    }
}
