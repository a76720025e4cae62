//! Tool registry, parameter schemas and validation for Masgent.

/// Tool registration and dispatch.
pub mod registry;
/// Parameter schemas and validation.
pub mod schema;
/// The `Tool` trait.
pub mod tool;

pub use registry::{Rejection, ToolRegistry, UnknownTool};
pub use schema::{
    Constraint, FailureKind, FieldKind, FieldSpec, ParamSchema, ParamValue, ParameterSet,
    ValidationFailure,
};
pub use tool::{Tool, ToolOutput, ToolSpec};
