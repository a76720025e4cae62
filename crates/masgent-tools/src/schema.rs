//! Parameter schemas and validation.
//!
//! A [`ParamSchema`] is checked field by field in declaration order, then constraint
//! by constraint; the first violation is returned (fail-fast). Nothing here touches the
//! network, and the only filesystem access is the existence check of
//! [`FieldKind::ExistingFile`] fields.

use masgent_core::{MasgentError, MasgentResult};
use masgent_materials::{Element, Formula};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The primitive type of a field and its built-in constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Non-empty text.
    Text,
    /// A finite number, optionally strictly greater than a bound.
    Number { min_exclusive: Option<f64> },
    /// true/false, also accepted as text.
    Boolean,
    /// One of a fixed set of options, matched case-insensitively.
    Choice(Vec<String>),
    /// A path to a regular file that exists.
    ExistingFile,
    /// A formula such as `Fe2O3`.
    ChemicalFormula,
    /// A single case-sensitive element symbol.
    ElementSymbol,
}

impl FieldKind {
    /// Builds a [`FieldKind::Choice`] from string slices.
    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Choice(options.into_iter().map(Into::into).collect())
    }

    /// `Number` strictly greater than zero.
    pub fn positive_number() -> Self {
        FieldKind::Number {
            min_exclusive: Some(0.0),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Argument name.
    pub name: String,
    /// Shown to the model and used in clarification questions.
    pub description: String,
    /// Type and built-in constraint.
    pub kind: FieldKind,
    /// Whether the field must be present.
    pub required: bool,
}

impl FieldSpec {
    /// A field that must be present.
    pub fn required(name: impl Into<String>, description: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
        }
    }

    /// A field that may be omitted.
    pub fn optional(name: impl Into<String>, description: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, description, kind)
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ValidationFailure {
        ValidationFailure::invalid(&self.name, reason)
    }

    /// Checks one present, non-null value and normalises it.
    fn check(&self, value: &Value) -> Result<ParamValue, ValidationFailure> {
        let name = &self.name;
        match &self.kind {
            FieldKind::Text => match value.as_str().map(str::trim) {
                Some(s) if !s.is_empty() => Ok(ParamValue::Text(s.to_string())),
                Some(_) => Err(self.invalid(format!("{name} must not be empty"))),
                None => Err(self.invalid(format!("{name} must be text"))),
            },
            FieldKind::Number { min_exclusive } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| self.invalid(format!("{name} must be a number")))?;
                match min_exclusive {
                    Some(min) if number <= *min => {
                        Err(self.invalid(format!("{name} must be greater than {min}")))
                    }
                    _ => Ok(ParamValue::Number(number)),
                }
            }
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(ParamValue::Boolean(*b)),
                Value::String(s) => parse_bool(s)
                    .map(ParamValue::Boolean)
                    .ok_or_else(|| self.invalid(format!("{name} must be true or false"))),
                _ => Err(self.invalid(format!("{name} must be true or false"))),
            },
            FieldKind::Choice(options) => {
                let given = value.as_str().map(str::trim).unwrap_or_default();
                options
                    .iter()
                    .find(|opt| opt.eq_ignore_ascii_case(given))
                    .map(|opt| ParamValue::Text(opt.clone()))
                    .ok_or_else(|| {
                        self.invalid(format!("{name} must be one of: {}", options.join(", ")))
                    })
            }
            FieldKind::ExistingFile => {
                let raw = value
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| self.invalid(format!("{name} must be a file path")))?;
                let path = PathBuf::from(raw);
                if path.is_file() {
                    Ok(ParamValue::Path(path))
                } else {
                    Err(self.invalid(format!("File not found: {raw}")))
                }
            }
            FieldKind::ChemicalFormula => {
                let raw = value.as_str().unwrap_or_default();
                Formula::parse(raw)
                    .map(ParamValue::Formula)
                    .map_err(|_| self.invalid(format!("Invalid chemical formula: {raw}")))
            }
            FieldKind::ElementSymbol => {
                let raw = value.as_str().map(str::trim).unwrap_or_default();
                Element::from_symbol(raw)
                    .map(ParamValue::Element)
                    .ok_or_else(|| self.invalid(format!("Invalid element symbol: {raw}")))
            }
        }
    }

    /// Coerces a line typed at the REPL into a JSON candidate value.
    ///
    /// Blank input becomes `null`; text that does not look like the declared type is
    /// passed through as a string so validation reports it.
    pub fn value_from_text(&self, text: &str) -> Value {
        let text = text.trim();
        if text.is_empty() {
            return Value::Null;
        }
        match &self.kind {
            FieldKind::Number { .. } => text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(text.to_string())),
            FieldKind::Boolean => parse_bool(text)
                .map(Value::Bool)
                .unwrap_or_else(|| Value::String(text.to_string())),
            _ => Value::String(text.to_string()),
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::Number { min_exclusive } => {
                let mut s = json!({"type": "number"});
                if let Some(min) = min_exclusive {
                    s["exclusiveMinimum"] = json!(min);
                }
                s
            }
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::Choice(options) => json!({"type": "string", "enum": options}),
            _ => json!({"type": "string"}),
        };
        schema["description"] = json!(self.description);
        schema
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// A cross-field rule, checked after every field has passed.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `left` and `right` must differ (case-insensitive for text); reported against `right`.
    Distinct {
        left: String,
        right: String,
        reason: String,
    },
    /// `field` may only be given when `other` is one of `allowed`.
    OnlyWith {
        field: String,
        other: String,
        allowed: Vec<String>,
    },
}

impl Constraint {
    fn check(&self, values: &ParameterSet) -> Result<(), ValidationFailure> {
        match self {
            Constraint::Distinct { left, right, reason } => {
                match (values.get(left), values.get(right)) {
                    (Some(l), Some(r)) if l.same_as(r) => {
                        Err(ValidationFailure::invalid(right, reason.clone()))
                    }
                    _ => Ok(()),
                }
            }
            Constraint::OnlyWith {
                field,
                other,
                allowed,
            } => {
                if values.get(field).is_none() {
                    return Ok(());
                }
                let ok = values
                    .get(other)
                    .map(ParamValue::to_string)
                    .is_some_and(|v| allowed.iter().any(|a| a.eq_ignore_ascii_case(&v)));
                if ok {
                    Ok(())
                } else {
                    Err(ValidationFailure::invalid(
                        field,
                        format!("{field} is only allowed when {other} is {}", allowed.join(" or ")),
                    ))
                }
            }
        }
    }
}

/// Why a field failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// A required field was absent or `null`.
    Missing { description: String },
    /// Present but unacceptable.
    Invalid,
}

/// The first violation found by [`ParamSchema::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct ValidationFailure {
    /// Offending field.
    pub field: String,
    /// One-sentence explanation, usable as a clarification.
    pub reason: String,
    /// Missing or invalid.
    pub kind: FailureKind,
}

impl ValidationFailure {
    /// A failure for a present but unacceptable value.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            kind: FailureKind::Invalid,
        }
    }

    fn missing(spec: &FieldSpec) -> Self {
        Self {
            field: spec.name.clone(),
            reason: format!("Missing required parameter: {}", spec.name),
            kind: FailureKind::Missing {
                description: spec.description.clone(),
            },
        }
    }

    /// True when a required field was absent.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, FailureKind::Missing { .. })
    }

    /// A single question asking the user for this field.
    pub fn clarification(&self) -> String {
        match &self.kind {
            FailureKind::Missing { description } => format!(
                "Do you want to provide {} ({description}), or should I decide for you?",
                self.field
            ),
            FailureKind::Invalid => format!(
                "{}. Could you provide a valid {}?",
                self.reason.trim_end_matches('.'),
                self.field
            ),
        }
    }
}

/// The declared inputs of one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
    constraints: Vec<Constraint>,
}

impl ParamSchema {
    /// A schema with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field; validation follows declaration order.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Adds a cross-field rule checked after every field passes.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Cross-field rules.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Validates raw candidate values. Undeclared keys are ignored.
    pub fn validate(&self, raw: &Value) -> Result<ParameterSet, ValidationFailure> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ValidationFailure::invalid(
                    "arguments",
                    "parameters must be a JSON object",
                ))
            }
        };

        let mut values = Vec::with_capacity(self.fields.len());
        for spec in &self.fields {
            match object.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ValidationFailure::missing(spec))
                }
                None | Some(Value::Null) => {}
                Some(value) => values.push((spec.name.clone(), spec.check(value)?)),
            }
        }

        let set = ParameterSet { values };
        for constraint in &self.constraints {
            constraint.check(&set)?;
        }
        Ok(set)
    }

    /// OpenAI function-calling `parameters` object.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A validated, normalised parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text or a chosen option.
    Text(String),
    /// A validated number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
    /// An existing file.
    Path(PathBuf),
    /// A parsed chemical formula.
    Formula(Formula),
    /// An element symbol.
    Element(Element),
}

impl ParamValue {
    fn same_as(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (ParamValue::Text(a), ParamValue::Text(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::Number(n) => json!(n),
            ParamValue::Boolean(b) => json!(b),
            other => json!(other.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Boolean(b) => write!(f, "{b}"),
            ParamValue::Path(p) => write!(f, "{}", p.display()),
            ParamValue::Formula(formula) => write!(f, "{formula}"),
            ParamValue::Element(e) => write!(f, "{e}"),
        }
    }
}

/// Parameters accepted by a [`ParamSchema`], in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    values: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    /// Looks up a value by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// True when `name` was supplied.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn wrong_type(name: &str, expected: &str) -> MasgentError {
        MasgentError::Tool(format!("parameter '{name}' is missing or not {expected}"))
    }

    /// Text or choice value of `name`.
    pub fn text(&self, name: &str) -> MasgentResult<&str> {
        match self.get(name) {
            Some(ParamValue::Text(s)) => Ok(s),
            _ => Err(Self::wrong_type(name, "text")),
        }
    }

    /// Numeric value of `name`.
    pub fn number(&self, name: &str) -> MasgentResult<f64> {
        match self.get(name) {
            Some(ParamValue::Number(n)) => Ok(*n),
            _ => Err(Self::wrong_type(name, "a number")),
        }
    }

    /// Optional number: `Ok(None)` when absent.
    pub fn opt_number(&self, name: &str) -> MasgentResult<Option<f64>> {
        if self.contains(name) {
            self.number(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Boolean value of `name`.
    pub fn boolean(&self, name: &str) -> MasgentResult<bool> {
        match self.get(name) {
            Some(ParamValue::Boolean(b)) => Ok(*b),
            _ => Err(Self::wrong_type(name, "a boolean")),
        }
    }

    /// File path value of `name`.
    pub fn path(&self, name: &str) -> MasgentResult<&Path> {
        match self.get(name) {
            Some(ParamValue::Path(p)) => Ok(p),
            _ => Err(Self::wrong_type(name, "a path")),
        }
    }

    /// Formula value of `name`.
    pub fn formula(&self, name: &str) -> MasgentResult<&Formula> {
        match self.get(name) {
            Some(ParamValue::Formula(f)) => Ok(f),
            _ => Err(Self::wrong_type(name, "a chemical formula")),
        }
    }

    /// Element value of `name`.
    pub fn element(&self, name: &str) -> MasgentResult<Element> {
        match self.get(name) {
            Some(ParamValue::Element(e)) => Ok(*e),
            _ => Err(Self::wrong_type(name, "an element symbol")),
        }
    }

    /// Re-serialises the set as a JSON object of raw values.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// `key=value, ...` in declaration order.
    pub fn summary(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
