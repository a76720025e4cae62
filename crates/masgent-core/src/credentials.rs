//! Credential types shared by the agent, the materials client and the CLI.
//!
//! Credentials are resolved exactly once, before any session starts, by walking an
//! ordered list of [`CredentialSource`]s. Nothing downstream reads the process
//! environment directly; it receives a [`Credentials`] value instead.

use crate::{MasgentError, MasgentResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The two secrets Masgent needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// API key for the language-model provider.
    ModelProvider,
    /// API key for the Materials Project database.
    MaterialsDatabase,
}

impl CredentialKind {
    /// All kinds, in resolution order.
    pub const ALL: [CredentialKind; 2] =
        [CredentialKind::ModelProvider, CredentialKind::MaterialsDatabase];

    /// Environment variable (and `.env` key) holding this credential.
    pub fn env_var(self) -> &'static str {
        match self {
            CredentialKind::ModelProvider => "OPENAI_API_KEY",
            CredentialKind::MaterialsDatabase => "MP_API_KEY",
        }
    }

    /// Human-readable label used in prompts and errors.
    pub fn label(self) -> &'static str {
        match self {
            CredentialKind::ModelProvider => "OpenAI API key",
            CredentialKind::MaterialsDatabase => "Materials Project API key",
        }
    }
}

/// Resolved API keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    model_api_key: String,
    materials_api_key: String,
}

impl Credentials {
    /// Builds credentials from already-known keys.
    pub fn new(model_api_key: impl Into<String>, materials_api_key: impl Into<String>) -> Self {
        Self {
            model_api_key: model_api_key.into(),
            materials_api_key: materials_api_key.into(),
        }
    }

    /// Key for the language-model provider.
    pub fn model_api_key(&self) -> &str {
        &self.model_api_key
    }

    /// Key for the Materials Project API.
    pub fn materials_api_key(&self) -> &str {
        &self.materials_api_key
    }

    /// Returns the key for `kind`.
    pub fn get(&self, kind: CredentialKind) -> &str {
        match kind {
            CredentialKind::ModelProvider => &self.model_api_key,
            CredentialKind::MaterialsDatabase => &self.materials_api_key,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &"<redacted>")
            .field("materials_api_key", &"<redacted>")
            .finish()
    }
}

/// Somewhere a credential may be found: the environment, a file, an interactive prompt.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Looks up `kind`. `Ok(None)` means "not here, try the next source".
    async fn lookup(&self, kind: CredentialKind) -> MasgentResult<Option<String>>;
}

/// Somewhere a freshly entered credential may be saved for next time.
pub trait CredentialStore: Send + Sync {
    /// Persists `value` for `kind`.
    fn persist(&self, kind: CredentialKind, value: &str) -> MasgentResult<()>;
}

/// Reads credentials from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialSource;

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    fn name(&self) -> &str {
        "environment"
    }

    async fn lookup(&self, kind: CredentialKind) -> MasgentResult<Option<String>> {
        Ok(std::env::var(kind.env_var()).ok())
    }
}

/// Fixed in-memory credentials, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentialSource {
    values: HashMap<CredentialKind, String>,
}

impl StaticCredentialSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the source.
    pub fn with(mut self, kind: CredentialKind, value: impl Into<String>) -> Self {
        self.values.insert(kind, value.into());
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(&self, kind: CredentialKind) -> MasgentResult<Option<String>> {
        Ok(self.values.get(&kind).cloned())
    }
}

/// Walks sources in order until every credential kind is found.
#[derive(Default)]
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    /// Creates a resolver with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source; earlier sources win.
    pub fn with_source(mut self, source: Box<dyn CredentialSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Resolves a single credential kind. Blank values count as absent.
    pub async fn resolve_one(&self, kind: CredentialKind) -> MasgentResult<String> {
        for source in &self.sources {
            if let Some(value) = source.lookup(kind).await? {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(value.to_string());
                }
            }
        }
        Err(MasgentError::Credential(format!(
            "{} not provided (set {})",
            kind.label(),
            kind.env_var()
        )))
    }

    /// Resolves every credential kind.
    pub async fn resolve(&self) -> MasgentResult<Credentials> {
        let model = self.resolve_one(CredentialKind::ModelProvider).await?;
        let materials = self.resolve_one(CredentialKind::MaterialsDatabase).await?;
        Ok(Credentials::new(model, materials))
    }
}
