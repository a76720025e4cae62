//! `masgent.toml` loading.

use anyhow::Context;
use masgent_agent::ModelConfig;
use masgent_builtins::WorkspaceConfig;
use masgent_materials::DEFAULT_MP_BASE_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The whole configuration file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MasgentConfig {
    /// The `[model]` section.
    pub model: ModelConfig,
    /// The `[workspace]` section.
    pub workspace: WorkspaceConfig,
    /// The `[materials_project]` section.
    pub materials_project: MaterialsProjectConfig,
    /// The `[vasp]` section.
    pub vasp: VaspConfig,
}

/// The `[materials_project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaterialsProjectConfig {
    /// API root.
    pub base_url: String,
}

impl Default for MaterialsProjectConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MP_BASE_URL.to_string(),
        }
    }
}

/// The `[vasp]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VaspConfig {
    /// Root of a pseudopotential library laid out as `<symbol>/POTCAR`.
    pub potcar_dir: Option<PathBuf>,
}

impl MasgentConfig {
    /// Loads `path`. A missing file means all defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// Parses TOML text; missing sections take their defaults.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use masgent_agent::LlmProvider;

    #[test]
    fn test_empty_config_is_default() {
        let config = MasgentConfig::parse("").unwrap();
        assert_eq!(config.model.model_id, "gpt-5-nano");
        assert_eq!(config.workspace.runs_subdir, "masgent_runs");
        assert_eq!(config.materials_project.base_url, DEFAULT_MP_BASE_URL);
        assert!(config.vasp.potcar_dir.is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = MasgentConfig::parse(
            r#"
[model]
provider = "openrouter"
model_id = "openai/gpt-4o-mini"
max_history = 50

[workspace]
outputs_subdir = "out"

[vasp]
potcar_dir = "/opt/potcars"
"#,
        )
        .unwrap();
        assert_eq!(config.model.provider, LlmProvider::OpenRouter);
        assert_eq!(config.model.max_history, 50);
        assert_eq!(config.model.max_tokens, 4096);
        assert_eq!(config.workspace.outputs_subdir, "out");
        assert_eq!(config.workspace.runs_subdir, "masgent_runs");
        assert_eq!(config.vasp.potcar_dir, Some(PathBuf::from("/opt/potcars")));
    }

    #[test]
    fn test_missing_file_is_default_and_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = MasgentConfig::load(&dir.path().join("masgent.toml")).unwrap();
        assert_eq!(missing.model.max_history, 200);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[model\nprovider = ").unwrap();
        let err = MasgentConfig::load(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}
