use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sub-directory names under the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under the base that holds timestamped runs.
    pub runs_subdir: String,
    /// Directory under the base that mirrors the latest files.
    pub outputs_subdir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            runs_subdir: "masgent_runs".to_string(),
            outputs_subdir: "masgent_outputs".to_string(),
        }
    }
}

/// `(base, runs_root, output_root)` for one working directory.
///
/// Deriving a layout never touches the filesystem; the artifact writer creates
/// directories when it first writes into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    base: PathBuf,
    runs_root: PathBuf,
    output_root: PathBuf,
}

impl WorkspaceLayout {
    /// Derives the layout for `base`. Nothing is created on disk.
    pub fn for_dir(base: impl Into<PathBuf>, config: &WorkspaceConfig) -> Self {
        let base = base.into();
        Self {
            runs_root: base.join(&config.runs_subdir),
            output_root: base.join(&config.outputs_subdir),
            base,
        }
    }

    /// The working directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Parent of every run directory.
    pub fn runs_root(&self) -> &Path {
        &self.runs_root
    }

    /// Directory mirroring the latest generated files.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// A fresh run context stamped with the current local time.
    pub fn new_run(&self) -> RunContext {
        self.new_run_at(Local::now())
    }

    /// A run context named `runs_<YYYYMMDD_HHMMSS>`; a `_N` suffix is added when that
    /// directory already exists so a run directory is never reused.
    pub fn new_run_at(&self, at: DateTime<Local>) -> RunContext {
        let stem = format!("runs_{}", at.format("%Y%m%d_%H%M%S"));
        let mut run_dir = self.runs_root.join(&stem);
        let mut n = 1;
        while run_dir.exists() {
            run_dir = self.runs_root.join(format!("{stem}_{n}"));
            n += 1;
        }
        RunContext {
            base: self.base.clone(),
            run_dir,
            output_dir: self.output_root.clone(),
        }
    }
}

/// Directories for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// The working directory.
    pub base: PathBuf,
    /// Timestamped audit directory, unique to this invocation.
    pub run_dir: PathBuf,
    /// Stable mirror, overwritten in place.
    pub output_dir: PathBuf,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_layout_is_pure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::for_dir(dir.path(), &WorkspaceConfig::default());
        assert_eq!(layout.runs_root(), dir.path().join("masgent_runs"));
        assert_eq!(layout.output_root(), dir.path().join("masgent_outputs"));
        assert!(!layout.runs_root().exists());
        assert!(!layout.output_root().exists());
    }

    #[test]
    fn test_run_dir_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::for_dir(dir.path(), &WorkspaceConfig::default());
        let at = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();

        let first = layout.new_run_at(at);
        assert!(first.run_dir.ends_with("runs_20250314_092653"));
        std::fs::create_dir_all(&first.run_dir).unwrap();

        let second = layout.new_run_at(at);
        assert!(second.run_dir.ends_with("runs_20250314_092653_1"));
        assert_eq!(first.output_dir, second.output_dir);
    }

    #[test]
    fn test_custom_subdirs() {
        let config = WorkspaceConfig {
            runs_subdir: "history".into(),
            outputs_subdir: "latest".into(),
        };
        let layout = WorkspaceLayout::for_dir("/work", &config);
        assert_eq!(layout.output_root(), Path::new("/work/latest"));
        assert_eq!(layout.base(), Path::new("/work"));
    }
}
