//! Dual-write of generated files into the run directory and the output directory.

use crate::workspace::RunContext;
use masgent_core::{MasgentError, MasgentResult};
use masgent_tools::ToolOutput;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type Producer = Box<dyn FnOnce() -> MasgentResult<String> + Send>;

/// One file to write, with content computed lazily.
pub struct Artifact {
    name: String,
    producer: Producer,
}

impl Artifact {
    /// An artifact whose content is produced right before it is written.
    pub fn new(
        name: impl Into<String>,
        producer: impl FnOnce() -> MasgentResult<String> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            producer: Box::new(producer),
        }
    }

    /// An artifact whose content is already known.
    pub fn text(name: impl Into<String>, content: String) -> Self {
        Self::new(name, move || Ok(content))
    }

    /// File name inside the run and output directories.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact").field("name", &self.name).finish()
    }
}

/// A file that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Artifact file name.
    pub name: String,
    /// Error text shown to the user.
    pub reason: String,
}

/// Outcome of [`ArtifactWriter::write_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Every path written, in write order.
    pub written: Vec<PathBuf>,
    /// Names that reached both directories.
    pub completed: Vec<String>,
    /// Artifacts that did not reach both directories.
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    /// True when every artifact reached both directories.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn failure_lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("Failed to write {}: {}", f.name, f.reason))
            .collect()
    }

    /// Turns the report into a tool outcome.
    ///
    /// `message` is used as-is when everything was written; failures are appended one
    /// per line. If nothing at all was written, the failures become the error.
    pub fn into_output(self, message: impl Into<String>) -> MasgentResult<ToolOutput> {
        let lines = self.failure_lines();
        if self.written.is_empty() {
            return Err(MasgentError::Tool(lines.join("\n")));
        }
        let mut message = message.into();
        for line in lines {
            message.push('\n');
            message.push_str(&line);
        }
        Ok(ToolOutput::new(message, self.written))
    }
}

/// Writes artifacts into a [`RunContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactWriter;

impl ArtifactWriter {
    /// For each artifact: produce its content, write it into the run directory, then
    /// into the output directory. A failure is recorded and the remaining artifacts
    /// are still attempted; nothing is rolled back. When the run-directory write
    /// fails the output copy is skipped so the mirror never holds content the audit
    /// trail lacks. A failed artifact's copy from an earlier generation is removed
    /// from the output directory, since it would not match the files written now.
    pub async fn write_all(ctx: &RunContext, artifacts: Vec<Artifact>) -> WriteReport {
        let mut report = WriteReport::default();
        for artifact in artifacts {
            let Artifact { name, producer } = artifact;
            let content = match producer() {
                Ok(content) => content,
                Err(e) => {
                    warn!(artifact = %name, error = %e, "Artifact content could not be produced");
                    remove_stale(&ctx.output_dir, &name).await;
                    report.failures.push(WriteFailure {
                        name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let mut both = true;
            for dir in [&ctx.run_dir, &ctx.output_dir] {
                match write_one(dir, &name, &content).await {
                    Ok(path) => {
                        info!(path = %path.display(), "Wrote artifact");
                        report.written.push(path);
                    }
                    Err(e) => {
                        warn!(artifact = %name, dir = %dir.display(), error = %e, "Artifact write failed");
                        report.failures.push(WriteFailure {
                            name: name.clone(),
                            reason: format!("{} ({})", e, dir.display()),
                        });
                        both = false;
                        break;
                    }
                }
            }
            if both {
                report.completed.push(name);
            } else {
                remove_stale(&ctx.output_dir, &name).await;
            }
        }
        report
    }
}

async fn remove_stale(dir: &Path, name: &str) {
    let path = dir.join(name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!(path = %path.display(), "Removed stale artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Stale artifact could not be removed"),
    }
}

async fn write_one(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}
