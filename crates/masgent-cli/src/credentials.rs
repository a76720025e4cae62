//! Interactive credential entry and `.env` persistence.

use crate::console::Console;
use async_trait::async_trait;
use masgent_core::{CredentialKind, CredentialSource, CredentialStore, MasgentError, MasgentResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;

/// Asks the user for a missing key. An empty answer is a refusal and fails
/// resolution.
pub struct PromptCredentialSource {
    console: Mutex<Box<dyn Console>>,
    store: Option<Box<dyn CredentialStore>>,
}

impl PromptCredentialSource {
    /// Prompts on `console`; nothing is saved unless a store is attached.
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            console: Mutex::new(console),
            store: None,
        }
    }

    /// Offers to save entered keys into `store`.
    pub fn with_store(mut self, store: Box<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }
}

#[async_trait]
impl CredentialSource for PromptCredentialSource {
    fn name(&self) -> &str {
        "prompt"
    }

    async fn lookup(&self, kind: CredentialKind) -> MasgentResult<Option<String>> {
        let mut console = self.console.lock().await;
        let label = kind.label();
        let key = console
            .read_line(&format!("Enter your {label}: "))
            .await?
            .unwrap_or_default()
            .trim()
            .to_string();
        if key.is_empty() {
            return Err(MasgentError::Credential(format!("{label} cannot be empty")));
        }

        if let Some(store) = &self.store {
            let answer = console
                .read_line("\nSave this key to .env file for future? (y/n): ")
                .await?
                .unwrap_or_default();
            if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                store.persist(kind, &key)?;
                console.println(&format!("\n{label} saved to .env file."));
            }
        }
        console.println(&format!("\n{label} loaded.\n"));
        Ok(Some(key))
    }
}

/// Appends `KEY=value` lines to a dotenv file.
#[derive(Debug, Clone)]
pub struct DotenvCredentialStore {
    path: PathBuf,
}

impl DotenvCredentialStore {
    /// Appends to the file at `path`, creating it on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for DotenvCredentialStore {
    fn persist(&self, kind: CredentialKind, value: &str) -> MasgentResult<()> {
        let needs_newline = std::fs::read(&self.path)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}={value}", kind.env_var())?;
        info!(path = %self.path.display(), key = kind.env_var(), "Credential saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use masgent_core::{CredentialResolver, StaticCredentialSource};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Arc;

    struct Answers {
        lines: VecDeque<String>,
        shown: Arc<Mutex<String>>,
    }

    impl Answers {
        fn new(lines: &[&str]) -> (Self, Arc<Mutex<String>>) {
            let shown = Arc::new(Mutex::new(String::new()));
            let answers = Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                shown: shown.clone(),
            };
            (answers, shown)
        }
    }

    #[async_trait]
    impl Console for Answers {
        async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.shown.lock().push_str(prompt);
            Ok(self.lines.pop_front())
        }

        fn print(&mut self, text: &str) {
            self.shown.lock().push_str(text);
        }
    }

    #[tokio::test]
    async fn test_prompt_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(&env_path, "OTHER=1").unwrap();

        let (answers, shown) = Answers::new(&["sk-new", "y"]);
        let source = PromptCredentialSource::new(Box::new(answers))
            .with_store(Box::new(DotenvCredentialStore::new(&env_path)));

        let key = source.lookup(CredentialKind::ModelProvider).await.unwrap();
        assert_eq!(key.as_deref(), Some("sk-new"));
        assert!(shown.lock().contains("Enter your OpenAI API key: "));
        assert_eq!(
            std::fs::read_to_string(&env_path).unwrap(),
            "OTHER=1\nOPENAI_API_KEY=sk-new\n"
        );
    }

    #[tokio::test]
    async fn test_declined_save_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let (answers, _) = Answers::new(&["mp-key", "n"]);
        let source = PromptCredentialSource::new(Box::new(answers))
            .with_store(Box::new(DotenvCredentialStore::new(&env_path)));

        let key = source.lookup(CredentialKind::MaterialsDatabase).await.unwrap();
        assert_eq!(key.as_deref(), Some("mp-key"));
        assert!(!env_path.exists());
    }

    #[tokio::test]
    async fn test_empty_answer_is_fatal() {
        let (answers, _) = Answers::new(&["   "]);
        let source = PromptCredentialSource::new(Box::new(answers));
        let err = source.lookup(CredentialKind::ModelProvider).await.unwrap_err();
        assert!(matches!(err, MasgentError::Credential(_)));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[tokio::test]
    async fn test_prompt_only_consulted_when_earlier_sources_miss() {
        let (answers, shown) = Answers::new(&["mp-typed"]);
        let resolver = CredentialResolver::new()
            .with_source(Box::new(
                StaticCredentialSource::new().with(CredentialKind::ModelProvider, "sk-env"),
            ))
            .with_source(Box::new(PromptCredentialSource::new(Box::new(answers))));

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.model_api_key(), "sk-env");
        assert_eq!(creds.materials_api_key(), "mp-typed");
        assert!(!shown.lock().contains("OpenAI"));
    }
}
