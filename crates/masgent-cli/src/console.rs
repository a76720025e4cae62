//! Line-oriented terminal I/O behind a trait so the REPL can be scripted.

use async_trait::async_trait;
use masgent_agent::ReplySink;
use std::io::{self, BufRead, Write};

/// Where the REPL reads commands and writes replies.
#[async_trait]
pub trait Console: Send {
    /// Shows `prompt` and reads one line without its terminator.
    /// `Ok(None)` means end of input.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Writes `text` as is.
    fn print(&mut self, text: &str);

    /// Writes `text` and a newline.
    fn println(&mut self, text: &str) {
        self.print(text);
        self.print("\n");
    }
}

/// Standard input and output.
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    /// Creates a console over the process's stdin and stdout.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }

        // Stdin blocks; keep it off the runtime's worker threads.
        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|n| (n, line))
        })
        .await
        .map_err(io::Error::other)?;
        let (n, mut line) = read?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn print(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Streams agent replies onto a console.
pub struct ConsoleSink<'a> {
    console: &'a mut dyn Console,
}

impl<'a> ConsoleSink<'a> {
    /// Wraps `console` for one agent turn.
    pub fn new(console: &'a mut dyn Console) -> Self {
        Self { console }
    }
}

impl ReplySink for ConsoleSink<'_> {
    fn delta(&mut self, text: &str) {
        self.console.print(text);
    }

    fn end(&mut self) {
        self.console.print("\n\n");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Lines {
        input: VecDeque<String>,
        shown: String,
    }

    #[async_trait]
    impl Console for Lines {
        async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            tokio::task::yield_now().await;
            self.shown.push_str(prompt);
            Ok(self.input.pop_front())
        }

        fn print(&mut self, text: &str) {
            self.shown.push_str(text);
        }
    }

    #[tokio::test]
    async fn test_read_line_runs_on_spawned_task() {
        let mut console: Box<dyn Console> = Box::new(Lines {
            input: VecDeque::from(["ai".to_string()]),
            ..Default::default()
        });
        let handle = tokio::spawn(async move {
            let first = console.read_line("Masgent > ").await.unwrap();
            let second = console.read_line("Masgent > ").await.unwrap();
            (first, second)
        });
        let (first, second) = handle.await.unwrap();
        assert_eq!(first.as_deref(), Some("ai"));
        assert!(second.is_none());
    }

    #[test]
    fn test_sink_ends_reply_with_blank_line() {
        let mut console = Lines::default();
        let mut sink = ConsoleSink::new(&mut console);
        sink.delta("Proceed using ");
        sink.delta("generate_vasp_poscar?");
        sink.end();
        assert_eq!(console.shown, "Proceed using generate_vasp_poscar?\n\n");
    }
}
