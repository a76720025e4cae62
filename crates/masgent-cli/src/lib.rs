//! The Masgent REPL.
//!
//! The `masgent` binary wires configuration, credentials and the tool registry
//! together and hands control to a [`ModeDispatcher`], which alternates between
//! structured numbered commands and the conversational agent.

/// Structured-mode commands.
pub mod commands;
/// Configuration file.
pub mod config;
/// Terminal I/O.
pub mod console;
/// Key prompting and persistence.
pub mod credentials;
/// The REPL loop.
pub mod dispatcher;

pub use commands::{CommandEntry, CommandTable};
pub use config::{MasgentConfig, MaterialsProjectConfig, VaspConfig};
pub use console::{Console, ConsoleSink, StdConsole};
pub use credentials::{DotenvCredentialStore, PromptCredentialSource};
pub use dispatcher::{Flow, Mode, ModeDispatcher, AGENT_PROMPT, FAREWELL, STRUCTURED_PROMPT};
