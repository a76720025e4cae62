//! The two-mode REPL.

use crate::commands::{render_rows, CommandEntry, CommandTable};
use crate::console::{Console, ConsoleSink};
use masgent_agent::{AgentSession, ContextWindow, LlmBackend};
use masgent_core::MasgentResult;
use masgent_tools::ToolRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Prompt shown in structured mode.
pub const STRUCTURED_PROMPT: &str = "Masgent > ";
/// Prompt shown in agent mode.
pub const AGENT_PROMPT: &str = "Masgent AI > ";
/// Printed when the REPL exits.
pub const FAREWELL: &str = "Exiting Masgent. Goodbye!";

/// Which loop the REPL is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Numbered commands.
    Structured,
    /// Free text sent to the model.
    Agent,
    /// The REPL has finished.
    Ended,
}

/// Whether the REPL keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading input.
    Continue,
    /// Leave the REPL.
    Exit,
}

/// Routes input lines to the command table or to the agent session.
///
/// Agent sessions live only while in agent mode: leaving it ends the session
/// and the next visit starts a fresh one.
pub struct ModeDispatcher<C: Console> {
    console: C,
    registry: Arc<ToolRegistry>,
    commands: CommandTable,
    backend: Arc<dyn LlmBackend>,
    context: ContextWindow,
    agent: Option<AgentSession>,
    mode: Mode,
}

impl<C: Console> ModeDispatcher<C> {
    /// A dispatcher in structured mode.
    pub fn new(
        console: C,
        registry: Arc<ToolRegistry>,
        backend: Arc<dyn LlmBackend>,
        context: ContextWindow,
    ) -> Self {
        Self {
            console,
            registry,
            commands: CommandTable::standard(),
            backend,
            context,
            agent: None,
            mode: Mode::Structured,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The live agent session, only while in agent mode.
    pub fn agent(&self) -> Option<&AgentSession> {
        self.agent.as_ref()
    }

    /// The underlying console.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Reads and handles lines until `exit` or end of input.
    pub async fn run(&mut self) -> MasgentResult<()> {
        self.print_welcome();
        while self.mode != Mode::Ended {
            let prompt = match self.mode {
                Mode::Agent => AGENT_PROMPT,
                _ => STRUCTURED_PROMPT,
            };
            let Some(line) = self.console.read_line(prompt).await? else {
                self.leave_agent();
                self.mode = Mode::Ended;
                break;
            };
            self.handle_line(&line).await?;
        }
        self.console.println(&format!("\n{FAREWELL}\n"));
        Ok(())
    }

    /// Handles one input line in the current mode.
    pub async fn handle_line(&mut self, line: &str) -> MasgentResult<Flow> {
        let flow = match self.mode {
            Mode::Structured => self.handle_structured(line).await?,
            Mode::Agent => self.handle_agent(line).await,
            Mode::Ended => Flow::Exit,
        };
        if flow == Flow::Exit {
            self.leave_agent();
            self.mode = Mode::Ended;
        }
        Ok(flow)
    }

    /// Switches to agent mode with a fresh session.
    pub fn enter_agent(&mut self) {
        self.leave_agent();
        self.agent = Some(AgentSession::new(
            self.backend.clone(),
            self.registry.clone(),
            self.context.clone(),
        ));
        self.mode = Mode::Agent;
        info!("Entered agent mode");
    }

    async fn handle_structured(&mut self, line: &str) -> MasgentResult<Flow> {
        let input = line.trim().to_lowercase();
        match input.as_str() {
            "" => {}
            "ai" => {
                self.enter_agent();
                self.print_agent_help();
            }
            "help" => self.print_help(),
            "exit" => return Ok(Flow::Exit),
            code => match self.commands.lookup(code).copied() {
                Some(CommandEntry {
                    tool: Some(tool), ..
                }) => return self.run_tool_command(tool).await,
                Some(entry) => {
                    let members = self.commands.group_members(entry.code);
                    self.console.println(&format!("\n{}\n", entry.description));
                    self.console.println(&render_rows(members.into_iter()));
                }
                None => {
                    self.console.println(&format!("Unknown command: {code}"));
                    self.console
                        .println("Type \"help\" to see available commands.\n");
                }
            },
        }
        Ok(Flow::Continue)
    }

    /// Prompts for each parameter of `tool` and dispatches it.
    async fn run_tool_command(&mut self, tool: &str) -> MasgentResult<Flow> {
        let Some(spec) = self.registry.get(tool).map(|t| t.spec().clone()) else {
            self.console.println(&format!("Unknown tool: {tool}"));
            return Ok(Flow::Continue);
        };
        debug!(tool = %tool, "Collecting parameters");

        let mut arguments = Map::new();
        for field in spec.schema.fields() {
            let Some(answer) = self
                .console
                .read_line(&format!("{} > ", field.description))
                .await?
            else {
                return Ok(Flow::Exit);
            };
            if answer.trim().is_empty() && !field.required {
                continue;
            }
            arguments.insert(field.name.clone(), field.value_from_text(&answer));
        }

        let result = match self.registry.dispatch(tool, &Value::Object(arguments)).await {
            Ok(result) => result.message,
            Err(unknown) => unknown.to_string(),
        };
        self.console.println(&format!("\n{result}\n"));
        Ok(Flow::Continue)
    }

    async fn handle_agent(&mut self, line: &str) -> Flow {
        let input = line.trim();
        match input {
            "" => {}
            "exit" => return Flow::Exit,
            "cli" => {
                self.leave_agent();
                self.mode = Mode::Structured;
                self.console.println("Switched to structured command mode.\n");
            }
            "help" => self.print_agent_help(),
            _ => {
                if self.agent.is_none() {
                    self.enter_agent();
                }
                if let Some(agent) = self.agent.as_mut() {
                    let mut sink = ConsoleSink::new(&mut self.console);
                    if let Err(e) = agent.handle_turn(input, &mut sink).await {
                        self.console.println(&format!("[Error]: {e}"));
                    }
                }
            }
        }
        Flow::Continue
    }

    fn leave_agent(&mut self) {
        if let Some(mut agent) = self.agent.take() {
            agent.end();
            info!(session_id = %agent.id(), "Left agent mode");
        }
    }

    fn print_welcome(&mut self) {
        self.console.println(&format!(
            "\nMasgent {}: Materials Simulation Agent\n",
            env!("CARGO_PKG_VERSION")
        ));
        self.console.println("Please select a command code to proceed:");
        self.console.println("  0. Density Functional Theory (DFT) Simulations\n");
        self.console.println("Global commands:");
        self.console.println("  ai    ->  Chat with the AI assistant");
        self.console.println("  help  ->  List all available commands");
        self.console.println("  exit  ->  Quit the program\n");
    }

    fn print_help(&mut self) {
        self.console.println("\nMasgent - Available Commands\n");
        let table = self.commands.render();
        self.console.println(&table);
    }

    fn print_agent_help(&mut self) {
        self.console.println("\nMasgent AI Mode usage:");
        self.console
            .println("  Chat with the AI by typing your questions or requests.\n");
        self.console.println("Available commands:");
        self.console.println("  cli   ->  Switch to structured command mode");
        self.console.println("  help  ->  Show this help message");
        self.console.println("  exit  ->  Exit the program\n");
    }
}
