//! Agent - the public face of the task loop
//!
//! An `Agent` owns one `SessionContext` (browser session + conversation), the
//! action registry and a transcript sink. Tasks run one after another on the
//! same conversation, so history accumulates across `do_task` calls.

mod context;
mod state;
mod task_loop;

pub use context::SessionContext;
pub use state::{LoopState, TaskOutcome, Termination};
pub use task_loop::TaskLoop;

use std::sync::Arc;

use log::info;

use crate::actions::{ActionContext, ActionRegistry};
use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::{Result, SurfrError};
use crate::llm::{LlmClient, Usage};
use crate::prompt::DEFAULT_INSTRUCTIONS;
use crate::transcript::{MultiTranscript, TranscriptSink};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub struct Agent {
    context: SessionContext,
    registry: ActionRegistry,
    transcript: Box<dyn TranscriptSink>,
    max_attempts: u32,
}

impl Agent {
    /// Agent with the default instruction and no transcript output
    pub fn new(client: Arc<dyn LlmClient>, launcher: Box<dyn SessionLauncher>, registry: ActionRegistry) -> Self {
        let conversation = Conversation::new(client, DEFAULT_INSTRUCTIONS, registry.definitions());
        Self {
            context: SessionContext::new(launcher, conversation),
            registry,
            transcript: Box::new(MultiTranscript::new()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Agent with the standard actions, waits and budget taken from `config`
    pub fn from_config(
        config: &Config,
        client: Arc<dyn LlmClient>,
        launcher: Box<dyn SessionLauncher>,
    ) -> Result<Self> {
        let registry = ActionRegistry::standard(ActionContext::from_config(&config.timeouts, &config.browser))?;
        let conversation = Conversation::new(client, DEFAULT_INSTRUCTIONS, registry.definitions())
            .with_max_tokens(config.llm.max_tokens);

        let mut agent = Self {
            context: SessionContext::new(launcher, conversation),
            registry,
            transcript: Box::new(MultiTranscript::new()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        };
        agent.set_max_attempts(config.agent.max_attempts)?;
        Ok(agent)
    }

    pub fn with_transcript(mut self, transcript: Box<dyn TranscriptSink>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Use an already open browser session instead of launching one
    pub fn with_session(mut self, session: Box<dyn BrowserSession>) -> Self {
        self.context = self.context.with_session(session);
        self
    }

    /// Replace the system instruction given to the model
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.context.conversation.set_system(instructions);
        self
    }

    /// Budget of action-dispatching passes per task. The last call wins.
    pub fn set_max_attempts(&mut self, max_attempts: u32) -> Result<()> {
        if max_attempts == 0 {
            return Err(SurfrError::Config("max_attempts must be at least 1".to_string()));
        }
        self.max_attempts = max_attempts;
        Ok(())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn instructions(&self) -> &str {
        self.context.conversation.system()
    }

    /// Tokens used by every task run so far
    pub fn usage(&self) -> &Usage {
        self.context.conversation.usage()
    }

    /// Run `task` and report how it ended
    pub async fn run_task(&mut self, task: &str) -> Result<TaskOutcome> {
        TaskLoop::new(&self.registry, self.transcript.as_ref())
            .run(&mut self.context, task, self.max_attempts)
            .await
    }

    /// Run `task` and return the model's final text
    pub async fn do_task(&mut self, task: &str) -> Result<String> {
        Ok(self.run_task(task).await?.text)
    }

    /// Shut the browser session down, if one was opened
    pub async fn close(&mut self) -> Result<()> {
        info!("Closing agent");
        self.context.close().await
    }
}
