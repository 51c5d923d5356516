//! Coloured terminal transcript

use colored::Colorize;
use serde_json::Value;

use super::{TranscriptEvent, TranscriptSink};
use crate::agent::Termination;

/// Longest value echoed to the terminal before it is elided
const MAX_VALUE_CHARS: usize = 300;

#[derive(Debug, Clone, Default)]
pub struct ConsoleTranscript {
    /// Print full action results instead of an elided preview
    verbose: bool,
}

impl ConsoleTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn render(&self, event: &TranscriptEvent) -> String {
        match event {
            TranscriptEvent::TaskStarted { task } => format!("{} {}", "Task:".bold().cyan(), task),
            TranscriptEvent::Commentary { text } => format!("{} {}", "Model:".bold(), text),
            TranscriptEvent::FunctionCall { name, parameters } => {
                format!("{} {}({})", "->".blue(), name.blue().bold(), self.preview(parameters))
            }
            TranscriptEvent::FunctionResult { name, result } => {
                let ok = result.get("success").and_then(Value::as_bool).unwrap_or(false);
                let status = if ok { "ok".green() } else { "failed".red() };
                format!("{} {} {} {}", "<-".blue(), name, status, self.preview(result).dimmed())
            }
            TranscriptEvent::Error { message } => format!("{} {}", "Error:".red().bold(), message),
            TranscriptEvent::System { message } => message.yellow().to_string(),
            TranscriptEvent::TaskCompleted { attempts, termination } => {
                let label = match termination {
                    Termination::Completed => "completed".green().bold(),
                    Termination::BudgetExhausted => "stopped: attempt budget exhausted".yellow().bold(),
                };
                format!("{} after {} attempt(s)", label, attempts)
            }
        }
    }

    fn preview(&self, value: &Value) -> String {
        let text = value.to_string();
        if self.verbose || text.chars().count() <= MAX_VALUE_CHARS {
            return text;
        }
        let cut: String = text.chars().take(MAX_VALUE_CHARS).collect();
        format!("{}...", cut)
    }
}

impl TranscriptSink for ConsoleTranscript {
    fn record(&self, event: &TranscriptEvent) {
        println!("{}", self.render(event));
    }
}
