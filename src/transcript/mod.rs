//! Transcript sinks - the human-facing record of a task run
//!
//! The loop reports every step as a `TranscriptEvent`. Sinks decide where
//! it goes: the terminal, a markdown file, memory (tests), or several at once.

mod console;
mod markdown;

pub use console::ConsoleTranscript;
pub use markdown::MarkdownTranscript;

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::agent::Termination;

/// One step of a task run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriptEvent {
    TaskStarted { task: String },
    Commentary { text: String },
    FunctionCall { name: String, parameters: Value },
    FunctionResult { name: String, result: Value },
    Error { message: String },
    System { message: String },
    TaskCompleted { attempts: u32, termination: Termination },
}

/// Destination for transcript events. Recording never fails the task.
pub trait TranscriptSink: Send + Sync {
    fn record(&self, event: &TranscriptEvent);
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryTranscript {
    events: Mutex<Vec<TranscriptEvent>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TranscriptEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TranscriptEvent::Error { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl TranscriptSink for MemoryTranscript {
    fn record(&self, event: &TranscriptEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Fans each event out to every inner sink
#[derive(Default)]
pub struct MultiTranscript {
    sinks: Vec<Box<dyn TranscriptSink>>,
}

impl MultiTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn TranscriptSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Box<dyn TranscriptSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TranscriptSink for MultiTranscript {
    fn record(&self, event: &TranscriptEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

impl<T: TranscriptSink + ?Sized> TranscriptSink for std::sync::Arc<T> {
    fn record(&self, event: &TranscriptEvent) {
        (**self).record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_records_in_order() {
        let sink = MemoryTranscript::new();
        sink.record(&TranscriptEvent::TaskStarted { task: "t".into() });
        sink.record(&TranscriptEvent::Error { message: "boom".into() });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TranscriptEvent::TaskStarted { .. }));
        assert_eq!(sink.errors(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_multi_fans_out() {
        let a = Arc::new(MemoryTranscript::new());
        let b = Arc::new(MemoryTranscript::new());
        let multi = MultiTranscript::new().with(Box::new(a.clone())).with(Box::new(b.clone()));
        assert_eq!(multi.len(), 2);

        multi.record(&TranscriptEvent::System { message: "hi".into() });
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = TranscriptEvent::TaskCompleted {
            attempts: 2,
            termination: Termination::Completed,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "task_completed");
        assert_eq!(value["attempts"], 2);
        assert_eq!(value["termination"], "completed");
    }
}
