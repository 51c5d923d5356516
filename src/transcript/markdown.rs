//! Markdown transcript appended to a file

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use log::warn;

use super::{TranscriptEvent, TranscriptSink};

/// Appends one markdown section per event to `path`
#[derive(Debug)]
pub struct MarkdownTranscript {
    path: PathBuf,
    /// Serializes appends from concurrent recorders
    lock: Mutex<()>,
}

impl MarkdownTranscript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// A fresh timestamped file under `dir`, e.g. `task-20260116-093000.md`
    pub fn in_dir(dir: &Path) -> Self {
        let name = format!("task-{}.md", Local::now().format("%Y%m%d-%H%M%S"));
        Self::new(dir.join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(event: &TranscriptEvent) -> String {
        let stamp = Local::now().format("%H:%M:%S");
        match event {
            TranscriptEvent::TaskStarted { task } => format!(
                "# Task\n\n_{}_\n\n{}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                task
            ),
            TranscriptEvent::Commentary { text } => format!("## {} Model\n\n{}\n", stamp, text),
            TranscriptEvent::FunctionCall { name, parameters } => {
                format!("## {} Call `{}`\n\n```json\n{}\n```\n", stamp, name, pretty(parameters))
            }
            TranscriptEvent::FunctionResult { name, result } => {
                format!("## {} Result `{}`\n\n```json\n{}\n```\n", stamp, name, pretty(result))
            }
            TranscriptEvent::Error { message } => format!("## {} Error\n\n> {}\n", stamp, message),
            TranscriptEvent::System { message } => format!("## {} System\n\n{}\n", stamp, message),
            TranscriptEvent::TaskCompleted { attempts, termination } => format!(
                "## {} Finished\n\n{:?} after {} attempt(s)\n",
                stamp, termination, attempts
            ),
        }
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", text)
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl TranscriptSink for MarkdownTranscript {
    fn record(&self, event: &TranscriptEvent) {
        if let Err(e) = self.append(&Self::render(event)) {
            warn!("Failed to write transcript {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Termination;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_writes_sections_and_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("run.md");
        let sink = MarkdownTranscript::new(&path);

        sink.record(&TranscriptEvent::TaskStarted {
            task: "Open example.com".into(),
        });
        sink.record(&TranscriptEvent::FunctionCall {
            name: "navigate".into(),
            parameters: json!({"url": "https://example.com"}),
        });
        sink.record(&TranscriptEvent::TaskCompleted {
            attempts: 1,
            termination: Termination::Completed,
        });

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Task"));
        assert!(text.contains("Open example.com"));
        assert!(text.contains("Call `navigate`"));
        assert!(text.contains("\"url\": \"https://example.com\""));
        assert!(text.contains("Completed after 1 attempt(s)"));
    }

    #[test]
    fn test_in_dir_names_file() {
        let dir = tempdir().unwrap();
        let sink = MarkdownTranscript::in_dir(dir.path());
        let name = sink.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("task-"));
        assert!(name.ends_with(".md"));
    }

    #[test]
    fn test_write_failure_does_not_panic() {
        let dir = tempdir().unwrap();
        // a directory where the file should be
        let sink = MarkdownTranscript::new(dir.path());
        sink.record(&TranscriptEvent::System { message: "x".into() });
    }
}
