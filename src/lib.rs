//! Surfr - an LLM-driven browser agent
//!
//! Surfr hands a plain-language task to a model, lets the model request
//! browser actions (navigate, click, type, ...) as tool calls, runs them
//! against a live page and feeds each result back until the model stops
//! asking for actions or the attempt budget runs out.

pub mod actions;
pub mod agent;
pub mod browser;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod transcript;

pub use agent::{Agent, TaskOutcome, Termination};
pub use error::{Result, SurfrError};
