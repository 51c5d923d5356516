//! The task loop - drive the model and the browser until the task is done
//!
//! One pass of the loop takes the model's latest reply, runs every action it
//! asked for (strictly in order, one at a time) and feeds each result back.
//! A reply with no action requests ends the task. `max_attempts` caps the
//! number of passes that dispatched anything.

use log::{debug, info, warn};
use serde_json::Value;

use super::context::SessionContext;
use super::state::{LoopState, TaskOutcome};
use crate::actions::ActionRegistry;
use crate::conversation::{Outgoing, Reply};
use crate::error::{Result, SurfrError};
use crate::transcript::{TranscriptEvent, TranscriptSink};

pub struct TaskLoop<'a> {
    registry: &'a ActionRegistry,
    transcript: &'a dyn TranscriptSink,
}

impl<'a> TaskLoop<'a> {
    pub fn new(registry: &'a ActionRegistry, transcript: &'a dyn TranscriptSink) -> Self {
        Self { registry, transcript }
    }

    /// Run `task` to completion or until `max_attempts` passes are used.
    ///
    /// Fails only when no browser session can be acquired or the model
    /// cannot be reached. Everything else is reported to the model and the
    /// transcript, and the loop carries on.
    pub async fn run(&self, ctx: &mut SessionContext, task: &str, max_attempts: u32) -> Result<TaskOutcome> {
        ctx.ensure_session().await?;
        let (session, conversation) = ctx
            .parts()
            .ok_or_else(|| SurfrError::Browser("no browser session available".to_string()))?;

        info!("Starting task (max_attempts: {}): {}", max_attempts, task);
        self.transcript.record(&TranscriptEvent::TaskStarted { task: task.to_string() });

        let mut state = LoopState::new(max_attempts);
        let mut reply = conversation.send(Outgoing::Text(task.to_string())).await?;
        state.last_response_text = reply.text_or_empty().to_string();

        while state.has_budget() {
            if let Some(text) = &reply.text {
                self.transcript.record(&TranscriptEvent::Commentary { text: text.clone() });
            }

            if reply.requests.is_empty() {
                state.terminated = true;
                break;
            }

            let requests = std::mem::take(&mut reply.requests);
            debug!(
                "Attempt {}/{}: {} action request(s)",
                state.attempts_used + 1,
                state.max_attempts,
                requests.len()
            );

            for (index, request) in requests.iter().enumerate() {
                let (Some(name), Some(parameters)) = (&request.name, &request.parameters) else {
                    let message = format!(
                        "Malformed action request '{}' (id {}): a name and object parameters are required",
                        request.display_name(),
                        request.id
                    );
                    warn!("{}", message);
                    self.transcript.record(&TranscriptEvent::Error {
                        message: message.clone(),
                    });
                    reply = conversation.send(Outgoing::Text(message)).await?;
                    state.last_response_text = reply.text_or_empty().to_string();
                    break;
                };

                let parameters = Value::Object(parameters.clone());
                self.transcript.record(&TranscriptEvent::FunctionCall {
                    name: name.clone(),
                    parameters: parameters.clone(),
                });

                let outgoing = match self.registry.dispatch(session, name, &parameters).await {
                    Ok(result) => {
                        let response = result.to_value();
                        if !result.success {
                            debug!("{} reported failure: {:?}", name, result.error);
                        }
                        self.transcript.record(&TranscriptEvent::FunctionResult {
                            name: name.clone(),
                            result: response.clone(),
                        });
                        Outgoing::FunctionResult {
                            id: request.id.clone(),
                            name: name.clone(),
                            response,
                        }
                    }
                    Err(e) => {
                        let message = format!("Error executing action {}: {}", name, e);
                        warn!("{}", message);
                        self.transcript.record(&TranscriptEvent::Error {
                            message: message.clone(),
                        });
                        Outgoing::Text(message)
                    }
                };

                // Later requests of this batch still run; their calls must not read as skipped
                let queued: Vec<String> = requests[index + 1..].iter().map(|r| r.id.clone()).collect();
                reply = conversation.send_with_queued(outgoing, &queued).await?;
                state.last_response_text = reply.text_or_empty().to_string();
            }

            state.attempts_used += 1;
        }

        if !state.terminated {
            // The last reply may still hold requests; they are not run
            let message = format!(
                "Attempt budget of {} exhausted before the model finished",
                state.max_attempts
            );
            warn!("{}", message);
            self.transcript.record(&TranscriptEvent::System { message });
            Self::log_unrun(&reply);
        }

        let outcome = state.into_outcome();
        info!(
            "Task finished: {:?} after {} attempt(s), {} pass(es)",
            outcome.termination,
            outcome.attempts_used,
            outcome.iterations()
        );
        self.transcript.record(&TranscriptEvent::TaskCompleted {
            attempts: outcome.iterations(),
            termination: outcome.termination,
        });
        Ok(outcome)
    }

    fn log_unrun(reply: &Reply) {
        for request in &reply.requests {
            debug!("Not run (budget exhausted): {}", request.display_name());
        }
    }
}
