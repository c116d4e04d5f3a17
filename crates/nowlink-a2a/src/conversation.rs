//! Carries `contextId` across turns of a chat

use crate::protocol::{A2aRequest, SendMessageResult, TaskState};
use crate::request::{RequestBuilder, new_message_id};

/// Conversation state for a sequence of `message/send` calls.
#[derive(Debug, Clone)]
pub struct Conversation {
    accepted_output_modes: Vec<String>,
    push_notification_url: Option<String>,
    context_id: Option<String>,
}

impl Conversation {
    pub fn new(accepted_output_modes: Vec<String>, push_notification_url: Option<String>) -> Self {
        Self {
            accepted_output_modes,
            push_notification_url,
            context_id: None,
        }
    }

    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    /// Next request, continuing the current context if there is one.
    pub fn next_request(&self, text: &str) -> A2aRequest {
        RequestBuilder::message_send(text, new_message_id(), self.accepted_output_modes.clone())
            .push_notification_url(self.push_notification_url.clone())
            .context_id(self.context_id.clone())
            .build()
    }

    /// Update the context from the agent's reply. A completed task ends the
    /// conversation; anything else continues it.
    pub fn record(&mut self, result: &SendMessageResult) {
        match result {
            SendMessageResult::Task(task) if task.status.state == TaskState::Completed => {
                self.context_id = None;
            }
            SendMessageResult::Task(task) => {
                self.context_id = task.context_id.clone();
            }
            SendMessageResult::Message(msg) => {
                if let Some(ctx) = &msg.context_id {
                    self.context_id = Some(ctx.clone());
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.context_id = None;
    }
}
