//! Builds `message/send` JSON-RPC envelopes

use uuid::Uuid;

use crate::protocol::{
    A2aRequest, JSONRPC_VERSION, Message, MessageSendConfiguration, MessageSendParams, Part,
    PushNotificationConfig, Role, methods,
};

/// Fresh message id in the hex form agents expect
pub fn new_message_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builder for a `message/send` request.
///
/// Nothing here checks the remote agent's requirements: output modes and the
/// push URL are sent exactly as given.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    text: String,
    message_id: String,
    accepted_output_modes: Vec<String>,
    push_notification_url: Option<String>,
    context_id: Option<String>,
    request_id: Option<String>,
}

impl RequestBuilder {
    pub fn message_send(
        text: impl Into<String>,
        message_id: impl Into<String>,
        accepted_output_modes: Vec<String>,
    ) -> Self {
        Self {
            text: text.into(),
            message_id: message_id.into(),
            accepted_output_modes,
            push_notification_url: None,
            context_id: None,
            request_id: None,
        }
    }

    pub fn push_notification_url(mut self, url: Option<String>) -> Self {
        self.push_notification_url = url;
        self
    }

    pub fn context_id(mut self, context_id: Option<String>) -> Self {
        self.context_id = context_id;
        self
    }

    /// Defaults to a random UUID.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn build(self) -> A2aRequest {
        A2aRequest {
            id: self
                .request_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: methods::MESSAGE_SEND.to_string(),
            params: MessageSendParams {
                configuration: MessageSendConfiguration {
                    accepted_output_modes: self.accepted_output_modes,
                    push_notification_config: self
                        .push_notification_url
                        .map(|url| PushNotificationConfig { url }),
                },
                message: Message {
                    kind: "message".to_string(),
                    message_id: self.message_id,
                    parts: vec![Part::text(self.text)],
                    role: Role::User,
                    context_id: self.context_id,
                    task_id: None,
                },
            },
        }
    }
}

/// Shorthand for the common case.
pub fn build_message_send(
    text: &str,
    message_id: &str,
    accepted_output_modes: &[&str],
    push_notification_url: Option<&str>,
) -> A2aRequest {
    RequestBuilder::message_send(
        text,
        message_id,
        accepted_output_modes.iter().map(|m| m.to_string()).collect(),
    )
    .push_notification_url(push_notification_url.map(str::to_string))
    .build()
}
