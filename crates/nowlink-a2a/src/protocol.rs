//! A2A (Agent-to-Agent) protocol types
//!
//! The JSON-RPC 2.0 envelope for `message/send`, the agent card served at the
//! well-known path, and the task/message results an agent answers with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC methods the client calls
pub mod methods {
    pub const MESSAGE_SEND: &str = "message/send";
}

/// JSON-RPC and A2A error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const TASK_NOT_FOUND: i64 = -32001;
    pub const TASK_NOT_CANCELABLE: i64 = -32002;
    pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;
    pub const UNSUPPORTED_OPERATION: i64 = -32004;
    pub const CONTENT_TYPE_NOT_SUPPORTED: i64 = -32005;
    pub const INVALID_AGENT_RESPONSE: i64 = -32006;

    pub fn describe(code: i64) -> Option<&'static str> {
        let kind = match code {
            PARSE_ERROR => "parse error",
            INVALID_REQUEST => "invalid request",
            METHOD_NOT_FOUND => "method not found",
            INVALID_PARAMS => "invalid params",
            INTERNAL_ERROR => "internal error",
            TASK_NOT_FOUND => "task not found",
            TASK_NOT_CANCELABLE => "task not cancelable",
            PUSH_NOTIFICATION_NOT_SUPPORTED => "push notification not supported",
            UNSUPPORTED_OPERATION => "unsupported operation",
            CONTENT_TYPE_NOT_SUPPORTED => "content type not supported",
            INVALID_AGENT_RESPONSE => "invalid agent response",
            _ => return None,
        };
        Some(kind)
    }
}

/// JSON-RPC 2.0 request carrying a `message/send` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A2aRequest {
    pub id: String,
    pub jsonrpc: String,
    pub method: String,
    pub params: MessageSendParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSendParams {
    pub configuration: MessageSendConfiguration,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendConfiguration {
    /// Must be a subset of the agent card's `defaultOutputModes` or the
    /// server rejects the whole request.
    pub accepted_output_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notification_config: Option<PushNotificationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotificationConfig {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single content part, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
    File { file: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

fn message_kind() -> String {
    "message".to_string()
}

fn task_kind() -> String {
    "task".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "message_kind")]
    pub kind: String,
    pub message_id: String,
    pub parts: Vec<Part>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Message {
    /// Text parts joined with newlines; non-text parts are skipped.
    pub fn text(&self) -> String {
        join_text(&self.parts)
    }
}

fn join_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Task lifecycle state as reported by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Rejected
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Working => write!(f, "working"),
            Self::InputRequired => write!(f, "input-required"),
            Self::Completed => write!(f, "completed"),
            Self::Canceled => write!(f, "canceled"),
            Self::Failed => write!(f, "failed"),
            Self::Rejected => write!(f, "rejected"),
            Self::AuthRequired => write!(f, "auth-required"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default = "task_kind")]
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// Result of `message/send`: the agent answers with either a task or a
/// direct message. A task is tried first since it requires `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendMessageResult {
    Task(Task),
    Message(Message),
}

impl SendMessageResult {
    /// Text the agent replied with. For a task this is the status message.
    pub fn text(&self) -> String {
        match self {
            Self::Message(msg) => msg.text(),
            Self::Task(task) => task
                .status
                .message
                .as_ref()
                .map(Message::text)
                .unwrap_or_default(),
        }
    }

    pub fn context_id(&self) -> Option<&str> {
        match self {
            Self::Message(msg) => msg.context_id.as_deref(),
            Self::Task(task) => task.context_id.as_deref(),
        }
    }

    pub fn state(&self) -> Option<TaskState> {
        match self {
            Self::Task(task) => Some(task.status.state),
            Self::Message(_) => None,
        }
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Agent Card — advertises capabilities at the agent's well-known path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Requested modes the card does not advertise. The server rejects a
    /// request if this is non-empty, so callers may want to warn about it.
    pub fn unsupported_output_modes<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|mode| !self.default_output_modes.contains(*mode))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_serialization() {
        let json = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(json, json!({"kind": "text", "text": "hello"}));
    }

    #[test]
    fn test_task_state_display() {
        assert_eq!(TaskState::InputRequired.to_string(), "input-required");
        assert_eq!(TaskState::Completed.to_string(), "completed");
    }

    #[test]
    fn test_task_state_unknown_value() {
        let state: TaskState = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(state, TaskState::Unknown);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_result_parses_task() {
        let value = json!({
            "kind": "task",
            "id": "task-1",
            "contextId": "ctx-9",
            "status": {
                "state": "input-required",
                "message": {
                    "kind": "message",
                    "messageId": "m-2",
                    "role": "agent",
                    "parts": [
                        {"kind": "text", "text": "Which incident?"},
                        {"kind": "data", "data": {"x": 1}}
                    ]
                }
            }
        });
        let result: SendMessageResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.state(), Some(TaskState::InputRequired));
        assert_eq!(result.context_id(), Some("ctx-9"));
        assert_eq!(result.text(), "Which incident?");
    }

    #[test]
    fn test_result_parses_message() {
        let value = json!({
            "kind": "message",
            "messageId": "m-3",
            "role": "agent",
            "contextId": "ctx-1",
            "parts": [
                {"kind": "text", "text": "Category: Network"},
                {"kind": "text", "text": "Subcategory: VPN"}
            ]
        });
        let result: SendMessageResult = serde_json::from_value(value).unwrap();
        assert!(matches!(result, SendMessageResult::Message(_)));
        assert_eq!(result.state(), None);
        assert_eq!(result.text(), "Category: Network\nSubcategory: VPN");
    }

    #[test]
    fn test_task_without_status_message_has_empty_text() {
        let value = json!({"id": "t", "status": {"state": "working"}});
        let result: SendMessageResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.text(), "");
        assert_eq!(result.context_id(), None);
    }

    #[test]
    fn test_jsonrpc_error_response_deserialization() {
        let body = r#"{"jsonrpc":"2.0","id":"1","error":{"code":-32003,"message":"Push Notification is not supported"}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(body).unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::PUSH_NOTIFICATION_NOT_SUPPORTED);
        assert_eq!(err.message, "Push Notification is not supported");
    }

    #[test]
    fn test_jsonrpc_error_without_version_member() {
        let body = r#"{"id":"1","error":{"code":-32602,"message":"Push notification URL is required"}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.jsonrpc, "");
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_agent_card_ignores_unknown_fields() {
        let value = json!({
            "name": "Categorize ITSM Incident",
            "description": "Categorizes incidents",
            "url": "https://example.service-now.com/api/sn_aia/a2a/v1/agent/id/abc",
            "protocolVersion": "0.3.0",
            "capabilities": {"streaming": false, "pushNotifications": true},
            "defaultInputModes": ["text/plain"],
            "defaultOutputModes": ["application/json"],
            "skills": [{"id": "s1", "name": "categorize", "tags": ["itsm"]}]
        });
        let card: AgentCard = serde_json::from_value(value).unwrap();
        assert!(card.capabilities.push_notifications);
        assert!(!card.capabilities.state_transition_history);
        assert_eq!(card.skills[0].tags, vec!["itsm"]);
    }

    #[test]
    fn test_unsupported_output_modes() {
        let card: AgentCard = serde_json::from_value(json!({
            "name": "agent",
            "defaultOutputModes": ["application/json"]
        }))
        .unwrap();
        let requested = vec!["application/json".to_string(), "text/plain".to_string()];
        assert_eq!(card.unsupported_output_modes(&requested), vec!["text/plain"]);
    }

    #[test]
    fn test_describe_codes() {
        assert_eq!(error_codes::describe(-32602), Some("invalid params"));
        assert_eq!(
            error_codes::describe(-32003),
            Some("push notification not supported")
        );
        assert_eq!(error_codes::describe(0), None);
    }
}
