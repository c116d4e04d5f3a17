//! A2A (Agent-to-Agent) client for ServiceNow agents
//!
//! Refreshes an OAuth access token, builds `message/send` JSON-RPC requests
//! and sends them to an agent's endpoint. Remote JSON-RPC errors are surfaced
//! exactly as the server reported them.

pub mod auth;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod protocol;
pub mod request;

pub use auth::{AccessToken, TokenClient};
pub use client::A2aClient;
pub use config::{Credentials, NowlinkConfig};
pub use conversation::Conversation;
pub use error::{A2aError, Result};
pub use protocol::{A2aRequest, AgentCard, SendMessageResult, TaskState};
pub use request::{RequestBuilder, build_message_send, new_message_id};
