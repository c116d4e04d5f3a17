//! A2A client — resolves agent cards and sends JSON-RPC requests

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::TokenClient;
use crate::config::NowlinkConfig;
use crate::error::{A2aError, Result};
use crate::protocol::*;

/// A2A client for one ServiceNow instance
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
}

impl A2aClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn from_config(config: &NowlinkConfig) -> Result<Self> {
        Self::new(config.timeout)
    }

    /// Token client sharing this client's connection pool
    pub fn tokens(&self) -> TokenClient {
        TokenClient::new(self.http.clone())
    }

    /// Fetch an agent's capability card
    pub async fn fetch_agent_card(&self, card_url: &str, token: &str) -> Result<AgentCard> {
        debug!("Fetching agent card from {}", card_url);

        let resp = self.http.get(card_url).bearer_auth(token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(A2aError::Http {
                status,
                url: card_url.to_string(),
                body,
            });
        }

        let card: AgentCard = serde_json::from_slice(&resp.bytes().await?)?;
        info!(
            "Fetched agent card: {} ({} output modes)",
            card.name,
            card.default_output_modes.len()
        );
        Ok(card)
    }

    /// POST a request to the agent's JSON-RPC endpoint.
    ///
    /// A JSON-RPC `error` member is returned as [`A2aError::RemoteProtocol`]
    /// with code and message untouched, whatever HTTP status carried it.
    pub async fn send(
        &self,
        endpoint: &str,
        token: &str,
        request: &A2aRequest,
    ) -> Result<SendMessageResult> {
        debug!(
            "Sending {} (id {}) to {}",
            request.method, request.id, endpoint
        );

        let resp = self
            .http
            .post(endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let rpc: JsonRpcResponse = match serde_json::from_str(&body) {
            Ok(rpc) => rpc,
            Err(e) if status.is_success() => return Err(A2aError::Decode(e)),
            Err(_) => {
                return Err(A2aError::Http {
                    status,
                    url: endpoint.to_string(),
                    body,
                });
            }
        };

        if let Some(error) = rpc.error {
            warn!(
                "Agent returned JSON-RPC error {}: {}",
                error.code, error.message
            );
            return Err(A2aError::RemoteProtocol {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        if !status.is_success() {
            return Err(A2aError::Http {
                status,
                url: endpoint.to_string(),
                body,
            });
        }

        let result = rpc.result.ok_or_else(|| A2aError::InvalidResponse {
            url: endpoint.to_string(),
            reason: "response has neither result nor error".to_string(),
        })?;
        let result: SendMessageResult = serde_json::from_value(result)?;

        match result.state() {
            Some(state) => info!("Agent replied with task (state: {})", state),
            None => info!("Agent replied with message"),
        }
        Ok(result)
    }
}
