//! Client configuration
//!
//! Values are layered: defaults, then an optional TOML file, then `A2A_CLIENT_*`
//! environment variables. TOML string values may reference the environment
//! with `${VAR}`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{A2aError, Result};

pub const DEFAULT_OUTPUT_MODE: &str = "application/json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OAuth client credentials for the ServiceNow instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Instance URL, always ending in `/`
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}oauth_token.do", normalize_base_url(&self.base_url))
    }
}

/// Fully resolved settings for talking to one agent.
#[derive(Debug, Clone)]
pub struct NowlinkConfig {
    pub credentials: Credentials,
    pub agent_id: String,
    pub agent_card_url: String,
    pub endpoint_url: String,
    pub accepted_output_modes: Vec<String>,
    pub push_notification_url: Option<String>,
    pub timeout: Duration,
}

impl NowlinkConfig {
    /// Load from `path` (or the default file if it exists) and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut raw = match path {
            Some(p) => RawConfig::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => RawConfig::from_file(&p)?,
                _ => RawConfig::default(),
            },
        };
        raw.overlay_env(|key| std::env::var(key).ok());
        raw.resolve()
    }
}

/// `~/.nowlink/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nowlink").join("config.toml"))
}

/// Config as written in TOML, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub agent: RawAgentConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAgentConfig {
    pub id: Option<String>,
    pub card_url: Option<String>,
    /// Path before the agent id, relative to `base_url`
    pub card_path_prefix: Option<String>,
    /// Path after the agent id
    pub card_path_suffix: Option<String>,
    pub endpoint_url: Option<String>,
    pub accepted_output_modes: Option<Vec<String>>,
    pub push_notification_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RawConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            A2aError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content, |key| std::env::var(key).ok())
    }

    /// Parse TOML, expanding `${VAR}` references with `lookup`.
    pub fn from_toml_str(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut raw: RawConfig = toml::from_str(content)
            .map_err(|e| A2aError::Config(format!("failed to parse config: {}", e)))?;

        let expand = |value: &mut Option<String>| -> Result<()> {
            if let Some(v) = value.as_mut() {
                *v = expand_env(v, &lookup)?;
            }
            Ok(())
        };
        expand(&mut raw.base_url)?;
        expand(&mut raw.client_id)?;
        expand(&mut raw.client_secret)?;
        expand(&mut raw.refresh_token)?;
        expand(&mut raw.agent.id)?;
        expand(&mut raw.agent.card_path_prefix)?;
        expand(&mut raw.agent.card_path_suffix)?;
        expand(&mut raw.agent.card_url)?;
        expand(&mut raw.agent.endpoint_url)?;
        expand(&mut raw.agent.push_notification_url)?;
        Ok(raw)
    }

    /// Override fields from `A2A_CLIENT_*` variables. Empty values are ignored.
    pub fn overlay_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("A2A_CLIENT_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_ID") {
            self.client_id = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_SECRET") {
            self.client_secret = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_REFRESH_TOKEN") {
            self.refresh_token = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_AGENT_ID") {
            self.agent.id = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_AGENT_CARD_PATH") {
            self.agent.card_path_prefix = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_AGENT_CARD_WELL_KNOWN_PATH") {
            self.agent.card_path_suffix = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_ENDPOINT_URL") {
            self.agent.endpoint_url = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_OUTPUT_MODES") {
            let modes: Vec<String> = v
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !modes.is_empty() {
                self.agent.accepted_output_modes = Some(modes);
            }
        }
        if let Some(v) = get("A2A_CLIENT_PUSH_URL") {
            self.agent.push_notification_url = Some(v);
        }
        if let Some(v) = get("A2A_CLIENT_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.agent.timeout_secs = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid A2A_CLIENT_TIMEOUT_SECS '{}'", v),
            }
        }
    }

    /// Validate and fill in derived URLs.
    pub fn resolve(self) -> Result<NowlinkConfig> {
        let base_url = required(self.base_url, "base_url (A2A_CLIENT_BASE_URL)")?;
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| A2aError::Config(format!("invalid base_url '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(A2aError::Config(format!(
                "base_url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let credentials = Credentials::new(
            &base_url,
            required(self.client_id, "client_id (A2A_CLIENT_ID)")?,
            required(self.client_secret, "client_secret (A2A_CLIENT_SECRET)")?,
            required(self.refresh_token, "refresh_token (A2A_CLIENT_REFRESH_TOKEN)")?,
        );
        let agent_id = required(self.agent.id, "agent.id (A2A_CLIENT_AGENT_ID)")?;
        let base = &credentials.base_url;

        let agent_card_url = match (
            self.agent.card_url,
            self.agent.card_path_prefix,
            self.agent.card_path_suffix,
        ) {
            (Some(url), _, _) => url,
            (None, Some(prefix), suffix) => format!(
                "{}{}{}{}",
                base,
                prefix.trim_start_matches('/'),
                agent_id,
                suffix.unwrap_or_default()
            ),
            (None, None, _) => default_card_url(base, &agent_id),
        };
        let endpoint_url = self
            .agent
            .endpoint_url
            .unwrap_or_else(|| default_endpoint_url(base, &agent_id));

        let accepted_output_modes = self
            .agent
            .accepted_output_modes
            .filter(|modes| !modes.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_OUTPUT_MODE.to_string()]);

        let timeout_secs = self.agent.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(A2aError::Config(
                "timeout_secs (A2A_CLIENT_TIMEOUT_SECS) must be greater than 0".to_string(),
            ));
        }

        Ok(NowlinkConfig {
            credentials,
            agent_id,
            agent_card_url,
            endpoint_url,
            accepted_output_modes,
            push_notification_url: self.agent.push_notification_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Agent card location on a ServiceNow instance
pub fn default_card_url(base_url: &str, agent_id: &str) -> String {
    format!(
        "{}api/sn_aia/a2a/id/{}/well_known/agent_json",
        normalize_base_url(base_url),
        agent_id
    )
}

/// JSON-RPC endpoint for one agent on a ServiceNow instance
pub fn default_endpoint_url(base_url: &str, agent_id: &str) -> String {
    format!(
        "{}api/sn_aia/a2a/v1/agent/id/{}",
        normalize_base_url(base_url),
        agent_id
    )
}

fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| A2aError::Config(format!("missing required value: {}", name)))
}

/// Replace each `${VAR}` with its value. An unset variable is an error.
fn expand_env(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| A2aError::Config(format!("unterminated ${{ in '{}'", input)))?;
        let name = &after[..end];
        let value = lookup(name).ok_or_else(|| {
            A2aError::Config(format!("environment variable '{}' is not set", name))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
