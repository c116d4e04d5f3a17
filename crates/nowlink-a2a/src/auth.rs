//! OAuth refresh-token exchange against the instance's `oauth_token.do`

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::{A2aError, Result};

/// A short-lived bearer token. Not persisted; callers that cache it can use
/// [`AccessToken::is_expired`].
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: i64,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub obtained_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

impl AccessToken {
    /// Saturates at the representable range when the server sends an
    /// out-of-range `expires_in`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
            .unwrap_or(if self.expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// True once `now` is within `buffer` of the expiry time.
    pub fn is_expired(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        match self.expires_at().checked_sub_signed(buffer) {
            Some(deadline) => now >= deadline,
            None => buffer > Duration::zero(),
        }
    }

    /// First `n` characters, for display
    pub fn preview(&self, n: usize) -> String {
        self.value.chars().take(n).collect()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Exchanges a refresh token for an access token
#[derive(Clone)]
pub struct TokenClient {
    http: Client,
}

impl TokenClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// POST a `refresh_token` grant. Any non-2xx status, or a body without
    /// `access_token`, is an [`A2aError::Auth`]. No retries.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<AccessToken> {
        let url = credentials.token_url();
        debug!("Refreshing OAuth token at {}", url);

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(A2aError::Auth { status, body });
        }

        let parsed: TokenResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => return Err(A2aError::Auth { status, body }),
        };
        let Some(value) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(A2aError::Auth { status, body });
        };

        let token = AccessToken {
            value,
            expires_in: parsed.expires_in.unwrap_or(0),
            token_type: parsed.token_type,
            scope: parsed.scope,
            obtained_at: Utc::now(),
        };
        info!("OAuth token refreshed (expires in {}s)", token.expires_in);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(server: &MockServer) -> Credentials {
        Credentials::new(&server.uri(), "my-client", "my-secret", "my-refresh")
    }

    #[tokio::test]
    async fn test_refresh_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let token = client.refresh(&credentials(&server)).await.unwrap();
        assert_eq!(token.value, "abc");
        assert_eq!(token.expires_in, 0);
    }

    #[tokio::test]
    async fn test_refresh_sends_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("client_id=my-client"))
            .and(body_string_contains("client_secret=my-secret"))
            .and(body_string_contains("refresh_token=my-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "expires_in": 1799,
                "token_type": "Bearer",
                "scope": "useraccount"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let token = client.refresh(&credentials(&server)).await.unwrap();
        assert_eq!(token.expires_in, 1799);
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert_eq!(token.scope.as_deref(), Some("useraccount"));
    }

    #[tokio::test]
    async fn test_refresh_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error_description":"access_denied","error":"server_error"}"#,
            ))
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let err = client.refresh(&credentials(&server)).await.unwrap_err();
        match err {
            A2aError::Auth { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("access_denied"));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_missing_access_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"expires_in": 1800})),
            )
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let err = client.refresh(&credentials(&server)).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_refresh_non_json_body_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let err = client.refresh(&credentials(&server)).await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("<html>login</html>"));
    }

    #[tokio::test]
    async fn test_refresh_connection_refused() {
        let creds = Credentials::new("http://127.0.0.1:1", "id", "secret", "refresh");
        let client = TokenClient::new(Client::new());
        let err = client.refresh(&creds).await.unwrap_err();
        assert!(matches!(err, A2aError::Transport(_)));
    }

    #[tokio::test]
    async fn test_refresh_huge_expires_in_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"abc","expires_in":9223372036854775807}"#,
            ))
            .mount(&server)
            .await;

        let client = TokenClient::new(Client::new());
        let token = client.refresh(&credentials(&server)).await.unwrap();
        assert_eq!(token.expires_in, i64::MAX);
        assert_eq!(token.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!token.is_expired(Utc::now(), Duration::seconds(300)));
    }

    #[test]
    fn test_negative_expires_in_is_expired() {
        let token = AccessToken {
            value: "abc".to_string(),
            expires_in: i64::MIN,
            token_type: None,
            scope: None,
            obtained_at: Utc::now(),
        };
        assert_eq!(token.expires_at(), DateTime::<Utc>::MIN_UTC);
        assert!(token.is_expired(Utc::now(), Duration::seconds(300)));
    }

    #[test]
    fn test_token_expiry() {
        let obtained_at = Utc::now();
        let token = AccessToken {
            value: "abcdefghij".to_string(),
            expires_in: 1800,
            token_type: None,
            scope: None,
            obtained_at,
        };
        assert!(!token.is_expired(obtained_at, Duration::seconds(300)));
        assert!(token.is_expired(obtained_at + Duration::seconds(1500), Duration::seconds(300)));
        assert_eq!(token.preview(4), "abcd");
        assert!(!format!("{:?}", token).contains("abcdefghij"));
    }
}
