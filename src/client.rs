use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::session::{Credentials, LoginRequest};

const DEFAULT_BASE_URL: &str = "https://api.enliko.com";

/// A freshly issued two-factor request plus the human-readable prompt the
/// server wants shown while the user approves it on Telegram.
#[derive(Debug, Clone)]
pub struct TwoFactorChallenge {
    pub request: LoginRequest,
    pub message: Option<String>,
}

/// Outcome of one status poll for a pending two-factor request.
#[derive(Debug, Clone)]
pub enum TwoFactorPoll {
    Pending,
    Approved { credentials: Credentials },
    Denied { reason: Option<String> },
    Expired,
}

/// HTTP client for the Telegram two-factor endpoints of the auth service.
///
/// # Example
/// ```no_run
/// use enliko_auth::TelegramAuthClient;
///
/// # async fn example() -> Result<(), enliko_auth::AuthError> {
/// let client = TelegramAuthClient::new();
/// let challenge = client.request_two_factor("alice").await?;
/// let poll = client.check_two_factor(&challenge.request.request_id).await?;
/// # Ok(())
/// # }
/// ```
pub struct TelegramAuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramAuthClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask the auth service to push a login approval to the given Telegram user.
    ///
    /// Maps HTTP 404 to [`AuthError::UserNotFound`] and HTTP 429 to
    /// [`AuthError::RateLimited`]; any other failure, including a
    /// `success:false` body, is [`AuthError::InvalidResponse`].
    pub async fn request_two_factor(&self, username: &str) -> Result<TwoFactorChallenge, AuthError> {
        let resp = self
            .client
            .post(format!("{}/auth/telegram/request-2fa", self.base_url))
            .json(&RequestTwoFactorBody { username })
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => return Err(AuthError::UserNotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_ms = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| secs * 1000);
                return Err(AuthError::RateLimited { retry_after_ms });
            }
            status if !status.is_success() => {
                return Err(AuthError::InvalidResponse(format!(
                    "2FA request failed with status {status}"
                )));
            }
            _ => {}
        }
        let payload: RequestTwoFactorResponse = resp.json().await?;
        if !payload.success {
            return Err(AuthError::InvalidResponse(
                payload
                    .message
                    .unwrap_or_else(|| "2FA request rejected by server".to_string()),
            ));
        }
        let request_id = payload.request_id.ok_or_else(|| {
            AuthError::InvalidResponse("2FA request response missing request_id".to_string())
        })?;
        Ok(TwoFactorChallenge {
            request: LoginRequest {
                request_id,
                telegram_username: username.to_string(),
                created_at: Utc::now(),
            },
            message: payload.message,
        })
    }

    /// Check whether a pending request has been approved, denied, or expired.
    ///
    /// Canonical statuses are `pending`, `approved`, `denied` and `expired`;
    /// `rejected` is accepted as an alias of `denied`. An unrecognized status
    /// string maps to [`TwoFactorPoll::Pending`] so the caller keeps polling.
    pub async fn check_two_factor(&self, request_id: &str) -> Result<TwoFactorPoll, AuthError> {
        let resp = self
            .client
            .get(format!(
                "{}/auth/telegram/check-2fa/{request_id}",
                self.base_url
            ))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "2FA status check failed with status {}",
                resp.status()
            )));
        }
        let payload: CheckTwoFactorResponse = resp.json().await?;
        match payload.status.as_str() {
            "pending" => Ok(TwoFactorPoll::Pending),
            "approved" => {
                let token = payload.token.filter(|t| !t.is_empty()).ok_or_else(|| {
                    AuthError::InvalidResponse("approved response missing token".to_string())
                })?;
                let user = payload.user.ok_or_else(|| {
                    AuthError::InvalidResponse("approved response missing user".to_string())
                })?;
                Ok(TwoFactorPoll::Approved {
                    credentials: Credentials {
                        auth_token: token,
                        refresh_token: payload.refresh_token,
                        user_id: user.id,
                        language: user.language,
                        issued_at: Utc::now(),
                    },
                })
            }
            "denied" | "rejected" => Ok(TwoFactorPoll::Denied {
                reason: payload.message,
            }),
            "expired" => Ok(TwoFactorPoll::Expired),
            other => {
                tracing::debug!(status = %other, "unrecognized 2FA status; treating as pending");
                Ok(TwoFactorPoll::Pending)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestTwoFactorBody<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct RequestTwoFactorResponse {
    success: bool,
    request_id: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckTwoFactorResponse {
    status: String,
    token: Option<String>,
    refresh_token: Option<String>,
    user: Option<TwoFactorUser>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwoFactorUser {
    id: i64,
    #[serde(alias = "lang")]
    language: Option<String>,
}
