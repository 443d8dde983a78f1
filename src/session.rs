use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An in-flight two-factor login request issued by the auth service.
///
/// Created on submission, immutable, and discarded once the session reaches a
/// terminal state. The `request_id` is the handle the status endpoint is
/// polled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub request_id: String,
    pub telegram_username: String,
    pub created_at: DateTime<Utc>,
}

/// Credentials returned by an approved two-factor login.
///
/// # Example
/// ```no_run
/// use enliko_auth::Credentials;
/// use chrono::Utc;
///
/// let creds = Credentials {
///     auth_token: "token".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     user_id: 42,
///     language: Some("en".to_string()),
///     issued_at: Utc::now(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub auth_token: String,
    pub refresh_token: Option<String>,
    pub user_id: i64,
    pub language: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Observable state of a two-factor login session.
///
/// Exactly one variant is active at any time. `Approved`, `Denied`, `Expired`
/// and `Failed` are terminal: no further automatic transition occurs, and
/// reaching one cancels both background tasks. `cancel()` returns the session
/// to `Idle` from any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// No handshake in flight; ready to accept a submission.
    Idle,
    /// Waiting for the user to approve the request on Telegram.
    AwaitingApproval {
        request_id: String,
        remaining_seconds: u32,
        message: Option<String>,
    },
    /// The user approved the request; credentials are ready and persisted.
    Approved { credentials: Credentials },
    /// The user denied the request.
    Denied { reason: Option<String> },
    /// The request expired before the user acted.
    Expired,
    /// The handshake was approved remotely but could not be completed locally.
    Failed { message: String },
}

impl LoginState {
    /// True for states from which no further automatic transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Approved { .. } | Self::Denied { .. } | Self::Expired | Self::Failed { .. }
        )
    }

    /// True while the session is waiting for out-of-band approval.
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingApproval { .. })
    }

    /// True if this state is `AwaitingApproval` for the given request id.
    pub(crate) fn is_awaiting_request(&self, id: &str) -> bool {
        matches!(self, Self::AwaitingApproval { request_id, .. } if request_id == id)
    }
}
