//! The two-factor login coordinator.
//!
//! Drives one handshake against the remote approval service:
//! - [`TwoFactorLoginCoordinator::submit`] — validate, request approval, start polling
//! - [`TwoFactorLoginCoordinator::cancel`] — tear down both tasks, back to idle
//! - [`TwoFactorLoginCoordinator::watch_state`] — observable session-state stream
//! - [`TwoFactorLoginCoordinator::await_approval`] — block until a terminal outcome
//!
//! Two periodic tasks cooperate over one guarded state cell: a status poll
//! (every `poll_interval`) and a one-second countdown. Both re-check that the
//! session is still awaiting approval before acting, so when they race to a
//! terminal transition exactly one wins and the other no-ops.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::client::{TelegramAuthClient, TwoFactorPoll};
use crate::error::AuthError;
use crate::session::{Credentials, LoginState};
use crate::store::{CredentialStore, PreferenceStore};

/// Canonical polling cadence for the status endpoint.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);
/// Seconds the user has to approve the request on Telegram.
const DEFAULT_EXPIRY_SECONDS: u32 = 300;

/// Handles for the two background tasks of the active session.
#[derive(Debug, Default)]
struct SessionTasks {
    poll: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl SessionTasks {
    fn abort_all(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

/// Coordinates a Telegram two-factor login handshake.
///
/// Owns the session state behind a mutex with a paired [`watch`] channel as
/// the observable stream the UI layer renders. Collaborators are injected at
/// construction; the coordinator holds no globals.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use enliko_auth::{
///     FileCredentialStore, FilePreferenceStore, TelegramAuthClient,
///     TwoFactorLoginCoordinator,
/// };
///
/// # async fn example() -> Result<(), enliko_auth::AuthError> {
/// let coordinator = TwoFactorLoginCoordinator::new(
///     Arc::new(TelegramAuthClient::new()),
///     Arc::new(FileCredentialStore::new_default()),
///     Arc::new(FilePreferenceStore::new_default()),
/// );
/// coordinator.submit("@alice").await?;
/// let credentials = coordinator.await_approval().await?;
/// # Ok(())
/// # }
/// ```
pub struct TwoFactorLoginCoordinator {
    client: Arc<TelegramAuthClient>,
    credentials: Arc<dyn CredentialStore>,
    preferences: Arc<dyn PreferenceStore>,
    state: Arc<Mutex<LoginState>>,
    state_tx: watch::Sender<LoginState>,
    state_rx: watch::Receiver<LoginState>,
    tasks: Arc<StdMutex<SessionTasks>>,
    poll_interval: Duration,
    expiry_seconds: u32,
}

impl TwoFactorLoginCoordinator {
    pub fn new(
        client: Arc<TelegramAuthClient>,
        credentials: Arc<dyn CredentialStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(LoginState::Idle);
        Self {
            client,
            credentials,
            preferences,
            state: Arc::new(Mutex::new(LoginState::Idle)),
            state_tx,
            state_rx,
            tasks: Arc::new(StdMutex::new(SessionTasks::default())),
            poll_interval: DEFAULT_POLL_INTERVAL,
            expiry_seconds: DEFAULT_EXPIRY_SECONDS,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_expiry_seconds(mut self, seconds: u32) -> Self {
        self.expiry_seconds = seconds;
        self
    }

    /// Current session state.
    pub async fn state(&self) -> LoginState {
        self.state.lock().await.clone()
    }

    /// Subscribe to state changes via a [`watch::Receiver`].
    ///
    /// The receiver yields every transition, including the per-second
    /// countdown updates while the session is awaiting approval.
    pub fn watch_state(&self) -> watch::Receiver<LoginState> {
        self.state_rx.clone()
    }

    /// Start a login handshake for the given Telegram username.
    ///
    /// A leading `@` and surrounding whitespace are stripped before
    /// validation; an empty result fails with [`AuthError::InvalidUsername`]
    /// without touching the network. On success the session transitions to
    /// [`LoginState::AwaitingApproval`] and the poll and countdown tasks
    /// start. Submit-time failures leave the state `Idle` and are returned
    /// directly to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginInProgress`] if a session is already
    /// awaiting approval; call [`cancel`](Self::cancel) first.
    pub async fn submit(&self, username: &str) -> Result<LoginState, AuthError> {
        let username = username.trim();
        let username = username.strip_prefix('@').unwrap_or(username).trim();
        if username.is_empty() {
            return Err(AuthError::InvalidUsername);
        }

        if self.state.lock().await.is_awaiting() {
            return Err(AuthError::LoginInProgress);
        }

        let challenge = self.client.request_two_factor(username).await?;
        let request_id = challenge.request.request_id.clone();
        tracing::debug!(request_id = %request_id, username = %username, "2FA request issued");

        let awaiting = LoginState::AwaitingApproval {
            request_id: request_id.clone(),
            remaining_seconds: self.expiry_seconds,
            message: challenge.message,
        };
        {
            let mut state = self.state.lock().await;
            // A concurrent submit may have won while our request was in flight.
            if state.is_awaiting() {
                return Err(AuthError::LoginInProgress);
            }
            *state = awaiting.clone();
            let _ = self.state_tx.send(awaiting.clone());
        }

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.abort_all();
            tasks.poll = Some(self.spawn_poll_task(request_id.clone()));
            tasks.countdown = Some(self.spawn_countdown_task(request_id));
        }
        Ok(awaiting)
    }

    /// Cancel the active session, if any, and return to `Idle`.
    ///
    /// Safe to call from any state and idempotent. Both background tasks are
    /// aborted before the transition, so no tick fires afterwards.
    pub async fn cancel(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.abort_all();
        }
        let mut state = self.state.lock().await;
        if *state != LoginState::Idle {
            *state = LoginState::Idle;
            let _ = self.state_tx.send(LoginState::Idle);
        }
    }

    /// Wait until the session leaves `AwaitingApproval`.
    ///
    /// Returns the first observed non-awaiting state: a terminal state, or
    /// `Idle` if the session was cancelled locally.
    pub async fn wait_for_terminal(&self) -> LoginState {
        let mut rx = self.state_rx.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if !current.is_awaiting() {
                return current;
            }
            if rx.changed().await.is_err() {
                return LoginState::Idle;
            }
        }
    }

    /// Wait for the handshake outcome and surface it as a `Result`.
    ///
    /// # Errors
    ///
    /// [`AuthError::RequestDenied`] / [`AuthError::RequestExpired`] for the
    /// remote terminal states, [`AuthError::Cancelled`] for a local cancel,
    /// and [`AuthError::InvalidResponse`] if the approval could not be
    /// completed locally.
    pub async fn await_approval(&self) -> Result<Credentials, AuthError> {
        match self.wait_for_terminal().await {
            LoginState::Approved { credentials } => Ok(credentials),
            LoginState::Denied { .. } => Err(AuthError::RequestDenied),
            LoginState::Expired => Err(AuthError::RequestExpired),
            LoginState::Failed { message } => Err(AuthError::InvalidResponse(message)),
            LoginState::Idle | LoginState::AwaitingApproval { .. } => Err(AuthError::Cancelled),
        }
    }

    // -- Background tasks --

    fn spawn_poll_task(&self, request_id: String) -> JoinHandle<()> {
        let client = self.client.clone();
        let credentials = self.credentials.clone();
        let preferences = self.preferences.clone();
        let state = self.state.clone();
        let state_tx = self.state_tx.clone();
        let tasks = self.tasks.clone();
        let interval = self.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                // Guard: the countdown or a cancel may have ended the session
                // while we slept.
                if !state.lock().await.is_awaiting_request(&request_id) {
                    break;
                }
                let next = match client.check_two_factor(&request_id).await {
                    Ok(TwoFactorPoll::Pending) => continue,
                    Ok(TwoFactorPoll::Approved { credentials: creds }) => {
                        match persist_credentials(&credentials, &preferences, &creds) {
                            Ok(()) => LoginState::Approved { credentials: creds },
                            Err(err) => {
                                tracing::error!(error = %err, "failed to persist approved credentials");
                                LoginState::Failed {
                                    message: format!("could not persist credentials: {err}"),
                                }
                            }
                        }
                    }
                    Ok(TwoFactorPoll::Denied { reason }) => LoginState::Denied { reason },
                    Ok(TwoFactorPoll::Expired) => LoginState::Expired,
                    Err(err) => {
                        // Transient: never terminates the session.
                        tracing::warn!(
                            error = %err,
                            request_id = %request_id,
                            "2FA status poll failed; retrying on next tick"
                        );
                        continue;
                    }
                };
                finish(&state, &state_tx, &tasks, &request_id, next).await;
                break;
            }
        })
    }

    fn spawn_countdown_task(&self, request_id: String) -> JoinHandle<()> {
        let state = self.state.clone();
        let state_tx = self.state_tx.clone();
        let tasks = self.tasks.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let expired = {
                    let mut guard = state.lock().await;
                    match &mut *guard {
                        LoginState::AwaitingApproval {
                            request_id: current,
                            remaining_seconds,
                            ..
                        } if *current == request_id => {
                            let remaining = remaining_seconds.saturating_sub(1);
                            *remaining_seconds = remaining;
                            if remaining == 0 {
                                *guard = LoginState::Expired;
                                let _ = state_tx.send(LoginState::Expired);
                                true
                            } else {
                                let snapshot = guard.clone();
                                let _ = state_tx.send(snapshot);
                                false
                            }
                        }
                        // Approved, denied or cancelled concurrently; nothing
                        // left to count down.
                        _ => break,
                    }
                };
                if expired {
                    tracing::debug!(request_id = %request_id, "2FA request expired locally");
                    if let Ok(mut tasks) = tasks.lock() {
                        tasks.abort_all();
                    }
                    break;
                }
            }
        })
    }
}

impl Drop for TwoFactorLoginCoordinator {
    fn drop(&mut self) {
        // No dangling timers once the owner (e.g. the login screen) goes away.
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.abort_all();
        }
    }
}

/// Apply a terminal transition if the session is still awaiting this request.
///
/// Returns `true` if this caller won the transition. The sibling task is
/// aborted after the state lock is released.
async fn finish(
    state: &Mutex<LoginState>,
    state_tx: &watch::Sender<LoginState>,
    tasks: &StdMutex<SessionTasks>,
    request_id: &str,
    next: LoginState,
) -> bool {
    {
        let mut guard = state.lock().await;
        if !guard.is_awaiting_request(request_id) {
            return false;
        }
        *guard = next.clone();
        let _ = state_tx.send(next);
    }
    if let Ok(mut tasks) = tasks.lock() {
        tasks.abort_all();
    }
    true
}

fn persist_credentials(
    store: &Arc<dyn CredentialStore>,
    preferences: &Arc<dyn PreferenceStore>,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    store.save_auth_token(&credentials.auth_token)?;
    if let Some(refresh) = &credentials.refresh_token {
        store.save_refresh_token(refresh)?;
    }
    store.save_user_id(credentials.user_id)?;
    if let Some(language) = &credentials.language {
        preferences.save_language(language)?;
    }
    Ok(())
}
