//! enliko-auth — Telegram two-factor login coordination
//!
//! Platform-neutral core of the Enliko trading clients' login flow. A login
//! attempt is approved out-of-band by the user on Telegram; this crate drives
//! the handshake — request, periodic status polling, and a parallel expiry
//! countdown — and exposes it to UI layers as an observable state stream with
//! `submit`/`cancel` entry points.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use enliko_auth::{
//!     FileCredentialStore, FilePreferenceStore, TelegramAuthClient,
//!     TwoFactorLoginCoordinator,
//! };
//!
//! # async fn example() -> Result<(), enliko_auth::AuthError> {
//! let coordinator = TwoFactorLoginCoordinator::new(
//!     Arc::new(TelegramAuthClient::new()),
//!     Arc::new(FileCredentialStore::new_default()),
//!     Arc::new(FilePreferenceStore::new_default()),
//! );
//! coordinator.submit("@alice").await?;
//! let credentials = coordinator.await_approval().await?;
//! println!("logged in as user {}", credentials.user_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod store;

pub use client::{TelegramAuthClient, TwoFactorChallenge, TwoFactorPoll};
pub use coordinator::TwoFactorLoginCoordinator;
pub use error::AuthError;
pub use session::{Credentials, LoginRequest, LoginState};
pub use store::{
    CredentialStore, FileCredentialStore, FilePreferenceStore, PreferenceStore, StoredCredentials,
};
