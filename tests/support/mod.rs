#![allow(dead_code)]

use std::sync::Mutex;

use enliko_auth::{AuthError, CredentialStore, PreferenceStore, StoredCredentials};

/// In-memory credential store that counts writes, for asserting
/// persist-exactly-once behavior.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
    auth_token_saves: Mutex<u32>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .auth_token
            .clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .refresh_token
            .clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.inner.lock().expect("store lock poisoned").user_id
    }

    pub fn auth_token_saves(&self) -> u32 {
        *self.auth_token_saves.lock().expect("store lock poisoned")
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_auth_token(&self, token: &str) -> Result<(), AuthError> {
        self.inner.lock().expect("store lock poisoned").auth_token = Some(token.to_string());
        *self.auth_token_saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }

    fn save_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .refresh_token = Some(token.to_string());
        Ok(())
    }

    fn save_user_id(&self, id: i64) -> Result<(), AuthError> {
        self.inner.lock().expect("store lock poisoned").user_id = Some(id);
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredCredentials>, AuthError> {
        Ok(Some(self.inner.lock().expect("store lock poisoned").clone()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.inner.lock().expect("store lock poisoned") = StoredCredentials::default();
        Ok(())
    }
}

/// In-memory preference store.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    language: Mutex<Option<String>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn save_language(&self, code: &str) -> Result<(), AuthError> {
        *self.language.lock().expect("store lock poisoned") = Some(code.to_string());
        Ok(())
    }

    fn language(&self) -> Result<Option<String>, AuthError> {
        Ok(self.language.lock().expect("store lock poisoned").clone())
    }
}

/// A credential store whose writes always fail, for failure-path tests.
pub struct FailingCredentialStore;

impl CredentialStore for FailingCredentialStore {
    fn save_auth_token(&self, _token: &str) -> Result<(), AuthError> {
        Err(AuthError::Io("disk full".to_string()))
    }

    fn save_refresh_token(&self, _token: &str) -> Result<(), AuthError> {
        Err(AuthError::Io("disk full".to_string()))
    }

    fn save_user_id(&self, _id: i64) -> Result<(), AuthError> {
        Err(AuthError::Io("disk full".to_string()))
    }

    fn load(&self) -> Result<Option<StoredCredentials>, AuthError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
