use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Secure persistence for the credentials of an approved login.
///
/// Assumed durable and cheap enough to call from the polling task without
/// blocking further state transitions.
pub trait CredentialStore: Send + Sync {
    fn save_auth_token(&self, token: &str) -> Result<(), AuthError>;
    fn save_refresh_token(&self, token: &str) -> Result<(), AuthError>;
    fn save_user_id(&self, id: i64) -> Result<(), AuthError>;
    fn load(&self) -> Result<Option<StoredCredentials>, AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Persistence for user preferences delivered with an approved login.
pub trait PreferenceStore: Send + Sync {
    fn save_language(&self, code: &str) -> Result<(), AuthError>;
    fn language(&self) -> Result<Option<String>, AuthError>;
}

/// Credentials as persisted on disk. Fields fill in as the individual
/// `save_*` calls land.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub auth_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<i64>,
}

/// File-backed credential store using a TOML file.
///
/// # Example
/// ```no_run
/// use enliko_auth::{CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// store.save_auth_token("token")?;
/// # Ok::<(), enliko_auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_enliko_dir(),
        }
    }

    fn path(&self) -> PathBuf {
        self.base_dir.join("credentials.toml")
    }

    fn read(&self) -> Result<Option<CredentialsFile>, AuthError> {
        read_toml(&self.path())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut StoredCredentials),
    ) -> Result<(), AuthError> {
        let mut credentials = self
            .read()?
            .map(|file| file.credentials)
            .unwrap_or_default();
        apply(&mut credentials);
        let file = CredentialsFile {
            version: 1,
            credentials,
            saved_at: Utc::now(),
        };
        write_toml(&self.path(), &file)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save_auth_token(&self, token: &str) -> Result<(), AuthError> {
        self.update(|c| c.auth_token = Some(token.to_string()))
    }

    fn save_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.update(|c| c.refresh_token = Some(token.to_string()))
    }

    fn save_user_id(&self, id: i64) -> Result<(), AuthError> {
        self.update(|c| c.user_id = Some(id))
    }

    fn load(&self) -> Result<Option<StoredCredentials>, AuthError> {
        Ok(self.read()?.map(|file| file.credentials))
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// File-backed preference store using a TOML file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    base_dir: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_enliko_dir(),
        }
    }

    fn path(&self) -> PathBuf {
        self.base_dir.join("preferences.toml")
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn save_language(&self, code: &str) -> Result<(), AuthError> {
        let mut preferences: PreferencesFile = read_toml(&self.path())?.unwrap_or_default();
        preferences.language = Some(code.to_string());
        write_toml(&self.path(), &preferences)
    }

    fn language(&self) -> Result<Option<String>, AuthError> {
        Ok(read_toml::<PreferencesFile>(&self.path())?.and_then(|p| p.language))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialsFile {
    version: u32,
    credentials: StoredCredentials,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferencesFile {
    language: Option<String>,
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, AuthError> {
    let raw = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(AuthError::Io(err.to_string())),
    };
    Ok(Some(toml::from_str(&raw)?))
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string(value)?;
    fs::write(path, serialized)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn default_enliko_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".enliko"))
        .unwrap_or_else(|| PathBuf::from(".enliko"))
}
