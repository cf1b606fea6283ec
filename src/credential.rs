//! Persisted credential store for the single bearer token that survives reloads.
//!
//! DESIGN
//! ======
//! The store is the durable side of the session. `read` is safe to call at any
//! time and reports a missing or unreadable token as absent; only mutations
//! can fail. Writes are last-write-wins, there is only ever one session per
//! device.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// CREDENTIAL
// =============================================================================

/// An opaque bearer token. `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The backing storage does not exist in this environment.
    #[error("credential storage unavailable")]
    Unavailable,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Durable key-value slot holding the current credential.
pub trait CredentialStore {
    /// Current token, or `None` when nothing is stored.
    fn read(&self) -> Option<Credential>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be persisted.
    fn write(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Remove the stored token. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be removed.
    fn clear(&self) -> Result<(), CredentialError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Token kept in a single file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self) -> Option<Credential> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| Credential::new(token))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "credential read failed; treating as absent");
                None
            }
        }
    }

    fn write(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = open_private(&self.path)?;
        file.write_all(credential.as_str().as_bytes())?;
        // Creation mode only applies to new files; tighten a pre-existing one too.
        restrict_permissions(&self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Open for writing, creating the file owner-only so the token is never
/// readable by others, even briefly.
fn open_private(path: &Path) -> io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RefCell<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a token, as if left behind by an earlier session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: RefCell::new(Some(Credential::new(token))) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<Credential> {
        self.slot.borrow().clone()
    }

    fn write(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.slot.borrow_mut() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

// =============================================================================
// BROWSER STORE
// =============================================================================

/// Default `localStorage` key used by the browser front end.
pub const DEFAULT_STORAGE_KEY: &str = "token";

/// Token kept in the browser's `localStorage`.
#[cfg(feature = "hydrate")]
#[derive(Debug, Clone)]
pub struct LocalStorageCredentialStore {
    key: String,
}

#[cfg(feature = "hydrate")]
impl LocalStorageCredentialStore {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[cfg(feature = "hydrate")]
impl Default for LocalStorageCredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY)
    }
}

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(feature = "hydrate")]
impl CredentialStore for LocalStorageCredentialStore {
    fn read(&self) -> Option<Credential> {
        let token = local_storage()?.get_item(&self.key).ok().flatten()?;
        (!token.is_empty()).then(|| Credential::new(token))
    }

    fn write(&self, credential: &Credential) -> Result<(), CredentialError> {
        let storage = local_storage().ok_or(CredentialError::Unavailable)?;
        storage
            .set_item(&self.key, credential.as_str())
            .map_err(|_| CredentialError::Unavailable)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let Some(storage) = local_storage() else {
            return Ok(());
        };
        storage
            .remove_item(&self.key)
            .map_err(|_| CredentialError::Unavailable)
    }
}

#[cfg(test)]
#[path = "credential_test.rs"]
mod tests;
