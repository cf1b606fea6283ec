//! Session store — who is logged in, and the operations that change it.
//!
//! DESIGN
//! ======
//! The credential has two copies: the durable one in the `CredentialStore`
//! and a cached one here. Mutations write durable storage first and only then
//! update memory; logout clears both. Identity is only ever set while the
//! credential it was fetched with is still the held one, so identity never
//! outlives its credential.
//!
//! ERROR HANDLING
//! ==============
//! `login` and `signup` never raise: failures land in `error` and the call
//! returns `false`. A failed identity fetch means the token is stale; the
//! store logs out and reports `SessionError::AuthExpired`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{info, warn};

use crate::credential::{Credential, CredentialError, CredentialStore};
use crate::net::client::{ApiError, Payload, RequestClient, RequestOptions};
use crate::net::types::{Credentials, Identity, TokenResponse};

pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const ME_PATH: &str = "/auth/me";

const LOGIN_FAILED: &str = "Login failed";
const SIGNUP_FAILED: &str = "Signup failed";

// =============================================================================
// ERRORS / PHASE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The held credential was rejected or the identity could not be fetched.
    #[error("session expired")]
    AuthExpired {
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Storage(#[from] CredentialError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// A login request is in flight.
    Authenticating,
    /// A credential is held. `confirmed` once the server returned an identity.
    Authenticated { confirmed: bool },
}

/// Point-in-time copy of the session for views.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub credential: Option<Credential>,
    pub identity: Option<Identity>,
    pub loading: bool,
    pub error: Option<String>,
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    client: Rc<RequestClient>,
    storage: Rc<dyn CredentialStore>,
    credential: RefCell<Option<Credential>>,
    identity: RefCell<Option<Identity>>,
    error: RefCell<Option<String>>,
    pending: Cell<usize>,
    logins: Cell<usize>,
}

/// Marks a network operation in flight until dropped, on every exit path.
struct InFlight<'a>(&'a Cell<usize>);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl SessionStore {
    /// Build the store, seeding the credential from durable storage.
    ///
    /// A stored token yields a provisional authenticated session; the identity
    /// is confirmed later by [`SessionStore::fetch_identity`].
    #[must_use]
    pub fn new(client: Rc<RequestClient>, storage: Rc<dyn CredentialStore>) -> Self {
        let credential = storage.read();
        Self {
            client,
            storage,
            credential: RefCell::new(credential),
            identity: RefCell::new(None),
            error: RefCell::new(None),
            pending: Cell::new(0),
            logins: Cell::new(0),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential.borrow().is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.borrow().as_ref().is_some_and(Identity::is_admin)
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.pending.get() > 0
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    /// Credential held but no identity yet, e.g. right after a reload.
    #[must_use]
    pub fn needs_identity(&self) -> bool {
        self.is_authenticated() && self.identity.borrow().is_none()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.logins.get() > 0 {
            SessionPhase::Authenticating
        } else if self.is_authenticated() {
            SessionPhase::Authenticated { confirmed: self.identity.borrow().is_some() }
        } else {
            SessionPhase::Anonymous
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            credential: self.credential(),
            identity: self.identity(),
            loading: self.loading(),
            error: self.error(),
        }
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Exchange email and password for a credential, then confirm the identity.
    ///
    /// Returns `true` when the session is authenticated afterwards. A token the
    /// server hands out but then refuses on `/auth/me` counts as a failed login:
    /// the store logs out, `error` reads `"session expired"`, and this returns
    /// `false` rather than reporting success for a session that is already gone.
    /// Overlapping calls are not deduplicated; the last credential written wins.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let _loading = InFlight::enter(&self.pending);
        let _authenticating = InFlight::enter(&self.logins);
        self.error.replace(None);

        let body = match Payload::json(&Credentials { email, password }) {
            Ok(body) => body,
            Err(e) => return self.fail(&e, LOGIN_FAILED),
        };
        let token = match self
            .client
            .post::<TokenResponse>(LOGIN_PATH, body, &RequestOptions::new())
            .await
        {
            Ok(reply) => Credential::new(reply.data.token),
            Err(e) => return self.fail(&e, LOGIN_FAILED),
        };

        if let Err(e) = self.commit_credential(token) {
            warn!(error = %e, "credential write failed; login not committed");
            self.error.replace(Some(LOGIN_FAILED.to_owned()));
            return false;
        }
        info!("login succeeded");

        match self.fetch_identity().await {
            Ok(_) => self.is_authenticated(),
            Err(e) => {
                self.error.replace(Some(e.to_string()));
                false
            }
        }
    }

    /// Create an account. Does not establish a session.
    pub async fn signup(&self, email: &str, password: &str) -> bool {
        let _loading = InFlight::enter(&self.pending);
        self.error.replace(None);

        let body = match Payload::json(&Credentials { email, password }) {
            Ok(body) => body,
            Err(e) => return self.fail(&e, SIGNUP_FAILED),
        };
        match self
            .client
            .post::<Value>(SIGNUP_PATH, body, &RequestOptions::new())
            .await
        {
            Ok(_) => {
                info!("signup succeeded");
                true
            }
            Err(e) => self.fail(&e, SIGNUP_FAILED),
        }
    }

    /// Ask the server who the held credential belongs to.
    ///
    /// Without a credential this is a no-op returning `Ok(None)`. Any failure
    /// is treated as an expired session: the store logs out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthExpired`] when the identity request failed.
    pub async fn fetch_identity(&self) -> Result<Option<Identity>, SessionError> {
        let Some(credential) = self.credential() else {
            return Ok(None);
        };
        let _loading = InFlight::enter(&self.pending);

        let options = RequestOptions::with_credential(Some(credential.clone()));
        let result = self.client.get::<Identity>(ME_PATH, &options).await;
        let still_held = self.credential.borrow().as_ref() == Some(&credential);

        match result {
            Ok(reply) => {
                if still_held {
                    self.identity.replace(Some(reply.data.clone()));
                }
                Ok(Some(reply.data))
            }
            Err(source) => {
                warn!(error = %source, code = source.error_code(), "identity fetch failed; session expired");
                if still_held {
                    self.logout();
                }
                Err(SessionError::AuthExpired { source })
            }
        }
    }

    /// Drop the session from memory and durable storage. Idempotent.
    pub fn logout(&self) {
        let had_session = self.credential.replace(None).is_some();
        self.identity.replace(None);
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "credential clear failed");
        }
        if had_session {
            info!("logged out");
        }
    }

    /// Forget the last recorded error.
    pub fn clear_error(&self) {
        self.error.replace(None);
    }

    fn commit_credential(&self, credential: Credential) -> Result<(), SessionError> {
        self.storage.write(&credential)?;
        self.credential.replace(Some(credential));
        // A new credential invalidates whatever identity belonged to the old one.
        self.identity.replace(None);
        Ok(())
    }

    fn fail(&self, err: &ApiError, fallback: &str) -> bool {
        warn!(error = %err, code = err.error_code(), "session request failed");
        let message = err.user_message().unwrap_or_else(|| fallback.to_owned());
        self.error.replace(Some(message));
        false
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
