//! Composition root: one request client, session store, route guard, and
//! upload slot per application.

use std::rc::Rc;
use std::time::Duration;

use crate::config::PortalConfig;
use crate::credential::{CredentialStore, FileCredentialStore};
use crate::guard::{RouteGuard, RouteTable};
use crate::net::client::RequestClient;
use crate::net::transport::{ReqwestTransport, Transport, TransportError};
use crate::state::session::SessionStore;
use crate::state::upload::UploadCoordinator;

pub struct Portal {
    pub client: Rc<RequestClient>,
    pub session: Rc<SessionStore>,
    pub guard: RouteGuard,
    pub uploads: UploadCoordinator,
}

impl Portal {
    /// Wire the portal over an explicit transport and credential store.
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>, storage: Rc<dyn CredentialStore>, api_base: &str) -> Self {
        let client = Rc::new(RequestClient::new(transport, api_base));
        let session = Rc::new(SessionStore::new(client.clone(), storage));
        let guard = RouteGuard::new(session.clone(), RouteTable::portal());
        let uploads = UploadCoordinator::new(client.clone(), session.clone());
        Self { client, session, guard, uploads }
    }

    /// Native wiring: reqwest over the network, the token in a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &PortalConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(
            &config.origin,
            Duration::from_secs(config.timeouts.request_secs),
            Duration::from_secs(config.timeouts.connect_secs),
        )?;
        let storage = FileCredentialStore::new(config.credential_path.clone());
        tracing::debug!(
            origin = %config.origin,
            api_base = %config.api_base,
            credential_path = %config.credential_path.display(),
            "portal configured"
        );
        Ok(Self::new(Rc::new(transport), Rc::new(storage), &config.api_base))
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
