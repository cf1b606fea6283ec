//! Shared client-side state.
//!
//! DESIGN
//! ======
//! One `SessionStore` and one `UploadCoordinator` exist per application. They
//! are created at startup, shared by `Rc`, and only ever reset through
//! `logout` / `clear`. State sits in a `RefCell` and no borrow is held across
//! an `.await`, so overlapping calls interleave at their suspension points.

pub mod session;
pub mod upload;

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::rc::Rc;

    use crate::credential::{CredentialStore, MemoryCredentialStore};
    use crate::net::client::RequestClient;
    use crate::net::mock::MockTransport;
    use crate::net::transport::{Method, Transport};

    use super::session::SessionStore;

    /// Everything a state test needs, sharing one scripted transport.
    pub struct Harness {
        pub mock: Rc<MockTransport>,
        pub storage: Rc<MemoryCredentialStore>,
        pub client: Rc<RequestClient>,
        pub session: Rc<SessionStore>,
    }

    /// Harness whose durable storage starts with `token` (or empty).
    #[must_use]
    pub fn harness(token: Option<&str>) -> Harness {
        let mock = MockTransport::new();
        let storage = Rc::new(match token {
            Some(token) => MemoryCredentialStore::with_token(token),
            None => MemoryCredentialStore::new(),
        });
        let transport: Rc<dyn Transport> = mock.clone();
        let client = Rc::new(RequestClient::new(transport, "/api"));
        let durable: Rc<dyn CredentialStore> = storage.clone();
        let session = Rc::new(SessionStore::new(client.clone(), durable));
        Harness { mock, storage, client, session }
    }

    /// `GET /auth/me` body for the given role.
    #[must_use]
    pub fn identity_json(email: &str, role: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "6c1f3f55-3b0a-4a77-9a0e-2f1d9b7c0a11",
            "email": email,
            "role": role,
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        })
    }

    impl Harness {
        pub fn reply_login(&self, token: &str) {
            self.mock.json(Method::POST, "/api/auth/login", 200, serde_json::json!({ "token": token }));
        }

        pub fn reply_me(&self, role: &str) {
            self.mock.json(Method::GET, "/api/auth/me", 200, identity_json("user@example.com", role));
        }

        pub fn reply_me_unauthorized(&self) {
            self.mock.text(Method::GET, "/api/auth/me", 401, "Invalid token");
        }
    }
}
