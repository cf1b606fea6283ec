//! Wire types shared by the session store and the upload slot.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. The server only issues these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated user's profile as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(rename = "createdAt", alias = "created_at", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", alias = "updated_at", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body for `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Server reply to `POST /files/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_id: Uuid,
    pub filename: String,
    #[serde(default)]
    pub volume_cm3: f64,
    #[serde(default)]
    pub surface_area_cm2: f64,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
