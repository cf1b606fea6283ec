//! Upload slot — tracks at most one in-flight file upload.
//!
//! A second upload while one is running is rejected before any request is
//! built. `clear` bumps a generation counter; an upload that finishes after
//! its slot was cleared drops its result on the floor.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use tracing::{info, warn};

use super::session::SessionStore;
use crate::net::client::{RequestClient, RequestOptions};
use crate::net::transport::MultipartForm;
use crate::net::types::FileDescriptor;

pub const UPLOAD_PATH: &str = "/files/upload";

/// Server-side upload limit, checked locally before sending.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

const UPLOAD_FAILED: &str = "Upload failed";

// =============================================================================
// FILE
// =============================================================================

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_owned();
        Self { name, content_type, bytes }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "upload.bin".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, bytes))
    }

    fn into_form(self) -> MultipartForm {
        MultipartForm::new().file("file", self.name, self.content_type, self.bytes)
    }
}

fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("stl") => "model/stl",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// SLOT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSlot {
    pub current_file: Option<FileDescriptor>,
    pub in_progress: bool,
    pub last_error: Option<String>,
}

pub struct UploadCoordinator {
    client: Rc<RequestClient>,
    session: Rc<SessionStore>,
    slot: RefCell<UploadSlot>,
    generation: Cell<u64>,
}

/// Clears `in_progress` when the upload ends, unless the slot was reset meanwhile.
struct Running<'a> {
    coordinator: &'a UploadCoordinator,
    generation: u64,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        if self.coordinator.generation.get() == self.generation {
            self.coordinator.slot.borrow_mut().in_progress = false;
        }
    }
}

impl UploadCoordinator {
    #[must_use]
    pub fn new(client: Rc<RequestClient>, session: Rc<SessionStore>) -> Self {
        Self { client, session, slot: RefCell::new(UploadSlot::default()), generation: Cell::new(0) }
    }

    #[must_use]
    pub fn slot(&self) -> UploadSlot {
        self.slot.borrow().clone()
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.slot.borrow().in_progress
    }

    #[must_use]
    pub fn current_file(&self) -> Option<FileDescriptor> {
        self.slot.borrow().current_file.clone()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.slot.borrow().last_error.clone()
    }

    /// Upload `file` with the session's current credential.
    ///
    /// Returns `false` without touching the network when another upload is
    /// still running. Failures land in `last_error`; `current_file` is only
    /// replaced on success.
    pub async fn upload_file(&self, file: UploadFile) -> bool {
        if self.in_progress() {
            warn!(file = %file.name, "upload rejected; another upload is in progress");
            return false;
        }

        let generation = self.generation.get();
        {
            let mut slot = self.slot.borrow_mut();
            slot.in_progress = true;
            slot.last_error = None;
        }
        let _running = Running { coordinator: self, generation };

        if file.bytes.len() > MAX_UPLOAD_BYTES {
            warn!(file = %file.name, size = file.bytes.len(), "upload rejected; file too large");
            self.record_error(generation, "File size exceeds 100MB limit".to_owned());
            return false;
        }

        let name = file.name.clone();
        let options = RequestOptions::with_credential(self.session.credential());
        let result = self
            .client
            .post::<FileDescriptor>(UPLOAD_PATH, file.into_form().into(), &options)
            .await;

        match result {
            Ok(reply) => {
                info!(file = %name, file_id = %reply.data.file_id, "upload stored");
                if self.generation.get() == generation {
                    self.slot.borrow_mut().current_file = Some(reply.data);
                }
                true
            }
            Err(e) => {
                warn!(file = %name, error = %e, code = e.error_code(), "upload failed");
                self.record_error(generation, e.user_message().unwrap_or_else(|| UPLOAD_FAILED.to_owned()));
                false
            }
        }
    }

    /// Reset the slot to empty, in flight or not.
    pub fn clear(&self) {
        self.generation.set(self.generation.get() + 1);
        self.slot.replace(UploadSlot::default());
    }

    fn record_error(&self, generation: u64, message: String) {
        if self.generation.get() == generation {
            self.slot.borrow_mut().last_error = Some(message);
        }
    }
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
