use super::*;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("portal-credential-{}", uuid::Uuid::new_v4()))
        .join(name)
}

// =============================================================================
// Credential
// =============================================================================

#[test]
fn credential_debug_redacts_token() {
    let credential = Credential::new("super-secret");
    let printed = format!("{credential:?}");
    assert!(!printed.contains("super-secret"));
}

#[test]
fn credential_bearer_header_value() {
    assert_eq!(Credential::new("abc").bearer(), "Bearer abc");
}

// =============================================================================
// FileCredentialStore
// =============================================================================

#[test]
fn file_store_read_before_any_session_is_absent() {
    let store = FileCredentialStore::new(scratch_path("token"));
    assert!(store.read().is_none());
}

#[test]
fn file_store_write_then_read() {
    let path = scratch_path("token");
    let store = FileCredentialStore::new(&path);
    store.write(&Credential::new("abc")).unwrap();

    assert_eq!(store.read(), Some(Credential::new("abc")));

    // A second handle on the same path sees the durable copy.
    let reopened = FileCredentialStore::new(&path);
    assert_eq!(reopened.read(), Some(Credential::new("abc")));

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn file_store_last_write_wins() {
    let path = scratch_path("token");
    let store = FileCredentialStore::new(&path);
    store.write(&Credential::new("first")).unwrap();
    store.write(&Credential::new("second")).unwrap();
    assert_eq!(store.read(), Some(Credential::new("second")));
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn file_store_clear_removes_token() {
    let path = scratch_path("token");
    let store = FileCredentialStore::new(&path);
    store.write(&Credential::new("abc")).unwrap();
    store.clear().unwrap();
    assert!(store.read().is_none());
    assert!(!path.exists());
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn file_store_clear_is_idempotent() {
    let store = FileCredentialStore::new(scratch_path("token"));
    store.clear().unwrap();
    store.clear().unwrap();
}

#[test]
fn file_store_blank_file_reads_as_absent() {
    let path = scratch_path("token");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "  \n").unwrap();
    let store = FileCredentialStore::new(&path);
    assert!(store.read().is_none());
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn file_store_trims_trailing_newline() {
    let path = scratch_path("token");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "abc\n").unwrap();
    let store = FileCredentialStore::new(&path);
    assert_eq!(store.read(), Some(Credential::new("abc")));
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[cfg(unix)]
#[test]
fn file_store_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let path = scratch_path("token");
    let store = FileCredentialStore::new(&path);
    store.write(&Credential::new("abc")).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[cfg(unix)]
#[test]
fn file_store_tightens_existing_token_file() {
    use std::os::unix::fs::PermissionsExt;

    let path = scratch_path("token");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "an-older-and-longer-token").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let store = FileCredentialStore::new(&path);
    store.write(&Credential::new("abc")).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

// =============================================================================
// MemoryCredentialStore
// =============================================================================

#[test]
fn memory_store_starts_empty() {
    assert!(MemoryCredentialStore::new().read().is_none());
}

#[test]
fn memory_store_seeded_token() {
    let store = MemoryCredentialStore::with_token("abc");
    assert_eq!(store.read(), Some(Credential::new("abc")));
}

#[test]
fn memory_store_write_and_clear() {
    let store = MemoryCredentialStore::new();
    store.write(&Credential::new("xyz")).unwrap();
    assert_eq!(store.read(), Some(Credential::new("xyz")));
    store.clear().unwrap();
    assert!(store.read().is_none());
    store.clear().unwrap();
}
