use super::*;

fn identity_json(role: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "6c1f3f55-3b0a-4a77-9a0e-2f1d9b7c0a11",
        "email": "user@example.com",
        "role": role,
        "createdAt": "2024-05-01T12:00:00Z",
        "updatedAt": "2024-05-02T08:30:00.123456Z"
    })
}

#[test]
fn identity_parses_camel_case_timestamps() {
    let identity: Identity = serde_json::from_value(identity_json("USER")).unwrap();
    assert_eq!(identity.email, "user@example.com");
    assert_eq!(identity.role, Role::User);
    assert_eq!(identity.created_at.year(), 2024);
    assert!(!identity.is_admin());
}

#[test]
fn identity_accepts_snake_case_timestamps() {
    let json = serde_json::json!({
        "id": "6c1f3f55-3b0a-4a77-9a0e-2f1d9b7c0a11",
        "email": "admin@example.com",
        "role": "ADMIN",
        "created_at": "2024-05-01T12:00:00Z",
        "updated_at": "2024-05-01T12:00:00Z"
    });
    let identity: Identity = serde_json::from_value(json).unwrap();
    assert!(identity.is_admin());
}

#[test]
fn identity_rejects_unknown_role() {
    let result = serde_json::from_value::<Identity>(identity_json("ROOT"));
    assert!(result.is_err());
}

#[test]
fn credentials_serialize_as_email_and_password() {
    let body = serde_json::to_value(Credentials { email: "a@b.c", password: "pw" }).unwrap();
    assert_eq!(body, serde_json::json!({ "email": "a@b.c", "password": "pw" }));
}

#[test]
fn file_descriptor_parses_upload_reply() {
    let json = serde_json::json!({
        "file_id": "0f8fad5b-d9cb-469f-a165-70867728950e",
        "filename": "bracket.stl",
        "volume_cm3": 12.5,
        "surface_area_cm2": 40.25
    });
    let file: FileDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(file.filename, "bracket.stl");
    assert!((file.volume_cm3 - 12.5).abs() < f64::EPSILON);
}
