use super::*;

#[test]
fn has_scheme_detects_http_and_https() {
    assert!(has_scheme("http://localhost:3000/api"));
    assert!(has_scheme("https://example.test"));
    assert!(!has_scheme("/api/auth/me"));
    assert!(!has_scheme("httpbin/path"));
}

#[test]
fn has_scheme_ignores_case_and_accepts_any_scheme() {
    assert!(has_scheme("HTTPS://example.test/x"));
    assert!(has_scheme("Http://example.test"));
    assert!(has_scheme("ws+unix://socket"));
    assert!(!has_scheme("/api/x?next=http://elsewhere"));
    assert!(!has_scheme("://missing"));
    assert!(!has_scheme("1http://x"));
}

#[test]
fn absolute_url_prefixes_origin_once() {
    let transport =
        ReqwestTransport::new("http://127.0.0.1:3000/", Duration::from_secs(5), Duration::from_secs(1)).unwrap();
    assert_eq!(transport.absolute_url("/api/auth/me"), "http://127.0.0.1:3000/api/auth/me");
    assert_eq!(transport.absolute_url("https://cdn.test/x"), "https://cdn.test/x");
}

#[test]
fn absolute_url_inserts_missing_separator() {
    let transport =
        ReqwestTransport::new("http://127.0.0.1:3000", Duration::from_secs(5), Duration::from_secs(1)).unwrap();
    assert_eq!(transport.absolute_url("api/auth/me"), "http://127.0.0.1:3000/api/auth/me");
    assert_eq!(transport.absolute_url("HTTPS://cdn.test/x"), "HTTPS://cdn.test/x");
}

#[test]
fn request_header_lookup_is_case_insensitive() {
    let request = HttpRequest {
        method: Method::GET,
        url: "/api/auth/me".into(),
        headers: vec![("Authorization".into(), "Bearer abc".into())],
        body: RequestBody::Empty,
    };
    assert_eq!(request.header("authorization"), Some("Bearer abc"));
    assert_eq!(request.header("content-type"), None);
}

#[test]
fn response_success_range() {
    assert!(HttpResponse { status: 200, body: vec![] }.is_success());
    assert!(HttpResponse { status: 204, body: vec![] }.is_success());
    assert!(!HttpResponse { status: 301, body: vec![] }.is_success());
    assert!(!HttpResponse { status: 401, body: vec![] }.is_success());
}

#[test]
fn multipart_builder_keeps_part_order() {
    let form = MultipartForm::new()
        .text("note", "hello")
        .file("file", "part.stl", "model/stl", vec![1, 2, 3]);
    assert_eq!(form.parts.len(), 2);
    assert_eq!(form.parts[0].name, "note");
    assert_eq!(form.parts[0].bytes, b"hello");
    assert_eq!(form.parts[1].file_name.as_deref(), Some("part.stl"));
    assert_eq!(form.parts[1].content_type.as_deref(), Some("model/stl"));
}

#[test]
fn reqwest_form_rejects_bad_mime() {
    let form = MultipartForm::new().file("file", "x.bin", "not a mime", vec![]);
    assert!(to_reqwest_form(form).is_err());
}
