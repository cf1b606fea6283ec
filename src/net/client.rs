//! Request client — builds API requests and normalizes their results.
//!
//! DESIGN
//! ======
//! The client does not own the credential. Callers hand one in per call via
//! [`RequestOptions`], so the session store can depend on the client without
//! the client depending back on the session store.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<ApiResponse<T>, ApiError>`. A reply with a
//! non-success status is `RequestFailed`, never a panic or a silent default;
//! callers pattern-match on the variant.

use std::borrow::Cow;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{HttpRequest, HttpResponse, Method, MultipartForm, RequestBody, Transport, has_scheme};
use crate::credential::Credential;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server or no reply came back.
    #[error(transparent)]
    Transport(#[from] super::transport::TransportError),

    /// The server replied with a non-success status.
    #[error("request failed with status {status}")]
    RequestFailed { status: u16, body: Option<Value> },

    /// A success reply did not match the expected shape.
    #[error("response decode failed (status {status}): {message}")]
    Decode { status: u16, message: String },

    /// The request payload could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::RequestFailed { .. } => "E_REQUEST_FAILED",
            Self::Decode { .. } => "E_DECODE",
            Self::Encode(_) => "E_ENCODE",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RequestFailed { status: 429 | 500..=599, .. })
    }

    /// HTTP status of the reply, if one arrived.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(_) | Self::Encode(_) => None,
        }
    }

    /// Human-readable message taken from the server's error body.
    ///
    /// `None` when the server said nothing useful; callers supply a fallback.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        let Self::RequestFailed { body: Some(body), .. } = self else {
            return None;
        };
        match body {
            Value::Null => None,
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_owned())
            }
            Value::Object(map) => ["message", "error"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_owned)
                .or_else(|| Some(body.to_string())),
            other => Some(other.to_string()),
        }
    }
}

// =============================================================================
// PAYLOADS / OPTIONS / RESULTS
// =============================================================================

/// Outgoing body. JSON gets a content-type header; forms leave it to the
/// transport so the multipart boundary is generated correctly.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Form(MultipartForm),
}

impl Payload {
    /// Serialize any value into a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if the value cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ApiError::Encode(e.to_string()))
    }
}

impl From<MultipartForm> for Payload {
    fn from(form: MultipartForm) -> Self {
        Self::Form(form)
    }
}

/// Per-call options: extra headers and the credential to present.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub credential: Option<Credential>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Option<Credential>) -> Self {
        Self { credential, headers: Vec::new() }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
}

// =============================================================================
// PATH RESOLUTION
// =============================================================================

/// Join a request path onto the API base.
///
/// Absolute URLs pass through. For a path with a leading separator, trailing
/// base segments that repeat as leading path segments collapse to one copy,
/// so `/api` + `/api/orders` is `/api/orders`. Anything else is joined with
/// exactly one separator. A base without a scheme is always rooted, so `api`
/// behaves like `/api`.
#[must_use]
pub fn resolve_path(base: &str, path: &str) -> String {
    if has_scheme(path) {
        return path.to_owned();
    }

    let rooted_base = root_base(base.trim_end_matches('/'));
    let base = &*rooted_base;
    let rooted = path.starts_with('/');
    let clean = path.trim_start_matches('/');

    if base.is_empty() {
        return format!("/{clean}");
    }
    if clean.is_empty() {
        return base.to_owned();
    }

    let remainder = if rooted { strip_overlap(base, clean) } else { clean }.trim_start_matches('/');
    if remainder.is_empty() { base.to_owned() } else { format!("{base}/{remainder}") }
}

fn root_base(base: &str) -> Cow<'_, str> {
    if base.is_empty() || base.starts_with('/') || has_scheme(base) {
        Cow::Borrowed(base)
    } else {
        Cow::Owned(format!("/{base}"))
    }
}

/// Drop the leading segments of `path` that already end `base`.
fn strip_overlap<'a>(base: &str, path: &'a str) -> &'a str {
    let base_path = base_path_part(base);
    let base_segments: Vec<&str> = base_path.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    let longest = base_segments.len().min(path_segments.len());
    let overlap = (1..=longest)
        .rev()
        .find(|&k| base_segments[base_segments.len() - k..] == path_segments[..k])
        .unwrap_or(0);

    if overlap == 0 {
        return path;
    }
    // Byte offset just past the `overlap`-th segment and its separator.
    let consumed: usize = path_segments[..overlap].iter().map(|s| s.len() + 1).sum();
    path.get(consumed..).unwrap_or("")
}

/// Path portion of a base that may be an absolute URL.
fn base_path_part(base: &str) -> &str {
    if !has_scheme(base) {
        return base;
    }
    let after_scheme = base.find("://").map_or(base, |i| &base[i + 3..]);
    after_scheme.find('/').map_or("", |i| &after_scheme[i..])
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct RequestClient {
    transport: Rc<dyn Transport>,
    base: String,
}

impl RequestClient {
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>, base: impl Into<String>) -> Self {
        Self { transport, base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve `path` against this client's base.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        resolve_path(&self.base, path)
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::GET, path, None, options).await
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Payload,
        options: &RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, path, Some(body), options).await
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Payload,
        options: &RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PUT, path, Some(body), options).await
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::DELETE, path, None, options).await
    }

    /// Send a request and hand back the reply untouched, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no reply arrived, or
    /// [`ApiError::Encode`] when a JSON body cannot be serialized.
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload>,
        options: &RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build(method, path, body, options)?;
        tracing::debug!(method = %request.method, url = %request.url, "api request");
        Ok(self.transport.send(request).await?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload>,
        options: &RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.raw(method, path, body, options).await?;
        let status = response.status;

        if !response.is_success() {
            return Err(ApiError::RequestFailed { status, body: decode_error_body(&response) });
        }

        let value = if response.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode { status, message: e.to_string() })?
        };
        let data = serde_json::from_value(value).map_err(|e| ApiError::Decode { status, message: e.to_string() })?;
        Ok(ApiResponse { data, status })
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload>,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = options.headers.clone();

        let body = match body {
            None => RequestBody::Empty,
            Some(Payload::Json(value)) => {
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
                headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
                let bytes = serde_json::to_vec(&value).map_err(|e| ApiError::Encode(e.to_string()))?;
                RequestBody::Json(bytes)
            }
            Some(Payload::Form(form)) => {
                // The transport writes the boundary into the content-type.
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
                RequestBody::Multipart(form)
            }
        };

        if let Some(credential) = &options.credential {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push(("Authorization".to_owned(), credential.bearer()));
        }

        Ok(HttpRequest { method, url: self.url(path), headers, body })
    }
}

/// JSON error body if it parses, the raw text otherwise, `None` when empty.
fn decode_error_body(response: &HttpResponse) -> Option<Value> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(&response.body)
        .ok()
        .or_else(|| Some(Value::String(response.text())))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
