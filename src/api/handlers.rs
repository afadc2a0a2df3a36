//! Request dispatcher
//!
//! Maps HTTP verbs and URL paths onto the content store. Every request ends
//! in exactly one response and at most one filesystem mutation.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::{AuthOutcome, BasicCredentials, CredentialStore};
use crate::sniff::detect_content_type;
use crate::storage::{clean_segments, CapacityOracle, ContentStore, FsErrorKind};

use super::envelope::reply;

/// Message served at `GET /`
pub const WELCOME_MESSAGE: &str = "Delivering content at lightspeed!";

const MSG_BAD_CREDENTIALS: &str = "Incorrect Username/Password";
const MSG_INVALID_ARGUMENTS: &str = "Invalid Arguments";

/// Shared, read-only dispatcher state
#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub credentials: Arc<CredentialStore>,
    pub capacity: Arc<dyn CapacityOracle>,
}

impl AppState {
    pub fn new(
        store: ContentStore,
        credentials: CredentialStore,
        capacity: Arc<dyn CapacityOracle>,
    ) -> Self {
        Self {
            store,
            credentials: Arc::new(credentials),
            capacity,
        }
    }
}

/// Decoded query parameters in request order
#[derive(Debug, Default)]
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// First value for `key`
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` appears at all, with any value
    fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

pub async fn handle_root(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<Vec<(String, String)>>>,
    body: Body,
) -> Response {
    let query = QueryParams(query.map(|Query(q)| q).unwrap_or_default());
    dispatch(&state, method, Some("/"), &headers, query, body).await
}

pub async fn handle_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<Vec<(String, String)>>>,
    body: Body,
) -> Response {
    let path = match path {
        Ok(Path(path)) => Some(format!("/{}", path)),
        Err(e) => {
            debug!("Undecodable request path: {}", e);
            None
        }
    };
    let query = QueryParams(query.map(|Query(q)| q).unwrap_or_default());
    dispatch(&state, method, path.as_deref(), &headers, query, body).await
}

/// Route one request; `path` is `None` when the URL path could not be decoded
async fn dispatch(
    state: &AppState,
    method: Method,
    path: Option<&str>,
    headers: &HeaderMap,
    query: QueryParams,
    body: Body,
) -> Response {
    match method {
        Method::GET => match path {
            Some(path) => get_file(state, path).await,
            None => reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS),
        },
        Method::POST | Method::DELETE => {
            let username = match authenticate(&state.credentials, headers) {
                Ok(username) => username,
                Err(response) => return response,
            };
            let Some(path) = path else {
                return reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS);
            };
            debug!("{} {} by '{}'", method, path, username);
            if method == Method::POST {
                upload_file(state, path, &query, body).await
            } else {
                delete_file(state, path).await
            }
        }
        _ => reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

/// Check Basic-Auth credentials against the store
///
/// Unknown users and wrong secrets get the same message.
fn authenticate(credentials: &CredentialStore, headers: &HeaderMap) -> Result<String, Response> {
    let Some(given) = BasicCredentials::from_headers(headers) else {
        return Err(reply(StatusCode::UNAUTHORIZED, "Missing Authorization"));
    };

    match credentials.verify(&given.username, &given.secret) {
        AuthOutcome::Granted => Ok(given.username),
        outcome => {
            debug!("Rejected credentials for '{}': {:?}", given.username, outcome);
            Err(reply(StatusCode::UNAUTHORIZED, MSG_BAD_CREDENTIALS))
        }
    }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// GET → file bytes or error envelope
async fn get_file(state: &AppState, path: &str) -> Response {
    if path == "/" {
        return reply(StatusCode::OK, WELCOME_MESSAGE);
    }

    let target = match state.store.resolve(path) {
        Ok(t) => t,
        Err(e) => {
            debug!("Rejected path {:?}: {}", path, e);
            return reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS);
        }
    };

    match state.store.read(&target).await {
        Ok(data) => file_response(&target, data),
        Err(e) => {
            let kind = FsErrorKind::classify(&e);
            if kind == FsErrorKind::Other {
                warn!("Failed to read {:?}: {}", target, e);
            }
            let (status, message) = read_error_reply(kind);
            reply(status, message)
        }
    }
}

/// Status and message for a failed read
fn read_error_reply(kind: FsErrorKind) -> (StatusCode, &'static str) {
    match kind {
        FsErrorKind::NotFound => (StatusCode::NOT_FOUND, "File Not Found"),
        // 404, not 403, so existence is not revealed
        FsErrorKind::Permission => (StatusCode::NOT_FOUND, "Missing Permissions"),
        FsErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS),
        FsErrorKind::Other => (StatusCode::INTERNAL_SERVER_ERROR, "Unknown Error"),
    }
}

/// POST → write the body to `<path>/<filename>`
async fn upload_file(state: &AppState, path: &str, query: &QueryParams, body: Body) -> Response {
    let filename = query.get("filename").unwrap_or_default();
    if filename.is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Missing query 'filename'");
    }

    let (dir, file) = match state.store.resolve_upload(path, filename) {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!("Rejected upload {:?} / {:?}: {}", path, filename, e);
            return reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS);
        }
    };

    if !query.contains("overwrite") && state.store.exists(&file).await {
        return reply(
            StatusCode::CONFLICT,
            "File already exists, overwrite it using the 'overwrite' parameter",
        );
    }

    let parent = file.parent().unwrap_or(&dir);
    if let Err(e) = state.store.create_dirs(parent).await {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("mkdir: {}", e));
    }

    let data = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(data) => data,
        Err(e) => {
            return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("read body: {}", e));
        }
    };

    // Advisory only, concurrent uploads are not accounted for
    match state.capacity.available_bytes() {
        Ok(available) if data.len() as u64 > available => {
            return reply(StatusCode::INSUFFICIENT_STORAGE, "Insufficient Storage");
        }
        Ok(_) => {}
        Err(e) => {
            return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("capacity: {}", e));
        }
    }

    if let Err(e) = state.store.write(&file, &data).await {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("write: {}", e));
    }

    reply(StatusCode::CREATED, "Data Written")
}

/// DELETE → remove the file or empty directory at `path`
async fn delete_file(state: &AppState, path: &str) -> Response {
    // The content root itself is never removed
    if clean_segments(path).is_empty() {
        return reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS);
    }

    let target = match state.store.resolve(path) {
        Ok(t) => t,
        Err(e) => {
            debug!("Rejected path {:?}: {}", path, e);
            return reply(StatusCode::BAD_REQUEST, MSG_INVALID_ARGUMENTS);
        }
    };

    if !state.store.exists(&target).await {
        return reply(StatusCode::NOT_FOUND, "File does not exist");
    }

    if let Err(e) = state.store.remove(&target).await {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("remove: {}", e));
    }

    reply(StatusCode::ACCEPTED, "File Deleted")
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn file_response(target: &FsPath, data: Vec<u8>) -> Response {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(detect_content_type(&data))),
            (header::CONTENT_DISPOSITION, content_disposition(&name)),
        ],
        data,
    )
        .into_response()
}

/// `attachment; filename="<name>"` with quotes escaped and control bytes replaced
fn content_disposition(name: &str) -> HeaderValue {
    let mut value = String::with_capacity(name.len() + 24);
    value.push_str("attachment; filename=\"");
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                value.push('\\');
                value.push(c);
            }
            c if c.is_control() => value.push('_'),
            c => value.push(c),
        }
    }
    value.push('"');

    HeaderValue::from_bytes(value.as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
