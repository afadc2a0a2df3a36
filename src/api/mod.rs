//! HTTP API Module
//!
//! Serves files by URL path and accepts authenticated uploads and deletes.

mod envelope;
mod handlers;
mod http;

pub use envelope::{reply, Envelope};
pub use handlers::{AppState, WELCOME_MESSAGE};
pub use http::{router, HttpServer};
