//! WolfCDN - HTTP File Store
//!
//! A small content server: anyone can fetch files by URL path, and users
//! holding a shared secret can upload or delete files under the same paths.
//!
//! # Architecture
//!
//! A single dispatcher maps HTTP verbs onto a content root directory:
//!
//! - `GET /<path>` returns the raw file with a sniffed content type
//! - `POST /<dir>?filename=<name>` stores the request body (Basic-Auth)
//! - `DELETE /<path>` removes a file (Basic-Auth)
//!
//! Everything other than a successful read is answered with a JSON
//! `{success, code, message}` envelope. Uploads are refused when the disk
//! holding the content root reports too little free space.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod sniff;
pub mod storage;

pub use config::CdnConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{AppState, Envelope, HttpServer};
    pub use crate::auth::CredentialStore;
    pub use crate::config::CdnConfig;
    pub use crate::error::{Error, Result};
    pub use crate::storage::{CapacityOracle, ContentStore, DiskCapacity, FixedCapacity};
}
