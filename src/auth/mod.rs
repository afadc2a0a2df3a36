//! Upload Authentication
//!
//! A static username to secret table checked against HTTP Basic-Auth
//! credentials on mutating requests.

mod basic;
mod credentials;

pub use basic::BasicCredentials;
pub use credentials::{parse_user_list, AuthOutcome, CredentialStore};
