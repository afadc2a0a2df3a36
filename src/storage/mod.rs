//! Content Storage Module
//!
//! Maps request paths onto files under the content root and reports how
//! much space is left for uploads.

mod capacity;
mod files;
mod paths;

pub use capacity::{CapacityOracle, DiskCapacity, FixedCapacity};
pub use files::{ContentStore, FsErrorKind};
pub use paths::{clean_segments, PathError};
