//! Request path normalisation
//!
//! Request paths are cleaned as if rooted at `/`: empty and `.` segments
//! are dropped and `..` pops the previous segment but never climbs above
//! the root. Callers still check containment on the joined result.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A request path that cannot be mapped under the content root
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path contains a NUL byte
    #[error("path contains a NUL byte")]
    NulByte,
    /// Resolved path leaves the directory it must stay in
    #[error("path escapes its root: {0}")]
    Escapes(String),
    /// Upload file name resolves to the destination directory itself
    #[error("file name is empty")]
    EmptyFileName,
}

/// Clean a slash-separated path into its normal segments
pub fn clean_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

fn join_segments(root: &Path, segments: &[&str]) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}

/// Resolve a request path to a location under `root`
pub(crate) fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, PathError> {
    if request_path.contains('\0') {
        return Err(PathError::NulByte);
    }

    let target = join_segments(root, &clean_segments(request_path));
    if !target.starts_with(root) {
        return Err(PathError::Escapes(request_path.to_string()));
    }

    Ok(target)
}

/// Resolve an upload destination: the directory named by `request_path`
/// and the file `filename` inside it
///
/// `filename` may name a nested file (`sub/f.txt`) but must stay inside
/// the destination directory once cleaned.
pub(crate) fn resolve_upload(
    root: &Path,
    request_path: &str,
    filename: &str,
) -> Result<(PathBuf, PathBuf), PathError> {
    if request_path.contains('\0') || filename.contains('\0') {
        return Err(PathError::NulByte);
    }

    let dir_segments = clean_segments(request_path);
    let combined = format!("{}/{}", request_path, filename);
    let file_segments = clean_segments(&combined);

    if !file_segments.starts_with(&dir_segments) {
        return Err(PathError::Escapes(combined));
    }
    if file_segments.len() == dir_segments.len() {
        return Err(PathError::EmptyFileName);
    }

    let dir = join_segments(root, &dir_segments);
    let file = join_segments(root, &file_segments);
    if !dir.starts_with(root) || !file.starts_with(&dir) {
        return Err(PathError::Escapes(combined));
    }

    Ok((dir, file))
}
