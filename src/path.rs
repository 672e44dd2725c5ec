//! Breadcrumb to local path resolution.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Turns a remote label into a single safe path segment.
///
/// Surrounding whitespace is trimmed and path separators are replaced with
/// `_`, so a label always maps to exactly one directory level.
///
/// # Errors
///
/// Returns [`Error::UnsafePathSegment`] for labels that are empty, `.` or `..`
/// after trimming.
pub fn sanitize_segment(label: &str) -> Result<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(Error::UnsafePathSegment {
            segment: label.to_string(),
        });
    }
    Ok(trimmed.replace(['/', '\\'], "_"))
}

/// Joins breadcrumb labels, root first, into a relative directory path.
///
/// An empty breadcrumb resolves to the empty (root) path.
///
/// # Errors
///
/// Returns [`Error::UnsafePathSegment`] if any label cannot be a path segment.
pub fn resolve<S: AsRef<str>>(breadcrumb: &[S]) -> Result<PathBuf> {
    breadcrumb
        .iter()
        .map(|label| sanitize_segment(label.as_ref()))
        .collect()
}
