//! Version discovery for single-package releases.
//!
//! This module reads the version token out of a project or version file and
//! formats it into the release tag name.

mod tag;

pub use tag::{TAG_PLACEHOLDER, TagFormat};

use crate::error::ExtractionError;
use regex::Regex;
use std::path::Path;

/// Default pattern: the first `<Version>` element of an MSBuild project file
pub const DEFAULT_VERSION_PATTERN: &str = r"<Version>(.*)</Version>";

/// Extract the version token from a file.
///
/// Reads the whole file and applies `pattern` once, returning the text of the
/// first capturing group. A group that did not participate in the match yields
/// an empty string.
pub async fn extract_version(path: &Path, pattern: &Regex) -> Result<String, ExtractionError> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ExtractionError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractionError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let captures = pattern
        .captures(&content)
        .ok_or_else(|| ExtractionError::NoMatch {
            path: path.to_path_buf(),
            pattern: pattern.as_str().to_string(),
        })?;

    Ok(captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default())
}
