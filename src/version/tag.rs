//! Release tag formatting.

use crate::error::ValidationError;

/// Placeholder replaced by the version in a tag format
pub const TAG_PLACEHOLDER: &str = "[*]";

/// A tag format containing [`TAG_PLACEHOLDER`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat(String);

impl TagFormat {
    /// Validate and wrap a tag format string
    pub fn parse(format: &str) -> Result<Self, ValidationError> {
        let occurrences = format.matches(TAG_PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(ValidationError::TagFormat {
                format: format.to_string(),
                occurrences,
            });
        }
        Ok(Self(format.to_string()))
    }

    /// Substitute `version` for the placeholder
    pub fn apply(&self, version: &str) -> String {
        self.0.replacen(TAG_PLACEHOLDER, version, 1)
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        Self("v[*]".to_string())
    }
}
