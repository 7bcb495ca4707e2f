//! Error types for publish_nuget operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for publish_nuget operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all publish_nuget operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Version extraction errors
    #[error("Version error: {0}")]
    Extraction(#[from] ExtractionError),

    /// External command errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Registry lookup errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating inputs, before any external effect
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Tag format does not contain the placeholder exactly once
    #[error("The tag format '{format}' must contain '[*]' exactly once (found {occurrences})")]
    TagFormat {
        /// Rejected format string
        format: String,
        /// Number of placeholder occurrences found
        occurrences: usize,
    },

    /// Project file does not exist
    #[error("The project file '{path}' does not exist")]
    ProjectFileMissing {
        /// Path given on the command line
        path: PathBuf,
    },

    /// Version pattern failed to compile
    #[error("Invalid version pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },

    /// Version pattern has nothing to capture
    #[error("The version pattern '{pattern}' has no capturing group")]
    MissingCaptureGroup {
        /// Pattern source
        pattern: String,
    },

    /// Required argument was empty
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

/// Errors raised while extracting the version from a file
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Version file does not exist
    #[error("The version file '{path}' is not valid")]
    FileNotFound {
        /// Path that was read
        path: PathBuf,
    },

    /// Version file exists but could not be read
    #[error("Failed to read version file '{path}': {source}")]
    ReadFailed {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Pattern did not match the file content
    #[error("The version file '{path}' doesn't contain any match for the pattern '{pattern}'")]
    NoMatch {
        /// Path that was read
        path: PathBuf,
        /// Pattern that was applied
        pattern: String,
    },
}

/// External command errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// Process could not be started
    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        /// Displayed command line
        command: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a started process failed
    #[error("Failed waiting for '{command}': {source}")]
    WaitFailed {
        /// Displayed command line
        command: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Process ran but was classified as failed
    #[error("'{command}' failed (exit code: {exit_code:?})")]
    Failed {
        /// Displayed command line
        command: String,
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
    },

    /// Process exceeded the configured timeout and was killed
    #[error("'{command}' timed out after {seconds}s")]
    TimedOut {
        /// Displayed command line
        command: String,
        /// Configured timeout
        seconds: u64,
    },
}

/// Registry lookup errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Version listing could not be obtained
    #[error("Version query failed (status: {status:?}): {body}")]
    QueryFailed {
        /// HTTP status, absent for transport errors
        status: Option<u16>,
        /// Response body or transport error text
        body: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Validation(ValidationError::TagFormat { .. }) => vec![
                "Use a tag format such as 'v[*]' with exactly one '[*]' placeholder".to_string(),
            ],
            ReleaseError::Validation(ValidationError::ProjectFileMissing { .. }) => vec![
                "Check that project-file-path is relative to the repository root".to_string(),
                "Make sure the repository was checked out before this step".to_string(),
            ],
            ReleaseError::Extraction(ExtractionError::NoMatch { .. }) => vec![
                "Check that the version file contains a <Version> element".to_string(),
                "Pass --version-regex with one capturing group around the version".to_string(),
            ],
            ReleaseError::Command(CommandError::SpawnFailed { .. }) => vec![
                "Ensure the .NET SDK and git are installed and on PATH".to_string(),
            ],
            ReleaseError::Command(CommandError::Failed { .. }) => vec![
                "Inspect the command output above for the failing step".to_string(),
                "Pass --fail-on-build-error false to continue past build warnings".to_string(),
            ],
            ReleaseError::Registry(RegistryError::QueryFailed { .. }) => vec![
                "Check network access to the package registry".to_string(),
                "Pass --continue-on-query-failure true to proceed without the check".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}
