//! # Publish NuGet
//!
//! Release automation for a single NuGet package, meant to run as a CI step.
//!
//! One invocation extracts the package version from a source file, asks the
//! registry whether that version is already published, and if not builds,
//! packs, optionally tags, and pushes the package.
//!
//! ## Pipeline
//!
//! 1. Resolve inputs: the project file must exist
//! 2. Extract the version and format the release tag
//! 3. Check the registry; an already published version ends the run with success
//! 4. `dotnet build`
//! 5. `dotnet pack` into the output directory
//! 6. `git tag` + `git push origin` (optional, never fatal)
//! 7. `dotnet nuget push`
//!
//! Build, pack and push failures stop the run unless `fail_on_build_error`
//! is disabled.
//!
//! ## Usage
//!
//! ```bash
//! publish_nuget --name Venflow --project-file-path src/Venflow/Venflow.csproj --nuget-key "$NUGET_KEY"
//! publish_nuget --name Venflow --project-file-path src/Venflow/Venflow.csproj --tag-format "release-[*]" --include-symbols true
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod registry;
pub mod version;

// Re-export main types for public API
pub use cli::Args;
pub use error::{ReleaseError, Result};
pub use pipeline::{ReleaseOutcome, ReleasePipeline, ReleaseStep};
pub use process::{CommandLine, CommandResult, CommandRunner, LogSink, OutputSink, ProcessRunner};
pub use registry::{NugetRegistry, RegistryLookup, VersionIndex};
pub use version::TagFormat;

use error::ValidationError;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Default `-s` source of `dotnet nuget push`
pub const NUGET_PUSH_SOURCE: &str = "https://api.nuget.org/v3/index.json";

/// Configuration for a release run.
///
/// Built once from validated input and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Package id on the registry
    pub package_name: String,
    /// Project file passed to build and pack
    pub project_file: PathBuf,
    /// File the version is read from, defaults to the project file
    pub version_file: Option<PathBuf>,
    /// Pattern whose first capture group is the version
    pub version_pattern: Regex,
    /// Release tag format
    pub tag_format: TagFormat,
    /// Create and push a git tag
    pub tag_commit: bool,
    /// Produce and push a symbol package
    pub include_symbols: bool,
    /// Stop on a failed build, pack or push
    pub fail_on_build_error: bool,
    /// Keep going when the registry check fails
    pub continue_on_query_failure: bool,
    /// Registry API key
    pub nuget_key: String,
    /// Push source URL
    pub push_source: String,
    /// Directory packages are written to
    pub output_dir: PathBuf,
}

impl ReleaseConfig {
    /// Configuration with default settings for everything but the required inputs
    pub fn new(
        package_name: impl Into<String>,
        project_file: impl Into<PathBuf>,
        nuget_key: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            project_file: project_file.into(),
            version_file: None,
            version_pattern: default_version_pattern(),
            tag_format: TagFormat::default(),
            tag_commit: true,
            include_symbols: false,
            fail_on_build_error: true,
            continue_on_query_failure: true,
            nuget_key: nuget_key.into(),
            push_source: NUGET_PUSH_SOURCE.to_string(),
            output_dir: default_output_dir(),
        }
    }

    /// File the version is extracted from
    pub fn version_file_path(&self) -> &Path {
        self.version_file.as_deref().unwrap_or(&self.project_file)
    }
}

/// Compile a version pattern, requiring at least one capture group
pub fn compile_version_pattern(pattern: &str) -> std::result::Result<Regex, ValidationError> {
    let regex = Regex::new(pattern).map_err(|source| ValidationError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    // captures_len counts the implicit whole-match group
    if regex.captures_len() < 2 {
        return Err(ValidationError::MissingCaptureGroup {
            pattern: pattern.to_string(),
        });
    }

    Ok(regex)
}

/// Output directory used when none is configured
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("publish-nuget")
}

fn default_version_pattern() -> Regex {
    Regex::new(version::DEFAULT_VERSION_PATTERN).expect("default version pattern is valid")
}
