//! Command line argument parsing and validation.
//!
//! Flags mirror the inputs of the CI action: booleans take an explicit value
//! (`--tag-commit false`) so workflow inputs can be forwarded verbatim.

use crate::error::ValidationError;
use crate::registry::NUGET_FLAT_CONTAINER_URL;
use crate::version::{DEFAULT_VERSION_PATTERN, TagFormat};
use crate::{NUGET_PUSH_SOURCE, ReleaseConfig, compile_version_pattern, default_output_dir};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Publish a NuGet package unless its version is already on the registry
#[derive(Parser, Debug, Clone)]
#[command(
    name = "publish_nuget",
    version,
    about = "Publish a NuGet package unless its version is already on the registry",
    long_about = "Extract the package version from a project file, skip the release if the
registry already has it, otherwise build, pack, tag and push the package.

Usage:
  publish_nuget --name Venflow --project-file-path src/Venflow/Venflow.csproj --nuget-key <KEY>
  NUGET_KEY=<KEY> publish_nuget --name Venflow --project-file-path src/Venflow/Venflow.csproj --tag-commit false"
)]
pub struct Args {
    /// The name of the NuGet package
    #[arg(long)]
    pub name: String,

    /// The relative path of the project file
    #[arg(long)]
    pub project_file_path: PathBuf,

    /// The relative path of the version file; defaults to the project file
    #[arg(long)]
    pub version_file_path: Option<String>,

    /// Pattern used to extract the version; the first capture group is the version
    #[arg(long, default_value = DEFAULT_VERSION_PATTERN)]
    pub version_regex: String,

    /// Format of the git tag; [*] is replaced with the version
    #[arg(long, default_value = "v[*]")]
    pub tag_format: String,

    /// Create and push a git tag for the release
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub tag_commit: bool,

    /// API key used to push to the registry
    #[arg(long, env = "NUGET_KEY", hide_env_values = true)]
    pub nuget_key: String,

    /// Push a symbol package along with the package
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub include_symbols: bool,

    /// Fail the run when build, pack or push fails
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub fail_on_build_error: bool,

    /// Keep going when the registry version check fails
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub continue_on_query_failure: bool,

    /// Base URL of the flat-container version listing
    #[arg(long, default_value = NUGET_FLAT_CONTAINER_URL)]
    pub registry_url: String,

    /// Source passed to `dotnet nuget push -s`
    #[arg(long, default_value = NUGET_PUSH_SOURCE)]
    pub push_source: String,

    /// Directory packages are written to [default: <temp>/publish-nuget]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Kill any external command running longer than this
    #[arg(long, value_name = "SECONDS")]
    pub command_timeout: Option<u64>,
}

impl Args {
    /// Parse command line arguments, leaving the exit to the caller
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingArgument {
                argument: "name".to_string(),
            });
        }

        if self.nuget_key.trim().is_empty() {
            return Err(ValidationError::MissingArgument {
                argument: "nuget-key".to_string(),
            });
        }

        TagFormat::parse(&self.tag_format)?;
        compile_version_pattern(&self.version_regex)?;

        Ok(())
    }

    /// Timeout applied to external commands
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout.map(Duration::from_secs)
    }
}

impl TryFrom<&Args> for ReleaseConfig {
    type Error = ValidationError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        args.validate()?;

        Ok(Self {
            package_name: args.name.trim().to_string(),
            project_file: args.project_file_path.clone(),
            version_file: args
                .version_file_path
                .as_deref()
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            version_pattern: compile_version_pattern(&args.version_regex)?,
            tag_format: TagFormat::parse(&args.tag_format)?,
            tag_commit: args.tag_commit,
            include_symbols: args.include_symbols,
            fail_on_build_error: args.fail_on_build_error,
            continue_on_query_failure: args.continue_on_query_failure,
            nuget_key: args.nuget_key.clone(),
            push_source: args.push_source.clone(),
            output_dir: args.output_dir.clone().unwrap_or_else(default_output_dir),
        })
    }
}
