//! Release pipeline.
//!
//! Runs the release steps strictly in order, each one finishing before the
//! next starts:
//!
//! resolve inputs → extract version → check registry → build → pack →
//! tag (optional) → push package.
//!
//! Fatal conditions come back as `Err`; everything the run survived is
//! described by the returned [`ReleaseOutcome`].

pub mod commands;

use crate::ReleaseConfig;
use crate::error::{CommandError, RegistryError, Result, ValidationError};
use crate::process::{CommandLine, CommandRunner, LogSink, OutputSink};
use crate::registry::{RegistryLookup, VersionIndex};
use crate::version::extract_version;
use std::fmt;

static LOG_SINK: LogSink = LogSink;

/// Steps whose failure can be tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    /// `dotnet build`
    Build,
    /// `dotnet pack`
    Pack,
    /// `git tag` and `git push origin`
    Tag,
    /// `dotnet nuget push`
    PushPackage,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Pack => "pack",
            Self::Tag => "tag",
            Self::PushPackage => "push",
        };
        f.write_str(name)
    }
}

/// How a release run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The version was already on the registry; nothing was built or pushed
    AlreadyPublished {
        /// Extracted version
        version: String,
    },
    /// All steps ran
    Published {
        /// Extracted version
        version: String,
        /// Formatted release tag
        tag: String,
        /// Whether the tag was created and pushed
        tagged: bool,
        /// Steps that failed but were tolerated
        failed_steps: Vec<ReleaseStep>,
    },
}

impl ReleaseOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Sequences version discovery, the registry check and the external commands.
pub struct ReleasePipeline<'a> {
    config: &'a ReleaseConfig,
    runner: &'a dyn CommandRunner,
    registry: &'a dyn VersionIndex,
    sink: &'a dyn OutputSink,
}

impl<'a> ReleasePipeline<'a> {
    /// Pipeline logging command output through `log`
    pub fn new(
        config: &'a ReleaseConfig,
        runner: &'a dyn CommandRunner,
        registry: &'a dyn VersionIndex,
    ) -> Self {
        Self {
            config,
            runner,
            registry,
            sink: &LOG_SINK,
        }
    }

    /// Run the release to completion
    pub async fn run(&self) -> Result<ReleaseOutcome> {
        let config = self.config;
        let name = &config.package_name;

        // ===== RESOLVE INPUTS =====
        let project_found = tokio::fs::metadata(&config.project_file)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if !project_found {
            return Err(ValidationError::ProjectFileMissing {
                path: config.project_file.clone(),
            }
            .into());
        }
        log::info!(
            "Project '{}' found at '{}'.",
            name,
            config.project_file.display()
        );

        // ===== EXTRACT VERSION =====
        let version = extract_version(config.version_file_path(), &config.version_pattern).await?;
        let tag = config.tag_format.apply(&version);
        log::info!("Extracted version: '{}' (tag '{}')", version, tag);

        // ===== CHECK REGISTRY =====
        match self.registry.lookup(name, &version).await {
            RegistryLookup::VersionExists => {
                log::info!(
                    "The version '{}' of {} already exists, nothing to publish.",
                    version,
                    name
                );
                return Ok(ReleaseOutcome::AlreadyPublished { version });
            }
            RegistryLookup::VersionAbsentPackageKnown => {
                log::info!("The version '{}' does not exist, continuing...", version);
            }
            RegistryLookup::VersionAbsentPackageUnknown => {
                log::info!("This is the first version '{}', continuing...", version);
            }
            RegistryLookup::QueryFailed { status, body } => {
                match status {
                    Some(code) => log::error!("Invalid status code {}: {}", code, body),
                    None => log::error!("Version query failed: {}", body),
                }
                if !config.continue_on_query_failure {
                    return Err(RegistryError::QueryFailed { status, body }.into());
                }
                log::warn!("Could not verify version '{}', continuing...", version);
            }
        }

        let mut failed_steps = Vec::new();

        // ===== BUILD =====
        log::info!("Building package {}...", name);
        self.gated_step(ReleaseStep::Build, &commands::build(config), &mut failed_steps)
            .await?;
        log::info!("Built package {}.", name);

        // ===== PACK =====
        log::info!("Packing package {}...", name);
        tokio::fs::create_dir_all(&config.output_dir).await?;
        log::info!("Output directory: {}", config.output_dir.display());
        self.gated_step(ReleaseStep::Pack, &commands::pack(config), &mut failed_steps)
            .await?;
        log::info!("Packed package {}.", name);

        // ===== TAG =====
        let tagged = if config.tag_commit {
            let tagged = self.tag_and_push(&tag).await;
            if !tagged {
                failed_steps.push(ReleaseStep::Tag);
            }
            tagged
        } else {
            false
        };

        // ===== PUSH PACKAGE =====
        log::info!("Pushing package {}...", name);
        self.gated_step(
            ReleaseStep::PushPackage,
            &commands::push(config),
            &mut failed_steps,
        )
        .await?;
        log::info!("Pushed package {}.", name);

        if failed_steps.is_empty() {
            log::info!("Finished.");
        } else {
            let steps: Vec<String> = failed_steps.iter().map(ToString::to_string).collect();
            log::warn!("Finished with failed steps: {}", steps.join(", "));
        }

        Ok(ReleaseOutcome::Published {
            version,
            tag,
            tagged,
            failed_steps,
        })
    }

    /// Run a step whose failure is fatal only when `fail_on_build_error` is set
    async fn gated_step(
        &self,
        step: ReleaseStep,
        command: &CommandLine,
        failed_steps: &mut Vec<ReleaseStep>,
    ) -> Result<()> {
        let Err(e) = self.execute(command).await else {
            return Ok(());
        };

        log::error!("The {} step failed: {}", step, e);
        if self.config.fail_on_build_error {
            return Err(e.into());
        }

        log::warn!("Continuing because fail-on-build-error is disabled");
        failed_steps.push(step);
        Ok(())
    }

    /// Create and push the release tag; failures are logged, never fatal
    async fn tag_and_push(&self, tag: &str) -> bool {
        log::info!("Creating tag '{}'.", tag);

        let result = match self.execute(&commands::git_tag(tag)).await {
            Ok(()) => self.execute(&commands::git_push_tag(tag)).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                log::info!("Tag '{}' created.", tag);
                true
            }
            Err(e) => {
                log::error!("Tag '{}' could not be created: {}", tag, e);
                false
            }
        }
    }

    async fn execute(&self, command: &CommandLine) -> std::result::Result<(), CommandError> {
        let result = self.runner.run(command, self.sink).await?;
        if result.success {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command: command.display().to_string(),
                exit_code: result.exit_code,
            })
        }
    }
}
