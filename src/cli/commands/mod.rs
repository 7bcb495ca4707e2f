//! Command execution coordinating the release run.
//!
//! Builds the configuration, wires the real collaborators, and reports fatal
//! errors on the error log before mapping them to an exit code.

mod release;

pub use release::execute_release;

use crate::cli::Args;
use crate::error::ReleaseError;
use crate::process::ProcessRunner;
use crate::registry::NugetRegistry;
use crate::ReleaseConfig;

/// Execute a release run based on parsed arguments
pub async fn execute_command(args: Args) -> i32 {
    let config = match ReleaseConfig::try_from(&args) {
        Ok(config) => config,
        Err(e) => {
            let e = ReleaseError::from(e);
            report_failure(&e);
            return e.exit_code();
        }
    };
    log::info!("Finished the parsing of the arguments.");

    let runner = ProcessRunner::with_timeout(args.command_timeout());
    let registry = NugetRegistry::new(args.registry_url.as_str());

    execute_release(&config, &runner, &registry).await
}

/// Log a fatal error with its recovery suggestions
pub(crate) fn report_failure(error: &ReleaseError) {
    log::error!("{}", error);

    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        log::error!("Recovery suggestions:");
        for suggestion in suggestions {
            log::error!("  • {}", suggestion);
        }
    }
}
