//! Release command execution.

use super::report_failure;
use crate::pipeline::ReleasePipeline;
use crate::process::CommandRunner;
use crate::registry::VersionIndex;
use crate::ReleaseConfig;

/// Run the release pipeline and return the process exit code
pub async fn execute_release(
    config: &ReleaseConfig,
    runner: &dyn CommandRunner,
    registry: &dyn VersionIndex,
) -> i32 {
    match ReleasePipeline::new(config, runner, registry).run().await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            report_failure(&e);
            e.exit_code()
        }
    }
}
