//! Command line interface for publish_nuget.
//!
//! Parses arguments into a [`ReleaseConfig`](crate::ReleaseConfig), wires the
//! real process runner and registry client into the pipeline, and turns the
//! result into a process exit code.

mod args;
pub mod commands;

pub use args::Args;
pub use commands::execute_command;

/// Main CLI entry point
///
/// `--help` and `--version` exit with 0; any other argument error exits with 1.
pub async fn run() -> i32 {
    let args = match Args::parse_args() {
        Ok(args) => args,
        Err(e) => {
            if let Err(print_err) = e.print() {
                log::error!("{}", print_err);
            }
            return if e.use_stderr() { 1 } else { 0 };
        }
    };
    execute_command(args).await
}
