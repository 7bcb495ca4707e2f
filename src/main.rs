//! Publish NuGet - release a NuGet package from CI.
//!
//! Skips the release when the version is already on the registry, otherwise
//! builds, packs, tags and pushes the package.

use publish_nuget::cli;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Parsing arguments...");
    let exit_code = cli::run().await;

    process::exit(exit_code);
}
