//! Command lines issued by the release pipeline.

use crate::ReleaseConfig;
use crate::process::CommandLine;

/// `dotnet build -c Release "<project>"`
pub fn build(config: &ReleaseConfig) -> CommandLine {
    CommandLine::new("dotnet")
        .args(["build", "-c", "Release"])
        .path(&config.project_file)
}

/// `dotnet pack [--include-symbols -p:SymbolPackageFormat=snupkg] --no-build -c Release "<project>" -o "<output>"`
pub fn pack(config: &ReleaseConfig) -> CommandLine {
    let mut cmd = CommandLine::new("dotnet").arg("pack");
    if config.include_symbols {
        cmd = cmd.args(["--include-symbols", "-p:SymbolPackageFormat=snupkg"]);
    }
    cmd.args(["--no-build", "-c", "Release"])
        .path(&config.project_file)
        .arg("-o")
        .path(&config.output_dir)
}

/// `git tag <tag>`
pub fn git_tag(tag: &str) -> CommandLine {
    CommandLine::new("git").arg("tag").arg(tag)
}

/// `git push origin <tag>`
pub fn git_push_tag(tag: &str) -> CommandLine {
    CommandLine::new("git").args(["push", "origin"]).arg(tag)
}

/// `dotnet nuget push "<output>/*.nupkg" -k <key> -s <source> --skip-duplicate [-n 1]`
///
/// The key only reaches argv; the display form shows a mask.
pub fn push(config: &ReleaseConfig) -> CommandLine {
    let cmd = CommandLine::new("dotnet")
        .args(["nuget", "push"])
        .path(&config.output_dir.join("*.nupkg"))
        .arg("-k")
        .secret(config.nuget_key.as_str())
        .arg("-s")
        .arg(config.push_source.as_str())
        .arg("--skip-duplicate");

    if config.include_symbols {
        cmd
    } else {
        cmd.args(["-n", "1"])
    }
}
