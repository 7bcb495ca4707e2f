use async_trait::async_trait;
use publish_nuget::error::{CommandError, ExtractionError, ReleaseError, ValidationError};
use publish_nuget::{
    CommandLine, CommandResult, CommandRunner, OutputSink, RegistryLookup, ReleaseConfig,
    ReleaseOutcome, ReleasePipeline, ReleaseStep, TagFormat, VersionIndex,
};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Records every command and fails those whose display starts with a listed prefix.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<CommandLine>>,
    failing: Vec<&'static str>,
    unstartable: Vec<&'static str>,
}

impl RecordingRunner {
    fn failing(prefixes: &[&'static str]) -> Self {
        Self {
            failing: prefixes.to_vec(),
            ..Default::default()
        }
    }

    fn displays(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|cmd| cmd.display().to_string())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        command: &CommandLine,
        _sink: &dyn OutputSink,
    ) -> Result<CommandResult, CommandError> {
        self.calls.lock().unwrap().push(command.clone());

        if self.unstartable.iter().any(|p| command.display().starts_with(p)) {
            return Err(CommandError::SpawnFailed {
                command: command.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let stderr = if self.failing.iter().any(|p| command.display().starts_with(p)) {
            vec!["error MSB1009: Project file does not exist.".to_string()]
        } else {
            vec![]
        };
        Ok(CommandResult::classify(Some(0), vec![], stderr))
    }
}

struct FixedIndex {
    lookup: RegistryLookup,
    queries: Mutex<Vec<(String, String)>>,
}

impl FixedIndex {
    fn new(lookup: RegistryLookup) -> Self {
        Self {
            lookup,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VersionIndex for FixedIndex {
    async fn lookup(&self, package: &str, version: &str) -> RegistryLookup {
        self.queries
            .lock()
            .unwrap()
            .push((package.to_string(), version.to_string()));
        self.lookup.clone()
    }
}

struct Fixture {
    dir: TempDir,
    config: ReleaseConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let project = dir.path().join("Venflow.csproj");
    std::fs::write(
        &project,
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <Version>1.2.3</Version>\n  </PropertyGroup>\n</Project>\n",
    )
    .expect("write project");

    let mut config = ReleaseConfig::new("Venflow", project, "oy2-secret-key");
    config.output_dir = dir.path().join("out");
    Fixture { dir, config }
}

fn starts(displays: &[String], prefix: &str) -> bool {
    displays.iter().any(|d| d.starts_with(prefix))
}

#[tokio::test]
async fn test_full_release_runs_every_step_in_order() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let outcome = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    assert_eq!(
        outcome,
        ReleaseOutcome::Published {
            version: "1.2.3".to_string(),
            tag: "v1.2.3".to_string(),
            tagged: true,
            failed_steps: vec![],
        }
    );
    assert_eq!(outcome.exit_code(), 0);

    let displays = runner.displays();
    let programs: Vec<&str> = displays
        .iter()
        .map(|d| d.splitn(3, ' ').take(2).last().unwrap_or_default())
        .collect();
    assert_eq!(programs, ["build", "pack", "tag", "push", "nuget"]);
    assert_eq!(displays[2], "git tag v1.2.3");
    assert_eq!(displays[3], "git push origin v1.2.3");
    assert!(fx.config.output_dir.is_dir());
}

#[tokio::test]
async fn test_registry_checked_with_raw_version() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    let queries = index.queries.lock().unwrap().clone();
    assert_eq!(queries, [("Venflow".to_string(), "1.2.3".to_string())]);
}

#[tokio::test]
async fn test_published_version_is_a_no_op() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionExists);

    for _ in 0..2 {
        let outcome = ReleasePipeline::new(&fx.config, &runner, &index)
            .run()
            .await
            .expect("no-op succeeds");
        assert_eq!(
            outcome,
            ReleaseOutcome::AlreadyPublished {
                version: "1.2.3".to_string()
            }
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    assert!(runner.displays().is_empty());
    assert!(!fx.config.output_dir.exists());
}

#[tokio::test]
async fn test_new_package_continues_to_build() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageUnknown);

    ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    assert!(starts(&runner.displays(), "dotnet build"));
}

#[tokio::test]
async fn test_query_failure_continues_by_default() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::QueryFailed {
        status: Some(500),
        body: "Internal Server Error".to_string(),
    });

    let outcome = ReleasePipeline::new(&fx.config, &runner, &index).run().await;

    assert!(matches!(outcome, Ok(ReleaseOutcome::Published { .. })));
    assert!(starts(&runner.displays(), "dotnet nuget push"));
}

#[tokio::test]
async fn test_query_failure_aborts_when_configured() {
    let mut fx = fixture();
    fx.config.continue_on_query_failure = false;
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::QueryFailed {
        status: Some(404),
        body: "Not Found".to_string(),
    });

    let err = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ReleaseError::Registry(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(runner.displays().is_empty());
}

#[tokio::test]
async fn test_build_failure_is_fatal_by_default() {
    let fx = fixture();
    let runner = RecordingRunner::failing(&["dotnet build"]);
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let err = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Command(CommandError::Failed {
            exit_code: Some(0),
            ..
        })
    ));
    assert_eq!(runner.displays().len(), 1);
}

#[tokio::test]
async fn test_build_failure_tolerated_reaches_pack() {
    let mut fx = fixture();
    fx.config.fail_on_build_error = false;
    let runner = RecordingRunner::failing(&["dotnet build"]);
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let outcome = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release continues");

    assert!(starts(&runner.displays(), "dotnet pack"));
    match outcome {
        ReleaseOutcome::Published { failed_steps, .. } => {
            assert_eq!(failed_steps, [ReleaseStep::Build]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_pack_failure_is_fatal() {
    let fx = fixture();
    let runner = RecordingRunner::failing(&["dotnet pack"]);
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let result = ReleasePipeline::new(&fx.config, &runner, &index).run().await;

    assert!(matches!(result, Err(ReleaseError::Command(_))));
    assert!(!starts(&runner.displays(), "git"));
    assert!(!starts(&runner.displays(), "dotnet nuget push"));
}

#[tokio::test]
async fn test_push_failure_is_fatal() {
    let fx = fixture();
    let runner = RecordingRunner::failing(&["dotnet nuget push"]);
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let result = ReleasePipeline::new(&fx.config, &runner, &index).run().await;

    assert!(matches!(result, Err(ReleaseError::Command(_))));
}

#[tokio::test]
async fn test_tag_failure_is_never_fatal() {
    let fx = fixture();
    let runner = RecordingRunner::failing(&["git tag"]);
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let outcome = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("tag failure tolerated");

    let displays = runner.displays();
    assert!(!starts(&displays, "git push"));
    assert!(starts(&displays, "dotnet nuget push"));
    match outcome {
        ReleaseOutcome::Published {
            tagged,
            failed_steps,
            ..
        } => {
            assert!(!tagged);
            assert_eq!(failed_steps, [ReleaseStep::Tag]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_tagging_disabled() {
    let mut fx = fixture();
    fx.config.tag_commit = false;
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    assert!(!starts(&runner.displays(), "git"));
}

#[tokio::test]
async fn test_custom_tag_format() {
    let mut fx = fixture();
    fx.config.tag_format = TagFormat::parse("rel-[*]").expect("valid format");
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    assert!(runner.displays().contains(&"git tag rel-1.2.3".to_string()));
}

#[tokio::test]
async fn test_push_masks_key_but_executes_it() {
    let fx = fixture();
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    let calls = runner.calls.lock().unwrap();
    let push = calls.last().expect("push command");
    assert!(push.display().contains("-k ***"));
    assert!(!push.display().contains("oy2-secret-key"));
    assert!(push.argv().iter().any(|arg| arg == "oy2-secret-key"));
}

#[tokio::test]
async fn test_unstartable_build_follows_step_policy() {
    let fx = fixture();
    let runner = RecordingRunner {
        unstartable: vec!["dotnet build"],
        ..Default::default()
    };
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let err = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Command(CommandError::SpawnFailed { .. })
    ));
}

#[tokio::test]
async fn test_missing_project_file_fails_before_any_effect() {
    let mut fx = fixture();
    fx.config.project_file = fx.dir.path().join("Missing.csproj");
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let err = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Validation(ValidationError::ProjectFileMissing { .. })
    ));
    assert!(index.queries.lock().unwrap().is_empty());
    assert!(runner.displays().is_empty());
}

#[tokio::test]
async fn test_version_file_without_match_is_fatal() {
    let mut fx = fixture();
    let props = fx.dir.path().join("Directory.Build.props");
    std::fs::write(&props, "<Project></Project>").expect("write props");
    fx.config.version_file = Some(props);
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let err = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Extraction(ExtractionError::NoMatch { .. })
    ));
    assert!(index.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_separate_version_file() {
    let mut fx = fixture();
    let props = fx.dir.path().join("Directory.Build.props");
    std::fs::write(&props, "<Project><PropertyGroup><Version>3.1.0</Version></PropertyGroup></Project>")
        .expect("write props");
    fx.config.version_file = Some(props);
    let runner = RecordingRunner::default();
    let index = FixedIndex::new(RegistryLookup::VersionAbsentPackageKnown);

    let outcome = ReleasePipeline::new(&fx.config, &runner, &index)
        .run()
        .await
        .expect("release succeeds");

    assert!(matches!(
        outcome,
        ReleaseOutcome::Published { ref tag, .. } if tag == "v3.1.0"
    ));
    assert!(Path::new(&fx.config.output_dir).is_dir());
}
