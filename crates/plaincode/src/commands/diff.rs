//! `plaincode diff`: report changes since the last run.

use anyhow::Context;
use clap::Args;
use plaincode_tracker::Session;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::project::ProjectConfig;

/// Arguments for the diff command.
#[derive(Debug, Clone, Default, Args)]
pub struct DiffArgs {
    /// Project root (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Report changes without recording them
    #[arg(long)]
    pub dry_run: bool,

    /// Unchanged lines shown around each change
    #[arg(long, short = 'C')]
    pub context: Option<usize>,
}

/// Scan the project, print the report, then commit (or discard on dry run).
pub async fn handle_diff(root: &Path, args: &DiffArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let project = ProjectConfig::load(root)?;
    let patterns = project.patterns(root)?;

    let mut config = project.tracker;
    if let Some(context) = args.context {
        config.context_lines = context;
    }
    let context_lines = config.context_lines;

    let mut session = Session::new(root, patterns, config)
        .with_context(|| format!("Failed to open project {}", root.display()))?;

    let report = session.begin().await.context("Failed to scan project")?;
    if args.json {
        writeln!(out, "{}", report.to_json()?)?;
    } else {
        writeln!(out, "{}", report.render(context_lines))?;
    }

    if args.dry_run {
        session.discard()?;
        info!(root = %root.display(), "Dry run, state not updated");
    } else {
        let revision = session
            .commit()
            .await
            .context("Failed to save tracking state")?;
        info!(root = %root.display(), revision, "State updated");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaincode_test_utils::TestProject;

    async fn run(root: &Path, args: &DiffArgs) -> String {
        let mut out = Vec::new();
        handle_diff(root, args, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_then_no_changes() {
        let project = TestProject::new().with_file("main.py", "print(1)\n").build();
        let args = DiffArgs::default();

        let first = run(project.path(), &args).await;
        assert!(first.starts_with("First run - establishing baseline"));

        let second = run(project.path(), &args).await;
        assert_eq!(second, "No changes\n");
    }

    #[tokio::test]
    async fn test_dry_run_keeps_reporting_changes() {
        let project = TestProject::new().with_file("main.py", "print(1)\n").build();
        run(project.path(), &DiffArgs::default()).await;

        project.write_file("main.py", "print(2)\n");
        let dry = DiffArgs {
            dry_run: true,
            ..Default::default()
        };
        let first = run(project.path(), &dry).await;
        let second = run(project.path(), &dry).await;

        assert!(first.contains("~ main.py"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ignore_files_are_applied() {
        let project = TestProject::new()
            .with_gitignore("*.log\n")
            .with_ignore_file("drafts/\n")
            .with_file("main.py", "x\n")
            .with_file("run.log", "noise\n")
            .with_file("drafts/idea.txt", "maybe\n")
            .build();

        let args = DiffArgs {
            json: true,
            ..Default::default()
        };
        let output = run(project.path(), &args).await;
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        let paths: Vec<&str> = json["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec![".gitignore", ".plaincodeignore", "main.py"]);
    }

    #[tokio::test]
    async fn test_context_flag_overrides_config() {
        let project = TestProject::new()
            .with_config(r#"{"contextLines": 0}"#)
            .with_file("f.txt", "a\nb\nc\n")
            .build();
        run(project.path(), &DiffArgs::default()).await;

        project.write_file("f.txt", "a\nB\nc\n");
        let output = run(
            project.path(),
            &DiffArgs {
                context: Some(1),
                ..Default::default()
            },
        )
        .await;

        assert!(output.contains("     1  a"));
        assert!(output.contains("-    2  b"));
        assert!(output.contains("+    2  B"));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let mut out = Vec::new();
        let err = handle_diff(Path::new("/no/such/project"), &DiffArgs::default(), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open project"));
    }
}
