//! Move command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;

use statekit_core::{BackupPolicy, MoveRequest, Settings, run_move};
use statekit_fs::NormalizedPath;

use super::resolve;
use crate::error::Result;

/// Flags of the `mv` command
#[derive(Debug, Clone, Default)]
pub struct MvOptions {
    pub state: Option<PathBuf>,
    pub state_out: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub backup_out: Option<PathBuf>,
    pub no_backup: bool,
}

/// Build the move request, with flags taking precedence over `statekit.toml`.
fn build_request(
    cwd: &Path,
    source: &str,
    destination: &str,
    options: &MvOptions,
) -> Result<MoveRequest> {
    let root = NormalizedPath::new(cwd);
    let settings = Settings::load(&root)?;

    let state_path = match &options.state {
        Some(path) => resolve(cwd, path),
        None => settings.state_path(&root),
    };
    let policy = |explicit: &Option<PathBuf>| {
        if options.no_backup {
            BackupPolicy::Disabled
        } else if let Some(path) = explicit {
            BackupPolicy::Explicit(resolve(cwd, path))
        } else {
            settings.backup_policy()
        }
    };

    let mut request = MoveRequest::new(source, destination, state_path)
        .with_backup(policy(&options.backup))
        .with_backup_out(policy(&options.backup_out));
    if let Some(out) = &options.state_out {
        request = request.with_state_out(resolve(cwd, out));
    }
    Ok(request)
}

/// Run the mv command
///
/// Moves `source` to `destination` and reports each relocated instance.
pub fn run_mv(cwd: &Path, source: &str, destination: &str, options: &MvOptions) -> Result<()> {
    let request = build_request(cwd, source, destination, options)?;
    tracing::debug!(?request, "running move");

    let outcome = run_move(&request)?;
    let report = &outcome.report;

    if report.noop {
        println!("Nothing to move: source and destination are the same.");
    } else {
        for relocation in &report.relocations {
            println!(
                "Move {} to {}",
                format!("\"{}\"", relocation.from).cyan(),
                format!("\"{}\"", relocation.to).cyan()
            );
        }
    }

    for renumbered in &report.renumbered {
        println!(
            "   {} {} is now {}",
            "~".yellow(),
            renumbered.from.to_string().dimmed(),
            renumbered.to
        );
    }

    for dangling in &report.dangling_dependencies {
        eprintln!(
            "{}: {} still depends on {}, which was moved; update its dependencies manually.",
            "warning".yellow().bold(),
            dangling.instance,
            dangling.dependency
        );
    }

    for backup in &outcome.backups {
        println!("{} {}", "Backup written to".dimmed(), backup.path);
    }

    if !report.noop {
        println!(
            "{} Successfully moved {} object(s).",
            "OK".green().bold(),
            report.moved()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flags_default_to_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("statekit.toml"),
            "[state]\npath = \"prod.tfstate\"\n[backup]\nenabled = false\n",
        )
        .unwrap();

        let request =
            build_request(dir.path(), "a.b", "a.c", &MvOptions::default()).unwrap();

        assert_eq!(
            request.state_path,
            NormalizedPath::new(dir.path()).join("prod.tfstate")
        );
        assert_eq!(request.backup, BackupPolicy::Disabled);
        assert_eq!(request.state_out, None);
    }

    #[test]
    fn flags_override_settings() {
        let dir = TempDir::new().unwrap();
        let options = MvOptions {
            state: Some(PathBuf::from("in.tfstate")),
            state_out: Some(PathBuf::from("out.tfstate")),
            backup: Some(PathBuf::from("in.bak")),
            backup_out: None,
            no_backup: false,
        };

        let request = build_request(dir.path(), "a.b", "a.c", &options).unwrap();

        assert_eq!(request.state_path, NormalizedPath::new(dir.path().join("in.tfstate")));
        assert_eq!(
            request.state_out,
            Some(NormalizedPath::new(dir.path().join("out.tfstate")))
        );
        assert_eq!(
            request.backup,
            BackupPolicy::Explicit(NormalizedPath::new(dir.path().join("in.bak")))
        );
        assert_eq!(request.backup_out, BackupPolicy::default());
    }

    #[test]
    fn no_backup_disables_both() {
        let dir = TempDir::new().unwrap();
        let options = MvOptions {
            no_backup: true,
            ..MvOptions::default()
        };

        let request = build_request(dir.path(), "a.b", "a.c", &options).unwrap();

        assert_eq!(request.backup, BackupPolicy::Disabled);
        assert_eq!(request.backup_out, BackupPolicy::Disabled);
    }
}
