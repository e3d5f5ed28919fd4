//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// statekit - Move and inspect resources in infrastructure state files
#[derive(Parser, Debug)]
#[command(name = "statekit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Move an item in the state
    ///
    /// Moves a single resource instance, a whole resource or a module subtree
    /// to a new address, in the same state file or into another one.
    ///
    /// Examples:
    ///   statekit mv test_instance.foo test_instance.bar
    ///   statekit mv 'test_instance.foo[0]' 'test_instance.foo["a"]'
    ///   statekit mv module.app module.web
    ///   statekit mv --state-out other.tfstate test_instance.foo test_instance.foo
    Mv {
        /// State file to read from (defaults to the configured state path)
        #[arg(long, value_name = "PATH")]
        state: Option<PathBuf>,

        /// State file to write the moved items into (defaults to --state)
        #[arg(long, value_name = "PATH")]
        state_out: Option<PathBuf>,

        /// Path for the backup of the source state
        #[arg(long, value_name = "PATH", conflicts_with = "no_backup")]
        backup: Option<PathBuf>,

        /// Path for the backup of the --state-out state
        #[arg(
            long,
            value_name = "PATH",
            conflicts_with = "no_backup",
            requires = "state_out"
        )]
        backup_out: Option<PathBuf>,

        /// Do not write any backups
        #[arg(long)]
        no_backup: bool,

        /// Address to move from
        source: String,

        /// Address to move to
        destination: String,
    },

    /// List resource instances in the state
    ///
    /// Examples:
    ///   statekit list
    ///   statekit list module.app
    ///   statekit list --state prod.tfstate test_instance.foo
    List {
        /// State file to read (defaults to the configured state path)
        #[arg(long, value_name = "PATH")]
        state: Option<PathBuf>,

        /// Only list instances under this module, resource or instance address
        filter: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["statekit"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_mv_positional_addresses() {
        let cli = Cli::parse_from(["statekit", "mv", "test_instance.foo", "test_instance.bar"]);
        assert_eq!(
            cli.command,
            Some(Commands::Mv {
                state: None,
                state_out: None,
                backup: None,
                backup_out: None,
                no_backup: false,
                source: "test_instance.foo".to_string(),
                destination: "test_instance.bar".to_string(),
            })
        );
    }

    #[test]
    fn parse_mv_with_paths() {
        let cli = Cli::parse_from([
            "statekit",
            "-v",
            "mv",
            "--state",
            "in.tfstate",
            "--state-out",
            "out.tfstate",
            "--backup-out",
            "out.bak",
            "module.foo",
            "module.bar",
        ]);
        assert!(cli.verbose);
        let Some(Commands::Mv {
            state,
            state_out,
            backup_out,
            ..
        }) = cli.command
        else {
            panic!("expected mv");
        };
        assert_eq!(state, Some(PathBuf::from("in.tfstate")));
        assert_eq!(state_out, Some(PathBuf::from("out.tfstate")));
        assert_eq!(backup_out, Some(PathBuf::from("out.bak")));
    }

    #[test]
    fn backup_conflicts_with_no_backup() {
        let result = Cli::try_parse_from([
            "statekit",
            "mv",
            "--backup",
            "b",
            "--no-backup",
            "test_instance.foo",
            "test_instance.bar",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn backup_out_requires_state_out() {
        let result = Cli::try_parse_from([
            "statekit",
            "mv",
            "--backup-out",
            "b",
            "test_instance.foo",
            "test_instance.bar",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_list_with_filter() {
        let cli = Cli::parse_from(["statekit", "list", "module.app"]);
        assert_eq!(
            cli.command,
            Some(Commands::List {
                state: None,
                filter: Some("module.app".to_string()),
            })
        );
    }
}
