use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gcontrib")]
#[command(about = "Per-author lines added, removed and net across many git repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(long, global = true, env = "GCONTRIB_SETTINGS", help = "Directory holding settings.db (default: ./.gcontrib)")]
    pub settings: Option<PathBuf>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "More logging (-vv prints every query and result)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Only log errors")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute contribution statistics
    Run(RunArgs),
    /// Manage the saved repository list
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[arg(long = "repo", value_name = "PATH", help = "Repository to include (repeatable); replaces the saved list for this run")]
    pub repos: Vec<PathBuf>,

    #[arg(long, value_name = "SPEC", help = "Author groups: comma-separated groups of space-separated aliases")]
    pub authors: Option<String>,

    #[arg(long, value_name = "DATE", help = "Start of the window (YYYY-MM-DD)")]
    pub since: Option<String>,

    #[arg(long, value_name = "DATE", help = "End of the window (YYYY-MM-DD, blank for today)")]
    pub until: Option<String>,

    #[arg(long = "exclude", value_name = "GLOB", help = "Path glob to leave out (repeatable); pass \"\" to clear the saved list")]
    pub exclusions: Vec<String>,

    #[arg(long = "flag", value_name = "LINE", allow_hyphen_values = true, help = "Extra git log flags, passed verbatim (repeatable)")]
    pub flags: Vec<String>,

    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, help = "How long to wait for one query")]
    pub timeout: Duration,

    #[arg(long, default_value_t = 1, help = "Queries to run at once")]
    pub jobs: usize,

    #[arg(long, env = "GCONTRIB_GIT", help = "Path to the git executable")]
    pub git: Option<PathBuf>,

    #[arg(long, env = "GCONTRIB_SHELL", help = "Path to the POSIX shell running the query")]
    pub shell: Option<PathBuf>,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, conflicts_with = "json", help = "Output as NDJSON")]
    pub ndjson: bool,

    #[arg(long, help = "Do not remember the arguments of this run")]
    pub no_save: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum RepoCommand {
    /// Add a git working tree (checked)
    Add { path: PathBuf },
    /// Remove a repository from the list
    Remove { path: PathBuf },
    /// Show the saved repositories
    List {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Include a repository in runs
    Enable { path: PathBuf },
    /// Keep a repository in the list but leave it out of runs
    Disable { path: PathBuf },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => crate::stats::exec(&self.common, args).await,
            Commands::Repo { command } => crate::repos::exec(&self.common, command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_arguments() {
        let cli = <Cli as Parser>::try_parse_from([
            "gcontrib",
            "--settings",
            "/tmp/s",
            "run",
            "--repo",
            "a",
            "--repo",
            "b",
            "--authors",
            "alice al, bob",
            "--flag",
            "--no-merges",
            "--timeout",
            "2m",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.common.settings, Some(PathBuf::from("/tmp/s")));
        assert_eq!(cli.common.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.repos, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(args.authors.as_deref(), Some("alice al, bob"));
                assert_eq!(args.flags, vec!["--no-merges"]);
                assert_eq!(args.timeout, Duration::from_secs(120));
                assert_eq!(args.jobs, 1);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn json_and_ndjson_conflict() {
        assert!(<Cli as Parser>::try_parse_from(["gcontrib", "run", "--json", "--ndjson"]).is_err());
    }
}
