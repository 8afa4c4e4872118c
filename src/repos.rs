use crate::cli::{CommonArgs, RepoCommand};
use crate::error::{ContribError, Result};
use crate::git::GitRepo;
use crate::model::RepositorySelection;
use crate::settings::{load_repositories, save_repositories, ConfigStore, SettingsStore};
use anyhow::Context;
use console::style;
use std::path::Path;
use tracing::info;

pub fn exec(common: &CommonArgs, command: RepoCommand) -> anyhow::Result<()> {
    let mut store = SettingsStore::open(common.settings.as_ref()).context("Failed to open settings")?;

    match command {
        RepoCommand::Add { path } => {
            let repo = GitRepo::open(&path)
                .with_context(|| format!("{} is not a git repository", path.display()))?;
            if add_repository(&mut store, repo.path())? {
                println!("Added {}", repo.path().display());
            } else {
                println!("{} is already listed", repo.path().display());
            }
        }
        RepoCommand::Remove { path } => {
            let removed = remove_repository(&mut store, &path)?;
            println!("Removed {}", removed.path.display());
        }
        RepoCommand::Enable { path } => {
            set_included(&mut store, &path, true)?;
            println!("Enabled {}", path.display());
        }
        RepoCommand::Disable { path } => {
            set_included(&mut store, &path, false)?;
            println!("Disabled {}", path.display());
        }
        RepoCommand::List { json } => {
            let repositories = load_repositories(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&repositories)?);
            } else if repositories.is_empty() {
                println!("No repositories; add one with `gcontrib repo add <PATH>`");
            } else {
                for repo in &repositories {
                    let mark = if repo.included {
                        style("[x]").green()
                    } else {
                        style("[ ]").dim()
                    };
                    println!("{} {}", mark, repo.path.display());
                }
            }
        }
    }

    Ok(())
}

pub fn add_repository(store: &mut dyn ConfigStore, path: &Path) -> Result<bool> {
    let mut repositories = load_repositories(store)?;
    if repositories.iter().any(|r| r.path == path) {
        return Ok(false);
    }
    repositories.push(RepositorySelection::included(path));
    save_repositories(store, &repositories)?;
    info!("Added repository {}", path.display());
    Ok(true)
}

pub fn remove_repository(store: &mut dyn ConfigStore, path: &Path) -> Result<RepositorySelection> {
    let mut repositories = load_repositories(store)?;
    let index = position(&repositories, path)?;
    let removed = repositories.remove(index);
    save_repositories(store, &repositories)?;
    Ok(removed)
}

pub fn set_included(store: &mut dyn ConfigStore, path: &Path, included: bool) -> Result<()> {
    let mut repositories = load_repositories(store)?;
    let index = position(&repositories, path)?;
    repositories[index].included = included;
    save_repositories(store, &repositories)
}

fn position(repositories: &[RepositorySelection], path: &Path) -> Result<usize> {
    let canonical = path.canonicalize().ok();
    repositories
        .iter()
        .position(|r| r.path == path || canonical.as_deref() == Some(r.path.as_path()))
        .ok_or_else(|| ContribError::Config(format!("{} is not in the repository list", path.display())))
}
