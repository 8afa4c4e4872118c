use crate::error::{ContribError, Result};
use gix::discover;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let requested = path.as_ref();
        let canonical = requested.canonicalize().map_err(|e| {
            ContribError::Config(format!("{}: {e}", requested.display()))
        })?;

        let repo = discover(&canonical)?;
        let workdir = repo.workdir().ok_or_else(|| {
            ContribError::Config(format!(
                "{} is a bare repository without a working tree",
                requested.display()
            ))
        })?;
        let path = workdir.canonicalize()?;

        if path != canonical {
            info!(
                "{} is inside {}; using the working tree root",
                canonical.display(),
                path.display()
            );
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::tempdir;

    fn has_git() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    #[test]
    fn plain_directory_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(GitRepo::open(dir.path()).is_err());
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            GitRepo::open(dir.path().join("nope")),
            Err(ContribError::Config(_))
        ));
    }

    #[test]
    fn subdirectory_resolves_to_worktree_root() {
        if !has_git() {
            return;
        }
        let dir = tempdir().unwrap();
        assert!(Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .status()
            .unwrap()
            .success());
        let nested = dir.path().join("src/nested");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = GitRepo::open(&nested).unwrap();
        assert_eq!(repo.path(), dir.path().canonicalize().unwrap());
    }
}
