use crate::error::{ContribError, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub shell: PathBuf,
    pub git: PathBuf,
}

impl ExternalTool {
    pub fn new(shell: impl Into<PathBuf>, git: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            git: git.into(),
        }
    }

    pub fn locate(shell: Option<&Path>, git: Option<&Path>) -> Result<Self> {
        let shell = resolve(shell, "sh")?;
        let git = resolve(git, "git")?;
        debug!("Using shell {} and git {}", shell.display(), git.display());
        Ok(Self { shell, git })
    }
}

fn resolve(explicit: Option<&Path>, default_name: &str) -> Result<PathBuf> {
    let wanted = explicit.unwrap_or_else(|| Path::new(default_name));
    find_executable(wanted).ok_or_else(|| {
        ContribError::ToolNotFound(format!(
            "'{}' not found or not runnable; install it or pass its path explicitly",
            wanted.display()
        ))
    })
}

fn find_executable(name: &Path) -> Option<PathBuf> {
    if name.components().count() > 1 || name.is_absolute() {
        return is_executable(name).then(|| name.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        let with_suffix = dir.join(format!("{}{}", name.display(), env::consts::EXE_SUFFIX));
        is_executable(&with_suffix).then_some(with_suffix)
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn runnable(path: &Path) {
        File::create(path).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no-such-git");
        let err = ExternalTool::locate(None, Some(&missing)).unwrap_err();
        assert!(matches!(err, ContribError::ToolNotFound(_)));
    }

    #[test]
    fn explicit_paths_are_used_verbatim() {
        let dir = tempdir().unwrap();
        let shell = dir.path().join("my-sh");
        let git = dir.path().join("my-git");
        runnable(&shell);
        runnable(&git);

        let tool = ExternalTool::locate(Some(&shell), Some(&git)).unwrap();
        assert_eq!(tool, ExternalTool::new(&shell, &git));
    }

    #[cfg(unix)]
    #[test]
    fn file_without_execute_bit_is_not_a_tool() {
        let dir = tempdir().unwrap();
        let git = dir.path().join("git");
        File::create(&git).unwrap();
        assert!(!is_executable(&git));
        assert!(matches!(
            ExternalTool::locate(None, Some(&git)),
            Err(ContribError::ToolNotFound(_))
        ));

        runnable(&git);
        assert!(is_executable(&git));
        assert!(!is_executable(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn finds_shell_on_path() {
        let dir = tempdir().unwrap();
        let git = dir.path().join("git");
        runnable(&git);
        let tool = ExternalTool::locate(None, Some(&git)).unwrap();
        assert!(tool.shell.ends_with("sh"));
    }
}
