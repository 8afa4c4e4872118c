use crate::error::{ContribError, Result};
use crate::model::{RepositorySelection, SCHEMA_VERSION};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const REPOSITORY_COUNT: &str = "repository/count";
pub const FORM_AUTHORS: &str = "form/authors";
pub const FORM_SINCE: &str = "form/since";
pub const FORM_UNTIL: &str = "form/until";
pub const FORM_EXCLUSIONS: &str = "form/exclusions";
pub const FORM_FLAGS: &str = "form/flags";

pub trait ConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Opens `<dir>/settings.db`, defaulting to `./.gcontrib`.
    pub fn open<P: AsRef<Path>>(settings_dir: Option<P>) -> Result<Self> {
        let dir = match settings_dir {
            Some(path) => path.as_ref().to_path_buf(),
            None => PathBuf::from(".gcontrib"),
        };
        std::fs::create_dir_all(&dir)?;
        let conn = Connection::open(dir.join("settings.db"))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        self.check_schema_version()
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(ContribError::Settings(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }
}

impl ConfigStore for SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

fn path_key(index: usize) -> String {
    format!("repository/path_{index}")
}

fn check_key(index: usize) -> String {
    format!("repository/check_{index}")
}

pub fn load_repositories(store: &dyn ConfigStore) -> Result<Vec<RepositorySelection>> {
    let count: usize = store
        .get(REPOSITORY_COUNT)?
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    let mut repositories = Vec::with_capacity(count);
    for index in 0..count {
        let path = store.get(&path_key(index))?.unwrap_or_default();
        if path.trim().is_empty() {
            continue;
        }
        let included = store
            .get(&check_key(index))?
            .map(|v| v == "true")
            .unwrap_or(false);
        repositories.push(RepositorySelection {
            path: PathBuf::from(path),
            included,
        });
    }
    Ok(repositories)
}

pub fn save_repositories(store: &mut dyn ConfigStore, repositories: &[RepositorySelection]) -> Result<()> {
    store.set(REPOSITORY_COUNT, &repositories.len().to_string())?;
    for (index, repository) in repositories.iter().enumerate() {
        store.set(&path_key(index), &repository.path.display().to_string())?;
        store.set(&check_key(index), if repository.included { "true" } else { "false" })?;
    }
    Ok(())
}

pub fn get_list(store: &dyn ConfigStore, key: &str) -> Result<Vec<String>> {
    Ok(store
        .get(key)?
        .map(|v| {
            v.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

pub fn set_list(store: &mut dyn ConfigStore, key: &str, values: &[String]) -> Result<()> {
    store.set(key, &values.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn get_and_set_round_trip() {
        let mut store = SettingsStore::in_memory().unwrap();
        assert_eq!(store.get(FORM_AUTHORS).unwrap(), None);
        store.set(FORM_AUTHORS, "alice, bob").unwrap();
        store.set(FORM_AUTHORS, "carol").unwrap();
        assert_eq!(store.get(FORM_AUTHORS).unwrap().as_deref(), Some("carol"));
    }

    #[test]
    fn repositories_keep_order_and_check_state() {
        let mut store = SettingsStore::in_memory().unwrap();
        let repos = vec![
            RepositorySelection::included("/src/one"),
            RepositorySelection {
                path: PathBuf::from("/src/two"),
                included: false,
            },
        ];
        save_repositories(&mut store, &repos).unwrap();
        assert_eq!(load_repositories(&store).unwrap(), repos);
    }

    #[test]
    fn shrinking_the_list_hides_stale_entries() {
        let mut store = SettingsStore::in_memory().unwrap();
        save_repositories(
            &mut store,
            &[RepositorySelection::included("/a"), RepositorySelection::included("/b")],
        )
        .unwrap();
        save_repositories(&mut store, &[RepositorySelection::included("/b")]).unwrap();
        assert_eq!(
            load_repositories(&store).unwrap(),
            vec![RepositorySelection::included("/b")]
        );
    }

    #[test]
    fn blank_paths_are_skipped_on_restore() {
        let mut store = SettingsStore::in_memory().unwrap();
        store.set(REPOSITORY_COUNT, "3").unwrap();
        store.set("repository/path_0", "/a").unwrap();
        store.set("repository/check_0", "true").unwrap();
        store.set("repository/path_1", "  ").unwrap();
        store.set("repository/path_2", "/c").unwrap();

        let repos = load_repositories(&store).unwrap();
        assert_eq!(
            repos,
            vec![
                RepositorySelection::included("/a"),
                RepositorySelection {
                    path: PathBuf::from("/c"),
                    included: false
                },
            ]
        );
    }

    #[test]
    fn list_fields_drop_blank_lines() {
        let mut store = SettingsStore::in_memory().unwrap();
        set_list(&mut store, FORM_EXCLUSIONS, &["vendor".into(), "docs/*".into()]).unwrap();
        assert_eq!(get_list(&store, FORM_EXCLUSIONS).unwrap(), vec!["vendor", "docs/*"]);
        store.set(FORM_FLAGS, "\n --no-merges \n\n").unwrap();
        assert_eq!(get_list(&store, FORM_FLAGS).unwrap(), vec!["--no-merges"]);
        assert!(get_list(&store, "form/missing").unwrap().is_empty());
    }

    #[test]
    fn settings_persist_on_disk() {
        let dir = tempdir().unwrap();
        {
            let mut store = SettingsStore::open(Some(dir.path())).unwrap();
            store.set(FORM_SINCE, "2024-01-01").unwrap();
        }
        let store = SettingsStore::open(Some(dir.path())).unwrap();
        assert_eq!(store.get(FORM_SINCE).unwrap().as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn rejects_newer_schema() {
        let dir = tempdir().unwrap();
        {
            let conn = Connection::open(dir.path().join("settings.db")).unwrap();
            conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        }
        assert!(matches!(
            SettingsStore::open(Some(dir.path())),
            Err(ContribError::Settings(_))
        ));
    }
}
