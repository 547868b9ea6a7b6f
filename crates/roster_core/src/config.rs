//! Store and sync configuration.
//!
//! # Responsibility
//! - Hold the database location and remote endpoint used by the core.
//! - Apply environment overrides on top of built-in defaults.
//!
//! # Invariants
//! - `db_path()` always points at a file inside `data_dir` unless
//!   `ROSTER_DB_PATH` names a file explicitly.

use std::path::{Path, PathBuf};

/// Default database file name (the persisted model's schema name).
pub const DEFAULT_DB_FILE_NAME: &str = "CoreDataDemoModel.sqlite3";
/// Remote ToDo collection endpoint.
pub const TODO_URL: &str = "https://jsonplaceholder.typicode.com/todos";

/// Env var overriding the full database file path.
pub const DB_PATH_ENV: &str = "ROSTER_DB_PATH";
/// Env var overriding the ToDo endpoint.
pub const TODO_URL_ENV: &str = "ROSTER_TODO_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub todo_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::temp_dir(),
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            todo_url: TODO_URL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at `data_dir` with default file name and endpoint.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `ROSTER_DB_PATH` / `ROSTER_TODO_URL`.
    ///
    /// Blank values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            non_blank_env(DB_PATH_ENV),
            non_blank_env(TODO_URL_ENV),
        )
    }

    fn with_overrides(mut self, db_path: Option<String>, todo_url: Option<String>) -> Self {
        if let Some(raw) = db_path {
            let path = PathBuf::from(raw);
            if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
                self.data_dir = dir.to_path_buf();
                self.db_file_name = name.to_string_lossy().into_owned();
            }
        }
        if let Some(url) = todo_url {
            self.todo_url = url;
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DEFAULT_DB_FILE_NAME, TODO_URL};
    use std::path::PathBuf;

    #[test]
    fn in_dir_uses_default_file_name() {
        let config = StoreConfig::in_dir("/data/roster");
        assert_eq!(
            config.db_path(),
            PathBuf::from("/data/roster").join(DEFAULT_DB_FILE_NAME)
        );
        assert_eq!(config.todo_url, TODO_URL);
    }

    #[test]
    fn overrides_split_db_path_and_replace_url() {
        let config = StoreConfig::default().with_overrides(
            Some("/var/app/custom.db".to_string()),
            Some("http://127.0.0.1:9/todos".to_string()),
        );
        assert_eq!(config.data_dir, PathBuf::from("/var/app"));
        assert_eq!(config.db_file_name, "custom.db");
        assert_eq!(config.db_path(), PathBuf::from("/var/app/custom.db"));
        assert_eq!(config.todo_url, "http://127.0.0.1:9/todos");
    }
}
