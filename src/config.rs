//! Runtime configuration: where data lives and who is acting.

use std::path::{Path, PathBuf};

use crate::activity::Author;

/// Environment variable overriding the data directory.
pub const DIR_ENV: &str = "TASKBOARD_DIR";

/// Environment variable overriding the author name.
pub const AUTHOR_ENV: &str = "TASKBOARD_AUTHOR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub author: Author,
}

impl Config {
    /// Resolve configuration from flags, then environment, then defaults.
    pub fn resolve(dir: Option<PathBuf>, author: Option<String>) -> Self {
        Self::resolve_with(dir, author, |k| std::env::var(k).ok(), dirs::home_dir())
    }

    fn resolve_with(
        dir: Option<PathBuf>,
        author: Option<String>,
        env: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
    ) -> Self {
        let data_dir = dir
            .or_else(|| env(DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| default_dir(home.as_deref()));
        let name = author
            .or_else(|| env(AUTHOR_ENV))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let author = match name {
            Some(name) => Author { name, ..Author::default() },
            None => Author::default(),
        };
        Config { data_dir, author }
    }
}

fn default_dir(home: Option<&Path>) -> PathBuf {
    home.unwrap_or_else(|| Path::new(".")).join(".taskboard")
}
