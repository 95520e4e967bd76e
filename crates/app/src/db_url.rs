//! `SQLite` URL handling for the binary.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct InvalidDbUrl {
    pub raw: String,
}

impl fmt::Display for InvalidDbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid --db value: {}", self.raw)
    }
}

impl std::error::Error for InvalidDbUrl {}

/// In-memory databases, including named shared-cache ones.
fn is_memory_url(url: &str) -> bool {
    url == "sqlite::memory:"
        || url
            .split_once('?')
            .is_some_and(|(_, query)| query.split('&').any(|pair| pair == "mode=memory"))
}

/// Turn `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
///
/// `sqlite://` URLs, `sqlite:file:` URIs and in-memory URLs are kept as given.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_memory_url(trimmed)
        || trimmed.starts_with("sqlite://")
        || trimmed.starts_with("sqlite:file:")
    {
        return trimmed.to_owned();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Returns `InvalidDbUrl` for a URL without a path, or an I/O error.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_memory_url(db_url) {
        return Ok(());
    }
    // sqlx opens `file:` URIs itself; `mode=rwc` creates the file.
    if db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url.strip_prefix("sqlite://").ok_or_else(|| InvalidDbUrl {
        raw: db_url.to_owned(),
    })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(InvalidDbUrl {
            raw: db_url.to_owned(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/a.db"), "sqlite:///tmp/a.db");
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("/var/drill.db"), "sqlite:///var/drill.db");
    }

    #[test]
    fn shared_memory_and_file_uris_pass_through() {
        let shared = "sqlite:file:memdb_cli?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared), shared);
        assert!(prepare_sqlite_file(shared).is_ok());

        let uri = "sqlite:file:data/drill.db?mode=rwc";
        assert_eq!(normalize_sqlite_url(uri), uri);

        let memory_path = "sqlite://ignored.db?cache=shared&mode=memory";
        assert_eq!(normalize_sqlite_url(memory_path), memory_path);
        assert!(prepare_sqlite_file(memory_path).is_ok());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/drill.db");
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/drill.db"));
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(prepare_sqlite_file("sqlite://").is_err());
        assert!(prepare_sqlite_file("postgres://x").is_err());
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}
