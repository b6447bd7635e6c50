use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::{
    api::EntityKind,
    app_error::{AppError, AppResult},
};

pub const PROCESSED_USERS: &str = "processed/users.csv";
pub const PROCESSED_PRODUCTS: &str = "processed/products.csv";
pub const PROCESSED_CARTS: &str = "processed/carts.csv";

/// `raw/<kind>_<YYYYMMDD_HHMMSS>.json`
pub fn raw_name(kind: EntityKind, fetched_at: DateTime<Local>) -> String {
    format!("raw/{kind}_{}.json", fetched_at.format("%Y%m%d_%H%M%S"))
}

/// Byte streams keyed by a relative, `/`-separated name such as
/// `raw/users_20250101_120000.json`.
pub trait Storage {
    fn put(&self, name: &str, bytes: &[u8]) -> AppResult<()>;

    /// `Ok(None)` when nothing is stored under `name`.
    fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Directory-backed storage. Writes land in a sibling temp file first and are
/// renamed into place, so readers never observe a half-written object.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        let relative = Path::new(name);
        let valid = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(storage_error(
                name,
                io::Error::new(io::ErrorKind::InvalidInput, "not a relative object name"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for LocalStorage {
    fn put(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| storage_error(name, err))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, bytes).map_err(|err| storage_error(name, err))?;
        fs::rename(&tmp, &path).map_err(|err| storage_error(name, err))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored object");
        Ok(())
    }

    fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_error(name, err)),
        }
    }
}

fn storage_error(name: &str, source: io::Error) -> AppError {
    AppError::Storage {
        name: name.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn raw_names_carry_kind_and_timestamp() {
        let at = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(raw_name(EntityKind::Carts, at), "raw/carts_20250102_030405.json");
    }

    #[test]
    fn put_then_get_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.put("processed/users.csv", b"user_id\n1\n").unwrap();

        assert_eq!(
            storage.get("processed/users.csv").unwrap().as_deref(),
            Some(&b"user_id\n1\n"[..])
        );
        assert!(!dir.path().join("processed/users.csv.tmp").exists());
    }

    #[test]
    fn put_replaces_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.put("a.json", b"old").unwrap();
        storage.put("a.json", b"new").unwrap();

        assert_eq!(storage.get("a.json").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert_eq!(storage.get("processed/carts.csv").unwrap(), None);
    }

    #[test]
    fn names_escaping_the_root_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for name in ["../outside.json", "/etc/passwd", ""] {
            let err = storage.put(name, b"x").unwrap_err();
            assert!(matches!(err, AppError::Storage { .. }), "{name}");
        }
    }
}
