//! Token storage in a JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vidstream_api::error::{ApiError, ApiResult};
use vidstream_api::TokenStore;

/// Keeps tokens in a JSON object on disk.
///
/// Every read and write goes to the file, so several processes sharing one
/// session always see the latest tokens.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(target: "session", path = %self.path.display(), error = %e, "Failed to read session file");
                return HashMap::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(target: "session", path = %self.path.display(), error = %e, "Ignoring corrupt session file");
            HashMap::new()
        })
    }

    fn write_all(&self, values: &HashMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_error)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content).map_err(storage_error)?;
        restrict_permissions(&self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)?;
        tracing::trace!(target: "session", key, "Stored session value");
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let mut values = self.read_all();
        if values.remove(key).is_some() {
            self.write_all(&values)?;
            tracing::trace!(target: "session", key, "Removed session value");
        }
        Ok(())
    }
}

fn storage_error(err: std::io::Error) -> ApiError {
    ApiError::Storage(err.to_string())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> ApiResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(storage_error)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> ApiResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vidstream_api::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    #[test]
    fn values_survive_a_new_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileTokenStore::new(&path);
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("a1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
    }

    #[test]
    fn reads_see_external_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();

        std::fs::write(&path, r#"{"accessToken":"a2"}"#).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("a2"));
    }

    #[test]
    fn missing_or_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        store.remove(ACCESS_TOKEN_KEY).unwrap();

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
    }

    #[test]
    fn remove_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").unwrap();

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
    }
}
