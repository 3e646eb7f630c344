//! `.env` configuration loading.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ClientError, ClientResult};

/// Key the GitHub personal access token is read from.
pub const TOKEN_KEY: &str = "token";

/// Key/value configuration loaded from a dotenv-style file.
///
/// Values are kept verbatim as the dotenv format yields them; no key is
/// required at load time, missing ones surface where they are consumed.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    values: BTreeMap<String, String>,
}

impl EnvConfig {
    /// Loads the file at `path`.
    ///
    /// A missing file is a configuration error with remediation guidance,
    /// not a bare I/O error.
    pub fn load(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            return Err(ClientError::Config(format!(
                "missing {} - create it with at least `token=<github personal access token>`",
                path.display()
            )));
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut values = BTreeMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?;
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value for `key` or a configuration error naming it.
    pub fn require(&self, key: &str) -> ClientResult<&str> {
        self.get(key).ok_or_else(|| {
            ClientError::Config(format!("`{key}` is not set in the configuration file"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_keys_and_values_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "token=abc123\nendpoint=https://example.com?a=b\n").unwrap();

        let config = EnvConfig::load(&path).unwrap();
        assert_eq!(config.get("token"), Some("abc123"));
        assert_eq!(config.get("endpoint"), Some("https://example.com?a=b"));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "# github access\n\ntoken=xyz\n").unwrap();

        let config = EnvConfig::load(&path).unwrap();
        assert_eq!(config.get("token"), Some("xyz"));
        assert_eq!(config.get("# github access"), None);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = EnvConfig::load(Path::new("/nonexistent/.env")).unwrap_err();
        match err {
            ClientError::Config(msg) => {
                assert!(msg.contains("/nonexistent/.env"));
                assert!(msg.contains("token="));
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn require_reports_the_missing_key() {
        let config = EnvConfig::default();
        let err = config.require(TOKEN_KEY).unwrap_err();
        match err {
            ClientError::Config(msg) => assert!(msg.contains("token")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
