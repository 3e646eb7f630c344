//! Google credential file locations.

use std::path::{Path, PathBuf};

use crate::error::{ClientError, ClientResult};

/// File name of the persisted OAuth token cache.
pub const TOKEN_CACHE_FILE: &str = "token.json";

/// File name of the OAuth client-secret download.
pub const CLIENT_SECRET_FILE: &str = "credentials.json";

/// Fixed locations of the two Google credential files inside one
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    /// Token cache, rewritten after every successful bootstrap or refresh.
    pub token_cache: PathBuf,
    /// Static client-secret file, read-only input.
    pub client_secret: PathBuf,
}

impl CredentialPaths {
    /// Derives the credential paths from `dir`.
    ///
    /// Only the directory itself has to exist; whether the files are
    /// there is the OAuth bootstrap's problem.
    pub fn resolve(dir: &Path) -> ClientResult<Self> {
        if !dir.is_dir() {
            return Err(ClientError::Config(format!(
                "missing Google credentials directory {} - create it and place {} inside \
                 (see https://developers.google.com/calendar/api/quickstart)",
                dir.display(),
                CLIENT_SECRET_FILE
            )));
        }
        Ok(Self {
            token_cache: dir.join(TOKEN_CACHE_FILE),
            client_secret: dir.join(CLIENT_SECRET_FILE),
        })
    }
}

/// Default credentials directory when `--google-dir` is not given.
pub fn default_google_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".config"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boardsync")
        .join("google")
}
