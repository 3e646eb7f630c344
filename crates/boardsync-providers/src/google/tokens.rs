//! The persisted OAuth token cache.
//!
//! The cache file is read once at bootstrap and rewritten after every
//! acquisition or refresh. Last writer wins; nothing locks the file, since
//! a single interactive process is the only intended user.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Safety margin subtracted from the reported token lifetime, so a refresh
/// happens before the token actually dies mid-request.
const EXPIRY_SLACK_SECS: i64 = 60;

/// One OAuth credential bundle: the access token plus refresh material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    /// The access token sent as a bearer on API requests.
    pub access_token: String,

    /// The refresh token, when the consent flow granted one.
    pub refresh_token: Option<String>,

    /// When the access token expires, if the endpoint reported a lifetime.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes the bundle was granted for.
    pub scopes: Vec<String>,

    /// When the bundle was last acquired or refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl TokenBundle {
    /// Creates a bundle from token endpoint response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true when the access token is past (or within the slack
    /// margin of) its expiry. Tokens without a reported lifetime never
    /// expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() >= at,
            None => false,
        }
    }

    /// Swaps in a freshly refreshed access token.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs - EXPIRY_SLACK_SECS)
}

/// File-backed storage for the current token bundle.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    bundle: Option<TokenBundle>,
}

impl TokenStorage {
    /// Creates storage pointed at the cache file. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bundle: None,
        }
    }

    /// Reads the cache file into memory.
    ///
    /// Returns Ok(true) if a bundle was loaded, Ok(false) when no cache
    /// file exists. An unreadable or unparseable file is an error.
    pub fn load(&mut self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!("no token cache at {}", self.path.display());
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token cache: {e}"))
        })?;
        let bundle = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token cache: {e}"))
        })?;

        debug!("loaded token cache from {}", self.path.display());
        self.bundle = Some(bundle);
        Ok(true)
    }

    /// Writes the current bundle to disk, via temp file + rename.
    pub fn save(&self) -> ProviderResult<()> {
        let bundle = self
            .bundle
            .as_ref()
            .ok_or_else(|| ProviderError::internal("no token bundle to save"))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!(
                    "failed to create token cache directory: {e}"
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(bundle)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token cache: {e}"))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to move token cache into place: {e}"))
        })?;

        // Token material is a secret; keep it owner-readable only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }

        debug!("token cache written to {}", self.path.display());
        Ok(())
    }

    /// Replaces the bundle and persists it.
    pub fn set(&mut self, bundle: TokenBundle) -> ProviderResult<()> {
        self.bundle = Some(bundle);
        self.save()
    }

    /// Refreshes the access token in place and persists the result.
    pub fn update_access_token(
        &mut self,
        access_token: &str,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        match self.bundle.as_mut() {
            Some(bundle) => {
                bundle.update_access_token(access_token, expires_in_secs);
                self.save()
            }
            None => Err(ProviderError::internal("no token bundle to update")),
        }
    }

    /// Returns the current bundle, if one is loaded.
    pub fn get(&self) -> Option<&TokenBundle> {
        self.bundle.as_ref()
    }

    /// Returns the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path() -> PathBuf {
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut path = env::temp_dir();
        path.push(format!(
            "boardsync-test-tokens-{}-{}.json",
            std::process::id(),
            counter
        ));
        path
    }

    #[test]
    fn bundle_creation() {
        let bundle = TokenBundle::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope".to_string()],
        );
        assert_eq!(bundle.access_token, "access-token");
        assert!(bundle.expires_at.is_some());
        assert!(!bundle.is_expired());
    }

    #[test]
    fn bundle_without_lifetime_never_expires() {
        let bundle = TokenBundle::new("access", None, None, vec![]);
        assert!(!bundle.is_expired());
    }

    #[test]
    fn bundle_past_expiry() {
        let mut bundle = TokenBundle::new("access", None, Some(3600), vec![]);
        bundle.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(bundle.is_expired());
    }

    #[test]
    fn refresh_updates_access_token_and_expiry() {
        let mut bundle = TokenBundle::new("old", Some("refresh".to_string()), Some(3600), vec![]);
        bundle.expires_at = Some(Utc::now() - Duration::hours(1));

        bundle.update_access_token("new", Some(3600));
        assert_eq!(bundle.access_token, "new");
        assert!(!bundle.is_expired());
        assert_eq!(bundle.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn storage_save_and_load_round_trip() {
        let path = temp_path();
        let mut storage = TokenStorage::new(path.clone());
        let bundle = TokenBundle::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope".to_string()],
        );
        storage.set(bundle).unwrap();
        assert!(path.exists());

        let mut reloaded = TokenStorage::new(path.clone());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.get().unwrap().access_token, "access-token");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn storage_load_without_file() {
        let mut storage = TokenStorage::new(temp_path());
        assert!(!storage.load().unwrap());
        assert!(storage.get().is_none());
    }

    #[test]
    fn storage_update_without_bundle_fails() {
        let mut storage = TokenStorage::new(temp_path());
        assert!(storage.update_access_token("token", Some(3600)).is_err());
    }

    #[test]
    fn storage_update_persists() {
        let path = temp_path();
        let mut storage = TokenStorage::new(path.clone());
        storage
            .set(TokenBundle::new(
                "old",
                Some("refresh".to_string()),
                Some(3600),
                vec![],
            ))
            .unwrap();
        storage.update_access_token("new", Some(3600)).unwrap();

        let mut reloaded = TokenStorage::new(path.clone());
        reloaded.load().unwrap();
        assert_eq!(reloaded.get().unwrap().access_token, "new");

        let _ = fs::remove_file(&path);
    }
}
