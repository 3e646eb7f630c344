//! Credential bootstrap and the authenticated calendar handle.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::oauth::OAuthClient;
use super::tokens::{TokenBundle, TokenStorage};

/// OAuth scope requested for the calendar handle.
///
/// Only read access for now; write scopes are not requested until the
/// event sink grows an implementation.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Authenticated Google Calendar API handle.
///
/// Carries the bearer token for Calendar v3 requests. This is the handle
/// a future [`EventSink`](crate::sink::EventSink) implementation builds
/// its calls on.
#[derive(Debug)]
pub struct CalendarClient {
    http: reqwest::Client,
    access_token: String,
}

impl CalendarClient {
    /// Base URL for Calendar API v3.
    pub const API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            access_token: access_token.into(),
        })
    }

    /// Returns a GET request builder for an API path, bearer auth applied.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{path}", Self::API_BASE))
            .bearer_auth(&self.access_token)
    }
}

/// Outcome of the credential bootstrap: a ready-to-use API handle plus the
/// storage that later refreshes write through.
#[derive(Debug)]
pub struct CalendarSession {
    client: CalendarClient,
    storage: TokenStorage,
}

impl CalendarSession {
    /// Runs the OAuth bootstrap against the given credential files.
    ///
    /// Cached credentials are used when still valid, refreshed in place
    /// when expired but refreshable, and otherwise obtained through the
    /// interactive consent flow. Any newly acquired or refreshed bundle is
    /// written back to the cache before this returns.
    pub async fn bootstrap(
        token_cache: &Path,
        client_secret: &Path,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let credentials = OAuthCredentials::from_file(client_secret)?;
        credentials.validate().map_err(ProviderError::configuration)?;

        let scopes = vec![CALENDAR_READONLY_SCOPE.to_string()];
        let oauth = OAuthClient::new(credentials, timeout)?;

        let mut storage = TokenStorage::new(token_cache);
        storage.load()?;

        let access_token = match storage.get().cloned() {
            Some(bundle) if !bundle.is_expired() => {
                debug!("using cached access token from {}", token_cache.display());
                bundle.access_token
            }
            Some(TokenBundle {
                refresh_token: Some(refresh_token),
                ..
            }) => {
                info!("cached access token expired, refreshing");
                let (access_token, expires_in) = oauth.refresh(&refresh_token).await?;
                storage.update_access_token(&access_token, expires_in)?;
                access_token
            }
            _ => {
                info!("no usable cached credentials, starting consent flow");
                let bundle = oauth.authorize(&scopes).await?;
                let access_token = bundle.access_token.clone();
                storage.set(bundle)?;
                access_token
            }
        };

        Ok(Self {
            client: CalendarClient::new(access_token, timeout)?,
            storage,
        })
    }

    /// Returns the authenticated API handle.
    pub fn client(&self) -> &CalendarClient {
        &self.client
    }

    /// Returns the token cache file the session writes through.
    pub fn token_cache(&self) -> &Path {
        self.storage.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_get_applies_base_url_and_bearer() {
        let client = CalendarClient::new("test-token", Duration::from_secs(5)).unwrap();
        let request = client.get("/users/me/calendarList").build().unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://www.googleapis.com/calendar/v3/users/me/calendarList"
        );
        let auth = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer test-token");
    }

    #[tokio::test]
    async fn bootstrap_fails_without_client_secret() {
        let missing = std::env::temp_dir().join("boardsync-no-such-credentials.json");
        let cache = std::env::temp_dir().join("boardsync-no-such-token.json");

        let err = CalendarSession::bootstrap(&cache, &missing, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::ConfigurationError
        );
    }
}
