//! OAuth 2.0 authorization-code flow with PKCE for Google APIs.
//!
//! Desktop-app flow: a loopback listener on an ephemeral port receives the
//! consent redirect, and the authorization code is exchanged (with the
//! PKCE verifier) for an access/refresh token pair. The listener lives
//! only for the duration of one [`OAuthClient::authorize`] call and is
//! dropped on every exit path, including the timeout.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::tokens::TokenBundle;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// How long to wait for the user to finish the consent screen.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// PKCE verifier entropy in bytes, before base64url encoding.
const VERIFIER_BYTES: usize = 32;

/// Client for the Google token endpoint and the interactive consent flow.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Creates an OAuth client with the given application credentials.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { credentials, http })
    }

    /// Runs the interactive consent flow and returns the obtained bundle.
    ///
    /// Binds `127.0.0.1:0`, opens the user's browser to the consent URL,
    /// blocks (with a hard timeout) until the redirect arrives, verifies
    /// the CSRF state, and exchanges the code for tokens.
    pub async fn authorize(&self, scopes: &[String]) -> ProviderResult<TokenBundle> {
        let pkce = PkceFlow::new();

        // Ephemeral port; the redirect URI has to match what we bound.
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|e| {
            ProviderError::configuration(format!("failed to bind loopback listener: {e}"))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| ProviderError::internal(format!("no local address on listener: {e}")))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{port}/callback");

        let auth_url = pkce.auth_url(&self.credentials.client_id, &redirect_uri, scopes);
        info!("waiting for OAuth consent on port {port}");
        if let Err(e) = open::that(&auth_url) {
            warn!("could not open a browser: {e}");
            eprintln!("\nOpen this URL in your browser to authorize access:\n\n{auth_url}\n");
        }

        let redirect = wait_for_redirect(&listener).await?;
        if redirect.state.as_deref() != Some(pkce.state.as_str()) {
            return Err(ProviderError::authentication(
                "state mismatch in OAuth redirect",
            ));
        }

        debug!("authorization code received, exchanging for tokens");
        self.exchange_code(&redirect.code, &pkce.verifier, &redirect_uri, scopes)
            .await
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Returns the token and its lifetime in seconds, when reported.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.token_request(&params, "token refresh").await?;
        info!("access token refreshed");
        Ok((response.access_token, response.expires_in))
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ProviderResult<TokenBundle> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let response = self.token_request(&params, "code exchange").await?;
        info!("tokens obtained");
        Ok(TokenBundle::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{what} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read {what} response: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{what} failed ({status}): {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("malformed {what} response: {e}")))
    }
}

/// Response from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Parameters delivered on the consent redirect.
#[derive(Debug)]
struct Redirect {
    code: String,
    state: Option<String>,
}

/// Accepts loopback connections until the consent redirect arrives.
///
/// Stray requests (favicon probes and the like) get a 404 and the loop
/// keeps waiting. The whole wait is bounded by [`CONSENT_TIMEOUT`].
async fn wait_for_redirect(listener: &TcpListener) -> ProviderResult<Redirect> {
    let accept_loop = async {
        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| ProviderError::internal(format!("accept failed: {e}")))?;
            if let Some(redirect) = answer_request(stream).await? {
                return Ok(redirect);
            }
        }
    };

    match tokio::time::timeout(CONSENT_TIMEOUT, accept_loop).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::authentication(
            "timed out waiting for the consent redirect",
        )),
    }
}

/// Serves one connection; returns the redirect parameters if this was it.
async fn answer_request(mut stream: TcpStream) -> ProviderResult<Option<Redirect>> {
    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&mut stream);
        if reader.read_line(&mut request_line).await.is_err() {
            return Ok(None);
        }
    }

    // "GET /callback?code=...&state=... HTTP/1.1"
    let path = match request_line.split_whitespace().nth(1) {
        Some(p) if request_line.starts_with("GET ") => p,
        _ => {
            respond(&mut stream, "404 Not Found", "Not found.").await;
            return Ok(None);
        }
    };
    if !path.starts_with("/callback") {
        respond(&mut stream, "404 Not Found", "Not found.").await;
        return Ok(None);
    }

    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    let params = CallbackParams::parse(query);

    if let Some(error) = params.error {
        respond(
            &mut stream,
            "400 Bad Request",
            "Authorization failed. You can close this window.",
        )
        .await;
        return Err(ProviderError::authentication(format!(
            "authorization denied: {error}"
        )));
    }

    match params.code {
        Some(code) => {
            respond(
                &mut stream,
                "200 OK",
                "Authorization complete. You can close this window and return to the terminal.",
            )
            .await;
            Ok(Some(Redirect {
                code,
                state: params.state,
            }))
        }
        None => {
            respond(&mut stream, "400 Bad Request", "Missing authorization code.").await;
            Err(ProviderError::authentication(
                "redirect carried no authorization code",
            ))
        }
    }
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!("<html><body><p>{message}</p></body></html>");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Query parameters of the consent redirect.
#[derive(Debug, Default, PartialEq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value).unwrap_or_default().into_owned();
            match key {
                "code" => params.code = Some(value),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// PKCE verifier/challenge pair plus the CSRF state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    /// High-entropy random code verifier.
    pub verifier: String,
    /// SHA-256 challenge of the verifier, base64url encoded.
    pub challenge: String,
    /// Random state echoed back on the redirect.
    pub state: String,
}

impl PkceFlow {
    /// Creates a flow with a fresh verifier and state.
    pub fn new() -> Self {
        let verifier = random_urlsafe(VERIFIER_BYTES);
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_urlsafe(16),
        }
    }

    fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent URL for the given client and redirect target.
    pub fn auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{AUTH_ENDPOINT}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
             code_challenge={}&code_challenge_method=S256&state={}&\
             access_type=offline&prompt=consent",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_urlsafe(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}
