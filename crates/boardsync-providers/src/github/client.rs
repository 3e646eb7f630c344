//! Low-level GitHub REST client for the classic Projects API.
//!
//! Classic project boards (projects, columns, cards) sit behind the
//! `inertia-preview` media type. Cards come in two kinds: note cards carry
//! free text, issue and pull request cards point at their content through
//! `content_url`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Base URL for the GitHub REST API.
const API_BASE: &str = "https://api.github.com";

/// Media type unlocking the classic Projects endpoints.
const PROJECTS_ACCEPT: &str = "application/vnd.github.inertia-preview+json";

const USER_AGENT: &str = concat!("boardsync/", env!("CARGO_PKG_VERSION"));

/// Token-authenticated GitHub API client.
#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Creates a client around a personal access token.
    pub fn new(token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    /// Fetches a repository, validating both the token and the name.
    pub async fn repository(&self, full_name: &str) -> ProviderResult<Repository> {
        self.get_json(&format!("{API_BASE}/repos/{full_name}")).await
    }

    /// Lists the classic project boards attached to a repository.
    pub async fn repo_projects(&self, full_name: &str) -> ProviderResult<Vec<Project>> {
        self.get_json(&format!("{API_BASE}/repos/{full_name}/projects"))
            .await
    }

    /// Lists a project's columns, in board order.
    pub async fn project_columns(&self, project_id: u64) -> ProviderResult<Vec<Column>> {
        self.get_json(&format!("{API_BASE}/projects/{project_id}/columns"))
            .await
    }

    /// Lists a column's cards, in column order.
    pub async fn column_cards(&self, column_id: u64) -> ProviderResult<Vec<Card>> {
        self.get_json(&format!("{API_BASE}/projects/columns/{column_id}/cards"))
            .await
    }

    /// Fetches the issue or pull request behind a card.
    pub async fn card_content(&self, content_url: &str) -> ProviderResult<CardContent> {
        self.get_json(content_url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, PROJECTS_ACCEPT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {e}"))
                } else {
                    ProviderError::network(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "GitHub rejected the access token",
            ));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization(format!(
                "access denied to {url}"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(format!("{url} does not exist")));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited("GitHub rate limit exceeded"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "API error ({status}): {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {e}")))
    }
}

/// A repository, as returned by the repos endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Numeric repository id.
    pub id: u64,
    /// The `owner/name` form.
    pub full_name: String,
}

/// A classic project board attached to a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Numeric project id, used for the columns endpoint.
    pub id: u64,
    /// Board name, the key users select by.
    pub name: String,
}

/// A named column of cards on a project board.
#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    /// Numeric column id, used for the cards endpoint.
    pub id: u64,
    /// Column name, e.g. "Backlog" or "In Progress (Priority)".
    pub name: String,
}

/// A card in a column.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    /// Numeric card id.
    pub id: u64,
    /// Free text, present on note cards only.
    #[serde(default)]
    pub note: Option<String>,
    /// Link to the issue or pull request behind the card, if any.
    #[serde(default)]
    pub content_url: Option<String>,
}

/// The issue or pull request behind a card.
#[derive(Debug, Clone, Deserialize)]
pub struct CardContent {
    /// Issue or pull request title.
    pub title: String,
    /// Free-text body; may hold checklist lines.
    #[serde(default)]
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repository() {
        let json = r#"{
            "id": 42,
            "full_name": "octocat/hello-world",
            "private": false
        }"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.id, 42);
        assert_eq!(repo.full_name, "octocat/hello-world");
    }

    #[test]
    fn parse_projects_list() {
        let json = r#"[
            { "id": 1002604, "name": "Sprint 7", "body": "tasks", "number": 1 },
            { "id": 1002605, "name": "Roadmap", "number": 2 }
        ]"#;
        let projects: Vec<Project> = serde_json::from_str(json).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "Sprint 7");
    }

    #[test]
    fn parse_columns_list() {
        let json = r#"[
            { "id": 367, "name": "Backlog" },
            { "id": 368, "name": "In Progress (Priority)" }
        ]"#;
        let columns: Vec<Column> = serde_json::from_str(json).unwrap();
        assert_eq!(columns[1].name, "In Progress (Priority)");
    }

    #[test]
    fn parse_issue_card() {
        let json = r#"{
            "id": 1478,
            "content_url": "https://api.github.com/repos/octocat/hello-world/issues/3"
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert!(card.content_url.is_some());
        assert!(card.note.is_none());
    }

    #[test]
    fn parse_note_card() {
        let json = r#"{ "id": 1479, "note": "remember the milk" }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert!(card.content_url.is_none());
        assert_eq!(card.note.as_deref(), Some("remember the milk"));
    }

    #[test]
    fn parse_card_content() {
        let json = r#"{
            "title": "Fix login bug issue title",
            "body": "[ ] Fix login bug\n[x] Write docs",
            "state": "open"
        }"#;
        let content: CardContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.title, "Fix login bug issue title");
        assert!(content.body.as_deref().unwrap().contains("[ ]"));
    }

    #[test]
    fn parse_card_content_without_body() {
        let json = r#"{ "title": "Empty issue", "body": null }"#;
        let content: CardContent = serde_json::from_str(json).unwrap();
        assert!(content.body.is_none());
    }
}
