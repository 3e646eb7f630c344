//! Project board traversal: column listing and priority-task extraction.
//!
//! Every selection here is by exact name. A miss is a typed not-found
//! error rather than an index panic on the empty match, so "malformed
//! board" reads differently from "internal bug".

use std::time::Duration;

use tracing::debug;

use boardsync_core::{first_unchecked_item, Task};

use crate::error::{ProviderError, ProviderResult};

use super::client::{CardContent, Column, GitHubClient, Project};

/// Column inspected for the priority task when no other name is given.
pub const DEFAULT_TARGET_COLUMN: &str = "In Progress (Priority)";

/// Authenticated handle onto one repository's project boards.
#[derive(Debug)]
pub struct ProjectClient {
    client: GitHubClient,
    repo: String,
}

impl ProjectClient {
    /// Authenticates against GitHub and validates that the repository
    /// exists before anything else runs.
    pub async fn authenticate(
        token: &str,
        repo_full_name: &str,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = GitHubClient::new(token, timeout)?;
        let repository = client.repository(repo_full_name).await?;
        debug!("authenticated against {}", repository.full_name);
        Ok(Self {
            client,
            repo: repository.full_name,
        })
    }

    /// Returns the ordered columns of the named project board.
    ///
    /// An empty project name yields no columns at all; a name that matches
    /// no board on the repository is a not-found error.
    pub async fn columns(&self, project_name: &str) -> ProviderResult<Vec<Column>> {
        if project_name.is_empty() {
            return Ok(Vec::new());
        }
        let projects = self.client.repo_projects(&self.repo).await?;
        let project = find_project(&projects, project_name)?;
        self.client.project_columns(project.id).await
    }

    /// Extracts the single highest-priority task from the target column.
    ///
    /// Cards are inspected in column order; the first card that carries
    /// content decides the outcome and later cards are never fetched.
    pub async fn extract_priority_task(
        &self,
        columns: &[Column],
        target_column: &str,
    ) -> ProviderResult<Task> {
        let column = find_column(columns, target_column)?;
        let cards = self.client.column_cards(column.id).await?;
        if cards.is_empty() {
            return Err(ProviderError::not_found(format!(
                "column \"{}\" has no cards",
                column.name
            )));
        }

        let content_url = cards
            .iter()
            .find_map(|card| card.content_url.as_deref())
            .ok_or_else(|| {
                ProviderError::not_found(format!(
                    "column \"{}\" has no issue or pull request cards",
                    column.name
                ))
            })?;

        let content = self.client.card_content(content_url).await?;
        task_from_content(&content)
    }
}

/// Selects the project whose name matches exactly.
fn find_project<'a>(projects: &'a [Project], name: &str) -> ProviderResult<&'a Project> {
    projects
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ProviderError::not_found(format!("no project named \"{name}\"")))
}

/// Selects the column whose name matches exactly.
fn find_column<'a>(columns: &'a [Column], name: &str) -> ProviderResult<&'a Column> {
    columns
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| ProviderError::not_found(format!("no column named \"{name}\"")))
}

/// Builds the task record for a card's content.
///
/// The task body is the card's first unchecked checklist line; content
/// with nothing left unchecked is a not-found error, never a silently
/// returned checked item.
fn task_from_content(content: &CardContent) -> ProviderResult<Task> {
    let body = content.body.as_deref().unwrap_or_default();
    let item = first_unchecked_item(body).ok_or_else(|| {
        ProviderError::not_found(format!(
            "card \"{}\" has no unchecked checklist line",
            content.title
        ))
    })?;
    Ok(Task::new(&content.title, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn columns() -> Vec<Column> {
        vec![
            Column {
                id: 1,
                name: "Backlog".to_string(),
            },
            Column {
                id: 2,
                name: "In Progress (Priority)".to_string(),
            },
        ]
    }

    #[test]
    fn find_column_picks_exact_match_only() {
        let columns = columns();
        let column = find_column(&columns, DEFAULT_TARGET_COLUMN).unwrap();
        assert_eq!(column.id, 2);
    }

    #[test]
    fn find_column_miss_is_not_found() {
        let columns = columns();
        let err = find_column(&columns, "Done").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert!(err.message().contains("Done"));
    }

    #[test]
    fn find_column_on_empty_listing() {
        let err = find_column(&[], DEFAULT_TARGET_COLUMN).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
    }

    #[test]
    fn find_project_by_name() {
        let projects = vec![
            Project {
                id: 10,
                name: "Roadmap".to_string(),
            },
            Project {
                id: 11,
                name: "Sprint 7".to_string(),
            },
        ];
        assert_eq!(find_project(&projects, "Sprint 7").unwrap().id, 11);
        assert_eq!(
            find_project(&projects, "Sprint 8").unwrap_err().code(),
            ProviderErrorCode::NotFound
        );
    }

    #[test]
    fn task_from_content_takes_first_unchecked_line() {
        let content = CardContent {
            title: "Fix login bug issue title".to_string(),
            body: Some("[ ] Fix login bug\n[x] Write docs".to_string()),
        };
        let task = task_from_content(&content).unwrap();
        assert_eq!(task.title, "Fix login bug issue title");
        assert_eq!(task.body, "Fix login bug");
    }

    #[test]
    fn task_from_content_rejects_all_checked() {
        let content = CardContent {
            title: "Done already".to_string(),
            body: Some("[x] done".to_string()),
        };
        let err = task_from_content(&content).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
    }

    #[test]
    fn task_from_content_rejects_empty_body() {
        let content = CardContent {
            title: "Bodyless".to_string(),
            body: None,
        };
        assert!(task_from_content(&content).is_err());
    }
}
