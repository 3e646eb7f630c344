//! External-service plumbing for boardsync.
//!
//! - [`google`] - OAuth bootstrap, token cache, and the authenticated
//!   calendar handle
//! - [`github`] - GitHub Projects (classic) REST client and board traversal
//! - [`sink`] - declared write-back contracts with no implementation yet
//! - [`ProviderError`] - typed errors shared by both sides

pub mod error;
pub mod github;
pub mod google;
pub mod sink;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use github::{Card, CardContent, Column, Project, ProjectClient};
pub use google::{CalendarClient, CalendarSession, OAuthCredentials};
pub use sink::{BoxFuture, EventSink, TaskCompletion};
