//! GitHub Projects (classic) board access.

pub mod board;
pub mod client;

pub use board::{ProjectClient, DEFAULT_TARGET_COLUMN};
pub use client::{Card, CardContent, Column, GitHubClient, Project, Repository};
