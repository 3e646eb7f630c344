//! Task records extracted from project board cards.
//!
//! A card body is free-form text that may contain ad-hoc checklist lines
//! (`[ ] fix the login bug`). The board convention treats the first
//! unchecked line of the first card in the priority column as the one task
//! to act on; everything after it is ignored.

use serde::{Deserialize, Serialize};

/// Marker of an unchecked checklist line.
pub const UNCHECKED_MARKER: &str = "[ ]";

/// Marker of a completed checklist line.
pub const CHECKED_MARKER: &str = "[x]";

/// A single actionable task taken from a project board card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Title of the card (issue or pull request) the task came from.
    pub title: String,
    /// The first unchecked checklist line of the card body, marker stripped.
    pub body: String,
}

impl Task {
    /// Creates a task record.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Returns the first unchecked checklist line of `body` with the marker
/// text stripped, or `None` when every line is checked or plain text.
///
/// Checked lines (`[x]`) are never returned, regardless of where they sit
/// relative to the unchecked ones.
pub fn first_unchecked_item(body: &str) -> Option<String> {
    body.lines()
        .find(|line| line.contains(UNCHECKED_MARKER))
        .map(|line| line.replace("[ ] ", ""))
}
