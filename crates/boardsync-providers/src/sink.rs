//! Write-back capability contracts.
//!
//! The source system declares calendar mutations and task completion as
//! operations without bodies. They are kept here as object-safe traits so a
//! future backend can be slotted in without touching the extraction
//! pipeline. Nothing in this workspace implements them yet; the calendar
//! session also only requests the read-only scope until one does.

use std::future::Future;
use std::pin::Pin;

use boardsync_core::Task;

use crate::error::ProviderResult;

/// Boxed future used to keep the capability traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Calendar write operations for a task.
pub trait EventSink: Send + Sync {
    /// Creates a calendar event for the task.
    fn create_event<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, ProviderResult<()>>;

    /// Updates the event previously created for the task.
    fn update_event<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, ProviderResult<()>>;

    /// Removes the task's event from the calendar.
    fn clear_event(&self) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Board write operations for a finished task.
pub trait TaskCompletion: Send + Sync {
    /// Ticks the task's checklist entry on its card.
    fn mark_complete<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, ProviderResult<()>>;

    /// Moves the task's card to the named column.
    fn move_to<'a>(&'a self, task: &'a Task, column: &'a str) -> BoxFuture<'a, ProviderResult<()>>;
}
