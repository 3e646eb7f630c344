//! Core types: task records and checklist parsing

pub mod task;

pub use task::{first_unchecked_item, Task, CHECKED_MARKER, UNCHECKED_MARKER};
