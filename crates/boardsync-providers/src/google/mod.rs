//! Google Calendar OAuth bootstrap and the authenticated API handle.

pub mod config;
pub mod oauth;
pub mod session;
pub mod tokens;

pub use config::OAuthCredentials;
pub use oauth::{OAuthClient, PkceFlow};
pub use session::{CalendarClient, CalendarSession, CALENDAR_READONLY_SCOPE};
pub use tokens::{TokenBundle, TokenStorage};
