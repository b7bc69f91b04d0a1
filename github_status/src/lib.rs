//! Render commit statuses from templates and post them to GitHub.
//!
//! A [`Templater`] is compiled once per notification definition and executed per
//! event to fill in the status payload of a [`Notification`]. The
//! [`GitHubService`] then posts that payload as a commit status.

pub mod config;
pub mod errors;
pub mod repo_url;
pub mod service;
pub mod templater;

pub use config::{Config, GitHubOptions};
pub use errors::{Result, StatusError};
pub use repo_url::{full_name_by_repo_url, resolve_slug};
pub use service::{new_client, trunc, GitHubService, RepoStatus, StatusClient};
pub use templater::{Destination, FuncMap, GitHubNotification, Notification, Templater, Vars};
