//! Infrastructure layer
//!
//! This module contains external integrations and adapters.

mod config;
mod github_actions;
mod logging;
mod pages;

pub use config::{CONFIG_FILE, Config};
pub use github_actions::{CHECKOUT_ACTION, GitHubActionsBackend, PAGES_ACTION};
pub use logging::{LOG_ENV, init_logging};
pub use pages::{GitPagesPublisher, authenticated_url};
