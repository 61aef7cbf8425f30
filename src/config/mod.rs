//! Configuration module for bankrec
//!
//! - XDG-compliant path resolution
//! - User settings persistence, including reconciliation policy

pub mod paths;
pub mod settings;

pub use paths::RecPaths;
pub use settings::{ReconciliationSettings, Settings};
