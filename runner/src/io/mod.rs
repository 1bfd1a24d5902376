//! I/O helpers: plan storage, configuration, and external services.

pub mod agent;
pub mod config;
pub mod llm;
pub mod search;
pub mod store;
