//! CLI command handlers

pub mod check_config;
pub mod run;
pub mod summarize;
