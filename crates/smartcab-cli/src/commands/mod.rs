//! CLI command modules

pub mod config;
pub mod report;
pub mod run;
