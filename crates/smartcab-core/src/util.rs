//! Utility functions for smartcab
//!
//! Provides environment loading from `smartcab.env` files.

use std::path::{Path, PathBuf};

/// Candidate env files, in search order:
/// 1. ./smartcab.env
/// 2. User's config directory/smartcab/smartcab.env
/// 3. ~/.config/smartcab/smartcab.env
fn env_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("smartcab.env")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("smartcab").join("smartcab.env"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("smartcab").join("smartcab.env"));
    }
    paths
}

/// Load the first smartcab env file found, without overriding variables
/// that are already set.
///
/// Returns the file and how many variables it set. Runs before logging is
/// installed, so the caller reports the result.
pub fn load_env_file() -> Option<(PathBuf, usize)> {
    let path = env_file_candidates().into_iter().find(|p| p.exists())?;
    let applied = load_env_file_from(&path).ok()?;
    Some((path, applied))
}

/// Apply the variables of one env file
pub fn load_env_file_from(path: &Path) -> std::io::Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_env_file(&contents))
}

/// Parse env file contents and set environment variables (only if not already set).
/// Returns how many variables were set.
///
/// Supports formats:
/// - `KEY=value`
/// - `export KEY=value`
/// - `KEY="quoted value"`
/// - `KEY='single quoted'`
/// - Comments starting with #
pub fn parse_env_file(contents: &str) -> usize {
    let mut applied = 0;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
                applied += 1;
            }
        }
    }
    applied
}
