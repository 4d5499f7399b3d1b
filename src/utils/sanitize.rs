//! Input sanitization for values that reach the installer backend
//!
//! Package identifiers and artifact file names come from remote services and
//! end up as command arguments, so they are checked before use.

use crate::error::{Result, UnipkgError};
use regex::Regex;
use std::sync::LazyLock;

/// Allows: alphanumeric, dash, underscore, dot, plus, at sign, slash (for scoped ids)
static SAFE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9@._+/-]+$").expect("Invalid regex pattern"));

/// Characters that could be dangerous in shell contexts
static SHELL_DANGEROUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[;`$(){}|&<>\\'"\n\r\t]"#).expect("Invalid regex pattern"));

/// Validate an identifier handed to `is-installed` / `launch` commands.
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(UnipkgError::InvalidArgument(
            "Package identifier cannot be empty".to_string(),
        ));
    }

    if id.len() > 256 {
        return Err(UnipkgError::InvalidArgument(format!(
            "Package identifier too long (max 256 chars): {}",
            id.chars().take(50).collect::<String>()
        )));
    }

    if SHELL_DANGEROUS.is_match(id) || !SAFE_IDENTIFIER.is_match(id) {
        return Err(UnipkgError::InvalidArgument(format!(
            "Package identifier contains unsafe characters: {}",
            id
        )));
    }

    if id.contains("..") {
        return Err(UnipkgError::InvalidArgument(format!(
            "Package identifier cannot contain path traversal: {}",
            id
        )));
    }

    Ok(())
}

/// Reduce a remote-supplied name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("Git.Git").is_ok());
        assert!(validate_identifier("@scope/pkg").is_ok());
        assert!(validate_identifier("ripgrep").is_ok());
    }

    #[test]
    fn test_rejects_injection() {
        assert!(validate_identifier("foo; rm -rf /").is_err());
        assert!(validate_identifier("$(whoami)").is_err());
        assert!(validate_identifier("../etc/passwd").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            sanitize_file_name("https://example.com/dl/tool-1.0.msi?token=abc"),
            "tool-1.0.msi"
        );
        assert_eq!(sanitize_file_name("..\\..\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_file_name("my app.deb"), "my_app.deb");
        assert_eq!(sanitize_file_name("/"), "download");
    }
}
