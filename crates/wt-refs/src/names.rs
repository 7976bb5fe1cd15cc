//! Ref name validation following git-style conventions.
//!
//! A valid branch name is non-empty, contains no whitespace or any of
//! `~ ^ : ? * [ \`, never contains `..` or `@{`, does not start or end with
//! `.` or `/`, does not end with `.lock`, and has no empty path components
//! or components starting with `.`.

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Sequences that are forbidden anywhere in a ref name.
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "@{", "//"];

/// Returns the first rule `name` breaks, if any.
fn violation(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("name must not be empty".into());
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Some(format!("contains forbidden character: {ch:?}"));
    }
    if let Some(seq) = FORBIDDEN_SEQUENCES.iter().find(|s| name.contains(**s)) {
        return Some(format!("must not contain '{seq}'"));
    }
    if name.starts_with(['.', '/']) || name.ends_with(['.', '/']) {
        return Some("must not start or end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return Some("must not end with '.lock'".into());
    }
    name.split('/').find_map(|component| {
        if component.is_empty() {
            Some("path components must not be empty".into())
        } else if component.starts_with('.') {
            Some(format!("component must not start with '.': {component:?}"))
        } else {
            None
        }
    })
}

/// Validate a short branch name such as `main` or `feature/auth`.
///
/// ```
/// use wt_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    match violation(name) {
        None => Ok(()),
        Some(reason) => Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        }),
    }
}

/// Validate a canonical ref name, which must live under `refs/`.
///
/// The final component may be `HEAD` (as in `refs/remotes/origin/HEAD`).
pub fn validate_ref_name(name: &str) -> Result<()> {
    let invalid = |reason: String| RefError::InvalidRefName {
        name: name.to_string(),
        reason,
    };
    let rest = name
        .strip_prefix("refs/")
        .ok_or_else(|| invalid("must start with 'refs/'".into()))?;
    match violation(rest) {
        None => Ok(()),
        Some(reason) => Err(invalid(reason)),
    }
}
