//! Branch name checks.

use crate::{GitError, Result};

/// Rejects branch names that git could read as an option or that cannot name a ref.
///
/// This is a guard on peer input, not a full `git check-ref-format`; git still
/// has the final word on anything that passes.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('-')
        || name.chars().any(|c| c.is_whitespace() || c.is_control());

    if invalid {
        return Err(GitError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        for name in ["main", "feature/login", "release-1.2", "fix_42"] {
            assert!(validate_branch_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_option_like_and_blank_names() {
        for name in ["", "-D", "--force", "has space", "tab\tname", "new\nline", "nul\0"] {
            assert!(validate_branch_name(name).is_err(), "{name:?}");
        }
    }
}
