//! Branch-tagged stash entries.

use std::fmt;

/// Prefix of every stash message created by a branch switch.
pub const STASH_TAG_PREFIX: &str = "p2p-auto-stash-for-";

/// Stash message that identifies work parked for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StashTag(String);

impl StashTag {
    /// The tag for work left on `branch`.
    #[must_use]
    pub fn for_branch(branch: &str) -> Self {
        Self(format!("{STASH_TAG_PREFIX}{branch}"))
    }

    /// The message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StashTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of `git stash list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// Reference usable with `git stash pop`, e.g. `stash@{2}`.
    pub reference: String,
    /// The stash message, without the `On <branch>:` prefix.
    pub message: String,
}

/// Parses `git stash list` output, most recent entry first.
///
/// Lines look like `stash@{0}: On main: message`. The message is the text after
/// the last `": "`; branch names cannot contain `:`, so a tag always survives
/// intact. Lines without a `stash@{` reference are ignored.
#[must_use]
pub fn parse_stash_list(output: &str) -> Vec<StashEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (reference, rest) = line.split_once(": ")?;
            if !reference.starts_with("stash@{") {
                return None;
            }
            let message = rest.rsplit_once(": ").map_or(rest, |(_, m)| m);
            Some(StashEntry {
                reference: reference.to_string(),
                message: message.trim_end().to_string(),
            })
        })
        .collect()
}

/// Finds the most recent entry whose message is exactly `tag`.
#[must_use]
pub fn find_stash<'a>(entries: &'a [StashEntry], tag: &StashTag) -> Option<&'a StashEntry> {
    entries.iter().find(|entry| entry.message == tag.as_str())
}
