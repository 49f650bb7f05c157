//! Confinement of peer-supplied paths to a repository root.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Why a peer path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path is absolute or climbs above the repository root.
    #[error("access denied: path is outside of repository root")]
    OutsideRoot,

    /// The path points into the repository's `.git` directory.
    #[error("access denied: path is inside the .git directory")]
    GitDir,
}

/// A peer path that resolves inside its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath {
    /// Root joined with the normalised relative path.
    pub absolute: PathBuf,
    /// Normalised path relative to the root.
    pub relative: PathBuf,
}

impl ConfinedPath {
    /// The relative path with `/` separators, as git expects it.
    #[must_use]
    pub fn git_path(&self) -> String {
        self.relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Resolves `relative` against `root` without touching the filesystem.
///
/// Absolute paths, drive prefixes and `..` components that would leave the
/// root are refused, as is anything under the top-level `.git` directory.
/// Symlinks inside the repository are not followed here.
pub fn confine(root: &Path, relative: &str) -> Result<ConfinedPath, PathError> {
    let mut normalised = PathBuf::new();
    let mut depth = 0usize;

    for component in Path::new(relative).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return Err(PathError::OutsideRoot),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::OutsideRoot);
                }
                normalised.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                normalised.push(name);
                depth += 1;
            }
        }
    }

    if let Some(Component::Normal(first)) = normalised.components().next() {
        if first.to_string_lossy().eq_ignore_ascii_case(".git") {
            return Err(PathError::GitDir);
        }
    }

    let absolute = root.join(&normalised);
    if !absolute.starts_with(root) {
        return Err(PathError::OutsideRoot);
    }

    Ok(ConfinedPath {
        absolute,
        relative: normalised,
    })
}
