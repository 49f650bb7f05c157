//! Alias → repository root mapping.

use crate::{persist, Result, StoreError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Thread-safe registry of linked repositories.
///
/// Peers never see filesystem paths; every repository-scoped request names an
/// alias that is resolved here. Aliases are kept sorted.
#[derive(Debug)]
pub struct RepoRegistry {
    path: PathBuf,
    repos: RwLock<BTreeMap<String, PathBuf>>,
}

impl RepoRegistry {
    /// Loads the registry at `path`, starting empty if the file is absent.
    ///
    /// Roots are cleaned on load. Entries with an invalid alias or a relative
    /// root are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored: BTreeMap<String, PathBuf> = persist::load(&path)?.unwrap_or_default();

        let mut repos = BTreeMap::new();
        for (alias, root) in stored {
            if let Err(e) = validate_alias(&alias) {
                tracing::warn!(path = %path.display(), alias = %alias, error = %e, "Skipping invalid registry entry");
                continue;
            }
            if !root.is_absolute() {
                tracing::warn!(path = %path.display(), alias = %alias, root = %root.display(), "Skipping relative repository root");
                continue;
            }
            repos.insert(alias, clean_path(&root));
        }

        tracing::debug!(path = %path.display(), count = repos.len(), "Loaded repository registry");

        Ok(Self {
            path,
            repos: RwLock::new(repos),
        })
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the root directory linked under `alias`.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<PathBuf> {
        self.repos.read().get(alias).cloned()
    }

    /// Returns all aliases in sorted order.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        self.repos.read().keys().cloned().collect()
    }

    /// Returns every alias with its root, sorted by alias.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, PathBuf)> {
        self.repos
            .read()
            .iter()
            .map(|(alias, root)| (alias.clone(), root.clone()))
            .collect()
    }

    /// Returns the number of linked repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.read().len()
    }

    /// Returns true if nothing is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repos.read().is_empty()
    }

    /// Links `alias` to `root` and persists the registry.
    ///
    /// Relative roots are resolved against the current working directory and
    /// lexically cleaned. Relinking an existing alias replaces its root. The
    /// stored root is returned.
    pub fn link(&self, alias: &str, root: impl AsRef<Path>) -> Result<PathBuf> {
        validate_alias(alias)?;
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(StoreError::InvalidPath {
                path: String::new(),
                reason: "path is empty".into(),
            });
        }

        let absolute = std::path::absolute(root).map_err(|e| StoreError::InvalidPath {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        let cleaned = clean_path(&absolute);

        let mut repos = self.repos.write();
        let previous = repos.insert(alias.to_string(), cleaned.clone());
        if let Err(e) = persist::save(&self.path, &*repos) {
            match previous {
                Some(old) => repos.insert(alias.to_string(), old),
                None => repos.remove(alias),
            };
            return Err(e);
        }

        tracing::info!(alias = %alias, root = %cleaned.display(), "Repository linked");
        Ok(cleaned)
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() || alias.contains(':') || alias.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidAlias(alias.to_string()));
    }
    Ok(())
}

/// Splits an `alias:path` argument at its first colon.
pub fn parse_link_spec(spec: &str) -> Result<(String, PathBuf)> {
    let (alias, path) = spec.split_once(':').ok_or_else(|| StoreError::InvalidPath {
        path: spec.to_string(),
        reason: "expected alias:path".into(),
    })?;
    validate_alias(alias)?;
    if path.is_empty() {
        return Err(StoreError::InvalidPath {
            path: spec.to_string(),
            reason: "path is empty".into(),
        });
    }
    Ok((alias.to_string(), PathBuf::from(path)))
}

/// Normalizes a path without touching the filesystem.
///
/// `.` components are dropped and `..` pops the previous normal component.
/// A `..` that would climb above the root of an absolute path is discarded;
/// on a relative path it is kept.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
