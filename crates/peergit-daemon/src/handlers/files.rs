//! File handlers.

use crate::paths::{confine, ConfinedPath};
use crate::SessionHandler;
use peergit_git::Repo;
use peergit_protocol::{
    ListFilesRequest, ListFilesResponse, ReadFileRequest, ReadFileResponse, RenameFileRequest,
    RenameFileResponse, Reply, WriteFileRequest, WriteFileResponse,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub(crate) async fn list_files(ctx: &SessionHandler, request: ListFilesRequest) -> ListFilesResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return ListFilesResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    match tokio::task::spawn_blocking(move || walk(&root)).await {
        Ok(Ok(files)) => ListFilesResponse {
            success: true,
            files,
            error: None,
        },
        Ok(Err(reason)) => ListFilesResponse::failure(reason),
        Err(e) => ListFilesResponse::failure(format!("file listing failed: {e}")),
    }
}

/// Every regular file under `root` except the `.git` directory, as sorted
/// `/`-separated relative paths.
fn walk(root: &Path) -> Result<Vec<String>, String> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| e.to_string())?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.push(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        );
    }
    files.sort();
    Ok(files)
}

pub(crate) async fn read_file(ctx: &SessionHandler, request: ReadFileRequest) -> ReadFileResponse {
    let (root, path) = match resolve_one(ctx, &request.repo_path, &request.file_path) {
        Ok(found) => found,
        Err(reason) => return ReadFileResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    match tokio::fs::read(&path.absolute).await {
        Ok(bytes) => ReadFileResponse {
            success: true,
            content: String::from_utf8_lossy(&bytes).into_owned(),
            error: None,
        },
        Err(e) => ReadFileResponse::failure(format!("failed to read {}: {e}", request.file_path)),
    }
}

pub(crate) async fn write_file(ctx: &SessionHandler, request: WriteFileRequest) -> WriteFileResponse {
    let (root, path) = match resolve_one(ctx, &request.repo_path, &request.file_path) {
        Ok(found) => found,
        Err(reason) => return WriteFileResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let created = match create_parent(&root, &path.absolute).await {
        Ok(created) => created,
        Err(e) => {
            return WriteFileResponse::failure(format!("failed to create directories for {}: {e}", request.file_path))
        }
    };
    match tokio::fs::write(&path.absolute, request.content.as_bytes()).await {
        Ok(()) => {
            tracing::debug!(repo = %request.repo_path, file = %path.git_path(), bytes = request.content.len(), "File written");
            WriteFileResponse {
                success: true,
                error: None,
            }
        }
        Err(e) => {
            remove_created(created).await;
            WriteFileResponse::failure(format!("failed to write {}: {e}", request.file_path))
        }
    }
}

pub(crate) async fn rename_file(ctx: &SessionHandler, request: RenameFileRequest) -> RenameFileResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return RenameFileResponse::failure(reason),
    };
    let (old, new) = match (confine(&root, &request.old_path), confine(&root, &request.new_path)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => return RenameFileResponse::failure(e.to_string()),
    };
    let _guard = ctx.locks().lock(&root).await;

    match tokio::fs::try_exists(&old.absolute).await {
        Ok(true) => {}
        Ok(false) => return RenameFileResponse::failure(format!("failed to rename {}: no such file", request.old_path)),
        Err(e) => return RenameFileResponse::failure(format!("failed to rename {}: {e}", request.old_path)),
    }

    let repo = Repo::new(ctx.backend(), &root);
    let tracked = match repo.is_tracked(&old.git_path()).await {
        Ok(tracked) => tracked,
        Err(e) => return RenameFileResponse::failure(e.to_string()),
    };

    let created = match create_parent(&root, &new.absolute).await {
        Ok(created) => created,
        Err(e) => {
            return RenameFileResponse::failure(format!("failed to create directories for {}: {e}", request.new_path))
        }
    };

    let result = if tracked {
        match repo.move_tracked(&old.git_path(), &new.git_path()).await {
            Ok(out) if out.ok => Ok(()),
            Ok(out) => Err(out.output.trim().to_string()),
            Err(e) => Err(e.to_string()),
        }
    } else {
        tokio::fs::rename(&old.absolute, &new.absolute)
            .await
            .map_err(|e| format!("failed to rename {}: {e}", request.old_path))
    };

    match result {
        Ok(()) => {
            tracing::debug!(repo = %request.repo_path, from = %old.git_path(), to = %new.git_path(), tracked, "File renamed");
            RenameFileResponse {
                success: true,
                error: None,
            }
        }
        Err(reason) => {
            remove_created(created).await;
            RenameFileResponse::failure(reason)
        }
    }
}

fn resolve_one(ctx: &SessionHandler, alias: &str, file: &str) -> Result<(PathBuf, ConfinedPath), String> {
    let root = ctx.resolve(alias)?;
    let path = confine(&root, file).map_err(|e| e.to_string())?;
    Ok((root, path))
}

/// Creates the missing directories above `path`, stopping at `root`.
///
/// Returns the outermost directory that did not exist before, so a failed
/// operation can take it back out.
async fn create_parent(root: &Path, path: &Path) -> std::io::Result<Option<PathBuf>> {
    let Some(parent) = path.parent() else {
        return Ok(None);
    };

    let mut outermost = None;
    for dir in parent.ancestors().take_while(|dir| dir.starts_with(root) && *dir != root) {
        if tokio::fs::try_exists(dir).await? {
            break;
        }
        outermost = Some(dir.to_path_buf());
    }

    tokio::fs::create_dir_all(parent).await?;
    Ok(outermost)
}

async fn remove_created(created: Option<PathBuf>) {
    if let Some(dir) = created {
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove directories after a failed operation");
        }
    }
}
