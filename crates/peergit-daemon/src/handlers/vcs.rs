//! Working tree handlers: commit, inspection, stash and reset.

use super::outcome;
use crate::paths::confine;
use crate::SessionHandler;
use peergit_git::Repo;
use peergit_protocol::{
    CommitRequest, CommitResponse, DiffRequest, DiffResponse, LogRequest, LogResponse, Reply, ResetRequest,
    ResetResponse, StashPopRequest, StashPopResponse, StashSaveRequest, StashSaveResponse, StatusRequest,
    StatusResponse,
};

pub(crate) async fn commit(ctx: &SessionHandler, request: CommitRequest) -> CommitResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return CommitResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let repo = Repo::new(ctx.backend(), &root);
    let (success, output) = outcome(repo.commit(&request.message, &request.branch, ctx.push_remote()).await);
    tracing::info!(repo = %request.repo_path, branch = %request.branch, success, "Commit finished");
    CommitResponse { success, output }
}

pub(crate) async fn status(ctx: &SessionHandler, request: StatusRequest) -> StatusResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return StatusResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).status().await);
    StatusResponse { success, output }
}

pub(crate) async fn log(ctx: &SessionHandler, request: LogRequest) -> LogResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return LogResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).log().await);
    LogResponse { success, output }
}

pub(crate) async fn diff(ctx: &SessionHandler, request: DiffRequest) -> DiffResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return DiffResponse::failure(reason),
    };
    // An empty path means the whole tree.
    let path = match request.file_path.as_deref().filter(|p| !p.is_empty()) {
        Some(file) => match confine(&root, file) {
            Ok(confined) => Some(confined.git_path()),
            Err(e) => return DiffResponse::failure(e.to_string()),
        },
        None => None,
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).diff(path.as_deref()).await);
    DiffResponse { success, output }
}

pub(crate) async fn stash_save(ctx: &SessionHandler, request: StashSaveRequest) -> StashSaveResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return StashSaveResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).stash_save().await);
    StashSaveResponse { success, output }
}

pub(crate) async fn stash_pop(ctx: &SessionHandler, request: StashPopRequest) -> StashPopResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return StashPopResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).stash_pop().await);
    StashPopResponse { success, output }
}

pub(crate) async fn reset(ctx: &SessionHandler, request: ResetRequest) -> ResetResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return ResetResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    tracing::warn!(repo = %request.repo_path, "Peer requested a hard reset");
    let (success, output) = outcome(Repo::new(ctx.backend(), &root).reset_hard().await);
    ResetResponse { success, output }
}
