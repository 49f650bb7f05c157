//! Branch handlers.

use super::outcome;
use crate::SessionHandler;
use peergit_git::Repo;
use peergit_protocol::{
    CreateBranchRequest, CreateBranchResponse, ListBranchesRequest, ListBranchesResponse, Reply,
    SwitchBranchRequest, SwitchBranchResponse,
};

pub(crate) async fn create_branch(ctx: &SessionHandler, request: CreateBranchRequest) -> CreateBranchResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return CreateBranchResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let (success, output) = outcome(Repo::new(ctx.backend(), &root).create_branch(&request.new_branch_name).await);
    CreateBranchResponse { success, output }
}

pub(crate) async fn list_branches(ctx: &SessionHandler, request: ListBranchesRequest) -> ListBranchesResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return ListBranchesResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    match Repo::new(ctx.backend(), &root).list_branches().await {
        Ok((branches, out)) if out.ok => ListBranchesResponse {
            success: true,
            branches,
            error: None,
        },
        Ok((_, out)) => ListBranchesResponse::failure(out.trimmed()),
        Err(e) => ListBranchesResponse::failure(e.to_string()),
    }
}

pub(crate) async fn switch_branch(ctx: &SessionHandler, request: SwitchBranchRequest) -> SwitchBranchResponse {
    let root = match ctx.resolve(&request.repo_path) {
        Ok(root) => root,
        Err(reason) => return SwitchBranchResponse::failure(reason),
    };
    let _guard = ctx.locks().lock(&root).await;

    let repo = Repo::new(ctx.backend(), &root);
    match peergit_git::switch_branch(&repo, &request.branch_name).await {
        Ok(switched) => {
            tracing::info!(
                repo = %request.repo_path,
                branch = %request.branch_name,
                outcome = ?switched,
                "Branch switch finished"
            );
            SwitchBranchResponse {
                success: switched.is_success(),
                output: switched.message(),
            }
        }
        Err(e) => SwitchBranchResponse::failure(e.to_string()),
    }
}
