//! Repository registry handlers.

use crate::SessionHandler;
use peergit_protocol::{LinkRepoRequest, LinkRepoResponse, ListReposResponse};

pub(crate) async fn list_repos(ctx: &SessionHandler) -> ListReposResponse {
    ListReposResponse {
        repos: ctx.registry().aliases(),
    }
}

pub(crate) async fn link_repo(ctx: &SessionHandler, request: LinkRepoRequest) -> LinkRepoResponse {
    match ctx.registry().link(&request.alias, &request.path) {
        Ok(root) => {
            tracing::info!(alias = %request.alias, root = %root.display(), "Peer linked repository");
            LinkRepoResponse {
                success: true,
                error: None,
            }
        }
        Err(e) => LinkRepoResponse {
            success: false,
            error: Some(e.to_string()),
        },
    }
}
