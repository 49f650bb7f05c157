//! Dispatch of requests to their handlers.

use crate::handlers::{branches, files, repos, vcs};
use crate::handshake;
use crate::SessionHandler;
use peergit_identity::PeerId;
use peergit_protocol::{
    codec, CommitRequest, CreateBranchRequest, DiffRequest, Envelope, HandshakeRequest, LinkRepoRequest, ListBranchesRequest,
    ListFilesRequest, ListReposRequest, LogRequest, ProtocolError, ReadFileRequest, RenameFileRequest,
    Reply, RequestKind, ResetRequest, ResponseKind, Rpc, StashPopRequest, StashSaveRequest, StatusRequest,
    SwitchBranchRequest, WriteFileRequest,
};
use std::future::Future;

/// An encoded response frame ready to be written.
#[derive(Debug)]
pub(crate) struct Routed {
    pub(crate) kind: ResponseKind,
    pub(crate) frame: Vec<u8>,
    pub(crate) success: bool,
}

/// Runs the handler for `kind` on the envelope's payload.
///
/// Trust is checked by the caller; only handshakes reach here from untrusted
/// peers.
pub(crate) async fn dispatch(
    ctx: &SessionHandler,
    peer: PeerId,
    kind: RequestKind,
    envelope: &Envelope,
) -> Result<Routed, ProtocolError> {
    match kind {
        RequestKind::Handshake => {
            respond(envelope, move |_: HandshakeRequest| handshake::answer(ctx, peer)).await
        }
        RequestKind::ListRepos => respond(envelope, move |_: ListReposRequest| repos::list_repos(ctx)).await,
        RequestKind::LinkRepo => respond(envelope, move |r: LinkRepoRequest| repos::link_repo(ctx, r)).await,
        RequestKind::ListFiles => respond(envelope, move |r: ListFilesRequest| files::list_files(ctx, r)).await,
        RequestKind::ReadFile => respond(envelope, move |r: ReadFileRequest| files::read_file(ctx, r)).await,
        RequestKind::WriteFile => respond(envelope, move |r: WriteFileRequest| files::write_file(ctx, r)).await,
        RequestKind::RenameFile => {
            respond(envelope, move |r: RenameFileRequest| files::rename_file(ctx, r)).await
        }
        RequestKind::CreateBranch => {
            respond(envelope, move |r: CreateBranchRequest| branches::create_branch(ctx, r)).await
        }
        RequestKind::ListBranches => {
            respond(envelope, move |r: ListBranchesRequest| branches::list_branches(ctx, r)).await
        }
        RequestKind::SwitchBranch => {
            respond(envelope, move |r: SwitchBranchRequest| branches::switch_branch(ctx, r)).await
        }
        RequestKind::Commit => respond(envelope, move |r: CommitRequest| vcs::commit(ctx, r)).await,
        RequestKind::Status => respond(envelope, move |r: StatusRequest| vcs::status(ctx, r)).await,
        RequestKind::Log => respond(envelope, move |r: LogRequest| vcs::log(ctx, r)).await,
        RequestKind::Diff => respond(envelope, move |r: DiffRequest| vcs::diff(ctx, r)).await,
        RequestKind::StashSave => respond(envelope, move |r: StashSaveRequest| vcs::stash_save(ctx, r)).await,
        RequestKind::StashPop => respond(envelope, move |r: StashPopRequest| vcs::stash_pop(ctx, r)).await,
        RequestKind::Reset => respond(envelope, move |r: ResetRequest| vcs::reset(ctx, r)).await,
    }
}

/// Parses the payload as `R` and runs `handler`, or answers a structured
/// failure if the payload does not parse.
async fn respond<R, F, Fut>(envelope: &Envelope, handler: F) -> Result<Routed, ProtocolError>
where
    R: Rpc,
    F: FnOnce(R) -> Fut,
    Fut: Future<Output = R::Response>,
{
    let response = match envelope.parse_payload::<R>() {
        Ok(request) => handler(request).await,
        Err(e) => {
            tracing::warn!(request = %envelope.kind, error = %e, "Invalid request payload");
            R::Response::failure(format!("invalid {} payload: {e}", envelope.kind))
        }
    };

    let frame = match codec::encode(&Envelope::reply(&response)?) {
        Ok(frame) => frame,
        Err(ProtocolError::TooLarge { max }) => {
            tracing::warn!(request = %envelope.kind, max, "Response exceeds the frame limit");
            let failure = R::Response::failure(format!("response exceeds the {max} byte frame limit"));
            return Ok(Routed {
                kind: <R::Response as Reply>::KIND,
                success: false,
                frame: codec::encode(&Envelope::reply(&failure)?)?,
            });
        }
        Err(e) => return Err(e),
    };

    Ok(Routed {
        kind: <R::Response as Reply>::KIND,
        success: response.is_success(),
        frame,
    })
}
