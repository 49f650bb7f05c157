//! Request and response payloads.
//!
//! Field names are part of the wire format. `repo_path` carries a repository
//! alias, not a filesystem path; file paths are relative to the repository
//! root.

use crate::{Reply, RequestKind, ResponseKind, Rpc};
use serde::{Deserialize, Serialize};

/// Pairs a request payload with its response payload.
macro_rules! rpc {
    ($request:ty => $response:ty, $kind:ident) => {
        impl Rpc for $request {
            const KIND: RequestKind = RequestKind::$kind;
            type Response = $response;
        }
    };
}

/// Declares a `{success, output}` response payload.
macro_rules! output_response {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Whether the command succeeded.
            pub success: bool,
            /// Captured command output or a diagnostic.
            #[serde(default)]
            pub output: String,
        }

        impl Reply for $name {
            const KIND: ResponseKind = RequestKind::$kind.response();

            fn failure(reason: impl Into<String>) -> Self {
                Self {
                    success: false,
                    output: reason.into(),
                }
            }

            fn is_success(&self) -> bool {
                self.success
            }
        }
    };
}

/// Declares a response payload with `success`, optional `error`, and extra
/// fields that default to empty on failure.
macro_rules! error_response {
    ($(#[$meta:meta])* $name:ident, $kind:ident { $($(#[$fmeta:meta])* $field:ident: $ty:ty),* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Whether the command succeeded.
            pub success: bool,
            $(
                $(#[$fmeta])*
                #[serde(default)]
                pub $field: $ty,
            )*
            /// Why the command failed.
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub error: Option<String>,
        }

        impl Reply for $name {
            const KIND: ResponseKind = RequestKind::$kind.response();

            fn failure(reason: impl Into<String>) -> Self {
                Self {
                    success: false,
                    $($field: Default::default(),)*
                    error: Some(reason.into()),
                }
            }

            fn is_success(&self) -> bool {
                self.success
            }
        }
    };
}

// ==================== Handshake ====================

/// Asks the daemon operator to trust the sending peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {}

/// The operator's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// Whether the peer is now trusted.
    pub approved: bool,
}

impl Reply for HandshakeResponse {
    const KIND: ResponseKind = RequestKind::Handshake.response();

    fn failure(_reason: impl Into<String>) -> Self {
        Self { approved: false }
    }

    fn is_success(&self) -> bool {
        self.approved
    }
}

rpc!(HandshakeRequest => HandshakeResponse, Handshake);

// ==================== Repositories ====================

/// Lists the aliases of linked repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListReposRequest {}

/// Linked repository aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListReposResponse {
    /// Known aliases, sorted.
    #[serde(default)]
    pub repos: Vec<String>,
}

impl Reply for ListReposResponse {
    const KIND: ResponseKind = RequestKind::ListRepos.response();

    fn failure(_reason: impl Into<String>) -> Self {
        Self::default()
    }

    fn is_success(&self) -> bool {
        true
    }
}

rpc!(ListReposRequest => ListReposResponse, ListRepos);

/// Links a directory on the daemon under an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRepoRequest {
    /// Alias peers will use.
    pub alias: String,
    /// Directory on the daemon host.
    pub path: String,
}

error_response!(
    /// Result of linking a repository.
    LinkRepoResponse, LinkRepo {}
);

rpc!(LinkRepoRequest => LinkRepoResponse, LinkRepo);

// ==================== Files ====================

/// Lists files in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesRequest {
    /// Repository alias.
    pub repo_path: String,
}

error_response!(
    /// Files of a repository, relative to its root.
    ListFilesResponse, ListFiles {
        /// Relative file paths, sorted.
        files: Vec<String>
    }
);

rpc!(ListFilesRequest => ListFilesResponse, ListFiles);

/// Reads a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFileRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Path relative to the repository root.
    pub file_path: String,
}

error_response!(
    /// File contents.
    ReadFileResponse, ReadFile {
        /// The file's contents.
        content: String
    }
);

rpc!(ReadFileRequest => ReadFileResponse, ReadFile);

/// Writes a file, creating it if needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFileRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Path relative to the repository root.
    pub file_path: String,
    /// New contents.
    pub content: String,
}

error_response!(
    /// Result of a write.
    WriteFileResponse, WriteFile {}
);

rpc!(WriteFileRequest => WriteFileResponse, WriteFile);

/// Renames a file inside a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameFileRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Current path, relative to the repository root.
    pub old_path: String,
    /// New path, relative to the repository root.
    pub new_path: String,
}

error_response!(
    /// Result of a rename.
    RenameFileResponse, RenameFile {}
);

rpc!(RenameFileRequest => RenameFileResponse, RenameFile);

// ==================== Branches ====================

/// Creates a branch at HEAD without switching to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBranchRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Name of the new branch.
    pub new_branch_name: String,
}

output_response!(
    /// Result of creating a branch.
    CreateBranchResponse, CreateBranch
);

rpc!(CreateBranchRequest => CreateBranchResponse, CreateBranch);

/// Lists local branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBranchesRequest {
    /// Repository alias.
    pub repo_path: String,
}

error_response!(
    /// Local branch names.
    ListBranchesResponse, ListBranches {
        /// Branch names.
        branches: Vec<String>
    }
);

rpc!(ListBranchesRequest => ListBranchesResponse, ListBranches);

/// Switches branch, parking and restoring uncommitted work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchBranchRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Branch to switch to.
    pub branch_name: String,
}

output_response!(
    /// Result of a branch switch.
    SwitchBranchResponse, SwitchBranch
);

rpc!(SwitchBranchRequest => SwitchBranchResponse, SwitchBranch);

// ==================== Working tree ====================

/// Commits every change on a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Commit message.
    pub message: String,
    /// Branch to commit on.
    pub branch: String,
}

output_response!(
    /// Result of a commit.
    CommitResponse, Commit
);

rpc!(CommitRequest => CommitResponse, Commit);

/// Shows working tree status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    /// Repository alias.
    pub repo_path: String,
}

output_response!(
    /// Porcelain status.
    StatusResponse, Status
);

rpc!(StatusRequest => StatusResponse, Status);

/// Shows recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRequest {
    /// Repository alias.
    pub repo_path: String,
}

output_response!(
    /// Rendered log.
    LogResponse, Log
);

rpc!(LogRequest => LogResponse, Log);

/// Shows unstaged changes, for the whole tree or one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRequest {
    /// Repository alias.
    pub repo_path: String,
    /// Restricts the diff to one file. Empty means the whole tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

output_response!(
    /// Rendered diff.
    DiffResponse, Diff
);

rpc!(DiffRequest => DiffResponse, Diff);

/// Stashes working tree changes, untracked files included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashSaveRequest {
    /// Repository alias.
    pub repo_path: String,
}

output_response!(
    /// Result of a stash.
    StashSaveResponse, StashSave
);

rpc!(StashSaveRequest => StashSaveResponse, StashSave);

/// Pops the most recent stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashPopRequest {
    /// Repository alias.
    pub repo_path: String,
}

output_response!(
    /// Result of a stash pop.
    StashPopResponse, StashPop
);

rpc!(StashPopRequest => StashPopResponse, StashPop);

/// Discards every uncommitted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    /// Repository alias.
    pub repo_path: String,
}

output_response!(
    /// Result of a reset.
    ResetResponse, Reset
);

rpc!(ResetRequest => ResetResponse, Reset);
