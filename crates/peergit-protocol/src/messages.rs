//! Envelope and message kind definitions.

use crate::{ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of a request, parsed from the envelope's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Ask the daemon operator to trust this peer.
    Handshake,
    /// List linked repository aliases.
    ListRepos,
    /// List files of a repository.
    ListFiles,
    /// Read a file.
    ReadFile,
    /// Write a file.
    WriteFile,
    /// Rename a file.
    RenameFile,
    /// Link a repository under an alias.
    LinkRepo,
    /// Create a branch.
    CreateBranch,
    /// List branches.
    ListBranches,
    /// Switch branch with stash reconciliation.
    SwitchBranch,
    /// Commit all changes.
    Commit,
    /// Working tree status.
    Status,
    /// Recent history.
    Log,
    /// Working tree diff.
    Diff,
    /// Stash working tree changes.
    StashSave,
    /// Pop the most recent stash.
    StashPop,
    /// Hard reset to HEAD.
    Reset,
}

impl RequestKind {
    /// Every request kind.
    pub const ALL: [RequestKind; 17] = [
        Self::Handshake,
        Self::ListRepos,
        Self::ListFiles,
        Self::ReadFile,
        Self::WriteFile,
        Self::RenameFile,
        Self::LinkRepo,
        Self::CreateBranch,
        Self::ListBranches,
        Self::SwitchBranch,
        Self::Commit,
        Self::Status,
        Self::Log,
        Self::Diff,
        Self::StashSave,
        Self::StashPop,
        Self::Reset,
    ];

    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Handshake => "HANDSHAKE_REQUEST",
            Self::ListRepos => "LIST_REPOS_REQUEST",
            Self::ListFiles => "LIST_FILES_REQUEST",
            Self::ReadFile => "READ_FILE_REQUEST",
            Self::WriteFile => "WRITE_FILE_REQUEST",
            Self::RenameFile => "RENAME_FILE_REQUEST",
            Self::LinkRepo => "LINK_REPO_REQUEST",
            Self::CreateBranch => "CREATE_BRANCH_REQUEST",
            Self::ListBranches => "LIST_BRANCHES_REQUEST",
            Self::SwitchBranch => "SWITCH_BRANCH_REQUEST",
            Self::Commit => "GIT_COMMIT_REQUEST",
            Self::Status => "GIT_STATUS_REQUEST",
            Self::Log => "GIT_LOG_REQUEST",
            Self::Diff => "GIT_DIFF_REQUEST",
            Self::StashSave => "GIT_STASH_SAVE_REQUEST",
            Self::StashPop => "GIT_STASH_POP_REQUEST",
            Self::Reset => "GIT_RESET_REQUEST",
        }
    }

    /// Parses a wire tag. Unknown tags return `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Returns the response kind paired with this request.
    #[must_use]
    pub const fn response(self) -> ResponseKind {
        ResponseKind(self)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The kind of a response.
///
/// Every response answers exactly one request kind, so the response kind is a
/// thin wrapper over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseKind(RequestKind);

impl ResponseKind {
    /// Returns the request kind this response answers.
    #[must_use]
    pub const fn request(self) -> RequestKind {
        self.0
    }

    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self.0 {
            RequestKind::Handshake => "HANDSHAKE_RESPONSE",
            RequestKind::ListRepos => "LIST_REPOS_RESPONSE",
            RequestKind::ListFiles => "LIST_FILES_RESPONSE",
            RequestKind::ReadFile => "READ_FILE_RESPONSE",
            RequestKind::WriteFile => "WRITE_FILE_RESPONSE",
            RequestKind::RenameFile => "RENAME_FILE_RESPONSE",
            RequestKind::LinkRepo => "LINK_REPO_RESPONSE",
            RequestKind::CreateBranch => "CREATE_BRANCH_RESPONSE",
            RequestKind::ListBranches => "LIST_BRANCHES_RESPONSE",
            RequestKind::SwitchBranch => "SWITCH_BRANCH_RESPONSE",
            RequestKind::Commit => "GIT_COMMIT_RESPONSE",
            RequestKind::Status => "GIT_STATUS_RESPONSE",
            RequestKind::Log => "GIT_LOG_RESPONSE",
            RequestKind::Diff => "GIT_DIFF_RESPONSE",
            RequestKind::StashSave => "GIT_STASH_SAVE_RESPONSE",
            RequestKind::StashPop => "GIT_STASH_POP_RESPONSE",
            RequestKind::Reset => "GIT_RESET_RESPONSE",
        }
    }

    /// Parses a wire tag. Unknown tags return `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        RequestKind::ALL
            .into_iter()
            .map(RequestKind::response)
            .find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A request payload with a statically known response type.
pub trait Rpc: Serialize + DeserializeOwned + Send + Sync {
    /// The request kind this payload is sent as.
    const KIND: RequestKind;

    /// The payload the daemon answers with.
    type Response: Reply;
}

/// A response payload.
pub trait Reply: Serialize + DeserializeOwned + Send + Sync {
    /// The response kind this payload is sent as.
    const KIND: ResponseKind;

    /// Builds a structured failure carrying a human-readable reason.
    fn failure(reason: impl Into<String>) -> Self;

    /// Returns true if the daemon reported success.
    fn is_success(&self) -> bool;
}

/// A message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The type tag, which fixes the schema of `payload`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The type-specific payload.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Wraps a request payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn request<R: Rpc>(request: &R) -> Result<Self> {
        Ok(Self {
            kind: R::KIND.tag().to_string(),
            payload: to_value(request)?,
        })
    }

    /// Wraps a response payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn reply<R: Reply>(response: &R) -> Result<Self> {
        Ok(Self {
            kind: R::KIND.tag().to_string(),
            payload: to_value(response)?,
        })
    }

    /// Returns the request kind named by the tag, if it is one.
    #[must_use]
    pub fn request_kind(&self) -> Option<RequestKind> {
        RequestKind::from_tag(&self.kind)
    }

    /// Returns the response kind named by the tag, if it is one.
    #[must_use]
    pub fn response_kind(&self) -> Option<ResponseKind> {
        ResponseKind::from_tag(&self.kind)
    }

    /// Parses the payload as `T`. A missing or `null` payload parses as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] if the payload does not match `T`.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = match &self.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Checks the tag against `R` and parses the payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedKind`] for a different tag and
    /// [`ProtocolError::Malformed`] for a payload that does not parse.
    pub fn into_reply<R: Reply>(self) -> Result<R> {
        if self.kind != R::KIND.tag() {
            return Err(ProtocolError::UnexpectedKind {
                expected: R::KIND.tag().to_string(),
                actual: self.kind,
            });
        }
        self.parse_payload()
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandshakeRequest, ReadFileRequest, ReadFileResponse};
    use pretty_assertions::assert_eq;

    #[test]
    fn every_tag_parses_back() {
        for kind in RequestKind::ALL {
            assert_eq!(RequestKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(
                ResponseKind::from_tag(kind.response().tag()),
                Some(kind.response())
            );
            assert_eq!(RequestKind::from_tag(kind.response().tag()), None);
        }
        assert_eq!(RequestKind::from_tag("DELETE_EVERYTHING_REQUEST"), None);
    }

    #[test]
    fn request_envelope_shape() {
        let envelope = Envelope::request(&ReadFileRequest {
            repo_path: "proj".into(),
            file_path: "README.md".into(),
        })
        .unwrap();

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({
                "type": "READ_FILE_REQUEST",
                "payload": {"repo_path": "proj", "file_path": "README.md"}
            })
        );
    }

    #[test]
    fn null_payload_parses_as_empty_object() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"HANDSHAKE_REQUEST","payload":null}"#).unwrap();
        assert_eq!(envelope.request_kind(), Some(RequestKind::Handshake));
        let _: HandshakeRequest = envelope.parse_payload().unwrap();

        let envelope: Envelope = serde_json::from_str(r#"{"type":"HANDSHAKE_REQUEST"}"#).unwrap();
        let _: HandshakeRequest = envelope.parse_payload().unwrap();
    }

    #[test]
    fn missing_field_is_malformed() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"READ_FILE_REQUEST","payload":{"repo_path":"p"}}"#)
                .unwrap();
        assert!(matches!(
            envelope.parse_payload::<ReadFileRequest>(),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn into_reply_checks_tag() {
        let envelope = Envelope::reply(&ReadFileResponse::failure("nope")).unwrap();
        let err = envelope
            .clone()
            .into_reply::<crate::WriteFileResponse>()
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedKind { .. }));

        let reply: ReadFileResponse = envelope.into_reply().unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("nope"));
    }
}
