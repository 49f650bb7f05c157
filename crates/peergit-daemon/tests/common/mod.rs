//! Shared fixtures for daemon tests.

#![allow(dead_code)]

use peergit_daemon::{SessionHandler, SessionOutcome, StaticApprover};
use peergit_git::{FakeGit, VcsBackend};
use peergit_identity::{Keypair, PeerId};
use peergit_protocol::{read_message, write_message, Envelope, ProtocolError, Reply, Rpc};
use peergit_store::{RepoRegistry, TrustStore, REGISTRY_FILE, TRUST_STORE_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufStream};

/// A session handler over two fake repositories, `web` and `api`, both on
/// `main`.
pub struct Harness {
    pub dir: TempDir,
    pub git: Arc<FakeGit>,
    pub approver: Arc<StaticApprover>,
    pub handler: Arc<SessionHandler>,
    pub web: PathBuf,
    pub api: PathBuf,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(StaticApprover::allow_all(), FakeGit::new())
    }

    pub fn denying() -> Self {
        Self::build(StaticApprover::deny_all(), FakeGit::new())
    }

    pub fn slow(delay: Duration) -> Self {
        Self::build(StaticApprover::allow_all(), FakeGit::new().with_delay(delay))
    }

    fn build(approver: StaticApprover, git: FakeGit) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let trust = TrustStore::open(data.join(TRUST_STORE_FILE)).unwrap();
        let registry = RepoRegistry::open(data.join(REGISTRY_FILE)).unwrap();

        let mut roots = Vec::new();
        for alias in ["web", "api"] {
            let path = dir.path().join(alias);
            std::fs::create_dir_all(&path).unwrap();
            let root = registry.link(alias, &path).unwrap();
            git.init_repo(&root, "main");
            roots.push(root);
        }
        let api = roots.pop().unwrap();
        let web = roots.pop().unwrap();

        let git = Arc::new(git);
        let approver = Arc::new(approver);
        let backend: Arc<dyn VcsBackend> = git.clone();
        let handler = SessionHandler::new(trust, registry, backend, approver.clone());

        Self {
            dir,
            git,
            approver,
            handler: Arc::new(handler),
            web,
            api,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// A peer that is already in the trust store.
    pub fn trusted_peer(&self) -> PeerId {
        let peer = random_peer();
        self.handler.trust().trust(peer).unwrap();
        peer
    }
}

pub fn random_peer() -> PeerId {
    PeerId::from(Keypair::generate().public_key())
}

/// Sends raw bytes as the request and returns the outcome and the reply, if
/// any was written.
pub async fn exchange_raw(handler: &SessionHandler, peer: PeerId, bytes: &[u8]) -> (SessionOutcome, Option<Envelope>) {
    let (client, server) = tokio::io::duplex(1 << 20);
    let mut client = BufStream::new(client);
    let mut server = BufStream::new(server);

    client.write_all(bytes).await.unwrap();
    client.flush().await.unwrap();
    if bytes.is_empty() {
        client.shutdown().await.unwrap();
    }

    let outcome = handler.handle(peer, &mut server).await;
    drop(server);

    let reply = match read_message(&mut client).await {
        Ok(envelope) => Some(envelope),
        Err(ProtocolError::Closed) => None,
        Err(e) => panic!("unexpected read error: {e}"),
    };
    (outcome, reply)
}

pub async fn exchange(handler: &SessionHandler, peer: PeerId, envelope: &Envelope) -> (SessionOutcome, Option<Envelope>) {
    let mut bytes = Vec::new();
    write_message(&mut bytes, envelope).await.unwrap();
    exchange_raw(handler, peer, &bytes).await
}

/// Sends a typed request and parses the typed response.
pub async fn call<R: Rpc>(handler: &SessionHandler, peer: PeerId, request: &R) -> R::Response {
    let envelope = Envelope::request(request).unwrap();
    let (_, reply) = exchange(handler, peer, &envelope).await;
    reply
        .expect("daemon closed the stream without a response")
        .into_reply::<R::Response>()
        .unwrap()
}

/// Asserts a typed response reported failure.
pub fn assert_failed<R: Reply>(response: &R) {
    assert!(!response.is_success(), "expected a failure response");
}

pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap()
}
