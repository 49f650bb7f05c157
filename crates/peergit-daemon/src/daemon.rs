//! Daemon startup and the accept loop.

use crate::{Approver, DaemonConfig, DaemonError, Result, SessionHandler, SessionOutcome};
use peergit_git::VcsBackend;
use peergit_identity::keyfile;
use peergit_identity::PeerId;
use peergit_p2p::{Incoming, Node, NodeConfig, PeerAddr};
use peergit_store::{RepoRegistry, TrustStore, REGISTRY_FILE, TRUST_STORE_FILE};
use std::future::Future;
use std::sync::Arc;

/// A daemon that is bound and ready to serve.
#[derive(Debug)]
pub struct Daemon {
    node: Node,
    handler: Arc<SessionHandler>,
}

impl Daemon {
    /// Loads state from the data directory, applies the configured seeds and
    /// binds the listen address.
    ///
    /// # Errors
    ///
    /// Fails if the data directory or identity key is unusable, a configured
    /// peer id or repository cannot be recorded, no repository is linked, or
    /// the address cannot be bound.
    pub async fn start(
        config: &DaemonConfig,
        backend: Arc<dyn VcsBackend>,
        approver: Arc<dyn Approver>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let (keypair, _) = keyfile::load_or_generate(&config.identity_path())?;

        let trust = TrustStore::open(config.data_dir.join(TRUST_STORE_FILE))?;
        for entry in &config.trusted_peers {
            let peer: PeerId = entry
                .parse()
                .map_err(|e| DaemonError::Config(format!("invalid trusted peer '{entry}': {e}")))?;
            trust.trust(peer)?;
        }

        let registry = RepoRegistry::open(config.data_dir.join(REGISTRY_FILE))?;
        for (alias, root) in &config.repos {
            registry.link(alias, root)?;
        }
        if registry.is_empty() {
            return Err(DaemonError::NoRepositories);
        }

        let handler = SessionHandler::new(trust, registry, backend, approver)
            .with_push_remote(config.push_remote.clone());
        tracing::info!(
            trusted_peers = handler.trust().len(),
            repos = ?handler.registry().aliases(),
            push_remote = ?config.push_remote,
            "Daemon state loaded"
        );

        let node = Node::bind(
            NodeConfig {
                listen_addr: config.listen_addr,
                hello_timeout: config.hello_timeout(),
            },
            keypair,
        )
        .await?;

        Ok(Self {
            node,
            handler: Arc::new(handler),
        })
    }

    /// The address clients should dial.
    ///
    /// # Errors
    ///
    /// Fails if the listener's local address cannot be read.
    pub fn peer_addr(&self) -> Result<PeerAddr> {
        Ok(self.node.peer_addr()?)
    }

    /// The shared session handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<SessionHandler> {
        &self.handler
    }

    /// Accepts streams until `shutdown` resolves, serving each on its own
    /// task.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; accept failures are logged and the loop
    /// keeps going.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested; no longer accepting streams");
                    return Ok(());
                }
                accepted = self.node.accept() => match accepted {
                    Ok(incoming) => {
                        tokio::spawn(serve(Arc::clone(&self.handler), incoming));
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                },
            }
        }
    }
}

async fn serve(handler: Arc<SessionHandler>, incoming: Incoming) {
    let remote = incoming.remote();
    let mut stream = match incoming.authenticate().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(remote = %remote, error = %e, "Peer failed authentication");
            return;
        }
    };

    let peer = stream.peer();

    match handler.handle(peer, stream.io_mut()).await {
        SessionOutcome::Responded(kind) => tracing::debug!(peer = %peer.short_id(), response = %kind, "Stream done"),
        SessionOutcome::Disconnected => tracing::debug!(peer = %peer.short_id(), "Peer disconnected"),
        SessionOutcome::ProtocolViolation(_) => {}
    }
}
