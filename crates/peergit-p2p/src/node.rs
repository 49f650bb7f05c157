//! Listening node and authenticated streams.

use crate::{Challenge, P2pError, PeerAddr, Proof, Result, DEFAULT_HELLO_TIMEOUT, DEFAULT_PORT};
use peergit_identity::{Keypair, PeerId, PublicKey};
use peergit_protocol::{read_frame, write_frame, ProtocolError, Version, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::{TcpListener, TcpStream};

/// Configuration for a listening node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Limit for the authentication exchange on each inbound stream.
    pub hello_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            hello_timeout: DEFAULT_HELLO_TIMEOUT,
        }
    }
}

/// A stream whose remote end has proven its identity.
#[derive(Debug)]
pub struct PeerStream {
    peer: PeerId,
    remote: SocketAddr,
    io: BufStream<TcpStream>,
}

impl PeerStream {
    /// The authenticated remote peer.
    #[must_use]
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// The remote socket address.
    #[must_use]
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Buffered reader/writer for the rest of the stream.
    pub fn io_mut(&mut self) -> &mut BufStream<TcpStream> {
        &mut self.io
    }

    /// Flushes and closes the write half.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}

/// An accepted connection that has not authenticated yet.
#[derive(Debug)]
pub struct Incoming {
    stream: TcpStream,
    remote: SocketAddr,
    keypair: Arc<Keypair>,
    hello_timeout: Duration,
}

impl Incoming {
    /// The remote socket address.
    #[must_use]
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Challenges the dialer and verifies its proof.
    ///
    /// Fails if the exchange exceeds the node's hello timeout, the versions
    /// are incompatible, or the signature does not verify.
    pub async fn authenticate(self) -> Result<PeerStream> {
        let challenge = Challenge::new(PROTOCOL_VERSION, self.keypair.public_key());
        let mut io = BufStream::new(self.stream);

        let exchange = async {
            write_frame(&mut io, &challenge).await?;
            Ok::<Proof, ProtocolError>(read_frame(&mut io).await?)
        };
        let proof = tokio::time::timeout(self.hello_timeout, exchange)
            .await
            .map_err(|_| P2pError::Timeout("authentication"))??;

        check_version(proof.version)?;
        challenge
            .verify(&proof)
            .map_err(|e| P2pError::Authentication(e.to_string()))?;

        let peer = PeerId::from(proof.peer);
        tracing::debug!(peer = %peer.short_id(), remote = %self.remote, "Peer authenticated");

        Ok(PeerStream {
            peer,
            remote: self.remote,
            io,
        })
    }
}

/// Listens for peer streams.
pub struct Node {
    listener: TcpListener,
    keypair: Arc<Keypair>,
    config: NodeConfig,
}

impl Node {
    /// Binds the listen address.
    pub async fn bind(config: NodeConfig, keypair: Keypair) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;

        tracing::info!(
            peer_id = %keypair.public_key(),
            listen_addr = %listener.local_addr()?,
            "Node listening"
        );

        Ok(Self {
            listener,
            keypair: Arc::new(keypair),
            config,
        })
    }

    /// The node's public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The node's peer id.
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        PeerId::from(self.public_key())
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Address clients can dial, using the bound socket address.
    pub fn peer_addr(&self) -> Result<PeerAddr> {
        Ok(PeerAddr::new(self.peer_id(), self.local_addr()?.to_string()))
    }

    /// Waits for the next connection.
    ///
    /// Authentication is left to the caller so a slow dialer cannot stall
    /// the accept loop.
    pub async fn accept(&self) -> Result<Incoming> {
        let (stream, remote) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        tracing::trace!(remote = %remote, "Connection accepted");

        Ok(Incoming {
            stream,
            remote,
            keypair: Arc::clone(&self.keypair),
            hello_timeout: self.config.hello_timeout,
        })
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("peer_id", &self.peer_id())
            .field("listen_addr", &self.listener.local_addr().ok())
            .field("hello_timeout", &self.config.hello_timeout)
            .finish()
    }
}

/// Connects to `addr` and proves `keypair`'s identity.
///
/// Fails with [`P2pError::WrongPeer`] if the daemon's key is not the one in
/// `addr`.
pub async fn dial(addr: &PeerAddr, keypair: &Keypair, hello_timeout: Duration) -> Result<PeerStream> {
    let stream = tokio::time::timeout(hello_timeout, TcpStream::connect(addr.addr.as_str()))
        .await
        .map_err(|_| P2pError::Timeout("connect"))??;
    stream.set_nodelay(true)?;
    let remote = stream.peer_addr()?;
    let mut io = BufStream::new(stream);

    let challenge = tokio::time::timeout(hello_timeout, read_frame::<_, Challenge>(&mut io))
        .await
        .map_err(|_| P2pError::Timeout("authentication"))??;
    check_version(challenge.version)?;

    let node = PeerId::from(challenge.node);
    if node != addr.peer {
        return Err(P2pError::WrongPeer {
            expected: addr.peer,
            actual: node,
        });
    }

    write_frame(&mut io, &challenge.answer(PROTOCOL_VERSION, keypair)).await?;

    Ok(PeerStream {
        peer: node,
        remote,
        io,
    })
}

fn check_version(theirs: Version) -> Result<()> {
    if PROTOCOL_VERSION.is_compatible_with(&theirs) {
        Ok(())
    } else {
        Err(P2pError::IncompatibleVersion(theirs.to_string()))
    }
}
