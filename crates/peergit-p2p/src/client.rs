//! One-shot request client.

use crate::{dial, P2pError, PeerAddr, Result, DEFAULT_HELLO_TIMEOUT};
use peergit_identity::Keypair;
use peergit_protocol::{read_message, write_message, Envelope, HandshakeRequest, Rpc};
use std::time::Duration;

/// Sends requests to one daemon, each on a fresh stream.
#[derive(Debug, Clone)]
pub struct Client {
    keypair: Keypair,
    daemon: PeerAddr,
    hello_timeout: Duration,
}

impl Client {
    /// A client for `daemon`, identified by `keypair`.
    pub fn new(keypair: Keypair, daemon: PeerAddr) -> Self {
        Self {
            keypair,
            daemon,
            hello_timeout: DEFAULT_HELLO_TIMEOUT,
        }
    }

    /// Overrides the connect and authentication timeout.
    #[must_use]
    pub fn with_hello_timeout(mut self, timeout: Duration) -> Self {
        self.hello_timeout = timeout;
        self
    }

    /// The daemon this client talks to.
    #[must_use]
    pub fn daemon(&self) -> &PeerAddr {
        &self.daemon
    }

    /// Sends `request` and waits for its response.
    ///
    /// A daemon that closes the stream without answering (for example because
    /// this peer is not trusted) yields [`P2pError::NoResponse`]. A structured
    /// failure is returned as `Ok` with the failure payload.
    pub async fn call<R: Rpc>(&self, request: &R) -> Result<R::Response> {
        let mut stream = dial(&self.daemon, &self.keypair, self.hello_timeout).await?;
        let envelope = Envelope::request(request)?;

        tracing::debug!(daemon = %self.daemon.peer.short_id(), kind = %envelope.kind, "Sending request");

        if let Err(e) = write_message(stream.io_mut(), &envelope).await {
            return Err(if e.is_disconnect() {
                P2pError::NoResponse
            } else {
                e.into()
            });
        }

        let reply = match read_message(stream.io_mut()).await {
            Ok(reply) => reply,
            Err(e) if e.is_disconnect() => return Err(P2pError::NoResponse),
            Err(e) => return Err(e.into()),
        };

        Ok(reply.into_reply()?)
    }

    /// Asks the daemon operator to trust this client. Returns the decision.
    pub async fn handshake(&self) -> Result<bool> {
        let response = self.call(&HandshakeRequest::default()).await?;
        Ok(response.approved)
    }
}
