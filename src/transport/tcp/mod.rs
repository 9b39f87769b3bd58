// Copyright 2024 litep2p developers
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! TCP transport.

use crate::{error::AddressError, transport::Transport, Error, PeerId};

use multiaddr::{Multiaddr, Protocol};
use tokio::net::TcpStream;

use std::net::{IpAddr, SocketAddr};

/// Logging target for the file.
const LOG_TARGET: &str = "limit-dialer::tcp";

/// Address type.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AddressType {
    /// Socket address.
    Socket(SocketAddr),

    /// DNS address.
    Dns(String, u16),
}

/// TCP transport.
///
/// Opens a raw [`TcpStream`] to `/ip4`, `/ip6`, `/dns`, `/dns4` and `/dns6` addresses
/// followed by `/tcp/<port>` and an optional `/p2p/<peer>`.
#[derive(Debug, Default, Clone)]
pub struct TcpTransport {
    /// Peer every dialed address must belong to, if known.
    expected_peer: Option<PeerId>,

    /// Whether `TCP_NODELAY` is set on opened streams.
    nodelay: bool,
}

impl TcpTransport {
    /// Create new [`TcpTransport`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject addresses whose `/p2p/` component names a peer other than `peer`.
    pub fn with_expected_peer(mut self, peer: PeerId) -> Self {
        self.expected_peer = Some(peer);
        self
    }

    /// Set `TCP_NODELAY` on opened streams.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Extract socket address and `PeerId`, if found, from `address`.
    pub(crate) fn get_socket_address(
        address: &Multiaddr,
    ) -> crate::Result<(AddressType, Option<PeerId>)> {
        tracing::trace!(target: LOG_TARGET, ?address, "parse multi address");

        let mut iter = address.iter();
        let socket_address = match iter.next() {
            Some(Protocol::Ip6(address)) => match iter.next() {
                Some(Protocol::Tcp(port)) =>
                    AddressType::Socket(SocketAddr::new(IpAddr::V6(address), port)),
                protocol => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        ?protocol,
                        "invalid transport protocol, expected `Tcp`",
                    );
                    return Err(Error::AddressError(AddressError::InvalidProtocol));
                }
            },
            Some(Protocol::Ip4(address)) => match iter.next() {
                Some(Protocol::Tcp(port)) =>
                    AddressType::Socket(SocketAddr::new(IpAddr::V4(address), port)),
                protocol => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        ?protocol,
                        "invalid transport protocol, expected `Tcp`",
                    );
                    return Err(Error::AddressError(AddressError::InvalidProtocol));
                }
            },
            Some(Protocol::Dns(address))
            | Some(Protocol::Dns4(address))
            | Some(Protocol::Dns6(address)) => match iter.next() {
                Some(Protocol::Tcp(port)) => AddressType::Dns(address.to_string(), port),
                protocol => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        ?protocol,
                        "invalid transport protocol, expected `Tcp`",
                    );
                    return Err(Error::AddressError(AddressError::InvalidProtocol));
                }
            },
            protocol => {
                tracing::debug!(target: LOG_TARGET, ?protocol, "invalid transport protocol");
                return Err(Error::AddressError(AddressError::InvalidProtocol));
            }
        };

        let maybe_peer = match iter.next() {
            Some(Protocol::P2p(multihash)) => Some(PeerId::from_multihash(multihash)?),
            None => None,
            protocol => {
                tracing::debug!(
                    target: LOG_TARGET,
                    ?protocol,
                    "invalid protocol, expected `P2p` or `None`"
                );
                return Err(Error::AddressError(AddressError::InvalidProtocol));
            }
        };

        Ok((socket_address, maybe_peer))
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    type Connection = TcpStream;

    async fn dial(&self, address: Multiaddr) -> crate::Result<TcpStream> {
        let (socket_address, peer) = Self::get_socket_address(&address)?;

        if let (Some(expected), Some(peer)) = (self.expected_peer, peer) {
            if expected != peer {
                tracing::debug!(
                    target: LOG_TARGET,
                    ?expected,
                    ?peer,
                    ?address,
                    "address belongs to another peer",
                );
                return Err(Error::AddressError(AddressError::PeerIdMismatch(peer)));
            }
        }

        tracing::trace!(target: LOG_TARGET, ?address, "open connection");

        let stream = match socket_address {
            AddressType::Socket(socket_address) => TcpStream::connect(socket_address).await?,
            AddressType::Dns(address, port) => TcpStream::connect(format!("{address}:{port}")).await?,
        };

        if self.nodelay {
            stream.set_nodelay(true)?;
        }

        Ok(stream)
    }
}
