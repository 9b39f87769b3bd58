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

//! Errors reported by the dialer and its transports.

use crate::peer_id::PeerId;

use multiaddr::Multiaddr;
use multihash::Multihash;

use std::{
    io::{self, ErrorKind},
    time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: `{0}`")]
    IoError(ErrorKind),
    #[error("Address error: `{0}`")]
    AddressError(AddressError),
    #[error("Invalid data")]
    InvalidData,
    #[error("Transport error: `{0}`")]
    TransportError(String),
    #[error("Invalid configuration: `{0}`")]
    InvalidConfiguration(String),
    #[error("Essential task closed")]
    EssentialTaskClosed,
    #[error("No addresses to dial for `{0}`")]
    NoAddresses(PeerId),
    #[error("All {} dial(s) to `{peer}` failed", .errors.len())]
    AllDialsFailed {
        /// Peer that was dialed.
        peer: PeerId,

        /// Per-address errors in the order they were observed.
        errors: Vec<DialError>,
    },
}

/// Failure of a single dial attempt.
#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("Failed to connect to `{address}`: `{error}`")]
    ConnectionFailed {
        /// Dialed address.
        address: Multiaddr,

        /// Error returned by the transport.
        error: Error,
    },
    #[error("Dial to `{address}` timed out after {timeout:?}")]
    DialTimeout {
        /// Dialed address.
        address: Multiaddr,

        /// Timeout that elapsed.
        timeout: Duration,
    },
    #[error("Dial to `{address}` canceled before it was started")]
    Canceled {
        /// Address that was never dialed.
        address: Multiaddr,
    },
}

impl DialError {
    /// Get the address the failed attempt targeted.
    pub fn address(&self) -> &Multiaddr {
        match self {
            Self::ConnectionFailed { address, .. } => address,
            Self::DialTimeout { address, .. } => address,
            Self::Canceled { address } => address,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid protocol")]
    InvalidProtocol,
    #[error("Address belongs to another peer: `{0}`")]
    PeerIdMismatch(PeerId),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::IoError(error.kind())
    }
}

impl From<AddressError> for Error {
    fn from(error: AddressError) -> Error {
        Error::AddressError(error)
    }
}

impl From<Multihash> for Error {
    fn from(_: Multihash) -> Self {
        Error::InvalidData
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::EssentialTaskClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_error_address() {
        let address: Multiaddr = "/ip4/127.0.0.1/tcp/8888".parse().unwrap();

        let error = DialError::DialTimeout {
            address: address.clone(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(error.address(), &address);

        let error = DialError::ConnectionFailed {
            address: address.clone(),
            error: Error::IoError(ErrorKind::ConnectionRefused),
        };
        assert_eq!(error.address(), &address);
    }

    #[test]
    fn all_dials_failed_reports_count() {
        let address: Multiaddr = "/ip6/::1/tcp/1".parse().unwrap();
        let error = Error::AllDialsFailed {
            peer: PeerId::random(),
            errors: vec![
                DialError::Canceled {
                    address: address.clone(),
                },
                DialError::Canceled { address },
            ],
        };

        assert!(error.to_string().starts_with("All 2 dial(s)"));
    }

    #[test]
    fn io_error_keeps_kind() {
        let error: Error = io::Error::from(ErrorKind::ConnectionRefused).into();
        assert!(std::matches!(
            error,
            Error::IoError(ErrorKind::ConnectionRefused)
        ));
    }
}
