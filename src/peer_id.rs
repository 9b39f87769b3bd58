// Copyright 2018 Parity Technologies (UK) Ltd.
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

#![allow(clippy::wrong_self_convention)]

use multiaddr::{Multiaddr, Protocol};
use multihash::Multihash;
use rand::Rng;

use std::fmt;

/// Identity multihash code.
const IDENTITY_CODE: u64 = 0x00;

/// SHA-256 multihash code.
const SHA2_256_CODE: u64 = 0x12;

/// Digests of identity multihashes longer than this are not valid peer IDs.
const MAX_INLINE_KEY_LENGTH: usize = 42;

/// Identifier of a peer of the network.
///
/// The dialer keys its per-peer queues by [`PeerId`] so two calls targeting the same
/// identity always share one queue. The base-58 form is what shows up in logs.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PeerId {
    multihash: Multihash,
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PeerId").field(&self.to_base58()).finish()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_base58().fmt(f)
    }
}

impl PeerId {
    /// Create [`PeerId`] from `multihash`.
    ///
    /// Only sha2-256 digests and identity digests of at most 42 bytes are accepted,
    /// anything else is handed back.
    pub fn from_multihash(multihash: Multihash) -> Result<PeerId, Multihash> {
        match multihash.code() {
            SHA2_256_CODE => Ok(PeerId { multihash }),
            IDENTITY_CODE if multihash.digest().len() <= MAX_INLINE_KEY_LENGTH =>
                Ok(PeerId { multihash }),
            _ => Err(multihash),
        }
    }

    /// Get the peer `address` ends with, if it ends in `/p2p/<peer>`.
    pub fn try_from_multiaddr(address: &Multiaddr) -> Option<PeerId> {
        match address.iter().last() {
            Some(Protocol::P2p(multihash)) => PeerId::from_multihash(multihash).ok(),
            _ => None,
        }
    }

    /// Generate random [`PeerId`].
    pub fn random() -> PeerId {
        let digest = rand::thread_rng().gen::<[u8; 32]>();

        PeerId {
            multihash: Multihash::wrap(IDENTITY_CODE, &digest)
                .expect("32-byte digest fits into a multihash"),
        }
    }

    /// Encode the peer ID as base-58.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.multihash.to_bytes()).into_string()
    }
}

impl From<PeerId> for Multihash {
    fn from(peer: PeerId) -> Self {
        peer.multihash
    }
}
