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

//! Per-peer dial queues and the race that consumes their results.

use crate::{error::DialError, transport::Transport};

use multiaddr::Multiaddr;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use std::sync::Arc;

pub(crate) use queue::DialQueue;
pub(crate) use race::{DialRace, RaceState};
pub(crate) use registry::QueueRegistry;

mod queue;
mod race;
mod registry;

/// Result of a single dial attempt.
pub(crate) type DialOutcome<C> = Result<C, DialError>;

/// Successfully raced connection.
#[derive(Debug)]
pub struct Dialed<C> {
    /// Address that won the race.
    pub address: Multiaddr,

    /// Connection opened to `address`.
    pub connection: C,
}

/// One dial attempt waiting in, or admitted by, a [`DialQueue`].
pub(crate) struct DialTask<C> {
    /// Transport used to dial `address`.
    pub(crate) transport: Arc<dyn Transport<Connection = C>>,

    /// Address to dial.
    pub(crate) address: Multiaddr,

    /// Token shared by every task of the same race.
    pub(crate) token: CancellationToken,

    /// Channel the outcome is reported to.
    pub(crate) tx: oneshot::Sender<DialOutcome<C>>,
}

impl<C> std::fmt::Debug for DialTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialTask")
            .field("address", &self.address)
            .field("canceled", &self.token.is_cancelled())
            .finish()
    }
}
