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

//! State of one multi-address dial race.

use crate::{
    dialer::{DialOutcome, Dialed},
    error::{DialError, Error},
    PeerId,
};

use multiaddr::Multiaddr;
use tokio_util::sync::CancellationToken;

/// Logging target for the file.
const LOG_TARGET: &str = "limit-dialer::race";

/// Race state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RaceState {
    /// Attempts outstanding, no success yet.
    Pending,

    /// First success recorded.
    Succeeded,

    /// Every attempt failed.
    Failed,
}

/// Race over the dial attempts of one `dial_many()` call.
///
/// The first success wins. Failures are collected in the order they are reported
/// until every attempt has failed. Both outcomes are terminal and cancel the shared
/// token; anything reported afterwards is discarded.
#[derive(Debug)]
pub(crate) struct DialRace {
    /// Dialed peer.
    peer: PeerId,

    /// Current state.
    state: RaceState,

    /// Total number of attempts.
    num_tasks: usize,

    /// Errors of failed attempts.
    errors: Vec<DialError>,

    /// Token shared with every attempt of the race.
    token: CancellationToken,
}

impl DialRace {
    /// Create new [`DialRace`].
    pub(crate) fn new(peer: PeerId, num_tasks: usize, token: CancellationToken) -> Self {
        Self {
            peer,
            state: RaceState::Pending,
            num_tasks,
            errors: Vec::with_capacity(num_tasks),
            token,
        }
    }

    /// Get current state of the race.
    pub(crate) fn state(&self) -> RaceState {
        self.state
    }

    /// Record the outcome of the attempt that dialed `address`.
    ///
    /// Returns the result of the race when the outcome moves the race into a terminal state.
    pub(crate) fn on_outcome<C>(
        &mut self,
        address: Multiaddr,
        outcome: DialOutcome<C>,
    ) -> Option<crate::Result<Dialed<C>>> {
        if self.state != RaceState::Pending {
            tracing::trace!(
                target: LOG_TARGET,
                peer = ?self.peer,
                ?address,
                state = ?self.state,
                success = outcome.is_ok(),
                "race concluded, ignore outcome",
            );
            return None;
        }

        match outcome {
            Ok(connection) => {
                tracing::debug!(target: LOG_TARGET, peer = ?self.peer, ?address, "dial race won");

                self.state = RaceState::Succeeded;
                self.token.cancel();

                Some(Ok(Dialed {
                    address,
                    connection,
                }))
            }
            Err(error) => {
                self.errors.push(error);

                if self.errors.len() < self.num_tasks {
                    return None;
                }

                Some(Err(self.fail()))
            }
        }
    }

    /// Conclude the race as failed with the errors collected so far.
    pub(crate) fn fail(&mut self) -> Error {
        tracing::debug!(
            target: LOG_TARGET,
            peer = ?self.peer,
            num_errors = ?self.errors.len(),
            "all dials failed",
        );

        self.state = RaceState::Failed;
        self.token.cancel();

        Error::AllDialsFailed {
            peer: self.peer,
            errors: std::mem::take(&mut self.errors),
        }
    }
}
