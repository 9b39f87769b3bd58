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

//! Bounded-concurrency dial queue of a single peer.

use crate::{
    dialer::{DialOutcome, DialTask},
    error::DialError,
    executor::Executor,
    PeerId,
};

use parking_lot::Mutex;
use tokio::time::Instant;

use std::{collections::VecDeque, sync::Arc, time::Duration};

/// Logging target for the file.
const LOG_TARGET: &str = "limit-dialer::queue";

/// What to do with the task at the head of the backlog.
enum Admission<C> {
    /// Slot was reserved, start dialing.
    Start(DialTask<C>),

    /// Race of the task already concluded, report it without dialing.
    Skip(DialTask<C>),
}

struct QueueState<C> {
    /// Number of attempts currently dialing.
    running: usize,

    /// Tasks waiting for a slot, in arrival order.
    pending: VecDeque<DialTask<C>>,

    /// When the queue last became idle.
    ///
    /// `None` while anything is running or waiting.
    idle_since: Option<Instant>,
}

/// Dial queue of a peer.
///
/// At most `per_peer_limit` attempts run at any time, no matter how many races
/// contributed tasks. Each running attempt is bounded by `dial_timeout`.
pub(crate) struct DialQueue<C> {
    /// Peer the queue belongs to.
    peer: PeerId,

    /// Maximum number of concurrent attempts.
    per_peer_limit: usize,

    /// Timeout of a single attempt.
    dial_timeout: Duration,

    /// Executor running admitted attempts.
    executor: Arc<dyn Executor>,

    /// Slot and backlog bookkeeping.
    state: Mutex<QueueState<C>>,
}

impl<C: Send + 'static> DialQueue<C> {
    /// Create new [`DialQueue`].
    pub(crate) fn new(
        peer: PeerId,
        per_peer_limit: usize,
        dial_timeout: Duration,
        executor: Arc<dyn Executor>,
    ) -> Self {
        tracing::trace!(
            target: LOG_TARGET,
            ?peer,
            ?per_peer_limit,
            ?dial_timeout,
            "create dial queue",
        );

        Self {
            peer,
            per_peer_limit,
            dial_timeout,
            executor,
            state: Mutex::new(QueueState {
                running: 0usize,
                pending: VecDeque::new(),
                idle_since: Some(Instant::now()),
            }),
        }
    }

    /// Push `task` to the back of the queue.
    ///
    /// Nothing is admitted until [`DialQueue::process()`] is called.
    pub(crate) fn enqueue(&self, task: DialTask<C>) {
        tracing::trace!(
            target: LOG_TARGET,
            peer = ?self.peer,
            address = ?task.address,
            "enqueue dial",
        );

        let mut state = self.state.lock();
        state.pending.push_back(task);
        state.idle_since = None;
    }

    /// Admit queued tasks while slots are available.
    pub(crate) fn process(self: &Arc<Self>) {
        loop {
            let admission = {
                let mut state = self.state.lock();

                if state.running >= self.per_peer_limit {
                    return;
                }

                match state.pending.pop_front() {
                    None => {
                        if state.running == 0 && state.idle_since.is_none() {
                            state.idle_since = Some(Instant::now());
                        }
                        return;
                    }
                    Some(task) if task.token.is_cancelled() => Admission::Skip(task),
                    Some(task) => {
                        state.running += 1;
                        Admission::Start(task)
                    }
                }
            };

            match admission {
                Admission::Skip(DialTask { address, tx, .. }) => {
                    tracing::trace!(
                        target: LOG_TARGET,
                        peer = ?self.peer,
                        ?address,
                        "race concluded, skip dial",
                    );

                    let _ = tx.send(Err(DialError::Canceled { address }));
                }
                Admission::Start(task) => self.start(task),
            }
        }
    }

    /// Run admitted `task` on the executor.
    ///
    /// The slot is held by a [`Slot`] owned by the spawned future, so it is released
    /// even if the dial panics or the executor drops the future without finishing it.
    fn start(self: &Arc<Self>, task: DialTask<C>) {
        let slot = Slot(Arc::clone(self));
        let DialTask {
            transport,
            address,
            token,
            tx,
        } = task;

        tracing::debug!(target: LOG_TARGET, peer = ?self.peer, ?address, "start dial");

        self.executor.run(Box::pin(async move {
            let queue = &slot.0;
            let timeout = queue.dial_timeout;
            let outcome: DialOutcome<C> =
                match tokio::time::timeout(timeout, transport.dial(address.clone())).await {
                    Err(_) => Err(DialError::DialTimeout { address, timeout }),
                    Ok(Err(error)) => Err(DialError::ConnectionFailed { address, error }),
                    Ok(Ok(connection)) => Ok(connection),
                };

            if token.is_cancelled() {
                tracing::trace!(
                    target: LOG_TARGET,
                    peer = ?queue.peer,
                    success = outcome.is_ok(),
                    "race already concluded, outcome discarded",
                );
            }

            match &outcome {
                Ok(_) => {
                    tracing::debug!(target: LOG_TARGET, peer = ?queue.peer, "dial succeeded");

                    // success concludes the race, cancel before the slot is released
                    token.cancel();
                }
                Err(error) => tracing::debug!(
                    target: LOG_TARGET,
                    peer = ?queue.peer,
                    ?error,
                    "dial failed",
                ),
            }

            let _ = tx.send(outcome);
            drop(slot);
        }));
    }

    /// Release a slot and admit the next task, if any.
    fn release(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            debug_assert!(state.running > 0);
            state.running = state.running.saturating_sub(1);
        }

        self.process();
    }

    /// Number of attempts currently dialing.
    pub(crate) fn num_running(&self) -> usize {
        self.state.lock().running
    }

    /// Number of tasks waiting for a slot.
    pub(crate) fn num_pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Check if the queue has been idle for at least `timeout` at `now`.
    pub(crate) fn is_idle_for(&self, now: Instant, timeout: Duration) -> bool {
        match self.state.lock().idle_since {
            Some(idle_since) => now.saturating_duration_since(idle_since) >= timeout,
            None => false,
        }
    }
}

/// Running slot of a [`DialQueue`], released on drop.
struct Slot<C: Send + 'static>(Arc<DialQueue<C>>);

impl<C: Send + 'static> Drop for Slot<C> {
    fn drop(&mut self) {
        self.0.release();
    }
}
