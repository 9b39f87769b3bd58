// Copyright 2020 Parity Technologies (UK) Ltd.
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

//! Rate-limited dialing of a peer over multiple addresses.
//!
//! [`LimitDialer::dial_many()`] races one dial per address and returns the first
//! connection that opens. Dials to the same peer share one queue which runs at most
//! `per_peer_limit` of them at a time, each bounded by `dial_timeout`.

use crate::{
    config::Config,
    dialer::{DialRace, DialTask, QueueRegistry, RaceState},
    error::DialError,
    executor::Executor,
    transport::Transport,
};

use futures::{stream::FuturesUnordered, StreamExt};
use multiaddr::Multiaddr;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use std::{marker::PhantomData, sync::Arc};

pub use crate::{dialer::Dialed, error::Error, peer_id::PeerId};

pub mod config;
pub mod error;
pub mod executor;
pub mod peer_id;
pub mod transport;

mod dialer;

#[cfg(test)]
mod mock;

/// Public result type used by the crate.
pub type Result<T> = std::result::Result<T, error::Error>;

/// Logging target for the file.
const LOG_TARGET: &str = "limit-dialer";

/// Dialer racing connection attempts to multiple addresses of a peer.
///
/// Cloning the dialer is cheap and clones share the per-peer queues.
pub struct LimitDialer<C> {
    /// Per-peer dial queues.
    registry: Arc<QueueRegistry<C>>,

    /// Executor used by [`LimitDialer::dial_many_with()`].
    executor: Arc<dyn Executor>,
}

impl<C> Clone for LimitDialer<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<C: Send + 'static> LimitDialer<C> {
    /// Create new [`LimitDialer`].
    pub fn new(config: Config) -> crate::Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: LOG_TARGET,
            per_peer_limit = ?config.per_peer_limit(),
            dial_timeout = ?config.dial_timeout(),
            idle_queue_timeout = ?config.idle_queue_timeout(),
            "create dialer",
        );

        Ok(Self {
            registry: Arc::new(QueueRegistry::new(&config)),
            executor: Arc::clone(&config.executor),
        })
    }

    /// Dial `peer` over `transport` using every address in `addresses`.
    ///
    /// Returns the first connection that opens and the address it was opened to. Once a
    /// winner is known, queued attempts of this call are skipped and results of attempts
    /// still in flight are dropped when they arrive. If every attempt fails,
    /// [`Error::AllDialsFailed`] carries one error per address in the order the failures
    /// were observed.
    ///
    /// Duplicate addresses are dialed independently. An empty `addresses` fails with
    /// [`Error::NoAddresses`] without touching the peer's queue.
    ///
    /// Dropping the returned future abandons the race the same way a win does.
    pub async fn dial_many(
        &self,
        peer: PeerId,
        transport: Arc<dyn Transport<Connection = C>>,
        addresses: Vec<Multiaddr>,
    ) -> crate::Result<Dialed<C>> {
        tracing::debug!(
            target: LOG_TARGET,
            ?peer,
            num_addresses = ?addresses.len(),
            "dial many",
        );

        if addresses.is_empty() {
            return Err(Error::NoAddresses(peer));
        }

        let num_tasks = addresses.len();
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();

        let (tasks, mut pending): (Vec<_>, FuturesUnordered<_>) = addresses
            .into_iter()
            .map(|address| {
                let (tx, rx) = oneshot::channel();
                let task = DialTask {
                    transport: Arc::clone(&transport),
                    address: address.clone(),
                    token: token.clone(),
                    tx,
                };

                (task, async move { (address, rx.await) })
            })
            .unzip();

        self.registry.dispatch(peer, tasks).process();

        let mut race = DialRace::new(peer, num_tasks, token.clone());

        while let Some((address, result)) = pending.next().await {
            let outcome = result.unwrap_or_else(|error| {
                Err(DialError::ConnectionFailed {
                    address: address.clone(),
                    error: error.into(),
                })
            });

            if let Some(result) = race.on_outcome(address, outcome) {
                return result;
            }
        }

        // every task reports exactly once so the race concludes inside the loop
        debug_assert_eq!(race.state(), RaceState::Pending);
        Err(race.fail())
    }

    /// Dial `peer` like [`LimitDialer::dial_many()`] and report the result to `callback`.
    ///
    /// The race runs on the configured executor and `callback` is called exactly once.
    /// If the executor drops the race before it concludes, `callback` receives
    /// [`Error::EssentialTaskClosed`].
    pub fn dial_many_with<F>(
        &self,
        peer: PeerId,
        transport: Arc<dyn Transport<Connection = C>>,
        addresses: Vec<Multiaddr>,
        callback: F,
    ) where
        F: FnOnce(crate::Result<Dialed<C>>) + Send + 'static,
    {
        let dialer = self.clone();
        let callback = CallbackGuard {
            callback: Some(callback),
            _marker: PhantomData,
        };

        self.executor.run(Box::pin(async move {
            callback.call(dialer.dial_many(peer, transport, addresses).await);
        }));
    }

    /// Remove per-peer queues that have been idle longer than the configured timeout.
    ///
    /// Returns the number of removed queues.
    pub fn evict_idle_queues(&self) -> usize {
        self.registry.evict_idle()
    }

    /// Number of per-peer queues currently held.
    pub fn num_queues(&self) -> usize {
        self.registry.len()
    }

    /// Number of attempts currently dialing `peer`.
    pub fn num_running(&self, peer: &PeerId) -> usize {
        self.registry.queue(peer).map_or(0usize, |queue| queue.num_running())
    }

    /// Number of attempts to `peer` waiting for a free slot.
    pub fn num_pending(&self, peer: &PeerId) -> usize {
        self.registry.queue(peer).map_or(0usize, |queue| queue.num_pending())
    }
}

/// Callback of [`LimitDialer::dial_many_with()`].
///
/// Reports [`Error::EssentialTaskClosed`] if dropped before it was called.
struct CallbackGuard<C, F>
where
    F: FnOnce(crate::Result<Dialed<C>>),
{
    callback: Option<F>,
    _marker: PhantomData<fn() -> C>,
}

impl<C, F> CallbackGuard<C, F>
where
    F: FnOnce(crate::Result<Dialed<C>>),
{
    fn call(mut self, result: crate::Result<Dialed<C>>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<C, F> Drop for CallbackGuard<C, F>
where
    F: FnOnce(crate::Result<Dialed<C>>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::debug!(target: LOG_TARGET, "dial race dropped by executor");
            callback(Err(Error::EssentialTaskClosed));
        }
    }
}
