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

//! Registry of per-peer dial queues.

use crate::{
    config::Config,
    dialer::{DialQueue, DialTask},
    executor::Executor,
    PeerId,
};

use parking_lot::Mutex;
use tokio::time::Instant;

use std::{collections::HashMap, sync::Arc, time::Duration};

/// Logging target for the file.
const LOG_TARGET: &str = "limit-dialer::registry";

/// Maps peers to their dial queues.
///
/// Lookups, creation, enqueueing and eviction all happen under one lock so a peer is
/// never served by two queues at the same time.
pub(crate) struct QueueRegistry<C> {
    /// Maximum number of concurrent attempts per peer.
    per_peer_limit: usize,

    /// Timeout of a single attempt.
    dial_timeout: Duration,

    /// How long an idle queue is kept.
    idle_queue_timeout: Option<Duration>,

    /// Executor handed to every queue.
    executor: Arc<dyn Executor>,

    /// Dial queues.
    queues: Mutex<HashMap<PeerId, Arc<DialQueue<C>>>>,
}

impl<C: Send + 'static> QueueRegistry<C> {
    /// Create new [`QueueRegistry`].
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            per_peer_limit: config.per_peer_limit,
            dial_timeout: config.dial_timeout,
            idle_queue_timeout: config.idle_queue_timeout,
            executor: Arc::clone(&config.executor),
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Push `tasks` into the queue of `peer`, creating the queue if it doesn't exist.
    ///
    /// Tasks are only enqueued; the caller admits them by calling [`DialQueue::process()`]
    /// on the returned queue once the registry lock has been released.
    pub(crate) fn dispatch(
        &self,
        peer: PeerId,
        tasks: impl IntoIterator<Item = DialTask<C>>,
    ) -> Arc<DialQueue<C>> {
        let mut queues = self.queues.lock();

        let queue = match queues.get(&peer) {
            Some(queue) => Arc::clone(queue),
            None => {
                let evicted = self.evict_idle_locked(&mut queues, Instant::now());
                tracing::debug!(target: LOG_TARGET, ?peer, ?evicted, "create dial queue for peer");

                let queue = Arc::new(DialQueue::new(
                    peer,
                    self.per_peer_limit,
                    self.dial_timeout,
                    Arc::clone(&self.executor),
                ));
                queues.insert(peer, Arc::clone(&queue));
                queue
            }
        };

        for task in tasks {
            queue.enqueue(task);
        }

        queue
    }

    /// Remove every queue that has been idle longer than the configured timeout.
    ///
    /// Returns the number of removed queues.
    pub(crate) fn evict_idle(&self) -> usize {
        let mut queues = self.queues.lock();
        self.evict_idle_locked(&mut queues, Instant::now())
    }

    fn evict_idle_locked(
        &self,
        queues: &mut HashMap<PeerId, Arc<DialQueue<C>>>,
        now: Instant,
    ) -> usize {
        let Some(timeout) = self.idle_queue_timeout else {
            return 0usize;
        };

        let before = queues.len();
        queues.retain(|peer, queue| {
            let idle = queue.is_idle_for(now, timeout);
            if idle {
                tracing::trace!(target: LOG_TARGET, ?peer, "evict idle dial queue");
            }

            !idle
        });

        before - queues.len()
    }

    /// Get the queue of `peer`, if it exists.
    pub(crate) fn queue(&self, peer: &PeerId) -> Option<Arc<DialQueue<C>>> {
        self.queues.lock().get(peer).cloned()
    }

    /// Number of queues in the registry.
    pub(crate) fn len(&self) -> usize {
        self.queues.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ConfigBuilder,
        mock::transport::{Script, ScriptedTransport},
    };
    use multiaddr::Multiaddr;
    use tokio::sync::oneshot;
    use tokio_util::sync::CancellationToken;

    fn address(port: u16) -> Multiaddr {
        format!("/ip4/127.0.0.1/tcp/{port}").parse().unwrap()
    }

    fn make_task(
        transport: &Arc<ScriptedTransport>,
        port: u16,
    ) -> (DialTask<Multiaddr>, oneshot::Receiver<Result<Multiaddr, crate::error::DialError>>) {
        let (tx, rx) = oneshot::channel();

        (
            DialTask {
                transport: transport.clone(),
                address: address(port),
                token: CancellationToken::new(),
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn one_queue_per_peer() {
        let registry = QueueRegistry::<Multiaddr>::new(&ConfigBuilder::new().build());
        let transport = Arc::new(ScriptedTransport::default());
        let peer = PeerId::random();

        let (task1, _rx1) = make_task(&transport, 1);
        let (task2, _rx2) = make_task(&transport, 2);
        let first = registry.dispatch(peer, [task1]);
        let second = registry.dispatch(peer, [task2]);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.num_pending(), 2);
        assert_eq!(registry.len(), 1);

        let (task3, _rx3) = make_task(&transport, 3);
        let third = registry.dispatch(PeerId::random(), [task3]);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(registry.len(), 2);
        assert!(Arc::ptr_eq(&registry.queue(&peer).unwrap(), &first));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_queues_evicted() {
        let registry = QueueRegistry::<Multiaddr>::new(
            &ConfigBuilder::new().with_idle_queue_timeout(Some(Duration::from_secs(10))).build(),
        );
        let transport = Arc::new(ScriptedTransport::new([(
            address(1),
            Script::Succeed(Duration::from_secs(1)),
        )]));

        let busy = PeerId::random();
        let (task, rx) = make_task(&transport, 1);
        registry.dispatch(busy, [task]).process();

        let idle = PeerId::random();
        registry.dispatch(idle, std::iter::empty());
        assert_eq!(registry.len(), 2);

        // `busy` finishes at 1s and becomes idle, `idle` has been idle since creation
        assert!(rx.await.unwrap().is_ok());
        tokio::time::advance(Duration::from_secs(9)).await;

        assert_eq!(registry.evict_idle(), 1);
        assert!(registry.queue(&idle).is_none());
        assert!(registry.queue(&busy).is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(registry.evict_idle(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_queue_never_evicted() {
        let registry = QueueRegistry::<Multiaddr>::new(
            &ConfigBuilder::new().with_idle_queue_timeout(Some(Duration::from_secs(1))).build(),
        );
        let transport = Arc::new(ScriptedTransport::default());
        let peer = PeerId::random();

        // enqueued but never admitted
        let (task, _rx) = make_task(&transport, 1);
        registry.dispatch(peer, [task]);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(registry.evict_idle(), 0);

        // creating another queue runs eviction too
        registry.dispatch(PeerId::random(), std::iter::empty());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_disabled() {
        let registry = QueueRegistry::<Multiaddr>::new(
            &ConfigBuilder::new().with_idle_queue_timeout(None).build(),
        );

        registry.dispatch(PeerId::random(), std::iter::empty());
        tokio::time::advance(Duration::from_secs(3600)).await;

        assert_eq!(registry.evict_idle(), 0);
        assert_eq!(registry.len(), 1);
    }
}
