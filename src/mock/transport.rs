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

use crate::{error::Error, transport::Transport};

use async_trait::async_trait;
use multiaddr::Multiaddr;
use parking_lot::Mutex;

use std::{
    collections::HashMap,
    io::ErrorKind,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

mockall::mock! {
    pub DialTransport {}

    #[async_trait]
    impl Transport for DialTransport {
        type Connection = usize;

        async fn dial(&self, address: Multiaddr) -> crate::Result<usize>;
    }
}

/// How [`ScriptedTransport`] answers a dial.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Connect after the delay.
    Succeed(Duration),

    /// Fail with `ConnectionRefused` after the delay.
    Fail(Duration),

    /// Never resolve.
    Hang,

    /// Panic inside the dial.
    Panic,
}

/// Transport whose dials follow a per-address script.
///
/// The connection it returns is the dialed address. Unknown addresses fail immediately.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: HashMap<Multiaddr, Script>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    dialed: Mutex<Vec<Multiaddr>>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = (Multiaddr, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Highest number of dials that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of dials in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Dialed addresses in the order the dials started.
    pub fn dialed(&self) -> Vec<Multiaddr> {
        self.dialed.lock().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Connection = Multiaddr;

    async fn dial(&self, address: Multiaddr) -> crate::Result<Multiaddr> {
        self.dialed.lock().push(address.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.scripts.get(&address).copied() {
            Some(Script::Succeed(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(address)
            }
            Some(Script::Fail(delay)) => {
                tokio::time::sleep(delay).await;
                Err(Error::IoError(ErrorKind::ConnectionRefused))
            }
            Some(Script::Hang) => futures::future::pending().await,
            Some(Script::Panic) => panic!("scripted dial panic for `{address}`"),
            None => Err(Error::IoError(ErrorKind::AddrNotAvailable)),
        }
    }
}
