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

//! Transports the dialer races connection attempts over.

use multiaddr::Multiaddr;

pub mod tcp;

/// Transport capable of opening a connection to a single address.
///
/// The dialer never assumes the transport has a timeout of its own: every call to
/// [`Transport::dial()`] is bounded by the configured dial timeout and the future is
/// dropped once that timeout elapses.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connection produced by a successful dial.
    type Connection: Send + 'static;

    /// Dial `address`.
    async fn dial(&self, address: Multiaddr) -> crate::Result<Self::Connection>;
}
