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

//! Behavior defining how admitted dial attempts are executed.

use std::{fmt::Debug, future::Future, pin::Pin};

/// Trait which defines the interface the executor must implement.
///
/// Every dial attempt admitted by a per-peer queue, and every race started through
/// [`LimitDialer::dial_many_with()`](crate::LimitDialer::dial_many_with), is handed to
/// the executor as a boxed future.
pub trait Executor: Debug + Send + Sync {
    fn run(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// Default executor, defaults to calling `tokio::spawn()`.
#[derive(Debug)]
pub(crate) struct DefaultExecutor;

impl Executor for DefaultExecutor {
    fn run(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>) {
        let _ = tokio::spawn(future);
    }
}
