//! Single-shot pending results
//!
//! An asynchronous gateway operation hands its caller a [`Pending`] right away
//! and moves the paired [`Completer`] into the task that talks to the backend.
//! Both halves are consumed by use, so a result is settled at most once and
//! read at most once. A completer dropped without settling resolves the
//! pending side with [`Error::Abandoned`], so every operation terminates.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{Error, Result};

/// Create a linked completer / pending pair
pub fn pending<T>() -> (Completer<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Completer { tx }, Pending { rx })
}

/// Write half of a pending result
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Completer<T> {
    /// Complete successfully
    pub fn complete(self, value: T) {
        self.settle(Ok(value));
    }

    /// Complete with a failure
    pub fn fail(self, error: Error) {
        self.settle(Err(error));
    }

    /// Complete with whatever the operation produced
    pub fn settle(self, result: Result<T>) {
        if self.tx.send(result).is_err() {
            tracing::debug!("Pending result dropped before completion; discarding outcome");
        }
    }

    /// Whether the reading side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read half of a pending result
#[derive(Debug)]
#[must_use = "a pending result does nothing unless awaited"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
