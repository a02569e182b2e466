// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::future::Future;

use tokio::sync::{watch, Mutex};

/// Uses tokio::sync::watch to coordinate access to a refreshable `T`.
/// `T` must be clone, and will be cloned relatively often, so it's advisable
/// to wrap it in an `Arc` if it uses the heap.
#[derive(Debug)]
pub struct Refreshable<T: Clone> {
    tx: watch::Sender<T>,
    refreshing: Mutex<()>,
}

impl<T: Clone> Refreshable<T> {
    /// Construct a new `Refreshable` with an initial `T`.
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self {
            tx,
            refreshing: Mutex::new(()),
        }
    }

    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Replace the value with the result of `populate`, waiting for any
    /// refresh already in progress to finish first.
    ///
    /// This function will fail if `populate` fails, leaving the old value.
    pub async fn refresh<F, E>(&self, populate: impl FnOnce() -> F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let _lock = self.refreshing.lock().await;
        let value = populate().await?;
        self.tx.send_replace(value.clone());
        Ok(value)
    }

    /// Return the current value if `accept` allows it. Otherwise use
    /// `populate` to generate a new one, which is returned whether or not it
    /// is acceptable. Concurrent callers share a single `populate` call.
    ///
    /// This function will fail if `populate()` fails.
    pub async fn accept_or<F, E>(
        &self,
        accept: impl Fn(&T) -> bool,
        populate: impl FnOnce() -> F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let current = self.current();
        if accept(&current) {
            return Ok(current);
        }

        let _lock = self.refreshing.lock().await;
        // The value may have been populated between when we found it
        // unacceptable and grabbed the lock...
        // double-check that it's really necessary to populate it.
        let current = self.current();
        if accept(&current) {
            return Ok(current);
        }
        let value = populate().await?;
        self.tx.send_replace(value.clone());
        Ok(value)
    }
}
