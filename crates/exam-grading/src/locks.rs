//! Keyed critical sections
//!
//! One async mutex per key, created on first use and dropped once the last
//! holder or waiter lets go. Acquisition is bounded; an expired wait is a
//! [`LockTimeout`], which the service surfaces as a retryable error.

use crate::error::GradingError;
use dashmap::DashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock not acquired in time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {waited:?} waiting for {resource}")]
pub(crate) struct LockTimeout {
    pub(crate) resource: String,
    pub(crate) waited: Duration,
}

impl From<LockTimeout> for GradingError {
    fn from(err: LockTimeout) -> Self {
        Self::LockTimeout {
            resource: err.resource,
            waited_ms: u64::try_from(err.waited.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Per-key mutual exclusion
#[derive(Debug)]
pub(crate) struct KeyedLocks<K>
where
    K: Eq + Hash,
{
    name: &'static str,
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Wait up to `timeout` for exclusive access to `key`
    pub(crate) async fn acquire(
        &self,
        key: K,
        timeout: Duration,
    ) -> Result<KeyedGuard<K>, LockTimeout> {
        let mutex = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(KeyedGuard {
                key,
                guard: Some(guard),
                locks: Arc::clone(&self.locks),
            }),
            Err(_) => {
                tracing::warn!("Lock wait on {}:{} expired after {:?}", self.name, key, timeout);
                self.locks
                    .remove_if(&key, |_, m| Arc::strong_count(m) == 1);
                Err(LockTimeout {
                    resource: format!("{}:{}", self.name, key),
                    waited: timeout,
                })
            }
        }
    }

    /// Keys with a live mutex
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one key; released on drop
#[derive(Debug)]
pub(crate) struct KeyedGuard<K>
where
    K: Eq + Hash,
{
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Drop for KeyedGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        // Release first so the map holds the only reference when nobody waits.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, m| Arc::strong_count(m) == 1);
    }
}
