// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cooperative cancellation for blocking waits.
//!
//! A [`CancelToken`] is cloned into every thread that participates in a
//! shutdown. `WaitSet::wait_until` / `dispatch_until` check it before and
//! after every suspension, and `cancel()` wakes any waiter currently blocked.
//!
//! ```ignore
//! let token = CancelToken::new();
//! token.register_shutdown_hook(|| log::info!("line stopped"));
//!
//! let worker = {
//!     let token = token.clone();
//!     std::thread::spawn(move || {
//!         while !token.is_cancelled() {
//!             waitset.dispatch_until(Duration::from_secs(4), &token).ok();
//!         }
//!     })
//! };
//!
//! token.cancel();
//! ```

use super::wake::WakeSignal;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

type ShutdownHook = Box<dyn FnOnce() + Send>;

struct CancelState {
    cancelled: AtomicBool,
    signals: Mutex<Vec<Weak<WakeSignal>>>,
    hooks: Mutex<Vec<ShutdownHook>>,
}

/// Shared cancellation flag with wake-up of blocked waiters.
///
/// Clones share state; cancelling any clone cancels all of them.
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                signals: Mutex::new(Vec::new()),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel the token.
    ///
    /// Wakes every waiter blocked on it and runs the registered shutdown
    /// hooks once, in registration order, on the calling thread. Later calls
    /// are no-ops.
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("[CANCEL] token cancelled");

        let signals = std::mem::take(&mut *self.state.signals.lock());
        for signal in signals.iter().filter_map(Weak::upgrade) {
            signal.notify();
        }

        let hooks = std::mem::take(&mut *self.state.hooks.lock());
        for hook in hooks {
            hook();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Run `hook` when the token is cancelled.
    ///
    /// Runs immediately if the token is already cancelled.
    pub fn register_shutdown_hook<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut hooks = self.state.hooks.lock();
        if self.is_cancelled() {
            drop(hooks);
            hook();
            return;
        }
        hooks.push(Box::new(hook));
    }

    /// Register a waiter's signal so `cancel()` wakes it.
    pub(crate) fn watch(&self, signal: &Arc<WakeSignal>) {
        let mut signals = self.state.signals.lock();
        signals.retain(|s| s.strong_count() > 0);
        signals.push(Arc::downgrade(signal));
        drop(signals);

        if self.is_cancelled() {
            signal.notify();
        }
    }

    pub(crate) fn unwatch(&self, signal: &Arc<WakeSignal>) {
        let id = signal.id();
        self.state
            .signals
            .lock()
            .retain(|s| s.upgrade().is_some_and(|s| s.id() != id));
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
