// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wake signal shared between conditions, WaitSets and cancel tokens.
//!
//! # Architecture
//! - Generation counter bumped on every `notify()`
//! - Condvar for blocking wait (waiter sleeps until the generation moves)
//!
//! A waiter snapshots the generation *before* evaluating its predicates and
//! then sleeps only while the generation is unchanged, so a notification
//! racing with the predicate check is never lost.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);

/// Coalescing wake notification with a generation counter.
#[doc(hidden)]
#[derive(Debug)]
pub struct WakeSignal {
    id: u64,
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl WakeSignal {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed),
            generation: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    /// Unique id (used by conditions to deregister hooks).
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Current generation; pass it to [`wait_past`](Self::wait_past).
    pub(crate) fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Wake every thread blocked in `wait_past`.
    pub(crate) fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.condvar.notify_all();
    }

    /// Block until the generation differs from `seen` or `deadline` passes.
    ///
    /// `None` waits without a deadline.
    ///
    /// # Returns
    /// * `true` if notified
    /// * `false` if timed out
    pub(crate) fn wait_past(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut generation = self.generation.lock();
        while *generation == seen {
            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut generation, deadline).timed_out() {
                        return *generation != seen;
                    }
                }
                None => self.condvar.wait(&mut generation),
            }
        }
        true
    }
}
