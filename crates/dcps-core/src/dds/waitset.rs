// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet - blocking wait and handler dispatch over Condition triggers
//!
//! Every WaitSet owns one wake signal. Conditions register that signal when
//! attached and notify it whenever their trigger value may have flipped to
//! `true`, so waiters sleep on a condvar instead of polling.
//!
//! Handlers live in the WaitSet's dispatch table (one optional handler per
//! attached condition) and run on the thread calling [`WaitSet::dispatch`],
//! in attach order, outside of any WaitSet lock.

use super::cancel::CancelToken;
use super::condition::{Condition, HasStatusCondition, StatusCondition, StatusMask};
use super::wake::WakeSignal;
use super::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback invoked by [`WaitSet::dispatch`] for a triggered condition.
///
/// Closures taking `&dyn Condition` implement it:
///
/// ```ignore
/// waitset.attach(&reader, StatusMask::DATA_AVAILABLE, move |_: &dyn Condition| {
///     for sample in reader.take() { /* ... */ }
/// })?;
/// ```
pub trait ConditionHandler: Send {
    fn on_trigger(&mut self, condition: &dyn Condition);
}

impl<F> ConditionHandler for F
where
    F: FnMut(&dyn Condition) + Send,
{
    fn on_trigger(&mut self, condition: &dyn Condition) {
        self(condition)
    }
}

type HandlerSlot = Arc<Mutex<Box<dyn ConditionHandler>>>;

struct ConditionEntry {
    condition: Arc<dyn Condition>,
    handler: Option<HandlerSlot>,
}

/// WaitSet - wait for multiple conditions
///
/// A WaitSet allows blocking until at least one attached Condition has
/// `trigger_value == true`. Only one thread may wait on a WaitSet at a time.
pub struct WaitSet {
    signal: Arc<WakeSignal>,
    entries: Mutex<Vec<ConditionEntry>>,
    waiting: AtomicBool,
}

/// Returns the WaitSet to Idle on every exit path of a wait.
struct WaitingGuard<'a>(&'a AtomicBool);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WaitSet {
    /// Create a new WaitSet
    #[must_use]
    pub fn new() -> Self {
        Self {
            signal: Arc::new(WakeSignal::new()),
            entries: Mutex::new(Vec::new()),
            waiting: AtomicBool::new(false),
        }
    }

    /// Attach a Condition to this WaitSet
    pub fn attach_condition(&self, condition: Arc<dyn Condition>) -> Result<()> {
        self.insert(condition, None)
    }

    /// Attach a Condition together with the handler `dispatch` runs for it.
    pub fn attach_condition_with_handler<H>(
        &self,
        condition: Arc<dyn Condition>,
        handler: H,
    ) -> Result<()>
    where
        H: ConditionHandler + 'static,
    {
        self.insert(condition, Some(Arc::new(Mutex::new(Box::new(handler)))))
    }

    /// Attach an entity's StatusCondition with `mask` enabled and a handler.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let waitset = WaitSet::new();
    /// waitset.attach(&reader, StatusMask::DATA_AVAILABLE, |_: &dyn Condition| {
    ///     println!("data!");
    /// })?;
    /// waitset.dispatch(Duration::from_secs(4))?;
    /// ```
    pub fn attach<E, H>(&self, entity: &E, mask: StatusMask, handler: H) -> Result<Arc<StatusCondition>>
    where
        E: HasStatusCondition,
        H: ConditionHandler + 'static,
    {
        let condition = entity.get_status_condition();
        condition.set_enabled_statuses(mask);
        self.attach_condition_with_handler(Arc::clone(&condition) as Arc<dyn Condition>, handler)?;
        Ok(condition)
    }

    fn insert(&self, condition: Arc<dyn Condition>, handler: Option<HandlerSlot>) -> Result<()> {
        let condition_id = condition.condition_id();

        {
            let mut entries = self.entries.lock();
            if entries
                .iter()
                .any(|entry| entry.condition.condition_id() == condition_id)
            {
                return Err(Error::AlreadyAttached);
            }
            entries.push(ConditionEntry {
                condition: Arc::clone(&condition),
                handler,
            });
        }

        log::debug!(
            "[WAITSET] attach cond_id={} signal_id={}",
            condition_id,
            self.signal.id()
        );
        condition.add_waitset_signal(&self.signal);
        Ok(())
    }

    /// Detach a Condition from this WaitSet (its handler is dropped with it)
    pub fn detach_condition(&self, condition: &dyn Condition) -> Result<()> {
        let condition_id = condition.condition_id();

        let entry = {
            let mut entries = self.entries.lock();
            let index = entries
                .iter()
                .position(|entry| entry.condition.condition_id() == condition_id)
                .ok_or(Error::NotAttached)?;
            entries.remove(index)
        };

        entry.condition.remove_waitset_signal(self.signal.id());
        log::debug!("[WAITSET] detach cond_id={}", condition_id);
        Ok(())
    }

    /// Get all attached Conditions, in attach order
    #[must_use]
    pub fn get_conditions(&self) -> Vec<Arc<dyn Condition>> {
        self.entries
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.condition))
            .collect()
    }

    /// Whether a thread is currently blocked in `wait`/`dispatch`.
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }

    /// Wait until at least one Condition is triggered or `timeout` elapses.
    ///
    /// Returns the triggered conditions in attach order, or an empty vector on
    /// timeout. Fails with `ConcurrentWait` if another thread is already
    /// waiting on this WaitSet.
    pub fn wait(&self, timeout: Duration) -> Result<Vec<Arc<dyn Condition>>> {
        let triggered = self.wait_entries(timeout, None)?;
        Ok(triggered.into_iter().map(|(condition, _)| condition).collect())
    }

    /// [`wait`](Self::wait), interrupted by `token`.
    ///
    /// Fails with `Cancelled` if the token is (or becomes) cancelled before a
    /// condition triggers.
    pub fn wait_until(
        &self,
        timeout: Duration,
        token: &CancelToken,
    ) -> Result<Vec<Arc<dyn Condition>>> {
        let triggered = self.wait_entries(timeout, Some(token))?;
        Ok(triggered.into_iter().map(|(condition, _)| condition).collect())
    }

    /// Wait, then run the handler of every triggered condition in attach order.
    ///
    /// Returns the number of handlers invoked (0 on timeout).
    pub fn dispatch(&self, timeout: Duration) -> Result<usize> {
        let triggered = self.wait_entries(timeout, None)?;
        Ok(Self::run_handlers(triggered))
    }

    /// [`dispatch`](Self::dispatch), interrupted by `token`.
    pub fn dispatch_until(&self, timeout: Duration, token: &CancelToken) -> Result<usize> {
        let triggered = self.wait_entries(timeout, Some(token))?;
        Ok(Self::run_handlers(triggered))
    }

    /// Wake a blocked `wait()` without triggering any condition.
    ///
    /// The waiter re-evaluates its conditions and keeps waiting if none is
    /// triggered.
    pub fn notify(&self) {
        self.signal.notify();
    }

    fn run_handlers(triggered: Vec<(Arc<dyn Condition>, Option<HandlerSlot>)>) -> usize {
        let mut invoked = 0;
        for (condition, handler) in triggered {
            match handler {
                Some(handler) => {
                    handler.lock().on_trigger(condition.as_ref());
                    invoked += 1;
                }
                None => log::debug!(
                    "[WAITSET] cond_id={} triggered without handler",
                    condition.condition_id()
                ),
            }
        }
        invoked
    }

    fn enter(&self) -> Result<WaitingGuard<'_>> {
        self.waiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ConcurrentWait)?;
        Ok(WaitingGuard(&self.waiting))
    }

    fn wait_entries(
        &self,
        timeout: Duration,
        token: Option<&CancelToken>,
    ) -> Result<Vec<(Arc<dyn Condition>, Option<HandlerSlot>)>> {
        let _waiting = self.enter()?;
        log::debug!("[WAITSET] wait called timeout={:?}", timeout);

        // `None` only when the deadline is not representable.
        let deadline = Instant::now().checked_add(timeout);

        if let Some(token) = token {
            token.watch(&self.signal);
        }

        let result = loop {
            let seen = self.signal.generation();

            if token.is_some_and(CancelToken::is_cancelled) {
                break Err(Error::Cancelled);
            }

            let triggered = self.collect_triggered();
            if !triggered.is_empty() {
                log::debug!(
                    "[WAITSET] wait returning triggered_len={}",
                    triggered.len()
                );
                break Ok(triggered);
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break Ok(Vec::new());
            }

            self.signal.wait_past(seen, deadline);
        };

        if let Some(token) = token {
            token.unwatch(&self.signal);
        }
        result
    }

    fn collect_triggered(&self) -> Vec<(Arc<dyn Condition>, Option<HandlerSlot>)> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.condition.get_trigger_value())
            .map(|entry| (Arc::clone(&entry.condition), entry.handler.clone()))
            .collect()
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            entry.condition.remove_waitset_signal(self.signal.id());
        }
    }
}

impl std::fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitSet")
            .field("conditions", &self.entries.lock().len())
            .field("waiting", &self.is_waiting())
            .finish()
    }
}
