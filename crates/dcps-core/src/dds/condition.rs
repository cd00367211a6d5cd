// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS Conditions - event notification predicates for WaitSets
//!
//! Conditions register the wake signal of every WaitSet they are attached to
//! and notify it whenever their trigger value may have flipped to `true`.

use super::wake::WakeSignal;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_CONDITION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_condition_id() -> u64 {
    NEXT_CONDITION_ID.fetch_add(1, Ordering::Relaxed)
}

/// A boolean predicate a [`WaitSet`](super::WaitSet) can block on.
///
/// Implementors notify every registered signal whenever the trigger value
/// may have become `true`.
pub trait Condition: Send + Sync {
    fn get_trigger_value(&self) -> bool;

    /// Process-unique; identifies the condition inside a waitset.
    fn condition_id(&self) -> u64;

    /// Called by a waitset on attach.
    #[doc(hidden)]
    fn add_waitset_signal(&self, signal: &Arc<WakeSignal>);

    /// Remove a previously registered waitset signal.
    #[doc(hidden)]
    fn remove_waitset_signal(&self, signal_id: u64);

    /// Lets handlers recover the concrete condition type.
    fn as_any(&self) -> &dyn Any;
}

struct WaitsetHook {
    id: u64,
    signal: Weak<WakeSignal>,
}

/// Wake signals of the WaitSets a condition is attached to.
#[derive(Default)]
pub(crate) struct WaitsetHooks {
    hooks: Mutex<Vec<WaitsetHook>>,
}

impl WaitsetHooks {
    pub(crate) fn add(&self, signal: &Arc<WakeSignal>, already_triggered: bool) {
        let mut hooks = self.hooks.lock();
        hooks.retain(|hook| hook.signal.upgrade().is_some());
        hooks.push(WaitsetHook {
            id: signal.id(),
            signal: Arc::downgrade(signal),
        });
        drop(hooks);

        if already_triggered {
            signal.notify();
        }
    }

    pub(crate) fn remove(&self, signal_id: u64) {
        self.hooks.lock().retain(|hook| hook.id != signal_id);
    }

    pub(crate) fn notify(&self) {
        self.hooks.lock().retain(|hook| {
            if let Some(signal) = hook.signal.upgrade() {
                signal.notify();
                true
            } else {
                false
            }
        });
    }
}

/// Bit set of communication statuses.
///
/// Bit positions follow the DCPS status kinds so masks stay comparable with
/// other implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusMask(u32);

impl StatusMask {
    pub const NONE: StatusMask = StatusMask(0);
    pub const ALL: StatusMask = StatusMask(u32::MAX);

    /// Reader holds at least one unread entry.
    pub const DATA_AVAILABLE: StatusMask = StatusMask(0x0001);
    /// Reader evicted a sample the application never saw.
    pub const SAMPLE_LOST: StatusMask = StatusMask(0x0002);
    /// Reader refused a sample because a resource limit was reached.
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(0x0004);
    /// Reader met a writer whose reliability cannot satisfy it.
    pub const REQUESTED_INCOMPATIBLE_QOS: StatusMask = StatusMask(0x0020);
    /// Writer met a reader it cannot satisfy.
    pub const OFFERED_INCOMPATIBLE_QOS: StatusMask = StatusMask(0x0200);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        StatusMask(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set here.
    #[must_use]
    pub const fn contains(&self, other: StatusMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when at least one bit is shared.
    #[must_use]
    pub const fn intersects(&self, other: StatusMask) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn or(self, other: StatusMask) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn and(self, other: StatusMask) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub const fn without(self, other: StatusMask) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for StatusMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl std::ops::BitOrAssign for StatusMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.or(rhs);
    }
}

impl std::ops::BitAnd for StatusMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

/// Forwards the waitset registration calls of [`Condition`] to a `hooks` field.
macro_rules! forward_waitset_hooks {
    () => {
        fn condition_id(&self) -> u64 {
            self.id
        }

        fn add_waitset_signal(&self, signal: &Arc<WakeSignal>) {
            self.hooks.add(signal, self.get_trigger_value());
        }

        fn remove_waitset_signal(&self, signal_id: u64) {
            self.hooks.remove(signal_id);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    };
}

#[derive(Debug, Clone, Copy, Default)]
struct StatusBits {
    enabled: StatusMask,
    active: StatusMask,
}

impl StatusBits {
    fn triggered(self) -> bool {
        self.enabled.intersects(self.active)
    }
}

/// Condition owned by a reader or writer, true while an enabled status is active.
///
/// The entity raises bits as events occur. Reading the matching status (or,
/// for `DATA_AVAILABLE`, draining every unread entry) lowers them again.
/// Freshly created conditions enable nothing.
pub struct StatusCondition {
    id: u64,
    bits: Mutex<StatusBits>,
    hooks: WaitsetHooks,
}

impl StatusCondition {
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            bits: Mutex::new(StatusBits::default()),
            hooks: WaitsetHooks::default(),
        }
    }

    /// Replace the set of statuses that make this condition true.
    ///
    /// ```ignore
    /// reader
    ///     .get_status_condition()
    ///     .set_enabled_statuses(StatusMask::DATA_AVAILABLE | StatusMask::SAMPLE_LOST);
    /// ```
    pub fn set_enabled_statuses(&self, mask: StatusMask) {
        let triggered = {
            let mut bits = self.bits.lock();
            bits.enabled = mask;
            bits.triggered()
        };
        if triggered {
            self.hooks.notify();
        }
    }

    pub fn get_enabled_statuses(&self) -> StatusMask {
        self.bits.lock().enabled
    }

    pub fn get_active_statuses(&self) -> StatusMask {
        self.bits.lock().active
    }

    pub(crate) fn raise(&self, mask: StatusMask) {
        let wake = {
            let mut bits = self.bits.lock();
            bits.active |= mask;
            bits.enabled.intersects(mask)
        };
        if wake {
            self.hooks.notify();
        }
    }

    pub(crate) fn lower(&self, mask: StatusMask) {
        let mut bits = self.bits.lock();
        bits.active = bits.active.without(mask);
    }

    /// Active bits before the call; all of them are cleared.
    pub(crate) fn take_active(&self) -> StatusMask {
        std::mem::take(&mut self.bits.lock().active)
    }
}

impl Condition for StatusCondition {
    fn get_trigger_value(&self) -> bool {
        self.bits.lock().triggered()
    }

    forward_waitset_hooks!();
}

impl Default for StatusCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = *self.bits.lock();
        f.debug_struct("StatusCondition")
            .field("id", &self.id)
            .field("enabled", &bits.enabled)
            .field("active", &bits.active)
            .finish()
    }
}

/// Condition whose trigger value the application sets by hand.
///
/// Typical use is waking a dispatcher from another thread, e.g. to shut it down.
pub struct GuardCondition {
    id: u64,
    trigger_value: AtomicBool,
    hooks: WaitsetHooks,
}

impl GuardCondition {
    pub fn new() -> Self {
        Self {
            id: next_condition_id(),
            trigger_value: AtomicBool::new(false),
            hooks: WaitsetHooks::default(),
        }
    }

    /// Storing `true` wakes every attached WaitSet; `false` only resets.
    pub fn set_trigger_value(&self, value: bool) {
        self.trigger_value.store(value, Ordering::Release);
        if value {
            log::debug!("[GUARD-CONDITION] cond_id={} triggered", self.id);
            self.hooks.notify();
        }
    }
}

impl Condition for GuardCondition {
    fn get_trigger_value(&self) -> bool {
        self.trigger_value.load(Ordering::Acquire)
    }

    forward_waitset_hooks!();
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GuardCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GuardCondition {{ id: {}, trigger_value: {} }}",
            self.id,
            self.get_trigger_value()
        )
    }
}

/// Entities that own a [`StatusCondition`]; lets `WaitSet::attach` take a
/// reader or writer directly.
pub trait HasStatusCondition {
    fn get_status_condition(&self) -> Arc<StatusCondition>;
}
