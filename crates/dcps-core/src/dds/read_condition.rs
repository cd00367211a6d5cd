// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ReadCondition: a reader-owned condition that is true while some sample
//! matches a sample/view/instance state selection.

use super::condition::{next_condition_id, Condition, WaitsetHooks};
use super::participant::EntityId;
use super::reader::{InstanceState, SampleState, ViewState};
use super::wake::WakeSignal;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Declares a bit mask over one of the sample, view or instance state enums.
macro_rules! state_mask {
    (
        $(#[$meta:meta])*
        $name:ident for $state:ident {
            $($(#[$cmeta:meta])* $konst:ident = $bit:expr => $variant:ident,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(u32);

        impl $name {
            $($(#[$cmeta])* pub const $konst: $name = $name($bit);)+

            pub const fn from_bits(bits: u32) -> Self {
                $name(bits)
            }

            pub const fn bits(&self) -> u32 {
                self.0
            }

            /// True when every bit of `other` is selected.
            pub const fn contains(&self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }

        impl From<$state> for $name {
            fn from(state: $state) -> Self {
                match state {
                    $($state::$variant => $name::$konst,)+
                }
            }
        }
    };
}

state_mask! {
    /// Selects samples by whether they were already returned by `read`.
    SampleStateMask for SampleState {
        READ = 0x1 => Read,
        NOT_READ = 0x2 => NotRead,
    }
}

impl SampleStateMask {
    pub const ANY: SampleStateMask = SampleStateMask(0x3);
}

state_mask! {
    /// Selects samples by whether their instance was seen before.
    ViewStateMask for ViewState {
        /// First samples since the instance (re)appeared.
        NEW = 0x1 => New,
        NOT_NEW = 0x2 => NotNew,
    }
}

impl ViewStateMask {
    pub const ANY: ViewStateMask = ViewStateMask(0x3);
}

state_mask! {
    /// Selects samples by the liveliness of their instance.
    InstanceStateMask for InstanceState {
        ALIVE = 0x1 => Alive,
        /// A writer disposed the instance.
        NOT_ALIVE_DISPOSED = 0x2 => NotAliveDisposed,
        /// Every writer unregistered.
        NOT_ALIVE_NO_WRITERS = 0x4 => NotAliveNoWriters,
    }
}

impl InstanceStateMask {
    pub const NOT_ALIVE: InstanceStateMask = InstanceStateMask(0x6);
    pub const ANY: InstanceStateMask = InstanceStateMask(0x7);
}

/// Combined sample/view/instance selector used by state-filtered read/take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StateFilter {
    pub(crate) sample: SampleStateMask,
    pub(crate) view: ViewStateMask,
    pub(crate) instance: InstanceStateMask,
}

impl StateFilter {
    pub(crate) const ANY: StateFilter = StateFilter {
        sample: SampleStateMask::ANY,
        view: ViewStateMask::ANY,
        instance: InstanceStateMask::ANY,
    };

    pub(crate) const NOT_READ: StateFilter = StateFilter {
        sample: SampleStateMask::NOT_READ,
        view: ViewStateMask::ANY,
        instance: InstanceStateMask::ANY,
    };

    pub(crate) fn admits(&self, sample: SampleState, view: ViewState, instance: InstanceState) -> bool {
        self.sample.contains(sample.into())
            && self.view.contains(view.into())
            && self.instance.contains(instance.into())
    }
}

/// Condition that holds while its reader stores a sample matching `states`.
///
/// Obtained from [`DataReader::create_readcondition`](super::DataReader::create_readcondition).
/// The reader recomputes the trigger after each change to its store.
pub struct ReadCondition {
    id: u64,
    reader: EntityId,
    states: StateFilter,
    trigger_value: AtomicBool,
    hooks: WaitsetHooks,
}

impl ReadCondition {
    pub(crate) fn new(
        reader: EntityId,
        sample_state_mask: SampleStateMask,
        view_state_mask: ViewStateMask,
        instance_state_mask: InstanceStateMask,
    ) -> Self {
        Self {
            id: next_condition_id(),
            reader,
            states: StateFilter {
                sample: sample_state_mask,
                view: view_state_mask,
                instance: instance_state_mask,
            },
            trigger_value: AtomicBool::new(false),
            hooks: WaitsetHooks::default(),
        }
    }

    pub fn get_sample_state_mask(&self) -> SampleStateMask {
        self.states.sample
    }

    pub fn get_view_state_mask(&self) -> ViewStateMask {
        self.states.view
    }

    pub fn get_instance_state_mask(&self) -> InstanceStateMask {
        self.states.instance
    }

    pub(crate) fn reader(&self) -> EntityId {
        self.reader
    }

    pub(crate) fn states(&self) -> StateFilter {
        self.states
    }

    /// Only a false-to-true flip wakes attached waitsets.
    pub(crate) fn set_trigger_value(&self, value: bool) {
        let previous = self.trigger_value.swap(value, Ordering::AcqRel);
        if value && !previous {
            self.hooks.notify();
        }
    }
}

impl Condition for ReadCondition {
    fn get_trigger_value(&self) -> bool {
        self.trigger_value.load(Ordering::Acquire)
    }

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
}

impl std::fmt::Debug for ReadCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ReadCondition {{ id: {}, reader: {:?}, {:?}, triggered: {} }}",
            self.id,
            self.reader,
            self.states,
            self.get_trigger_value()
        )
    }
}
