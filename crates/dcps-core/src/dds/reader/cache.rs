// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keyed instance store for DataReader with read/take semantics.
//!
//! # Architecture
//!
//! ```text
//! queue:     [E0 a][E1 b][E2 a][E3 a*][E4 c]      (* = lifecycle-only entry)
//!              \      \     \     \     \
//! instances:  a -> {key, ALIVE|DISPOSED|NO_WRITERS, NEW|NOT_NEW, writers}
//!             b -> ...
//!             c -> ...
//! ```
//!
//! A single arrival-ordered queue keeps global and per-instance order; the
//! instance index carries lifecycle state. Every queued entry must have an
//! index record: a dangling entry means the store is corrupted and the store
//! panics rather than hand out samples with a made-up state.
//!
//! The store itself is not synchronized; the owning reader guards it with one
//! mutex.

use crate::dds::participant::EntityId;
use crate::dds::read_condition::StateFilter;
use crate::dds::type_support::{InstanceHandle, InstanceKey};
use std::collections::{HashMap, HashSet, VecDeque};

/// Sample state (NOT_READ vs READ).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    /// Sample has not been read yet.
    NotRead,
    /// Sample has been accessed via `read()`.
    Read,
}

/// Instance lifecycle state as seen by one reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Written and not disposed.
    Alive,
    /// Disposed by a writer.
    NotAliveDisposed,
    /// Every writer of the instance unregistered.
    NotAliveNoWriters,
}

impl InstanceState {
    pub fn is_alive(self) -> bool {
        self == InstanceState::Alive
    }
}

/// Whether the reader has already returned samples of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No sample of this instance returned since it (re)became alive.
    New,
    /// Samples of this instance already returned.
    NotNew,
}

/// Metadata attached to every returned entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleInfo {
    /// `false` for lifecycle-only entries (dispose, unregister).
    pub valid_data: bool,
    pub instance_handle: InstanceHandle,
    pub instance_key: InstanceKey,
    /// Instance state at the time the entry is returned.
    pub instance_state: InstanceState,
    /// Entry state before this read/take.
    pub sample_state: SampleState,
    pub view_state: ViewState,
    /// Writer that produced the entry.
    pub publication_handle: EntityId,
    /// Per-writer sequence number.
    pub sequence_number: u64,
    /// Writer-side timestamp (nanoseconds since UNIX epoch).
    pub source_timestamp_ns: u64,
}

/// An entry returned by read/take.
#[derive(Debug, Clone)]
pub struct Sample<T> {
    /// `None` for lifecycle-only entries.
    pub data: Option<T>,
    pub info: SampleInfo,
}

impl<T> Sample<T> {
    pub fn is_valid(&self) -> bool {
        self.info.valid_data
    }
}

/// Writer-side metadata of an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Origin {
    pub(crate) writer: EntityId,
    pub(crate) sequence_number: u64,
    pub(crate) timestamp_ns: u64,
}

/// What to do when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overflow {
    /// KEEP_LAST: evict the oldest entry.
    DropOldest,
    /// KEEP_ALL: refuse the new entry.
    Reject,
}

/// Result of offering an event to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Queued,
    /// Queued after evicting the oldest entry.
    QueuedDroppedOldest,
    /// Queue full under `Overflow::Reject`; store unchanged.
    Rejected,
    /// Event changed nothing (repeated dispose, unregister of a foreign writer).
    Unchanged,
}

struct Entry<T> {
    handle: InstanceHandle,
    payload: Option<T>,
    origin: Origin,
    state: SampleState,
}

struct Instance {
    key: InstanceKey,
    state: InstanceState,
    view: ViewState,
    writers: HashSet<EntityId>,
}

pub(crate) struct InstanceStore<T> {
    topic: String,
    depth: usize,
    overflow: Overflow,
    queue: VecDeque<Entry<T>>,
    instances: HashMap<InstanceHandle, Instance>,
    unread: usize,
}

impl<T: Clone> InstanceStore<T> {
    pub(crate) fn new(topic: impl Into<String>, depth: usize, overflow: Overflow) -> Self {
        Self {
            topic: topic.into(),
            depth: depth.max(1),
            overflow,
            queue: VecDeque::new(),
            instances: HashMap::new(),
            unread: 0,
        }
    }

    /// Queue a data sample; creates the instance or makes it alive again.
    pub(crate) fn upsert(
        &mut self,
        handle: InstanceHandle,
        key: &InstanceKey,
        sample: T,
        origin: Origin,
    ) -> Admission {
        let Some(dropped) = self.make_room() else {
            return Admission::Rejected;
        };

        let instance = self.instances.entry(handle).or_insert_with(|| Instance {
            key: key.clone(),
            state: InstanceState::Alive,
            view: ViewState::New,
            writers: HashSet::new(),
        });
        if !instance.state.is_alive() {
            instance.state = InstanceState::Alive;
            instance.view = ViewState::New;
        }
        instance.writers.insert(origin.writer);

        self.push(handle, Some(sample), origin);
        Self::admitted(dropped)
    }

    /// Mark the instance DISPOSED and queue one lifecycle entry.
    ///
    /// Repeating a dispose without an intervening write changes nothing. An
    /// unknown key creates the instance directly in DISPOSED.
    pub(crate) fn dispose(
        &mut self,
        handle: InstanceHandle,
        key: &InstanceKey,
        origin: Origin,
    ) -> Admission {
        if self
            .instances
            .get(&handle)
            .is_some_and(|instance| instance.state == InstanceState::NotAliveDisposed)
        {
            return Admission::Unchanged;
        }

        let Some(dropped) = self.make_room() else {
            return Admission::Rejected;
        };

        let instance = self.instances.entry(handle).or_insert_with(|| Instance {
            key: key.clone(),
            state: InstanceState::NotAliveDisposed,
            view: ViewState::New,
            writers: HashSet::new(),
        });
        instance.state = InstanceState::NotAliveDisposed;
        instance.writers.insert(origin.writer);

        self.push(handle, None, origin);
        Self::admitted(dropped)
    }

    /// Remove `origin.writer` from the instance's writers.
    ///
    /// When the last writer of an ALIVE instance leaves, the instance becomes
    /// NOT_ALIVE_NO_WRITERS and one lifecycle entry is queued.
    pub(crate) fn unregister(&mut self, handle: InstanceHandle, origin: Origin) -> Admission {
        let becomes_orphan = match self.instances.get(&handle) {
            Some(instance) => {
                instance.writers.contains(&origin.writer)
                    && instance.writers.len() == 1
                    && instance.state.is_alive()
            }
            None => return Admission::Unchanged,
        };

        if !becomes_orphan {
            if let Some(instance) = self.instances.get_mut(&handle) {
                instance.writers.remove(&origin.writer);
            }
            return Admission::Unchanged;
        }

        let Some(dropped) = self.make_room() else {
            return Admission::Rejected;
        };
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.writers.remove(&origin.writer);
            instance.state = InstanceState::NotAliveNoWriters;
        }

        self.push(handle, None, origin);
        Self::admitted(dropped)
    }

    /// Return (and with `take`, remove) every entry admitted by `filter`,
    /// optionally restricted to one instance, in arrival order.
    pub(crate) fn select(
        &mut self,
        filter: StateFilter,
        only: Option<InstanceHandle>,
        take: bool,
    ) -> Vec<Sample<T>> {
        let mut out = Vec::new();
        let mut touched = HashSet::new();
        let mut kept = VecDeque::with_capacity(if take { self.queue.len() } else { 0 });

        let queue = std::mem::take(&mut self.queue);
        for mut entry in queue {
            let selected = only.map_or(true, |handle| handle == entry.handle) && {
                let instance = self.instance(&entry.handle);
                filter.admits(entry.state, instance.view, instance.state)
            };

            if selected {
                let instance = self.instance(&entry.handle);
                let valid_data = entry.payload.is_some();
                out.push(Sample {
                    data: if take {
                        entry.payload.take()
                    } else {
                        entry.payload.clone()
                    },
                    info: SampleInfo {
                        valid_data,
                        instance_handle: entry.handle,
                        instance_key: instance.key.clone(),
                        instance_state: instance.state,
                        sample_state: entry.state,
                        view_state: instance.view,
                        publication_handle: entry.origin.writer,
                        sequence_number: entry.origin.sequence_number,
                        source_timestamp_ns: entry.origin.timestamp_ns,
                    },
                });
                touched.insert(entry.handle);

                if entry.state == SampleState::NotRead {
                    self.unread -= 1;
                    entry.state = SampleState::Read;
                }
                if take {
                    continue;
                }
            }
            kept.push_back(entry);
        }
        self.queue = kept;

        for handle in touched {
            if let Some(instance) = self.instances.get_mut(&handle) {
                instance.view = ViewState::NotNew;
            }
        }
        out
    }

    pub(crate) fn lookup_key(&self, handle: InstanceHandle) -> Option<InstanceKey> {
        self.instances.get(&handle).map(|instance| instance.key.clone())
    }

    pub(crate) fn instance_state(&self, handle: InstanceHandle) -> Option<InstanceState> {
        self.instances.get(&handle).map(|instance| instance.state)
    }

    pub(crate) fn has_unread(&self) -> bool {
        self.unread > 0
    }

    /// Whether any queued entry is admitted by `filter`.
    pub(crate) fn any_matching(&self, filter: StateFilter) -> bool {
        self.queue.iter().any(|entry| {
            let instance = self.instance(&entry.handle);
            filter.admits(entry.state, instance.view, instance.state)
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// `Some(dropped_oldest)` when there is room for one more entry.
    fn make_room(&mut self) -> Option<bool> {
        if self.queue.len() < self.depth {
            return Some(false);
        }
        match self.overflow {
            Overflow::Reject => None,
            Overflow::DropOldest => {
                if let Some(evicted) = self.queue.pop_front() {
                    if evicted.state == SampleState::NotRead {
                        self.unread -= 1;
                    }
                }
                Some(true)
            }
        }
    }

    fn push(&mut self, handle: InstanceHandle, payload: Option<T>, origin: Origin) {
        self.queue.push_back(Entry {
            handle,
            payload,
            origin,
            state: SampleState::NotRead,
        });
        self.unread += 1;
    }

    fn admitted(dropped: bool) -> Admission {
        if dropped {
            Admission::QueuedDroppedOldest
        } else {
            Admission::Queued
        }
    }

    fn instance(&self, handle: &InstanceHandle) -> &Instance {
        match self.instances.get(handle) {
            Some(instance) => instance,
            None => panic!(
                "[READER] corrupted instance store on '{}': queued entry for instance {} has no index record",
                self.topic, handle
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::read_condition::{InstanceStateMask, SampleStateMask, ViewStateMask};
    use crate::dds::type_support::KeyValue;

    fn key(id: &str) -> (InstanceHandle, InstanceKey) {
        let key = InstanceKey::from(KeyValue::String(id.to_string()));
        (key.handle(), key)
    }

    fn origin(writer: EntityId, seq: u64) -> Origin {
        Origin {
            writer,
            sequence_number: seq,
            timestamp_ns: seq * 1_000,
        }
    }

    fn keep_last(depth: usize) -> InstanceStore<i32> {
        InstanceStore::new("ChocolateTemperature", depth, Overflow::DropOldest)
    }

    #[test]
    fn test_take_preserves_arrival_order() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");
        let (b, kb) = key("B");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.upsert(b, &kb, 2, origin(writer, 2));
        store.upsert(a, &ka, 3, origin(writer, 3));

        let samples = store.select(StateFilter::ANY, None, true);
        let data: Vec<_> = samples.iter().filter_map(|s| s.data).collect();
        assert_eq!(data, vec![1, 2, 3]);
        assert_eq!(samples[1].info.instance_key, kb);
        assert_eq!(store.len(), 0);
        assert!(store.select(StateFilter::ANY, None, true).is_empty());
    }

    #[test]
    fn test_dispose_queues_one_lifecycle_entry() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");

        assert_eq!(store.upsert(a, &ka, 31, origin(writer, 1)), Admission::Queued);
        assert_eq!(store.dispose(a, &ka, origin(writer, 2)), Admission::Queued);
        assert_eq!(store.dispose(a, &ka, origin(writer, 3)), Admission::Unchanged);

        let samples = store.select(StateFilter::ANY, None, true);
        assert_eq!(samples.len(), 2);
        assert!(samples[0].info.valid_data);
        assert_eq!(samples[0].data, Some(31));
        assert!(!samples[1].info.valid_data);
        assert_eq!(samples[1].data, None);
        assert_eq!(
            samples[1].info.instance_state,
            InstanceState::NotAliveDisposed
        );
        assert_eq!(samples[1].info.instance_key, ka);
    }

    #[test]
    fn test_dispose_unknown_key_creates_disposed_instance() {
        let mut store = keep_last(16);
        let (a, ka) = key("ghost");

        assert_eq!(store.dispose(a, &ka, origin(EntityId::next(), 1)), Admission::Queued);
        assert_eq!(store.instance_state(a), Some(InstanceState::NotAliveDisposed));
        assert_eq!(store.lookup_key(a), Some(ka));
    }

    #[test]
    fn test_write_after_dispose_is_alive_and_new() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.select(StateFilter::ANY, None, true);
        store.dispose(a, &ka, origin(writer, 2));
        store.upsert(a, &ka, 2, origin(writer, 3));

        let samples = store.select(StateFilter::ANY, None, true);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].info.instance_state, InstanceState::Alive);
        assert_eq!(samples[1].info.view_state, ViewState::New);

        // A dispose is meaningful again after the re-write.
        assert_eq!(store.dispose(a, &ka, origin(writer, 4)), Admission::Queued);
    }

    #[test]
    fn test_read_marks_entries_and_keeps_them() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");
        store.upsert(a, &ka, 7, origin(writer, 1));
        assert!(store.has_unread());

        let first = store.select(StateFilter::ANY, None, false);
        assert_eq!(first[0].info.sample_state, SampleState::NotRead);
        assert_eq!(first[0].info.view_state, ViewState::New);
        assert!(!store.has_unread());

        let second = store.select(StateFilter::ANY, None, false);
        assert_eq!(second[0].info.sample_state, SampleState::Read);
        assert_eq!(second[0].info.view_state, ViewState::NotNew);
        assert_eq!(store.len(), 1);

        assert!(store.select(StateFilter::NOT_READ, None, false).is_empty());
    }

    #[test]
    fn test_keep_last_drops_oldest() {
        let mut store = keep_last(2);
        let writer = EntityId::next();
        let (a, ka) = key("A");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.upsert(a, &ka, 2, origin(writer, 2));
        assert_eq!(
            store.upsert(a, &ka, 3, origin(writer, 3)),
            Admission::QueuedDroppedOldest
        );

        let data: Vec<_> = store
            .select(StateFilter::ANY, None, true)
            .into_iter()
            .filter_map(|s| s.data)
            .collect();
        assert_eq!(data, vec![2, 3]);
        assert!(!store.has_unread());
    }

    #[test]
    fn test_keep_all_rejects_when_full() {
        let mut store = InstanceStore::new("Lots", 2, Overflow::Reject);
        let writer = EntityId::next();
        let (a, ka) = key("A");
        let (b, kb) = key("B");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.upsert(a, &ka, 2, origin(writer, 2));
        assert_eq!(store.upsert(b, &kb, 3, origin(writer, 3)), Admission::Rejected);
        assert_eq!(store.dispose(a, &ka, origin(writer, 4)), Admission::Rejected);

        // Rejection leaves the store untouched.
        assert_eq!(store.instance_state(a), Some(InstanceState::Alive));
        assert_eq!(store.lookup_key(b), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unregister_last_writer() {
        let mut store = keep_last(16);
        let w1 = EntityId::next();
        let w2 = EntityId::next();
        let (a, ka) = key("A");

        store.upsert(a, &ka, 1, origin(w1, 1));
        store.upsert(a, &ka, 2, origin(w2, 1));

        assert_eq!(store.unregister(a, origin(w1, 2)), Admission::Unchanged);
        assert_eq!(store.instance_state(a), Some(InstanceState::Alive));

        assert_eq!(store.unregister(a, origin(w2, 2)), Admission::Queued);
        assert_eq!(
            store.instance_state(a),
            Some(InstanceState::NotAliveNoWriters)
        );

        let samples = store.select(StateFilter::ANY, None, true);
        assert_eq!(samples.len(), 3);
        assert!(!samples[2].info.valid_data);
        assert_eq!(samples[2].info.publication_handle, w2);
    }

    #[test]
    fn test_unregister_after_dispose_queues_nothing() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.dispose(a, &ka, origin(writer, 2));
        assert_eq!(store.unregister(a, origin(writer, 3)), Admission::Unchanged);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.instance_state(a),
            Some(InstanceState::NotAliveDisposed)
        );
    }

    #[test]
    fn test_select_by_instance_and_state() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");
        let (b, kb) = key("B");

        store.upsert(a, &ka, 1, origin(writer, 1));
        store.upsert(b, &kb, 2, origin(writer, 2));
        store.dispose(b, &kb, origin(writer, 3));

        let only_a = store.select(StateFilter::ANY, Some(a), false);
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].data, Some(1));

        let disposed = StateFilter {
            sample: SampleStateMask::ANY,
            view: ViewStateMask::ANY,
            instance: InstanceStateMask::NOT_ALIVE_DISPOSED,
        };
        assert!(store.any_matching(disposed));
        let taken = store.select(disposed, None, true);
        assert_eq!(taken.len(), 2);
        assert!(taken.iter().all(|s| s.info.instance_handle == b));

        assert_eq!(store.len(), 1);
        assert!(!store.any_matching(disposed));
        assert_eq!(store.instance_count(), 2);
    }

    #[test]
    #[should_panic(expected = "corrupted instance store")]
    fn test_dangling_entry_panics() {
        let mut store = keep_last(16);
        let writer = EntityId::next();
        let (a, ka) = key("A");
        store.upsert(a, &ka, 1, origin(writer, 1));
        store.instances.clear();

        let _ = store.select(StateFilter::ANY, None, true);
    }
}
