// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint registry: entity ids and per-topic reader/writer matching.
//!
//! Each topic keeps the readers attached to it in an `ArcSwap` snapshot so
//! writers fan out without taking a lock; attach/detach publish a new
//! snapshot. Writer records live behind a mutex that also serializes the QoS
//! compatibility check between a new endpoint and the existing ones.

use crate::dds::qos::{incompatible_policy, Reliability};
use crate::dds::reader::ReaderCore;
use crate::dds::DdsType;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a DataWriter or DataReader.
///
/// A reader sees the writer's id as `SampleInfo::publication_handle`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

/// Writer record used for QoS matching.
pub(crate) struct WriterLink {
    pub(crate) id: EntityId,
    pub(crate) reliability: Reliability,
    /// Called with the policy id when an incompatible reader is found.
    pub(crate) on_incompatible: Arc<dyn Fn(u32) + Send + Sync>,
}

/// Readers and writers attached to one topic.
pub(crate) struct Endpoints<T: DdsType> {
    readers: ArcSwap<Vec<Arc<ReaderCore<T>>>>,
    writers: Mutex<Vec<WriterLink>>,
}

impl<T: DdsType> Endpoints<T> {
    pub(crate) fn new() -> Self {
        Self {
            readers: ArcSwap::from_pointee(Vec::new()),
            writers: Mutex::new(Vec::new()),
        }
    }

    /// Attach a reader; every existing writer offering an incompatible QoS
    /// is reported on both sides.
    pub(crate) fn add_reader(&self, reader: Arc<ReaderCore<T>>) {
        let writers = self.writers.lock();
        for writer in writers.iter() {
            if let Some(policy_id) = incompatible_policy(writer.reliability, reader.reliability()) {
                log::debug!(
                    "[REGISTRY] writer {} / reader {} incompatible (policy_id={})",
                    writer.id,
                    reader.id(),
                    policy_id
                );
                reader.record_incompatible_qos(policy_id);
                (writer.on_incompatible)(policy_id);
            }
        }
        self.readers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&reader));
            next
        });
        drop(writers);
    }

    pub(crate) fn remove_reader(&self, id: EntityId) {
        let _writers = self.writers.lock();
        self.readers.rcu(|current| {
            current
                .iter()
                .filter(|reader| reader.id() != id)
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    /// Attach a writer; every existing reader requesting a QoS the writer
    /// does not offer is reported on both sides.
    pub(crate) fn add_writer(&self, link: WriterLink) {
        let mut writers = self.writers.lock();
        for reader in self.readers.load().iter() {
            if let Some(policy_id) = incompatible_policy(link.reliability, reader.reliability()) {
                log::debug!(
                    "[REGISTRY] writer {} / reader {} incompatible (policy_id={})",
                    link.id,
                    reader.id(),
                    policy_id
                );
                reader.record_incompatible_qos(policy_id);
                (link.on_incompatible)(policy_id);
            }
        }
        writers.push(link);
    }

    pub(crate) fn remove_writer(&self, id: EntityId) {
        self.writers.lock().retain(|link| link.id != id);
    }

    /// Readers a writer with `offered` reliability delivers to right now.
    pub(crate) fn matched_readers(&self, offered: Reliability) -> Vec<Arc<ReaderCore<T>>> {
        self.readers
            .load()
            .iter()
            .filter(|reader| incompatible_policy(offered, reader.reliability()).is_none())
            .cloned()
            .collect()
    }

    pub(crate) fn reader_count(&self) -> usize {
        self.readers.load().len()
    }

    pub(crate) fn writer_count(&self) -> usize {
        self.writers.lock().len()
    }
}
