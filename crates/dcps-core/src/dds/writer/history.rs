// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer-side instance history.
//!
//! Keeps, per instance this writer has written, the key, the last sample and
//! the lifecycle state from the writer's point of view. The last sample is
//! what content filters are evaluated against when the instance is disposed.

use crate::dds::reader::{InstanceState, Origin};
use crate::dds::participant::EntityId;
use crate::dds::type_support::{InstanceHandle, InstanceKey};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

struct InstanceRecord<T> {
    key: InstanceKey,
    last: Option<T>,
    state: InstanceState,
}

pub(crate) struct WriterHistory<T> {
    writer: EntityId,
    instances: HashMap<InstanceHandle, InstanceRecord<T>>,
    next_seq: u64,
}

impl<T: Clone> WriterHistory<T> {
    pub(crate) fn new(writer: EntityId) -> Self {
        Self {
            writer,
            instances: HashMap::new(),
            next_seq: 1,
        }
    }

    /// Stamp the next event of this writer.
    pub(crate) fn next_origin(&mut self) -> Origin {
        let sequence_number = self.next_seq;
        self.next_seq += 1;
        Origin {
            writer: self.writer,
            sequence_number,
            timestamp_ns: now_ns(),
        }
    }

    pub(crate) fn record_write(&mut self, handle: InstanceHandle, key: InstanceKey, sample: T) {
        let record = self
            .instances
            .entry(handle)
            .or_insert_with(|| InstanceRecord {
                key,
                last: None,
                state: InstanceState::Alive,
            });
        record.last = Some(sample);
        record.state = InstanceState::Alive;
    }

    /// Mark a known instance disposed; `false` if the writer never wrote it.
    pub(crate) fn record_dispose(&mut self, handle: InstanceHandle) -> bool {
        match self.instances.get_mut(&handle) {
            Some(record) => {
                record.state = InstanceState::NotAliveDisposed;
                true
            }
            None => false,
        }
    }

    /// Mark a known instance unregistered; `false` if the writer never wrote it.
    pub(crate) fn record_unregister(&mut self, handle: InstanceHandle) -> bool {
        match self.instances.get_mut(&handle) {
            Some(record) => {
                record.state = InstanceState::NotAliveNoWriters;
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, handle: InstanceHandle) -> bool {
        self.instances.contains_key(&handle)
    }

    pub(crate) fn key(&self, handle: InstanceHandle) -> Option<&InstanceKey> {
        self.instances.get(&handle).map(|record| &record.key)
    }

    pub(crate) fn last_sample(&self, handle: InstanceHandle) -> Option<&T> {
        self.instances
            .get(&handle)
            .and_then(|record| record.last.as_ref())
    }

    pub(crate) fn state(&self, handle: InstanceHandle) -> Option<InstanceState> {
        self.instances.get(&handle).map(|record| record.state)
    }

    /// Instances still registered by this writer (alive or disposed).
    pub(crate) fn registered(&self) -> Vec<InstanceHandle> {
        let mut handles: Vec<_> = self
            .instances
            .iter()
            .filter(|(_, record)| record.state != InstanceState::NotAliveNoWriters)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
