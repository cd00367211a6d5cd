// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Individual QoS policies.

use crate::config::{DEFAULT_HISTORY_DEPTH, KEEP_ALL_MAX_SAMPLES};

/// DDS RELIABILITY policy id (reported in incompatible-QoS statuses).
pub const RELIABILITY_QOS_POLICY_ID: u32 = 11;

/// Reliability policy
///
/// A reader requesting `Reliable` is incompatible with a `BestEffort`
/// writer; every other pairing matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reliability {
    /// Samples may be dropped under resource pressure.
    #[default]
    BestEffort,
    /// Delivery is expected; pairs only with reliable writers.
    Reliable,
}

/// History policy
///
/// Determines how many pending samples a reader keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum History {
    /// Keep last N entries (bounded queue, drops oldest).
    KeepLast(u32),
    /// Keep all entries within `ResourceLimits::max_samples`.
    ///
    /// Inserts are rejected once the limit is reached.
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        Self::KeepLast(DEFAULT_HISTORY_DEPTH)
    }
}

/// Resource limits policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum pending entries held by a KEEP_ALL reader.
    pub max_samples: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_samples: KEEP_ALL_MAX_SAMPLES,
        }
    }
}

/// Writer data lifecycle policy controlling automatic disposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterDataLifecycle {
    /// Whether instances are disposed when the writer goes away.
    pub autodispose_unregistered_instances: bool,
}

impl WriterDataLifecycle {
    /// Create WRITER_DATA_LIFECYCLE with auto-dispose (default).
    pub fn auto_dispose() -> Self {
        Self {
            autodispose_unregistered_instances: true,
        }
    }

    /// Create WRITER_DATA_LIFECYCLE with manual dispose.
    pub fn manual_dispose() -> Self {
        Self {
            autodispose_unregistered_instances: false,
        }
    }

    /// Check if auto-dispose is enabled.
    pub fn is_auto_dispose(&self) -> bool {
        self.autodispose_unregistered_instances
    }
}

impl Default for WriterDataLifecycle {
    fn default() -> Self {
        Self::auto_dispose()
    }
}

/// How a writer hands samples to matching readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Fan-out on the calling thread.
    #[default]
    Synchronous,
    /// Per-writer delivery thread fed by a bounded send queue.
    Asynchronous { queue_depth: usize },
}

/// Policy id of the first requested policy the offered side cannot satisfy.
pub(crate) fn incompatible_policy(
    offered: Reliability,
    requested: Reliability,
) -> Option<u32> {
    match (offered, requested) {
        (Reliability::BestEffort, Reliability::Reliable) => Some(RELIABILITY_QOS_POLICY_ID),
        _ => None,
    }
}
