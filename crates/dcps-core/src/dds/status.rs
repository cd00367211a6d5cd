// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Communication status records.
//!
//! Each status carries a cumulative `total_count` and the change since the
//! previous query of that status (`total_count_change`). Querying a status
//! resets its change counter.

use super::type_support::InstanceHandle;

/// Status information for sample lost events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleLostStatus {
    /// Total cumulative count of lost samples.
    pub total_count: u32,
    /// Change in total_count since last query.
    pub total_count_change: i32,
}

/// Status information for sample rejected events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleRejectedStatus {
    /// Total cumulative count of rejected samples.
    pub total_count: u32,
    /// Change in total_count since last query.
    pub total_count_change: i32,
    /// Reason for the last rejection.
    pub last_reason: SampleRejectedReason,
    /// Instance of the last rejected sample.
    pub last_instance_handle: InstanceHandle,
}

/// Reason why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRejectedReason {
    /// Sample was not rejected.
    #[default]
    NotRejected,
    /// KEEP_ALL store reached `max_samples`.
    RejectedBySamplesLimit,
}

/// Status information for incompatible QoS on the reader side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedIncompatibleQosStatus {
    /// Total cumulative count of incompatible writers found.
    pub total_count: u32,
    /// Change in total_count since last query.
    pub total_count_change: i32,
    /// ID of the last incompatible QoS policy.
    pub last_policy_id: u32,
}

/// Status information for incompatible QoS on the writer side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferedIncompatibleQosStatus {
    /// Total cumulative count of incompatible readers found.
    pub total_count: u32,
    /// Change in total_count since last query.
    pub total_count_change: i32,
    /// ID of the last incompatible QoS policy.
    pub last_policy_id: u32,
}

/// Cumulative counter with a change-since-last-query marker.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counter {
    total: u32,
    reported: u32,
}

impl Counter {
    pub(crate) fn add(&mut self, n: u32) {
        self.total = self.total.saturating_add(n);
    }

    /// `(total, change)` and mark the current total as reported.
    pub(crate) fn take(&mut self) -> (u32, i32) {
        let change = self.total.wrapping_sub(self.reported) as i32;
        self.reported = self.total;
        (self.total, change)
    }
}

/// Reader-side status counters.
#[derive(Debug, Default)]
pub(crate) struct ReaderCounters {
    pub(crate) lost: Counter,
    pub(crate) rejected: Counter,
    pub(crate) last_rejected_reason: SampleRejectedReason,
    pub(crate) last_rejected_instance: InstanceHandle,
    pub(crate) incompatible: Counter,
    pub(crate) last_incompatible_policy: u32,
}

impl ReaderCounters {
    pub(crate) fn sample_lost(&mut self) -> SampleLostStatus {
        let (total_count, total_count_change) = self.lost.take();
        SampleLostStatus {
            total_count,
            total_count_change,
        }
    }

    pub(crate) fn sample_rejected(&mut self) -> SampleRejectedStatus {
        let (total_count, total_count_change) = self.rejected.take();
        SampleRejectedStatus {
            total_count,
            total_count_change,
            last_reason: self.last_rejected_reason,
            last_instance_handle: self.last_rejected_instance,
        }
    }

    pub(crate) fn requested_incompatible_qos(&mut self) -> RequestedIncompatibleQosStatus {
        let (total_count, total_count_change) = self.incompatible.take();
        RequestedIncompatibleQosStatus {
            total_count,
            total_count_change,
            last_policy_id: self.last_incompatible_policy,
        }
    }
}

/// Writer-side status counters.
#[derive(Debug, Default)]
pub(crate) struct WriterCounters {
    pub(crate) incompatible: Counter,
    pub(crate) last_incompatible_policy: u32,
}

impl WriterCounters {
    pub(crate) fn offered_incompatible_qos(&mut self) -> OfferedIncompatibleQosStatus {
        let (total_count, total_count_change) = self.incompatible.take();
        OfferedIncompatibleQosStatus {
            total_count,
            total_count_change,
            last_policy_id: self.last_incompatible_policy,
        }
    }
}
