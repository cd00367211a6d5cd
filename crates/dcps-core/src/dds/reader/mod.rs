// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DCPS DataReader
//!
//! The [`DataReader`] receives the samples published on a topic, or on a
//! content-filtered view of it.
//!
//! ## Overview
//!
//! A DataReader:
//! - Keeps a per-reader instance store (keyed lifecycle, arrival order)
//! - Offers destructive `take()` and non-destructive `read()` access
//! - Reports lifecycle transitions as entries with `valid_data == false`
//! - Tracks status (data available, lost/rejected samples, QoS mismatch)
//!
//! ## Example
//!
//! ```rust,ignore
//! let reader = participant.create_reader(&lots, QoS::reliable())?;
//!
//! for sample in reader.take() {
//!     if sample.info.valid_data {
//!         println!("{:?}", sample.data);
//!     } else if sample.info.instance_state == InstanceState::NotAliveDisposed {
//!         println!("lot {} disposed", sample.info.instance_key);
//!     }
//! }
//! ```
//!
//! ## History
//!
//! The store is bounded by the reader's History QoS:
//! - `KeepLast(n)`: at most `n` pending entries, the oldest is dropped (`SAMPLE_LOST`)
//! - `KeepAll`: at most `max_samples` entries, new ones are rejected (`SAMPLE_REJECTED`)

mod cache;
mod runtime;
#[cfg(test)]
mod tests;

pub use cache::{InstanceState, Sample, SampleInfo, SampleState, ViewState};
pub(crate) use cache::Origin;
pub use runtime::DataReader;
pub(crate) use runtime::ReaderCore;

use super::condition::HasStatusCondition;
use super::DdsType;
use std::sync::Arc;

impl<T: DdsType> HasStatusCondition for DataReader<T> {
    fn get_status_condition(&self) -> Arc<super::StatusCondition> {
        self.get_status_condition()
    }
}
