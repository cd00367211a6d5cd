// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DCPS DataWriter
//!
//! The [`DataWriter`] publishes typed samples on a topic.
//!
//! ## Overview
//!
//! A DataWriter:
//! - Extracts the instance key of every sample through the type registry
//! - Keeps an instance history (key, last sample, state) for dispose matching
//! - Fans samples and lifecycle notifications out to matching readers
//! - Reports readers requesting a QoS it does not offer
//!
//! ## Example
//!
//! ```rust,ignore
//! let writer = participant.create_writer(&topic, QoS::reliable())?;
//! writer.write(&Temperature { sensor_id: "A".into(), degrees: 31 })?;
//! ```
//!
//! ## Delivery Path
//!
//! ```text
//! write() --> route() --+--> Synchronous:  deliver() on the caller thread --> readers
//!                       |
//!                       +--> Asynchronous: bounded queue --> delivery thread --> readers
//! ```
//!
//! `route()` fixes the recipients when the sample is written.

mod delivery;
mod history;
mod runtime;

pub use runtime::DataWriter;

use super::condition::HasStatusCondition;
use super::{DdsType, StatusCondition};
use std::sync::Arc;

impl<T: DdsType> HasStatusCondition for DataWriter<T> {
    fn get_status_condition(&self) -> Arc<StatusCondition> {
        self.get_status_condition()
    }
}
