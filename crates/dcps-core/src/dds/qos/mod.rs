// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS Quality of Service policies.
//!
//! Only the policies the in-process core honors are modeled: reliability
//! (matching), history and resource limits (reader queue bounds), writer data
//! lifecycle, and the writer delivery mode.

mod policies;
mod profile;

#[cfg(feature = "qos-loaders")]
pub mod loaders;

pub(crate) use policies::incompatible_policy;
pub use policies::{
    Delivery, History, Reliability, ResourceLimits, WriterDataLifecycle,
    RELIABILITY_QOS_POLICY_ID,
};
pub use profile::QoS;
