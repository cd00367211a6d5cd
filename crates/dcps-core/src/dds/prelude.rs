// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the DCPS API.
//!
//! # Example
//!
//! ```rust,ignore
//! use dcps_core::dds::prelude::*;
//!
//! let participant = Participant::builder("my_app").build()?;
//! ```

pub use super::{
    CancelToken, Condition, ConditionHandler, ContentFilteredTopic, DataReader, DataWriter,
    DdsType, Error, FieldKind, FieldValue, GuardCondition, HasStatusCondition, InstanceHandle,
    InstanceState, Participant, QoS, ReadCondition, Result, Sample, StatusCondition, StatusMask,
    Topic, TopicDescription, TypeShape, TypeSupport, WaitSet,
};
