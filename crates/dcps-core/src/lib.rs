// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dcps-core - In-process Data-Centric Publish-Subscribe
//!
//! Typed topics, content-filtered views, keyed instance lifecycle
//! (create/update/dispose), read/take semantics and a WaitSet dispatch core,
//! all within one process.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dcps_core::{FieldKind, Participant, QoS, Result, TypeShape, TypeSupport};
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("tempering_station").build()?;
//!     participant.register_type(TypeSupport::<Temperature>::new(
//!         "Temperature",
//!         TypeShape::new()
//!             .field("sensor_id", FieldKind::String)
//!             .field("degrees", FieldKind::Int32)
//!             .key("sensor_id"),
//!     ))?;
//!
//!     let topic = participant.create_topic::<Temperature>("ChocolateTemperature", "Temperature")?;
//!     let writer = participant.create_writer(&topic, QoS::reliable())?;
//!     let reader = participant.create_reader(&topic, QoS::reliable())?;
//!
//!     writer.write(&Temperature { sensor_id: "A".into(), degrees: 31 })?;
//!     assert_eq!(reader.take().len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Application Layer                           |
//! |   Participant -> Publisher/Subscriber -> DataWriter/DataReader      |
//! +---------------------------------------------------------------------+
//! |                           DCPS Layer                                |
//! |   Type Registry | Topics & Views | Instance Stores | WaitSets       |
//! +---------------------------------------------------------------------+
//! |                         Support Layer                               |
//! |   Filter Engine | QoS + YAML profiles | Status records | Defaults   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Participant`] | Type registry, topic table, factory for all entities |
//! | [`Topic`] | Named data channel bound to a registered type |
//! | [`ContentFilteredTopic`] | Topic plus an SQL-like predicate |
//! | [`DataWriter`] | Publishes typed samples and instance lifecycle |
//! | [`DataReader`] | Receives samples into a per-reader instance store |
//! | [`WaitSet`] | Blocks on conditions and dispatches handlers |
//! | [`QoS`] | Reliability, history, lifecycle and delivery policies |
//!
//! ## Modules Overview
//!
//! - [`dds`] - Core DCPS API (start here)
//! - [`config`] - Default bounds and timeouts

/// Global defaults (history depth, queue bounds, timeouts).
pub mod config;
/// Core DCPS API.
pub mod dds;

pub use dds::{
    CancelToken, Condition, ConditionHandler, ContentFilteredTopic, DataReader, DataWriter,
    DdsType, Delivery, EntityId, Error, FieldDescriptor, FieldKind, FieldValue, GuardCondition,
    HasStatusCondition, History, InstanceHandle, InstanceKey, InstanceState, InstanceStateMask,
    KeyValue, Participant, ParticipantBuilder, Publisher, QoS, ReadCondition, Reliability,
    ResourceLimits, Result, Sample, SampleInfo, SampleState, SampleStateMask, StatusCondition,
    StatusMask, Subscriber, Topic, TopicDescription, TypeRegistry, TypeShape, TypeSupport,
    ViewState, ViewStateMask, WaitSet, WriterDataLifecycle,
};
pub use dds::filter;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
