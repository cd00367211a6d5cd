// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DCPS Core API
//!
//! Data-Centric Publish-Subscribe entities for in-process data distribution.
//!
//! ## Overview
//!
//! - **Participant**: Entry point, type registry and factory for all entities
//! - **Topic**: Named data channel with an associated registered type
//! - **ContentFilteredTopic**: Topic plus an SQL-like predicate
//! - **Publisher/Subscriber**: Intermediate grouping entities
//! - **DataWriter/DataReader**: Endpoints that send/receive typed samples
//! - **WaitSet**: Blocking wait and handler dispatch over Conditions
//!
//! ## Quick Start
//!
//! ```ignore
//! use dcps_core::{Participant, QoS, TypeShape, TypeSupport, FieldKind};
//!
//! let participant = Participant::new("factory")?;
//! participant.register_type(TypeSupport::<Temperature>::new(
//!     "Temperature",
//!     TypeShape::new()
//!         .field("sensor_id", FieldKind::String)
//!         .field("degrees", FieldKind::Int32)
//!         .key("sensor_id"),
//! ))?;
//! let topic = participant.create_topic::<Temperature>("ChocolateTemperature", "Temperature")?;
//!
//! let writer = participant.create_writer(&topic, QoS::reliable())?;
//! let reader = participant.create_reader(&topic, QoS::reliable())?;
//!
//! writer.write(&Temperature { sensor_id: "A".into(), degrees: 31 })?;
//! for sample in reader.take() {
//!     println!("{:?} valid={}", sample.data, sample.info.valid_data);
//! }
//! ```
//!
//! ## Entity Hierarchy
//!
//! ```text
//! Participant
//! +-- TypeRegistry
//! +-- Topic<T> / ContentFilteredTopic<T>
//! +-- Publisher
//! |   +-- DataWriter<T>  ------> Topic<T>
//! +-- Subscriber
//!     +-- DataReader<T>  <------ Topic<T> | ContentFilteredTopic<T>
//! ```

mod cancel;
mod condition;
mod content_filtered_topic;
/// Content filter expression parser and evaluator.
pub mod filter;
mod participant;
/// Prelude module for convenient imports.
pub mod prelude;
mod publisher;
/// QoS policy definitions, builders and profile loaders.
pub mod qos;
mod read_condition;
mod reader;
/// Communication status records.
pub mod status;
mod subscriber;
#[cfg(test)]
pub(crate) mod test_types;
mod topic;
/// Type registry, shapes and instance keys.
pub mod type_support;
mod waitset;
mod wake;
mod writer;

pub use cancel::CancelToken;
pub use condition::{Condition, GuardCondition, HasStatusCondition, StatusCondition, StatusMask};
pub use content_filtered_topic::ContentFilteredTopic;
pub use filter::{ContentFilter, FieldValue, FilterError, FilterEvaluator};
pub use participant::{EntityId, Participant, ParticipantBuilder};
pub use publisher::Publisher;
pub use qos::{Delivery, History, QoS, Reliability, ResourceLimits, WriterDataLifecycle};
pub use read_condition::{InstanceStateMask, ReadCondition, SampleStateMask, ViewStateMask};
pub use reader::{DataReader, InstanceState, Sample, SampleInfo, SampleState, ViewState};
pub use status::{
    OfferedIncompatibleQosStatus, RequestedIncompatibleQosStatus, SampleLostStatus,
    SampleRejectedReason, SampleRejectedStatus,
};
pub use subscriber::Subscriber;
pub use topic::{Topic, TopicDescription};
pub use type_support::{
    FieldDescriptor, FieldKind, InstanceHandle, InstanceKey, KeyValue, TypeRegistry, TypeShape,
    TypeSupport,
};
pub use waitset::{ConditionHandler, WaitSet};
pub use writer::DataWriter;

/// Errors returned by DCPS operations.
///
/// Setup errors (types, topics, QoS, filters) surface synchronously from the
/// factory call. Per-reader delivery failures never fail `write()`; they are
/// recorded in that reader's status instead.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// QoS policy is invalid (e.g., zero depth, zero queue).
    InvalidQos(String),
    /// Configuration file not found at specified path.
    ConfigFileNotFound(String),
    /// Configuration file could not be parsed or references an unknown profile.
    ConfigParse(String),

    // ========================================================================
    // Type and Topic Errors
    // ========================================================================
    /// No type registered under this name.
    UnknownType(String),
    /// Type name already registered with a different shape or Rust type.
    DuplicateType(String),
    /// Type shape is malformed (duplicate field, bad key field).
    InvalidType(String),
    /// A key field could not be read from a sample.
    InvalidKey { type_name: String, field: String },
    /// No topic with this name.
    UnknownTopic(String),
    /// Topic name already in use.
    DuplicateTopic { topic: String },
    /// Rust type differs from the type bound to the topic or type name.
    TypeMismatch {
        topic: String,
        expected: String,
        found: String,
    },
    /// Filter expression rejected (syntax, unknown field, parameter count).
    FilterSyntax {
        expression: String,
        source: FilterError,
    },

    // ========================================================================
    // Instance and Resource Errors
    // ========================================================================
    /// Instance never written by this writer.
    UnknownInstance {
        topic: String,
        handle: InstanceHandle,
    },
    /// Bounded queue full (async send queue, or KEEP_ALL reader store).
    QueueOverflow {
        topic: String,
        handle: InstanceHandle,
        operation: &'static str,
    },
    /// Delivery thread could not be spawned.
    IoError(std::io::Error),
    /// Operation not valid for the entity's current state or ownership.
    InvalidState(String),

    // ========================================================================
    // WaitSet Errors
    // ========================================================================
    /// Another thread is already waiting on this WaitSet.
    ConcurrentWait,
    /// Condition already attached to this WaitSet.
    AlreadyAttached,
    /// Condition not attached to this WaitSet.
    NotAttached,
    /// Wait interrupted by a [`CancelToken`].
    Cancelled,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Configuration
            Error::InvalidQos(msg) => write!(f, "Invalid QoS: {}", msg),
            Error::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            Error::ConfigParse(msg) => write!(f, "Config parse error: {}", msg),
            // Types and topics
            Error::UnknownType(name) => write!(f, "Unknown type '{}'", name),
            Error::DuplicateType(name) => {
                write!(f, "Type '{}' already registered with a different definition", name)
            }
            Error::InvalidType(msg) => write!(f, "Invalid type: {}", msg),
            Error::InvalidKey { type_name, field } => {
                write!(f, "Cannot extract key field '{}' of '{}'", field, type_name)
            }
            Error::UnknownTopic(name) => write!(f, "Unknown topic '{}'", name),
            Error::DuplicateTopic { topic } => write!(f, "Topic '{}' already exists", topic),
            Error::TypeMismatch {
                topic,
                expected,
                found,
            } => write!(
                f,
                "Type mismatch on '{}': expected {}, found {}",
                topic, expected, found
            ),
            Error::FilterSyntax { expression, source } => {
                write!(f, "Invalid filter \"{}\": {}", expression, source)
            }
            // Instances and resources
            Error::UnknownInstance { topic, handle } => {
                write!(f, "Unknown instance {} on '{}'", handle, topic)
            }
            Error::QueueOverflow {
                topic,
                handle,
                operation,
            } => write!(
                f,
                "Queue overflow on '{}' during {} (instance {})",
                topic, operation, handle
            ),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            // WaitSet
            Error::ConcurrentWait => write!(f, "WaitSet is already being waited on"),
            Error::AlreadyAttached => write!(f, "Condition already attached"),
            Error::NotAttached => write!(f, "Condition not attached"),
            Error::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::FilterSyntax { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

/// Sample type contract.
///
/// Samples are cloned into every matching reader, so `Clone` should be cheap
/// relative to the sample rate. Field values are exposed through an explicit
/// accessor; content filters and key extraction read them by name.
///
/// # Example
///
/// ```ignore
/// impl DdsType for Temperature {
///     fn field(&self, name: &str) -> Option<FieldValue> {
///         match name {
///             "sensor_id" => Some(self.sensor_id.as_str().into()),
///             "degrees" => Some(self.degrees.into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait DdsType: Clone + Send + Sync + 'static {
    /// Value of the named field, or `None` if the type has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;
}
