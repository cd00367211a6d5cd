// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DCPS Participant
//!
//! The [`Participant`] is the entry point of the crate. It owns the type
//! registry and the topic table and acts as a factory for all entities.
//!
//! ## Overview
//!
//! A participant:
//! - Registers sample types ([`TypeSupport`](crate::TypeSupport))
//! - Creates topics and content-filtered topics (one namespace)
//! - Creates publishers, subscribers, writers and readers
//! - Matches writers and readers of a topic (reliability compatibility)
//!
//! ## Example
//!
//! ```rust,ignore
//! use dcps_core::{Participant, QoS, Result};
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("tempering_station").build()?;
//!     participant.register_type(temperature_support())?;
//!
//!     let topic = participant.create_topic::<Temperature>("ChocolateTemperature", "Temperature")?;
//!     let writer = participant.create_writer(&topic, QoS::reliable())?;
//!     let reader = participant.create_reader(&topic, QoS::reliable())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------+
//! |                    Participant                      |
//! |  +-------------+  +-------------+  +-------------+  |
//! |  |  Publisher  |  | Subscriber  |  |   Topic     |  |
//! |  |  +-------+  |  |  +-------+  |  |   table     |  |
//! |  |  |Writer |  |  |  |Reader |  |  |  (DashMap)  |  |
//! |  |  +-------+  |  |  +-------+  |  |             |  |
//! |  +-------------+  +-------------+  +-------------+  |
//! +-----------------------------------------------------+
//! |  Type registry  |  Per-topic endpoints (ArcSwap)    |
//! +-----------------------------------------------------+
//! ```
//!
//! ## See Also
//!
//! - [`ParticipantBuilder`] - Builder pattern for configuration
//! - [`DataWriter`](crate::DataWriter) - Publish samples
//! - [`DataReader`](crate::DataReader) - Receive samples

mod builder;
pub(crate) mod registry;
mod runtime;

pub use builder::ParticipantBuilder;
pub use registry::EntityId;
pub use runtime::Participant;
