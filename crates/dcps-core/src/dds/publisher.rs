// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DCPS Publisher entity - creates DataWriter instances
//!
//! Publisher and Subscriber are structurally symmetric on purpose: users
//! expect the two factory entities to mirror each other.

use super::{DataWriter, DdsType, Participant, QoS, Result, TopicDescription};
use std::sync::Arc;

/// Publisher - intermediate entity between Participant and DataWriter
///
/// A Publisher groups related DataWriters and carries the QoS they use by
/// default.
///
/// # Example
///
/// ```ignore
/// let participant = Participant::builder("tempering_station").build()?;
///
/// let publisher = participant.create_publisher(QoS::reliable())?;
///
/// // Explicit QoS
/// let writer = publisher.create_writer(&temperature_topic, QoS::reliable().keep_last(10))?;
///
/// // Publisher default
/// let lot_writer = publisher.create_writer_default(&lot_topic)?;
/// ```
pub struct Publisher {
    /// Default QoS of the writers created by this Publisher
    qos: QoS,

    /// Parent participant (owns the topics)
    participant: Arc<Participant>,
}

impl Publisher {
    /// Typically called by `Participant::create_publisher()`.
    pub(crate) fn new(participant: Arc<Participant>, qos: QoS) -> Self {
        Self { qos, participant }
    }

    /// Get the QoS policies for this Publisher
    pub fn qos(&self) -> &QoS {
        &self.qos
    }

    /// QoS a writer gets from [`create_writer_default`](Self::create_writer_default).
    pub fn get_default_writer_qos(&self) -> QoS {
        self.qos.clone()
    }

    /// Create a DataWriter on a topic (or on the topic related to a view).
    ///
    /// # Errors
    ///
    /// - `InvalidQos` if `qos` does not validate
    /// - `UnknownTopic` if the topic was not created by this participant
    /// - `IoError` if the asynchronous delivery thread cannot be spawned
    pub fn create_writer<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
        qos: QoS,
    ) -> Result<DataWriter<T>> {
        self.participant.create_writer(description, qos)
    }

    /// Create a DataWriter with the Publisher's QoS.
    pub fn create_writer_default<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
    ) -> Result<DataWriter<T>> {
        self.create_writer(description, self.qos.clone())
    }

    /// Get the parent participant
    pub fn get_participant(&self) -> &Arc<Participant> {
        &self.participant
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("participant", &self.participant.name())
            .field("qos", &self.qos)
            .finish()
    }
}
