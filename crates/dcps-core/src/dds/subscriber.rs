// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DCPS Subscriber entity - creates DataReader instances
//!
//! Publisher and Subscriber are structurally symmetric on purpose: users
//! expect the two factory entities to mirror each other.

use super::{DataReader, DdsType, Participant, QoS, Result, TopicDescription};
use std::sync::Arc;

/// Subscriber - intermediate entity between Participant and DataReader
///
/// A Subscriber groups related DataReaders and carries the QoS they use by
/// default.
///
/// # Example
///
/// ```ignore
/// let participant = Participant::builder("tempering_monitor").build()?;
///
/// let subscriber = participant.create_subscriber(QoS::reliable())?;
///
/// // Readers on a view only see the samples its filter admits
/// let alarms = subscriber.create_reader(&out_of_range, QoS::reliable())?;
/// let lots = subscriber.create_reader_default(&lot_topic)?;
/// ```
pub struct Subscriber {
    /// Default QoS of the readers created by this Subscriber
    qos: QoS,

    /// Parent participant (owns the topics)
    participant: Arc<Participant>,
}

impl Subscriber {
    /// Typically called by `Participant::create_subscriber()`.
    pub(crate) fn new(participant: Arc<Participant>, qos: QoS) -> Self {
        Self { qos, participant }
    }

    /// Get the QoS policies for this Subscriber
    pub fn qos(&self) -> &QoS {
        &self.qos
    }

    /// QoS a reader gets from [`create_reader_default`](Self::create_reader_default).
    pub fn get_default_reader_qos(&self) -> QoS {
        self.qos.clone()
    }

    /// Create a DataReader on a topic or content-filtered topic.
    ///
    /// # Errors
    ///
    /// - `InvalidQos` if `qos` does not validate
    /// - `UnknownTopic` if the topic was not created by this participant
    pub fn create_reader<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
        qos: QoS,
    ) -> Result<DataReader<T>> {
        self.participant.create_reader(description, qos)
    }

    /// Create a DataReader with the Subscriber's QoS.
    pub fn create_reader_default<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
    ) -> Result<DataReader<T>> {
        self.create_reader(description, self.qos.clone())
    }

    /// Get the parent participant
    pub fn get_participant(&self) -> &Arc<Participant> {
        &self.participant
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("participant", &self.participant.name())
            .field("qos", &self.qos)
            .finish()
    }
}
