// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS profile aggregation and builder pattern.

use super::policies::{Delivery, History, Reliability, ResourceLimits, WriterDataLifecycle};
use crate::config::{DEFAULT_HISTORY_DEPTH, DEFAULT_MAX_BLOCKING_TIME, DEFAULT_SEND_QUEUE_DEPTH};
use crate::dds::{Error, Result};
use std::time::Duration;

/// Aggregated QoS profile used by writers and readers.
///
/// Reader-side: `reliability`, `history`, `resource_limits`.
/// Writer-side: `reliability`, `writer_data_lifecycle`, `delivery`,
/// `max_blocking_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct QoS {
    pub reliability: Reliability,
    pub history: History,
    pub resource_limits: ResourceLimits,
    pub writer_data_lifecycle: WriterDataLifecycle,
    pub delivery: Delivery,
    /// Longest an asynchronous `write()` waits on a full send queue.
    pub max_blocking_time: Duration,
}

impl QoS {
    /// Create BestEffort QoS profile (default baseline).
    pub fn best_effort() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            history: History::KeepLast(DEFAULT_HISTORY_DEPTH),
            resource_limits: ResourceLimits::default(),
            writer_data_lifecycle: WriterDataLifecycle::default(),
            delivery: Delivery::Synchronous,
            max_blocking_time: DEFAULT_MAX_BLOCKING_TIME,
        }
    }

    /// Create Reliable QoS profile.
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::best_effort()
        }
    }

    /// Set KEEP_LAST history depth.
    pub fn keep_last(mut self, depth: u32) -> Self {
        self.history = History::KeepLast(depth);
        self
    }

    /// Set KEEP_ALL history policy.
    pub fn keep_all(mut self) -> Self {
        self.history = History::KeepAll;
        self
    }

    /// Bound the pending entries of a KEEP_ALL reader.
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.resource_limits.max_samples = max_samples;
        self
    }

    /// Set WRITER_DATA_LIFECYCLE policy.
    pub fn writer_data_lifecycle(mut self, lifecycle: WriterDataLifecycle) -> Self {
        self.writer_data_lifecycle = lifecycle;
        self
    }

    /// Instances survive writer deletion as NOT_ALIVE_NO_WRITERS instead of
    /// being disposed.
    pub fn manual_dispose(mut self) -> Self {
        self.writer_data_lifecycle = WriterDataLifecycle::manual_dispose();
        self
    }

    /// Fan-out on the calling thread (default).
    pub fn synchronous(mut self) -> Self {
        self.delivery = Delivery::Synchronous;
        self
    }

    /// Deliver from a per-writer thread through a send queue of `queue_depth`.
    pub fn asynchronous(mut self, queue_depth: usize) -> Self {
        self.delivery = Delivery::Asynchronous { queue_depth };
        self
    }

    /// Asynchronous delivery with the default queue depth.
    pub fn asynchronous_default(self) -> Self {
        self.asynchronous(DEFAULT_SEND_QUEUE_DEPTH)
    }

    /// Longest an asynchronous `write()` blocks on a full send queue.
    pub fn max_blocking_time(mut self, timeout: Duration) -> Self {
        self.max_blocking_time = timeout;
        self
    }

    /// Reject policy values that cannot be honored.
    pub fn validate(&self) -> Result<()> {
        if self.history == History::KeepLast(0) {
            return Err(Error::InvalidQos("KEEP_LAST depth must be > 0".into()));
        }
        if self.resource_limits.max_samples == 0 {
            return Err(Error::InvalidQos("max_samples must be > 0".into()));
        }
        if self.delivery == (Delivery::Asynchronous { queue_depth: 0 }) {
            return Err(Error::InvalidQos(
                "asynchronous queue_depth must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Pending-queue bound applied by a reader using this QoS.
    pub(crate) fn reader_depth(&self) -> usize {
        match self.history {
            History::KeepLast(depth) => depth as usize,
            History::KeepAll => self.resource_limits.max_samples,
        }
    }

    #[cfg(feature = "qos-loaders")]
    /// Load a QoS profile from a YAML file.
    ///
    /// `profile = None` selects the document's default profile.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let qos = QoS::load_yaml("qos_profiles.yaml", Some("tempering_line"))?;
    /// ```
    pub fn load_yaml<P: AsRef<std::path::Path>>(path: P, profile: Option<&str>) -> Result<Self> {
        super::loaders::YamlLoader::load_qos(path, profile)
    }
}

impl Default for QoS {
    fn default() -> Self {
        Self::best_effort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_builders() {
        let qos = QoS::reliable()
            .keep_all()
            .max_samples(16)
            .asynchronous(8)
            .max_blocking_time(Duration::from_millis(5))
            .manual_dispose();

        assert_eq!(qos.reliability, Reliability::Reliable);
        assert_eq!(qos.history, History::KeepAll);
        assert_eq!(qos.resource_limits.max_samples, 16);
        assert_eq!(qos.delivery, Delivery::Asynchronous { queue_depth: 8 });
        assert_eq!(qos.max_blocking_time, Duration::from_millis(5));
        assert!(!qos.writer_data_lifecycle.is_auto_dispose());
        assert_eq!(qos.reader_depth(), 16);
    }

    #[test]
    fn test_qos_default_is_best_effort() {
        let qos = QoS::default();
        assert_eq!(qos.reliability, Reliability::BestEffort);
        assert_eq!(qos.reader_depth(), DEFAULT_HISTORY_DEPTH as usize);
        assert!(qos.validate().is_ok());
    }

    #[test]
    fn test_qos_validate() {
        assert!(matches!(
            QoS::default().keep_last(0).validate(),
            Err(Error::InvalidQos(_))
        ));
        assert!(matches!(
            QoS::default().keep_all().max_samples(0).validate(),
            Err(Error::InvalidQos(_))
        ));
        assert!(matches!(
            QoS::default().asynchronous(0).validate(),
            Err(Error::InvalidQos(_))
        ));
    }
}
