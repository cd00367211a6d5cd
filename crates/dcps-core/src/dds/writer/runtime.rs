// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::delivery::{deliver, route, DeliveryWorker, WriterEvent};
use super::history::WriterHistory;
use crate::dds::participant::registry::WriterLink;
use crate::dds::participant::EntityId;
use crate::dds::qos::Delivery;
use crate::dds::reader::InstanceState;
use crate::dds::status::{OfferedIncompatibleQosStatus, WriterCounters};
use crate::dds::topic::TopicShared;
use crate::dds::type_support::InstanceHandle;
use crate::dds::{DdsType, Error, QoS, Result, StatusCondition, StatusMask};
use parking_lot::Mutex;
use std::sync::Arc;

/// A typed DataWriter that publishes samples on a topic.
///
/// `write()` extracts the instance key through the registered type support,
/// records the sample in the writer's instance history and hands a copy to
/// every matching DataReader (same topic, compatible QoS, filter passes).
///
/// # Example
///
/// ```rust,ignore
/// let writer = publisher.create_writer(&lot_topic, QoS::reliable())?;
///
/// let lot = ChocolateLotState { lot_id: 1, lot_status: LotStatus::Waiting, .. };
/// writer.write(&lot)?;
///
/// // Lot finished: readers see one lifecycle-only entry
/// let handle = writer.lookup_instance(&lot)?;
/// writer.dispose(handle)?;
/// ```
///
/// # Delivery
///
/// - **Synchronous** (default): readers are filled before `write()` returns
/// - **Asynchronous**: a per-writer thread delivers from a bounded queue;
///   `write()` blocks up to `max_blocking_time` when the queue is full and then
///   fails with `QueueOverflow`
///
/// # Lifecycle
///
/// Dropping the writer disposes its live instances
/// (`autodispose_unregistered_instances = true`, the default) and then
/// unregisters them. With `QoS::manual_dispose()` instances are only
/// unregistered; readers see them become NOT_ALIVE_NO_WRITERS once every
/// writer of the instance is gone.
///
/// # Thread Safety
///
/// `DataWriter<T>` is `Send + Sync`. Concurrent writes on one writer are
/// serialized; events of one writer reach readers in the order they were
/// produced.
pub struct DataWriter<T: DdsType> {
    id: EntityId,
    topic: Arc<TopicShared<T>>,
    description: String,
    qos: QoS,
    history: Mutex<WriterHistory<T>>,
    worker: Option<DeliveryWorker<T>>,
    counters: Arc<Mutex<WriterCounters>>,
    status_condition: Arc<StatusCondition>,
}

impl<T: DdsType> DataWriter<T> {
    pub(crate) fn new(topic: Arc<TopicShared<T>>, description: &str, qos: QoS) -> Result<Self> {
        let id = EntityId::next();
        let worker = match qos.delivery {
            Delivery::Synchronous => None,
            Delivery::Asynchronous { queue_depth } => {
                Some(DeliveryWorker::spawn(id, topic.name(), queue_depth)?)
            }
        };

        let counters = Arc::new(Mutex::new(WriterCounters::default()));
        let status_condition = Arc::new(StatusCondition::new());
        let on_incompatible = {
            let counters = Arc::clone(&counters);
            let status_condition = Arc::clone(&status_condition);
            Arc::new(move |policy_id: u32| {
                {
                    let mut counters = counters.lock();
                    counters.incompatible.add(1);
                    counters.last_incompatible_policy = policy_id;
                }
                status_condition.raise(StatusMask::OFFERED_INCOMPATIBLE_QOS);
            })
        };
        topic.endpoints().add_writer(WriterLink {
            id,
            reliability: qos.reliability,
            on_incompatible,
        });

        log::debug!(
            "[WRITER] created {} on '{}' (topic '{}', {:?}, {:?})",
            id,
            description,
            topic.name(),
            qos.reliability,
            qos.delivery
        );

        Ok(Self {
            id,
            history: Mutex::new(WriterHistory::new(id)),
            topic,
            description: description.to_string(),
            qos,
            worker,
            counters,
            status_condition,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn qos(&self) -> &QoS {
        &self.qos
    }

    /// Name of the topic samples are published on.
    #[must_use]
    pub fn topic_name(&self) -> &str {
        self.topic.name()
    }

    /// Name of the description the writer was created on (topic or view).
    #[must_use]
    pub fn description_name(&self) -> &str {
        &self.description
    }

    /// Publish a sample.
    ///
    /// The first write of a key registers the instance; writing a disposed
    /// instance makes it alive again.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if a key field cannot be read from `sample`
    /// - `QueueOverflow` if the asynchronous send queue stayed full for
    ///   `max_blocking_time`; the instance history is left untouched
    /// - `InvalidState` if the asynchronous delivery thread has stopped
    pub fn write(&self, sample: &T) -> Result<()> {
        let key = self.topic.support().key_of(sample)?;
        let handle = key.handle();

        let mut history = self.history.lock();
        let origin = history.next_origin();
        self.publish(WriterEvent::Data {
            handle,
            key: key.clone(),
            sample: sample.clone(),
            origin,
        })?;
        history.record_write(handle, key, sample.clone());
        Ok(())
    }

    /// Dispose an instance previously written by this writer.
    ///
    /// Matching readers receive one lifecycle-only entry; readers on a view
    /// only if the filter admits the last sample written for the instance.
    ///
    /// # Errors
    ///
    /// `UnknownInstance` if this writer never wrote `handle`.
    pub fn dispose(&self, handle: InstanceHandle) -> Result<()> {
        let mut history = self.history.lock();
        let Some(key) = history.key(handle).cloned() else {
            return Err(self.unknown_instance(handle));
        };
        let last = history.last_sample(handle).cloned();
        let origin = history.next_origin();

        self.publish(WriterEvent::Dispose {
            handle,
            key,
            last,
            origin,
        })?;
        history.record_dispose(handle);
        Ok(())
    }

    /// Dispose the instance `sample` belongs to.
    pub fn dispose_sample(&self, sample: &T) -> Result<()> {
        let handle = self.topic.support().key_of(sample)?.handle();
        self.dispose(handle)
    }

    /// Handle of the instance `sample` belongs to.
    ///
    /// # Errors
    ///
    /// `UnknownInstance` if this writer never wrote that instance.
    pub fn lookup_instance(&self, sample: &T) -> Result<InstanceHandle> {
        let handle = self.topic.support().key_of(sample)?.handle();
        if self.history.lock().contains(handle) {
            Ok(handle)
        } else {
            Err(self.unknown_instance(handle))
        }
    }

    /// Stop writing an instance without disposing it.
    ///
    /// Readers see NOT_ALIVE_NO_WRITERS once no other writer keeps the
    /// instance registered. Unregistering twice is a no-op.
    pub fn unregister_instance(&self, handle: InstanceHandle) -> Result<()> {
        let mut history = self.history.lock();
        match history.state(handle) {
            None => return Err(self.unknown_instance(handle)),
            Some(InstanceState::NotAliveNoWriters) => return Ok(()),
            Some(_) => {}
        }
        let origin = history.next_origin();
        self.publish(WriterEvent::Unregister { handle, origin })?;
        history.record_unregister(handle);
        Ok(())
    }

    /// Writer-side state of an instance (`None` if never written).
    pub fn instance_state(&self, handle: InstanceHandle) -> Option<InstanceState> {
        self.history.lock().state(handle)
    }

    /// Status bits raised since the previous call; clears them.
    pub fn get_status_changes(&self) -> StatusMask {
        self.status_condition.take_active()
    }

    pub fn offered_incompatible_qos_status(&self) -> OfferedIncompatibleQosStatus {
        self.counters.lock().offered_incompatible_qos()
    }

    #[must_use]
    pub fn get_status_condition(&self) -> Arc<StatusCondition> {
        Arc::clone(&self.status_condition)
    }

    /// Route an event and hand it to its readers. Callers hold the history
    /// lock, so recipients are fixed at production time and events leave in
    /// production order.
    fn publish(&self, event: WriterEvent<T>) -> Result<()> {
        let outgoing = route(&self.topic, self.qos.reliability, event);
        match &self.worker {
            None => {
                let matched = deliver(&outgoing);
                log::debug!(
                    "[WRITER] {} {} instance {} -> {} reader(s)",
                    self.id,
                    outgoing.event.operation(),
                    outgoing.event.handle(),
                    matched
                );
                Ok(())
            }
            Some(worker) => worker
                .submit(outgoing, self.qos.max_blocking_time)
                .map_err(|failed| {
                    let err = failed.into_error(self.topic.name());
                    log::warn!("[WRITER] {} {}", self.id, err);
                    err
                }),
        }
    }

    /// Lifecycle events emitted on drop must not be lost to a full queue.
    fn publish_blocking(&self, event: WriterEvent<T>) {
        let outgoing = route(&self.topic, self.qos.reliability, event);
        match &self.worker {
            None => {
                deliver(&outgoing);
            }
            Some(worker) => worker.submit_blocking(outgoing),
        }
    }

    fn unknown_instance(&self, handle: InstanceHandle) -> Error {
        Error::UnknownInstance {
            topic: self.topic.name().to_string(),
            handle,
        }
    }
}

impl<T: DdsType> Drop for DataWriter<T> {
    fn drop(&mut self) {
        let autodispose = self.qos.writer_data_lifecycle.is_auto_dispose();
        {
            let mut history = self.history.lock();
            for handle in history.registered() {
                if autodispose && history.state(handle) == Some(InstanceState::Alive) {
                    if let Some(key) = history.key(handle).cloned() {
                        let last = history.last_sample(handle).cloned();
                        let origin = history.next_origin();
                        self.publish_blocking(WriterEvent::Dispose {
                            handle,
                            key,
                            last,
                            origin,
                        });
                        history.record_dispose(handle);
                    }
                }
                let origin = history.next_origin();
                self.publish_blocking(WriterEvent::Unregister { handle, origin });
                history.record_unregister(handle);
            }
        }

        self.topic.endpoints().remove_writer(self.id);
        // Drain the send queue before returning
        drop(self.worker.take());
        log::debug!("[WRITER] dropped {} on '{}'", self.id, self.description);
    }
}

impl<T: DdsType> std::fmt::Debug for DataWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWriter")
            .field("id", &self.id)
            .field("topic", &self.topic.name())
            .field("description", &self.description)
            .field("qos", &self.qos)
            .finish()
    }
}
