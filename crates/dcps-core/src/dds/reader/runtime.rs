// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::cache::{Admission, InstanceState, InstanceStore, Origin, Overflow, Sample};
use crate::dds::filter::FilterEvaluator;
use crate::dds::participant::EntityId;
use crate::dds::qos::{History, Reliability};
use crate::dds::read_condition::{
    InstanceStateMask, ReadCondition, SampleStateMask, StateFilter, ViewStateMask,
};
use crate::dds::status::{
    ReaderCounters, RequestedIncompatibleQosStatus, SampleLostStatus, SampleRejectedReason,
    SampleRejectedStatus,
};
use crate::dds::topic::TopicShared;
use crate::dds::type_support::{InstanceHandle, InstanceKey};
use crate::dds::{Condition, DdsType, Error, QoS, Result, StatusCondition, StatusMask};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Receive side of a DataReader, shared with the writers of its topic.
///
/// Writers pick their recipients with [`accepts`](Self::accepts) when the
/// event is produced and later call the `deliver_*` methods, from the
/// writing thread or a delivery thread. The application side goes through
/// [`DataReader`]. Status flags and read conditions are updated while the
/// store lock is held so waiters never observe a stale trigger.
pub(crate) struct ReaderCore<T: DdsType> {
    id: EntityId,
    topic: String,
    qos: QoS,
    filter: Option<FilterEvaluator>,
    store: Mutex<InstanceStore<T>>,
    counters: Mutex<ReaderCounters>,
    status_condition: Arc<StatusCondition>,
    read_conditions: Mutex<Vec<Weak<ReadCondition>>>,
}

impl<T: DdsType> ReaderCore<T> {
    pub(crate) fn new(topic: &str, qos: QoS, filter: Option<FilterEvaluator>) -> Self {
        let overflow = match qos.history {
            History::KeepLast(_) => Overflow::DropOldest,
            History::KeepAll => Overflow::Reject,
        };
        let store = InstanceStore::new(topic, qos.reader_depth(), overflow);

        Self {
            id: EntityId::next(),
            topic: topic.to_string(),
            qos,
            filter,
            store: Mutex::new(store),
            counters: Mutex::new(ReaderCounters::default()),
            status_condition: Arc::new(StatusCondition::new()),
            read_conditions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn reliability(&self) -> Reliability {
        self.qos.reliability
    }

    /// Whether the content filter (if any) admits `sample`.
    pub(crate) fn accepts(&self, sample: &T) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.evaluate(sample))
    }

    /// Store a sample the writer already routed here.
    pub(crate) fn deliver_data(
        &self,
        handle: InstanceHandle,
        key: &InstanceKey,
        sample: &T,
        origin: Origin,
    ) {
        let mut store = self.store.lock();
        let admission = store.upsert(handle, key, sample.clone(), origin);
        self.after_admission(&store, admission, handle, "write");
    }

    pub(crate) fn deliver_dispose(&self, handle: InstanceHandle, key: &InstanceKey, origin: Origin) {
        let mut store = self.store.lock();
        let admission = store.dispose(handle, key, origin);
        self.after_admission(&store, admission, handle, "dispose");
    }

    pub(crate) fn deliver_unregister(&self, handle: InstanceHandle, origin: Origin) {
        let mut store = self.store.lock();
        let admission = store.unregister(handle, origin);
        self.after_admission(&store, admission, handle, "unregister");
    }

    /// A matched writer offers a QoS this reader cannot accept.
    pub(crate) fn record_incompatible_qos(&self, policy_id: u32) {
        {
            let mut counters = self.counters.lock();
            counters.incompatible.add(1);
            counters.last_incompatible_policy = policy_id;
        }
        log::warn!(
            "[READER] {} on '{}' requested incompatible QoS (policy_id={})",
            self.id,
            self.topic,
            policy_id
        );
        self.status_condition
            .raise(StatusMask::REQUESTED_INCOMPATIBLE_QOS);
    }

    fn after_admission(
        &self,
        store: &InstanceStore<T>,
        admission: Admission,
        handle: InstanceHandle,
        operation: &'static str,
    ) {
        match admission {
            Admission::Queued => {
                self.status_condition.raise(StatusMask::DATA_AVAILABLE);
            }
            Admission::QueuedDroppedOldest => {
                self.counters.lock().lost.add(1);
                log::warn!(
                    "[READER] {} on '{}' dropped oldest entry (KEEP_LAST depth reached)",
                    self.id,
                    self.topic
                );
                self.status_condition
                    .raise(StatusMask::DATA_AVAILABLE | StatusMask::SAMPLE_LOST);
            }
            Admission::Rejected => {
                {
                    let mut counters = self.counters.lock();
                    counters.rejected.add(1);
                    counters.last_rejected_reason = SampleRejectedReason::RejectedBySamplesLimit;
                    counters.last_rejected_instance = handle;
                }
                let overflow = Error::QueueOverflow {
                    topic: self.topic.clone(),
                    handle,
                    operation,
                };
                log::warn!("[READER] {} rejected entry: {}", self.id, overflow);
                self.status_condition.raise(StatusMask::SAMPLE_REJECTED);
            }
            Admission::Unchanged => {}
        }
        self.refresh_read_conditions(store);
    }

    fn after_select(&self, store: &InstanceStore<T>) {
        if !store.has_unread() {
            self.status_condition.lower(StatusMask::DATA_AVAILABLE);
        }
        self.refresh_read_conditions(store);
    }

    fn refresh_read_conditions(&self, store: &InstanceStore<T>) {
        let mut conditions = self.read_conditions.lock();
        conditions.retain(|weak| match weak.upgrade() {
            Some(condition) => {
                condition.set_trigger_value(store.any_matching(condition.states()));
                true
            }
            None => false,
        });
    }

    fn select(&self, filter: StateFilter, only: Option<InstanceHandle>, take: bool) -> Vec<Sample<T>> {
        let mut store = self.store.lock();
        let samples = store.select(filter, only, take);
        self.after_select(&store);
        log::debug!(
            "[READER] {} {} {} entries from '{}'",
            self.id,
            if take { "took" } else { "read" },
            samples.len(),
            self.topic
        );
        samples
    }
}

/// A typed DataReader that receives samples on a topic or content-filtered view.
///
/// Every reader owns its instance store; entries are copies of what the
/// matching writers published, in arrival order.
///
/// # Example
///
/// ```rust,ignore
/// let reader = subscriber.create_reader(&topic, QoS::reliable())?;
///
/// for sample in reader.take() {
///     match sample.data {
///         Some(temp) => println!("{} = {}", temp.sensor_id, temp.degrees),
///         None if sample.info.instance_state == InstanceState::NotAliveDisposed => {
///             println!("disposed {}", sample.info.instance_key);
///         }
///         None => {}
///     }
/// }
/// ```
///
/// # Thread Safety
///
/// `DataReader<T>` is `Send + Sync`; all operations lock the store once.
pub struct DataReader<T: DdsType> {
    core: Arc<ReaderCore<T>>,
    topic: Arc<TopicShared<T>>,
    description: String,
}

impl<T: DdsType> DataReader<T> {
    pub(crate) fn new(core: Arc<ReaderCore<T>>, topic: Arc<TopicShared<T>>, description: &str) -> Self {
        log::debug!(
            "[READER] created {} on '{}' (topic '{}')",
            core.id(),
            description,
            topic.name()
        );
        Self {
            core,
            topic,
            description: description.to_string(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    #[must_use]
    pub fn qos(&self) -> &QoS {
        &self.core.qos
    }

    /// Name of the topic the reader receives from.
    #[must_use]
    pub fn topic_name(&self) -> &str {
        self.topic.name()
    }

    /// Name of the description the reader was created on (topic or view).
    #[must_use]
    pub fn description_name(&self) -> &str {
        &self.description
    }

    /// Remove and return every pending entry, in arrival order.
    pub fn take(&self) -> Vec<Sample<T>> {
        self.core.select(StateFilter::ANY, None, true)
    }

    /// Return every pending entry without removing it; entries are marked READ.
    pub fn read(&self) -> Vec<Sample<T>> {
        self.core.select(StateFilter::ANY, None, false)
    }

    /// [`take`](Self::take) restricted to one instance.
    pub fn take_instance(&self, handle: InstanceHandle) -> Vec<Sample<T>> {
        self.core.select(StateFilter::ANY, Some(handle), true)
    }

    /// [`read`](Self::read) restricted to one instance.
    pub fn read_instance(&self, handle: InstanceHandle) -> Vec<Sample<T>> {
        self.core.select(StateFilter::ANY, Some(handle), false)
    }

    /// Take the entries matching the condition's state masks.
    pub fn take_w_condition(&self, condition: &ReadCondition) -> Result<Vec<Sample<T>>> {
        self.check_owner(condition)?;
        Ok(self.core.select(condition.states(), None, true))
    }

    /// Read the entries matching the condition's state masks.
    pub fn read_w_condition(&self, condition: &ReadCondition) -> Result<Vec<Sample<T>>> {
        self.check_owner(condition)?;
        Ok(self.core.select(condition.states(), None, false))
    }

    /// Take only valid samples, dropping lifecycle-only entries.
    pub fn take_data(&self) -> Vec<T> {
        self.take()
            .into_iter()
            .filter_map(|sample| sample.data)
            .collect()
    }

    /// Take every pending entry into a buffer lent to `f`.
    ///
    /// The buffer is dropped when `f` returns or unwinds.
    pub fn with_samples<R>(&self, f: impl FnOnce(&[Sample<T>]) -> R) -> R {
        let loan = self.take();
        f(&loan)
    }

    /// Key of a known instance (`None` if this reader never saw it).
    pub fn lookup_key(&self, handle: InstanceHandle) -> Option<InstanceKey> {
        self.core.store.lock().lookup_key(handle)
    }

    /// Current state of a known instance.
    pub fn instance_state(&self, handle: InstanceHandle) -> Option<InstanceState> {
        self.core.store.lock().instance_state(handle)
    }

    /// Number of entries waiting to be taken.
    pub fn pending(&self) -> usize {
        self.core.store.lock().len()
    }

    /// Status bits raised since the previous call; clears them.
    pub fn get_status_changes(&self) -> StatusMask {
        self.core.status_condition.take_active()
    }

    pub fn sample_lost_status(&self) -> SampleLostStatus {
        self.core.counters.lock().sample_lost()
    }

    pub fn sample_rejected_status(&self) -> SampleRejectedStatus {
        self.core.counters.lock().sample_rejected()
    }

    pub fn requested_incompatible_qos_status(&self) -> RequestedIncompatibleQosStatus {
        self.core.counters.lock().requested_incompatible_qos()
    }

    #[must_use]
    pub fn get_status_condition(&self) -> Arc<StatusCondition> {
        Arc::clone(&self.core.status_condition)
    }

    /// Create a ReadCondition triggered while an entry matches the masks.
    pub fn create_readcondition(
        &self,
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
    ) -> Arc<ReadCondition> {
        let condition = Arc::new(ReadCondition::new(
            self.core.id,
            sample_states,
            view_states,
            instance_states,
        ));

        let store = self.core.store.lock();
        condition.set_trigger_value(store.any_matching(condition.states()));
        self.core
            .read_conditions
            .lock()
            .push(Arc::downgrade(&condition));
        drop(store);

        condition
    }

    /// Stop updating a ReadCondition created by this reader.
    pub fn delete_readcondition(&self, condition: &ReadCondition) -> Result<()> {
        self.check_owner(condition)?;
        let id = condition.condition_id();
        self.core
            .read_conditions
            .lock()
            .retain(|weak| weak.upgrade().is_some_and(|c| c.condition_id() != id));
        condition.set_trigger_value(false);
        Ok(())
    }

    /// Hold the store lock; deliveries to this reader block until the guard drops.
    #[cfg(test)]
    pub(crate) fn stall_delivery(&self) -> impl Sized + '_ {
        self.core.store.lock()
    }

    fn check_owner(&self, condition: &ReadCondition) -> Result<()> {
        if condition.reader() == self.core.id {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "ReadCondition belongs to reader {}, not {}",
                condition.reader(),
                self.core.id
            )))
        }
    }
}

impl<T: DdsType> Drop for DataReader<T> {
    fn drop(&mut self) {
        self.topic.endpoints().remove_reader(self.core.id);
        log::debug!("[READER] dropped {} on '{}'", self.core.id, self.description);
    }
}

impl<T: DdsType> std::fmt::Debug for DataReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataReader")
            .field("id", &self.core.id)
            .field("topic", &self.topic.name())
            .field("description", &self.description)
            .field("qos", &self.core.qos)
            .finish()
    }
}
