// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer fan-out: synchronous delivery and the asynchronous delivery thread.
//!
//! ```text
//! write() --> route() --> Outgoing --+--> deliver() on the caller thread   (Synchronous)
//!                                    |
//!                                    +--> bounded channel --> dcps-delivery-N thread
//!                                                              --> deliver()  (Asynchronous)
//! ```
//!
//! Recipients are fixed by [`route`] while the writer still holds its
//! history lock: a reader created, or a filter rebound, after `write()`
//! returned does not change where a queued event goes. Events of one writer
//! reach each reader in the order they were produced.

use crate::config::DELIVERY_THREAD_PREFIX;
use crate::dds::participant::EntityId;
use crate::dds::qos::Reliability;
use crate::dds::reader::{Origin, ReaderCore};
use crate::dds::topic::TopicShared;
use crate::dds::type_support::{InstanceHandle, InstanceKey};
use crate::dds::{DdsType, Error, Result};
use crossbeam::channel::{self, SendTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// One event produced by a DataWriter.
pub(crate) enum WriterEvent<T> {
    Data {
        handle: InstanceHandle,
        key: InstanceKey,
        sample: T,
        origin: Origin,
    },
    Dispose {
        handle: InstanceHandle,
        key: InstanceKey,
        /// Last sample written for the instance; filters are evaluated on it.
        last: Option<T>,
        origin: Origin,
    },
    Unregister {
        handle: InstanceHandle,
        origin: Origin,
    },
}

impl<T> WriterEvent<T> {
    pub(crate) fn handle(&self) -> InstanceHandle {
        match self {
            WriterEvent::Data { handle, .. }
            | WriterEvent::Dispose { handle, .. }
            | WriterEvent::Unregister { handle, .. } => *handle,
        }
    }

    pub(crate) fn operation(&self) -> &'static str {
        match self {
            WriterEvent::Data { .. } => "write",
            WriterEvent::Dispose { .. } => "dispose",
            WriterEvent::Unregister { .. } => "unregister",
        }
    }
}

/// An event bound to the readers it was routed to.
pub(crate) struct Outgoing<T: DdsType> {
    pub(crate) event: WriterEvent<T>,
    pub(crate) recipients: Vec<Arc<ReaderCore<T>>>,
}

/// Select the readers that receive `event`: matched on `topic` right now and,
/// for data and dispose, admitted by their filter.
pub(crate) fn route<T: DdsType>(
    topic: &TopicShared<T>,
    offered: Reliability,
    event: WriterEvent<T>,
) -> Outgoing<T> {
    let probe = match &event {
        WriterEvent::Data { sample, .. } => Some(sample),
        WriterEvent::Dispose { last, .. } => last.as_ref(),
        WriterEvent::Unregister { .. } => None,
    };
    let mut recipients = topic.endpoints().matched_readers(offered);
    if let Some(sample) = probe {
        recipients.retain(|reader| {
            let accepted = reader.accepts(sample);
            if !accepted {
                log::debug!(
                    "[WRITER] {} instance {} filtered out for reader {}",
                    event.operation(),
                    event.handle(),
                    reader.id()
                );
            }
            accepted
        });
    }
    Outgoing { event, recipients }
}

/// Hand a routed event to its recipients; returns how many there were.
pub(crate) fn deliver<T: DdsType>(outgoing: &Outgoing<T>) -> usize {
    for reader in &outgoing.recipients {
        match &outgoing.event {
            WriterEvent::Data {
                handle,
                key,
                sample,
                origin,
            } => reader.deliver_data(*handle, key, sample, *origin),
            WriterEvent::Dispose {
                handle, key, origin, ..
            } => reader.deliver_dispose(*handle, key, *origin),
            WriterEvent::Unregister { handle, origin } => {
                reader.deliver_unregister(*handle, *origin)
            }
        }
    }
    outgoing.recipients.len()
}

/// Why an event could not be queued.
pub(crate) enum SubmitError<T: DdsType> {
    /// Queue stayed full for the whole timeout.
    Full(Outgoing<T>),
    /// Delivery thread is gone.
    Closed(Outgoing<T>),
}

impl<T: DdsType> SubmitError<T> {
    pub(crate) fn into_error(self, topic: &str) -> Error {
        match self {
            SubmitError::Full(outgoing) => Error::QueueOverflow {
                topic: topic.to_string(),
                handle: outgoing.event.handle(),
                operation: outgoing.event.operation(),
            },
            SubmitError::Closed(outgoing) => Error::InvalidState(format!(
                "delivery thread of '{}' stopped, {} on instance {} not sent",
                topic,
                outgoing.event.operation(),
                outgoing.event.handle()
            )),
        }
    }
}

/// Background delivery thread of an asynchronous DataWriter.
///
/// Dropping the worker closes the channel; the thread drains what is
/// already queued, then exits and is joined.
pub(crate) struct DeliveryWorker<T: DdsType> {
    sender: Option<Sender<Outgoing<T>>>,
    thread: Option<JoinHandle<()>>,
}

impl<T: DdsType> DeliveryWorker<T> {
    pub(crate) fn spawn(
        writer: EntityId,
        topic: &str,
        queue_depth: usize,
    ) -> Result<Self> {
        let (sender, receiver) = channel::bounded::<Outgoing<T>>(queue_depth);
        let topic = topic.to_string();

        let thread = std::thread::Builder::new()
            .name(format!("{}-{}", DELIVERY_THREAD_PREFIX, writer.value()))
            .spawn(move || {
                log::debug!(
                    "[WRITER] delivery thread for {} on '{}' started",
                    writer,
                    topic
                );
                for outgoing in receiver.iter() {
                    deliver(&outgoing);
                }
                log::debug!("[WRITER] delivery thread for {} stopped", writer);
            })?;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Queue an event, waiting up to `timeout` for room.
    ///
    /// Gives the event back when it could not be queued.
    pub(crate) fn submit(
        &self,
        outgoing: Outgoing<T>,
        timeout: Duration,
    ) -> std::result::Result<(), SubmitError<T>> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(SubmitError::Closed(outgoing));
        };
        sender
            .send_timeout(outgoing, timeout)
            .map_err(|err| match err {
                SendTimeoutError::Timeout(outgoing) => SubmitError::Full(outgoing),
                SendTimeoutError::Disconnected(outgoing) => SubmitError::Closed(outgoing),
            })
    }

    /// Queue an event, waiting for room as long as needed.
    pub(crate) fn submit_blocking(&self, outgoing: Outgoing<T>) {
        if let Some(sender) = self.sender.as_ref() {
            if sender.send(outgoing).is_err() {
                log::warn!("[WRITER] delivery thread gone, lifecycle event dropped");
            }
        }
    }
}

impl<T: DdsType> Drop for DeliveryWorker<T> {
    fn drop(&mut self) {
        // Closing the channel ends the thread's receive loop
        self.sender.take();
        if let Some(handle) = self.thread.take() {
            if let Err(panic) = handle.join() {
                log::error!("[WRITER] delivery thread panicked: {:?}", panic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::test_types::{lot_state_support, ChocolateLotState, Station};

    #[test]
    fn test_submit_after_thread_stop_is_invalid_state() {
        let mut worker = DeliveryWorker::<ChocolateLotState>::spawn(EntityId::next(), "ChocolateLotState", 1)
            .expect("worker spawn should succeed");
        worker.sender.take();

        let handle = lot_state_support()
            .key_of(&ChocolateLotState::waiting_for(1, Station::TemperingController))
            .expect("key extraction should succeed")
            .handle();
        let outgoing = Outgoing {
            event: WriterEvent::Unregister {
                handle,
                origin: Origin {
                    writer: EntityId::next(),
                    sequence_number: 1,
                    timestamp_ns: 0,
                },
            },
            recipients: Vec::new(),
        };

        let err = match worker.submit(outgoing, Duration::from_millis(10)) {
            Err(failed) => failed.into_error("ChocolateLotState"),
            Ok(()) => panic!("submit on a closed queue should fail"),
        };
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
