// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::dds::read_condition::{InstanceStateMask, SampleStateMask, ViewStateMask};
use crate::dds::status::SampleRejectedReason;
use crate::dds::test_types::{
    lot_state_support, temperature_support, ChocolateLotState, Station, Temperature,
};
use crate::dds::{Condition, DataWriter, Error, Participant, QoS, StatusMask, Topic};
use std::sync::Arc;

fn temperature_topic() -> (Arc<Participant>, Topic<Temperature>) {
    let participant = Participant::new("reader-tests").expect("participant build should succeed");
    participant
        .register_type(temperature_support())
        .expect("type registration should succeed");
    let topic = participant
        .create_topic::<Temperature>("ChocolateTemperature", "Temperature")
        .expect("topic creation should succeed");
    (participant, topic)
}

fn writer_and_reader(qos: QoS) -> (DataWriter<Temperature>, DataReader<Temperature>) {
    let (participant, topic) = temperature_topic();
    let writer = participant
        .create_writer(&topic, QoS::reliable())
        .expect("writer creation should succeed");
    let reader = participant
        .create_reader(&topic, qos)
        .expect("reader creation should succeed");
    (writer, reader)
}

#[test]
fn test_take_preserves_per_key_order() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    for degrees in [30, 31, 32] {
        writer
            .write(&Temperature::new("A", degrees))
            .expect("write should succeed");
        writer
            .write(&Temperature::new("B", degrees + 10))
            .expect("write should succeed");
    }

    let samples = reader.take();
    let a: Vec<i32> = samples
        .iter()
        .filter_map(|s| s.data.as_ref())
        .filter(|t| t.sensor_id == "A")
        .map(|t| t.degrees)
        .collect();
    assert_eq!(a, vec![30, 31, 32]);
    assert_eq!(samples.len(), 6);
    assert!(reader.take().is_empty());
}

#[test]
fn test_read_marks_entries_read() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");

    let first = reader.read();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].info.sample_state, SampleState::NotRead);
    assert_eq!(first[0].info.view_state, ViewState::New);

    let second = reader.read();
    assert_eq!(second[0].info.sample_state, SampleState::Read);
    assert_eq!(second[0].info.view_state, ViewState::NotNew);

    assert_eq!(reader.take().len(), 1);
    assert_eq!(reader.pending(), 0);
}

#[test]
fn test_dispose_after_write_yields_lifecycle_entry_once() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    let sample = Temperature::new("A", 31);
    writer.write(&sample).expect("write should succeed");
    let handle = writer.lookup_instance(&sample).expect("lookup should succeed");
    writer.dispose(handle).expect("dispose should succeed");
    writer.dispose(handle).expect("repeated dispose should succeed");

    let samples = reader.take();
    assert_eq!(samples.len(), 2);
    assert!(samples[0].is_valid());
    assert!(!samples[1].is_valid());
    assert!(samples[1].data.is_none());
    assert_eq!(samples[1].info.instance_handle, handle);
    assert_eq!(
        samples[1].info.instance_state,
        InstanceState::NotAliveDisposed
    );

    let key = reader.lookup_key(handle).expect("key should be known");
    assert_eq!(key, samples[1].info.instance_key);
}

#[test]
fn test_take_instance_and_take_data() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    let a = Temperature::new("A", 31);
    writer.write(&a).expect("write should succeed");
    writer
        .write(&Temperature::new("B", 28))
        .expect("write should succeed");
    let handle = writer.lookup_instance(&a).expect("lookup should succeed");

    let only_a = reader.take_instance(handle);
    assert_eq!(only_a.len(), 1);
    assert_eq!(only_a[0].data.as_ref(), Some(&a));
    assert!(reader
        .take_instance(crate::dds::InstanceHandle::new([7; 16]))
        .is_empty());

    writer.dispose(handle).expect("dispose should succeed");
    let data = reader.take_data();
    assert_eq!(data, vec![Temperature::new("B", 28)]);
}

#[test]
fn test_with_samples_drains_store() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    for degrees in 0..3 {
        writer
            .write(&Temperature::new("A", degrees))
            .expect("write should succeed");
    }

    let seen = reader.with_samples(|samples| samples.len());
    assert_eq!(seen, 3);
    assert_eq!(reader.pending(), 0);
}

#[test]
fn test_data_available_lowered_after_take() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    let condition = reader.get_status_condition();
    condition.set_enabled_statuses(StatusMask::DATA_AVAILABLE);
    assert!(!condition.get_trigger_value());

    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");
    assert!(condition.get_trigger_value());

    reader.take();
    assert!(!condition.get_trigger_value());
}

#[test]
fn test_status_changes_cleared_on_query() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");

    assert!(reader
        .get_status_changes()
        .contains(StatusMask::DATA_AVAILABLE));
    assert!(reader.get_status_changes().is_empty());
}

#[test]
fn test_keep_last_drops_oldest() {
    let (writer, reader) = writer_and_reader(QoS::reliable().keep_last(2));
    for degrees in [1, 2, 3] {
        writer
            .write(&Temperature::new("A", degrees))
            .expect("write should succeed");
    }

    let degrees: Vec<i32> = reader.take_data().iter().map(|t| t.degrees).collect();
    assert_eq!(degrees, vec![2, 3]);
    let lost = reader.sample_lost_status();
    assert_eq!(lost.total_count, 1);
    assert_eq!(lost.total_count_change, 1);
    assert_eq!(reader.sample_lost_status().total_count_change, 0);
}

#[test]
fn test_keep_all_rejects_when_full() {
    let (writer, reader) = writer_and_reader(QoS::reliable().keep_all().max_samples(2));
    for degrees in [1, 2, 3] {
        // Delivery failures never fail the write
        writer
            .write(&Temperature::new("A", degrees))
            .expect("write should succeed");
    }

    assert!(reader
        .get_status_changes()
        .contains(StatusMask::SAMPLE_REJECTED));
    let rejected = reader.sample_rejected_status();
    assert_eq!(rejected.total_count, 1);
    assert_eq!(
        rejected.last_reason,
        SampleRejectedReason::RejectedBySamplesLimit
    );

    let degrees: Vec<i32> = reader.take_data().iter().map(|t| t.degrees).collect();
    assert_eq!(degrees, vec![1, 2]);
}

#[test]
fn test_read_condition_tracks_matching_entries() {
    let (writer, reader) = writer_and_reader(QoS::reliable());
    let unread = reader.create_readcondition(
        SampleStateMask::NOT_READ,
        ViewStateMask::ANY,
        InstanceStateMask::ANY,
    );
    let disposed = reader.create_readcondition(
        SampleStateMask::ANY,
        ViewStateMask::ANY,
        InstanceStateMask::NOT_ALIVE_DISPOSED,
    );
    assert!(!unread.get_trigger_value());

    let sample = Temperature::new("A", 31);
    writer.write(&sample).expect("write should succeed");
    assert!(unread.get_trigger_value());
    assert!(!disposed.get_trigger_value());

    reader.read();
    assert!(!unread.get_trigger_value());

    let handle = writer.lookup_instance(&sample).expect("lookup should succeed");
    writer.dispose(handle).expect("dispose should succeed");
    assert!(disposed.get_trigger_value());

    let taken = reader
        .take_w_condition(&disposed)
        .expect("take with condition should succeed");
    assert_eq!(taken.len(), 2);
    assert!(!disposed.get_trigger_value());

    reader
        .delete_readcondition(&unread)
        .expect("delete should succeed");
}

#[test]
fn test_read_condition_of_other_reader_rejected() {
    let (participant, topic) = temperature_topic();
    let a = participant
        .create_reader(&topic, QoS::reliable())
        .expect("reader creation should succeed");
    let b = participant
        .create_reader(&topic, QoS::reliable())
        .expect("reader creation should succeed");
    let condition =
        a.create_readcondition(SampleStateMask::ANY, ViewStateMask::ANY, InstanceStateMask::ANY);

    assert!(matches!(
        b.read_w_condition(&condition),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        b.delete_readcondition(&condition),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn test_view_reader_only_sees_matching_station() {
    let participant = Participant::new("lots").expect("participant build should succeed");
    participant
        .register_type(lot_state_support())
        .expect("type registration should succeed");
    let topic = participant
        .create_topic::<ChocolateLotState>("ChocolateLotState", "ChocolateLotState")
        .expect("topic creation should succeed");
    let view = participant
        .create_content_filtered_topic(
            "LotsForButter",
            &topic,
            "next_station = %0",
            vec!["'COCOA_BUTTER_CONTROLLER'".into()],
        )
        .expect("view creation should succeed");

    let writer = participant
        .create_writer(&topic, QoS::reliable())
        .expect("writer creation should succeed");
    let filtered = participant
        .create_reader(&view, QoS::reliable())
        .expect("reader creation should succeed");
    let all = participant
        .create_reader(&topic, QoS::reliable())
        .expect("reader creation should succeed");
    assert_eq!(filtered.description_name(), "LotsForButter");
    assert_eq!(filtered.topic_name(), "ChocolateLotState");

    let butter = ChocolateLotState::waiting_for(1, Station::CocoaButterController);
    let tempering = ChocolateLotState::waiting_for(2, Station::TemperingController);
    writer.write(&butter).expect("write should succeed");
    writer.write(&tempering).expect("write should succeed");

    // Dispose follows the writer's last sample through the filter
    writer
        .dispose_sample(&tempering)
        .expect("dispose should succeed");
    writer.dispose_sample(&butter).expect("dispose should succeed");

    let seen = filtered.take();
    assert_eq!(seen.len(), 2);
    assert!(seen
        .iter()
        .filter_map(|s| s.data.as_ref())
        .all(|lot| lot.next_station == Station::CocoaButterController));
    assert!(!seen[1].info.valid_data);
    assert_eq!(all.take().len(), 4);
}

#[test]
fn test_rebinding_affects_only_future_writes() {
    let (participant, topic) = temperature_topic();
    let view = participant
        .create_content_filtered_topic(
            "ChocolateTemperatureOutOfRange",
            &topic,
            "degrees > %0 or degrees < %1",
            vec!["32".into(), "30".into()],
        )
        .expect("view creation should succeed");
    let writer = participant
        .create_writer(&topic, QoS::reliable())
        .expect("writer creation should succeed");
    let reader = participant
        .create_reader(&view, QoS::reliable())
        .expect("reader creation should succeed");

    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");
    writer
        .write(&Temperature::new("A", 33))
        .expect("write should succeed");
    view.set_expression_parameters(vec!["30".into(), "28".into()])
        .expect("rebinding should succeed");
    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");

    let degrees: Vec<i32> = reader.take_data().iter().map(|t| t.degrees).collect();
    assert_eq!(degrees, vec![33, 31]);
}

#[test]
fn test_late_reader_sees_only_subsequent_writes() {
    let (participant, topic) = temperature_topic();
    let writer = participant
        .create_writer(&topic, QoS::reliable())
        .expect("writer creation should succeed");
    writer
        .write(&Temperature::new("A", 30))
        .expect("write should succeed");

    let reader = participant
        .create_reader(&topic, QoS::reliable())
        .expect("reader creation should succeed");
    assert_eq!(reader.pending(), 0);

    writer
        .write(&Temperature::new("A", 31))
        .expect("write should succeed");
    assert_eq!(reader.take().len(), 1);
}

#[test]
fn test_dropped_reader_detaches() {
    let (participant, topic) = temperature_topic();
    let reader = participant
        .create_reader(&topic, QoS::reliable())
        .expect("reader creation should succeed");
    assert_eq!(topic.reader_count(), 1);
    drop(reader);
    assert_eq!(topic.reader_count(), 0);
}
