// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Randomized ordering and filtering properties.
//!
//! Each test replays several seeded interleavings so failures reproduce.

mod common;

use common::{factory, ChocolateLotState, LotStatus, Station, Temperature};
use dcps_core::{InstanceHandle, QoS};
use std::collections::HashMap;

const SEEDS: [u64; 4] = [1, 7, 42, 0xC0C0A];

fn sensor(index: usize) -> String {
    format!("sensor-{index}")
}

#[test]
fn test_per_key_order_under_random_interleaving() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let participant = factory("ordering");
        let topic = participant
            .create_topic::<Temperature>("ChocolateTemperature", "Temperature")
            .expect("Failed to create topic");
        let reader = participant
            .create_reader(&topic, QoS::reliable().keep_all())
            .expect("Failed to create reader");
        let writers: Vec<_> = (0..3)
            .map(|_| {
                participant
                    .create_writer(&topic, QoS::reliable())
                    .expect("Failed to create writer")
            })
            .collect();

        // Each key is owned by one writer and carries an increasing counter
        let keys = 5;
        let mut next = vec![0i32; keys];
        for _ in 0..200 {
            let key = rng.usize(..keys);
            let writer = &writers[key % writers.len()];
            writer
                .write(&Temperature {
                    sensor_id: sensor(key),
                    degrees: next[key],
                })
                .expect("Failed to write temperature");
            next[key] += 1;
        }

        let mut seen: HashMap<String, Vec<i32>> = HashMap::new();
        for sample in reader.take_data() {
            seen.entry(sample.sensor_id).or_default().push(sample.degrees);
        }
        for (key, count) in next.iter().enumerate() {
            let expected: Vec<i32> = (0..*count).collect();
            assert_eq!(
                seen.remove(&sensor(key)).unwrap_or_default(),
                expected,
                "seed {seed} key {key}"
            );
        }
    }
}

#[test]
fn test_distinct_keys_take_then_empty() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let participant = factory("distinct_keys");
        let topic = participant
            .create_topic::<Temperature>("ChocolateTemperature", "Temperature")
            .expect("Failed to create topic");
        let reader = participant
            .create_reader(&topic, QoS::reliable().keep_all())
            .expect("Failed to create reader");
        let writer = participant
            .create_writer(&topic, QoS::reliable())
            .expect("Failed to create writer");

        let count = rng.usize(1..64);
        let mut ids: Vec<usize> = (0..count).collect();
        rng.shuffle(&mut ids);
        for id in &ids {
            writer
                .write(&Temperature::new(&sensor(*id), rng.i32(20..40)))
                .expect("Failed to write temperature");
        }

        let samples = reader.take();
        assert_eq!(samples.len(), count, "seed {seed}");
        let handles: std::collections::HashSet<InstanceHandle> = samples
            .iter()
            .map(|sample| sample.info.instance_handle)
            .collect();
        assert_eq!(handles.len(), count, "seed {seed}");
        assert!(reader.take().is_empty(), "seed {seed}");
    }
}

#[test]
fn test_station_view_never_sees_other_stations() {
    let stations = [
        Station::CocoaBeanProcessor,
        Station::CocoaButterController,
        Station::TemperingController,
    ];

    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let participant = factory("station_view");
        let lots = participant
            .create_topic::<ChocolateLotState>("ChocolateLotState", "ChocolateLotState")
            .expect("Failed to create topic");
        let view = participant
            .create_content_filtered_topic(
                "TemperingLots",
                &lots,
                "station = 'TEMPERING_CONTROLLER'",
                Vec::new(),
            )
            .expect("Failed to create view");
        let filtered = participant
            .create_reader(&view, QoS::reliable().keep_all())
            .expect("Failed to create reader");
        let writer = participant
            .create_writer(&lots, QoS::reliable())
            .expect("Failed to create writer");

        let mut expected = 0;
        for lot_id in 0..100 {
            let station = stations[rng.usize(..stations.len())];
            if station == Station::TemperingController {
                expected += 1;
            }
            writer
                .write(&ChocolateLotState {
                    lot_id,
                    station,
                    next_station: Station::Invalid,
                    lot_status: LotStatus::Processing,
                })
                .expect("Failed to write lot");
        }

        let received = filtered.take_data();
        assert_eq!(received.len(), expected, "seed {seed}");
        assert!(received
            .iter()
            .all(|lot| lot.station == Station::TemperingController));
    }
}

#[test]
fn test_keep_last_depth_bounds_pending() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let participant = factory("keep_last");
        let topic = participant
            .create_topic::<Temperature>("ChocolateTemperature", "Temperature")
            .expect("Failed to create topic");
        let depth = rng.u32(1..8);
        let reader = participant
            .create_reader(&topic, QoS::reliable().keep_last(depth))
            .expect("Failed to create reader");
        let writer = participant
            .create_writer(&topic, QoS::reliable())
            .expect("Failed to create writer");

        let writes = rng.u32(1..32);
        for degrees in 0..writes {
            writer
                .write(&Temperature::new("A", degrees as i32))
                .expect("Failed to write temperature");
            assert!(reader.pending() <= depth as usize, "seed {seed}");
        }

        let kept: Vec<i32> = reader
            .take_data()
            .into_iter()
            .map(|sample| sample.degrees)
            .collect();
        let first = writes.saturating_sub(depth) as i32;
        assert_eq!(kept, (first..writes as i32).collect::<Vec<_>>(), "seed {seed}");
        assert_eq!(
            reader.sample_lost_status().total_count,
            writes.saturating_sub(depth),
            "seed {seed}"
        );
    }
}
