// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types shared by the integration tests.

#![allow(dead_code)]

use dcps_core::{DdsType, FieldKind, FieldValue, Participant, TypeShape, TypeSupport};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Temperature {
    pub sensor_id: String,
    pub degrees: i32,
}

impl Temperature {
    pub fn new(sensor_id: &str, degrees: i32) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            degrees,
        }
    }
}

impl DdsType for Temperature {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "sensor_id" => Some(self.sensor_id.as_str().into()),
            "degrees" => Some(self.degrees.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Station {
    Invalid,
    CocoaBeanProcessor,
    CocoaButterController,
    TemperingController,
}

impl Station {
    pub fn name(self) -> &'static str {
        match self {
            Station::Invalid => "INVALID_CONTROLLER",
            Station::CocoaBeanProcessor => "COCOA_BEAN_PROCESSOR",
            Station::CocoaButterController => "COCOA_BUTTER_CONTROLLER",
            Station::TemperingController => "TEMPERING_CONTROLLER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotStatus {
    Waiting,
    Processing,
    Completed,
}

impl LotStatus {
    pub fn name(self) -> &'static str {
        match self {
            LotStatus::Waiting => "WAITING",
            LotStatus::Processing => "PROCESSING",
            LotStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChocolateLotState {
    pub lot_id: u32,
    pub station: Station,
    pub next_station: Station,
    pub lot_status: LotStatus,
}

impl DdsType for ChocolateLotState {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "lot_id" => Some(self.lot_id.into()),
            "station" => Some(self.station.name().into()),
            "next_station" => Some(self.next_station.name().into()),
            "lot_status" => Some(self.lot_status.name().into()),
            _ => None,
        }
    }
}

/// Participant with `Temperature` and `ChocolateLotState` registered.
pub fn factory(name: &str) -> Arc<Participant> {
    let participant = Participant::new(name).expect("participant build should succeed");
    participant
        .register_type(TypeSupport::<Temperature>::new(
            "Temperature",
            TypeShape::new()
                .field("sensor_id", FieldKind::String)
                .field("degrees", FieldKind::Int32)
                .key("sensor_id"),
        ))
        .expect("type registration should succeed");
    participant
        .register_type(TypeSupport::<ChocolateLotState>::new(
            "ChocolateLotState",
            TypeShape::new()
                .field("lot_id", FieldKind::UInt32)
                .field("station", FieldKind::Enum)
                .field("next_station", FieldKind::Enum)
                .field("lot_status", FieldKind::Enum)
                .key("lot_id"),
        ))
        .expect("type registration should succeed");
    participant
}
