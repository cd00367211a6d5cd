// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types shared by the unit tests.

use super::filter::FieldValue;
use super::type_support::{FieldKind, TypeShape, TypeSupport};
use super::DdsType;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Temperature {
    pub(crate) sensor_id: String,
    pub(crate) degrees: i32,
}

impl Temperature {
    pub(crate) fn new(sensor_id: &str, degrees: i32) -> Self {
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

pub(crate) fn temperature_support() -> TypeSupport<Temperature> {
    TypeSupport::new(
        "Temperature",
        TypeShape::new()
            .field("sensor_id", FieldKind::String)
            .field("degrees", FieldKind::Int32)
            .key("sensor_id"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Station {
    Invalid,
    CocoaBeanProcessor,
    CocoaButterController,
    TemperingController,
}

impl Station {
    fn name(self) -> &'static str {
        match self {
            Station::Invalid => "INVALID_CONTROLLER",
            Station::CocoaBeanProcessor => "COCOA_BEAN_PROCESSOR",
            Station::CocoaButterController => "COCOA_BUTTER_CONTROLLER",
            Station::TemperingController => "TEMPERING_CONTROLLER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LotStatus {
    Waiting,
    Processing,
    Completed,
}

impl LotStatus {
    fn name(self) -> &'static str {
        match self {
            LotStatus::Waiting => "WAITING",
            LotStatus::Processing => "PROCESSING",
            LotStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChocolateLotState {
    pub(crate) lot_id: u32,
    pub(crate) station: Station,
    pub(crate) next_station: Station,
    pub(crate) lot_status: LotStatus,
}

impl ChocolateLotState {
    pub(crate) fn waiting_for(lot_id: u32, next_station: Station) -> Self {
        Self {
            lot_id,
            station: Station::Invalid,
            next_station,
            lot_status: LotStatus::Waiting,
        }
    }
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

pub(crate) fn lot_state_support() -> TypeSupport<ChocolateLotState> {
    TypeSupport::new(
        "ChocolateLotState",
        TypeShape::new()
            .field("lot_id", FieldKind::UInt32)
            .field("station", FieldKind::Enum)
            .field("next_station", FieldKind::Enum)
            .field("lot_status", FieldKind::Enum)
            .key("lot_id"),
    )
}
