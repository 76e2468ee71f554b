// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sample message payloads, one variant per sensor stream.

use timefuse_core::{Event, Stamp};

/// A message as it would arrive from one of several robot sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFrame {
    Scan { seq: u32 },
    Image { seq: u32 },
    Imu { seq: u32 },
}

pub fn scan(seq: u32) -> SensorFrame {
    SensorFrame::Scan { seq }
}

pub fn image(seq: u32) -> SensorFrame {
    SensorFrame::Image { seq }
}

pub fn imu(seq: u32) -> SensorFrame {
    SensorFrame::Imu { seq }
}

/// A scan event stamped `nanos` after the epoch.
pub fn scan_at(seq: u32, nanos: i64) -> Event<SensorFrame> {
    Event::new(scan(seq), Stamp::from_nanos(nanos))
}

/// An image event stamped `nanos` after the epoch.
pub fn image_at(seq: u32, nanos: i64) -> Event<SensorFrame> {
    Event::new(image(seq), Stamp::from_nanos(nanos))
}

/// An imu event stamped `nanos` after the epoch.
pub fn imu_at(seq: u32, nanos: i64) -> Event<SensorFrame> {
    Event::new(imu(seq), Stamp::from_nanos(nanos))
}
