// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Shared helpers for exercising synchronization policies in tests: sample
//! sensor payloads and sinks that record what a policy emitted or discarded.

mod collector;
pub mod sensor;

pub use collector::{Collector, DropLog};
