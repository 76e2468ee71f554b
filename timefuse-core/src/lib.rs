// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Core vocabulary for timestamped multi-stream synchronization.
//!
//! This crate defines the types shared by every synchronization policy:
//! nanosecond timestamps and durations ([`Stamp`], [`Span`]), the owned
//! timestamped [`Event`], the [`SyncPolicy`] seam consumed by the
//! synchronizer frame, the sink aliases through which tuples leave a policy,
//! and the configuration error type.

mod error;
mod event;
mod policy;
mod stamp;

pub use error::{ConfigError, Result};
pub use event::Event;
pub use policy::{DropSink, OutputSink, SyncPolicy};
pub use stamp::{Span, Stamp};
