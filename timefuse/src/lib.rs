// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! # Timefuse
//!
//! Temporal synchronization of timestamped message streams.
//!
//! ## Overview
//!
//! Multiple independent streams deliver timestamped messages at unrelated
//! rates; timefuse consumes them and emits tuples (one message per stream)
//! whose timestamps are identical ([`ExactTime`]) or collectively close in
//! time ([`ApproximateTime`]), under bounded memory and bounded latency.
//!
//! A [`Synchronizer`] wraps a policy and hands out one cloneable
//! [`StreamHandle`] per stream, so each producer thread pushes into its own
//! handle while tuples leave through a registered output sink.
//!
//! ## Quick start
//!
//! ```
//! use timefuse::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! enum Sensor {
//!     Scan(u32),
//!     Image(u32),
//! }
//!
//! let policy = ApproximateTime::new(2, 10).expect("valid configuration");
//! let sync = Synchronizer::new(policy);
//! sync.connect_output(Box::new(|tuple| {
//!     println!("synchronized at {}", tuple[0].stamp());
//! }));
//!
//! let scans = sync.handle(0);
//! let images = sync.handle(1);
//! scans.push(Event::new(Sensor::Scan(1), Stamp::from_millis(100)));
//! images.push(Event::new(Sensor::Image(1), Stamp::from_millis(100)));
//! ```
//!
//! ## Locking discipline
//!
//! A policy is one shared object behind one exclusive lock; `push`/`add` do
//! all their work on the calling thread, and sinks run with the lock held.
//! Sinks must therefore never block or feed events back into the same
//! synchronizer; hand off through a channel when a consumer needs to react.

mod synchronizer;

// Re-export the policies and the core vocabulary.
pub use timefuse_approx::ApproximateTime;
pub use timefuse_core::{ConfigError, DropSink, Event, OutputSink, Result, Span, Stamp, SyncPolicy};
pub use timefuse_exact::ExactTime;

pub use synchronizer::{StreamHandle, Synchronizer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ApproximateTime, Event, ExactTime, Span, Stamp, StreamHandle, SyncPolicy, Synchronizer,
    };
}
