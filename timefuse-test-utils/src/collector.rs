// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use parking_lot::Mutex;
use timefuse_core::{DropSink, Event, OutputSink, Stamp};

/// Records every synchronized tuple a policy emits, for later assertion.
///
/// The collector and the sink it hands out share the same storage, so a test
/// can keep the collector, register the sink, and inspect what arrived.
pub struct Collector<M> {
    tuples: Arc<Mutex<Vec<Vec<Event<M>>>>>,
}

impl<M> Collector<M> {
    pub fn new() -> Self {
        Self {
            tuples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of tuples recorded so far.
    pub fn len(&self) -> usize {
        self.tuples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.lock().is_empty()
    }

    /// Removes and returns every recorded tuple, in emission order.
    pub fn take(&self) -> Vec<Vec<Event<M>>> {
        std::mem::take(&mut *self.tuples.lock())
    }

    /// Timestamps of every recorded tuple, in emission order.
    pub fn stamps(&self) -> Vec<Vec<Stamp>> {
        self.tuples
            .lock()
            .iter()
            .map(|tuple| tuple.iter().map(Event::stamp).collect())
            .collect()
    }
}

impl<M: Send + 'static> Collector<M> {
    /// Sink to register through a policy's `connect_output`.
    pub fn sink(&self) -> OutputSink<M> {
        let tuples = Arc::clone(&self.tuples);
        Box::new(move |tuple| tuples.lock().push(tuple))
    }
}

impl<M> Default for Collector<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for Collector<M> {
    fn clone(&self) -> Self {
        Self {
            tuples: Arc::clone(&self.tuples),
        }
    }
}

/// Records the partial tuples a policy discarded without emission.
pub struct DropLog<M> {
    tuples: Arc<Mutex<Vec<Vec<Option<Event<M>>>>>>,
}

impl<M> DropLog<M> {
    pub fn new() -> Self {
        Self {
            tuples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.lock().is_empty()
    }

    /// Removes and returns every recorded drop, in drop order.
    pub fn take(&self) -> Vec<Vec<Option<Event<M>>>> {
        std::mem::take(&mut *self.tuples.lock())
    }

    /// Per-slot timestamps of every recorded drop; `None` marks a slot that
    /// never received an event.
    pub fn stamps(&self) -> Vec<Vec<Option<Stamp>>> {
        self.tuples
            .lock()
            .iter()
            .map(|tuple| {
                tuple
                    .iter()
                    .map(|slot| slot.as_ref().map(Event::stamp))
                    .collect()
            })
            .collect()
    }
}

impl<M: Send + 'static> DropLog<M> {
    /// Sink to register through a policy's drop connection.
    pub fn sink(&self) -> DropSink<M> {
        let tuples = Arc::clone(&self.tuples);
        Box::new(move |tuple| tuples.lock().push(tuple))
    }
}

impl<M> Default for DropLog<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for DropLog<M> {
    fn clone(&self) -> Self {
        Self {
            tuples: Arc::clone(&self.tuples),
        }
    }
}
