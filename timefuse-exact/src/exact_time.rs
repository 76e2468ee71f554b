// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::BTreeMap;

use parking_lot::Mutex;
use timefuse_core::{ConfigError, DropSink, Event, OutputSink, Result, Stamp, SyncPolicy};

/// Exact-time synchronization: joins one message from every stream on an
/// identical timestamp.
///
/// Partial tuples accumulate in a map keyed by timestamp. The moment some
/// timestamp holds one event from every stream, that tuple is emitted and
/// every remaining entry at or before it is forwarded to the drop sink, so
/// emitted timestamps are strictly increasing. A non-zero `queue_size`
/// additionally bounds the map by evicting the oldest partial tuples into the
/// drop sink.
///
/// All work happens on the caller's thread under a single exclusive lock;
/// sinks run with that lock held and must not block or re-enter the policy.
pub struct ExactTime<M> {
    inner: Mutex<Inner<M>>,
}

struct Inner<M> {
    streams: usize,
    queue_size: usize,
    tuples: BTreeMap<Stamp, Vec<Option<Event<M>>>>,
    last_signal_time: Option<Stamp>,
    output: Option<OutputSink<M>>,
    dropped: Option<DropSink<M>>,
}

impl<M: Send> ExactTime<M> {
    /// Creates a policy joining `streams` inputs.
    ///
    /// `queue_size` bounds the number of pending partial tuples; zero leaves
    /// the map unbounded.
    pub fn new(streams: usize, queue_size: usize) -> Result<Self> {
        if streams < 2 {
            return Err(ConfigError::TooFewStreams { streams });
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                streams,
                queue_size,
                tuples: BTreeMap::new(),
                last_signal_time: None,
                output: None,
                dropped: None,
            }),
        })
    }

    /// Registers the sink that receives discarded partial tuples, replacing
    /// any previously registered one.
    pub fn connect_drop(&self, sink: DropSink<M>) {
        self.inner.lock().dropped = Some(sink);
    }

    /// Timestamp of the most recently emitted tuple, if any.
    pub fn last_signal_time(&self) -> Option<Stamp> {
        self.inner.lock().last_signal_time
    }
}

impl<M: Send> SyncPolicy for ExactTime<M> {
    type Message = M;

    fn streams(&self) -> usize {
        self.inner.lock().streams
    }

    fn add(&self, stream: usize, event: Event<M>) {
        self.inner.lock().add(stream, event);
    }

    fn connect_output(&self, sink: OutputSink<M>) {
        self.inner.lock().output = Some(sink);
    }
}

impl<M> Inner<M> {
    fn add(&mut self, stream: usize, event: Event<M>) {
        assert!(
            stream < self.streams,
            "stream index {stream} out of range for {} streams",
            self.streams
        );

        let stamp = event.stamp();
        if self.last_signal_time.is_some_and(|last| stamp <= last) {
            // Arrived behind the last emitted tuple; it can never complete.
            let mut slots: Vec<Option<Event<M>>> = (0..self.streams).map(|_| None).collect();
            slots[stream] = Some(event);
            self.forward_drop(slots);
            return;
        }

        let streams = self.streams;
        let slots = self
            .tuples
            .entry(stamp)
            .or_insert_with(|| (0..streams).map(|_| None).collect());
        // Last writer wins at a given timestamp.
        slots[stream] = Some(event);

        if slots.iter().all(Option::is_some) {
            if let Some(slots) = self.tuples.remove(&stamp) {
                self.emit(stamp, slots);
            }
        }

        if self.queue_size > 0 {
            while self.tuples.len() > self.queue_size {
                if let Some((_, slots)) = self.tuples.pop_first() {
                    self.forward_drop(slots);
                }
            }
        }
    }

    fn emit(&mut self, stamp: Stamp, slots: Vec<Option<Event<M>>>) {
        let tuple: Vec<Event<M>> = slots.into_iter().flatten().collect();
        debug_assert_eq!(tuple.len(), self.streams);
        if let Some(output) = self.output.as_mut() {
            output(tuple);
        }
        self.last_signal_time = Some(stamp);

        // Entries at or before the emitted timestamp can no longer complete;
        // the map is sorted, so stop at the first key past it.
        while let Some(entry) = self.tuples.first_entry() {
            if *entry.key() > stamp {
                break;
            }
            let slots = entry.remove();
            self.forward_drop(slots);
        }
    }

    fn forward_drop(&mut self, slots: Vec<Option<Event<M>>>) {
        if let Some(dropped) = self.dropped.as_mut() {
            dropped(slots);
        }
    }
}
