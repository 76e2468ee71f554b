// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Event;

/// Sink invoked with each synchronized tuple: one event per stream, in
/// stream-index order.
///
/// Sinks run with the policy's lock held. Implementations must not block and
/// must not call back into the same policy; callers that need to hand tuples
/// off to another thread should push into a channel here and consume it
/// elsewhere.
pub type OutputSink<M> = Box<dyn FnMut(Vec<Event<M>>) + Send>;

/// Sink invoked with tuples discarded before emission. Slots that never
/// received an event are `None`.
///
/// Runs with the policy's lock held, with the same restrictions as
/// [`OutputSink`].
pub type DropSink<M> = Box<dyn FnMut(Vec<Option<Event<M>>>) + Send>;

/// The seam between a synchronization policy and the frame that feeds it.
///
/// A policy is a shared mutable object: all methods take `&self` and
/// serialize internally behind a single exclusive lock, so an `Arc`'d policy
/// can be driven by one producer thread per stream. Between concurrent `add`
/// calls the total order is the lock-acquisition order.
pub trait SyncPolicy: Send + Sync {
    /// Message payload carried by this policy's streams.
    type Message;

    /// Number of input streams this policy joins.
    fn streams(&self) -> usize;

    /// Ingests one event for `stream`. May invoke the output sink zero or
    /// more times before returning; all work happens on the caller's thread.
    ///
    /// # Panics
    ///
    /// Panics if `stream` is out of range.
    fn add(&self, stream: usize, event: Event<Self::Message>);

    /// Registers the sink that receives synchronized tuples, replacing any
    /// previously registered one.
    fn connect_output(&self, sink: OutputSink<Self::Message>);
}
