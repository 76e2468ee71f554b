// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use timefuse_core::{Event, OutputSink, SyncPolicy};

/// Shared frame that fans per-stream producers into a synchronization policy.
///
/// The frame owns the policy behind an [`Arc`]; [`handle`](Self::handle)
/// binds cheap cloneable ingestion handles to stream indices, which producers
/// can move onto their own threads. Policy-specific configuration (drop
/// sinks, age penalty, rate bounds) stays reachable through
/// [`policy`](Self::policy).
pub struct Synchronizer<P> {
    policy: Arc<P>,
}

impl<P: SyncPolicy> Synchronizer<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// The underlying policy.
    #[must_use]
    pub fn policy(&self) -> &Arc<P> {
        &self.policy
    }

    /// Binds an ingestion handle to `stream`.
    ///
    /// # Panics
    ///
    /// Panics if `stream` is out of range for the policy.
    #[must_use]
    pub fn handle(&self, stream: usize) -> StreamHandle<P> {
        assert!(
            stream < self.policy.streams(),
            "stream index {stream} out of range for {} streams",
            self.policy.streams()
        );
        StreamHandle {
            policy: Arc::clone(&self.policy),
            stream,
        }
    }

    /// Registers the sink that receives synchronized tuples.
    pub fn connect_output(&self, sink: OutputSink<P::Message>) {
        self.policy.connect_output(sink);
    }
}

/// Per-stream ingestion handle produced by [`Synchronizer::handle`].
pub struct StreamHandle<P: SyncPolicy> {
    policy: Arc<P>,
    stream: usize,
}

impl<P: SyncPolicy> StreamHandle<P> {
    /// Feeds one event into the bound stream. All synchronization work,
    /// including sink invocations, happens on the calling thread before
    /// this returns.
    pub fn push(&self, event: Event<P::Message>) {
        self.policy.add(self.stream, event);
    }

    /// The stream index this handle is bound to.
    #[must_use]
    pub const fn stream(&self) -> usize {
        self.stream
    }
}

impl<P: SyncPolicy> Clone for StreamHandle<P> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            stream: self.stream,
        }
    }
}
