// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Stamp;

/// A timestamped message owned by the synchronization core.
///
/// Ownership transfers into a policy on `add` and back out through an output
/// or drop sink; a policy retains nothing beyond its live queues. Each policy
/// synchronizes a single message type `M`; callers joining heterogeneous
/// streams supply `M` as an enum with one variant per stream.
///
/// Payloads that are expensive to clone can be wrapped in an
/// [`Arc`](std::sync::Arc) by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<M> {
    message: M,
    stamp: Stamp,
}

impl<M> Event<M> {
    pub fn new(message: M, stamp: Stamp) -> Self {
        Self { message, stamp }
    }

    #[must_use]
    pub const fn stamp(&self) -> Stamp {
        self.stamp
    }

    #[must_use]
    pub const fn message(&self) -> &M {
        &self.message
    }

    /// Consumes the event and returns its payload.
    #[must_use]
    pub fn into_message(self) -> M {
        self.message
    }
}
