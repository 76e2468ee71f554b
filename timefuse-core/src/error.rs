// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Errors raised while configuring a synchronizer.
///
/// Configuration mistakes are reported eagerly, before any event is
/// accepted; there is no transient retry. Runtime misuse (an out-of-range
/// stream index passed to `add`) is a programming error and panics instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A synchronizer joins one message per stream; fewer than two streams
    /// leaves nothing to synchronize.
    #[error("at least 2 input streams are required, got {streams}")]
    TooFewStreams {
        /// The rejected stream count.
        streams: usize,
    },

    /// The approximate policy needs room for at least one pending event per
    /// stream.
    #[error("queue size must be at least 1")]
    ZeroQueueSize,

    /// A negative age penalty would invert the candidate replacement rule.
    #[error("age penalty must be a non-negative number, got {value}")]
    NegativeAgePenalty {
        /// The rejected penalty.
        value: f64,
    },

    /// Duration bounds are non-negative by definition.
    #[error("duration bound must be non-negative, got {nanos}ns")]
    NegativeDuration {
        /// The rejected bound, in nanoseconds.
        nanos: i64,
    },

    /// A per-stream setting referenced a stream the policy does not have.
    #[error("stream index {stream} out of range for {streams} streams")]
    StreamOutOfRange {
        /// The rejected index.
        stream: usize,
        /// Number of streams the policy was built with.
        streams: usize,
    },
}

/// Specialized `Result` for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
