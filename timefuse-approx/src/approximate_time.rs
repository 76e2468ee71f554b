// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::warn;

use timefuse_core::{ConfigError, Event, OutputSink, Result, Span, Stamp, SyncPolicy};

/// Approximate-time synchronization: emits tuples whose timestamps span the
/// smallest achievable interval.
///
/// Each stream buffers its pending events in arrival order. Whenever every
/// buffer holds at least one event, the policy searches the combinations
/// reachable from the buffer heads: the latest head anchors the search (the
/// pivot) while earlier heads are set aside into per-stream past buffers as
/// long as a better combination is still possible. The held candidate is
/// emitted once no future arrival can improve on it under the age-penalty
/// weighting; configured inter-message lower bounds let the search reason
/// about streams that have gone silent, and `max_interval_duration` rejects
/// combinations that are too wide to be useful.
///
/// All work happens on the caller's thread under a single exclusive lock;
/// the output sink runs with that lock held and must not block or re-enter
/// the policy.
pub struct ApproximateTime<M> {
    inner: Mutex<Inner<M>>,
}

struct Inner<M> {
    streams: usize,
    queue_size: usize,
    deques: Vec<VecDeque<Event<M>>>,
    past: Vec<Vec<Event<M>>>,
    non_empty: usize,
    candidate: Option<Vec<Event<M>>>,
    candidate_start: Stamp,
    candidate_end: Stamp,
    pivot: Option<usize>,
    pivot_time: Stamp,
    max_interval: Span,
    age_penalty: f64,
    has_dropped: Vec<bool>,
    lower_bounds: Vec<Span>,
    warned_bound: Vec<bool>,
    output: Option<OutputSink<M>>,
}

impl<M: Clone + Send> ApproximateTime<M> {
    /// Creates a policy joining `streams` inputs, each buffering at most
    /// `queue_size` pending events.
    ///
    /// A queue size of 1 makes the policy drop aggressively; at least 2 is
    /// recommended. Defaults: age penalty 0.1, no interval bound, no
    /// inter-message lower bounds.
    pub fn new(streams: usize, queue_size: usize) -> Result<Self> {
        if streams < 2 {
            return Err(ConfigError::TooFewStreams { streams });
        }
        if queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                streams,
                queue_size,
                deques: vec![VecDeque::new(); streams],
                past: vec![Vec::new(); streams],
                non_empty: 0,
                candidate: None,
                candidate_start: Stamp::ZERO,
                candidate_end: Stamp::ZERO,
                pivot: None,
                pivot_time: Stamp::ZERO,
                max_interval: Span::MAX,
                age_penalty: 0.1,
                has_dropped: vec![false; streams],
                lower_bounds: vec![Span::ZERO; streams],
                warned_bound: vec![false; streams],
                output: None,
            }),
        })
    }

    /// Sets the bias against older candidates.
    ///
    /// Zero disables the bias, so a held candidate is only replaced by a
    /// strictly narrower one; larger values trade interval width for bounded
    /// latency.
    pub fn set_age_penalty(&self, age_penalty: f64) -> Result<()> {
        if age_penalty.is_nan() || age_penalty < 0.0 {
            return Err(ConfigError::NegativeAgePenalty { value: age_penalty });
        }
        self.inner.lock().age_penalty = age_penalty;
        Ok(())
    }

    /// Sets the minimum spacing between consecutive messages on `stream`.
    ///
    /// A non-zero bound lets the policy predict the earliest possible next
    /// message on a silent stream and publish a held candidate without
    /// waiting for it.
    pub fn set_inter_message_lower_bound(&self, stream: usize, bound: Span) -> Result<()> {
        if bound.is_negative() {
            return Err(ConfigError::NegativeDuration {
                nanos: bound.nanos(),
            });
        }
        let mut inner = self.inner.lock();
        if stream >= inner.streams {
            return Err(ConfigError::StreamOutOfRange {
                stream,
                streams: inner.streams,
            });
        }
        inner.lower_bounds[stream] = bound;
        Ok(())
    }

    /// Sets the widest acceptable tuple interval.
    ///
    /// The bound is closed: a tuple spanning exactly this much is still
    /// accepted.
    pub fn set_max_interval_duration(&self, max_interval: Span) -> Result<()> {
        if max_interval.is_negative() {
            return Err(ConfigError::NegativeDuration {
                nanos: max_interval.nanos(),
            });
        }
        self.inner.lock().max_interval = max_interval;
        Ok(())
    }
}

impl<M: Clone + Send> SyncPolicy for ApproximateTime<M> {
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

impl<M: Clone> Inner<M> {
    fn add(&mut self, stream: usize, event: Event<M>) {
        assert!(
            stream < self.streams,
            "stream index {stream} out of range for {} streams",
            self.streams
        );

        self.deques[stream].push_back(event);
        self.check_inter_message_bound(stream);
        if self.deques[stream].len() == 1 {
            self.non_empty += 1;
            if self.non_empty == self.streams {
                self.process();
            }
        }

        // The processing above may leave this stream one event over bound.
        if self.deques[stream].len() + self.past[stream].len() > self.queue_size {
            // An in-progress candidate search holds part of the backlog in
            // the past buffers; unwind it before touching the queue.
            self.non_empty = 0;
            for i in 0..self.streams {
                self.recover_all(i);
            }
            // The displaced event is discarded without notification; only
            // has_dropped records the loss.
            let _ = self.deques[stream].pop_front();
            debug_assert!(!self.deques[stream].is_empty());
            self.has_dropped[stream] = true;
            if self.pivot.is_some() {
                // The candidate may reference the event just dropped.
                self.candidate = None;
                self.pivot = None;
                self.process();
            }
        }
    }

    /// One-shot data-rate diagnostics for the newest event on `stream`.
    fn check_inter_message_bound(&mut self, stream: usize) {
        if self.warned_bound[stream] {
            return;
        }
        let deque = &self.deques[stream];
        let Some(newest) = deque.back() else { return };
        let previous = if deque.len() >= 2 {
            deque.get(deque.len() - 2).map(Event::stamp)
        } else {
            // The rest of this stream's backlog may sit in the past buffer
            // while a candidate search is in progress.
            self.past[stream].last().map(Event::stamp)
        };
        let Some(previous) = previous else {
            // The previous message was already published or never received;
            // nothing to compare against.
            return;
        };
        let newest = newest.stamp();
        if newest < previous {
            warn!(stream, "messages arrived out of order (will warn only once)");
            self.warned_bound[stream] = true;
        } else if newest - previous < self.lower_bounds[stream] {
            warn!(
                stream,
                gap_ns = (newest - previous).nanos(),
                bound_ns = self.lower_bounds[stream].nanos(),
                "messages arrived closer than the configured lower bound (will warn only once)"
            );
            self.warned_bound[stream] = true;
        }
    }

    /// Runs the candidate search while no stream's queue is empty.
    fn process(&mut self) {
        while self.non_empty == self.streams {
            let (end_index, end_time) = self.candidate_end();
            let (start_index, start_time) = self.candidate_start();
            for i in 0..self.streams {
                if i != end_index {
                    // This stream's head competed in the current interval, so
                    // no earlier drop on it could have produced a better
                    // tuple; it may anchor a search again.
                    self.has_dropped[i] = false;
                }
            }

            if self.pivot.is_none() {
                if end_time - start_time > self.max_interval {
                    // Too wide to ever become a tuple: future arrivals only
                    // push the end later.
                    self.delete_front(start_index);
                    continue;
                }
                if self.has_dropped[end_index] {
                    // A stream that lost messages cannot anchor the search.
                    self.delete_front(start_index);
                    continue;
                }
                self.make_candidate();
                self.candidate_start = start_time;
                self.candidate_end = end_time;
                self.pivot = Some(end_index);
                self.pivot_time = end_time;
                self.move_front_to_past(start_index);
            } else if (end_time - self.candidate_end).scaled(1.0 + self.age_penalty)
                >= start_time - self.candidate_start
            {
                // Not better than the held candidate.
                self.move_front_to_past(start_index);
            } else {
                self.make_candidate();
                self.candidate_start = start_time;
                self.candidate_end = end_time;
                self.move_front_to_past(start_index);
                // The pivot and its time stay with the original anchor.
            }

            debug_assert!(self.pivot.is_some());
            let age_check = (end_time - self.candidate_end).scaled(1.0 + self.age_penalty);
            if self.pivot == Some(start_index) {
                // Every head at or before the pivot time has been tried.
                self.publish_candidate();
            } else if age_check >= self.pivot_time - self.candidate_start {
                // Any future tuple must span at least [pivot_time, end_time],
                // which already loses to the held candidate.
                self.publish_candidate();
            } else if self.non_empty < self.streams {
                self.virtual_search();
            }
        }
    }

    /// A queue ran dry before optimality was settled. The configured rate
    /// bounds give the earliest timestamp each silent stream could still
    /// produce; either that proves the held candidate optimal now, or the
    /// speculative moves are rolled back to wait for real events.
    fn virtual_search(&mut self) {
        let mut virtual_moves = vec![0usize; self.streams];
        loop {
            let (_, end_time) = self.virtual_candidate_end();
            let (start_index, start_time) = self.virtual_candidate_start();
            let age_check = (end_time - self.candidate_end).scaled(1.0 + self.age_penalty);
            if age_check >= self.pivot_time - self.candidate_start {
                // Publishing also unwinds the speculative moves.
                self.publish_candidate();
                return;
            }
            if age_check < start_time - self.candidate_start {
                // An optimistic future tuple could still win; undo the
                // speculative moves and wait.
                self.non_empty = 0;
                for i in 0..self.streams {
                    let moves = virtual_moves[i];
                    self.recover_some(i, moves);
                }
                return;
            }
            // Once start_time reaches pivot_time the two tests above are
            // each other's negation, so the loop cannot stall on the pivot
            // stream.
            debug_assert!(self.pivot != Some(start_index));
            debug_assert!(start_time < self.pivot_time);
            self.move_front_to_past(start_index);
            virtual_moves[start_index] += 1;
        }
    }

    /// Captures the current queue heads as the new best tuple. Past events
    /// belong to strictly worse combinations once a better candidate exists,
    /// so the buffers are cleared.
    fn make_candidate(&mut self) {
        let tuple = self
            .deques
            .iter()
            .map(|deque| {
                deque
                    .front()
                    .cloned()
                    .expect("all queues non-empty during candidate search")
            })
            .collect();
        self.candidate = Some(tuple);
        for past in &mut self.past {
            past.clear();
        }
    }

    /// Emits the held candidate, then restores each stream's backlog and
    /// discards the front event, which is the one the candidate consumed.
    fn publish_candidate(&mut self) {
        if let Some(tuple) = self.candidate.take() {
            if let Some(output) = self.output.as_mut() {
                output(tuple);
            }
        }
        self.pivot = None;
        self.non_empty = 0;
        for i in 0..self.streams {
            self.recover_and_delete(i);
        }
    }

    fn recover_and_delete(&mut self, stream: usize) {
        while let Some(event) = self.past[stream].pop() {
            self.deques[stream].push_front(event);
        }
        let removed = self.deques[stream].pop_front();
        debug_assert!(removed.is_some(), "candidate event missing from queue");
        if !self.deques[stream].is_empty() {
            self.non_empty += 1;
        }
    }

    /// Returns the newest `count` past events to the front of the queue.
    /// Callers zero `non_empty` beforehand and recover every stream, so the
    /// count is rebuilt here.
    fn recover_some(&mut self, stream: usize, count: usize) {
        debug_assert!(count <= self.past[stream].len());
        for _ in 0..count {
            if let Some(event) = self.past[stream].pop() {
                self.deques[stream].push_front(event);
            }
        }
        if !self.deques[stream].is_empty() {
            self.non_empty += 1;
        }
    }

    fn recover_all(&mut self, stream: usize) {
        let count = self.past[stream].len();
        self.recover_some(stream, count);
    }

    fn delete_front(&mut self, stream: usize) {
        let removed = self.deques[stream].pop_front();
        debug_assert!(removed.is_some());
        if removed.is_some() && self.deques[stream].is_empty() {
            self.non_empty -= 1;
        }
    }

    fn move_front_to_past(&mut self, stream: usize) {
        if let Some(event) = self.deques[stream].pop_front() {
            self.past[stream].push(event);
            if self.deques[stream].is_empty() {
                self.non_empty -= 1;
            }
        }
    }

    fn head_stamp(&self, stream: usize) -> Stamp {
        self.deques[stream]
            .front()
            .map(Event::stamp)
            .expect("all queues non-empty during candidate search")
    }

    /// Earliest queue head; ties resolve to the lowest stream index.
    fn candidate_start(&self) -> (usize, Stamp) {
        let mut index = 0;
        let mut time = self.head_stamp(0);
        for i in 1..self.streams {
            let t = self.head_stamp(i);
            if t < time {
                index = i;
                time = t;
            }
        }
        (index, time)
    }

    /// Latest queue head; ties resolve to the lowest stream index.
    fn candidate_end(&self) -> (usize, Stamp) {
        let mut index = 0;
        let mut time = self.head_stamp(0);
        for i in 1..self.streams {
            let t = self.head_stamp(i);
            if t > time {
                index = i;
                time = t;
            }
        }
        (index, time)
    }

    /// Earliest timestamp a future event on `stream` could still bear.
    ///
    /// Streams with a queued event answer with its actual stamp; a drained
    /// stream answers optimistically from its last seen event and the
    /// configured lower bound, never earlier than the pivot time.
    fn virtual_time(&self, stream: usize) -> Stamp {
        if let Some(head) = self.deques[stream].front() {
            return head.stamp();
        }
        let last = self.past[stream]
            .last()
            .map(Event::stamp)
            .expect("past buffer non-empty while a candidate is held");
        let lower_bound = last + self.lower_bounds[stream];
        lower_bound.max(self.pivot_time)
    }

    fn virtual_candidate_start(&self) -> (usize, Stamp) {
        let mut index = 0;
        let mut time = self.virtual_time(0);
        for i in 1..self.streams {
            let t = self.virtual_time(i);
            if t < time {
                index = i;
                time = t;
            }
        }
        (index, time)
    }

    fn virtual_candidate_end(&self) -> (usize, Stamp) {
        let mut index = 0;
        let mut time = self.virtual_time(0);
        for i in 1..self.streams {
            let t = self.virtual_time(i);
            if t > time {
                index = i;
                time = t;
            }
        }
        (index, time)
    }
}
