// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use timefuse_approx::ApproximateTime;
use timefuse_core::{ConfigError, Span, Stamp, SyncPolicy};
use timefuse_test_utils::sensor::{image_at, imu_at, scan_at, SensorFrame};
use timefuse_test_utils::Collector;

fn stamps(nanos: &[i64]) -> Vec<Stamp> {
    nanos.iter().copied().map(Stamp::from_nanos).collect()
}

/// A two-stream policy with the age penalty disabled, plus a collector.
fn two_streams() -> (ApproximateTime<SensorFrame>, Collector<SensorFrame>) {
    let policy = ApproximateTime::new(2, 10).expect("valid config");
    policy.set_age_penalty(0.0).expect("valid penalty");
    let collector = Collector::new();
    policy.connect_output(collector.sink());
    (policy, collector)
}

#[test]
fn test_identical_timestamps_pair_immediately() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 100));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 100])]);
}

#[test]
fn test_close_pairs_emit_in_order() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act: two natural pairs; the trailing image proves the second pair
    // cannot be improved and flushes it.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 110));
    policy.add(0, scan_at(2, 200));
    policy.add(1, image_at(2, 190));
    policy.add(1, image_at(3, 290));

    // Assert
    assert_eq!(
        collector.stamps(),
        vec![stamps(&[100, 110]), stamps(&[200, 190])]
    );
}

#[test]
fn test_better_candidate_replaces_held_one() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act: the provisional (100, 200) pairing is displaced by the narrower
    // (150, 200) once the second scan arrives; the last two events only
    // drive the search far enough to publish.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 200));
    policy.add(0, scan_at(2, 150));
    policy.add(1, image_at(2, 300));
    policy.add(0, scan_at(3, 250));

    // Assert: one emission, and it is the replacement.
    let tuples = collector.take();
    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0][0].stamp(), Stamp::from_nanos(150));
    assert_eq!(tuples[0][0].message(), &SensorFrame::Scan { seq: 2 });
    assert_eq!(tuples[0][1].stamp(), Stamp::from_nanos(200));
}

#[test]
fn test_zero_age_penalty_keeps_held_candidate_on_tie() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act: the (300, 200) pairing is exactly as wide as the held (100, 200)
    // after weighting, so the held one wins.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 200));
    policy.add(0, scan_at(2, 300));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 200])]);
}

#[test]
fn test_zero_age_penalty_accepts_strictly_better_candidate() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act: one nanosecond narrower than the held candidate is enough.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 200));
    policy.add(0, scan_at(2, 299));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[299, 200])]);
}

#[test]
fn test_age_penalty_biases_toward_held_candidate() {
    // Arrange
    let policy = ApproximateTime::new(2, 10).expect("valid config");
    policy.set_age_penalty(1.0).expect("valid penalty");
    let collector = Collector::new();
    policy.connect_output(collector.sink());

    // Act: (299, 200) is narrower, but the doubled end-growth weight keeps
    // the older candidate.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 200));
    policy.add(0, scan_at(2, 299));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 200])]);
}

#[test]
fn test_too_wide_interval_discards_earliest_head() {
    // Arrange
    let (policy, collector) = two_streams();
    policy
        .set_max_interval_duration(Span::from_nanos(5))
        .expect("valid bound");

    // Act: 100ns of separation against a 5ns bound; the scan at t=100 is
    // unusable and is discarded outright.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 200));
    assert!(collector.is_empty());

    // A near-coincident replacement pairs up, which also shows the stale
    // scan no longer participates.
    policy.add(0, scan_at(2, 198));
    policy.add(0, scan_at(3, 205));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[198, 200])]);
}

#[test]
fn test_interval_equal_to_max_is_accepted() {
    // Arrange
    let (policy, collector) = two_streams();
    policy
        .set_max_interval_duration(Span::from_nanos(10))
        .expect("valid bound");
    policy
        .set_inter_message_lower_bound(0, Span::from_nanos(1_000))
        .expect("valid bound");

    // Act: exactly 10ns apart; the closed bound admits it, and the scan
    // stream's rate bound proves no better pairing can come.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 110));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 110])]);
}

#[test]
fn test_interval_past_max_is_rejected() {
    // Arrange
    let (policy, collector) = two_streams();
    policy
        .set_max_interval_duration(Span::from_nanos(10))
        .expect("valid bound");
    policy
        .set_inter_message_lower_bound(0, Span::from_nanos(1_000))
        .expect("valid bound");

    // Act: one nanosecond over the bound; the scan is discarded, and the
    // next scan pairs with the image instead.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 111));
    assert!(collector.is_empty());
    policy.add(0, scan_at(2, 111));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[111, 111])]);
}

#[test]
fn test_overflow_drops_oldest_and_poisons_pivot() {
    // Arrange
    let policy = ApproximateTime::new(2, 2).expect("valid config");
    policy.set_age_penalty(0.0).expect("valid penalty");
    let collector = Collector::new();
    policy.connect_output(collector.sink());

    // Act: three scans against a queue bound of two; the oldest is silently
    // dropped.
    policy.add(0, scan_at(1, 100));
    policy.add(0, scan_at(2, 110));
    policy.add(0, scan_at(3, 120));
    assert!(collector.is_empty());

    // The scan stream lost a message, so it may not anchor a pairing yet:
    // an image that would make it the anchor is consumed without emission.
    policy.add(1, image_at(1, 105));
    assert!(collector.is_empty());

    // An image past the scan head clears the taint and pairs normally.
    policy.add(1, image_at(2, 112));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[110, 112])]);
}

#[test]
fn test_three_streams_synchronize() {
    // Arrange
    let policy = ApproximateTime::new(3, 10).expect("valid config");
    policy.set_age_penalty(0.0).expect("valid penalty");
    let collector = Collector::new();
    policy.connect_output(collector.sink());

    // Act: a tight triple, then a late scan that proves it optimal.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 102));
    policy.add(2, imu_at(1, 104));
    assert!(collector.is_empty());
    policy.add(0, scan_at(2, 200));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 102, 104])]);
}

#[test]
fn test_out_of_order_event_is_tolerated() {
    // Arrange
    let (policy, collector) = two_streams();

    // Act: the scan at t=90 arrives after t=100 was already seen. It is
    // kept (and warned about once), and synchronization proceeds.
    policy.add(0, scan_at(1, 100));
    policy.add(1, image_at(1, 110));
    policy.add(0, scan_at(2, 90));
    policy.add(0, scan_at(3, 300));

    // Assert
    assert_eq!(collector.stamps(), vec![stamps(&[100, 110])]);
}

#[test]
fn test_randomized_pairs_are_well_formed() {
    // Arrange
    let policy = ApproximateTime::new(2, 10).expect("valid config");
    policy.set_age_penalty(0.0).expect("valid penalty");
    policy
        .set_max_interval_duration(Span::from_nanos(2_000))
        .expect("valid bound");
    let collector = Collector::new();
    policy.connect_output(collector.sink());

    let mut rng = fastrand::Rng::with_seed(7);

    // Act: 150 jittered pairs, each delivered in random stream order.
    for k in 0..150u32 {
        let base = 10_000 * i64::from(k) + 100_000;
        let scan = scan_at(k, base + rng.i64(-300..=300));
        let image = image_at(k, base + rng.i64(-300..=300));
        if rng.bool() {
            policy.add(0, scan);
            policy.add(1, image);
        } else {
            policy.add(1, image);
            policy.add(0, scan);
        }
    }

    // Assert: every tuple pairs one scan with one image within the interval
    // bound, and each stream's emitted stamps strictly increase.
    let tuples = collector.take();
    assert!(tuples.len() > 100, "expected most pairs to synchronize");
    let mut previous: Option<(Stamp, Stamp)> = None;
    for tuple in &tuples {
        assert_eq!(tuple.len(), 2);
        assert!(matches!(tuple[0].message(), SensorFrame::Scan { .. }));
        assert!(matches!(tuple[1].message(), SensorFrame::Image { .. }));

        let width = tuple[0].stamp().max(tuple[1].stamp()) - tuple[0].stamp().min(tuple[1].stamp());
        assert!(width <= Span::from_nanos(2_000));

        if let Some((scan_stamp, image_stamp)) = previous {
            assert!(tuple[0].stamp() > scan_stamp);
            assert!(tuple[1].stamp() > image_stamp);
        }
        previous = Some((tuple[0].stamp(), tuple[1].stamp()));
    }
}

#[test]
fn test_invalid_configurations_are_rejected() {
    assert!(matches!(
        ApproximateTime::<SensorFrame>::new(1, 10),
        Err(ConfigError::TooFewStreams { streams: 1 })
    ));
    assert!(matches!(
        ApproximateTime::<SensorFrame>::new(2, 0),
        Err(ConfigError::ZeroQueueSize)
    ));

    let policy = ApproximateTime::<SensorFrame>::new(2, 10).expect("valid config");
    assert!(matches!(
        policy.set_age_penalty(-0.5),
        Err(ConfigError::NegativeAgePenalty { .. })
    ));
    assert!(matches!(
        policy.set_age_penalty(f64::NAN),
        Err(ConfigError::NegativeAgePenalty { .. })
    ));
    assert!(matches!(
        policy.set_inter_message_lower_bound(0, Span::from_nanos(-1)),
        Err(ConfigError::NegativeDuration { nanos: -1 })
    ));
    assert!(matches!(
        policy.set_inter_message_lower_bound(5, Span::ZERO),
        Err(ConfigError::StreamOutOfRange { stream: 5, streams: 2 })
    ));
    assert!(matches!(
        policy.set_max_interval_duration(Span::from_nanos(-10)),
        Err(ConfigError::NegativeDuration { nanos: -10 })
    ));
}

#[test]
#[should_panic(expected = "out of range")]
fn test_out_of_range_stream_panics() {
    let policy = ApproximateTime::new(2, 10).expect("valid config");

    policy.add(2, scan_at(1, 100));
}
