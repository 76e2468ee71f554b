// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt;
use std::ops::{Add, Sub};

/// A point in time, in nanoseconds since an unspecified epoch.
///
/// Timestamps are totally ordered and compare bit-exactly; two events are
/// "simultaneous" only when their stamps are equal. All arithmetic saturates
/// at the representable range instead of wrapping, so comparisons stay
/// meaningful even near the extremes.
///
/// # Examples
///
/// ```
/// use timefuse_core::{Span, Stamp};
///
/// let a = Stamp::from_millis(100);
/// let b = Stamp::from_millis(110);
/// assert_eq!(b - a, Span::from_millis(10));
/// assert_eq!(a + Span::from_millis(10), b);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp(i64);

impl Stamp {
    /// The epoch itself.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Nanoseconds since the epoch.
    #[must_use]
    pub const fn nanos(self) -> i64 {
        self.0
    }
}

impl Sub for Stamp {
    type Output = Span;

    fn sub(self, rhs: Self) -> Span {
        Span(self.0.saturating_sub(rhs.0))
    }
}

impl Add<Span> for Stamp {
    type Output = Stamp;

    fn add(self, rhs: Span) -> Stamp {
        Stamp(self.0.saturating_add(rhs.nanos()))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A signed duration in nanoseconds.
///
/// [`Span::MAX`] stands in for "no bound": it is the default
/// `max_interval_duration` and compares greater than any real interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span(i64);

impl Span {
    pub const ZERO: Self = Self(0);

    /// The widest representable span.
    pub const MAX: Self = Self(i64::MAX);

    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    #[must_use]
    pub const fn nanos(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiplies by `factor` in floating point, clamping the result to the
    /// representable range.
    ///
    /// Used for age-penalty weighting, where precision loss near the extremes
    /// is acceptable as long as ordering is preserved.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        let product = self.0 as f64 * factor;
        if product >= i64::MAX as f64 {
            Self::MAX
        } else if product <= i64::MIN as f64 {
            Self(i64::MIN)
        } else {
            Self(product as i64)
        }
    }
}

impl Add for Span {
    type Output = Span;

    fn add(self, rhs: Self) -> Span {
        Span(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Span {
    type Output = Span;

    fn sub(self, rhs: Self) -> Span {
        Span(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
