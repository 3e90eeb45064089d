#![forbid(unsafe_code)]

//! Min/max/step policy for numeric fields.
//!
//! Out-of-range input is clamped to the nearest bound, never rejected. The
//! same policy is used for integer, double and slider fields.

use crate::scalar::Scalar;

/// Clamping policy installed on a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericConfig {
    min: f64,
    max: f64,
    /// Increment used by spinner-style editors. Not applied when clamping.
    step: f64,
    /// Doubles are rounded to this many places on commit.
    decimal_places: Option<u32>,
}

impl NumericConfig {
    /// Build a policy. Swapped bounds are put back in order and a NaN bound
    /// leaves that side open.
    #[must_use]
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        let (min, max) = sanitize(min, max);
        Self {
            min,
            max,
            step,
            decimal_places: None,
        }
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.bounds().0
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.bounds().1
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn decimal_places(&self) -> Option<u32> {
        self.decimal_places
    }

    // Deserialized configs skip `new`, so bounds are re-checked on use.
    fn bounds(&self) -> (f64, f64) {
        sanitize(self.min, self.max)
    }

    #[must_use]
    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    /// Clamp a numeric scalar. Non-numeric scalars pass through untouched.
    #[must_use]
    pub fn apply(&self, value: Scalar) -> Scalar {
        match value {
            Scalar::Integer(i) => Scalar::Integer(self.clamp_integer(i)),
            Scalar::Double(d) => {
                let (lo, hi) = self.bounds();
                Scalar::Double(self.round(d.clamp(lo, hi)))
            }
            other => other,
        }
    }

    fn clamp_integer(&self, value: i64) -> i64 {
        let (lo, hi) = self.bounds();
        let (lo, hi) = (lo.ceil(), hi.floor());
        if lo > hi {
            // No integer inside the range; pin to the lower bound.
            return lo as i64;
        }
        (value as f64).clamp(lo, hi) as i64
    }

    fn round(&self, value: f64) -> f64 {
        match self.decimal_places {
            Some(places) => {
                let factor = 10f64.powi(places.min(15) as i32);
                (value * factor).round() / factor
            }
            None => value,
        }
    }
}

fn sanitize(min: f64, max: f64) -> (f64, f64) {
    let min = if min.is_nan() { f64::NEG_INFINITY } else { min };
    let max = if max.is_nan() { f64::INFINITY } else { max };
    if min <= max { (min, max) } else { (max, min) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_clamp_to_bounds() {
        let cfg = NumericConfig::new(10.0, 20.0, 1.0);
        assert_eq!(cfg.apply(Scalar::Integer(41)), Scalar::Integer(20));
        assert_eq!(cfg.apply(Scalar::Integer(1)), Scalar::Integer(10));
        assert_eq!(cfg.apply(Scalar::Integer(15)), Scalar::Integer(15));
    }

    #[test]
    fn doubles_clamp_and_round() {
        let cfg = NumericConfig::new(0.0, 1.0, 0.1).with_decimal_places(2);
        assert_eq!(cfg.apply(Scalar::Double(1.7)), Scalar::Double(1.0));
        assert_eq!(cfg.apply(Scalar::Double(-0.2)), Scalar::Double(0.0));
        assert_eq!(cfg.apply(Scalar::Double(0.456)), Scalar::Double(0.46));
    }

    #[test]
    fn swapped_bounds_are_reordered() {
        let cfg = NumericConfig::new(20.0, 10.0, 1.0);
        assert_eq!(cfg.min(), 10.0);
        assert_eq!(cfg.max(), 20.0);
        assert_eq!(cfg.apply(Scalar::Double(25.0)), Scalar::Double(20.0));
    }

    #[test]
    fn nan_bound_leaves_that_side_open() {
        let cfg = NumericConfig::new(f64::NAN, 20.0, 1.0);
        assert_eq!(cfg.min(), f64::NEG_INFINITY);
        assert_eq!(cfg.apply(Scalar::Integer(5)), Scalar::Integer(5));
        assert_eq!(cfg.apply(Scalar::Integer(41)), Scalar::Integer(20));
        assert_eq!(cfg.apply(Scalar::Double(-3.5)), Scalar::Double(-3.5));

        let cfg = NumericConfig::new(10.0, f64::NAN, 1.0);
        assert_eq!(cfg.max(), f64::INFINITY);
        assert_eq!(cfg.apply(Scalar::Integer(1)), Scalar::Integer(10));
        assert_eq!(cfg.apply(Scalar::Double(1e9)), Scalar::Double(1e9));
    }

    #[test]
    fn both_bounds_nan_is_unbounded() {
        let cfg = NumericConfig::new(f64::NAN, f64::NAN, 1.0);
        assert_eq!(cfg.apply(Scalar::Integer(i64::MIN)), Scalar::Integer(i64::MIN));
        assert_eq!(cfg.apply(Scalar::Double(-7.25)), Scalar::Double(-7.25));
    }

    #[test]
    fn fractional_bounds_snap_inward_for_integers() {
        let cfg = NumericConfig::new(0.5, 3.5, 1.0);
        assert_eq!(cfg.apply(Scalar::Integer(0)), Scalar::Integer(1));
        assert_eq!(cfg.apply(Scalar::Integer(9)), Scalar::Integer(3));
    }

    #[test]
    fn non_numeric_passes_through() {
        let cfg = NumericConfig::new(0.0, 1.0, 1.0);
        assert_eq!(cfg.apply("x".into()), Scalar::String("x".into()));
    }
}
