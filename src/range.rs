/// Component of a [Range].
///
/// Can be an interval, a stepped interval or an individual value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeItem {
    /// Interval (inclusive).
    Interval(f64, f64),
    /// Exact value.
    Value(f64),
    /// Values from `min` to `max` (inclusive) in increments of `step`.
    Step(f64, f64, f64),
}

impl RangeItem {
    fn bounds(&self) -> (f64, f64) {
        match *self {
            RangeItem::Interval(a, b) | RangeItem::Step(a, b, _) => (a, b),
            RangeItem::Value(v) => (v, v),
        }
    }

    /// Nearest value of this item to `value`.
    fn nearest(&self, value: f64) -> f64 {
        match *self {
            RangeItem::Value(v) => v,
            RangeItem::Interval(a, b) => value.clamp(a, b),
            RangeItem::Step(min, max, step) => {
                let v = value.clamp(min, max);
                if step <= 0.0 {
                    return v;
                }
                let snapped = min + ((v - min) / step).round() * step;
                snapped.min(max)
            }
        }
    }
}

/// Range of possible values, comprised of individual values and/or intervals.
///
/// Reported by the hardware for sample rates, frequencies, gains and bandwidths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    items: Vec<RangeItem>,
}

impl Range {
    /// Create a [`Range`] from [`RangeItems`](RangeItem).
    pub fn new(items: Vec<RangeItem>) -> Self {
        Self { items }
    }
    /// Create a single stepped [`Range`] from the integer `min`, `max` and `step` and a `scale`
    /// factor, the way libbladeRF reports its ranges.
    pub fn scaled(min: i64, max: i64, step: i64, scale: f64) -> Self {
        let (min, max, step) = (min as f64 * scale, max as f64 * scale, step as f64 * scale);
        if step <= 0.0 {
            Self::new(vec![RangeItem::Interval(min, max)])
        } else {
            Self::new(vec![RangeItem::Step(min, max, step)])
        }
    }
    pub fn items(&self) -> &[RangeItem] {
        &self.items
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// Smallest value, `None` for an empty [`Range`].
    pub fn start(&self) -> Option<f64> {
        self.items.iter().map(|i| i.bounds().0).reduce(f64::min)
    }
    /// Largest value, `None` for an empty [`Range`].
    pub fn stop(&self) -> Option<f64> {
        self.items.iter().map(|i| i.bounds().1).reduce(f64::max)
    }
    /// Check if the [`Range`] contains the `value`.
    pub fn contains(&self, value: f64) -> bool {
        self.items.iter().any(|item| match *item {
            RangeItem::Interval(a, b) => a <= value && value <= b,
            RangeItem::Value(v) => (v - value).abs() <= f64::EPSILON,
            RangeItem::Step(min, max, step) => {
                if value < min || value > max {
                    return false;
                }
                if step <= 0.0 {
                    return true;
                }
                let k = ((value - min) / step).round();
                (min + k * step - value).abs() <= f64::EPSILON * value.abs().max(1.0)
            }
        })
    }
    /// Returns the value in [`Range`] that is closest to the given `value` or `None`, if the
    /// [`Range`] is empty.
    pub fn closest(&self, value: f64) -> Option<f64> {
        self.items
            .iter()
            .map(|i| i.nearest(value))
            .reduce(|best, v| {
                if (v - value).abs() < (best - value).abs() {
                    v
                } else {
                    best
                }
            })
    }
    /// Clip `value` into the [`Range`], snapping to the step of a stepped item if
    /// `clip_step` is set. An empty [`Range`] returns `value` unchanged.
    pub fn clip(&self, value: f64, clip_step: bool) -> f64 {
        if clip_step {
            return self.closest(value).unwrap_or(value);
        }
        match (self.start(), self.stop()) {
            (Some(a), Some(b)) => value.clamp(a, b),
            _ => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Range {
        Range::new(vec![
            RangeItem::Value(123.0),
            RangeItem::Interval(23.0, 42.0),
            RangeItem::Step(100.0, 110.0, 1.0),
        ])
    }

    #[test]
    fn contains_empty() {
        let r = Range::default();
        assert!(!r.contains(123.0));
        assert_eq!(r.closest(1.0), None);
        assert_eq!(r.start(), None);
        assert_eq!(r.clip(5.0, true), 5.0);
    }
    #[test]
    fn contains() {
        let r = mixed();
        assert!(r.contains(123.0));
        assert!(r.contains(23.0));
        assert!(r.contains(42.0));
        assert!(r.contains(107.0));
        assert!(r.contains(110.0));
        assert!(!r.contains(107.5));
        assert!(!r.contains(19.0));
    }
    #[test]
    fn closest() {
        let r = mixed();
        assert_eq!(r.closest(122.0), Some(123.0));
        assert_eq!(r.closest(1000.0), Some(123.0));
        assert_eq!(r.closest(30.0), Some(30.0));
        assert_eq!(r.closest(20.0), Some(23.0));
        assert_eq!(r.closest(50.0), Some(42.0));
        assert_eq!(r.closest(99.5), Some(100.0));
        assert_eq!(r.closest(105.3), Some(105.0));
        assert_eq!(r.closest(105.8), Some(106.0));
        assert_eq!(r.closest(113.8), Some(110.0));
    }
    #[test]
    fn bounds_and_clip() {
        let r = mixed();
        assert_eq!(r.start(), Some(23.0));
        assert_eq!(r.stop(), Some(123.0));
        assert_eq!(r.clip(10.0, false), 23.0);
        assert_eq!(r.clip(60.0, false), 60.0);
        assert_eq!(r.clip(60.0, true), 42.0);
    }
    #[test]
    fn scaled() {
        // bladeRF 2 RX frequency range: 70 MHz to 6 GHz in 1 Hz steps
        let r = Range::scaled(70_000_000, 6_000_000_000, 1, 1.0);
        assert!(r.contains(915e6));
        assert!(!r.contains(60e6));
        assert_eq!(r.clip(7e9, true), 6e9);

        let g = Range::scaled(-15, 60, 1, 1.0);
        assert_eq!(g.closest(12.4), Some(12.0));

        let i = Range::scaled(0, 10, 0, 0.5);
        assert_eq!(i.items(), &[RangeItem::Interval(0.0, 5.0)]);
    }
}
