use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// A closed interval `[lower, upper]` over f64 values, used for m/z, mobility and retention time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub lower: f64,
    pub upper: f64,
}

impl ValueRange {
    /// Creates a new range, the bounds may be passed in any order.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::range::ValueRange;
    ///
    /// let range = ValueRange::new(1.2, 0.8);
    /// assert_eq!(range.lower, 0.8);
    /// assert!(range.contains(1.0));
    /// ```
    pub fn new(lower: f64, upper: f64) -> Self {
        ValueRange { lower: lower.min(upper), upper: lower.max(upper) }
    }

    pub fn singleton(value: f64) -> Self {
        ValueRange { lower: value, upper: value }
    }

    /// Smallest range enclosing all values, `None` for an empty iterator.
    pub fn enclosing<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |acc: Option<ValueRange>, v| match acc {
            None => Some(ValueRange::singleton(v)),
            Some(range) => Some(range.span(v)),
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Smallest range enclosing this range and `value`.
    pub fn span(&self, value: f64) -> Self {
        ValueRange { lower: self.lower.min(value), upper: self.upper.max(value) }
    }

    pub fn span_range(&self, other: &ValueRange) -> Self {
        ValueRange { lower: self.lower.min(other.lower), upper: self.upper.max(other.upper) }
    }

    /// True if the two closed ranges share at least one value.
    pub fn is_connected(&self, other: &ValueRange) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Display for ValueRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lower, self.upper)
    }
}
