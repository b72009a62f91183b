use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

use crate::data::range::ValueRange;

/// Decides whether two m/z values belong to the same species.
pub trait MzToleranceLike {
    /// The closed m/z window around `center`.
    fn tolerance_range(&self, center: f64) -> ValueRange;

    /// True if `other` lies in the tolerance window around `center`.
    fn within_tolerance(&self, center: f64, other: f64) -> bool {
        self.tolerance_range(center).contains(other)
    }
}

/// An m/z tolerance given as an absolute value in Da and a relative value in ppm.
/// For a given mass the larger of the two applies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MzTolerance {
    pub absolute: f64,
    pub ppm: f64,
}

impl MzTolerance {
    /// Creates a new `MzTolerance`.
    ///
    /// # Arguments
    ///
    /// * `absolute` - absolute tolerance in Da.
    /// * `ppm` - relative tolerance in parts per million.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::tolerance::{MzTolerance, MzToleranceLike};
    ///
    /// let tolerance = MzTolerance::new(0.002, 10.0);
    /// // 10 ppm of 1000.0 is 0.01 Da which beats the absolute 0.002 Da
    /// assert!(tolerance.within_tolerance(1000.0, 1000.009));
    /// assert!(!tolerance.within_tolerance(100.0, 100.003));
    /// ```
    pub fn new(absolute: f64, ppm: f64) -> Self {
        MzTolerance { absolute: absolute.abs(), ppm: ppm.abs() }
    }

    pub fn absolute(absolute: f64) -> Self {
        MzTolerance::new(absolute, 0.0)
    }

    pub fn ppm(ppm: f64) -> Self {
        MzTolerance::new(0.0, ppm)
    }

    /// Half-width of the window at the given mass.
    pub fn tolerance_at(&self, mz: f64) -> f64 {
        self.absolute.max(mz.abs() * self.ppm * 1e-6)
    }
}

impl Default for MzTolerance {
    fn default() -> Self {
        MzTolerance::new(0.005, 15.0)
    }
}

impl MzToleranceLike for MzTolerance {
    fn tolerance_range(&self, center: f64) -> ValueRange {
        let tolerance = self.tolerance_at(center);
        ValueRange::new(center - tolerance, center + tolerance)
    }
}

impl Display for MzTolerance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} m/z or {} ppm", self.absolute, self.ppm)
    }
}
