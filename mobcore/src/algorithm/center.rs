use std::fmt;
use std::fmt::{Display, Formatter};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// How the center of a set of values is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CenterMeasure {
    #[default]
    Avg,
    Median,
}

/// Transformation applied to intensities before they are used as weights.
///
/// Every weighting except `None` maps a zero intensity to a zero weight, so padding a
/// trace with zero-intensity points does not move its center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    None,
    #[default]
    Linear,
    Log10,
    Sqrt,
}

impl Weighting {
    pub fn weight(&self, intensity: f64) -> f64 {
        let intensity = intensity.max(0.0);
        match self {
            Weighting::None => 1.0,
            Weighting::Linear => intensity,
            Weighting::Log10 => (1.0 + intensity).log10(),
            Weighting::Sqrt => intensity.sqrt(),
        }
    }
}

/// Computes a representative value (e.g. the m/z of a trace) from values and their intensities.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterFunction {
    pub measure: CenterMeasure,
    pub weighting: Weighting,
}

impl CenterFunction {
    /// Creates a new `CenterFunction`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::algorithm::center::{CenterFunction, CenterMeasure, Weighting};
    ///
    /// let center = CenterFunction::new(CenterMeasure::Avg, Weighting::Linear);
    /// let mz = center.calc_center(&[100.0, 100.002], &[1.0, 3.0]).unwrap();
    /// assert!((mz - 100.0015).abs() < 1e-9);
    /// ```
    pub fn new(measure: CenterMeasure, weighting: Weighting) -> Self {
        CenterFunction { measure, weighting }
    }

    /// Center of `values`, `None` if there are no values.
    /// Falls back to unweighted if every weight is zero.
    pub fn calc_center(&self, values: &[f64], intensities: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let weights: Vec<f64> = (0..values.len())
            .map(|i| self.weighting.weight(intensities.get(i).copied().unwrap_or(0.0)))
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        if weight_sum <= 0.0 || self.weighting == Weighting::None {
            return Some(match self.measure {
                CenterMeasure::Avg => values.iter().sum::<f64>() / values.len() as f64,
                CenterMeasure::Median => Data::new(values.to_vec()).median(),
            });
        }

        Some(match self.measure {
            CenterMeasure::Avg => {
                values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / weight_sum
            }
            CenterMeasure::Median => weighted_median(values, &weights, weight_sum),
        })
    }
}

impl Display for CenterFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?} weighting)", self.measure, self.weighting)
    }
}

/// Value at which the cumulative weight first reaches half of the total. If the half is hit
/// exactly, the midpoint to the next value with non-zero weight is taken.
fn weighted_median(values: &[f64], weights: &[f64], weight_sum: f64) -> f64 {
    let sorted: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied())
        .filter(|(_, w)| *w > 0.0)
        .sorted_by_key(|(v, _)| OrderedFloat(*v))
        .collect();

    let half = weight_sum / 2.0;
    let mut cumulative = 0.0;
    for (i, (value, weight)) in sorted.iter().enumerate() {
        cumulative += weight;
        if (cumulative - half).abs() <= f64::EPSILON * weight_sum {
            return match sorted.get(i + 1) {
                Some((next, _)) => (value + next) / 2.0,
                None => *value,
            };
        }
        if cumulative > half {
            return *value;
        }
    }
    // rounding left the loop without crossing the half
    sorted.last().map(|(v, _)| *v).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padding_does_not_move_center() {
        let mzs_no_zeros = [522.0200, 522.0290, 522.0210, 522.0000, 521.9910, 522.0200, 522.0200, 522.0200, 522.0200];
        let intensities_no_zeros = [1E5, 4E3, 8E4, 9E4, 3E3, 5E5, 3E5, 1E5, 1E5];

        let mut mzs_zeros = mzs_no_zeros.to_vec();
        mzs_zeros.extend([0.0; 5]);
        let mut intensities_zeros = intensities_no_zeros.to_vec();
        intensities_zeros.extend([0.0; 5]);

        for measure in [CenterMeasure::Avg, CenterMeasure::Median] {
            for weighting in [Weighting::Linear, Weighting::Log10, Weighting::Sqrt] {
                let center = CenterFunction::new(measure, weighting);
                let a = center.calc_center(&mzs_no_zeros, &intensities_no_zeros).unwrap();
                let b = center.calc_center(&mzs_zeros, &intensities_zeros).unwrap();
                assert!((a - b).abs() < 1e-9, "{center}: {a} != {b}");
            }
        }
    }

    #[test]
    fn test_unweighted_median() {
        let center = CenterFunction::new(CenterMeasure::Median, Weighting::None);
        assert_eq!(center.calc_center(&[3.0, 1.0, 2.0], &[1.0, 1.0, 1.0]), Some(2.0));
        assert_eq!(center.calc_center(&[4.0, 1.0, 2.0, 3.0], &[1.0, 1.0, 1.0, 1.0]), Some(2.5));
    }

    #[test]
    fn test_weighted_median_follows_weight() {
        let center = CenterFunction::new(CenterMeasure::Median, Weighting::Linear);
        assert_eq!(center.calc_center(&[1.0, 2.0, 3.0], &[1.0, 1.0, 10.0]), Some(3.0));
        // equal weights behave like the plain median
        assert_eq!(center.calc_center(&[1.0, 2.0, 3.0, 4.0], &[5.0, 5.0, 5.0, 5.0]), Some(2.5));
    }

    #[test]
    fn test_all_zero_intensities_fall_back_to_unweighted() {
        let center = CenterFunction::default();
        assert_eq!(center.calc_center(&[1.0, 3.0], &[0.0, 0.0]), Some(2.0));
        assert_eq!(center.calc_center(&[], &[]), None);
    }

    #[test]
    fn test_center_stays_within_value_range() {
        let values = [100.0, 100.0004, 100.001];
        let intensities = [50.0, 10.0, 80.0];
        for measure in [CenterMeasure::Avg, CenterMeasure::Median] {
            for weighting in [Weighting::None, Weighting::Linear, Weighting::Log10, Weighting::Sqrt] {
                let c = CenterFunction::new(measure, weighting).calc_center(&values, &intensities).unwrap();
                assert!((100.0..=100.001).contains(&c));
            }
        }
    }
}
