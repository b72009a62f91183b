use std::cmp::Reverse;
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::algorithm::cancel::{CancellationFlag, Canceled};
use crate::algorithm::center::CenterFunction;
use crate::data::point::MobilityDataPoint;
use crate::data::tolerance::MzToleranceLike;
use crate::mobility::mobilogram::{Mobilogram, MobilityType, MobilogramBuilder};

/// Order in which points are picked as mobilogram seeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeedOrder {
    /// Least intense point first.
    #[default]
    Ascending,
    /// Most intense point first.
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// A mobilogram is kept only if it holds strictly more points than this.
    pub min_points: usize,
    pub seed_order: SeedOrder,
    pub center_function: CenterFunction,
}

impl Default for ClusterParams {
    fn default() -> Self {
        ClusterParams {
            min_points: 5,
            seed_order: SeedOrder::default(),
            center_function: CenterFunction::default(),
        }
    }
}

/// Sorts points by intensity in seed order. The sort is stable, equal intensities keep their input order.
pub fn sort_by_seed_order(points: &mut [MobilityDataPoint], seed_order: SeedOrder) {
    match seed_order {
        SeedOrder::Ascending => points.sort_by_key(|p| OrderedFloat(p.intensity)),
        SeedOrder::Descending => points.sort_by_key(|p| Reverse(OrderedFloat(p.intensity))),
    }
}

/// Greedily groups the points of one frame into mobilograms.
///
/// Points are visited in seed order. The first unused point seeds a mobilogram, which then
/// takes every later unused point within `tolerance` of the seed m/z whose scan it does not
/// contain yet. Mobilograms with `min_points` or fewer points are dropped together with their
/// points. The result is sorted by m/z.
///
/// The cancellation flag is polled before every seed; a raised flag yields `Err(Canceled)`.
///
/// # Examples
///
/// ```
/// use mobcore::algorithm::cancel::NeverCancel;
/// use mobcore::algorithm::cluster::{cluster_mobilograms, ClusterParams};
/// use mobcore::data::point::MobilityDataPoint;
/// use mobcore::data::tolerance::MzTolerance;
/// use mobcore::mobility::mobilogram::MobilityType;
///
/// let points = vec![
///     MobilityDataPoint::new(100.000, 50.0, 1.00, 1),
///     MobilityDataPoint::new(100.001, 80.0, 0.99, 2),
///     MobilityDataPoint::new(200.000, 30.0, 1.00, 1),
/// ];
/// let params = ClusterParams { min_points: 0, ..Default::default() };
/// let mobilograms = cluster_mobilograms(points, MobilityType::TimsInverseReducedMobility,
///     &MzTolerance::absolute(0.002), &params, &NeverCancel).unwrap();
/// assert_eq!(mobilograms.len(), 2);
/// assert_eq!(mobilograms[0].len(), 2);
/// ```
pub fn cluster_mobilograms<T, C>(
    mut points: Vec<MobilityDataPoint>,
    mobility_type: MobilityType,
    tolerance: &T,
    params: &ClusterParams,
    cancel: &C,
) -> Result<Vec<Mobilogram>, Canceled>
where
    T: MzToleranceLike + ?Sized,
    C: CancellationFlag + ?Sized,
{
    if points.is_empty() {
        return Ok(Vec::new());
    }

    sort_by_seed_order(&mut points, params.seed_order);

    let mut used = vec![false; points.len()];
    let mut mobilograms = Vec::new();
    let mut discarded = 0usize;

    for seed_index in 0..points.len() {
        if used[seed_index] {
            continue;
        }
        if cancel.is_canceled() {
            return Err(Canceled);
        }

        let seed = points[seed_index];
        used[seed_index] = true;
        let mut builder = MobilogramBuilder::new(mobility_type, seed);

        for index in seed_index + 1..points.len() {
            if used[index] {
                continue;
            }
            let candidate = points[index];
            if tolerance.within_tolerance(seed.mz, candidate.mz) && builder.try_add(candidate) {
                used[index] = true;
            }
        }

        if builder.len() > params.min_points {
            mobilograms.push(builder.finalize(&params.center_function));
        } else {
            discarded += 1;
        }
    }

    mobilograms.sort_by_key(|m| OrderedFloat(m.mz()));

    debug!("Clustered {} points into {} mobilograms, {} below the minimum size discarded",
        points.len(), mobilograms.len(), discarded);

    Ok(mobilograms)
}

/// Number of mobilogram pairs whose m/z ranges overlap.
pub fn count_mz_overlaps(mobilograms: &[Mobilogram]) -> usize {
    use itertools::Itertools;

    mobilograms.iter()
        .tuple_combinations()
        .filter(|(a, b)| a.mz_range().is_connected(&b.mz_range()))
        .count()
}
