use std::collections::BTreeMap;
use log::debug;
use ordered_float::OrderedFloat;

use crate::algorithm::cancel::{CancellationFlag, Canceled};
use crate::data::point::MobilityDataPoint;
use crate::data::tolerance::MzToleranceLike;
use crate::mobility::mobilogram::Mobilogram;

/// Recovers points the peak picking missed from the raw spectra of a frame.
///
/// For every mobilogram the raw points inside the tolerance window around its anchor m/z (the
/// m/z it was finalized with) are located by binary search. Scans the mobilogram does not
/// contain yet receive the candidate closest to the anchor, then the mobilogram is recomputed.
/// The anchor does not move, so a second call with the same raw points adds nothing.
///
/// `raw_points` are sorted by m/z if they are not already. The cancellation flag is polled
/// between mobilograms; after a cancellation the mobilograms may be partially filled and
/// should be dropped by the caller.
///
/// # Returns
///
/// * the number of points added over all mobilograms
pub fn backfill<T, C>(
    mobilograms: &mut [Mobilogram],
    mut raw_points: Vec<MobilityDataPoint>,
    tolerance: &T,
    cancel: &C,
) -> Result<usize, Canceled>
where
    T: MzToleranceLike + ?Sized,
    C: CancellationFlag + ?Sized,
{
    if !raw_points.windows(2).all(|w| w[0].mz <= w[1].mz) {
        raw_points.sort_by_key(|p| OrderedFloat(p.mz));
    }

    let mut added = 0;
    for mobilogram in mobilograms.iter_mut() {
        if cancel.is_canceled() {
            return Err(Canceled);
        }
        let count = fill_window(mobilogram, &raw_points, tolerance);
        if count > 0 {
            mobilogram.calc();
            added += count;
        }
    }

    debug!("Back-fill added {} raw points to {} mobilograms", added, mobilograms.len());

    Ok(added)
}

// appends the closest candidate of every absent scan, returns the number of appended points
fn fill_window<T>(mobilogram: &mut Mobilogram, raw_points: &[MobilityDataPoint], tolerance: &T) -> usize
where
    T: MzToleranceLike + ?Sized,
{
    let mz = mobilogram.anchor_mz();
    let window = tolerance.tolerance_range(mz);

    let start = raw_points.partition_point(|p| p.mz < window.lower);
    if start == raw_points.len() {
        return 0;
    }
    let end = start + raw_points[start..].partition_point(|p| p.mz <= window.upper);

    let mut closest: BTreeMap<i32, MobilityDataPoint> = BTreeMap::new();
    for candidate in raw_points[start..end].iter().filter(|p| !mobilogram.contains_scan(p.scan_id)) {
        closest.entry(candidate.scan_id)
            .and_modify(|best| {
                if (candidate.mz - mz).abs() < (best.mz - mz).abs() {
                    *best = *candidate;
                }
            })
            .or_insert(*candidate);
    }

    closest.into_values().filter(|p| mobilogram.append(*p)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use crate::algorithm::cancel::NeverCancel;
    use crate::algorithm::center::CenterFunction;
    use crate::data::tolerance::MzTolerance;
    use crate::mobility::mobilogram::{MobilityType, MobilogramBuilder};

    fn raw(mz: f64, intensity: f64, scan: i32) -> MobilityDataPoint {
        MobilityDataPoint::new(mz, intensity, 1.2 - scan as f64 * 0.01, scan)
    }

    fn mobilogram(points: &[MobilityDataPoint]) -> Mobilogram {
        let mut builder = MobilogramBuilder::new(MobilityType::TimsInverseReducedMobility, points[0]);
        for p in &points[1..] {
            builder.try_add(*p);
        }
        builder.finalize(&CenterFunction::default())
    }

    fn frame_raw_points() -> Vec<MobilityDataPoint> {
        vec![
            raw(499.9995, 20.0, 4),
            raw(500.0002, 90.0, 1),
            raw(500.001, 40.0, 2),
            raw(500.0015, 25.0, 4),
            raw(500.003, 10.0, 2),
            raw(510.0, 100.0, 5),
        ]
    }

    #[test]
    fn test_fills_absent_scans_with_closest_candidate() {
        let mut mobilograms = vec![mobilogram(&[raw(500.0, 100.0, 1), raw(500.0, 100.0, 3)])];
        let tolerance = MzTolerance::absolute(0.002);

        let added = backfill(&mut mobilograms, frame_raw_points(), &tolerance, &NeverCancel).unwrap();

        assert_eq!(added, 2);
        let mobilogram = &mobilograms[0];
        assert_eq!(mobilogram.scan_ids().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        // scan 1 was present and keeps its own point
        assert_eq!(mobilogram.get(1).unwrap().mz, 500.0);
        assert_eq!(mobilogram.get(2).unwrap().mz, 500.001);
        assert_eq!(mobilogram.get(4).unwrap().mz, 499.9995);
        assert!((mobilogram.total_intensity() - 260.0).abs() < 1e-9);
    }

    #[test_log::test]
    fn test_backfill_is_idempotent() {
        let mut mobilograms = vec![
            mobilogram(&[raw(500.0, 100.0, 1), raw(500.0, 100.0, 3)]),
            mobilogram(&[raw(510.0005, 80.0, 4)]),
        ];
        let tolerance = MzTolerance::absolute(0.002);

        backfill(&mut mobilograms, frame_raw_points(), &tolerance, &NeverCancel).unwrap();
        let first: Vec<Vec<MobilityDataPoint>> = mobilograms.iter()
            .map(|m| m.data_points().copied().collect())
            .collect();

        let added = backfill(&mut mobilograms, frame_raw_points(), &tolerance, &NeverCancel).unwrap();
        let second: Vec<Vec<MobilityDataPoint>> = mobilograms.iter()
            .map(|m| m.data_points().copied().collect())
            .collect();

        assert_eq!(added, 0);
        assert_eq!(first, second);
        assert_eq!(mobilograms[1].scan_ids().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn test_window_stays_at_anchor() {
        // raw points of absent scans about 1.5 tolerances apart
        let tolerance = MzTolerance::absolute(0.002);
        let chain: Vec<MobilityDataPoint> = (0..6)
            .map(|i| raw(500.0019 + 0.0016 * i as f64, 1000.0, i + 2))
            .collect();
        let mut mobilograms = vec![mobilogram(&[raw(500.0, 10.0, 1)])];

        let added = backfill(&mut mobilograms, chain.clone(), &tolerance, &NeverCancel).unwrap();

        let mobilogram = &mobilograms[0];
        assert_eq!(added, 1);
        assert_eq!(mobilogram.scan_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert!(mobilogram.data_points().all(|p| tolerance.within_tolerance(500.0, p.mz)));
        assert_eq!(mobilogram.anchor_mz(), 500.0);
        // the representative m/z moved towards the raw point, the window did not
        assert!(mobilogram.mz() > 500.0015);

        assert_eq!(backfill(&mut mobilograms, chain, &tolerance, &NeverCancel).unwrap(), 0);
        assert_eq!(mobilograms[0].len(), 2);
    }

    #[test]
    fn test_mz_outside_raw_points() {
        let tolerance = MzTolerance::absolute(0.002);

        let mut below = vec![mobilogram(&[raw(100.0, 10.0, 1)])];
        assert_eq!(backfill(&mut below, frame_raw_points(), &tolerance, &NeverCancel).unwrap(), 0);
        assert_eq!(below[0].len(), 1);

        let mut above = vec![mobilogram(&[raw(900.0, 10.0, 1)])];
        assert_eq!(backfill(&mut above, frame_raw_points(), &tolerance, &NeverCancel).unwrap(), 0);

        let mut nothing = vec![mobilogram(&[raw(500.0, 10.0, 1)])];
        assert_eq!(backfill(&mut nothing, Vec::new(), &tolerance, &NeverCancel).unwrap(), 0);
    }

    #[test]
    fn test_unsorted_raw_points() {
        let tolerance = MzTolerance::absolute(0.002);
        let mut sorted = vec![mobilogram(&[raw(500.0, 100.0, 1), raw(500.0, 100.0, 3)])];
        let mut shuffled = sorted.clone();

        let mut reversed = frame_raw_points();
        reversed.reverse();

        backfill(&mut sorted, frame_raw_points(), &tolerance, &NeverCancel).unwrap();
        backfill(&mut shuffled, reversed, &tolerance, &NeverCancel).unwrap();

        let a: Vec<_> = sorted[0].data_points().copied().collect();
        let b: Vec<_> = shuffled[0].data_points().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let tolerance = MzTolerance::absolute(0.5);
        let mut mobilograms = vec![mobilogram(&[raw(100.0, 10.0, 1)])];
        let points = vec![raw(99.5, 1.0, 2), raw(100.5, 1.0, 3), raw(100.75, 1.0, 4)];

        backfill(&mut mobilograms, points, &tolerance, &NeverCancel).unwrap();
        assert!(mobilograms[0].contains_scan(2));
        assert!(mobilograms[0].contains_scan(3));
        assert!(!mobilograms[0].contains_scan(4));
    }

    #[test]
    fn test_canceled() {
        let mut mobilograms = vec![mobilogram(&[raw(500.0, 100.0, 1)])];
        let result = backfill(&mut mobilograms, frame_raw_points(), &MzTolerance::absolute(0.002), &AtomicBool::new(true));
        assert_eq!(result, Err(Canceled));
        assert_eq!(mobilograms[0].len(), 1);
    }
}
