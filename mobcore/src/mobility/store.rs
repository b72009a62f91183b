use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use itertools::izip;
use ordered_float::OrderedFloat;

use crate::data::point::MobilityDataPoint;
use crate::mobility::mobilogram::Mobilogram;

/// The set of mobilograms attached to one frame.
///
/// The set is only ever swapped as a whole. Readers take an `Arc` snapshot which stays valid
/// and unchanged across later rebuilds; the generation counter tells them a rebuild happened.
#[derive(Clone, Debug, Default)]
pub struct FrameMobilogramStore {
    mobilograms: Arc<Vec<Mobilogram>>,
    generation: u64,
}

impl FrameMobilogramStore {
    pub fn new() -> Self {
        FrameMobilogramStore::default()
    }

    /// Drops the previous set and installs `mobilograms` in its place.
    pub fn replace(&mut self, mobilograms: Vec<Mobilogram>) {
        self.mobilograms = Arc::new(mobilograms);
        self.generation += 1;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// O(1) snapshot of the current set.
    pub fn snapshot(&self) -> Arc<Vec<Mobilogram>> {
        Arc::clone(&self.mobilograms)
    }

    /// Number of times the set was replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.mobilograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mobilograms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mobilogram> {
        self.mobilograms.iter()
    }
}

/// A mobilogram with one entry per mobility scan of its frame, ordered by mobility.
/// Scans the mobilogram was not detected in carry zero intensity at the representative m/z.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMobilogram {
    pub representative_mz: f64,
    /// measured m/z of detected points
    pub mz: Vec<f64>,
    pub scan: Vec<i32>,
    pub mobility: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl DenseMobilogram {
    pub fn len(&self) -> usize {
        self.scan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scan.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MobilityDataPoint> + '_ {
        izip!(&self.mz, &self.scan, &self.mobility, &self.intensity)
            .map(|(mz, scan, mobility, intensity)| MobilityDataPoint::new(*mz, *intensity, *mobility, *scan))
    }
}

impl Display for DenseMobilogram {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let non_zero = self.intensity.iter().filter(|i| **i > 0.0).count();
        write!(f, "DenseMobilogram(mz: {:.4}, scans: {}, non zero: {})", self.representative_mz, self.scan.len(), non_zero)
    }
}

/// Aligns `mobilogram` to the scans of a frame given as `(scan_id, mobility)` pairs.
///
/// Every frame scan yields exactly one entry: the mobilogram's own point, or a zero-intensity
/// placeholder at the scan's mobility and the representative m/z. Points of scans unknown to
/// the frame are kept.
///
/// # Examples
///
/// ```
/// use mobcore::algorithm::center::CenterFunction;
/// use mobcore::data::point::MobilityDataPoint;
/// use mobcore::mobility::mobilogram::{MobilityType, MobilogramBuilder};
/// use mobcore::mobility::store::densify;
///
/// let mut builder = MobilogramBuilder::new(MobilityType::TimsInverseReducedMobility,
///     MobilityDataPoint::new(500.0, 10.0, 1.2, 1));
/// builder.try_add(MobilityDataPoint::new(500.0, 20.0, 1.0, 3));
/// let mobilogram = builder.finalize(&CenterFunction::default());
///
/// let dense = densify(&mobilogram, vec![(1, 1.2), (2, 1.1), (3, 1.0)]);
/// assert_eq!(dense.scan, vec![3, 2, 1]);
/// assert_eq!(dense.intensity, vec![20.0, 0.0, 10.0]);
/// assert_eq!(dense.mz, vec![500.0; 3]);
/// ```
pub fn densify<I>(mobilogram: &Mobilogram, scans: I) -> DenseMobilogram
where
    I: IntoIterator<Item = (i32, f64)>,
{
    let mz = mobilogram.mz();
    let mut aligned: BTreeMap<i32, MobilityDataPoint> = scans.into_iter()
        .map(|(scan_id, mobility)| (scan_id, MobilityDataPoint::zero(mz, mobility, scan_id)))
        .collect();

    for point in mobilogram.data_points() {
        aligned.insert(point.scan_id, *point);
    }

    let mut points: Vec<MobilityDataPoint> = aligned.into_values().collect();
    // stable, so equal mobilities stay in scan order
    points.sort_by_key(|p| OrderedFloat(p.mobility));

    DenseMobilogram {
        representative_mz: mz,
        mz: points.iter().map(|p| p.mz).collect(),
        scan: points.iter().map(|p| p.scan_id).collect(),
        mobility: points.iter().map(|p| p.mobility).collect(),
        intensity: points.iter().map(|p| p.intensity).collect(),
    }
}
