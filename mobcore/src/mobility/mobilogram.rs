use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::algorithm::center::CenterFunction;
use crate::data::point::MobilityDataPoint;
use crate::data::range::ValueRange;

/// The physical meaning of the mobility axis of a frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum MobilityType {
    /// Inverse reduced ion mobility 1/K0 of a trapped ion mobility device.
    #[default]
    TimsInverseReducedMobility,
    /// Drift time in ms.
    DriftTube,
    /// Drift time in ms.
    TravelingWave,
    None,
}

impl MobilityType {
    pub fn unit(&self) -> &'static str {
        match self {
            MobilityType::TimsInverseReducedMobility => "Vs/cm2",
            MobilityType::DriftTube | MobilityType::TravelingWave => "ms",
            MobilityType::None => "",
        }
    }
}

impl Display for MobilityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MobilityType::TimsInverseReducedMobility => write!(f, "TIMS"),
            MobilityType::DriftTube => write!(f, "DriftTube"),
            MobilityType::TravelingWave => write!(f, "TravelingWave"),
            MobilityType::None => write!(f, "None"),
        }
    }
}

/// A mobilogram under construction. Holds at most one point per mobility scan.
#[derive(Clone, Debug)]
pub struct MobilogramBuilder {
    mobility_type: MobilityType,
    seed: MobilityDataPoint,
    points: BTreeMap<i32, MobilityDataPoint>,
}

impl MobilogramBuilder {
    /// Starts a new mobilogram from its seed point.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::algorithm::center::CenterFunction;
    /// use mobcore::data::point::MobilityDataPoint;
    /// use mobcore::mobility::mobilogram::{MobilityType, MobilogramBuilder};
    ///
    /// let mut builder = MobilogramBuilder::new(MobilityType::TimsInverseReducedMobility,
    ///     MobilityDataPoint::new(500.0, 100.0, 1.01, 10));
    /// assert!(builder.try_add(MobilityDataPoint::new(500.001, 300.0, 1.02, 11)));
    /// // scan 11 is taken
    /// assert!(!builder.try_add(MobilityDataPoint::new(500.002, 50.0, 1.02, 11)));
    ///
    /// let mobilogram = builder.finalize(&CenterFunction::default());
    /// assert_eq!(mobilogram.len(), 2);
    /// assert_eq!(mobilogram.mobility(), 1.02);
    /// ```
    pub fn new(mobility_type: MobilityType, seed: MobilityDataPoint) -> Self {
        let mut points = BTreeMap::new();
        points.insert(seed.scan_id, seed);
        MobilogramBuilder { mobility_type, seed, points }
    }

    pub fn contains_scan(&self, scan_id: i32) -> bool {
        self.points.contains_key(&scan_id)
    }

    /// Adds the point unless its scan is already represented, returns whether it was added.
    pub fn try_add(&mut self, point: MobilityDataPoint) -> bool {
        if self.points.contains_key(&point.scan_id) {
            return false;
        }
        self.points.insert(point.scan_id, point);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Computes the derived statistics and freezes the point set.
    pub fn finalize(self, center_function: &CenterFunction) -> Mobilogram {
        let seed = self.seed;
        let mut mobilogram = Mobilogram {
            mobility_type: self.mobility_type,
            center_function: *center_function,
            points: self.points,
            seed,
            anchor_mz: seed.mz,
            mz: seed.mz,
            mobility: seed.mobility,
            mz_range: ValueRange::singleton(seed.mz),
            mobility_range: ValueRange::singleton(seed.mobility),
            total_intensity: 0.0,
            highest: seed,
        };
        mobilogram.calc();
        mobilogram.anchor_mz = mobilogram.mz;
        mobilogram
    }
}

/// A finalized trace of one species across the mobility scans of a frame.
///
/// Points are keyed by scan id, so there is never more than one point per scan. The derived
/// values are computed when the mobilogram is finalized and refreshed after back-fill. The
/// m/z at finalization is kept as the anchor of the back-fill window and never changes.
#[derive(Clone, Debug)]
pub struct Mobilogram {
    mobility_type: MobilityType,
    center_function: CenterFunction,
    points: BTreeMap<i32, MobilityDataPoint>,
    seed: MobilityDataPoint,
    anchor_mz: f64,
    mz: f64,
    mobility: f64,
    mz_range: ValueRange,
    mobility_range: ValueRange,
    total_intensity: f64,
    highest: MobilityDataPoint,
}

impl Mobilogram {
    /// Representative m/z, the center of all contained points.
    pub fn mz(&self) -> f64 {
        self.mz
    }

    /// The point the mobilogram was started from.
    pub fn seed(&self) -> &MobilityDataPoint {
        &self.seed
    }

    /// Representative m/z at finalization, unaffected by back-fill.
    pub fn anchor_mz(&self) -> f64 {
        self.anchor_mz
    }

    /// Mobility of the most intense point.
    pub fn mobility(&self) -> f64 {
        self.mobility
    }

    pub fn mz_range(&self) -> ValueRange {
        self.mz_range
    }

    pub fn mobility_range(&self) -> ValueRange {
        self.mobility_range
    }

    pub fn total_intensity(&self) -> f64 {
        self.total_intensity
    }

    pub fn highest_data_point(&self) -> &MobilityDataPoint {
        &self.highest
    }

    pub fn mobility_type(&self) -> MobilityType {
        self.mobility_type
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains_scan(&self, scan_id: i32) -> bool {
        self.points.contains_key(&scan_id)
    }

    pub fn get(&self, scan_id: i32) -> Option<&MobilityDataPoint> {
        self.points.get(&scan_id)
    }

    /// Points ordered by scan id.
    pub fn data_points(&self) -> impl Iterator<Item = &MobilityDataPoint> {
        self.points.values()
    }

    pub fn scan_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.keys().copied()
    }

    /// Appends a point of a scan not yet represented. Callers must `calc` afterwards.
    pub(crate) fn append(&mut self, point: MobilityDataPoint) -> bool {
        if self.points.contains_key(&point.scan_id) {
            return false;
        }
        self.points.insert(point.scan_id, point);
        true
    }

    pub(crate) fn calc(&mut self) {
        let (mzs, intensities): (Vec<f64>, Vec<f64>) = self.points.values()
            .map(|p| (p.mz, p.intensity))
            .unzip();

        // first maximum in scan order
        let highest = self.points.values()
            .fold(None::<&MobilityDataPoint>, |best, p| match best {
                Some(b) if OrderedFloat(b.intensity) >= OrderedFloat(p.intensity) => Some(b),
                _ => Some(p),
            });

        if let Some(highest) = highest {
            self.highest = *highest;
            self.mobility = highest.mobility;
        }
        self.mz = self.center_function.calc_center(&mzs, &intensities).unwrap_or(self.highest.mz);
        self.total_intensity = intensities.iter().sum();
        self.mz_range = ValueRange::enclosing(mzs).unwrap_or(ValueRange::singleton(self.mz));
        self.mobility_range = ValueRange::enclosing(self.points.values().map(|p| p.mobility))
            .unwrap_or(ValueRange::singleton(self.mobility));
    }
}

impl Display for Mobilogram {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Mobilogram(mz: {:.4}, mobility: {:.4} {}, mobility range: {}, scans: {}, total intensity: {:.1})",
               self.mz, self.mobility, self.mobility_type.unit(), self.mobility_range, self.points.len(), self.total_intensity)
    }
}
