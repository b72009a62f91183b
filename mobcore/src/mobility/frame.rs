use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::point::{DataPoint, MobilityDataPoint};
use crate::data::range::ValueRange;
use crate::mobility::mobilogram::{Mobilogram, MobilityType};
use crate::mobility::store::{densify, DenseMobilogram, FrameMobilogramStore};

/// One mass spectrum of a frame, acquired at a single mobility value.
///
/// Holds the peak-picked mass lists by name. The raw profile points are kept by the data
/// source and fetched on demand.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MobilityScan {
    pub scan_id: i32,
    pub mobility: f64,
    #[serde(default)]
    pub mass_lists: BTreeMap<String, Vec<DataPoint>>,
}

impl MobilityScan {
    /// Creates a new `MobilityScan` without mass lists.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::point::DataPoint;
    /// use mobcore::mobility::frame::MobilityScan;
    ///
    /// let scan = MobilityScan::new(42, 1.05)
    ///     .with_mass_list("centroid", vec![DataPoint::new(500.1, 10.0)]);
    /// assert_eq!(scan.mass_list("centroid").unwrap().len(), 1);
    /// assert!(scan.mass_list("profile").is_none());
    /// ```
    pub fn new(scan_id: i32, mobility: f64) -> Self {
        MobilityScan { scan_id, mobility, mass_lists: BTreeMap::new() }
    }

    pub fn with_mass_list(mut self, name: &str, points: Vec<DataPoint>) -> Self {
        self.add_mass_list(name, points);
        self
    }

    pub fn add_mass_list(&mut self, name: &str, points: Vec<DataPoint>) {
        self.mass_lists.insert(name.to_string(), points);
    }

    pub fn mass_list(&self, name: &str) -> Option<&[DataPoint]> {
        self.mass_lists.get(name).map(|points| points.as_slice())
    }

    /// The points of a mass list tagged with this scan's mobility coordinate.
    pub fn mobility_points(&self, name: &str) -> Option<Vec<MobilityDataPoint>> {
        self.mass_list(name).map(|points| self.attach_mobility(points))
    }

    pub fn attach_mobility(&self, points: &[DataPoint]) -> Vec<MobilityDataPoint> {
        points.iter().map(|p| p.with_mobility(self.mobility, self.scan_id)).collect()
    }
}

/// One ion mobility acquisition cycle: the mobility scans plus the mobilograms built from them.
#[derive(Clone, Debug)]
pub struct Frame {
    pub frame_id: i32,
    pub retention_time: f64,
    pub ms_level: u8,
    pub mobility_type: MobilityType,
    scans: BTreeMap<i32, MobilityScan>,
    mobility_range: Option<ValueRange>,
    mobilograms: FrameMobilogramStore,
}

impl Frame {
    /// Creates a new, empty `Frame`.
    ///
    /// # Arguments
    ///
    /// * `frame_id` - index of the frame in its run.
    /// * `retention_time` - The retention time in seconds.
    /// * `ms_level` - 1 for precursor frames, 2 for fragment frames.
    /// * `mobility_type` - meaning of the mobility values of the scans.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::mobility::frame::{Frame, MobilityScan};
    /// use mobcore::mobility::mobilogram::MobilityType;
    ///
    /// let mut frame = Frame::new(1, 60.0, 1, MobilityType::TimsInverseReducedMobility);
    /// frame.add_mobility_scan(MobilityScan::new(1, 1.3));
    /// frame.add_mobility_scan(MobilityScan::new(2, 1.2));
    /// assert_eq!(frame.num_mobility_scans(), 2);
    /// assert_eq!(frame.mobility_range().unwrap().lower, 1.2);
    /// ```
    pub fn new(frame_id: i32, retention_time: f64, ms_level: u8, mobility_type: MobilityType) -> Self {
        Frame {
            frame_id,
            retention_time,
            ms_level,
            mobility_type,
            scans: BTreeMap::new(),
            mobility_range: None,
            mobilograms: FrameMobilogramStore::new(),
        }
    }

    /// Adds a scan and widens the frame's mobility range. A scan with the same id is replaced,
    /// the range never shrinks.
    pub fn add_mobility_scan(&mut self, scan: MobilityScan) {
        self.mobility_range = Some(match self.mobility_range {
            None => ValueRange::singleton(scan.mobility),
            Some(range) => range.span(scan.mobility),
        });
        if let Some(previous) = self.scans.insert(scan.scan_id, scan) {
            debug!("Frame {}: mobility scan {} replaced", self.frame_id, previous.scan_id);
        }
    }

    /// Scans ordered by scan id.
    pub fn mobility_scans(&self) -> impl Iterator<Item = &MobilityScan> {
        self.scans.values()
    }

    pub fn mobility_scan(&self, scan_id: i32) -> Option<&MobilityScan> {
        self.scans.get(&scan_id)
    }

    pub fn num_mobility_scans(&self) -> usize {
        self.scans.len()
    }

    pub fn scan_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.scans.keys().copied()
    }

    /// `(scan_id, mobility)` of every scan, ordered by scan id.
    pub fn mobilities(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.scans.values().map(|scan| (scan.scan_id, scan.mobility))
    }

    /// Range spanned by the mobilities of all scans added so far, `None` for a frame without scans.
    pub fn mobility_range(&self) -> Option<ValueRange> {
        self.mobility_range
    }

    /// Snapshot of the current mobilogram set, unaffected by later rebuilds.
    pub fn mobilograms(&self) -> Arc<Vec<Mobilogram>> {
        self.mobilograms.snapshot()
    }

    pub fn mobilogram_store(&self) -> &FrameMobilogramStore {
        &self.mobilograms
    }

    /// Replaces the whole mobilogram set of this frame.
    pub fn replace_mobilograms(&mut self, mobilograms: Vec<Mobilogram>) {
        self.mobilograms.replace(mobilograms);
    }

    pub fn clear_mobilograms(&mut self) {
        self.mobilograms.clear();
    }

    /// Aligns a mobilogram to all mobility scans of this frame.
    pub fn densify(&self, mobilogram: &Mobilogram) -> DenseMobilogram {
        densify(mobilogram, self.mobilities())
    }

    /// Every installed mobilogram aligned to all mobility scans, ordered like the mobilogram set.
    pub fn dense_mobilograms(&self) -> Vec<DenseMobilogram> {
        self.mobilograms.iter().map(|mobilogram| self.densify(mobilogram)).collect()
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let range = self.mobility_range.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        write!(f, "Frame(id: {}, ms level: {}, rt: {}, mobility scans: {}, mobility range: {}, mobilograms: {})",
               self.frame_id, self.ms_level, self.retention_time, self.scans.len(), range, self.mobilograms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::center::CenterFunction;
    use crate::mobility::mobilogram::MobilogramBuilder;

    fn frame_with_scans(mobilities: &[f64]) -> Frame {
        let mut frame = Frame::new(7, 12.5, 1, MobilityType::TimsInverseReducedMobility);
        for (i, mobility) in mobilities.iter().enumerate() {
            frame.add_mobility_scan(MobilityScan::new(i as i32 + 1, *mobility));
        }
        frame
    }

    #[test]
    fn test_mobility_range_expands_monotonically() {
        let mut frame = Frame::new(1, 0.0, 1, MobilityType::TimsInverseReducedMobility);
        assert!(frame.mobility_range().is_none());

        frame.add_mobility_scan(MobilityScan::new(10, 1.0));
        assert_eq!(frame.mobility_range(), Some(ValueRange::singleton(1.0)));

        frame.add_mobility_scan(MobilityScan::new(11, 0.8));
        frame.add_mobility_scan(MobilityScan::new(12, 0.9));
        assert_eq!(frame.mobility_range(), Some(ValueRange::new(0.8, 1.0)));

        // replacing scan 11 does not shrink the range
        frame.add_mobility_scan(MobilityScan::new(11, 0.95));
        assert_eq!(frame.num_mobility_scans(), 3);
        assert_eq!(frame.mobility_range(), Some(ValueRange::new(0.8, 1.0)));
    }

    #[test]
    fn test_mobility_points_carry_scan_coordinates() {
        let scan = MobilityScan::new(3, 0.97)
            .with_mass_list("centroid", vec![DataPoint::new(100.0, 1.0), DataPoint::new(200.0, 2.0)]);
        let points = scan.mobility_points("centroid").unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.scan_id == 3 && p.mobility == 0.97));
        assert!(scan.mobility_points("missing").is_none());
    }

    #[test]
    fn test_replace_and_densify() {
        let mut frame = frame_with_scans(&[1.4, 1.3, 1.2, 1.1, 1.0]);
        let mut builder = MobilogramBuilder::new(frame.mobility_type, MobilityDataPoint::new(300.0, 5.0, 1.4, 1));
        builder.try_add(MobilityDataPoint::new(300.0, 5.0, 1.2, 3));
        frame.replace_mobilograms(vec![builder.finalize(&CenterFunction::default())]);

        let dense = frame.dense_mobilograms();
        assert_eq!(dense.len(), 1);
        assert_eq!(dense[0].scan, vec![5, 4, 3, 2, 1]);
        assert_eq!(dense[0].intensity, vec![0.0, 0.0, 5.0, 0.0, 5.0]);

        let snapshot = frame.mobilograms();
        frame.clear_mobilograms();
        assert_eq!(snapshot.len(), 1);
        assert!(frame.mobilograms().is_empty());
        assert_eq!(frame.mobilogram_store().generation(), 2);
    }
}
