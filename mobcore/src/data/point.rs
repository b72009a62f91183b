use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// A single (m/z, intensity) pair of a mass list or raw spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPoint {
    pub mz: f64,
    pub intensity: f64,
}

impl DataPoint {
    /// Creates a new `DataPoint`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::point::DataPoint;
    ///
    /// let point = DataPoint::new(500.25, 1e4);
    /// assert_eq!(point.mz, 500.25);
    /// ```
    pub fn new(mz: f64, intensity: f64) -> Self {
        DataPoint { mz, intensity }
    }

    /// Attaches the mobility coordinate of the scan the point was measured in.
    pub fn with_mobility(&self, mobility: f64, scan_id: i32) -> MobilityDataPoint {
        MobilityDataPoint::new(self.mz, self.intensity, mobility, scan_id)
    }
}

impl Display for DataPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DataPoint(mz: {:.4}, intensity: {})", self.mz, self.intensity)
    }
}

/// A data point that knows the mobility scan it was measured in.
///
/// Two points are the same point for clustering purposes when they share `mz` and `scan_id`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct MobilityDataPoint {
    pub mz: f64,
    pub intensity: f64,
    pub mobility: f64,
    pub scan_id: i32,
}

impl MobilityDataPoint {
    /// Creates a new `MobilityDataPoint`.
    ///
    /// # Arguments
    ///
    /// * `mz` - The m/z value.
    /// * `intensity` - The intensity value.
    /// * `mobility` - The mobility value of the scan, e.g. an inverse reduced mobility.
    /// * `scan_id` - The number of the mobility scan within its frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::point::MobilityDataPoint;
    ///
    /// let point = MobilityDataPoint::new(500.25, 1e4, 0.95, 312);
    /// assert_eq!(point.scan_id, 312);
    /// ```
    pub fn new(mz: f64, intensity: f64, mobility: f64, scan_id: i32) -> Self {
        MobilityDataPoint { mz, intensity, mobility, scan_id }
    }

    /// A placeholder point carrying no signal, used to fill scans a trace was not detected in.
    pub fn zero(mz: f64, mobility: f64, scan_id: i32) -> Self {
        MobilityDataPoint { mz, intensity: 0.0, mobility, scan_id }
    }

    pub fn data_point(&self) -> DataPoint {
        DataPoint::new(self.mz, self.intensity)
    }
}

impl Display for MobilityDataPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MobilityDataPoint(mz: {:.4}, intensity: {}, mobility: {:.4}, scan: {})",
               self.mz, self.intensity, self.mobility, self.scan_id)
    }
}
