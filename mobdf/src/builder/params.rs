use std::fmt;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mobcore::algorithm::center::CenterFunction;
use mobcore::algorithm::cluster::{ClusterParams, SeedOrder};
use mobcore::data::tolerance::MzTolerance;
use mobcore::mobility::selection::ScanSelection;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read the parameter file: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
    #[error("Malformed parameters: {0}")]
    JsonError(
        #[from]
        #[source]
        serde_json::Error,
    ),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Parameters of a mobilogram build. Missing fields in a parameter file take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilogramBuilderParams {
    pub mz_tolerance: MzTolerance,
    /// name of the mass list the mobilograms are built from
    pub mass_list: String,
    /// mobilograms need more than this many points
    pub min_points: usize,
    /// back-fill the mobilograms from the raw points of the frame
    pub add_raw_points: bool,
    pub scan_selection: ScanSelection,
    pub seed_order: SeedOrder,
    pub center_function: CenterFunction,
}

impl Default for MobilogramBuilderParams {
    fn default() -> Self {
        MobilogramBuilderParams {
            mz_tolerance: MzTolerance::default(),
            mass_list: "centroid".to_string(),
            min_points: 5,
            add_raw_points: false,
            scan_selection: ScanSelection::all(),
            seed_order: SeedOrder::default(),
            center_function: CenterFunction::default(),
        }
    }
}

impl MobilogramBuilderParams {
    /// Parses parameters from JSON and validates them.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobdf::builder::params::MobilogramBuilderParams;
    ///
    /// let params = MobilogramBuilderParams::from_json_str(r#"{"min_points": 2, "add_raw_points": true}"#).unwrap();
    /// assert_eq!(params.min_points, 2);
    /// assert_eq!(params.mass_list, "centroid");
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: MobilogramBuilderParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mass_list.trim().is_empty() {
            return Err(ConfigError::InvalidParameter { name: "mass_list", reason: "must not be empty".to_string() });
        }
        let MzTolerance { absolute, ppm } = self.mz_tolerance;
        if !absolute.is_finite() || !ppm.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "mz_tolerance",
                reason: format!("expected finite values, got {} Da and {} ppm", absolute, ppm),
            });
        }
        Ok(())
    }

    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            min_points: self.min_points,
            seed_order: self.seed_order,
            center_function: self.center_function,
        }
    }
}

impl Display for MobilogramBuilderParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MobilogramBuilderParams(mass list: {}, mz tolerance: {}, min points: {}, raw points: {}, seed order: {:?})",
               self.mass_list, self.mz_tolerance, self.min_points, self.add_raw_points, self.seed_order)
    }
}

/// Reads and validates a JSON parameter file.
pub fn read_params<P: AsRef<Path>>(path: P) -> Result<MobilogramBuilderParams, ConfigError> {
    let json = fs::read_to_string(path)?;
    MobilogramBuilderParams::from_json_str(&json)
}
