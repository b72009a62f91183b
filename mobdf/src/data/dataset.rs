use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mobcore::data::point::DataPoint;
use mobcore::mobility::frame::{Frame, MobilityScan};
use mobcore::mobility::mobilogram::MobilityType;

use crate::data::store::InMemoryPointStore;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Could not read the dataset: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
    #[error("Malformed dataset: {0}")]
    JsonError(
        #[from]
        #[source]
        serde_json::Error,
    ),
    #[error("Frame {0} occurs more than once")]
    DuplicateFrame(i32),
}

fn default_ms_level() -> u8 {
    1
}

/// A mobility scan as stored in a dataset file, with its optional raw points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanRecord {
    #[serde(flatten)]
    pub scan: MobilityScan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<DataPoint>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_id: i32,
    pub retention_time: f64,
    #[serde(default = "default_ms_level")]
    pub ms_level: u8,
    #[serde(default)]
    pub mobility_type: MobilityType,
    pub scans: Vec<ScanRecord>,
}

/// Top level layout of a JSON dataset file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub frames: Vec<FrameRecord>,
}

/// Frames together with the raw points of their scans.
#[derive(Debug, Default)]
pub struct Dataset {
    pub frames: Vec<Frame>,
    pub store: InMemoryPointStore,
}

impl Dataset {
    /// Splits the records into frames and a point store holding the raw points.
    pub fn from_record(record: DatasetRecord) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        let mut store = InMemoryPointStore::new();
        let mut frames = Vec::with_capacity(record.frames.len());

        for frame_record in record.frames {
            if !seen.insert(frame_record.frame_id) {
                return Err(DatasetError::DuplicateFrame(frame_record.frame_id));
            }
            let mut frame = Frame::new(frame_record.frame_id, frame_record.retention_time,
                                       frame_record.ms_level, frame_record.mobility_type);
            for ScanRecord { scan, raw } in frame_record.scans {
                if let Some(points) = raw {
                    store.insert(frame.frame_id, scan.scan_id, points);
                }
                frame.add_mobility_scan(scan);
            }
            frames.push(frame);
        }

        Ok(Dataset { frames, store })
    }

    /// Parses a dataset from a JSON string.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobdf::data::dataset::Dataset;
    ///
    /// let json = r#"{"frames": [{"frame_id": 1, "retention_time": 30.5, "scans": [
    ///     {"scan_id": 1, "mobility": 1.1, "mass_lists": {"centroid": [{"mz": 300.0, "intensity": 5.0}]}}
    /// ]}]}"#;
    /// let dataset = Dataset::from_json_str(json).unwrap();
    /// assert_eq!(dataset.frames[0].num_mobility_scans(), 1);
    /// assert!(dataset.store.is_empty());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let record: DatasetRecord = serde_json::from_str(json)?;
        Dataset::from_record(record)
    }
}

/// Reads a JSON dataset file.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let record: DatasetRecord = serde_json::from_reader(reader)?;
    let dataset = Dataset::from_record(record)?;
    info!("Read {} frames and {} raw spectra from {}", dataset.frames.len(), dataset.store.len(), path.as_ref().display());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use crate::data::store::PointStore;

    const DATASET: &str = r#"{
        "frames": [
            {
                "frame_id": 4,
                "retention_time": 61.2,
                "ms_level": 2,
                "mobility_type": "DriftTube",
                "scans": [
                    {"scan_id": 2, "mobility": 20.5,
                     "mass_lists": {"centroid": [{"mz": 400.2, "intensity": 8.0}]},
                     "raw": [{"mz": 400.19, "intensity": 2.0}, {"mz": 400.2, "intensity": 8.0}]},
                    {"scan_id": 1, "mobility": 20.0}
                ]
            },
            {"frame_id": 5, "retention_time": 62.0, "scans": []}
        ]
    }"#;

    #[test]
    fn test_parse() {
        let dataset = Dataset::from_json_str(DATASET).unwrap();
        assert_eq!(dataset.frames.len(), 2);

        let frame = &dataset.frames[0];
        assert_eq!(frame.ms_level, 2);
        assert_eq!(frame.mobility_type, MobilityType::DriftTube);
        assert_eq!(frame.scan_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert!(frame.mobility_scan(1).unwrap().mass_lists.is_empty());

        assert_eq!(dataset.frames[1].ms_level, 1);
        assert_eq!(dataset.store.len(), 1);
        assert_eq!(dataset.store.data_points(4, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_frame() {
        let json = r#"{"frames": [
            {"frame_id": 1, "retention_time": 1.0, "scans": []},
            {"frame_id": 1, "retention_time": 2.0, "scans": []}
        ]}"#;
        assert!(matches!(Dataset::from_json_str(json), Err(DatasetError::DuplicateFrame(1))));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();

        let dataset = read_dataset(file.path()).unwrap();
        assert_eq!(dataset.frames.len(), 2);

        assert!(matches!(read_dataset(file.path().with_extension("missing")), Err(DatasetError::IOError(_))));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(Dataset::from_json_str("{\"frames\": 3}"), Err(DatasetError::JsonError(_))));
    }
}
