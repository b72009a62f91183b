use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use mobcore::data::point::DataPoint;

/// Errors that may occur when reading the raw points of a mobility scan.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No raw points stored for frame {frame_id}, scan {scan_id}")]
    ScanNotFound { frame_id: i32, scan_id: i32 },
    #[error("I/O error occurred while reading raw points: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
}

/// Access to the raw, not peak picked, points of the mobility scans of a dataset.
pub trait PointStore {
    fn data_points(&self, frame_id: i32, scan_id: i32) -> Result<Vec<DataPoint>, StorageError>;
}

impl<T: PointStore + ?Sized> PointStore for &T {
    fn data_points(&self, frame_id: i32, scan_id: i32) -> Result<Vec<DataPoint>, StorageError> {
        (**self).data_points(frame_id, scan_id)
    }
}

impl<T: PointStore + ?Sized> PointStore for Arc<T> {
    fn data_points(&self, frame_id: i32, scan_id: i32) -> Result<Vec<DataPoint>, StorageError> {
        (**self).data_points(frame_id, scan_id)
    }
}

/// Raw points held in memory, keyed by `(frame_id, scan_id)`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPointStore {
    spectra: HashMap<(i32, i32), Vec<DataPoint>>,
}

impl InMemoryPointStore {
    pub fn new() -> Self {
        InMemoryPointStore::default()
    }

    /// Stores the raw points of a scan, replacing points stored before.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::data::point::DataPoint;
    /// use mobdf::data::store::{InMemoryPointStore, PointStore};
    ///
    /// let mut store = InMemoryPointStore::new();
    /// store.insert(1, 7, vec![DataPoint::new(300.0, 12.0)]);
    /// assert_eq!(store.data_points(1, 7).unwrap().len(), 1);
    /// assert!(store.data_points(1, 8).is_err());
    /// ```
    pub fn insert(&mut self, frame_id: i32, scan_id: i32, points: Vec<DataPoint>) {
        self.spectra.insert((frame_id, scan_id), points);
    }

    /// number of stored spectra
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

impl PointStore for InMemoryPointStore {
    fn data_points(&self, frame_id: i32, scan_id: i32) -> Result<Vec<DataPoint>, StorageError> {
        self.spectra.get(&(frame_id, scan_id))
            .cloned()
            .ok_or(StorageError::ScanNotFound { frame_id, scan_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl PointStore for BrokenStore {
        fn data_points(&self, _frame_id: i32, _scan_id: i32) -> Result<Vec<DataPoint>, StorageError> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated blob").into())
        }
    }

    #[test]
    fn test_missing_scan() {
        let store = InMemoryPointStore::new();
        match store.data_points(2, 3) {
            Err(StorageError::ScanNotFound { frame_id, scan_id }) => assert_eq!((frame_id, scan_id), (2, 3)),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_io_error_converts() {
        let store: Arc<dyn PointStore> = Arc::new(BrokenStore);
        let error = store.data_points(1, 1).unwrap_err();
        assert!(matches!(error, StorageError::IOError(_)));
        assert!(error.to_string().contains("truncated blob"));
    }
}
