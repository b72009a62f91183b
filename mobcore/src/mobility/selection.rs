use serde::{Deserialize, Serialize};

use crate::data::range::ValueRange;
use crate::mobility::frame::{Frame, MobilityScan};

/// Decides which frames and which of their mobility scans take part in a computation.
pub trait ScanPredicate {
    fn matches_frame(&self, frame: &Frame) -> bool;
    fn matches_scan(&self, scan: &MobilityScan) -> bool;
}

/// Selection by id, retention time, ms level and mobility. Unset criteria match everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSelection {
    /// inclusive frame id bounds
    pub frame_id_range: Option<(i32, i32)>,
    pub retention_time_range: Option<ValueRange>,
    pub ms_level: Option<u8>,
    /// inclusive scan id bounds
    pub scan_id_range: Option<(i32, i32)>,
    pub mobility_range: Option<ValueRange>,
}

impl ScanSelection {
    /// A selection accepting every frame and scan.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::mobility::frame::MobilityScan;
    /// use mobcore::mobility::selection::{ScanPredicate, ScanSelection};
    ///
    /// let selection = ScanSelection::all().with_scan_id_range(10, 20);
    /// assert!(selection.matches_scan(&MobilityScan::new(15, 1.0)));
    /// assert!(!selection.matches_scan(&MobilityScan::new(21, 1.0)));
    /// ```
    pub fn all() -> Self {
        ScanSelection::default()
    }

    pub fn with_frame_id_range(mut self, first: i32, last: i32) -> Self {
        self.frame_id_range = Some((first.min(last), first.max(last)));
        self
    }

    pub fn with_retention_time_range(mut self, range: ValueRange) -> Self {
        self.retention_time_range = Some(range);
        self
    }

    pub fn with_ms_level(mut self, ms_level: u8) -> Self {
        self.ms_level = Some(ms_level);
        self
    }

    pub fn with_scan_id_range(mut self, first: i32, last: i32) -> Self {
        self.scan_id_range = Some((first.min(last), first.max(last)));
        self
    }

    pub fn with_mobility_range(mut self, range: ValueRange) -> Self {
        self.mobility_range = Some(range);
        self
    }
}

impl ScanPredicate for ScanSelection {
    fn matches_frame(&self, frame: &Frame) -> bool {
        if let Some((first, last)) = self.frame_id_range {
            if frame.frame_id < first || frame.frame_id > last {
                return false;
            }
        }
        if let Some(range) = &self.retention_time_range {
            if !range.contains(frame.retention_time) {
                return false;
            }
        }
        if let Some(ms_level) = self.ms_level {
            if frame.ms_level != ms_level {
                return false;
            }
        }
        true
    }

    fn matches_scan(&self, scan: &MobilityScan) -> bool {
        if let Some((first, last)) = self.scan_id_range {
            if scan.scan_id < first || scan.scan_id > last {
                return false;
            }
        }
        match &self.mobility_range {
            Some(range) => range.contains(scan.mobility),
            None => true,
        }
    }
}

impl<T: ScanPredicate + ?Sized> ScanPredicate for &T {
    fn matches_frame(&self, frame: &Frame) -> bool {
        (**self).matches_frame(frame)
    }

    fn matches_scan(&self, scan: &MobilityScan) -> bool {
        (**self).matches_scan(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobility::mobilogram::MobilityType;

    #[test]
    fn test_default_selects_everything() {
        let selection = ScanSelection::all();
        let frame = Frame::new(3, 100.0, 2, MobilityType::TimsInverseReducedMobility);
        assert!(selection.matches_frame(&frame));
        assert!(selection.matches_scan(&MobilityScan::new(1, 0.6)));
    }

    #[test]
    fn test_frame_criteria() {
        let selection = ScanSelection::all()
            .with_frame_id_range(5, 1)
            .with_retention_time_range(ValueRange::new(10.0, 20.0))
            .with_ms_level(1);

        assert!(selection.matches_frame(&Frame::new(3, 15.0, 1, MobilityType::TimsInverseReducedMobility)));
        assert!(!selection.matches_frame(&Frame::new(6, 15.0, 1, MobilityType::TimsInverseReducedMobility)));
        assert!(!selection.matches_frame(&Frame::new(3, 25.0, 1, MobilityType::TimsInverseReducedMobility)));
        assert!(!selection.matches_frame(&Frame::new(3, 15.0, 2, MobilityType::TimsInverseReducedMobility)));
    }

    #[test]
    fn test_mobility_criterion() {
        let selection = ScanSelection::all().with_mobility_range(ValueRange::new(0.8, 1.2));
        assert!(selection.matches_scan(&MobilityScan::new(1, 0.8)));
        assert!(!selection.matches_scan(&MobilityScan::new(1, 1.25)));
    }
}
