use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

use mobcore::algorithm::backfill::backfill;
use mobcore::algorithm::cancel::{CancellationFlag, Canceled};
use mobcore::algorithm::cluster::{cluster_mobilograms, count_mz_overlaps};
use mobcore::data::point::MobilityDataPoint;
use mobcore::mobility::frame::{Frame, MobilityScan};
use mobcore::mobility::mobilogram::{Mobilogram, MobilityType};
use mobcore::mobility::selection::ScanPredicate;

use crate::builder::params::MobilogramBuilderParams;
use crate::builder::progress::TaskProgress;
use crate::data::store::{PointStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Completed,
    Canceled,
}

/// A mobility scan whose raw points could not be read. The scan was left out of the back-fill.
#[derive(Debug)]
pub struct ScanWarning {
    pub scan_id: i32,
    pub error: StorageError,
}

impl Display for ScanWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "scan {}: {}", self.scan_id, self.error)
    }
}

#[derive(Debug)]
pub struct FrameReport {
    pub frame_id: i32,
    pub num_mobilograms: usize,
    /// raw points added by the back-fill
    pub num_backfilled: usize,
    /// pairs of mobilograms with overlapping m/z ranges
    pub overlaps: usize,
    pub warnings: Vec<ScanWarning>,
}

impl Display for FrameReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FrameReport(frame: {}, mobilograms: {}, back-filled points: {}, overlaps: {}, warnings: {})",
               self.frame_id, self.num_mobilograms, self.num_backfilled, self.overlaps, self.warnings.len())
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub status: BuildStatus,
    /// reports of the frames that received a new mobilogram set, in processing order
    pub frames: Vec<FrameReport>,
    /// frames rejected by the scan selection
    pub skipped_frames: usize,
}

impl BuildReport {
    pub fn is_completed(&self) -> bool {
        self.status == BuildStatus::Completed
    }

    pub fn num_mobilograms(&self) -> usize {
        self.frames.iter().map(|frame| frame.num_mobilograms).sum()
    }

    pub fn num_warnings(&self) -> usize {
        self.frames.iter().map(|frame| frame.warnings.len()).sum()
    }

    /// Combines the reports of independent runs. The result is canceled if any run was.
    pub fn merge(reports: Vec<BuildReport>) -> BuildReport {
        let mut merged = BuildReport { status: BuildStatus::Completed, frames: Vec::new(), skipped_frames: 0 };
        for report in reports {
            if report.status == BuildStatus::Canceled {
                merged.status = BuildStatus::Canceled;
            }
            merged.skipped_frames += report.skipped_frames;
            merged.frames.extend(report.frames);
        }
        merged
    }
}

impl Display for BuildReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BuildReport(status: {:?}, frames: {}, skipped: {}, mobilograms: {}, warnings: {})",
               self.status, self.frames.len(), self.skipped_frames, self.num_mobilograms(), self.num_warnings())
    }
}

/// Builds the mobilograms of a set of frames, one frame after the other.
pub struct MobilogramBuilderTask {
    params: MobilogramBuilderParams,
    progress: Arc<TaskProgress>,
}

impl MobilogramBuilderTask {
    pub fn new(params: MobilogramBuilderParams) -> Self {
        MobilogramBuilderTask { params, progress: Arc::new(TaskProgress::new()) }
    }

    pub fn params(&self) -> &MobilogramBuilderParams {
        &self.params
    }

    /// Handle for observing the progress while `run` executes on another thread.
    pub fn progress(&self) -> Arc<TaskProgress> {
        Arc::clone(&self.progress)
    }

    /// Replaces the mobilogram set of every frame accepted by the scan selection.
    ///
    /// Frames rejected by the selection are not touched. The cancellation flag is checked before
    /// every frame and while clustering and back-filling; the frame being processed when the flag
    /// is raised keeps its previous mobilograms.
    ///
    /// # Arguments
    ///
    /// * `frames` - frames to build the mobilograms for.
    /// * `store` - source of the raw points, only read if back-fill is enabled.
    /// * `cancel` - raised by the host to stop the build.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobcore::algorithm::cancel::NeverCancel;
    /// use mobcore::data::point::DataPoint;
    /// use mobcore::mobility::frame::{Frame, MobilityScan};
    /// use mobcore::mobility::mobilogram::MobilityType;
    /// use mobdf::builder::params::MobilogramBuilderParams;
    /// use mobdf::builder::task::{BuildStatus, MobilogramBuilderTask};
    /// use mobdf::data::store::InMemoryPointStore;
    ///
    /// let mut frame = Frame::new(1, 10.0, 1, MobilityType::TimsInverseReducedMobility);
    /// for scan_id in 1..=3 {
    ///     frame.add_mobility_scan(MobilityScan::new(scan_id, 1.0 - scan_id as f64 * 0.01)
    ///         .with_mass_list("centroid", vec![DataPoint::new(622.03, 100.0)]));
    /// }
    /// let mut frames = vec![frame];
    ///
    /// let task = MobilogramBuilderTask::new(MobilogramBuilderParams { min_points: 2, ..Default::default() });
    /// let report = task.run(&mut frames, &InMemoryPointStore::new(), &NeverCancel);
    ///
    /// assert_eq!(report.status, BuildStatus::Completed);
    /// assert_eq!(frames[0].mobilograms().len(), 1);
    /// assert_eq!(task.progress().finished_percentage(), 1.0);
    /// ```
    pub fn run<S, C>(&self, frames: &mut [Frame], store: &S, cancel: &C) -> BuildReport
    where
        S: PointStore + ?Sized,
        C: CancellationFlag + ?Sized,
    {
        self.start(frames);
        let report = self.process(frames, store, cancel);
        if report.is_completed() {
            info!("Finished building mobilograms, {}", self.progress);
        }
        report
    }

    /// Like [`run`](Self::run), but disjoint chunks of `frames` are processed on a pool of
    /// `num_threads` threads.
    ///
    /// All chunks advance the progress of this task. The reports are returned in chunk order.
    pub fn run_partitioned<S, C>(
        &self,
        frames: &mut [Frame],
        store: &S,
        cancel: &C,
        num_threads: usize,
    ) -> Result<Vec<BuildReport>, ThreadPoolBuildError>
    where
        S: PointStore + Sync + ?Sized,
        C: CancellationFlag + Sync + ?Sized,
    {
        let num_threads = num_threads.max(1);
        let chunk_size = frames.len().div_ceil(num_threads).max(1);
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

        self.start(frames);
        let reports: Vec<BuildReport> = pool.install(|| {
            frames.par_chunks_mut(chunk_size)
                .map(|chunk| self.process(chunk, store, cancel))
                .collect()
        });

        if reports.iter().all(|report| report.is_completed()) {
            info!("Finished building mobilograms on {} threads, {}", num_threads, self.progress);
        }
        Ok(reports)
    }

    // resets the progress to the number of frames accepted by the scan selection
    fn start(&self, frames: &[Frame]) {
        let selection = &self.params.scan_selection;
        let selected = frames.iter().filter(|frame| selection.matches_frame(frame)).count();
        self.progress.start(selected);
        info!("Building mobilograms for {} frames, {} skipped by the scan selection, {}",
              selected, frames.len() - selected, self.params);
    }

    fn process<S, C>(&self, frames: &mut [Frame], store: &S, cancel: &C) -> BuildReport
    where
        S: PointStore + ?Sized,
        C: CancellationFlag + ?Sized,
    {
        let selection = &self.params.scan_selection;
        let selected: Vec<usize> = frames.iter()
            .enumerate()
            .filter(|(_, frame)| selection.matches_frame(frame))
            .map(|(index, _)| index)
            .collect();
        let skipped_frames = frames.len() - selected.len();

        let mut reports = Vec::with_capacity(selected.len());
        for index in selected {
            if cancel.is_canceled() {
                return self.canceled(reports, skipped_frames);
            }

            let frame = &mut frames[index];
            match self.build_frame(frame, store, cancel) {
                Ok((mobilograms, report)) => {
                    debug!("{}", report);
                    frame.replace_mobilograms(mobilograms);
                    reports.push(report);
                    self.progress.advance();
                }
                Err(Canceled) => return self.canceled(reports, skipped_frames),
            }
        }

        BuildReport { status: BuildStatus::Completed, frames: reports, skipped_frames }
    }

    fn canceled(&self, frames: Vec<FrameReport>, skipped_frames: usize) -> BuildReport {
        info!("Mobilogram build canceled after {}/{} frames", self.progress.processed(), self.progress.total());
        BuildReport { status: BuildStatus::Canceled, frames, skipped_frames }
    }

    fn build_frame<S, C>(&self, frame: &Frame, store: &S, cancel: &C) -> Result<(Vec<Mobilogram>, FrameReport), Canceled>
    where
        S: PointStore + ?Sized,
        C: CancellationFlag + ?Sized,
    {
        let selection = &self.params.scan_selection;
        let scans: Vec<&MobilityScan> = frame.mobility_scans()
            .filter(|scan| selection.matches_scan(scan))
            .collect();

        let mut mobilograms = self.calculate_mobilograms_for_scans(&scans, frame.mobility_type, cancel)?;

        let mut warnings = Vec::new();
        let mut num_backfilled = 0;
        if self.params.add_raw_points && !mobilograms.is_empty() {
            let raw_points = self.raw_points(frame, store, &mut warnings);
            num_backfilled = backfill(&mut mobilograms, raw_points, &self.params.mz_tolerance, cancel)?;
        }

        let overlaps = count_mz_overlaps(&mobilograms);
        debug!("Frame {}: found {} overlaps within {} mobilograms", frame.frame_id, overlaps, mobilograms.len());

        let report = FrameReport {
            frame_id: frame.frame_id,
            num_mobilograms: mobilograms.len(),
            num_backfilled,
            overlaps,
            warnings,
        };
        Ok((mobilograms, report))
    }

    /// Clusters the mass list points of `scans` into mobilograms.
    ///
    /// The result is empty if there are no scans or the first scan has no mass list of the
    /// configured name. Later scans without the mass list contribute no points.
    pub fn calculate_mobilograms_for_scans<C>(
        &self,
        scans: &[&MobilityScan],
        mobility_type: MobilityType,
        cancel: &C,
    ) -> Result<Vec<Mobilogram>, Canceled>
    where
        C: CancellationFlag + ?Sized,
    {
        let mass_list = self.params.mass_list.as_str();
        let Some(first) = scans.first() else {
            return Ok(Vec::new());
        };
        if first.mass_list(mass_list).is_none() {
            debug!("Scan {} has no mass list {}", first.scan_id, mass_list);
            return Ok(Vec::new());
        }

        let points: Vec<MobilityDataPoint> = scans.iter()
            .filter_map(|scan| scan.mobility_points(mass_list))
            .flatten()
            .collect();

        cluster_mobilograms(points, mobility_type, &self.params.mz_tolerance, &self.params.cluster_params(), cancel)
    }

    // raw points of every mobility scan of the frame, failing scans become warnings
    fn raw_points<S>(&self, frame: &Frame, store: &S, warnings: &mut Vec<ScanWarning>) -> Vec<MobilityDataPoint>
    where
        S: PointStore + ?Sized,
    {
        let mut points = Vec::new();
        for scan in frame.mobility_scans() {
            match store.data_points(frame.frame_id, scan.scan_id) {
                Ok(raw) => points.extend(scan.attach_mobility(&raw)),
                Err(error) => {
                    warn!("Frame {}: skipping raw points of scan {}: {}", frame.frame_id, scan.scan_id, error);
                    warnings.push(ScanWarning { scan_id: scan.scan_id, error });
                }
            }
        }
        points
    }
}
