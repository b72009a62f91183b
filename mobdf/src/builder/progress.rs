use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress of a build, shared with observers on other threads.
#[derive(Debug, Default)]
pub struct TaskProgress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl TaskProgress {
    pub fn new() -> Self {
        TaskProgress::default()
    }

    /// Resets the counter for a run over `total` frames.
    pub fn start(&self, total: usize) {
        self.processed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Marks one more frame as processed.
    pub fn advance(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Fraction of processed frames in `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobdf::builder::progress::TaskProgress;
    ///
    /// let progress = TaskProgress::new();
    /// assert_eq!(progress.finished_percentage(), 0.0);
    /// progress.start(4);
    /// progress.advance();
    /// assert_eq!(progress.finished_percentage(), 0.25);
    /// ```
    pub fn finished_percentage(&self) -> f64 {
        let processed = self.processed();
        let total = self.total().max(1);
        processed.min(total) as f64 / total as f64
    }

    pub fn description(&self) -> String {
        format!("Detecting mobilograms for frames. {}/{}", self.processed(), self.total().max(1))
    }
}

impl Display for TaskProgress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_frames() {
        let progress = TaskProgress::new();
        progress.start(0);
        assert_eq!(progress.finished_percentage(), 0.0);
        assert_eq!(progress.description(), "Detecting mobilograms for frames. 0/1");
    }

    #[test]
    fn test_observed_from_other_thread() {
        let progress = Arc::new(TaskProgress::new());
        progress.start(2);

        let worker = {
            let progress = Arc::clone(&progress);
            thread::spawn(move || {
                progress.advance();
                progress.advance();
            })
        };
        worker.join().unwrap();

        assert_eq!(progress.finished_percentage(), 1.0);
        assert_eq!(progress.to_string(), "Detecting mobilograms for frames. 2/2");
    }
}
