use num_complex::Complex32;

use crate::Error;

/// Outcome of a [`work`](SyncBlock::work) cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// The given number of samples was written to the output.
    Produced(usize),
    /// The stream is finished; the block will not produce any more samples.
    Done,
}

/// Source block driven by a host scheduler.
///
/// The host calls [`start`](SyncBlock::start) once, then [`work`](SyncBlock::work) repeatedly
/// from a single worker thread until it returns [`WorkStatus::Done`] or the host decides to
/// stop, and finally [`stop`](SyncBlock::stop).
pub trait SyncBlock: Send {
    /// Enable the data path. Returns `true` on success.
    fn start(&mut self) -> bool;

    /// Disable the data path. Returns `true` on success.
    fn stop(&mut self) -> bool;

    /// Fill `output` completely.
    ///
    /// May block the calling thread for up to the configured stream timeout.
    fn work(&mut self, output: &mut [Complex32]) -> Result<WorkStatus, Error>;
}

#[doc(hidden)]
impl SyncBlock for Box<dyn SyncBlock> {
    fn start(&mut self) -> bool {
        self.as_mut().start()
    }
    fn stop(&mut self) -> bool {
        self.as_mut().stop()
    }
    fn work(&mut self, output: &mut [Complex32]) -> Result<WorkStatus, Error> {
        self.as_mut().work(output)
    }
}
