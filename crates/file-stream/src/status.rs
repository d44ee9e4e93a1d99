//! Status reports sent from the run loop to the handle.

use crate::error::{Error, Result};

/// A report on the status channel.
///
/// A run loop sends exactly one of [`Status::Ready`] or [`Status::Failed`]
/// once it has tried to open the file. A stream that became ready later sends
/// exactly one [`Status::Closed`] when it shuts down.
#[derive(Debug)]
pub enum Status {
    /// The file is open and writes will be applied.
    Ready,
    /// The file could not be opened. The stream is dead.
    Failed(Error),
    /// The stream has shut down and the file is closed.
    Closed(StreamSummary),
}

impl Status {
    /// Converts a readiness report into a result.
    ///
    /// # Errors
    ///
    /// Returns the open error for [`Status::Failed`] and
    /// [`Error::StreamClosed`] for [`Status::Closed`].
    pub fn into_ready(self) -> Result<()> {
        match self {
            Self::Ready => Ok(()),
            Self::Failed(e) => Err(e),
            Self::Closed(_) => Err(Error::StreamClosed),
        }
    }

    /// Returns `true` for the closed sentinel.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

/// Counters describing what a run loop did with the writes it accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Writes that were appended to the file without error
    pub writes_applied: u64,
    /// Total payload bytes appended
    pub bytes_written: u64,
    /// Writes whose I/O error was swallowed
    pub write_failures: u64,
}

impl StreamSummary {
    pub(crate) fn record_write(&mut self, len: usize) {
        self.writes_applied += 1;
        self.bytes_written += len as u64;
    }

    pub(crate) fn record_failure(&mut self) {
        self.write_failures += 1;
    }
}
