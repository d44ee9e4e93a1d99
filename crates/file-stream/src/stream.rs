//! The caller-facing stream handle.

use crate::config::FileStreamConfig;
use crate::error::{Error, Result};
use crate::status::{Status, StreamSummary};
use crate::worker;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tracing::error;

/// Status reports per stream: one on readiness and one on shutdown.
const STATUS_CAPACITY: usize = 2;

/// A payload waiting to be appended, with the acknowledgement the run loop
/// fires once it has been applied.
#[derive(Debug)]
pub(crate) struct WriteRequest {
    pub(crate) payload: String,
    pub(crate) applied: oneshot::Sender<()>,
}

/// The consumer side of a stream, claimed once by a run loop.
#[derive(Debug)]
pub(crate) struct Endpoints {
    pub(crate) writes: mpsc::Receiver<WriteRequest>,
    pub(crate) quit: mpsc::Receiver<()>,
    pub(crate) status: mpsc::Sender<Status>,
    pub(crate) config: FileStreamConfig,
}

/// Handle to an asynchronous single-file writer.
///
/// Cloning is cheap and every clone talks to the same run loop. Once every
/// clone has been dropped the run loop shuts down as if quit was requested.
///
/// ```no_run
/// # async fn example() -> proven_file_stream::Result<()> {
/// use proven_file_stream::{FileStream, run};
///
/// let stream = FileStream::new();
/// tokio::spawn(run("/tmp/out.txt", stream.clone()));
/// stream.ready().await?;
///
/// stream.submit("hello ").await?;
/// stream.submit("world").await?;
///
/// let summary = stream.shutdown().await?;
/// assert_eq!(summary.bytes_written, 11);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FileStream {
    writes: mpsc::Sender<WriteRequest>,
    quit: mpsc::Sender<()>,
    pub(crate) status: Arc<AsyncMutex<mpsc::Receiver<Status>>>,
    endpoints: Arc<Mutex<Option<Endpoints>>>,
}

impl Default for FileStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStream {
    /// Creates a handle with fresh, empty channels and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FileStreamConfig::default())
    }

    /// Creates a handle whose run loop will use `config`.
    #[must_use]
    pub fn with_config(config: FileStreamConfig) -> Self {
        let (writes_tx, writes_rx) = mpsc::channel(config.queue_capacity());
        let (quit_tx, quit_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = mpsc::channel(STATUS_CAPACITY);

        Self {
            writes: writes_tx,
            quit: quit_tx,
            status: Arc::new(AsyncMutex::new(status_rx)),
            endpoints: Arc::new(Mutex::new(Some(Endpoints {
                writes: writes_rx,
                quit: quit_rx,
                status: status_tx,
                config,
            }))),
        }
    }

    /// Creates a stream for `path`, spawns its run loop on the current tokio
    /// runtime and waits until the file is open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file could not be created.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(path, FileStreamConfig::default()).await
    }

    /// Like [`FileStream::open`], with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file could not be created.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub async fn open_with_config(
        path: impl Into<PathBuf>,
        config: FileStreamConfig,
    ) -> Result<Self> {
        let stream = Self::with_config(config);
        let path = path.into();
        let runner = stream.clone();

        tokio::spawn(async move {
            if let Err(e) = worker::run(&path, runner).await {
                error!(path = %path.display(), "File stream run loop failed: {}", e);
            }
        });

        stream.ready().await?;
        Ok(stream)
    }

    /// Submits `text` to be appended and waits until the run loop has
    /// applied it.
    ///
    /// Write errors are not reported here; see
    /// [`StreamSummary::write_failures`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamClosed`] if the stream shut down before the
    /// payload was applied.
    pub async fn submit(&self, text: impl Into<String>) -> Result<()> {
        let (applied, accepted) = oneshot::channel();

        self.writes
            .send(WriteRequest {
                payload: text.into(),
                applied,
            })
            .await
            .map_err(|_| Error::StreamClosed)?;

        accepted.await.map_err(|_| Error::StreamClosed)
    }

    /// Asks the run loop to shut down. Writes still queued are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamClosed`] if the run loop has already exited.
    pub async fn request_quit(&self) -> Result<()> {
        self.quit.send(()).await.map_err(|_| Error::StreamClosed)
    }

    /// Number of submitted writes the run loop has not picked up yet.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.max_capacity() - self.writes.capacity()
    }

    /// Receives the next status report.
    ///
    /// Returns `None` once the run loop has exited and every report has been
    /// received. Waits indefinitely if no run loop was ever started.
    pub async fn status(&self) -> Option<Status> {
        self.status.lock().await.recv().await
    }

    /// Waits for the readiness report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file could not be opened, or
    /// [`Error::StreamClosed`] if the stream is already gone.
    pub async fn ready(&self) -> Result<()> {
        self.status()
            .await
            .map_or(Err(Error::StreamClosed), Status::into_ready)
    }

    /// Waits for the closed report, skipping a readiness report if it has not
    /// been received yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the stream never opened, or
    /// [`Error::StreamClosed`] if the closed report was already consumed.
    pub async fn closed(&self) -> Result<StreamSummary> {
        loop {
            match self.status().await {
                Some(Status::Ready) => {}
                Some(Status::Closed(summary)) => return Ok(summary),
                Some(Status::Failed(e)) => return Err(e),
                None => return Err(Error::StreamClosed),
            }
        }
    }

    /// Requests quit and waits for the stream to close.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamClosed`] if the stream had already shut down.
    pub async fn shutdown(&self) -> Result<StreamSummary> {
        self.request_quit().await?;
        self.closed().await
    }

    /// Hands the consumer side to a run loop. Succeeds at most once.
    pub(crate) fn claim(&self) -> Result<Endpoints> {
        self.endpoints.lock().take().ok_or(Error::AlreadyRunning)
    }
}
