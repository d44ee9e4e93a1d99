//! The run loop that owns the output file and serializes every write.

use crate::config::FileStreamConfig;
use crate::error::{Error, Result};
use crate::status::{Status, StreamSummary};
use crate::stream::{Endpoints, FileStream, WriteRequest};

use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Why the draining loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    /// A quit token was received.
    Quit,
    /// Every handle was dropped.
    Detached,
}

/// Opens `path` and drains writes submitted through `stream` into it until
/// quit is requested or every handle is dropped.
///
/// This future only completes when the stream shuts down, so it must be
/// driven concurrently with the code that submits writes, usually via
/// `tokio::spawn`. The outcome of opening the file is reported on the status
/// channel, not through the return value.
///
/// # Errors
///
/// Returns [`Error::AlreadyRunning`] if another run loop has already claimed
/// `stream`. No status is reported in that case.
pub async fn run(path: impl AsRef<Path>, stream: FileStream) -> Result<()> {
    let path = path.as_ref();
    let Endpoints {
        mut writes,
        mut quit,
        status,
        config,
    } = stream.claim()?;

    // The loop must not keep its own producers alive.
    drop(stream);

    let mut file = match open(path, &config).await {
        Ok(file) => file,
        Err(source) => {
            error!(path = %path.display(), "Failed to open file stream: {}", source);
            let _ = status
                .send(Status::Failed(Error::Open {
                    path: path.to_path_buf(),
                    source,
                }))
                .await;
            return Ok(());
        }
    };

    info!(path = %path.display(), "File stream ready");
    let _ = status.send(Status::Ready).await;

    let mut summary = StreamSummary::default();

    let reason = loop {
        tokio::select! {
            biased;

            token = quit.recv() => {
                break if token.is_some() { Shutdown::Quit } else { Shutdown::Detached };
            }

            request = writes.recv() => {
                let Some(WriteRequest { payload, applied }) = request else {
                    break Shutdown::Detached;
                };

                match append(&mut file, &payload).await {
                    Ok(()) => {
                        summary.record_write(payload.len());
                        debug!(bytes = payload.len(), "Applied write");
                    }
                    Err(e) => {
                        summary.record_failure();
                        warn!(bytes = payload.len(), "Discarding failed write: {}", e);
                    }
                }

                // The submitter may have given up waiting.
                let _ = applied.send(());
            }
        }
    };

    // Anything still queued is dropped along with the receiver, which wakes
    // the submitters with `StreamClosed`.
    writes.close();
    drop(writes);

    if let Err(e) = close(file, &config).await {
        warn!(path = %path.display(), "Failed to close file stream cleanly: {}", e);
    }

    info!(
        path = %path.display(),
        ?reason,
        writes = summary.writes_applied,
        bytes = summary.bytes_written,
        failures = summary.write_failures,
        "File stream closed"
    );
    let _ = status.send(Status::Closed(summary)).await;

    Ok(())
}

#[cfg_attr(not(unix), allow(unused_variables))]
async fn open(path: &Path, config: &FileStreamConfig) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    options.mode(config.mode);

    options.open(path).await
}

/// Writes the payload and waits for the blocking pool to finish with it.
async fn append(file: &mut File, payload: &str) -> io::Result<()> {
    file.write_all(payload.as_bytes()).await?;
    file.flush().await
}

async fn close(mut file: File, config: &FileStreamConfig) -> io::Result<()> {
    file.flush().await?;

    if config.sync_on_close {
        file.sync_all().await?;
    }

    Ok(())
}
