//! Asynchronous single-file writer.
//!
//! A [`FileStream`] handle lets any number of producers append text to one
//! output file without touching the file themselves. A single run loop
//! ([`run`]) owns the file and applies writes in the order it accepts them.
//!
//! The lifecycle is reported on the status channel: exactly one
//! [`Status::Ready`] or [`Status::Failed`] once the file has been opened (or
//! not), then exactly one [`Status::Closed`] after shutdown.
//!
//! I/O errors on individual writes are logged and counted in
//! [`StreamSummary::write_failures`] but never reported as errors.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod status;
mod stream;
mod worker;

pub use config::{DEFAULT_FILE_MODE, FileStreamConfig, FileStreamConfigBuilder};
pub use error::{Error, Result};
pub use status::{Status, StreamSummary};
pub use stream::FileStream;
pub use worker::run;
