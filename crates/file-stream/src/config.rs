//! Configuration for file streams

/// Permission bits used when creating the output file, before the umask.
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// File stream configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStreamConfig {
    /// Number of writes that may wait in the queue before producers block.
    /// A capacity of one is the closest thing to a rendezvous channel.
    pub write_queue_capacity: usize,
    /// Whether to `fsync` the file after the final flush on shutdown.
    pub sync_on_close: bool,
    /// Permission bits for a newly created file. Only honoured on unix.
    pub mode: u32,
}

impl Default for FileStreamConfig {
    fn default() -> Self {
        Self {
            write_queue_capacity: 1,
            sync_on_close: false,
            mode: DEFAULT_FILE_MODE,
        }
    }
}

impl FileStreamConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> FileStreamConfigBuilder {
        FileStreamConfigBuilder::default()
    }

    /// Queue capacity as handed to `tokio::sync::mpsc::channel`, which panics on zero.
    pub(crate) fn queue_capacity(&self) -> usize {
        self.write_queue_capacity.max(1)
    }
}

/// Builder for [`FileStreamConfig`]
#[derive(Debug, Default)]
pub struct FileStreamConfigBuilder {
    config: FileStreamConfig,
}

impl FileStreamConfigBuilder {
    /// Set the write queue capacity. Zero is treated as one.
    #[must_use]
    pub const fn write_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.write_queue_capacity = capacity;
        self
    }

    /// Set whether the file is synced to disk on shutdown
    #[must_use]
    pub const fn sync_on_close(mut self, sync: bool) -> Self {
        self.config.sync_on_close = sync;
        self
    }

    /// Set the permission bits for a newly created file
    #[must_use]
    pub const fn mode(mut self, mode: u32) -> Self {
        self.config.mode = mode;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> FileStreamConfig {
        self.config
    }
}
