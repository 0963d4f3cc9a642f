/// Options applied when building or opening a store file.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Whether to fsync the finished file before it is renamed into place.
    pub fsync: bool,
    /// Whether an existing file at the destination may be replaced.
    pub overwrite: bool,
    /// Whether opening a store also recomputes the section checksums.
    pub verify_checksums: bool,
    /// Buffer size for streaming section reads and writes.
    pub io_buffer_bytes: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            fsync: true,
            overwrite: true,
            verify_checksums: false,
            io_buffer_bytes: 1 << 20,
        }
    }
}

impl StoreOptions {
    /// Sets the fsync policy.
    pub fn fsync(mut self, enabled: bool) -> Self {
        self.fsync = enabled;
        self
    }

    /// Allows or forbids replacing an existing file.
    pub fn overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Enables checksum verification on open.
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Sets the streaming buffer size; zero falls back to a small minimum.
    pub fn io_buffer_bytes(mut self, bytes: usize) -> Self {
        self.io_buffer_bytes = bytes;
        self
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.io_buffer_bytes.max(4096)
    }
}
