//! Channel configuration for orchestrator communication

/// Channel buffer configuration for orchestrator communication
///
/// The task queue itself is unbounded: workers feed it as well as drain it,
/// and a bounded queue would let every worker block on its own follow-ups.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Record channel buffer size (workers -> record collector)
    pub record_buffer: usize,

    /// Failure channel buffer size (workers -> error collector)
    pub failure_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            record_buffer: 1000,
            failure_buffer: 100,
        }
    }
}

impl ChannelConfig {
    /// Set the record channel buffer size
    pub fn with_record_buffer(mut self, size: usize) -> Self {
        self.record_buffer = size.max(1);
        self
    }

    /// Set the failure channel buffer size
    pub fn with_failure_buffer(mut self, size: usize) -> Self {
        self.failure_buffer = size.max(1);
        self
    }
}
