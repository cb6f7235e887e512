/// Result of a successful commit: the version number of the Delta
/// snapshot that now includes the coalesced records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitResult {
    pub version: i64,
}

/// Tunables that govern retry, checkpoint cadence, and the compression
/// codec used for data files.
#[derive(Debug, Clone)]
pub struct CommitEngineConfig {
    pub max_retries: usize,
    pub retry_base_ms: u64,
    pub retry_cap_ms: u64,
    pub checkpoint_interval: i64,
    pub compression_codec: String,
}

impl Default for CommitEngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_ms: 100,
            retry_cap_ms: 10_000,
            checkpoint_interval: 10,
            compression_codec: "snappy".to_string(),
        }
    }
}
