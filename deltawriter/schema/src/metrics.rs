/// Observer hooks exposed by the write engine. Every method has a no-op
/// default so implementers only override the counters/gauges they
/// actually wire up to a metrics backend (Micrometer, Prometheus, ...) —
/// this crate has no opinion on which.
///
/// Kept as a narrow, object-safe trait (like `ObjectStoreProvider` in
/// `deltawriter-storage`) rather than a concrete struct, so the commit
/// engine and scheduler can hold it as `Arc<dyn Metrics>` without knowing
/// about any particular metrics backend.
pub trait Metrics: Send + Sync {
    fn incr_writes(&self) {}
    fn incr_conflicts(&self) {}
    fn incr_checkpoints_created(&self) {}
    fn incr_batch_consolidations(&self) {}
    fn set_queue_size(&self, _size: u64) {}
    fn observe_write_latency_ms(&self, _millis: u64) {}
    fn set_optimal_batch_size(&self, _size: u64) {}
}

/// Default implementation used when no metrics backend is wired up.
pub struct NoopMetrics;

impl Metrics for NoopMetrics {}
