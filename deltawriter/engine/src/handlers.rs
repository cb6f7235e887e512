use std::sync::Once;

static REGISTER: Once = Once::new();

/// Registers the cloud-vendor object-store handlers `deltalake` needs to
/// resolve `s3a://`, `gs://` and `abfss://` URIs. Safe and cheap to call
/// more than once; only the first call has any effect.
pub fn register_handlers() {
    REGISTER.call_once(|| {
        #[cfg(feature = "s3")]
        deltalake::aws::register_handlers(None);
        #[cfg(feature = "gcs")]
        deltalake::gcp::register_handlers(None);
        #[cfg(feature = "azure")]
        deltalake::azure::register_handlers(None);
    });
}
