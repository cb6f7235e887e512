use std::sync::{Arc, OnceLock};

use object_store::local::LocalFileSystem;
use object_store::ObjectStore;

use crate::error::{Result, StoreError};
use crate::model::StorageBackend;

/// A narrow capability that knows how to turn one kind of [`StorageBackend`]
/// into a concrete `object_store::ObjectStore`. Kept as a trait object
/// (rather than folded into `StorageBackend` itself) because constructing a
/// store touches process-wide configuration (env vars, credential
/// providers) that the path-resolution enum has no business knowing about.
pub trait ObjectStoreProvider: Send + Sync {
    fn supports(&self, backend: &StorageBackend) -> bool;
    fn create_store(&self, backend: &StorageBackend) -> Result<Arc<dyn ObjectStore>>;
}

struct LocalProvider;

impl ObjectStoreProvider for LocalProvider {
    fn supports(&self, backend: &StorageBackend) -> bool {
        matches!(backend, StorageBackend::Local)
    }

    fn create_store(&self, _backend: &StorageBackend) -> Result<Arc<dyn ObjectStore>> {
        Ok(Arc::new(LocalFileSystem::new()))
    }
}

#[cfg(feature = "aws")]
struct S3Provider;

#[cfg(feature = "aws")]
impl ObjectStoreProvider for S3Provider {
    fn supports(&self, backend: &StorageBackend) -> bool {
        matches!(backend, StorageBackend::S3 { .. })
    }

    fn create_store(&self, backend: &StorageBackend) -> Result<Arc<dyn ObjectStore>> {
        let StorageBackend::S3 { bucket } = backend else {
            return Err(StoreError::UnsupportedBackend("expected S3 backend".to_string()));
        };
        let store = object_store::aws::AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()?;
        Ok(Arc::new(store))
    }
}

/// Registry of known providers, consulted in order. Mirrors the teacher's
/// `global_registry()` pattern: a process-wide, append-only list of
/// capability implementations, initialized once and shared read-only.
pub struct ObjectStoreRegistry {
    providers: Vec<Box<dyn ObjectStoreProvider>>,
}

impl ObjectStoreRegistry {
    pub fn create_store(&self, backend: &StorageBackend) -> Result<Arc<dyn ObjectStore>> {
        for provider in &self.providers {
            if provider.supports(backend) {
                return provider.create_store(backend);
            }
        }
        Err(StoreError::UnsupportedBackend(backend.storage_type().to_string()))
    }
}

static GLOBAL_REGISTRY: OnceLock<ObjectStoreRegistry> = OnceLock::new();

/// The process-wide registry of object store providers, built once with
/// the providers compiled into this binary.
pub fn global_registry() -> &'static ObjectStoreRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        #[allow(unused_mut)]
        let mut providers: Vec<Box<dyn ObjectStoreProvider>> = vec![Box::new(LocalProvider)];
        #[cfg(feature = "aws")]
        providers.push(Box::new(S3Provider));
        ObjectStoreRegistry { providers }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_resolves_via_global_registry() {
        let store = global_registry().create_store(&StorageBackend::Local);
        assert!(store.is_ok());
    }

    #[test]
    fn unregistered_backend_is_rejected() {
        let backend = StorageBackend::Hdfs { namenode: "nn1".to_string() };
        let err = global_registry().create_store(&backend).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedBackend(_)));
    }
}
