//! Storage path resolution and object-store provisioning.
//!
//! [`resolver::PathResolver`] computes the storage URI for a table from a
//! [`model::StorageBackend`] and an optional [`model::PartitionStrategy`];
//! [`store::global_registry`] turns a `StorageBackend` into a concrete
//! `object_store::ObjectStore` handle.

pub mod error;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{PartitionStrategy, StorageBackend, StoragePath};
pub use resolver::PathResolver;
pub use store::{global_registry, ObjectStoreProvider, ObjectStoreRegistry};
