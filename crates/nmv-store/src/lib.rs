pub mod entities;
pub mod error;
pub mod hash;
pub mod memory;
pub mod postgres_store;
pub mod store;

pub use entities::{
    ArpSource, BatchId, CollectionBatch, CollectionError, MaintenanceDevice,
    PortChannelExpectation, Switch, UplinkExpectation, VersionExpectation,
};
pub use error::StoreError;
pub use hash::content_fingerprint;
pub use memory::InMemoryStore;
pub use postgres_store::PostgresStore;
pub use store::StateStore;
