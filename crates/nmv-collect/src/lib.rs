pub mod api_service;
pub mod client_service;
pub mod error;
pub mod report;
pub mod scheduler;
pub mod snmp_service;

pub use api_service::ApiCollectionService;
pub use client_service::{ClientCollectionService, ComparisonTrigger, NoopComparison};
pub use error::CollectError;
pub use report::{CycleReport, DeviceFailure};
pub use scheduler::{JobInfo, Scheduler};
pub use snmp_service::SnmpCollectionService;

use async_trait::async_trait;

/// The entry point both indicator drivers expose; the scheduler and the
/// API surface dispatch through this.
#[async_trait]
pub trait CollectionService: Send + Sync {
    async fn collect(
        &self,
        api_name: &str,
        source: Option<&str>,
        maintenance_id: &str,
    ) -> Result<CycleReport, CollectError>;
}
