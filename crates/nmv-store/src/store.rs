use async_trait::async_trait;
use nmv_domain::ParsedRecord;

use crate::entities::{
    ArpSource, BatchId, CollectionBatch, CollectionError, MaintenanceDevice,
    PortChannelExpectation, Switch, UplinkExpectation, VersionExpectation,
};
use crate::error::StoreError;

/// Relational state behind the collection pipeline.
///
/// `save_batch` implements the change-detection protocol: an item list
/// whose fingerprint matches the latest batch for the same
/// (api_name, switch_hostname, maintenance_id) is not written and returns
/// `None`; otherwise a new batch plus its typed rows are inserted in one
/// transaction and the new id is returned.
#[async_trait]
pub trait StateStore: Send + Sync {
    // ── Switches ──────────────────────────────────────────────────────────
    async fn upsert_switch(&self, switch: &Switch) -> Result<(), StoreError>;
    async fn list_active_switches(&self) -> Result<Vec<Switch>, StoreError>;
    async fn get_switch(&self, hostname: &str) -> Result<Option<Switch>, StoreError>;

    // ── Maintenance device list ───────────────────────────────────────────
    async fn upsert_maintenance_device(&self, device: &MaintenanceDevice) -> Result<(), StoreError>;

    /// Collection targets: rows of the maintenance with a non-null NEW
    /// hostname and IP. Rows without them never enter the fan-out.
    async fn list_collection_targets(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<MaintenanceDevice>, StoreError>;

    // ── Batches ───────────────────────────────────────────────────────────
    async fn save_batch(
        &self,
        api_name: &str,
        switch_hostname: &str,
        maintenance_id: &str,
        raw_data: &str,
        items: &[ParsedRecord],
    ) -> Result<Option<BatchId>, StoreError>;

    async fn latest_batch(
        &self,
        api_name: &str,
        switch_hostname: &str,
        maintenance_id: &str,
    ) -> Result<Option<CollectionBatch>, StoreError>;

    async fn batch_items(&self, batch_id: BatchId) -> Result<Vec<ParsedRecord>, StoreError>;

    // ── Collection errors ─────────────────────────────────────────────────
    async fn upsert_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
        message: &str,
    ) -> Result<(), StoreError>;

    async fn clear_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
    ) -> Result<(), StoreError>;

    async fn get_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
    ) -> Result<Option<CollectionError>, StoreError>;

    async fn list_collection_errors(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<CollectionError>, StoreError>;

    // ── Expectations ──────────────────────────────────────────────────────
    async fn upsert_uplink_expectation(&self, exp: &UplinkExpectation) -> Result<(), StoreError>;
    async fn list_uplink_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<UplinkExpectation>, StoreError>;

    async fn upsert_version_expectation(&self, exp: &VersionExpectation) -> Result<(), StoreError>;
    async fn list_version_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<VersionExpectation>, StoreError>;

    async fn upsert_port_channel_expectation(
        &self,
        exp: &PortChannelExpectation,
    ) -> Result<(), StoreError>;
    async fn list_port_channel_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<PortChannelExpectation>, StoreError>;

    async fn upsert_arp_source(&self, source: &ArpSource) -> Result<(), StoreError>;
    async fn list_arp_sources(&self, maintenance_id: &str) -> Result<Vec<ArpSource>, StoreError>;

    // ── Maintenance lifecycle ─────────────────────────────────────────────
    /// Delete a maintenance and everything it owns: device list,
    /// expectations, batches (which cascade to typed rows) and errors.
    async fn delete_maintenance(&self, maintenance_id: &str) -> Result<(), StoreError>;
}
