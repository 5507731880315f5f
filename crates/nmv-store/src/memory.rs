use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nmv_domain::ParsedRecord;
use tokio::sync::RwLock;

use crate::entities::{
    ArpSource, BatchId, CollectionBatch, CollectionError, MaintenanceDevice,
    PortChannelExpectation, Switch, UplinkExpectation, VersionExpectation,
};
use crate::error::StoreError;
use crate::hash::content_fingerprint;
use crate::store::StateStore;

#[derive(Debug, Default)]
struct Inner {
    switches: HashMap<String, Switch>,
    devices: Vec<MaintenanceDevice>,
    batches: Vec<CollectionBatch>,
    batch_items: HashMap<BatchId, Vec<ParsedRecord>>,
    errors: HashMap<(String, String, String), CollectionError>,
    uplink_expectations: Vec<UplinkExpectation>,
    version_expectations: Vec<VersionExpectation>,
    port_channel_expectations: Vec<PortChannelExpectation>,
    arp_sources: Vec<ArpSource>,
    next_batch_id: BatchId,
}

/// In-memory implementation of [`StateStore`].
///
/// All data is lost on process exit. Suitable for tests and local mock
/// runs; semantics mirror the Postgres backend exactly, including the
/// content-hash skip protocol.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn upsert_switch(&self, switch: &Switch) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.switches.insert(switch.hostname.clone(), switch.clone());
        Ok(())
    }

    async fn list_active_switches(&self) -> Result<Vec<Switch>, StoreError> {
        let guard = self.inner.read().await;
        let mut switches: Vec<Switch> = guard
            .switches
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        switches.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        Ok(switches)
    }

    async fn get_switch(&self, hostname: &str) -> Result<Option<Switch>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.switches.get(hostname).cloned())
    }

    async fn upsert_maintenance_device(&self, device: &MaintenanceDevice) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard.devices.iter_mut().find(|d| {
            d.maintenance_id == device.maintenance_id
                && d.old_hostname == device.old_hostname
                && d.new_hostname == device.new_hostname
        });
        match existing {
            Some(slot) => *slot = device.clone(),
            None => guard.devices.push(device.clone()),
        }
        Ok(())
    }

    async fn list_collection_targets(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<MaintenanceDevice>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .devices
            .iter()
            .filter(|d| {
                d.maintenance_id == maintenance_id
                    && d.new_hostname.is_some()
                    && d.new_ip_address.is_some()
            })
            .cloned()
            .collect())
    }

    async fn save_batch(
        &self,
        api_name: &str,
        switch_hostname: &str,
        maintenance_id: &str,
        raw_data: &str,
        items: &[ParsedRecord],
    ) -> Result<Option<BatchId>, StoreError> {
        let fingerprint = content_fingerprint(items);
        let mut guard = self.inner.write().await;

        let unchanged = guard
            .batches
            .iter()
            .filter(|b| {
                b.api_name == api_name
                    && b.switch_hostname == switch_hostname
                    && b.maintenance_id == maintenance_id
            })
            .max_by_key(|b| b.id)
            .map(|latest| latest.content_hash == fingerprint)
            .unwrap_or(false);
        if unchanged {
            return Ok(None);
        }

        guard.next_batch_id += 1;
        let id = guard.next_batch_id;
        guard.batches.push(CollectionBatch {
            id,
            api_name: api_name.to_string(),
            switch_hostname: switch_hostname.to_string(),
            maintenance_id: maintenance_id.to_string(),
            collected_at: Utc::now(),
            raw_data: raw_data.to_string(),
            content_hash: fingerprint,
        });
        guard.batch_items.insert(id, items.to_vec());
        Ok(Some(id))
    }

    async fn latest_batch(
        &self,
        api_name: &str,
        switch_hostname: &str,
        maintenance_id: &str,
    ) -> Result<Option<CollectionBatch>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .batches
            .iter()
            .filter(|b| {
                b.api_name == api_name
                    && b.switch_hostname == switch_hostname
                    && b.maintenance_id == maintenance_id
            })
            .max_by_key(|b| b.id)
            .cloned())
    }

    async fn batch_items(&self, batch_id: BatchId) -> Result<Vec<ParsedRecord>, StoreError> {
        let guard = self.inner.read().await;
        guard
            .batch_items
            .get(&batch_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("batch {batch_id}")))
    }

    async fn upsert_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (
            maintenance_id.to_string(),
            api_name.to_string(),
            switch_hostname.to_string(),
        );
        guard.errors.insert(
            key,
            CollectionError {
                maintenance_id: maintenance_id.to_string(),
                api_name: api_name.to_string(),
                switch_hostname: switch_hostname.to_string(),
                error_message: message.to_string(),
                occurred_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn clear_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.errors.remove(&(
            maintenance_id.to_string(),
            api_name.to_string(),
            switch_hostname.to_string(),
        ));
        Ok(())
    }

    async fn get_collection_error(
        &self,
        maintenance_id: &str,
        api_name: &str,
        switch_hostname: &str,
    ) -> Result<Option<CollectionError>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .errors
            .get(&(
                maintenance_id.to_string(),
                api_name.to_string(),
                switch_hostname.to_string(),
            ))
            .cloned())
    }

    async fn list_collection_errors(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<CollectionError>, StoreError> {
        let guard = self.inner.read().await;
        let mut errors: Vec<CollectionError> = guard
            .errors
            .values()
            .filter(|e| e.maintenance_id == maintenance_id)
            .cloned()
            .collect();
        errors.sort_by(|a, b| {
            (&a.switch_hostname, &a.api_name).cmp(&(&b.switch_hostname, &b.api_name))
        });
        Ok(errors)
    }

    async fn upsert_uplink_expectation(&self, exp: &UplinkExpectation) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard.uplink_expectations.iter_mut().find(|e| {
            e.maintenance_id == exp.maintenance_id
                && e.hostname == exp.hostname
                && e.local_interface == exp.local_interface
        });
        match existing {
            Some(slot) => *slot = exp.clone(),
            None => guard.uplink_expectations.push(exp.clone()),
        }
        Ok(())
    }

    async fn list_uplink_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<UplinkExpectation>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .uplink_expectations
            .iter()
            .filter(|e| e.maintenance_id == maintenance_id)
            .cloned()
            .collect())
    }

    async fn upsert_version_expectation(&self, exp: &VersionExpectation) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .version_expectations
            .iter_mut()
            .find(|e| e.maintenance_id == exp.maintenance_id && e.hostname == exp.hostname);
        match existing {
            Some(slot) => *slot = exp.clone(),
            None => guard.version_expectations.push(exp.clone()),
        }
        Ok(())
    }

    async fn list_version_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<VersionExpectation>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .version_expectations
            .iter()
            .filter(|e| e.maintenance_id == maintenance_id)
            .cloned()
            .collect())
    }

    async fn upsert_port_channel_expectation(
        &self,
        exp: &PortChannelExpectation,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard.port_channel_expectations.iter_mut().find(|e| {
            e.maintenance_id == exp.maintenance_id
                && e.hostname == exp.hostname
                && e.interface_name == exp.interface_name
        });
        match existing {
            Some(slot) => *slot = exp.clone(),
            None => guard.port_channel_expectations.push(exp.clone()),
        }
        Ok(())
    }

    async fn list_port_channel_expectations(
        &self,
        maintenance_id: &str,
    ) -> Result<Vec<PortChannelExpectation>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .port_channel_expectations
            .iter()
            .filter(|e| e.maintenance_id == maintenance_id)
            .cloned()
            .collect())
    }

    async fn upsert_arp_source(&self, source: &ArpSource) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .arp_sources
            .iter_mut()
            .find(|s| s.maintenance_id == source.maintenance_id && s.hostname == source.hostname);
        match existing {
            Some(slot) => *slot = source.clone(),
            None => guard.arp_sources.push(source.clone()),
        }
        Ok(())
    }

    async fn list_arp_sources(&self, maintenance_id: &str) -> Result<Vec<ArpSource>, StoreError> {
        let guard = self.inner.read().await;
        let mut sources: Vec<ArpSource> = guard
            .arp_sources
            .iter()
            .filter(|s| s.maintenance_id == maintenance_id)
            .cloned()
            .collect();
        sources.sort_by_key(|s| s.priority);
        Ok(sources)
    }

    async fn delete_maintenance(&self, maintenance_id: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.devices.retain(|d| d.maintenance_id != maintenance_id);
        guard
            .uplink_expectations
            .retain(|e| e.maintenance_id != maintenance_id);
        guard
            .version_expectations
            .retain(|e| e.maintenance_id != maintenance_id);
        guard
            .port_channel_expectations
            .retain(|e| e.maintenance_id != maintenance_id);
        guard.arp_sources.retain(|s| s.maintenance_id != maintenance_id);
        guard.errors.retain(|(mid, _, _), _| mid != maintenance_id);

        let doomed: Vec<BatchId> = guard
            .batches
            .iter()
            .filter(|b| b.maintenance_id == maintenance_id)
            .map(|b| b.id)
            .collect();
        guard.batches.retain(|b| b.maintenance_id != maintenance_id);
        for id in doomed {
            guard.batch_items.remove(&id); // batch owns its rows
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_domain::FanStatus;

    fn fan_items(status: &str) -> Vec<ParsedRecord> {
        vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", status))]
    }

    #[tokio::test]
    async fn save_batch_is_idempotent_on_identical_content() {
        let store = InMemoryStore::new();
        let first = store
            .save_batch("get_fan_hpe_dna", "SW-01", "MAINT-001", "raw", &fan_items("normal"))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .save_batch("get_fan_hpe_dna", "SW-01", "MAINT-001", "raw", &fan_items("normal"))
            .await
            .unwrap();
        assert!(second.is_none(), "identical content must not create a batch");

        let third = store
            .save_batch("get_fan_hpe_dna", "SW-01", "MAINT-001", "raw", &fan_items("absent"))
            .await
            .unwrap();
        assert!(third.is_some(), "changed content must create a batch");
    }

    #[tokio::test]
    async fn latest_batch_tracks_the_newest_insert() {
        let store = InMemoryStore::new();
        store
            .save_batch("get_fan_hpe_dna", "SW-01", "M-1", "raw1", &fan_items("normal"))
            .await
            .unwrap();
        let id2 = store
            .save_batch("get_fan_hpe_dna", "SW-01", "M-1", "raw2", &fan_items("absent"))
            .await
            .unwrap()
            .unwrap();

        let latest = store
            .latest_batch("get_fan_hpe_dna", "SW-01", "M-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, id2);
        assert_eq!(latest.raw_data, "raw2");

        let items = store.batch_items(id2).await.unwrap();
        assert_eq!(items, fan_items("absent"));
    }

    #[tokio::test]
    async fn batches_are_scoped_per_key() {
        let store = InMemoryStore::new();
        store
            .save_batch("get_fan_hpe_dna", "SW-01", "M-1", "raw", &fan_items("normal"))
            .await
            .unwrap();
        // Same content for another device still inserts.
        let other = store
            .save_batch("get_fan_hpe_dna", "SW-02", "M-1", "raw", &fan_items("normal"))
            .await
            .unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn error_upsert_is_unique_per_tuple() {
        let store = InMemoryStore::new();
        store
            .upsert_collection_error("M-1", "get_fan", "SW-01", "boom")
            .await
            .unwrap();
        store
            .upsert_collection_error("M-1", "get_fan", "SW-01", "boom again")
            .await
            .unwrap();

        let errors = store.list_collection_errors("M-1").await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_message, "boom again");

        store
            .clear_collection_error("M-1", "get_fan", "SW-01")
            .await
            .unwrap();
        assert!(store
            .get_collection_error("M-1", "get_fan", "SW-01")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn targets_require_new_hostname_and_ip() {
        let store = InMemoryStore::new();
        let full = MaintenanceDevice {
            maintenance_id: "M-1".to_string(),
            old_hostname: Some("SW-OLD-01".to_string()),
            old_ip_address: Some("10.1.1.10".to_string()),
            old_device_type: None,
            new_hostname: Some("SW-NEW-01".to_string()),
            new_ip_address: Some("10.1.1.20".to_string()),
            new_device_type: None,
            use_same_port: true,
            is_reachable: false,
        };
        let mut incomplete = full.clone();
        incomplete.new_hostname = None;
        incomplete.old_hostname = Some("SW-OLD-02".to_string());

        store.upsert_maintenance_device(&full).await.unwrap();
        store.upsert_maintenance_device(&incomplete).await.unwrap();

        let targets = store.list_collection_targets("M-1").await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].target(),
            Some(("SW-NEW-01".to_string(), "10.1.1.20".to_string()))
        );
    }

    #[tokio::test]
    async fn delete_maintenance_cascades() {
        let store = InMemoryStore::new();
        let id = store
            .save_batch("get_fan_hpe_dna", "SW-01", "M-1", "raw", &fan_items("normal"))
            .await
            .unwrap()
            .unwrap();
        store
            .upsert_collection_error("M-1", "get_fan", "SW-01", "x")
            .await
            .unwrap();

        store.delete_maintenance("M-1").await.unwrap();

        assert!(store.latest_batch("get_fan_hpe_dna", "SW-01", "M-1").await.unwrap().is_none());
        assert!(store.batch_items(id).await.is_err());
        assert!(store.list_collection_errors("M-1").await.unwrap().is_empty());
    }
}
