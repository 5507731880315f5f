//! Client-data collection pipeline.
//!
//! Four phases per device:
//!  1. parallel fetch of mac_table / arp_table / interface_status + parse
//!  2. dependent fetch of ACL bindings (needs the interface list) and
//!     batch ping (needs the client IP list), in parallel
//!  3. in-memory assembly of per-MAC client records
//!  4. batch save with the client-record fingerprint rules, then the
//!     downstream comparison regeneration hook

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nmv_domain::{ClientRecord, DeviceType, ParsedRecord, SwitchInfo};
use nmv_fetch::{FetchContext, FetchOutcome, HttpFetcher};
use nmv_parsers::plugins::client::{
    AclCsvParser, ArpCsvParser, InterfaceStatusCsvParser, MacTableCsvParser, PingManyCsvParser,
};
use nmv_store::StateStore;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::CollectError;
use crate::report::{CycleReport, DeviceFailure};

/// The api_name client batches and error rows are filed under.
pub const CLIENT_API_NAME: &str = "client_collection";

const MAC_TABLE_API: &str = "get_mac_table";
const ARP_TABLE_API: &str = "get_arp_table";
const INTERFACE_STATUS_API: &str = "get_interface_status";
const ACL_API: &str = "get_acl_number";
const PING_MANY_API: &str = "ping_batch";

/// Downstream comparison regeneration (external collaborator). Invoked
/// after a client batch insert; must be idempotent and tolerate being a
/// no-op when nothing changed.
#[async_trait]
pub trait ComparisonTrigger: Send + Sync {
    async fn regenerate(&self, maintenance_id: &str);
}

pub struct NoopComparison;

#[async_trait]
impl ComparisonTrigger for NoopComparison {
    async fn regenerate(&self, _maintenance_id: &str) {}
}

pub struct ClientCollectionService {
    store: Arc<dyn StateStore>,
    fetcher: Arc<HttpFetcher>,
    comparison: Arc<dyn ComparisonTrigger>,
    concurrency: usize,
}

impl ClientCollectionService {
    pub fn new(
        store: Arc<dyn StateStore>,
        fetcher: Arc<HttpFetcher>,
        comparison: Arc<dyn ComparisonTrigger>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            comparison,
            concurrency: concurrency.max(1),
        }
    }

    /// Collect client data for every target device of the maintenance.
    pub async fn collect_client_data(
        &self,
        maintenance_id: &str,
        source: Option<&str>,
    ) -> Result<CycleReport, CollectError> {
        let devices = self.store.list_collection_targets(maintenance_id).await?;
        let mut report = CycleReport::new(CLIENT_API_NAME);
        report.total = devices.len();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<Result<usize, DeviceFailure>> = JoinSet::new();

        for device in devices {
            let Some((hostname, ip)) = device.target() else {
                continue;
            };
            let device_type = device.new_device_type.unwrap_or(DeviceType::Hpe);

            let store = self.store.clone();
            let fetcher = self.fetcher.clone();
            let comparison = self.comparison.clone();
            let semaphore = semaphore.clone();
            let maintenance_id = maintenance_id.to_string();
            let source = source.map(str::to_string);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                collect_for_device(
                    store,
                    fetcher,
                    comparison,
                    &maintenance_id,
                    source.as_deref(),
                    hostname,
                    ip,
                    device_type,
                )
                .await
            });
        }

        let mut records_total = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| CollectError::Join(e.to_string()))? {
                Ok(count) => {
                    report.success += 1;
                    records_total += count;
                }
                Err(failure) => {
                    report.failed += 1;
                    report.errors.push(failure);
                }
            }
        }

        info!(
            maintenance_id,
            success = report.success,
            total = report.total,
            client_records = records_total,
            "client collection done"
        );
        Ok(report)
    }
}

fn require_ok(label: &str, hostname: &str, outcome: &FetchOutcome) -> Result<(), String> {
    if outcome.success {
        Ok(())
    } else {
        Err(format!(
            "fetch failed for {label} on {hostname}: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ))
    }
}

#[allow(clippy::too_many_arguments)]
async fn collect_for_device(
    store: Arc<dyn StateStore>,
    fetcher: Arc<HttpFetcher>,
    comparison: Arc<dyn ComparisonTrigger>,
    maintenance_id: &str,
    source: Option<&str>,
    hostname: String,
    ip: String,
    device_type: DeviceType,
) -> Result<usize, DeviceFailure> {
    match run_phases(
        &store, &fetcher, &comparison, maintenance_id, source, &hostname, &ip, device_type,
    )
    .await
    {
        Ok(count) => {
            if let Err(e) = store
                .clear_collection_error(maintenance_id, CLIENT_API_NAME, &hostname)
                .await
            {
                error!(hostname = %hostname, error = %e, "failed to clear collection error");
            }
            Ok(count)
        }
        Err(message) => {
            warn!(hostname = %hostname, error = %message, "client collection failed");
            if let Err(e) = store
                .upsert_collection_error(maintenance_id, CLIENT_API_NAME, &hostname, &message)
                .await
            {
                error!(hostname = %hostname, error = %e, "failed to record CollectionError");
            }
            let sentinel = format!("[CLIENT_ERROR] {message}");
            if let Err(e) = store
                .save_batch(CLIENT_API_NAME, &hostname, maintenance_id, &sentinel, &[])
                .await
            {
                error!(hostname = %hostname, error = %e, "failed to save sentinel batch");
            }
            Err(DeviceFailure {
                switch: hostname,
                error: message,
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_phases(
    store: &Arc<dyn StateStore>,
    fetcher: &Arc<HttpFetcher>,
    comparison: &Arc<dyn ComparisonTrigger>,
    maintenance_id: &str,
    source: Option<&str>,
    hostname: &str,
    ip: &str,
    device_type: DeviceType,
) -> Result<usize, String> {
    let source = source.unwrap_or("default");
    let ctx = || FetchContext::new(SwitchInfo::new(hostname, ip, device_type));

    // ── Phase 1: parallel type-A fetches ──────────────────────────────────
    let mac_ctx = ctx();
    let arp_ctx = ctx();
    let if_ctx = ctx();
    let (mac_result, arp_result, if_result) = tokio::join!(
        fetcher.fetch(MAC_TABLE_API, source, &mac_ctx),
        fetcher.fetch(ARP_TABLE_API, source, &arp_ctx),
        fetcher.fetch(INTERFACE_STATUS_API, source, &if_ctx),
    );
    require_ok(MAC_TABLE_API, hostname, &mac_result)?;
    require_ok(ARP_TABLE_API, hostname, &arp_result)?;
    require_ok(INTERFACE_STATUS_API, hostname, &if_result)?;

    let mac_entries = MacTableCsvParser.parse(&mac_result.raw);
    let arp_entries = ArpCsvParser.parse(&arp_result.raw);
    let if_entries = InterfaceStatusCsvParser.parse(&if_result.raw);

    // ── Phase 2: dependent fetches, parallel to each other ────────────────
    let mut interfaces: Vec<String> = mac_entries
        .iter()
        .map(|e| e.interface_name.clone())
        .collect();
    interfaces.sort();
    interfaces.dedup();

    let mac_to_ip: HashMap<&str, &str> = arp_entries
        .iter()
        .map(|e| (e.mac_address.as_str(), e.ip_address.as_str()))
        .collect();
    let client_ips: Vec<&str> = mac_entries
        .iter()
        .filter_map(|e| mac_to_ip.get(e.mac_address.as_str()).copied())
        .collect();

    let acl_ctx = ctx().with_param("interfaces", interfaces.join(","));
    let ping_ctx = ctx().with_param("switch_ips", client_ips.join(","));

    let (acl_result, ping_result) = tokio::join!(
        fetcher.fetch(ACL_API, source, &acl_ctx),
        fetcher.fetch(PING_MANY_API, source, &ping_ctx),
    );
    require_ok(ACL_API, hostname, &acl_result)?;
    require_ok(PING_MANY_API, hostname, &ping_result)?;

    let acl_entries = AclCsvParser.parse(&acl_result.raw);
    let ping_entries = PingManyCsvParser.parse(&ping_result.raw);

    // ── Phase 3: assemble per-MAC records ─────────────────────────────────
    let if_map: HashMap<&str, _> = if_entries
        .iter()
        .map(|e| (e.interface_name.as_str(), e))
        .collect();
    let acl_map: HashMap<&str, Option<String>> = acl_entries
        .iter()
        .map(|e| (e.interface_name.as_str(), e.acl_number.clone()))
        .collect();
    let ping_map: HashMap<&str, bool> = ping_entries
        .iter()
        .map(|e| (e.target.as_str(), e.is_reachable))
        .collect();

    let mut records = Vec::new();
    for mac_entry in &mac_entries {
        let client_ip = mac_to_ip.get(mac_entry.mac_address.as_str()).copied();
        let if_data = if_map.get(mac_entry.interface_name.as_str());
        let acl = acl_map
            .get(mac_entry.interface_name.as_str())
            .cloned()
            .flatten();

        records.push(ParsedRecord::Client(ClientRecord {
            mac_address: mac_entry.mac_address.clone(),
            ip_address: client_ip.map(str::to_string),
            switch_hostname: Some(hostname.to_string()),
            interface_name: Some(mac_entry.interface_name.clone()),
            vlan_id: Some(mac_entry.vlan_id),
            speed: if_data.and_then(|d| d.speed.clone()),
            duplex: if_data.and_then(|d| d.duplex),
            link_status: if_data.map(|d| d.link_status),
            ping_reachable: client_ip.and_then(|ip| ping_map.get(ip).copied()),
            acl_rules_applied: acl,
        }));
    }
    let count = records.len();

    // ── Phase 4: persist + comparison hook ────────────────────────────────
    let raw = format!(
        "=== mac_table ===\n{}\n=== arp_table ===\n{}\n=== interface_status ===\n{}\n=== acl ===\n{}\n=== ping ===\n{}",
        mac_result.raw, arp_result.raw, if_result.raw, acl_result.raw, ping_result.raw
    );
    let saved = store
        .save_batch(CLIENT_API_NAME, hostname, maintenance_id, &raw, &records)
        .await
        .map_err(|e| e.to_string())?;

    if saved.is_some() {
        // Keep the UI's comparison views current; a redundant call is a
        // tolerated no-op.
        comparison.regenerate(maintenance_id).await;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_config::Settings;
    use nmv_store::{InMemoryStore, MaintenanceDevice};
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingComparison {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ComparisonTrigger for CountingComparison {
        async fn regenerate(&self, _maintenance_id: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn device(mid: &str, hostname: &str, ip: &str) -> MaintenanceDevice {
        MaintenanceDevice {
            maintenance_id: mid.to_string(),
            old_hostname: None,
            old_ip_address: None,
            old_device_type: None,
            new_hostname: Some(hostname.to_string()),
            new_ip_address: Some(ip.to_string()),
            new_device_type: Some(DeviceType::Hpe),
            use_same_port: true,
            is_reachable: false,
        }
    }

    async fn mount_endpoints(server: &MockServer) {
        let bodies = [
            ("/mac/10.1.1.20", "MAC,Interface,VLAN\nAA:BB:CC:11:11:01,GE1/0/1,100\nAA:BB:CC:11:11:02,GE1/0/2,110\n"),
            ("/arp/10.1.1.20", "IP,MAC\n10.1.1.1,AA:BB:CC:11:11:01\n"),
            ("/ifs/10.1.1.20", "Interface,Status,Speed,Duplex\nGE1/0/1,UP,1G,full\nGE1/0/2,DOWN,1G,full\n"),
            ("/acl/10.1.1.20", "Interface,ACL\nGE1/0/1,3001\nGE1/0/2,\n"),
            ("/ping/10.1.1.20", "IP,Reachable\n10.1.1.1,true\n"),
        ];
        for (route, body) in bodies {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(server)
                .await;
        }
    }

    fn fetcher_for(server_url: &str) -> Arc<HttpFetcher> {
        let settings = Settings::from_vars(vec![
            ("FETCHER_ENDPOINT__GET_MAC_TABLE".to_string(), "/mac/{switch_ip}".to_string()),
            ("FETCHER_ENDPOINT__GET_ARP_TABLE".to_string(), "/arp/{switch_ip}".to_string()),
            (
                "FETCHER_ENDPOINT__GET_INTERFACE_STATUS".to_string(),
                "/ifs/{switch_ip}".to_string(),
            ),
            ("FETCHER_ENDPOINT__GET_ACL_NUMBER".to_string(), "/acl/{switch_ip}".to_string()),
            ("FETCHER_ENDPOINT__PING_BATCH".to_string(), "/ping/{switch_ip}".to_string()),
            ("FETCHER_SOURCE__FNA__BASE_URL".to_string(), server_url.to_string()),
        ])
        .unwrap();
        Arc::new(HttpFetcher::new(settings))
    }

    #[tokio::test]
    async fn assembles_client_records_and_triggers_comparison() {
        let server = MockServer::start().await;
        mount_endpoints(&server).await;

        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_maintenance_device(&device("M-1", "SW-01", "10.1.1.20"))
            .await
            .unwrap();

        let comparison = Arc::new(CountingComparison {
            calls: AtomicU32::new(0),
        });
        let svc = ClientCollectionService::new(
            store.clone(),
            fetcher_for(&server.uri()),
            comparison.clone(),
            4,
        );

        let report = svc.collect_client_data("M-1", Some("FNA")).await.unwrap();
        assert_eq!(report.success, 1);
        assert_eq!(report.total, report.success + report.failed);

        let batch = store
            .latest_batch(CLIENT_API_NAME, "SW-01", "M-1")
            .await
            .unwrap()
            .unwrap();
        let items = store.batch_items(batch.id).await.unwrap();
        assert_eq!(items.len(), 2);

        let ParsedRecord::Client(first) = &items[0] else {
            panic!("expected client record")
        };
        assert_eq!(first.mac_address.as_str(), "AA:BB:CC:11:11:01");
        assert_eq!(first.ip_address.as_deref(), Some("10.1.1.1"));
        assert_eq!(first.ping_reachable, Some(true));
        assert_eq!(first.acl_rules_applied.as_deref(), Some("3001"));
        assert_eq!(first.speed.as_deref(), Some("1G"));

        // Second MAC has no ARP entry: no IP, so ping is undetermined —
        // distinctly None, not false.
        let ParsedRecord::Client(second) = &items[1] else {
            panic!("expected client record")
        };
        assert_eq!(second.ip_address, None);
        assert_eq!(second.ping_reachable, None);
        assert_eq!(second.acl_rules_applied, None);

        assert_eq!(comparison.calls.load(Ordering::SeqCst), 1);

        // Second run with identical data: batch skipped, hook not re-fired.
        svc.collect_client_data("M-1", Some("FNA")).await.unwrap();
        assert_eq!(comparison.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn phase1_failure_records_error() {
        let server = MockServer::start().await;
        // Only the MAC endpoint exists; ARP 404s.
        Mock::given(method("GET"))
            .and(path("/mac/10.1.1.20"))
            .respond_with(ResponseTemplate::new(200).set_body_string("MAC,Interface,VLAN\n"))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_maintenance_device(&device("M-1", "SW-01", "10.1.1.20"))
            .await
            .unwrap();

        let svc = ClientCollectionService::new(
            store.clone(),
            fetcher_for(&server.uri()),
            Arc::new(NoopComparison),
            4,
        );

        let report = svc.collect_client_data("M-1", Some("FNA")).await.unwrap();
        assert_eq!(report.failed, 1);

        let error = store
            .get_collection_error("M-1", CLIENT_API_NAME, "SW-01")
            .await
            .unwrap()
            .expect("error row after failed phase");
        assert!(error.error_message.contains("fetch failed"));
    }
}
