//! SNMP-mode indicator collection.
//!
//! Same contract as the API service. A fixed passthrough set (ACL, ping)
//! and any api_name without an SNMP collector delegate to the API
//! service — those indicators cannot be obtained over SNMP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nmv_domain::DeviceType;
use nmv_snmp::{builtin_collectors, SnmpCollector, SnmpEngine, SnmpSessionCache};
use nmv_store::{StateStore, StoreError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::api_service::{accept_partial, tally, ApiCollectionService, CycleOutcome, DeviceOutcome};
use crate::error::CollectError;
use crate::report::CycleReport;
use crate::CollectionService;

/// APIs that stay on the HTTP driver regardless of COLLECTION_MODE.
const API_PASSTHROUGH: &[&str] = &["get_static_acl", "get_dynamic_acl", "gnms_ping", "ping_batch"];

const MAX_DEADLOCK_RETRIES: u32 = 2;

/// Per-cycle SNMP tuning lifted from [`nmv_config::Settings`].
#[derive(Debug, Clone)]
pub struct SnmpCycleConfig {
    pub communities: Vec<String>,
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
    pub concurrency: usize,
    pub collector_retries: u32,
}

impl SnmpCycleConfig {
    pub fn from_settings(settings: &nmv_config::Settings) -> Self {
        Self {
            communities: settings.snmp_communities.clone(),
            port: settings.snmp_port,
            timeout: settings.snmp_timeout,
            retries: settings.snmp_retries,
            concurrency: settings.snmp_concurrency,
            collector_retries: settings.snmp_collector_retries,
        }
    }
}

pub struct SnmpCollectionService {
    store: Arc<dyn StateStore>,
    /// Shared across all cycles; read-only after construction.
    engine: Arc<dyn SnmpEngine>,
    collectors: HashMap<&'static str, Arc<dyn SnmpCollector>>,
    api_fallback: Arc<ApiCollectionService>,
    config: SnmpCycleConfig,
}

impl SnmpCollectionService {
    pub fn new(
        store: Arc<dyn StateStore>,
        engine: Arc<dyn SnmpEngine>,
        api_fallback: Arc<ApiCollectionService>,
        config: SnmpCycleConfig,
    ) -> Self {
        Self::with_collectors(store, engine, api_fallback, config, builtin_collectors())
    }

    /// Constructor taking an explicit collector set (tests script their
    /// own collectors through this).
    pub fn with_collectors(
        store: Arc<dyn StateStore>,
        engine: Arc<dyn SnmpEngine>,
        api_fallback: Arc<ApiCollectionService>,
        config: SnmpCycleConfig,
        collectors: Vec<Arc<dyn SnmpCollector>>,
    ) -> Self {
        Self {
            store,
            engine,
            collectors: collectors.into_iter().map(|c| (c.api_name(), c)).collect(),
            api_fallback,
            config: SnmpCycleConfig {
                concurrency: config.concurrency.max(1),
                ..config
            },
        }
    }

    async fn do_collect(
        &self,
        api_name: &str,
        collector: Arc<dyn SnmpCollector>,
        maintenance_id: &str,
    ) -> Result<CycleOutcome, CollectError> {
        // Fresh session cache per cycle: communities and topology can
        // change between cycles, so probe results never carry over.
        let session_cache = Arc::new(SnmpSessionCache::new(
            self.engine.clone(),
            self.config.communities.clone(),
            self.config.port,
            self.config.timeout,
            self.config.retries,
        ));

        let devices = self.store.list_collection_targets(maintenance_id).await?;
        let total = devices.len();

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks: JoinSet<DeviceOutcome> = JoinSet::new();

        for device in devices {
            let Some((hostname, ip)) = device.target() else {
                continue;
            };
            let device_type = device.new_device_type.unwrap_or(DeviceType::Hpe);

            let store = self.store.clone();
            let engine = self.engine.clone();
            let collector = collector.clone();
            let session_cache = session_cache.clone();
            let semaphore = semaphore.clone();
            let api_name = api_name.to_string();
            let maintenance_id = maintenance_id.to_string();
            let collector_retries = self.config.collector_retries;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                collect_one_device(
                    store,
                    engine,
                    collector,
                    session_cache,
                    &api_name,
                    &maintenance_id,
                    hostname,
                    ip,
                    device_type,
                    collector_retries,
                )
                .await
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| CollectError::Join(e.to_string()))?);
        }
        Ok(tally(api_name, total, outcomes))
    }
}

#[allow(clippy::too_many_arguments)]
async fn collect_one_device(
    store: Arc<dyn StateStore>,
    engine: Arc<dyn SnmpEngine>,
    collector: Arc<dyn SnmpCollector>,
    session_cache: Arc<SnmpSessionCache>,
    api_name: &str,
    maintenance_id: &str,
    hostname: String,
    ip: String,
    device_type: DeviceType,
    collector_retries: u32,
) -> DeviceOutcome {
    // Community probe, then the indicator program with timeout retry.
    let collected = async {
        let target = session_cache.get_target(&ip).await?;
        collector
            .collect_with_retry(
                &target,
                device_type,
                &session_cache,
                engine.as_ref(),
                collector_retries,
            )
            .await
    }
    .await;

    match collected {
        Ok((raw, items)) => {
            match store
                .save_batch(api_name, &hostname, maintenance_id, &raw, &items)
                .await
            {
                Ok(saved) => {
                    if saved.is_some() {
                        info!(api_name, hostname = %hostname, items = items.len(), "SNMP collected (new batch)");
                    } else {
                        debug!(api_name, hostname = %hostname, "SNMP collected, unchanged — skipped");
                    }
                    if let Err(e) = store
                        .clear_collection_error(maintenance_id, api_name, &hostname)
                        .await
                    {
                        error!(hostname = %hostname, error = %e, "failed to clear collection error");
                    }
                    DeviceOutcome::Ok
                }
                Err(StoreError::Deadlock(message)) => DeviceOutcome::Deadlock {
                    switch: hostname,
                    error: message,
                },
                Err(e) => record_snmp_failure(&store, maintenance_id, api_name, hostname, e.to_string()).await,
            }
        }
        Err(e) => record_snmp_failure(&store, maintenance_id, api_name, hostname, e.to_string()).await,
    }
}

async fn record_snmp_failure(
    store: &Arc<dyn StateStore>,
    maintenance_id: &str,
    api_name: &str,
    hostname: String,
    message: String,
) -> DeviceOutcome {
    warn!(api_name, hostname = %hostname, error = %message, "SNMP device collection failed");
    if let Err(e) = store
        .upsert_collection_error(maintenance_id, api_name, &hostname, &message)
        .await
    {
        error!(hostname = %hostname, error = %e, "failed to record CollectionError");
    }
    // Sentinel batch with zero items keeps the failure visible in history.
    let sentinel = format!("[SNMP_ERROR] {message}");
    if let Err(e) = store
        .save_batch(api_name, &hostname, maintenance_id, &sentinel, &[])
        .await
    {
        error!(hostname = %hostname, error = %e, "failed to save sentinel batch");
    }
    DeviceOutcome::Failed {
        switch: hostname,
        error: message,
    }
}

#[async_trait]
impl CollectionService for SnmpCollectionService {
    async fn collect(
        &self,
        api_name: &str,
        source: Option<&str>,
        maintenance_id: &str,
    ) -> Result<CycleReport, CollectError> {
        if API_PASSTHROUGH.contains(&api_name) {
            return self.api_fallback.collect(api_name, source, maintenance_id).await;
        }
        let Some(collector) = self.collectors.get(api_name).cloned() else {
            warn!(api_name, "no SNMP collector, falling back to API driver");
            return self.api_fallback.collect(api_name, source, maintenance_id).await;
        };

        let mut outcome = self
            .do_collect(api_name, collector.clone(), maintenance_id)
            .await?;
        for attempt in 0..MAX_DEADLOCK_RETRIES {
            if outcome.deadlocks.is_empty() {
                return Ok(outcome.report);
            }
            warn!(api_name, attempt = attempt + 1, "deadlock during SNMP cycle, retrying");
            tokio::time::sleep(Duration::from_millis(300 * (attempt as u64 + 1))).await;
            outcome = self
                .do_collect(api_name, collector.clone(), maintenance_id)
                .await?;
        }
        // Retry budget spent: report the deadlocked devices as failures.
        Ok(accept_partial(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_config::Settings;
    use nmv_domain::{FanStatus, ParsedRecord};
    use nmv_fetch::HttpFetcher;
    use nmv_parsers::ParserRegistry;
    use nmv_snmp::{MockSnmpEngine, SnmpError, SnmpTarget};
    use nmv_store::{InMemoryStore, MaintenanceDevice};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn cycle_config() -> SnmpCycleConfig {
        SnmpCycleConfig {
            communities: vec!["public".to_string()],
            port: 161,
            timeout: Duration::from_millis(200),
            retries: 0,
            concurrency: 8,
            collector_retries: 0,
        }
    }

    fn api_fallback(store: Arc<dyn StateStore>) -> Arc<ApiCollectionService> {
        Arc::new(ApiCollectionService::new(
            store,
            Arc::new(ParserRegistry::with_builtin_parsers().unwrap()),
            Arc::new(HttpFetcher::new(Settings::from_vars(vec![]).unwrap())),
            4,
        ))
    }

    fn device(mid: &str, hostname: &str, ip: &str) -> MaintenanceDevice {
        MaintenanceDevice {
            maintenance_id: mid.to_string(),
            old_hostname: Some(format!("{hostname}-OLD")),
            old_ip_address: None,
            old_device_type: None,
            new_hostname: Some(hostname.to_string()),
            new_ip_address: Some(ip.to_string()),
            new_device_type: Some(DeviceType::Hpe),
            use_same_port: true,
            is_reachable: false,
        }
    }

    /// Fails the first `fail_cycles` invocations with a timeout, then
    /// succeeds with one fan record.
    struct FlakyCollector {
        calls: AtomicU32,
        fail_cycles: u32,
    }

    #[async_trait]
    impl SnmpCollector for FlakyCollector {
        fn api_name(&self) -> &'static str {
            "get_fan"
        }

        async fn collect(
            &self,
            _target: &SnmpTarget,
            _device_type: DeviceType,
            _cache: &SnmpSessionCache,
            _engine: &dyn SnmpEngine,
        ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_cycles {
                return Err(SnmpError::Timeout("simulated device timeout".to_string()));
            }
            Ok((
                "SNMP Collector: get_fan".to_string(),
                vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", "normal"))],
            ))
        }
    }

    fn snmp_service(
        store: Arc<dyn StateStore>,
        collector: Arc<dyn SnmpCollector>,
    ) -> SnmpCollectionService {
        SnmpCollectionService::with_collectors(
            store.clone(),
            Arc::new(MockSnmpEngine::new()),
            api_fallback(store),
            cycle_config(),
            vec![collector],
        )
    }

    #[tokio::test]
    async fn error_lifecycle_across_two_cycles() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_maintenance_device(&device("M-1", "SW-02", "10.1.1.22"))
            .await
            .unwrap();

        let svc = snmp_service(
            store.clone(),
            Arc::new(FlakyCollector {
                calls: AtomicU32::new(0),
                fail_cycles: 1,
            }),
        );

        // Cycle 1: timeout → error row + empty sentinel batch.
        let report = svc.collect("get_fan", None, "M-1").await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, report.success + report.failed);

        let error = store
            .get_collection_error("M-1", "get_fan", "SW-02")
            .await
            .unwrap()
            .expect("exactly one error row after failure");
        assert!(error.error_message.contains("timeout"));

        let sentinel = store
            .latest_batch("get_fan", "SW-02", "M-1")
            .await
            .unwrap()
            .unwrap();
        assert!(sentinel.raw_data.starts_with("[SNMP_ERROR]"));
        assert!(store.batch_items(sentinel.id).await.unwrap().is_empty());

        // Cycle 2: success → error row gone, non-empty batch present.
        let report = svc.collect("get_fan", None, "M-1").await.unwrap();
        assert_eq!(report.success, 1);

        assert!(store
            .get_collection_error("M-1", "get_fan", "SW-02")
            .await
            .unwrap()
            .is_none());
        let batch = store
            .latest_batch("get_fan", "SW-02", "M-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.batch_items(batch.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn passthrough_delegates_to_api_service() {
        let store = Arc::new(InMemoryStore::new());
        let svc = snmp_service(
            store,
            Arc::new(FlakyCollector {
                calls: AtomicU32::new(0),
                fail_cycles: 0,
            }),
        );

        // ping_batch has no SNMP path; the report comes from the API
        // service but keeps the requested api_name.
        let report = svc.collect("ping_batch", None, "M-1").await.unwrap();
        assert_eq!(report.api_name, "ping_batch");
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn unknown_api_name_falls_back_to_api_service() {
        let store = Arc::new(InMemoryStore::new());
        let svc = snmp_service(
            store,
            Arc::new(FlakyCollector {
                calls: AtomicU32::new(0),
                fail_cycles: 0,
            }),
        );
        let report = svc.collect("get_something_else", None, "M-1").await.unwrap();
        assert_eq!(report.api_name, "get_something_else");
    }

    #[tokio::test]
    async fn mixed_outcomes_keep_the_counting_invariant() {
        let store = Arc::new(InMemoryStore::new());
        for (host, ip) in [("SW-01", "10.1.1.20"), ("SW-02", "10.1.1.21"), ("SW-03", "10.1.1.22")] {
            store
                .upsert_maintenance_device(&device("M-1", host, ip))
                .await
                .unwrap();
        }

        // Fails exactly one call in the whole cycle (whichever device
        // draws it first) and succeeds for the rest.
        let svc = snmp_service(
            store,
            Arc::new(FlakyCollector {
                calls: AtomicU32::new(0),
                fail_cycles: 1,
            }),
        );

        let report = svc.collect("get_fan", None, "M-1").await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.total, report.success + report.failed);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
    }
}
