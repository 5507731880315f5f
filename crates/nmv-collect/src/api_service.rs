//! API-mode indicator collection: template-driven HTTP fetch + registry
//! parse, fanned out over the maintenance device list under a bounded
//! semaphore.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nmv_domain::{DeviceType, SwitchInfo};
use nmv_fetch::{FetchContext, HttpFetcher};
use nmv_parsers::{Parser, ParserRegistry};
use nmv_store::{StateStore, StoreError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::CollectError;
use crate::report::{CycleReport, DeviceFailure};
use crate::CollectionService;

const MAX_DEADLOCK_RETRIES: u32 = 2;

pub(crate) enum DeviceOutcome {
    Ok,
    Failed { switch: String, error: String },
    Deadlock { switch: String, error: String },
}

pub(crate) struct CycleOutcome {
    pub report: CycleReport,
    pub deadlocks: Vec<DeviceFailure>,
}

/// Fold device outcomes into a report, separating deadlocks so the caller
/// can decide between retrying the cycle and accepting partial failure.
pub(crate) fn tally(api_name: &str, total: usize, outcomes: Vec<DeviceOutcome>) -> CycleOutcome {
    let mut report = CycleReport::new(api_name);
    report.total = total;
    let mut deadlocks = Vec::new();
    for outcome in outcomes {
        match outcome {
            DeviceOutcome::Ok => report.success += 1,
            DeviceOutcome::Failed { switch, error } => {
                report.failed += 1;
                report.errors.push(DeviceFailure { switch, error });
            }
            DeviceOutcome::Deadlock { switch, error } => {
                deadlocks.push(DeviceFailure { switch, error });
            }
        }
    }
    CycleOutcome { report, deadlocks }
}

/// Fold unresolved deadlocks into plain failures (retry budget spent).
pub(crate) fn accept_partial(mut outcome: CycleOutcome) -> CycleReport {
    for failure in outcome.deadlocks {
        outcome.report.failed += 1;
        outcome.report.errors.push(failure);
    }
    outcome.report
}

pub struct ApiCollectionService {
    store: Arc<dyn StateStore>,
    registry: Arc<ParserRegistry>,
    fetcher: Arc<HttpFetcher>,
    concurrency: usize,
}

impl ApiCollectionService {
    pub fn new(
        store: Arc<dyn StateStore>,
        registry: Arc<ParserRegistry>,
        fetcher: Arc<HttpFetcher>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            registry,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve the parser for a job name. Schedules may carry either the
    /// full parser name (`get_fan_hpe_dna`) or the base indicator name
    /// (`get_fan`) — the latter resolves through the
    /// `{api}_{vendor}_{source}` composite. Cross-vendor parsers sit at
    /// the device-type-absent fallback position; `get_or_raise` has the
    /// last word so a miss carries the available-parser list.
    fn resolve_parser(
        &self,
        api_name: &str,
        source: Option<&str>,
        device_type: DeviceType,
    ) -> Result<Arc<dyn Parser>, String> {
        if let Some(parser) = self.registry.get(api_name, Some(device_type)) {
            return Ok(parser);
        }
        if let Some(source) = source {
            let composite = format!(
                "{api_name}_{}_{}",
                device_type.api_value(),
                source.to_ascii_lowercase()
            );
            if let Some(parser) = self.registry.get(&composite, Some(device_type)) {
                return Ok(parser);
            }
        }
        self.registry
            .get_or_raise(api_name, Some(device_type))
            .map_err(|e| e.to_string())
    }

    async fn do_collect(
        &self,
        api_name: &str,
        source: Option<&str>,
        maintenance_id: &str,
    ) -> Result<CycleOutcome, CollectError> {
        let devices = self.store.list_collection_targets(maintenance_id).await?;
        let total = devices.len();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<DeviceOutcome> = JoinSet::new();

        for device in devices {
            let Some((hostname, ip)) = device.target() else {
                continue; // filtered by the store query already
            };
            let device_type = device.new_device_type.unwrap_or(DeviceType::Hpe);
            let parser = self.resolve_parser(api_name, source, device_type);

            let store = self.store.clone();
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let api_name = api_name.to_string();
            let source = source.map(str::to_string);
            let maintenance_id = maintenance_id.to_string();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                collect_one_device(
                    store, fetcher, parser, &api_name, source.as_deref(), &maintenance_id,
                    hostname, ip, device_type,
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
    fetcher: Arc<HttpFetcher>,
    parser: Result<Arc<dyn Parser>, String>,
    api_name: &str,
    source: Option<&str>,
    maintenance_id: &str,
    hostname: String,
    ip: String,
    device_type: DeviceType,
) -> DeviceOutcome {
    let fail = |error: String| DeviceOutcome::Failed {
        switch: hostname.clone(),
        error,
    };

    let parser = match parser {
        Ok(parser) => parser,
        Err(message) => {
            return record_failure(&store, maintenance_id, api_name, &hostname, &message, fail)
                .await;
        }
    };

    let ctx = FetchContext::new(SwitchInfo::new(hostname.clone(), ip.clone(), device_type));
    let outcome = fetcher
        .fetch(api_name, source.unwrap_or("default"), &ctx)
        .await;

    if !outcome.success {
        let message = outcome
            .error
            .unwrap_or_else(|| "fetch failed".to_string());
        return record_failure(&store, maintenance_id, api_name, &hostname, &message, fail).await;
    }

    let items = parser.parse(&outcome.raw);
    match store
        .save_batch(api_name, &hostname, maintenance_id, &outcome.raw, &items)
        .await
    {
        Ok(saved) => {
            if saved.is_some() {
                info!(api_name, hostname = %hostname, items = items.len(), "collected (new batch)");
            } else {
                debug!(api_name, hostname = %hostname, "collected, unchanged — skipped");
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
            switch: hostname.clone(),
            error: message,
        },
        Err(e) => {
            let message = e.to_string();
            record_failure(&store, maintenance_id, api_name, &hostname, &message, fail).await
        }
    }
}

/// Upsert the error row and write the sentinel empty batch so the UI can
/// show "0 items" instead of a gap.
async fn record_failure(
    store: &Arc<dyn StateStore>,
    maintenance_id: &str,
    api_name: &str,
    hostname: &str,
    message: &str,
    fail: impl Fn(String) -> DeviceOutcome,
) -> DeviceOutcome {
    warn!(api_name, hostname = %hostname, error = message, "device collection failed");
    if let Err(e) = store
        .upsert_collection_error(maintenance_id, api_name, hostname, message)
        .await
    {
        error!(hostname = %hostname, error = %e, "failed to record CollectionError");
    }
    let sentinel = format!("[FETCH_ERROR] {message}");
    if let Err(e) = store
        .save_batch(api_name, hostname, maintenance_id, &sentinel, &[])
        .await
    {
        error!(hostname = %hostname, error = %e, "failed to save sentinel batch");
    }
    fail(message.to_string())
}

#[async_trait]
impl CollectionService for ApiCollectionService {
    async fn collect(
        &self,
        api_name: &str,
        source: Option<&str>,
        maintenance_id: &str,
    ) -> Result<CycleReport, CollectError> {
        let mut outcome = self.do_collect(api_name, source, maintenance_id).await?;
        for attempt in 0..MAX_DEADLOCK_RETRIES {
            if outcome.deadlocks.is_empty() {
                return Ok(outcome.report);
            }
            warn!(api_name, attempt = attempt + 1, "deadlock during cycle, retrying");
            tokio::time::sleep(Duration::from_millis(300 * (attempt as u64 + 1))).await;
            outcome = self.do_collect(api_name, source, maintenance_id).await?;
        }
        // Retry budget spent: report the deadlocked devices as failures.
        Ok(accept_partial(outcome))
    }
}
