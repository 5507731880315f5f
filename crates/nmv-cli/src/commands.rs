use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use nmv_api::{build_app, AppState};
use nmv_collect::snmp_service::SnmpCycleConfig;
use nmv_collect::{
    ApiCollectionService, ClientCollectionService, CollectionService, NoopComparison, Scheduler,
    SnmpCollectionService,
};
use nmv_config::{load_schedule, CollectionMode, Settings};
use nmv_fetch::HttpFetcher;
use nmv_parsers::ParserRegistry;
use nmv_snmp::{MockSnmpEngine, SnmpEngine, SnmpEngineConfig, UdpSnmpEngine, UplinkPlan};
use nmv_store::{InMemoryStore, PostgresStore, StateStore};
use tracing::info;

/// Everything a collection run needs, wired once from settings.
struct Runtime {
    store: Arc<dyn StateStore>,
    indicator: Arc<dyn CollectionService>,
    client: Arc<ClientCollectionService>,
}

async fn build_store(settings: &Settings, memory_store: bool) -> Result<Arc<dyn StateStore>> {
    if memory_store {
        info!("using in-memory store");
        return Ok(Arc::new(InMemoryStore::new()));
    }
    let store = PostgresStore::connect(&settings.database_url)
        .await
        .context("connecting to postgres")?;
    Ok(Arc::new(store))
}

/// Feed the maintenance's uplink expectations to the mock engine so its
/// LLDP/CDP answers match the expected topology.
async fn build_uplink_plan(
    store: &Arc<dyn StateStore>,
    maintenance_id: &str,
) -> Result<UplinkPlan> {
    let targets = store.list_collection_targets(maintenance_id).await?;
    let expectations = store.list_uplink_expectations(maintenance_id).await?;

    let mut plan = UplinkPlan::new();
    for device in &targets {
        let Some((hostname, ip)) = device.target() else {
            continue;
        };
        let neighbors: Vec<(String, String, String)> = expectations
            .iter()
            .filter(|e| e.hostname == hostname)
            .map(|e| {
                (
                    e.local_interface.clone(),
                    e.expected_neighbor.clone(),
                    e.expected_interface.clone(),
                )
            })
            .collect();
        if !neighbors.is_empty() {
            plan.insert(ip, neighbors);
        }
    }
    Ok(plan)
}

async fn build_runtime(
    settings: &Settings,
    maintenance_id: &str,
    memory_store: bool,
) -> Result<Runtime> {
    let store = build_store(settings, memory_store).await?;

    let registry = Arc::new(
        ParserRegistry::with_builtin_parsers().context("building parser registry")?,
    );
    if settings.use_mock_api {
        // The API driver has no in-process mock; mock runs point the
        // FETCHER_SOURCE base URLs at a local mock collector instead.
        tracing::warn!("USE_MOCK_API set: expecting FETCHER_SOURCE__* to target a mock collector");
    }
    let fetcher = Arc::new(HttpFetcher::new(settings.clone()));

    let api_service = Arc::new(ApiCollectionService::new(
        store.clone(),
        registry,
        fetcher.clone(),
        settings.snmp_concurrency,
    ));

    let indicator: Arc<dyn CollectionService> = match settings.collection_mode {
        CollectionMode::Api => api_service.clone(),
        CollectionMode::Snmp => {
            let engine: Arc<dyn SnmpEngine> = if settings.snmp_mock {
                let plan = build_uplink_plan(&store, maintenance_id).await?;
                Arc::new(MockSnmpEngine::new().with_uplink_plan(plan))
            } else {
                Arc::new(UdpSnmpEngine::new(SnmpEngineConfig {
                    max_repetitions: settings.snmp_max_repetitions,
                    walk_timeout: settings.snmp_walk_timeout,
                }))
            };
            Arc::new(SnmpCollectionService::new(
                store.clone(),
                engine,
                api_service.clone(),
                SnmpCycleConfig::from_settings(settings),
            ))
        }
    };

    let client = Arc::new(ClientCollectionService::new(
        store.clone(),
        fetcher,
        Arc::new(NoopComparison),
        settings.snmp_concurrency,
    ));

    Ok(Runtime {
        store,
        indicator,
        client,
    })
}

pub async fn serve(schedule: PathBuf, maintenance_id: String, memory_store: bool) -> Result<()> {
    let settings = Settings::from_env().context("reading settings from environment")?;
    let schedule = load_schedule(&schedule).context("loading schedule file")?;
    let runtime = build_runtime(&settings, &maintenance_id, memory_store).await?;

    let scheduler = Arc::new(Scheduler::new(
        runtime.indicator.clone(),
        runtime.client.clone(),
    ));
    // Jobs without an explicit source fall back to their fetcher binding.
    let bindings: std::collections::HashMap<&str, &str> = schedule
        .fetchers
        .iter()
        .map(|f| (f.api_name.as_str(), f.source.as_str()))
        .collect();
    for job in &schedule.jobs {
        let source = job
            .source
            .as_deref()
            .or_else(|| bindings.get(job.name.as_str()).copied());
        scheduler
            .add_collection_job(&job.name, job.interval_seconds, &maintenance_id, source)
            .await;
    }
    info!(jobs = schedule.jobs.len(), maintenance_id = %maintenance_id, "scheduler running");

    let app = build_app(AppState {
        store: runtime.store,
        indicator: runtime.indicator,
        client: runtime.client,
        scheduler: scheduler.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "status API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serving API")?;

    scheduler.stop().await;
    Ok(())
}

pub async fn collect(
    api_name: String,
    maintenance_id: String,
    source: Option<String>,
    memory_store: bool,
) -> Result<()> {
    let settings = Settings::from_env().context("reading settings from environment")?;
    let runtime = build_runtime(&settings, &maintenance_id, memory_store).await?;

    let report = if api_name == nmv_collect::scheduler::CLIENT_COLLECTION_JOB {
        runtime
            .client
            .collect_client_data(&maintenance_id, source.as_deref())
            .await?
    } else {
        runtime
            .indicator
            .collect(&api_name, source.as_deref(), &maintenance_id)
            .await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn parsers() -> Result<()> {
    let registry = ParserRegistry::with_builtin_parsers().context("building parser registry")?;
    for key in registry.keys() {
        let device = key
            .device_type
            .map(|d| d.to_string())
            .unwrap_or_else(|| "*".to_string());
        println!("{:<12} {}", device, key.api_name);
    }
    Ok(())
}
