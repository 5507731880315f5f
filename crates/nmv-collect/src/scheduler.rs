//! Interval scheduler for collection jobs.
//!
//! One tokio task per job, looping on `tokio::time::interval` with
//! `MissedTickBehavior::Skip` so missed ticks coalesce into a single
//! catch-up run. The loop awaits each cycle before sleeping again, which
//! enforces at most one in-flight cycle per job. Adding a job under an
//! existing name replaces it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::client_service::ClientCollectionService;
use crate::CollectionService;

/// Job name that routes to the client-collection pipeline instead of the
/// indicator service.
pub const CLIENT_COLLECTION_JOB: &str = "client-collection";

struct Job {
    handle: JoinHandle<()>,
    interval_seconds: u64,
    maintenance_id: String,
    source: Option<String>,
    runs_started: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub name: String,
    pub interval_seconds: u64,
    pub maintenance_id: String,
    pub source: Option<String>,
    pub runs_started: u64,
}

pub struct Scheduler {
    indicator: Arc<dyn CollectionService>,
    client: Arc<ClientCollectionService>,
    jobs: Mutex<HashMap<String, Job>>,
}

impl Scheduler {
    pub fn new(indicator: Arc<dyn CollectionService>, client: Arc<ClientCollectionService>) -> Self {
        Self {
            indicator,
            client,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Register a job, replacing any existing one of the same name. The
    /// job name doubles as the api_name except for
    /// [`CLIENT_COLLECTION_JOB`].
    pub async fn add_collection_job(
        &self,
        job_name: &str,
        interval_seconds: u64,
        maintenance_id: &str,
        source: Option<&str>,
    ) {
        let runs_started = Arc::new(AtomicU64::new(0));

        let indicator = self.indicator.clone();
        let client = self.client.clone();
        let name = job_name.to_string();
        let mid = maintenance_id.to_string();
        let src = source.map(str::to_string);
        let runs = runs_started.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first run happens one interval from now.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                runs.fetch_add(1, Ordering::Relaxed);
                run_once(&name, &mid, src.as_deref(), &indicator, &client).await;
            }
        });

        let mut jobs = self.jobs.lock().await;
        if let Some(old) = jobs.insert(
            job_name.to_string(),
            Job {
                handle,
                interval_seconds,
                maintenance_id: maintenance_id.to_string(),
                source: source.map(str::to_string),
                runs_started,
            },
        ) {
            old.handle.abort();
            info!(job_name, "replaced existing collection job");
        } else {
            info!(job_name, interval_seconds, "added collection job");
        }
    }

    pub async fn remove_job(&self, job_name: &str) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.remove(job_name) {
            Some(job) => {
                job.handle.abort();
                info!(job_name, "removed collection job");
                true
            }
            None => false,
        }
    }

    pub async fn jobs(&self) -> Vec<JobInfo> {
        let jobs = self.jobs.lock().await;
        let mut infos: Vec<JobInfo> = jobs
            .iter()
            .map(|(name, job)| JobInfo {
                name: name.clone(),
                interval_seconds: job.interval_seconds,
                maintenance_id: job.maintenance_id.clone(),
                source: job.source.clone(),
                runs_started: job.runs_started.load(Ordering::Relaxed),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Abort every job task and wait for them to wind down.
    pub async fn stop(&self) {
        let mut jobs = self.jobs.lock().await;
        for (name, job) in jobs.drain() {
            job.handle.abort();
            let _ = job.handle.await;
            info!(job = %name, "stopped collection job");
        }
    }
}

async fn run_once(
    job_name: &str,
    maintenance_id: &str,
    source: Option<&str>,
    indicator: &Arc<dyn CollectionService>,
    client: &Arc<ClientCollectionService>,
) {
    info!(job_name, "running scheduled collection");
    let result = if job_name == CLIENT_COLLECTION_JOB {
        client.collect_client_data(maintenance_id, source).await
    } else {
        indicator.collect(job_name, source, maintenance_id).await
    };
    match result {
        Ok(report) => info!(
            job_name,
            success = report.success,
            total = report.total,
            "collection complete"
        ),
        Err(e) => error!(job_name, error = %e, "collection failed"),
    }
}
