use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

// ── Raw YAML shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSchedule {
    #[serde(default)]
    jobs: Vec<RawJob>,
    #[serde(default)]
    fetchers: std::collections::BTreeMap<String, RawFetcher>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    name: String,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFetcher {
    source: String,
}

fn default_interval() -> u64 {
    30
}

// ── Converted schedule ────────────────────────────────────────────────────────

/// One scheduled collection job. `name` doubles as the api_name except for
/// the special `client-collection` job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub interval_seconds: u64,
    pub source: Option<String>,
}

/// api_name → source-group binding for the HTTP fetcher layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherBinding {
    pub api_name: String,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub jobs: Vec<JobSpec>,
    pub fetchers: Vec<FetcherBinding>,
}

/// Load and validate the schedule file.
///
/// Expected layout:
/// ```yaml
/// jobs:
///   - name: get_fan_hpe_dna
///     interval_seconds: 60
///     source: DNA
/// fetchers:
///   get_fan_hpe_dna:
///     source: DNA
/// ```
pub fn load_schedule(path: &Path) -> Result<Schedule, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let raw: RawSchedule = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut jobs = Vec::new();
    for job in raw.jobs {
        if job.name.trim().is_empty() {
            return Err(ConfigError::InvalidJob {
                name: job.name,
                message: "empty job name".to_string(),
            });
        }
        if job.interval_seconds == 0 {
            return Err(ConfigError::InvalidJob {
                name: job.name,
                message: "interval_seconds must be positive".to_string(),
            });
        }
        jobs.push(JobSpec {
            name: job.name,
            interval_seconds: job.interval_seconds,
            source: job.source,
        });
    }

    let fetchers = raw
        .fetchers
        .into_iter()
        .map(|(api_name, f)| FetcherBinding {
            api_name,
            source: f.source,
        })
        .collect::<Vec<_>>();

    debug!(jobs = jobs.len(), fetchers = fetchers.len(), "loaded schedule");
    Ok(Schedule { jobs, fetchers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_schedule(yaml: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(yaml.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_jobs_and_fetchers() {
        let f = write_schedule(
            r#"
jobs:
  - name: get_fan_hpe_dna
    interval_seconds: 60
    source: DNA
  - name: client-collection
fetchers:
  get_fan_hpe_dna:
    source: DNA
  get_uplink_hpe_fna:
    source: FNA
"#,
        );
        let schedule = load_schedule(f.path()).unwrap();
        assert_eq!(schedule.jobs.len(), 2);
        assert_eq!(schedule.jobs[0].interval_seconds, 60);
        // default interval applies when omitted
        assert_eq!(schedule.jobs[1].interval_seconds, 30);
        assert_eq!(schedule.fetchers.len(), 2);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let f = write_schedule("jobs:\n  - name: get_fan_hpe_dna\n    interval_seconds: 0\n");
        let err = load_schedule(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJob { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_schedule(Path::new("/nonexistent/schedule.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
