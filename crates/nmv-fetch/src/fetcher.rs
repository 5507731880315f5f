//! Template-driven HTTP fetcher.
//!
//! One generic fetcher serves every API-mode indicator: the endpoint path
//! template and the source group (base URL + timeout) are configuration,
//! not code. `fetch` never returns an error — failures come back as a
//! `FetchOutcome` with `success = false` so the collection service can
//! record them per device without unwinding the cycle.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use nmv_config::Settings;
use nmv_domain::SwitchInfo;
use regex::Regex;
use tracing::debug;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Per-call context: the target device plus ad-hoc parameters. Ad-hoc
/// parameters win over the fixed fields on key collision and any key can
/// appear as a path placeholder; leftovers become query parameters.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub switch: SwitchInfo,
    pub params: BTreeMap<String, String>,
}

impl FetchContext {
    pub fn new(switch: SwitchInfo) -> Self {
        Self {
            switch,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Fixed placeholder vocabulary merged with the ad-hoc params.
    fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("switch_ip".to_string(), self.switch.ip_address.clone());
        vars.insert("ip".to_string(), self.switch.ip_address.clone());
        vars.insert("hostname".to_string(), self.switch.hostname.clone());
        vars.insert(
            "device_type".to_string(),
            self.switch.device_type.api_value().to_string(),
        );
        vars.insert(
            "tenant_group".to_string(),
            self.switch
                .tenant_group
                .clone()
                .unwrap_or_else(|| "default".to_string()),
        );
        // per-call params override the fixed fields
        for (key, value) in &self.params {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }
}

/// Result of one fetch. `success = false` carries a human-readable error
/// and an empty raw body; the caller records a `CollectionError` from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub raw: String,
    pub success: bool,
    pub error: Option<String>,
}

impl FetchOutcome {
    fn ok(raw: String) -> Self {
        Self {
            raw,
            success: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            raw: String::new(),
            success: false,
            error: Some(error),
        }
    }
}

/// The generic GET fetcher. Holds a pooled client; endpoint templates and
/// source groups come from [`Settings`].
pub struct HttpFetcher {
    client: reqwest::Client,
    settings: Settings,
}

impl HttpFetcher {
    pub fn new(settings: Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Fetch raw output for `api_name` from `source` for one device.
    ///
    /// Path placeholders are substituted from the merged variable map; any
    /// unconsumed variable becomes a query parameter. Always GET. Non-2xx,
    /// timeouts and transport errors all map to a failed outcome.
    pub async fn fetch(&self, api_name: &str, source: &str, ctx: &FetchContext) -> FetchOutcome {
        let Some(source_config) = self.settings.fetcher_sources.get(&source.to_ascii_lowercase())
        else {
            return FetchOutcome::failed(format!(
                "unknown source '{source}' for fetcher '{api_name}'"
            ));
        };
        let Some(template) = self
            .settings
            .fetcher_endpoints
            .get(&api_name.to_ascii_lowercase())
        else {
            return FetchOutcome::failed(format!("no endpoint configured for fetcher '{api_name}'"));
        };

        let vars = ctx.variables();

        // Substitute path placeholders; track which keys were consumed.
        let mut consumed: Vec<&str> = Vec::new();
        let endpoint = PLACEHOLDER_RE
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                match vars.get(key) {
                    Some(value) => {
                        consumed.push(vars.get_key_value(key).unwrap().0.as_str());
                        value.clone()
                    }
                    None => caps[0].to_string(), // unknown placeholder left as-is
                }
            })
            .to_string();

        let url = format!("{}{}", source_config.base_url.trim_end_matches('/'), endpoint);

        // Everything not consumed by a placeholder becomes a query param.
        let query: Vec<(&str, &str)> = vars
            .iter()
            .filter(|(key, _)| !consumed.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        debug!(api_name, url = %url, "fetcher GET");

        let result = self
            .client
            .get(&url)
            .query(&query)
            .timeout(source_config.timeout)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.text().await {
                        Ok(body) => FetchOutcome::ok(body),
                        Err(e) => FetchOutcome::failed(format!("body read failed: {e}")),
                    }
                } else {
                    let body = response.text().await.unwrap_or_default();
                    let snippet: String = body.chars().take(200).collect();
                    FetchOutcome::failed(format!("HTTP {}: {snippet}", status.as_u16()))
                }
            }
            Err(e) if e.is_timeout() => FetchOutcome::failed(format!(
                "timeout after {:?} for {} ({api_name})",
                source_config.timeout, ctx.switch.ip_address
            )),
            Err(e) => FetchOutcome::failed(format!("request failed: {e}")),
        }
    }
}
