use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nmv_domain::{DeviceType, ParsedRecord};
use tracing::warn;

use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::session_cache::SnmpSessionCache;

/// One indicator's SNMP program: walk a fixed OID set, join with the
/// session-cache maps, produce typed records plus a raw-text dump for the
/// batch's `raw_data`.
#[async_trait]
pub trait SnmpCollector: Send + Sync {
    /// Matches the api_name the scheduler dispatches.
    fn api_name(&self) -> &'static str;

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError>;

    /// `collect` with automatic retry on transport timeouts. Linear
    /// backoff: 1s × attempt number.
    async fn collect_with_retry(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
        max_retries: u32,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let mut last_error = String::new();
        for attempt in 0..=max_retries {
            match self.collect(target, device_type, cache, engine).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_timeout() => {
                    last_error = e.to_string();
                    if attempt < max_retries {
                        let wait = Duration::from_secs((attempt + 1) as u64);
                        warn!(
                            api_name = self.api_name(),
                            ip = %target.ip,
                            attempt = attempt + 1,
                            max_retries,
                            wait_secs = wait.as_secs(),
                            "timeout, retrying"
                        );
                        tokio::time::sleep(wait).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(SnmpError::Timeout(format!(
            "{}: all retries exhausted for {}: {last_error}",
            self.api_name(),
            target.ip
        )))
    }
}

/// Render varbinds as a labeled text block for storage as the batch's
/// opaque `raw_data`.
pub fn format_raw(
    api_name: &str,
    ip: &str,
    device_type: DeviceType,
    varbinds: &[(String, String)],
) -> String {
    let mut lines = vec![
        format!("SNMP Collector: {api_name}"),
        format!("Device: {ip} ({device_type})"),
        format!("Timestamp: {}", Utc::now().to_rfc3339()),
        format!("OID count: {}", varbinds.len()),
        "---".to_string(),
    ];
    for (oid, value) in varbinds {
        lines.push(format!("  {oid} = {value}"));
    }
    lines.join("\n")
}

/// The index portion after an OID prefix:
/// `extract_index("1.3.6.1.2.1.2.2.1.8.49", "1.3.6.1.2.1.2.2.1.8")` → `"49"`.
pub fn extract_index<'a>(oid: &'a str, prefix: &str) -> &'a str {
    oid.strip_prefix(prefix)
        .map(|s| s.trim_start_matches('.'))
        .unwrap_or("")
}

pub fn safe_int(value: &str, default: i64) -> i64 {
    value.trim().parse().unwrap_or(default)
}

/// Parse a `dot3adAggPortActorOperState` byte. The OID is OCTET
/// STRING(SIZE(1)), so agents render it as decimal, `0x`-prefixed hex, or
/// bare hex depending on the stack.
pub fn parse_oper_state_byte(value: &str) -> i64 {
    let v = value.trim();
    if let Ok(n) = v.parse::<i64>() {
        return n;
    }
    if let Some(hex) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return n;
        }
    }
    i64::from_str_radix(v, 16).unwrap_or(0)
}
