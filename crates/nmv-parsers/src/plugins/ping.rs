//! Cross-vendor `ping_batch` parser — the registry's device-type-absent
//! fallback case. JSON batch format is attempted first, then standard ping
//! text.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, ParsedRecord, PingResult};
use regex::Regex;

use crate::parser::Parser;

static PING_IP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^PING\s+(?P<ip>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").unwrap()
});
static PACKET_LOSS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<loss>\d+(?:\.\d+)?)%\s+packet\s+loss").unwrap()
});
static RTT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)min/avg/max\s*=\s*[\d.]+/(?P<avg>[\d.]+)/[\d.]+").unwrap()
});

/// Parser for the batch reachability feed.
///
/// Format A — GNMS JSON: `{"results":[{"ip":"10.1.1.1","reachable":true}]}`.
/// Format B — standard ping text; reachable when loss < 100%.
pub struct PingBatchParser;

impl PingBatchParser {
    fn try_parse_json(raw: &str) -> Option<Vec<ParsedRecord>> {
        let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
        let results = value.get("results")?.as_array()?;

        let mut parsed = Vec::new();
        for entry in results {
            let Some(obj) = entry.as_object() else {
                continue;
            };
            let Some(ip) = obj.get("ip") else { continue };
            let Some(reachable) = obj.get("reachable") else {
                continue;
            };
            let ip = match ip {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let reachable = match reachable {
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::String(s) => {
                    matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
                }
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
                _ => continue,
            };
            parsed.push(ParsedRecord::Ping(PingResult {
                target: ip,
                is_reachable: reachable,
                success_rate: if reachable { 100.0 } else { 0.0 },
                avg_rtt_ms: None,
            }));
        }
        Some(parsed)
    }

    fn parse_standard_ping(raw: &str) -> Vec<ParsedRecord> {
        let Some(ip) = PING_IP_RE.captures(raw) else {
            return Vec::new();
        };
        let Some(loss) = PACKET_LOSS_RE.captures(raw) else {
            // No packet-loss line: reachability cannot be determined.
            return Vec::new();
        };
        let loss: f64 = match loss["loss"].parse() {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };
        vec![ParsedRecord::Ping(PingResult {
            target: ip["ip"].to_string(),
            is_reachable: loss < 100.0,
            success_rate: 100.0 - loss,
            avg_rtt_ms: RTT_RE
                .captures(raw)
                .and_then(|c| c["avg"].parse().ok()),
        })]
    }
}

impl Parser for PingBatchParser {
    fn device_type(&self) -> Option<DeviceType> {
        None
    }

    fn api_name(&self) -> &'static str {
        "ping_batch"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if let Some(results) = Self::try_parse_json(raw) {
            return results;
        }
        Self::parse_standard_ping(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pings(records: Vec<ParsedRecord>) -> Vec<PingResult> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Ping(p) => p,
                other => panic!("expected ping record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn json_batch_format() {
        let raw = r#"{"results": [
            {"ip": "10.1.1.1", "reachable": true},
            {"ip": "10.1.1.2", "reachable": false},
            {"ip": "10.1.1.3", "reachable": "true"}
        ]}"#;
        let pings = pings(PingBatchParser.parse(raw));
        assert_eq!(pings.len(), 3);
        assert!(pings[0].is_reachable);
        assert_eq!(pings[0].success_rate, 100.0);
        assert!(!pings[1].is_reachable);
        assert!(pings[2].is_reachable);
    }

    #[test]
    fn json_entries_missing_fields_are_dropped() {
        let raw = r#"{"results": [{"ip": "10.1.1.1"}, {"reachable": true}]}"#;
        assert!(PingBatchParser.parse(raw).is_empty());
    }

    #[test]
    fn standard_ping_reachable() {
        let raw = "\
PING 10.1.1.1 (10.1.1.1): 56 data bytes
64 bytes from 10.1.1.1: icmp_seq=0 ttl=64 time=1.2 ms

--- 10.1.1.1 ping statistics ---
5 packets transmitted, 5 packets received, 0% packet loss
round-trip min/avg/max = 1.1/1.2/1.3 ms
";
        let pings = pings(PingBatchParser.parse(raw));
        assert_eq!(pings.len(), 1);
        assert!(pings[0].is_reachable);
        assert_eq!(pings[0].success_rate, 100.0);
        assert_eq!(pings[0].avg_rtt_ms, Some(1.2));
    }

    #[test]
    fn standard_ping_unreachable() {
        let raw = "\
PING 10.1.1.9 (10.1.1.9): 56 data bytes
Request timeout for icmp_seq 0

--- 10.1.1.9 ping statistics ---
5 packets transmitted, 0 packets received, 100% packet loss
";
        let pings = pings(PingBatchParser.parse(raw));
        assert_eq!(pings.len(), 1);
        assert!(!pings[0].is_reachable);
        assert_eq!(pings[0].success_rate, 0.0);
    }

    #[test]
    fn missing_loss_line_means_undetermined() {
        let raw = "PING 10.1.1.1 (10.1.1.1): 56 data bytes\n";
        assert!(PingBatchParser.parse(raw).is_empty());
    }

    #[test]
    fn empty_and_garbage() {
        assert!(PingBatchParser.parse("").is_empty());
        assert!(PingBatchParser.parse("not json not ping").is_empty());
        // JSON without a results array falls through to text parsing.
        assert!(PingBatchParser.parse(r#"{"status":"ok"}"#).is_empty());
    }
}
