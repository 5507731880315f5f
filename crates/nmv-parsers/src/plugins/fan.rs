//! Fan status parsers.
//!
//! HPE Comware `display fan`, Cisco IOS `show env all` fan lines, and
//! Cisco NX-OS `show environment fan` tables.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, FanStatus, ParsedRecord};
use regex::Regex;

use crate::parser::Parser;

// ── HPE ───────────────────────────────────────────────────────────────────────

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^Slot\s+(\d+)\s*:").unwrap());
static HPE_FAN_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+)\s+(\S+)\s+(\S.*?)\s*$").unwrap());

/// HPE Comware `display fan` output:
///
/// ```text
/// Slot 1:
/// FanID    Status      Direction
/// 1        Normal      Back-to-front
/// 3        Absent      Back-to-front
/// ```
///
/// Fan id is rendered `Fan {slot}/{id}`; with no `Slot N:` header the whole
/// output counts as slot 1.
pub struct HpeFanParser;

impl Parser for HpeFanParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_fan_hpe_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for (slot, block) in split_by_slot(raw) {
            for line in block.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('-') {
                    continue;
                }
                let first = line.split_whitespace().next().unwrap_or("");
                if first.eq_ignore_ascii_case("fanid") || first.eq_ignore_ascii_case("fan_id") {
                    continue;
                }
                if let Some(caps) = HPE_FAN_ROW_RE.captures(line) {
                    let fan_num = &caps[1];
                    let status = &caps[2];
                    results.push(ParsedRecord::Fan(FanStatus::new(
                        format!("Fan {slot}/{fan_num}"),
                        status,
                    )));
                }
            }
        }
        results
    }
}

/// Split output into `(slot, block)` pairs using `Slot N:` headers.
fn split_by_slot(raw: &str) -> Vec<(String, &str)> {
    let matches: Vec<_> = SLOT_RE.captures_iter(raw).collect();
    if matches.is_empty() {
        return vec![("1".to_string(), raw)];
    }

    let mut blocks = Vec::new();
    for (i, caps) in matches.iter().enumerate() {
        let slot = caps[1].to_string();
        let start = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        blocks.push((slot, &raw[start..end]));
    }
    blocks
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_FAN_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^(.+?)\s+is\s+(.+?)\s*$").unwrap());

/// Cisco IOS `show env all` fan lines:
///
/// ```text
/// FAN 1 is OK
/// FAN PS-1 is NOT OK
/// SYSTEM FAN is OK
/// ```
pub struct IosFanParser;

impl Parser for IosFanParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_fan_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        for caps in IOS_FAN_LINE_RE.captures_iter(raw) {
            let fan_id = caps[1].trim();
            let status = caps[2].trim();
            if !fan_id.to_ascii_lowercase().contains("fan") {
                continue;
            }
            if fan_id.starts_with('-') || fan_id.starts_with('=') {
                continue;
            }
            let status = match status.to_ascii_lowercase().as_str() {
                "not ok" => "fail",
                "not present" => "absent",
                other if other.starts_with("ok") => "ok",
                other => other,
            }
            .to_string();
            results.push(ParsedRecord::Fan(FanStatus::new(fan_id, &status)));
        }
        results
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(.+?)\s+(\S+)\s*$").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-=]+$").unwrap());

/// Cisco NX-OS `show environment fan` table:
///
/// ```text
/// Fan             Model                Hw     Direction      Status
/// ------------------------------------------------------------------
/// Fan1(sys_fan1)  NXA-FAN-30CFM-F      --     front-to-back  Ok
/// Fan_in_PS2      --                   --     front-to-back  Absent
/// ```
pub struct NxosFanParser;

impl Parser for NxosFanParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_fan_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || SEPARATOR_RE.is_match(line) {
                continue;
            }
            let Some(caps) = NXOS_ROW_RE.captures(line) else {
                continue;
            };
            let fan_id = &caps[1];
            let middle = &caps[2];
            let status = &caps[3];

            // Header row looks like "Fan  Model ... Status".
            if fan_id.eq_ignore_ascii_case("fan") && middle.to_ascii_lowercase().contains("model") {
                continue;
            }
            // Section title "Fan:" carries no columns.
            if fan_id.ends_with(':') {
                continue;
            }
            if !fan_id.to_ascii_lowercase().contains("fan") {
                continue;
            }

            results.push(ParsedRecord::Fan(FanStatus::new(fan_id, status)));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_domain::OperationalStatus;

    fn fans(records: Vec<ParsedRecord>) -> Vec<FanStatus> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Fan(f) => f,
                other => panic!("expected fan record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn hpe_slot_block_with_absent_fan() {
        let raw = "Slot 1:\n\
                   FanID    Status      Direction\n\
                   1 Normal Back-to-front\n\
                   3 Absent Back-to-front\n";
        let fans = fans(HpeFanParser.parse(raw));
        assert_eq!(fans.len(), 2);
        assert_eq!(fans[0].fan_id, "Fan 1/1");
        assert_eq!(fans[0].status, OperationalStatus::Normal);
        assert_eq!(fans[1].fan_id, "Fan 1/3");
        assert_eq!(fans[1].status, OperationalStatus::Absent);
    }

    #[test]
    fn hpe_multiple_slots() {
        let raw = "Slot 1:\nFanID Status Direction\n1 Normal Back-to-front\n\n\
                   Slot 2:\nFanID Status Direction\n1 Fail Front-to-back\n";
        let fans = fans(HpeFanParser.parse(raw));
        assert_eq!(fans.len(), 2);
        assert_eq!(fans[1].fan_id, "Fan 2/1");
        assert_eq!(fans[1].status, OperationalStatus::Fail);
    }

    #[test]
    fn hpe_missing_slot_header_defaults_to_slot_one() {
        let raw = "FanID Status Direction\n2 Normal Back-to-front\n";
        let fans = fans(HpeFanParser.parse(raw));
        assert_eq!(fans[0].fan_id, "Fan 1/2");
    }

    #[test]
    fn hpe_empty_input_yields_nothing() {
        assert!(HpeFanParser.parse("").is_empty());
        assert!(HpeFanParser.parse("   \n \n").is_empty());
    }

    #[test]
    fn ios_fan_lines() {
        let raw = "FAN 1 is OK\nFAN PS-1 is NOT OK\nSYSTEM FAN is OK\nTemp: 33C\n";
        let fans = fans(IosFanParser.parse(raw));
        assert_eq!(fans.len(), 3);
        assert_eq!(fans[0].fan_id, "FAN 1");
        assert_eq!(fans[0].status, OperationalStatus::Ok);
        assert_eq!(fans[1].status, OperationalStatus::Fail);
    }

    #[test]
    fn nxos_table() {
        let raw = "Fan:\n\
            --------------------------------------------------------------------------\n\
            Fan             Model                Hw     Direction      Status\n\
            --------------------------------------------------------------------------\n\
            Fan1(sys_fan1)  NXA-FAN-30CFM-F      --     front-to-back  Ok\n\
            Fan_in_PS2      --                   --     front-to-back  Absent\n";
        let fans = fans(NxosFanParser.parse(raw));
        assert_eq!(fans.len(), 2);
        assert_eq!(fans[0].fan_id, "Fan1(sys_fan1)");
        assert_eq!(fans[0].status, OperationalStatus::Ok);
        assert_eq!(fans[1].status, OperationalStatus::Absent);
    }

    #[test]
    fn garbage_never_panics() {
        for parser in [
            &HpeFanParser as &dyn Parser,
            &IosFanParser,
            &NxosFanParser,
        ] {
            assert!(parser.parse("%% banner %%\n\x00\x01 weird").is_empty());
        }
    }
}
