//! Power-supply status parsers.
//!
//! HPE Comware `display power`, Cisco IOS `show environment power`, and
//! Cisco NX-OS `show environment power`.

use std::collections::HashSet;
use std::sync::LazyLock;

use nmv_domain::{DeviceType, ParsedRecord, PowerStatus};
use regex::Regex;

use crate::parser::Parser;

// ── HPE ───────────────────────────────────────────────────────────────────────

static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*Slot\s+(\d+)\s*:").unwrap());
static HPE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?P<power_id>\d+)\s+(?P<state>\S+)\s+(?P<mode>\S+)\s+(?P<current>\S+)\s+(?P<voltage>\S+)\s+(?P<power>\S+)(?:\s+(?P<fan_dir>\S+))?\s*$")
        .unwrap()
});
static HPE_PS_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*PS\s+(?P<ps_id>\S+)\s+(?P<status>\S+)(?:\s+Input:\s*(?P<input>\S+))?(?:\s+Output:\s*(?P<output>\S+))?(?:\s+Capacity:\s*(?P<capacity>\d+(?:\.\d+)?)\s*W?)?(?:\s+Actual:\s*(?P<actual>\d+(?:\.\d+)?)\s*W?)?\s*$")
        .unwrap()
});

/// HPE Comware `display power`:
///
/// ```text
/// Slot 1:
/// PowerID State    Mode   Current(A)  Voltage(V)  Power(W)  FanDirection
/// 1       Normal   AC     --          --          --        Back-to-front
/// 2       Absent   AC     --          --          --        Back-to-front
/// ```
///
/// Also handles the `PS slot/id  Status  Input: … Capacity: …` key-value
/// variant. Supply id is rendered `PS {slot}/{id}`.
pub struct HpePowerParser;

impl Parser for HpePowerParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_power_hpe_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        // "PS 1/1 Ok Input: OK ..." variant first.
        let ps_lines: Vec<_> = HPE_PS_LINE_RE.captures_iter(raw).collect();
        if !ps_lines.is_empty() {
            for caps in ps_lines {
                let mut ps = PowerStatus::new(format!("PS {}", &caps["ps_id"]), &caps["status"]);
                ps.input_status = caps.name("input").map(|m| m.as_str().to_string());
                ps.output_status = caps.name("output").map(|m| m.as_str().to_string());
                ps.capacity_watts = caps.name("capacity").and_then(|m| m.as_str().parse().ok());
                ps.actual_output_watts = caps.name("actual").and_then(|m| m.as_str().parse().ok());
                results.push(ParsedRecord::Power(ps));
            }
            return results;
        }

        // Table format with Slot headers.
        let slot_positions: Vec<(usize, String)> = SLOT_RE
            .captures_iter(raw)
            .map(|c| (c.get(0).unwrap().start(), c[1].to_string()))
            .collect();

        for caps in HPE_ROW_RE.captures_iter(raw) {
            let row_pos = caps.get(0).unwrap().start();
            let mut slot = "1";
            for (pos, num) in &slot_positions {
                if *pos < row_pos {
                    slot = num;
                } else {
                    break;
                }
            }
            let power_id = &caps["power_id"];
            results.push(ParsedRecord::Power(PowerStatus::new(
                format!("PS {slot}/{power_id}"),
                &caps["state"],
            )));
        }
        results
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_PS_IS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*(?P<ps_id>PS\d+)\s+is\s+(?P<status>.+?)\s*$").unwrap());
static IOS_POWER_SUPPLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Power\s+Supply\s+(?P<id>\d+)\s+is\s+(?P<status>.+?)\s*$").unwrap()
});
static IOS_TABLE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?P<ps_id>PS\d+)\s+(?P<status>OK|FAULTY|NOT\s+OK|NOT\s+PRESENT|ABSENT|NORMAL|FAIL)\s*$")
        .unwrap()
});

/// Cisco IOS `show environment power` in its `PS1 is OK` /
/// `Power Supply 1 is OK` / bare-table renderings.
pub struct IosPowerParser;

impl IosPowerParser {
    fn normalize(status: &str) -> String {
        match status.trim().to_ascii_lowercase().as_str() {
            "not ok" => "fail".to_string(),
            "not present" => "absent".to_string(),
            "faulty" => "fail".to_string(),
            other => other.to_string(),
        }
    }
}

impl Parser for IosPowerParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_power_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for caps in IOS_PS_IS_RE.captures_iter(raw) {
            let ps_id = caps["ps_id"].to_ascii_uppercase();
            if seen.insert(ps_id.clone()) {
                results.push(ParsedRecord::Power(PowerStatus::new(
                    ps_id,
                    &Self::normalize(&caps["status"]),
                )));
            }
        }

        for caps in IOS_POWER_SUPPLY_RE.captures_iter(raw) {
            let ps_id = format!("PS{}", &caps["id"]);
            if seen.insert(ps_id.clone()) {
                results.push(ParsedRecord::Power(PowerStatus::new(
                    ps_id,
                    &Self::normalize(&caps["status"]),
                )));
            }
        }

        if results.is_empty() {
            for caps in IOS_TABLE_ROW_RE.captures_iter(raw) {
                let ps_id = caps["ps_id"].to_ascii_uppercase();
                if seen.insert(ps_id.clone()) {
                    results.push(ParsedRecord::Power(PowerStatus::new(
                        ps_id,
                        &Self::normalize(&caps["status"]),
                    )));
                }
            }
        }
        results
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?P<id>\d+)\s+(?P<model>\S+)\s+(?P<actual>\d+(?:\.\d+)?)\s*W?\s+(?P<capacity>\d+(?:\.\d+)?)\s*W?\s+(?P<status>\S+)\s*$")
        .unwrap()
});

/// Cisco NX-OS `show environment power` supply table:
///
/// ```text
/// Supply    Model                    Output     Capacity    Status
/// -------  -------------------  -----------  -----------  ----------
/// 1        NXA-PAC-1100W-PE          186 W      1100 W     Ok
/// 2        NXA-PAC-1100W-PE            0 W      1100 W     Absent
/// ```
pub struct NxosPowerParser;

impl Parser for NxosPowerParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_power_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for caps in NXOS_ROW_RE.captures_iter(raw) {
            let ps_id = format!("PS-{}", &caps["id"]);
            if !seen.insert(ps_id.clone()) {
                continue;
            }
            let mut ps = PowerStatus::new(ps_id, &caps["status"]);
            ps.actual_output_watts = caps["actual"].parse().ok();
            ps.capacity_watts = caps["capacity"].parse().ok();
            results.push(ParsedRecord::Power(ps));
        }
        results
    }
}
