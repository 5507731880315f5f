//! Interface error-counter parsers.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, ErrorCount, ParsedRecord};
use regex::Regex;

use crate::parser::Parser;

// ── HPE ───────────────────────────────────────────────────────────────────────

static HPE_INTF_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^((?:GigabitEthernet|Ten-GigabitEthernet|HundredGigE|FortyGigE|Twenty-FiveGigE|Bridge-Aggregation|XGE|GE|BAGG)\S*)\s*$")
        .unwrap()
});
static INPUT_ERRORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+input\s+errors?").unwrap());
static OUTPUT_ERRORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+output\s+errors?").unwrap());
static CRC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+CRC").unwrap());
static MULTI_COL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?P<intf>\S+)(?P<nums>(?:\s+\d+)+)\s*$").unwrap());

fn parse_tabular(raw: &str) -> Vec<ParsedRecord> {
    // Tabular layouts end in error columns; the narrow two-column FNA form
    // is Input(errs)/Output(errs), the wide CLI form ends in Err(pkts).
    let mut results = Vec::new();
    for caps in MULTI_COL_RE.captures_iter(raw) {
        let intf = &caps["intf"];
        if intf.eq_ignore_ascii_case("interface") || intf.starts_with('-') {
            continue;
        }
        let nums: Vec<i64> = caps["nums"]
            .split_whitespace()
            .filter_map(|n| n.parse().ok())
            .collect();
        if nums.is_empty() {
            continue;
        }
        let (input_errors, output_errors) = match nums.len() {
            1 => (nums[0], 0),
            2 => (nums[0], nums[1]),
            // Wide counter tables: the last column is the error count.
            _ => (*nums.last().unwrap_or(&0), 0),
        };
        results.push(ParsedRecord::ErrorCount(ErrorCount {
            interface_name: intf.to_string(),
            crc_errors: input_errors + output_errors,
            input_errors,
            output_errors,
        }));
    }
    results
}

fn parse_interface_blocks(raw: &str, intf_re: &Regex) -> Vec<ParsedRecord> {
    let matches: Vec<_> = intf_re.captures_iter(raw).collect();
    let mut results = Vec::new();
    for (i, caps) in matches.iter().enumerate() {
        let name = caps[1].to_string();
        let start = caps.get(0).unwrap().end();
        let end = matches
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let block = &raw[start..end];

        let input_errors: i64 = INPUT_ERRORS_RE
            .captures(block)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);
        let output_errors: i64 = OUTPUT_ERRORS_RE
            .captures(block)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);
        let crc: i64 = CRC_RE
            .captures(block)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(input_errors + output_errors);

        results.push(ParsedRecord::ErrorCount(ErrorCount {
            interface_name: name,
            crc_errors: crc,
            input_errors,
            output_errors,
        }));
    }
    results
}

/// HPE Comware error counters, three renderings: `display counters …`
/// tables, `display interface` per-interface blocks, and the narrow FNA
/// `Interface / Input(errs) / Output(errs)` table.
pub struct HpeErrorCountParser;

impl Parser for HpeErrorCountParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_error_count_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if INPUT_ERRORS_RE.is_match(raw) && HPE_INTF_LINE_RE.is_match(raw) {
            return parse_interface_blocks(raw, &HPE_INTF_LINE_RE);
        }
        parse_tabular(raw)
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_COUNTERS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // show interfaces counters errors:
    // "Port        Align-Err    FCS-Err   Xmit-Err   Rcv-Err  UnderSize  OutDiscards"
    Regex::new(r"(?m)^\s*(?P<intf>(?:Gi|Te|Tw|Fo|Hu|Po)\S+)\s+(?P<align>\d+)\s+(?P<fcs>\d+)\s+(?P<xmit>\d+)\s+(?P<rcv>\d+)\s+\d+\s+\d+\s*$")
        .unwrap()
});
static IOS_INTF_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^((?:GigabitEthernet|TenGigabitEthernet|TwentyFiveGigE|FortyGigabitEthernet|HundredGigE|Port-channel)\S*)\s+is\s+")
        .unwrap()
});

/// Cisco IOS `show interfaces counters errors` table, falling back to
/// `show interfaces` blocks.
pub struct IosErrorCountParser;

impl Parser for IosErrorCountParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_error_count_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for caps in IOS_COUNTERS_ROW_RE.captures_iter(raw) {
            let fcs: i64 = caps["fcs"].parse().unwrap_or(0);
            let align: i64 = caps["align"].parse().unwrap_or(0);
            let xmit: i64 = caps["xmit"].parse().unwrap_or(0);
            let rcv: i64 = caps["rcv"].parse().unwrap_or(0);
            results.push(ParsedRecord::ErrorCount(ErrorCount {
                interface_name: caps["intf"].to_string(),
                crc_errors: fcs + align,
                input_errors: rcv,
                output_errors: xmit,
            }));
        }
        if !results.is_empty() {
            return results;
        }
        parse_interface_blocks(raw, &IOS_INTF_BLOCK_RE)
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_INTF_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^((?:Ethernet|port-channel|mgmt)\S*)\s+is\s+").unwrap()
});

/// Cisco NX-OS `show interface` blocks (`… 0 input error … 0 CRC …`),
/// with the same tabular fallback as IOS.
pub struct NxosErrorCountParser;

impl Parser for NxosErrorCountParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_error_count_nxos_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if NXOS_INTF_BLOCK_RE.is_match(raw) {
            return parse_interface_blocks(raw, &NXOS_INTF_BLOCK_RE);
        }
        parse_tabular(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(records: Vec<ParsedRecord>) -> Vec<ErrorCount> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::ErrorCount(e) => e,
                other => panic!("expected error-count record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn hpe_fna_two_column_table() {
        let raw = "Interface            Input(errs)       Output(errs)\n\
                   GE1/0/1                        0                  0\n\
                   GE1/0/2                        5                  1\n";
        let counts = counts(HpeErrorCountParser.parse(raw));
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[1].interface_name, "GE1/0/2");
        assert_eq!(counts[1].input_errors, 5);
        assert_eq!(counts[1].output_errors, 1);
        assert_eq!(counts[1].crc_errors, 6);
    }

    #[test]
    fn hpe_display_interface_blocks() {
        let raw = "GigabitEthernet1/0/1\n\
                   Current state: UP\n\
                   Input:  3 input errors, 0 runts, 0 giants\n\
                           2 CRC, 0 frame\n\
                   Output: 1 output errors, 0 underruns\n";
        let counts = counts(HpeErrorCountParser.parse(raw));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].input_errors, 3);
        assert_eq!(counts[0].output_errors, 1);
        assert_eq!(counts[0].crc_errors, 2);
    }

    #[test]
    fn ios_counters_errors_table() {
        let raw = "Port        Align-Err    FCS-Err   Xmit-Err   Rcv-Err  UnderSize  OutDiscards\n\
                   Gi1/0/1             0          2          0          3          0          0\n";
        let counts = counts(IosErrorCountParser.parse(raw));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].crc_errors, 2);
        assert_eq!(counts[0].input_errors, 3);
    }

    #[test]
    fn nxos_interface_blocks() {
        let raw = "Ethernet1/1 is up\n\
                   RX\n  4 input error  2 CRC  0 runt\n\
                   TX\n  1 output error\n";
        let counts = counts(NxosErrorCountParser.parse(raw));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].input_errors, 4);
        assert_eq!(counts[0].output_errors, 1);
        assert_eq!(counts[0].crc_errors, 2);
    }

    #[test]
    fn empty_input() {
        let all: [&dyn Parser; 3] = [
            &HpeErrorCountParser,
            &IosErrorCountParser,
            &NxosErrorCountParser,
        ];
        for parser in all {
            assert!(parser.parse("").is_empty());
        }
    }
}
