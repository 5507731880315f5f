//! ARP table parsers. "Incomplete" entries never produce records: the CLI
//! patterns only match hex MACs, and the CSV path filters them explicitly.

use std::sync::LazyLock;

use nmv_domain::{ArpEntry, DeviceType, MacAddr, ParsedRecord};
use regex::Regex;

use crate::csvutil;
use crate::parser::Parser;

fn csv_entries(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for row in csvutil::csv_rows(raw) {
        let ip = csvutil::col(&row, "IP");
        let mac = csvutil::col(&row, "MAC");
        if ip.is_empty() || mac.is_empty() || mac.eq_ignore_ascii_case("incomplete") {
            continue;
        }
        let Ok(mac) = MacAddr::parse(mac) else { continue };
        results.push(ParsedRecord::Arp(ArpEntry {
            ip_address: ip.to_string(),
            mac_address: mac,
        }));
    }
    results
}

fn cli_entries(raw: &str, pattern: &Regex) -> Vec<ParsedRecord> {
    pattern
        .captures_iter(raw)
        .filter_map(|caps| {
            let mac = MacAddr::parse(&caps["mac"]).ok()?;
            Some(ParsedRecord::Arp(ArpEntry {
                ip_address: caps["ip"].to_string(),
                mac_address: mac,
            }))
        })
        .collect()
}

// ── HPE ───────────────────────────────────────────────────────────────────────

static HPE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?P<ip>\d+\.\d+\.\d+\.\d+)\s+(?P<mac>[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4})")
        .unwrap()
});

/// HPE Comware `display arp`:
///
/// ```text
/// IP address      MAC address    SVLAN/VSI   Interface   Aging Type
/// 10.1.1.1        000c-29aa-bb01 100         GE1/0/1     20    Dynamic
/// 10.1.1.3        Incomplete     --          --          --    --
/// ```
pub struct HpeArpParser;

impl Parser for HpeArpParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_arp_table_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "IP") {
            return csv_entries(raw);
        }
        cli_entries(raw, &HPE_ROW_RE)
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Internet  10.1.1.1   22   000c.29aa.bb01  ARPA   Vlan100"
    Regex::new(r"(?m)^Internet\s+(?P<ip>\d+\.\d+\.\d+\.\d+)\s+\S+\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})")
        .unwrap()
});

/// Cisco IOS `show ip arp`. Incomplete entries show `Incomplete` in the
/// hardware-address column and fail the MAC pattern.
pub struct IosArpParser;

impl Parser for IosArpParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_arp_table_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "IP") {
            return csv_entries(raw);
        }
        cli_entries(raw, &IOS_ROW_RE)
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "10.1.1.1  00:01:32  000c.29aa.bb01  Vlan100"
    Regex::new(r"(?m)^\s*(?P<ip>\d+\.\d+\.\d+\.\d+)\s+\S+\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+\S+")
        .unwrap()
});

/// Cisco NX-OS `show ip arp` (INCOMPLETE rows carry no MAC and are skipped).
pub struct NxosArpParser;

impl Parser for NxosArpParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_arp_table_nxos_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "IP") {
            return csv_entries(raw);
        }
        cli_entries(raw, &NXOS_ROW_RE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(records: Vec<ParsedRecord>) -> Vec<ArpEntry> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Arp(e) => e,
                other => panic!("expected arp record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn hpe_skips_incomplete() {
        let raw = "IP address      MAC address    SVLAN/VSI  Interface  Aging Type\n\
                   10.1.1.1        000c-29aa-bb01 100        GE1/0/1    20    Dynamic\n\
                   10.1.1.3        Incomplete     --         --         --    --\n";
        let entries = entries(HpeArpParser.parse(raw));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip_address, "10.1.1.1");
        assert_eq!(entries[0].mac_address.as_str(), "00:0C:29:AA:BB:01");
    }

    #[test]
    fn ios_rows() {
        let raw = "Protocol  Address          Age (min)  Hardware Addr   Type   Interface\n\
                   Internet  10.1.1.1               22   000c.29aa.bb01  ARPA   Vlan100\n\
                   Internet  10.1.1.9                0   Incomplete      ARPA\n";
        let entries = entries(IosArpParser.parse(raw));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn nxos_rows() {
        let raw = "Address         Age       MAC Address     Interface\n\
                   10.1.1.1        00:01:32  000c.29aa.bb01  Vlan100\n";
        let entries = entries(NxosArpParser.parse(raw));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn csv_fallback_filters_incomplete() {
        let raw = "IP,MAC\n10.1.1.100,AA:BB:CC:DD:EE:01\n10.1.1.101,Incomplete\n";
        let entries = entries(HpeArpParser.parse(raw));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mac_address.as_str(), "AA:BB:CC:DD:EE:01");
    }

    #[test]
    fn empty_input() {
        for parser in [&HpeArpParser as &dyn Parser, &IosArpParser, &NxosArpParser] {
            assert!(parser.parse("").is_empty());
            assert!(parser.parse("   ").is_empty());
        }
    }
}
