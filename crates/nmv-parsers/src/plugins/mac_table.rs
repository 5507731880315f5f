//! MAC address-table parsers. Each handles the vendor CLI table plus the
//! fetcher CSV fallback (`MAC,Interface,VLAN`). VLANs outside 1-4094 and
//! unparseable MACs drop the row.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, MacAddr, MacTableEntry, ParsedRecord, VlanId};
use regex::Regex;

use crate::csvutil;
use crate::parser::Parser;

fn csv_entries(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for row in csvutil::csv_rows(raw) {
        let mac = csvutil::col(&row, "MAC");
        let interface = csvutil::col(&row, "Interface");
        let vlan = csvutil::col(&row, "VLAN");
        if mac.is_empty() || interface.is_empty() || vlan.is_empty() {
            continue;
        }
        let Ok(mac) = MacAddr::parse(mac) else { continue };
        let Ok(vlan) = vlan.parse::<u32>().map_err(|_| ()).and_then(|v| VlanId::new(v).map_err(|_| ()))
        else {
            continue;
        };
        results.push(ParsedRecord::MacTable(MacTableEntry {
            mac_address: mac,
            interface_name: interface.to_string(),
            vlan_id: vlan,
        }));
    }
    results
}

fn entry(vlan: &str, mac: &str, port: &str) -> Option<ParsedRecord> {
    let vlan = VlanId::new(vlan.parse::<u32>().ok()?).ok()?;
    let mac = MacAddr::parse(mac).ok()?;
    Some(ParsedRecord::MacTable(MacTableEntry {
        mac_address: mac,
        interface_name: port.to_string(),
        vlan_id: vlan,
    }))
}

// ── HPE ───────────────────────────────────────────────────────────────────────

static HPE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?P<mac>[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4})\s+(?P<vlan>\d+)\s+\S+\s+(?P<port>\S+)",
    )
    .unwrap()
});

/// HPE Comware `display mac-address`:
///
/// ```text
/// MAC Address      VLAN ID    State          Port/Nickname            Aging
/// 0001-0203-0405   100        Learned        GE1/0/1                  Y
/// ```
pub struct HpeMacTableParser;

impl Parser for HpeMacTableParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_mac_table_hpe_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "MAC") {
            return csv_entries(raw);
        }
        HPE_ROW_RE
            .captures_iter(raw)
            .filter_map(|caps| entry(&caps["vlan"], &caps["mac"], &caps["port"]))
            .collect()
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+\S+\s+(?P<port>\S+)",
    )
    .unwrap()
});

/// Cisco IOS `show mac address-table`:
///
/// ```text
/// Vlan    Mac Address       Type        Ports
/// ----    -----------       --------    -----
///   10    68a8.2845.7640    DYNAMIC     Gi1/0/3
/// ```
pub struct IosMacTableParser;

impl Parser for IosMacTableParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_mac_table_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "MAC") {
            return csv_entries(raw);
        }
        IOS_ROW_RE
            .captures_iter(raw)
            .filter_map(|caps| entry(&caps["vlan"], &caps["mac"], &caps["port"]))
            .collect()
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "* 10  68a8.2845.7640  dynamic  0  F  F  Eth1/3"
    Regex::new(
        r"(?m)^\s*[*+GR]?\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+\S+\s+(?:\S+\s+){0,3}(?P<port>\S+)\s*$",
    )
    .unwrap()
});

/// Cisco NX-OS `show mac address-table` (leading `*`/`+` flags tolerated).
pub struct NxosMacTableParser;

impl Parser for NxosMacTableParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_mac_table_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "MAC") {
            return csv_entries(raw);
        }
        NXOS_ROW_RE
            .captures_iter(raw)
            .filter_map(|caps| entry(&caps["vlan"], &caps["mac"], &caps["port"]))
            .collect()
    }
}
