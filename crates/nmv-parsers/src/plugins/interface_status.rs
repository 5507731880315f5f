//! Interface status parsers (`show interfaces status` family) plus the
//! `Interface,Status,Speed,Duplex` CSV fallback.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, Duplex, InterfaceStatus, LinkStatus, ParsedRecord};
use regex::Regex;

use crate::csvutil;
use crate::parser::Parser;

fn csv_entries(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for row in csvutil::csv_rows(raw) {
        let interface = csvutil::col(&row, "Interface");
        if interface.is_empty() {
            continue;
        }
        let status = csvutil::col(&row, "Status");
        let speed = csvutil::col(&row, "Speed");
        let duplex = csvutil::col(&row, "Duplex");
        results.push(ParsedRecord::InterfaceStatus(InterfaceStatus {
            interface_name: interface.to_string(),
            link_status: LinkStatus::parse(status),
            speed: if speed.is_empty() {
                None
            } else {
                Some(speed.to_string())
            },
            duplex: if duplex.is_empty() {
                None
            } else {
                Some(Duplex::parse(duplex))
            },
        }));
    }
    results
}

static STATUS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Gi1/0/1   Server-01   connected   100   a-full   a-1000   10/100/1000BaseTX"
    Regex::new(r"(?im)^(?P<port>\S+)\s+(?P<name>.*?)\s+(?P<status>connected|notconnect|notconnec|disabled|err-disabled|inactive|monitoring|sfpAbsent|xcvrAbsen|down|up)\s+(?P<vlan>\S+)\s+(?P<duplex>\S+)\s+(?P<speed>\S+)")
        .unwrap()
});

fn cli_entries(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for caps in STATUS_ROW_RE.captures_iter(raw) {
        let port = &caps["port"];
        if port.eq_ignore_ascii_case("port") || port.starts_with('-') {
            continue;
        }
        let status = match caps["status"].to_ascii_lowercase().as_str() {
            "connected" | "up" => LinkStatus::Up,
            "monitoring" => LinkStatus::Up,
            _ => LinkStatus::Down,
        };
        let speed = caps["speed"].trim_start_matches("a-").to_string();
        results.push(ParsedRecord::InterfaceStatus(InterfaceStatus {
            interface_name: port.to_string(),
            link_status: status,
            speed: Some(speed),
            duplex: Some(Duplex::parse(&caps["duplex"])),
        }));
    }
    results
}

/// Cisco IOS `show interfaces status`.
pub struct IosInterfaceStatusParser;

impl Parser for IosInterfaceStatusParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_interface_status_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "Interface") {
            return csv_entries(raw);
        }
        cli_entries(raw)
    }
}

/// Cisco NX-OS `show interface status` (same table shape, `sfpAbsent` and
/// truncated `notconnec` statuses included).
pub struct NxosInterfaceStatusParser;

impl Parser for NxosInterfaceStatusParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_interface_status_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if csvutil::looks_like_csv(raw, "Interface") {
            return csv_entries(raw);
        }
        cli_entries(raw)
    }
}
