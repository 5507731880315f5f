//! Port-channel / link-aggregation parsers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use nmv_domain::{AggProtocol, DeviceType, LinkStatus, ParsedRecord, PortChannel};
use regex::Regex;

use crate::parser::Parser;

static MEMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<intf>\S+?)\((?P<flag>\w+)\)").unwrap());

fn collect_members(text: &str, member_up: fn(&str) -> bool) -> (Vec<String>, BTreeMap<String, LinkStatus>) {
    let mut members = Vec::new();
    let mut status = BTreeMap::new();
    for caps in MEMBER_RE.captures_iter(text) {
        let intf = caps["intf"].to_string();
        let state = if member_up(&caps["flag"]) {
            LinkStatus::Up
        } else {
            LinkStatus::Down
        };
        status.insert(intf.clone(), state);
        members.push(intf);
    }
    (members, status)
}

// ── HPE ───────────────────────────────────────────────────────────────────────

static HPE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?P<agg_id>\d+)\s+(?P<interface>\S+)\s+(?P<link>UP|DOWN)\s+(?P<attribute>\S+)\s+(?P<mode>\S+)\s+(?P<members>.+?)\s*$")
        .unwrap()
});

fn parse_hpe_summary(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for caps in HPE_ROW_RE.captures_iter(raw) {
        // (S) = Selected = up, (U) = Unselected = down
        let (members, member_status) =
            collect_members(&caps["members"], |flag| flag.eq_ignore_ascii_case("S"));
        if members.is_empty() {
            continue;
        }
        results.push(ParsedRecord::PortChannel(PortChannel {
            interface_name: caps["interface"].to_string(),
            status: LinkStatus::parse(&caps["link"]),
            protocol: AggProtocol::parse(&caps["mode"]),
            members,
            member_status,
        }));
    }
    results
}

/// HPE Comware `display link-aggregation summary`:
///
/// ```text
/// AggID   Interface   Link   Attribute   Mode   Members
/// 1       BAGG1       UP     A           LACP   HGE1/0/25(S) HGE1/0/26(S)
/// 2       BAGG2       DOWN   A           STATIC HGE1/0/27(U)
/// ```
pub struct HpeChannelGroupParser;

impl Parser for HpeChannelGroupParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_channel_group_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_hpe_summary(raw)
    }
}

/// Same summary table served under the legacy `get_port_channel_hpe_fna`
/// indicator name.
pub struct HpePortChannelParser;

impl Parser for HpePortChannelParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_port_channel_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_hpe_summary(raw)
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?P<group>\d+)\s+(?P<po_name>Po\d+)\((?P<flags>[A-Za-z]+)\)\s+(?P<protocol>LACP|PAgP|-)\s*(?P<rest>.*)$")
        .unwrap()
});
static IOS_CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+\S+\(\w+\)").unwrap());

/// Cisco IOS `show etherchannel summary`:
///
/// ```text
/// Group  Port-channel  Protocol    Ports
/// ------+-------------+-----------+----------------------------------
/// 1      Po1(SU)       LACP        Gi1/0/25(P) Gi1/0/26(P)
/// 7      Po7(SD)       -           Gi1/0/5(D)  Gi1/0/6(I)
/// ```
///
/// Member flags: P = bundled (up); D/I/s/H/w/f all count as down.
/// Channel flags: U in the pair means up (SU/RU), D means down (SD/RD).
/// Members may wrap onto indented continuation lines.
pub struct IosChannelGroupParser;

impl Parser for IosChannelGroupParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_channel_group_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        let lines: Vec<&str> = raw.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let Some(caps) = IOS_GROUP_RE.captures(lines[i]) else {
                i += 1;
                continue;
            };
            let mut ports_text = caps["rest"].to_string();
            // Absorb wrapped member lines.
            let mut j = i + 1;
            while j < lines.len()
                && IOS_CONTINUATION_RE.is_match(lines[j])
                && !IOS_GROUP_RE.is_match(lines[j])
            {
                ports_text.push(' ');
                ports_text.push_str(lines[j].trim());
                j += 1;
            }
            i = j;

            let flags = &caps["flags"];
            let status = if flags.contains('U') {
                LinkStatus::Up
            } else if flags.contains('D') {
                LinkStatus::Down
            } else {
                LinkStatus::Unknown
            };
            let protocol = match &caps["protocol"] {
                "LACP" => AggProtocol::Lacp,
                "PAgP" => AggProtocol::Pagp,
                _ => AggProtocol::Static,
            };
            let (members, member_status) =
                collect_members(&ports_text, |flag| flag.eq_ignore_ascii_case("P"));
            if members.is_empty() {
                continue;
            }
            results.push(ParsedRecord::PortChannel(PortChannel {
                interface_name: caps["po_name"].to_string(),
                status,
                protocol,
                members,
                member_status,
            }));
        }
        results
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "1     Po1(SU)     Eth      LACP      Eth1/17(P)   Eth1/18(P)"
    Regex::new(r"(?m)^\s*(?P<group>\d+)\s+(?P<po_name>Po\d+)\((?P<flags>[A-Za-z]+)\)\s+\S+\s+(?P<protocol>LACP|PAGP|NONE|-)\s*(?P<rest>.*)$")
        .unwrap()
});

/// Cisco NX-OS `show port-channel summary` (extra Type column, otherwise
/// the IOS shape).
pub struct NxosChannelGroupParser;

impl Parser for NxosChannelGroupParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_channel_group_nxos_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for caps in NXOS_GROUP_RE.captures_iter(raw) {
            let flags = &caps["flags"];
            let status = if flags.contains('U') {
                LinkStatus::Up
            } else if flags.contains('D') {
                LinkStatus::Down
            } else {
                LinkStatus::Unknown
            };
            let (members, member_status) =
                collect_members(&caps["rest"], |flag| flag.eq_ignore_ascii_case("P"));
            if members.is_empty() {
                continue;
            }
            results.push(ParsedRecord::PortChannel(PortChannel {
                interface_name: caps["po_name"].to_string(),
                status,
                protocol: AggProtocol::parse(&caps["protocol"]),
                members,
                member_status,
            }));
        }
        results
    }
}
