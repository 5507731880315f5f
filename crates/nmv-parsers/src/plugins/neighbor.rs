//! LLDP/CDP neighbor parsers.
//!
//! Shared rule: a neighbor needs local_interface, remote_hostname and
//! remote_interface; a block missing any of the three is dropped silently.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, Neighbor, ParsedRecord};
use regex::Regex;

use crate::parser::Parser;

fn key_value<'a>(block: &'a str, pattern: &Regex) -> Option<&'a str> {
    pattern
        .captures(block)
        .and_then(|caps| caps.name("value"))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// Split `raw` into blocks starting at each match of `header`.
fn split_blocks<'a>(raw: &'a str, header: &Regex) -> Vec<&'a str> {
    let starts: Vec<usize> = header.find_iter(raw).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(raw.len());
            &raw[start..end]
        })
        .collect()
}

// ── HPE LLDP (verbose blocks) ─────────────────────────────────────────────────

static HPE_BLOCK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)LLDP neighbor-information of port\s+\d+\s*\[(?P<local>[^\]]+)\]").unwrap()
});
static SYSTEM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*System name\s*:\s*(?P<value>.+?)\s*$").unwrap());
static PORT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Port ID\s*:\s*(?P<value>.+?)\s*$").unwrap());
static SYSTEM_DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*System description\s*:\s*(?P<value>.+?)\s*$").unwrap());

/// HPE Comware `display lldp neighbor-information` verbose output:
///
/// ```text
/// LLDP neighbor-information of port 25[GigabitEthernet1/0/25]:
///   Chassis ID                : 000c-29aa-bb01
///   Port ID                   : HundredGigE1/0/1
///   System name               : CORE-SW-01
/// ```
pub struct HpeLldpNeighborParser;

impl Parser for HpeLldpNeighborParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_uplink_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for block in split_blocks(raw, &HPE_BLOCK_HEADER_RE) {
            let Some(caps) = HPE_BLOCK_HEADER_RE.captures(block) else {
                continue;
            };
            let local_interface = caps["local"].trim().to_string();
            let Some(remote_hostname) = key_value(block, &SYSTEM_NAME_RE) else {
                continue;
            };
            let Some(remote_interface) = key_value(block, &PORT_ID_RE) else {
                continue;
            };
            let mut neighbor = Neighbor::new(local_interface, remote_hostname, remote_interface);
            neighbor.remote_platform = key_value(block, &SYSTEM_DESC_RE).map(String::from);
            results.push(ParsedRecord::Neighbor(neighbor));
        }
        results
    }
}

// ── Cisco CDP detail (shared by IOS uplink and NX-OS CDP) ────────────────────

static CDP_DEVICE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Device\s*ID\s*:\s*(?P<value>.+?)\s*$").unwrap());
static CDP_INTERFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Interface\s*:\s*(?P<value>[^,]+?)\s*,\s*Port\s*ID\s*\(outgoing\s+port\)\s*:\s*(?P<remote>.+?)\s*$")
        .unwrap()
});
static CDP_PLATFORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^Platform\s*:\s*(?P<value>[^,]+)").unwrap());

fn parse_cdp_detail(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for block in split_blocks(raw, &CDP_DEVICE_ID_RE) {
        let Some(remote_hostname) = key_value(block, &CDP_DEVICE_ID_RE) else {
            continue;
        };
        let Some(caps) = CDP_INTERFACE_RE.captures(block) else {
            continue;
        };
        let local_interface = caps["value"].trim().to_string();
        let remote_interface = caps["remote"].trim().to_string();
        if local_interface.is_empty() || remote_interface.is_empty() {
            continue;
        }
        // CDP device ids may carry a serial suffix "(FDO1234X0AB)".
        let remote_hostname = remote_hostname
            .split('(')
            .next()
            .unwrap_or(remote_hostname)
            .trim()
            .to_string();
        if remote_hostname.is_empty() {
            continue;
        }
        let mut neighbor = Neighbor::new(local_interface, remote_hostname, remote_interface);
        neighbor.remote_platform = key_value(block, &CDP_PLATFORM_RE).map(String::from);
        results.push(ParsedRecord::Neighbor(neighbor));
    }
    results
}

/// Cisco IOS `show cdp neighbors detail` (the FNA uplink feed).
pub struct IosCdpNeighborParser;

impl Parser for IosCdpNeighborParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_uplink_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_cdp_detail(raw)
    }
}

/// Cisco NX-OS `show cdp neighbors detail`.
pub struct NxosCdpNeighborParser;

impl Parser for NxosCdpNeighborParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_uplink_cdp_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_cdp_detail(raw)
    }
}

// ── Cisco LLDP detail (IOS + NX-OS) ───────────────────────────────────────────

static LLDP_LOCAL_INTF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Local\s+(?:Intf|Port\s+id)\s*:\s*(?P<value>.+?)\s*$").unwrap()
});
static LLDP_SYSTEM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^System\s+Name\s*:\s*(?P<value>.+?)\s*$").unwrap());
static LLDP_PORT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^Port\s+id\s*:\s*(?P<value>.+?)\s*$").unwrap());
static LLDP_PORT_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Port\s+Description\s*:\s*(?P<value>.+?)\s*$").unwrap()
});

fn parse_lldp_detail(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for block in split_blocks(raw, &LLDP_LOCAL_INTF_RE) {
        let Some(local_interface) = key_value(block, &LLDP_LOCAL_INTF_RE) else {
            continue;
        };
        let Some(remote_hostname) = key_value(block, &LLDP_SYSTEM_NAME_RE) else {
            continue;
        };
        // Prefer the port description when it names an interface, else Port id.
        let port_id = key_value(block, &LLDP_PORT_ID_RE);
        let port_desc = key_value(block, &LLDP_PORT_DESC_RE);
        let remote_interface = match (port_desc, port_id) {
            (Some(desc), _) if !desc.eq_ignore_ascii_case("not advertised") => desc,
            (_, Some(id)) => id,
            _ => continue,
        };
        results.push(ParsedRecord::Neighbor(Neighbor::new(
            local_interface,
            remote_hostname,
            remote_interface,
        )));
    }
    results
}

/// Cisco IOS `show lldp neighbors detail`:
///
/// ```text
/// Local Intf: Gi1/0/49
/// Chassis id: 000c.29aa.bb01
/// Port id: HGE1/0/1
/// Port Description: uplink to core
/// System Name: CORE-SW-01
/// ```
pub struct IosLldpNeighborParser;

impl Parser for IosLldpNeighborParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_uplink_lldp_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_lldp_detail(raw)
    }
}

/// Cisco NX-OS `show lldp neighbors detail` (`Local Port id:` spelling).
pub struct NxosLldpNeighborParser;

impl Parser for NxosLldpNeighborParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_uplink_lldp_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_lldp_detail(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbors(records: Vec<ParsedRecord>) -> Vec<Neighbor> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Neighbor(n) => n,
                other => panic!("expected neighbor record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn hpe_verbose_blocks() {
        let raw = "\
LLDP neighbor-information of port 25[GigabitEthernet1/0/25]:
  Neighbor index                   : 1
  Chassis ID                       : 000c-29aa-bb01
  Port ID                          : HundredGigE1/0/1
  System name                      : CORE-SW-01
  System description               : HPE Comware Platform Software

LLDP neighbor-information of port 26[GigabitEthernet1/0/26]:
  Chassis ID                       : 000c-29aa-bb02
  Port ID                          : HundredGigE1/0/2
  System name                      : CORE-SW-02
";
        let ns = neighbors(HpeLldpNeighborParser.parse(raw));
        assert_eq!(ns.len(), 2);
        assert_eq!(ns[0].local_interface, "GigabitEthernet1/0/25");
        assert_eq!(ns[0].remote_hostname, "CORE-SW-01");
        assert_eq!(ns[0].remote_interface, "HundredGigE1/0/1");
        assert_eq!(
            ns[0].remote_platform.as_deref(),
            Some("HPE Comware Platform Software")
        );
        assert!(ns[1].remote_platform.is_none());
    }

    #[test]
    fn hpe_block_missing_system_name_is_dropped() {
        let raw = "\
LLDP neighbor-information of port 25[GigabitEthernet1/0/25]:
  Chassis ID                       : 000c-29aa-bb01
  Port ID                          : HundredGigE1/0/1
";
        assert!(HpeLldpNeighborParser.parse(raw).is_empty());
    }

    #[test]
    fn cdp_detail_blocks() {
        let raw = "\
-------------------------
Device ID: CORE-SW-01(FDO1234X0AB)
Platform: cisco N9K-C93180YC-FX, Capabilities: Router Switch
Interface: Ethernet1/49, Port ID (outgoing port): Ethernet1/1
-------------------------
Device ID: CORE-SW-02
Platform: cisco N9K-C93180YC-FX, Capabilities: Router Switch
Interface: Ethernet1/50, Port ID (outgoing port): Ethernet1/1
";
        let ns = neighbors(NxosCdpNeighborParser.parse(raw));
        assert_eq!(ns.len(), 2);
        assert_eq!(ns[0].remote_hostname, "CORE-SW-01");
        assert_eq!(ns[0].local_interface, "Ethernet1/49");
        assert_eq!(ns[0].remote_interface, "Ethernet1/1");
        assert_eq!(ns[0].remote_platform.as_deref(), Some("cisco N9K-C93180YC-FX"));
    }

    #[test]
    fn ios_lldp_detail_prefers_port_description() {
        let raw = "\
Local Intf: Gi1/0/49
Chassis id: 000c.29aa.bb01
Port id: 000c.29aa.bb99
Port Description: TenGigabitEthernet1/1/1
System Name: CORE-SW-01
";
        let ns = neighbors(IosLldpNeighborParser.parse(raw));
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].remote_interface, "TenGigabitEthernet1/1/1");
    }

    #[test]
    fn nxos_lldp_local_port_id_spelling() {
        let raw = "\
Local Port id: Eth1/49
Port id: Eth1/1
System Name: CORE-SW-01
";
        let ns = neighbors(NxosLldpNeighborParser.parse(raw));
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].local_interface, "Eth1/49");
    }

    #[test]
    fn empty_and_garbage() {
        let all: [&dyn Parser; 5] = [
            &HpeLldpNeighborParser,
            &IosCdpNeighborParser,
            &IosLldpNeighborParser,
            &NxosLldpNeighborParser,
            &NxosCdpNeighborParser,
        ];
        for parser in all {
            assert!(parser.parse("").is_empty());
            assert!(parser.parse("Total entries displayed: 0").is_empty());
        }
    }
}
