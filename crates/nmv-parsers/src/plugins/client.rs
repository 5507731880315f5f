//! Client-data parsers used by the client-collection pipeline.
//!
//! These do not go through the vendor registry: the fetcher layer has
//! already flattened vendor differences into CSV, so each parser handles
//! exactly one CSV shape and returns the payload struct directly.

use nmv_domain::{
    AclBinding, ArpEntry, Duplex, InterfaceStatus, LinkStatus, MacAddr, MacTableEntry, PingResult,
    VlanId,
};

use crate::csvutil;

/// `MAC,Interface,VLAN` → MAC table entries. Rows with a bad MAC or an
/// out-of-range VLAN are dropped.
pub struct MacTableCsvParser;

impl MacTableCsvParser {
    pub fn parse(&self, raw: &str) -> Vec<MacTableEntry> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for row in csvutil::csv_rows(raw) {
            let mac = csvutil::col(&row, "MAC");
            let interface = csvutil::col(&row, "Interface");
            let vlan = csvutil::col(&row, "VLAN");
            if mac.is_empty() || interface.is_empty() {
                continue;
            }
            let Ok(mac) = MacAddr::parse(mac) else { continue };
            let Some(vlan) = vlan
                .parse::<u32>()
                .ok()
                .and_then(|v| VlanId::new(v).ok())
            else {
                continue;
            };
            entries.push(MacTableEntry {
                mac_address: mac,
                interface_name: interface.to_string(),
                vlan_id: vlan,
            });
        }
        entries
    }
}

/// `IP,MAC` → ARP entries; "Incomplete" rows are skipped.
pub struct ArpCsvParser;

impl ArpCsvParser {
    pub fn parse(&self, raw: &str) -> Vec<ArpEntry> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for row in csvutil::csv_rows(raw) {
            let ip = csvutil::col(&row, "IP");
            let mac = csvutil::col(&row, "MAC");
            if ip.is_empty() || mac.is_empty() || mac.eq_ignore_ascii_case("incomplete") {
                continue;
            }
            let Ok(mac) = MacAddr::parse(mac) else { continue };
            entries.push(ArpEntry {
                ip_address: ip.to_string(),
                mac_address: mac,
            });
        }
        entries
    }
}

/// `Interface,Status,Speed,Duplex` → interface status entries.
pub struct InterfaceStatusCsvParser;

impl InterfaceStatusCsvParser {
    pub fn parse(&self, raw: &str) -> Vec<InterfaceStatus> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for row in csvutil::csv_rows(raw) {
            let interface = csvutil::col(&row, "Interface");
            if interface.is_empty() {
                continue;
            }
            let speed = csvutil::col(&row, "Speed");
            let duplex = csvutil::col(&row, "Duplex");
            entries.push(InterfaceStatus {
                interface_name: interface.to_string(),
                link_status: LinkStatus::parse(csvutil::col(&row, "Status")),
                speed: (!speed.is_empty()).then(|| speed.to_string()),
                duplex: (!duplex.is_empty()).then(|| Duplex::parse(duplex)),
            });
        }
        entries
    }
}

/// `Interface,ACL` → ACL bindings (empty ACL column = no binding).
pub struct AclCsvParser;

impl AclCsvParser {
    pub fn parse(&self, raw: &str) -> Vec<AclBinding> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for row in csvutil::csv_rows(raw) {
            let interface = csvutil::col(&row, "Interface");
            if interface.is_empty() {
                continue;
            }
            let acl = csvutil::col(&row, "ACL");
            entries.push(AclBinding {
                interface_name: interface.to_string(),
                acl_number: (!acl.is_empty()).then(|| acl.to_string()),
            });
        }
        entries
    }
}

/// `IP,Reachable` → per-client reachability.
pub struct PingManyCsvParser;

impl PingManyCsvParser {
    pub fn parse(&self, raw: &str) -> Vec<PingResult> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for row in csvutil::csv_rows(raw) {
            let ip = csvutil::col(&row, "IP");
            if ip.is_empty() {
                continue;
            }
            let reachable = matches!(
                csvutil::col(&row, "Reachable").to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
            entries.push(PingResult {
                target: ip.to_string(),
                is_reachable: reachable,
                success_rate: if reachable { 100.0 } else { 0.0 },
                avg_rtt_ms: None,
            });
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_table_rows() {
        let raw = "MAC,Interface,VLAN\nAA:BB:CC:DD:EE:01,GE1/0/1,100\nbad-mac,GE1/0/2,100\n";
        let entries = MacTableCsvParser.parse(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vlan_id.value(), 100);
    }

    #[test]
    fn arp_rows() {
        let raw = "IP,MAC\n10.1.1.1,AA:BB:CC:11:11:01\n10.1.1.2,Incomplete\n";
        let entries = ArpCsvParser.parse(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip_address, "10.1.1.1");
    }

    #[test]
    fn interface_rows() {
        let raw = "Interface,Status,Speed,Duplex\nGE1/0/1,UP,10G,full\n";
        let entries = InterfaceStatusCsvParser.parse(raw);
        assert_eq!(entries[0].link_status, LinkStatus::Up);
        assert_eq!(entries[0].speed.as_deref(), Some("10G"));
    }

    #[test]
    fn acl_rows_keep_unbound_interfaces() {
        let raw = "Interface,ACL\nGE1/0/1,3001\nGE1/0/2,\n";
        let entries = AclCsvParser.parse(raw);
        assert_eq!(entries.len(), 2);
        assert!(entries[1].acl_number.is_none());
    }

    #[test]
    fn ping_many_rows() {
        let raw = "IP,Reachable\n10.1.1.1,true\n10.1.1.2,false\n";
        let entries = PingManyCsvParser.parse(raw);
        assert!(entries[0].is_reachable);
        assert!(!entries[1].is_reachable);
    }

    #[test]
    fn empty_inputs() {
        assert!(MacTableCsvParser.parse("").is_empty());
        assert!(ArpCsvParser.parse(" ").is_empty());
        assert!(PingManyCsvParser.parse("\n").is_empty());
    }
}
