//! MAC address table via SNMP, two modes:
//!
//! 1. HPE / Cisco NX-OS: standard Q-BRIDGE-MIB `dot1qTpFdbPort` — the
//!    index encodes `{vlan}.{six MAC octets}`.
//! 2. Cisco IOS: per-VLAN community indexing. Walk `vtpVlanState` for
//!    active VLANs (reserved 1002-1005 skipped), then walk BRIDGE-MIB
//!    `dot1dTpFdbPort` once per VLAN with community `community@vlan`.
//!    This is a real SNMP convention and is carried as-is.

use async_trait::async_trait;
use nmv_domain::{DeviceType, MacAddr, MacTableEntry, ParsedRecord, VlanId};
use tracing::{debug, warn};

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    CISCO_VTP_VLAN_STATE, DOT1D_BASE_PORT_IF_INDEX, DOT1D_TP_FDB_PORT, DOT1Q_TP_FDB_PORT,
};
use crate::session_cache::SnmpSessionCache;

/// Decode `{vlan}.{o1}.{o2}.{o3}.{o4}.{o5}.{o6}` → (vlan, MAC).
fn parse_q_bridge_index(index: &str) -> Option<(u16, MacAddr)> {
    let parts: Vec<&str> = index.split('.').collect();
    if parts.len() != 7 {
        return None;
    }
    let vlan: u32 = parts[0].parse().ok()?;
    VlanId::new(vlan).ok()?;
    let mut octets = [0u8; 6];
    for (i, part) in parts[1..].iter().enumerate() {
        octets[i] = part.parse().ok()?;
    }
    Some((vlan as u16, MacAddr::from_octets(octets)))
}

/// Decode `{o1}.{o2}.{o3}.{o4}.{o5}.{o6}` → MAC (VLAN implied by the
/// community context).
fn parse_bridge_index(index: &str) -> Option<MacAddr> {
    let parts: Vec<&str> = index.split('.').collect();
    if parts.len() != 6 {
        return None;
    }
    let mut octets = [0u8; 6];
    for (i, part) in parts.iter().enumerate() {
        octets[i] = part.parse().ok()?;
    }
    Some(MacAddr::from_octets(octets))
}

pub struct MacTableCollector;

#[async_trait]
impl SnmpCollector for MacTableCollector {
    fn api_name(&self) -> &'static str {
        "get_mac_table"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        match device_type {
            DeviceType::CiscoIos => self.collect_cisco_ios(target, device_type, cache, engine).await,
            _ => self.collect_standard(target, device_type, cache, engine).await,
        }
    }
}

impl MacTableCollector {
    async fn collect_standard(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let fdb_varbinds = engine.walk(target, DOT1Q_TP_FDB_PORT).await?;
        let bridge_port_map = cache.get_bridge_port_map(&target.ip).await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let mut results = Vec::new();
        for (oid, value) in &fdb_varbinds {
            let index = extract_index(oid, DOT1Q_TP_FDB_PORT);
            let Some((vlan, mac)) = parse_q_bridge_index(index) else {
                debug!(index, ip = %target.ip, "unparseable FDB index");
                continue;
            };
            let bridge_port = safe_int(value, -1);
            if bridge_port < 0 {
                continue;
            }
            let Some(ifindex) = bridge_port_map.get(&bridge_port) else {
                continue;
            };
            let Some(ifname) = ifindex_map.get(ifindex) else {
                continue;
            };
            let Ok(vlan_id) = VlanId::new(vlan as u32) else {
                continue;
            };
            results.push(ParsedRecord::MacTable(MacTableEntry {
                mac_address: mac,
                interface_name: ifname.clone(),
                vlan_id,
            }));
        }

        let raw = format_raw(self.api_name(), &target.ip, device_type, &fdb_varbinds);
        Ok((raw, results))
    }

    async fn collect_cisco_ios(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let vlans = self.active_vlans(target, engine).await?;
        if vlans.is_empty() {
            warn!(ip = %target.ip, "no active VLANs, falling back to standard Q-BRIDGE walk");
            return self.collect_standard(target, device_type, cache, engine).await;
        }

        // ifIndex map is global; the bridge-port map differs per VLAN.
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let mut all_fdb_varbinds = Vec::new();
        let mut results = Vec::new();

        for vlan_id in vlans {
            let vlan_target = target.with_vlan_context(vlan_id);

            let bridge_varbinds = match engine.walk(&vlan_target, DOT1D_BASE_PORT_IF_INDEX).await {
                Ok(rows) => rows,
                Err(e) if e.is_timeout() => {
                    debug!(vlan_id, ip = %target.ip, "VLAN context timed out, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut bridge_port_map = std::collections::HashMap::new();
            for (oid, value) in &bridge_varbinds {
                let bp = safe_int(extract_index(oid, DOT1D_BASE_PORT_IF_INDEX), -1);
                let ifindex = safe_int(value, -1);
                if bp >= 0 && ifindex >= 0 {
                    bridge_port_map.insert(bp, ifindex);
                }
            }

            let fdb_varbinds = match engine.walk(&vlan_target, DOT1D_TP_FDB_PORT).await {
                Ok(rows) => rows,
                Err(e) if e.is_timeout() => {
                    debug!(vlan_id, ip = %target.ip, "VLAN FDB walk timed out, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for (oid, value) in &fdb_varbinds {
                let index = extract_index(oid, DOT1D_TP_FDB_PORT);
                let Some(mac) = parse_bridge_index(index) else {
                    debug!(index, vlan_id, ip = %target.ip, "unparseable bridge FDB index");
                    continue;
                };
                let bridge_port = safe_int(value, -1);
                if bridge_port < 0 {
                    continue;
                }
                let Some(ifindex) = bridge_port_map.get(&bridge_port) else {
                    continue;
                };
                let Some(ifname) = ifindex_map.get(ifindex) else {
                    continue;
                };
                let Ok(vlan) = VlanId::new(vlan_id as u32) else {
                    continue;
                };
                results.push(ParsedRecord::MacTable(MacTableEntry {
                    mac_address: mac,
                    interface_name: ifname.clone(),
                    vlan_id: vlan,
                }));
            }
            all_fdb_varbinds.extend(fdb_varbinds);
        }

        let raw = format_raw(self.api_name(), &target.ip, device_type, &all_fdb_varbinds);
        Ok((raw, results))
    }

    /// Active VLAN ids from CISCO-VTP-MIB::vtpVlanState, skipping the
    /// reserved 1002-1005 range (fddi, token-ring and friends).
    async fn active_vlans(
        &self,
        target: &SnmpTarget,
        engine: &dyn SnmpEngine,
    ) -> Result<Vec<u16>, SnmpError> {
        let vtp_varbinds = engine.walk(target, CISCO_VTP_VLAN_STATE).await?;

        let mut vlans = Vec::new();
        for (oid, value) in &vtp_varbinds {
            // value 1 = operational
            if value != "1" {
                continue;
            }
            // OID: …vtpVlanState.{domain}.{vlanId}
            let Some(vlan_id) = oid.rsplit('.').next().and_then(|s| s.parse::<u16>().ok()) else {
                continue;
            };
            if (1002..=1005).contains(&vlan_id) {
                continue;
            }
            vlans.push(vlan_id);
        }
        debug!(ip = %target.ip, ?vlans, "active VLANs");
        Ok(vlans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testutil::{scripted_cache, ScriptedEngine};
    use crate::oids::IF_NAME;

    fn mac_entries(records: Vec<ParsedRecord>) -> Vec<MacTableEntry> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::MacTable(e) => e,
                other => panic!("expected mac-table record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn q_bridge_index_decodes_vlan_and_mac() {
        let (vlan, mac) = parse_q_bridge_index("100.0.28.115.69.118.64").unwrap();
        assert_eq!(vlan, 100);
        assert_eq!(mac.as_str(), "00:1C:73:45:76:40");
        assert!(parse_q_bridge_index("100.1.2.3").is_none());
        assert!(parse_q_bridge_index("100.256.2.3.4.5.6").is_none());
    }

    #[tokio::test]
    async fn standard_mode_joins_all_three_maps() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("3", "GE1/0/3")])
            .walk(DOT1D_BASE_PORT_IF_INDEX, &[("7", "3")])
            .walk(DOT1Q_TP_FDB_PORT, &[("10.170.187.204.221.238.1", "7")]);
        let cache = scripted_cache(&engine);

        let (_, records) = MacTableCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::CiscoNxos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        let entries = mac_entries(records);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mac_address.as_str(), "AA:BB:CC:DD:EE:01");
        assert_eq!(entries[0].interface_name, "GE1/0/3");
        assert_eq!(entries[0].vlan_id.value(), 10);
    }

    #[tokio::test]
    async fn cisco_ios_walks_per_vlan_context_and_skips_reserved() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("1", "Gi1/0/1"), ("2", "Gi1/0/2")])
            .walk(
                CISCO_VTP_VLAN_STATE,
                &[("1.10", "1"), ("1.20", "1"), ("1.1002", "1"), ("1.1005", "1")],
            )
            // VLAN 10 context
            .walk_for_community("public@10", DOT1D_BASE_PORT_IF_INDEX, &[("5", "1")])
            .walk_for_community(
                "public@10",
                DOT1D_TP_FDB_PORT,
                &[("170.187.204.221.238.1", "5")],
            )
            // VLAN 20 context
            .walk_for_community("public@20", DOT1D_BASE_PORT_IF_INDEX, &[("6", "2")])
            .walk_for_community(
                "public@20",
                DOT1D_TP_FDB_PORT,
                &[("170.187.204.221.238.2", "6")],
            );
        let cache = scripted_cache(&engine);

        let (_, records) = MacTableCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::CiscoIos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        let entries = mac_entries(records);
        // Reserved VLANs 1002/1005 contribute nothing; 10 and 20 one each.
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].vlan_id.value(), 10);
        assert_eq!(entries[0].mac_address.as_str(), "AA:BB:CC:DD:EE:01");
        assert_eq!(entries[0].interface_name, "Gi1/0/1");
        assert_eq!(entries[1].vlan_id.value(), 20);
        assert_eq!(entries[1].interface_name, "Gi1/0/2");
    }

    #[tokio::test]
    async fn no_active_vlans_falls_back_to_q_bridge() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("3", "Gi1/0/3")])
            .walk(CISCO_VTP_VLAN_STATE, &[])
            .walk(DOT1D_BASE_PORT_IF_INDEX, &[("7", "3")])
            .walk(DOT1Q_TP_FDB_PORT, &[("10.170.187.204.221.238.3", "7")]);
        let cache = scripted_cache(&engine);

        let (_, records) = MacTableCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::CiscoIos,
                &cache,
                &engine,
            )
            .await
            .unwrap();
        assert_eq!(mac_entries(records).len(), 1);
    }
}
