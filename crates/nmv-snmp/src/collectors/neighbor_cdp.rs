//! CDP neighbors via CISCO-CDP-MIB (Cisco only).
//!
//! `cdpCacheTable` index is `cdpCacheIfIndex.cdpCacheDeviceIndex`; the
//! first component is the local interface's IF-MIB ifIndex. HPE devices do
//! not speak CDP and yield an empty list.

use std::collections::BTreeMap;

use async_trait::async_trait;
use nmv_domain::{DeviceType, Neighbor, ParsedRecord};
use tracing::debug;

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{CISCO_CDP_CACHE_DEVICE_ID, CISCO_CDP_CACHE_DEVICE_PORT};
use crate::session_cache::SnmpSessionCache;

pub struct NeighborCdpCollector;

#[async_trait]
impl SnmpCollector for NeighborCdpCollector {
    fn api_name(&self) -> &'static str {
        "get_uplink_cdp"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        if device_type == DeviceType::Hpe {
            let raw = format_raw(self.api_name(), &target.ip, device_type, &[]);
            return Ok((raw, vec![]));
        }

        let device_id_varbinds = engine.walk(target, CISCO_CDP_CACHE_DEVICE_ID).await?;
        let device_port_varbinds = engine.walk(target, CISCO_CDP_CACHE_DEVICE_PORT).await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let mut device_ids: BTreeMap<&str, &str> = BTreeMap::new();
        for (oid, value) in &device_id_varbinds {
            device_ids.insert(extract_index(oid, CISCO_CDP_CACHE_DEVICE_ID), value.as_str());
        }
        let mut device_ports: BTreeMap<&str, &str> = BTreeMap::new();
        for (oid, value) in &device_port_varbinds {
            device_ports.insert(extract_index(oid, CISCO_CDP_CACHE_DEVICE_PORT), value.as_str());
        }

        let mut results = Vec::new();
        for (compound_idx, remote_hostname) in device_ids {
            let remote_port = device_ports.get(compound_idx).copied().unwrap_or("");
            if remote_hostname.is_empty() || remote_port.is_empty() {
                continue;
            }

            // compound index: "{ifIndex}.{deviceIndex}"
            let if_index = compound_idx
                .split('.')
                .next()
                .map(|p| safe_int(p, -1))
                .unwrap_or(-1);
            if if_index < 0 {
                continue;
            }
            let Some(local_ifname) = ifindex_map.get(&if_index) else {
                debug!(if_index, ip = %target.ip, "no ifName for CDP local port, skipping");
                continue;
            };

            results.push(ParsedRecord::Neighbor(Neighbor::new(
                local_ifname.clone(),
                remote_hostname,
                remote_port,
            )));
        }

        let mut all = device_id_varbinds;
        all.extend(device_port_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testutil::{scripted_cache, ScriptedEngine};
    use crate::oids::IF_NAME;

    #[tokio::test]
    async fn hpe_returns_empty_without_walking() {
        let engine = ScriptedEngine::new();
        let cache = scripted_cache(&engine);
        let (raw, records) = NeighborCdpCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::Hpe,
                &cache,
                &engine,
            )
            .await
            .unwrap();
        assert!(records.is_empty());
        assert!(raw.contains("OID count: 0"));
    }

    #[tokio::test]
    async fn cisco_joins_cache_rows_with_ifnames() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("49", "Eth1/49"), ("50", "Eth1/50")])
            .walk(
                CISCO_CDP_CACHE_DEVICE_ID,
                &[("49.1", "CORE-SW-01"), ("50.1", "CORE-SW-02")],
            )
            .walk(
                CISCO_CDP_CACHE_DEVICE_PORT,
                &[("49.1", "Ethernet1/1"), ("50.1", "Ethernet1/1")],
            );
        let cache = scripted_cache(&engine);

        let (_, records) = NeighborCdpCollector
            .collect(
                &SnmpTarget::new("10.0.0.2", "public"),
                DeviceType::CiscoNxos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let ParsedRecord::Neighbor(n) = &records[0] else {
            panic!("expected neighbor")
        };
        assert_eq!(n.local_interface, "Eth1/49");
        assert_eq!(n.remote_hostname, "CORE-SW-01");
        assert_eq!(n.remote_interface, "Ethernet1/1");
    }

    #[tokio::test]
    async fn unknown_ifindex_drops_entry() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("49", "Eth1/49")])
            .walk(CISCO_CDP_CACHE_DEVICE_ID, &[("99.1", "CORE-SW-01")])
            .walk(CISCO_CDP_CACHE_DEVICE_PORT, &[("99.1", "Ethernet1/1")]);
        let cache = scripted_cache(&engine);

        let (_, records) = NeighborCdpCollector
            .collect(
                &SnmpTarget::new("10.0.0.2", "public"),
                DeviceType::CiscoIos,
                &cache,
                &engine,
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
