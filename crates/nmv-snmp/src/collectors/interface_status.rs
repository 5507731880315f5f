//! Interface status via IF-MIB + EtherLike-MIB. Non-physical interfaces
//! are filtered by ifName prefix; speeds render from ifHighSpeed Mbps.

use std::collections::HashMap;

use async_trait::async_trait;
use nmv_domain::{DeviceType, Duplex, InterfaceStatus, LinkStatus, ParsedRecord};

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    duplex_status, if_oper_status, DOT3_STATS_DUPLEX, IF_HIGH_SPEED, IF_OPER_STATUS,
};
use crate::session_cache::SnmpSessionCache;

/// Prefixes of non-physical interfaces to skip.
const SKIP_PREFIXES: &[&str] = &[
    "Loopback", "Lo", "Vlan", "Vl", "Null", "Nu", "Tunnel", "Tu", "mgmt", "Management",
    "Cpu", "cpu", "Stack", "InLoopBack", "Register", "Aux",
];

/// ifHighSpeed (Mbps) → display string.
fn format_speed(mbps: i64) -> String {
    match mbps {
        10 => "10M".to_string(),
        100 => "100M".to_string(),
        1000 => "1G".to_string(),
        2500 => "2.5G".to_string(),
        5000 => "5G".to_string(),
        10_000 => "10G".to_string(),
        25_000 => "25G".to_string(),
        40_000 => "40G".to_string(),
        50_000 => "50G".to_string(),
        100_000 => "100G".to_string(),
        mbps if mbps >= 1000 => format!("{}G", mbps / 1000),
        mbps if mbps > 0 => format!("{mbps}M"),
        _ => "unknown".to_string(),
    }
}

fn is_physical(ifname: &str) -> bool {
    !SKIP_PREFIXES.iter().any(|p| ifname.starts_with(p))
}

pub struct InterfaceStatusCollector;

#[async_trait]
impl SnmpCollector for InterfaceStatusCollector {
    fn api_name(&self) -> &'static str {
        "get_interface_status"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let oper_varbinds = engine.walk(target, IF_OPER_STATUS).await?;
        let speed_varbinds = engine.walk(target, IF_HIGH_SPEED).await?;
        let duplex_varbinds = engine.walk(target, DOT3_STATS_DUPLEX).await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let mut oper_by_idx: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &oper_varbinds {
            let ifindex = safe_int(extract_index(oid, IF_OPER_STATUS), -1);
            if ifindex >= 0 {
                oper_by_idx.insert(ifindex, safe_int(value, 0));
            }
        }
        let mut speed_by_idx: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &speed_varbinds {
            let ifindex = safe_int(extract_index(oid, IF_HIGH_SPEED), -1);
            if ifindex >= 0 {
                speed_by_idx.insert(ifindex, safe_int(value, 0));
            }
        }
        let mut duplex_by_idx: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &duplex_varbinds {
            let ifindex = safe_int(extract_index(oid, DOT3_STATS_DUPLEX), -1);
            if ifindex >= 0 {
                duplex_by_idx.insert(ifindex, safe_int(value, 0));
            }
        }

        let mut indexes: Vec<i64> = oper_by_idx.keys().copied().collect();
        indexes.sort_unstable();

        let mut results = Vec::new();
        for ifindex in indexes {
            let Some(ifname) = ifindex_map.get(&ifindex) else {
                continue;
            };
            if !is_physical(ifname) {
                continue;
            }
            let link = LinkStatus::parse(if_oper_status(oper_by_idx[&ifindex]));
            let speed = format_speed(speed_by_idx.get(&ifindex).copied().unwrap_or(0));
            let duplex = duplex_by_idx
                .get(&ifindex)
                .map(|code| Duplex::parse(duplex_status(*code)));

            results.push(ParsedRecord::InterfaceStatus(InterfaceStatus {
                interface_name: ifname.clone(),
                link_status: link,
                speed: Some(speed),
                duplex,
            }));
        }

        let mut all = oper_varbinds;
        all.extend(speed_varbinds);
        all.extend(duplex_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }
}
