//! Mock SNMP engine.
//!
//! Drop-in replacement for [`UdpSnmpEngine`](crate::udp::UdpSnmpEngine)
//! that generates OID data internally — no network traffic. Data is
//! deterministic per `(ip, oid_prefix)` with a minute-granularity time
//! bucket mixed into the seed, so values vary across collection cycles but
//! stay stable within one. Roughly 5% of devices fail per cycle, plus
//! small independent per-port defect probabilities.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::codec::SnmpValue;
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::*;

/// Expected uplink topology injected from the expectation tables:
/// ip → [(local_interface, neighbor_hostname, neighbor_interface)].
pub type UplinkPlan = HashMap<String, Vec<(String, String, String)>>;

const DEFAULT_NEIGHBORS: &[(&str, &str, &str)] = &[
    ("GigabitEthernet1/0/49", "SW-DEFAULT-CORE-01", "HGE1/0/1"),
    ("GigabitEthernet1/0/50", "SW-DEFAULT-CORE-02", "HGE1/0/1"),
];

const VALID_VLANS: &[u16] = &[10, 20, 100, 200];

const DEFAULT_CLIENT_MACS: &[&str] = &[
    "AA:BB:CC:11:11:01",
    "AA:BB:CC:11:11:02",
    "AA:BB:CC:11:11:03",
    "AA:BB:CC:22:22:01",
    "AA:BB:CC:22:22:02",
    "AA:BB:CC:22:22:03",
    "AA:BB:CC:33:33:01",
    "AA:BB:CC:33:33:02",
];

const SYS_DESCR_HPE: &str = "HPE Comware Platform Software, Software Version 7.1.070, \
Release 6728P06\nHPE FF 5130-24G-4SFP+ EI Switch";
const SYS_DESCR_IOS: &str = "Cisco IOS Software, C3750E Software (C3750E-UNIVERSALK9-M), \
Version 15.2(7)E2, RELEASE SOFTWARE (fc3)";
const SYS_DESCR_NXOS: &str = "Cisco NX-OS(tm) n9000, Software (n9000-dk9), \
Version 9.3(8), RELEASE SOFTWARE";

/// (ifName, ifIndex, speed_mbps) per mock vendor profile.
fn interfaces_for(vendor: MockVendor) -> Vec<(String, i64, i64)> {
    let (prefix, uplink, lag) = match vendor {
        MockVendor::Hpe => ("GE1/0/", "XGE1/0/1", "BAGG1"),
        MockVendor::Ios => ("Gi1/0/", "Te1/1/1", "Po1"),
        MockVendor::Nxos => ("Eth1/", "Eth1/49", "Po1"),
    };
    let mut interfaces: Vec<(String, i64, i64)> = (1..=18)
        .map(|i| (format!("{prefix}{i}"), i, 1000))
        .collect();
    interfaces.push((uplink.to_string(), 19, 10_000));
    interfaces.push((lag.to_string(), 20, 10_000));
    interfaces
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockVendor {
    Hpe,
    Ios,
    Nxos,
}

pub struct MockSnmpEngine {
    latency: Duration,
    uplink_plan: UplinkPlan,
    client_macs: Vec<String>,
    /// ~5% per-cycle per-device failure probability.
    fail_rate: f64,
}

impl Default for MockSnmpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSnmpEngine {
    pub fn new() -> Self {
        info!("mock SNMP engine active, no real devices will be contacted");
        Self {
            latency: Duration::from_millis(5),
            uplink_plan: UplinkPlan::new(),
            client_macs: DEFAULT_CLIENT_MACS.iter().map(|m| m.to_string()).collect(),
            fail_rate: 0.05,
        }
    }

    /// Drive LLDP/CDP data from the maintenance uplink expectations
    /// instead of the built-in defaults.
    pub fn with_uplink_plan(mut self, plan: UplinkPlan) -> Self {
        self.uplink_plan = plan;
        self
    }

    /// Use the maintenance client MAC list for FDB generation.
    pub fn with_client_macs(mut self, macs: Vec<String>) -> Self {
        self.client_macs = macs;
        self
    }

    #[cfg(test)]
    fn without_failures(mut self) -> Self {
        self.fail_rate = 0.0;
        self
    }

    // ── Determinism helpers ───────────────────────────────────────────────

    fn det_hash(ip: &str, salt: &str) -> u64 {
        let digest = Sha256::digest(format!("{ip}:{salt}").as_bytes());
        u64::from_be_bytes(digest[..8].try_into().unwrap_or([0; 8]))
    }

    fn det_float(ip: &str, salt: &str) -> f64 {
        (Self::det_hash(ip, salt) % 10_000) as f64 / 10_000.0
    }

    /// Current minute bucket. Data varies across cycles, stays stable
    /// within one.
    fn time_bucket() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() / 60)
            .unwrap_or(0)
    }

    fn fails_this_cycle(&self, ip: &str) -> bool {
        let bucket = Self::time_bucket();
        Self::det_float(ip, &format!("cycle_{bucket}")) < self.fail_rate
    }

    /// Small per-port defect draw, seeded by (ip, prefix, port, bucket).
    fn port_defect(ip: &str, salt: &str, port: i64, probability: f64) -> bool {
        let bucket = Self::time_bucket();
        Self::det_float(ip, &format!("{salt}_{port}_{bucket}")) < probability
    }

    fn vendor_of(ip: &str) -> MockVendor {
        match Self::det_hash(ip, "vendor") % 4 {
            0 | 1 => MockVendor::Hpe,
            2 => MockVendor::Ios,
            _ => MockVendor::Nxos,
        }
    }

    fn neighbors_for(&self, ip: &str, fails: bool) -> Vec<(String, String, String)> {
        let mut neighbors = self.uplink_plan.get(ip).cloned().unwrap_or_else(|| {
            DEFAULT_NEIGHBORS
                .iter()
                .map(|(l, h, r)| (l.to_string(), h.to_string(), r.to_string()))
                .collect()
        });
        // Failure mode: one expected neighbor disappears.
        if fails && neighbors.len() > 1 {
            neighbors.truncate(1);
        }
        neighbors
    }

    fn extract_vlan_context(community: &str) -> Option<u16> {
        community.rsplit_once('@').and_then(|(_, v)| v.parse().ok())
    }

    // ── Walk generators ───────────────────────────────────────────────────

    fn mock_walk(&self, ip: &str, community: &str, prefix: &str) -> Vec<(String, String)> {
        let vendor = Self::vendor_of(ip);
        let interfaces = interfaces_for(vendor);
        let fails = self.fails_this_cycle(ip);

        match prefix {
            IF_NAME => interfaces
                .iter()
                .map(|(name, idx, _)| (format!("{IF_NAME}.{idx}"), name.clone()))
                .collect(),

            IF_OPER_STATUS => interfaces
                .iter()
                .map(|(_, idx, _)| {
                    let down = (fails && (3..=5).contains(idx))
                        || (*idx <= 18 && Self::port_defect(ip, "oper", *idx, 0.02));
                    (
                        format!("{IF_OPER_STATUS}.{idx}"),
                        if down { "2" } else { "1" }.to_string(),
                    )
                })
                .collect(),

            IF_HIGH_SPEED => interfaces
                .iter()
                .map(|(_, idx, speed)| {
                    let speed = if *idx <= 18
                        && *speed == 1000
                        && Self::port_defect(ip, "speed", *idx, 0.03)
                    {
                        100 // auto-negotiation fallback
                    } else {
                        *speed
                    };
                    (format!("{IF_HIGH_SPEED}.{idx}"), speed.to_string())
                })
                .collect(),

            IF_IN_ERRORS => interfaces
                .iter()
                .map(|(_, idx, _)| {
                    let errors = if Self::port_defect(ip, "inerr", *idx, 0.15) {
                        Self::det_hash(ip, &format!("inerr_n_{idx}")) % 6
                    } else {
                        0
                    };
                    (format!("{IF_IN_ERRORS}.{idx}"), errors.to_string())
                })
                .collect(),

            IF_OUT_ERRORS => interfaces
                .iter()
                .map(|(_, idx, _)| {
                    let errors = if Self::port_defect(ip, "outerr", *idx, 0.10) {
                        Self::det_hash(ip, &format!("outerr_n_{idx}")) % 4
                    } else {
                        0
                    };
                    (format!("{IF_OUT_ERRORS}.{idx}"), errors.to_string())
                })
                .collect(),

            DOT3_STATS_DUPLEX => interfaces
                .iter()
                .map(|(_, idx, _)| {
                    let half = *idx <= 18 && Self::port_defect(ip, "duplex", *idx, 0.03);
                    (
                        format!("{DOT3_STATS_DUPLEX}.{idx}"),
                        if half { "2" } else { "3" }.to_string(),
                    )
                })
                .collect(),

            DOT1Q_TP_FDB_PORT => self.mock_q_bridge_fdb(ip, fails),

            DOT1D_TP_FDB_PORT => {
                let vlan = Self::extract_vlan_context(community);
                self.mock_bridge_fdb(ip, fails, vlan)
            }

            DOT1D_BASE_PORT_IF_INDEX => interfaces
                .iter()
                .filter(|(_, idx, _)| *idx <= 18) // physical ports only
                .map(|(_, idx, _)| (format!("{DOT1D_BASE_PORT_IF_INDEX}.{idx}"), idx.to_string()))
                .collect(),

            CISCO_VTP_VLAN_STATE => VALID_VLANS
                .iter()
                .map(|v| (format!("{CISCO_VTP_VLAN_STATE}.1.{v}"), "1".to_string()))
                .collect(),

            LLDP_REM_SYS_NAME => {
                let uplink_idx = interfaces[interfaces.len() - 2].1;
                self.neighbors_for(ip, fails)
                    .iter()
                    .enumerate()
                    .map(|(i, (_, host, _))| {
                        (format!("{LLDP_REM_SYS_NAME}.0.{uplink_idx}.{}", i + 1), host.clone())
                    })
                    .collect()
            }
            LLDP_REM_PORT_ID => {
                let uplink_idx = interfaces[interfaces.len() - 2].1;
                self.neighbors_for(ip, fails)
                    .iter()
                    .enumerate()
                    .map(|(i, (_, _, remote))| {
                        (format!("{LLDP_REM_PORT_ID}.0.{uplink_idx}.{}", i + 1), remote.clone())
                    })
                    .collect()
            }
            LLDP_REM_PORT_DESC => {
                let uplink_idx = interfaces[interfaces.len() - 2].1;
                self.neighbors_for(ip, fails)
                    .iter()
                    .enumerate()
                    .map(|(i, (_, _, remote))| {
                        (format!("{LLDP_REM_PORT_DESC}.0.{uplink_idx}.{}", i + 1), remote.clone())
                    })
                    .collect()
            }
            LLDP_LOC_PORT_DESC => interfaces
                .iter()
                .map(|(name, idx, _)| (format!("{LLDP_LOC_PORT_DESC}.{idx}"), name.clone()))
                .collect(),

            DOT3AD_AGG_PORT_ATTACHED_AGG_ID => {
                let agg = interfaces[interfaces.len() - 1].1;
                let member1 = interfaces[interfaces.len() - 3].1;
                let member2 = interfaces[interfaces.len() - 2].1;
                vec![
                    (format!("{DOT3AD_AGG_PORT_ATTACHED_AGG_ID}.{member1}"), agg.to_string()),
                    (format!("{DOT3AD_AGG_PORT_ATTACHED_AGG_ID}.{member2}"), agg.to_string()),
                ]
            }
            DOT3AD_AGG_PORT_ACTOR_OPER_STATE => {
                let member1 = interfaces[interfaces.len() - 3].1;
                let member2 = interfaces[interfaces.len() - 2].1;
                // 0x3d: sync bit set; 0x37: sync bit clear.
                let synced = "61";
                let not_synced = "55";
                vec![
                    (format!("{DOT3AD_AGG_PORT_ACTOR_OPER_STATE}.{member1}"), synced.to_string()),
                    (
                        format!("{DOT3AD_AGG_PORT_ACTOR_OPER_STATE}.{member2}"),
                        if fails { not_synced } else { synced }.to_string(),
                    ),
                ]
            }

            HH3C_ENTITY_EXT_ERROR_STATUS => {
                // Entities 1-4 fans, 5-6 PSUs, 7-8 modules; fan 3 fails.
                (1..=8)
                    .map(|idx| {
                        let status = if idx == 3 && fails { "41" } else { "2" };
                        (format!("{HH3C_ENTITY_EXT_ERROR_STATUS}.{idx}"), status.to_string())
                    })
                    .collect()
            }
            ENT_PHYSICAL_CLASS => (1..=8)
                .map(|idx| {
                    let class = match idx {
                        1..=4 => "7", // fan
                        5 | 6 => "6", // power supply
                        _ => "9",     // module
                    };
                    (format!("{ENT_PHYSICAL_CLASS}.{idx}"), class.to_string())
                })
                .collect(),
            ENT_PHYSICAL_NAME => {
                let mut rows: Vec<(String, String)> = (1..=8)
                    .map(|idx| {
                        let name = match idx {
                            1..=4 => format!("Fan {idx}"),
                            5 | 6 => format!("PSU {}", idx - 4),
                            _ => format!("Slot {}", idx - 6),
                        };
                        (format!("{ENT_PHYSICAL_NAME}.{idx}"), name)
                    })
                    .collect();
                // Cisco-style sensor entities live above index 1000.
                rows.extend(self.cisco_sensor_entity_names(&interfaces));
                rows
            }
            ENT_PHYSICAL_CONTAINED_IN => self.cisco_sensor_contained_in(&interfaces),

            HH3C_TRANSCEIVER_TEMPERATURE => {
                let uplink = &interfaces[interfaces.len() - 2];
                let temp = 35 + (Self::det_hash(ip, "xcvr_temp") % 16) as i64;
                vec![(format!("{HH3C_TRANSCEIVER_TEMPERATURE}.{}", uplink.1), temp.to_string())]
            }
            HH3C_TRANSCEIVER_VOLTAGE => {
                let uplink = &interfaces[interfaces.len() - 2];
                let hundredths = 320 + (Self::det_hash(ip, "xcvr_volt") % 21) as i64;
                vec![(format!("{HH3C_TRANSCEIVER_VOLTAGE}.{}", uplink.1), hundredths.to_string())]
            }
            HH3C_TRANSCEIVER_TX_POWER => {
                let uplink = &interfaces[interfaces.len() - 2];
                // hundredths of dBm: -3.0 ± 1.0
                let tx = -300 + (Self::det_hash(ip, "xcvr_tx") % 201) as i64 - 100;
                vec![(format!("{HH3C_TRANSCEIVER_TX_POWER}.{}", uplink.1), tx.to_string())]
            }
            HH3C_TRANSCEIVER_RX_POWER => {
                let uplink = &interfaces[interfaces.len() - 2];
                let rx = -800 + (Self::det_hash(ip, "xcvr_rx") % 401) as i64 - 200;
                vec![(format!("{HH3C_TRANSCEIVER_RX_POWER}.{}", uplink.1), rx.to_string())]
            }

            CISCO_ENV_FAN_STATE => (1..=4)
                .map(|idx| {
                    let state = if idx == 3 && fails { "5" } else { "1" };
                    (format!("{CISCO_ENV_FAN_STATE}.{idx}"), state.to_string())
                })
                .collect(),
            CISCO_ENV_FAN_DESCR => (1..=4)
                .map(|idx| {
                    (format!("{CISCO_ENV_FAN_DESCR}.{idx}"), format!("Fan{idx}(Sys_Fan{idx})"))
                })
                .collect(),
            CISCO_ENV_SUPPLY_STATE => (1..=2)
                .map(|idx| (format!("{CISCO_ENV_SUPPLY_STATE}.{idx}"), "1".to_string()))
                .collect(),
            CISCO_ENV_SUPPLY_DESCR => (1..=2)
                .map(|idx| {
                    (format!("{CISCO_ENV_SUPPLY_DESCR}.{idx}"), format!("Power Supply {idx}"))
                })
                .collect(),

            CISCO_CDP_CACHE_DEVICE_ID => {
                let uplink_idx = interfaces[interfaces.len() - 2].1;
                self.neighbors_for(ip, fails)
                    .iter()
                    .enumerate()
                    .map(|(i, (_, host, _))| {
                        (format!("{CISCO_CDP_CACHE_DEVICE_ID}.{uplink_idx}.{}", i + 1), host.clone())
                    })
                    .collect()
            }
            CISCO_CDP_CACHE_DEVICE_PORT => {
                let uplink_idx = interfaces[interfaces.len() - 2].1;
                self.neighbors_for(ip, fails)
                    .iter()
                    .enumerate()
                    .map(|(i, (_, _, remote))| {
                        (
                            format!("{CISCO_CDP_CACHE_DEVICE_PORT}.{uplink_idx}.{}", i + 1),
                            remote.clone(),
                        )
                    })
                    .collect()
            }

            CISCO_ENT_SENSOR_VALUE | CISCO_ENT_SENSOR_TYPE | CISCO_ENT_SENSOR_SCALE
            | CISCO_ENT_SENSOR_PRECISION => self.mock_cisco_sensors(ip, prefix, &interfaces),

            _ => Vec::new(),
        }
    }

    /// Q-BRIDGE FDB: index encodes `{vlan}.{6 MAC octets}` → bridge port.
    fn mock_q_bridge_fdb(&self, ip: &str, fails: bool) -> Vec<(String, String)> {
        if fails {
            return Vec::new();
        }
        let mut rows = Vec::new();
        for mac in &self.client_macs {
            // Each MAC homes on a stable pseudo-random port and VLAN.
            let h = Self::det_hash(mac, "port");
            let bridge_port = (h % 18 + 1) as i64;
            let vlan = VALID_VLANS[(h % VALID_VLANS.len() as u64) as usize];
            let octets: Vec<String> = mac
                .split(':')
                .filter_map(|o| u8::from_str_radix(o, 16).ok())
                .map(|o| o.to_string())
                .collect();
            if octets.len() != 6 {
                continue;
            }
            // Spread MACs across devices: only a deterministic subset lands here.
            if Self::det_hash(&format!("{mac}|{ip}"), "assign") % 2 == 0 {
                continue;
            }
            rows.push((
                format!("{DOT1Q_TP_FDB_PORT}.{vlan}.{}", octets.join(".")),
                bridge_port.to_string(),
            ));
        }
        rows
    }

    /// BRIDGE-MIB FDB for one VLAN context: index is the 6 MAC octets only.
    fn mock_bridge_fdb(&self, ip: &str, fails: bool, vlan: Option<u16>) -> Vec<(String, String)> {
        let Some(vlan) = vlan else { return Vec::new() };
        if fails {
            return Vec::new();
        }
        let mut rows = Vec::new();
        for mac in &self.client_macs {
            let h = Self::det_hash(mac, "port");
            let mac_vlan = VALID_VLANS[(h % VALID_VLANS.len() as u64) as usize];
            if mac_vlan != vlan {
                continue;
            }
            if Self::det_hash(&format!("{mac}|{ip}"), "assign") % 2 == 0 {
                continue;
            }
            let bridge_port = (h % 18 + 1) as i64;
            let octets: Vec<String> = mac
                .split(':')
                .filter_map(|o| u8::from_str_radix(o, 16).ok())
                .map(|o| o.to_string())
                .collect();
            if octets.len() != 6 {
                continue;
            }
            rows.push((
                format!("{DOT1D_TP_FDB_PORT}.{}", octets.join(".")),
                bridge_port.to_string(),
            ));
        }
        rows
    }

    /// Entity names for the Cisco sensor tree: per uplink transceiver, one
    /// parent module (index 1000+ifIndex) and four sensors under it.
    fn cisco_sensor_entity_names(&self, interfaces: &[(String, i64, i64)]) -> Vec<(String, String)> {
        let uplink = &interfaces[interfaces.len() - 2];
        let base = 1000 + uplink.1;
        vec![
            (format!("{ENT_PHYSICAL_NAME}.{base}"), uplink.0.clone()),
            (format!("{ENT_PHYSICAL_NAME}.{}", base * 10 + 1), format!("{} Temperature Sensor", uplink.0)),
            (format!("{ENT_PHYSICAL_NAME}.{}", base * 10 + 2), format!("{} Supply Voltage Sensor", uplink.0)),
            (format!("{ENT_PHYSICAL_NAME}.{}", base * 10 + 3), format!("{} Transmit Power Sensor", uplink.0)),
            (format!("{ENT_PHYSICAL_NAME}.{}", base * 10 + 4), format!("{} Receive Power Sensor", uplink.0)),
        ]
    }

    fn cisco_sensor_contained_in(&self, interfaces: &[(String, i64, i64)]) -> Vec<(String, String)> {
        let uplink = &interfaces[interfaces.len() - 2];
        let base = 1000 + uplink.1;
        (1..=4)
            .map(|s| (format!("{ENT_PHYSICAL_CONTAINED_IN}.{}", base * 10 + s), base.to_string()))
            .collect()
    }

    fn mock_cisco_sensors(
        &self,
        ip: &str,
        prefix: &str,
        interfaces: &[(String, i64, i64)],
    ) -> Vec<(String, String)> {
        let uplink = &interfaces[interfaces.len() - 2];
        let base = 1000 + uplink.1;
        // sensor 1: celsius, 2: voltsDC, 3: tx dBm, 4: rx dBm
        (1..=4)
            .map(|s| {
                let idx = base * 10 + s;
                let value = match prefix {
                    CISCO_ENT_SENSOR_TYPE => match s {
                        1 => CISCO_SENSOR_TYPE_CELSIUS,
                        2 => CISCO_SENSOR_TYPE_VOLTS_DC,
                        _ => CISCO_SENSOR_TYPE_DBM,
                    }
                    .to_string(),
                    CISCO_ENT_SENSOR_SCALE => "9".to_string(), // units
                    CISCO_ENT_SENSOR_PRECISION => "1".to_string(),
                    _ => match s {
                        1 => (350 + (Self::det_hash(ip, "sens_temp") % 100) as i64).to_string(),
                        2 => "33".to_string(),
                        3 => (-30 + (Self::det_hash(ip, "sens_tx") % 20) as i64 - 10).to_string(),
                        _ => (-80 + (Self::det_hash(ip, "sens_rx") % 40) as i64 - 20).to_string(),
                    },
                };
                (format!("{prefix}.{idx}"), value)
            })
            .collect()
    }
}

#[async_trait]
impl SnmpEngine for MockSnmpEngine {
    async fn get(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
    ) -> Result<BTreeMap<String, String>, SnmpError> {
        tokio::time::sleep(self.latency).await;
        let vendor = Self::vendor_of(&target.ip);
        let mut result = BTreeMap::new();
        for oid in oids {
            match *oid {
                SYS_OBJECT_ID => {
                    let value = match vendor {
                        MockVendor::Hpe => "1.3.6.1.4.1.25506.11.1.136",
                        _ => "1.3.6.1.4.1.9.1.2066",
                    };
                    result.insert(oid.to_string(), value.to_string());
                }
                SYS_DESCR => {
                    let value = match vendor {
                        MockVendor::Hpe => SYS_DESCR_HPE,
                        MockVendor::Ios => SYS_DESCR_IOS,
                        MockVendor::Nxos => SYS_DESCR_NXOS,
                    };
                    result.insert(oid.to_string(), value.to_string());
                }
                _ => {}
            }
        }
        Ok(result)
    }

    async fn walk(
        &self,
        target: &SnmpTarget,
        oid_prefix: &str,
    ) -> Result<Vec<(String, String)>, SnmpError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.mock_walk(&target.ip, &target.community, oid_prefix))
    }

    async fn get_bulk(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
        _non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<(String, SnmpValue)>, SnmpError> {
        tokio::time::sleep(self.latency).await;
        let Some(first) = oids.first() else {
            return Ok(vec![]);
        };
        Ok(self
            .mock_walk(&target.ip, &target.community, first)
            .into_iter()
            .take(max_repetitions as usize)
            .map(|(oid, value)| (oid, SnmpValue::OctetString(value.into_bytes())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ip: &str) -> SnmpTarget {
        SnmpTarget::new(ip, "public")
    }

    #[tokio::test]
    async fn sys_object_id_is_vendor_stable() {
        let engine = MockSnmpEngine::new().without_failures();
        let a = engine.get(&target("10.0.0.1"), &[SYS_OBJECT_ID]).await.unwrap();
        let b = engine.get(&target("10.0.0.1"), &[SYS_OBJECT_ID]).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains_key(SYS_OBJECT_ID));
    }

    #[tokio::test]
    async fn ifname_walk_matches_vendor_profile() {
        let engine = MockSnmpEngine::new().without_failures();
        let rows = engine.walk(&target("10.0.0.1"), IF_NAME).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|(oid, _)| oid.starts_with(IF_NAME)));
    }

    #[tokio::test]
    async fn vlan_context_scopes_bridge_fdb() {
        let macs = vec!["AA:BB:CC:DD:EE:01".to_string(), "AA:BB:CC:DD:EE:02".to_string()];
        let engine = MockSnmpEngine::new()
            .without_failures()
            .with_client_macs(macs);

        // Without a VLAN context the BRIDGE-MIB walk yields nothing.
        let no_ctx = engine.walk(&target("10.9.9.9"), DOT1D_TP_FDB_PORT).await.unwrap();
        assert!(no_ctx.is_empty());

        // Rows for a VLAN context only carry MACs homed in that VLAN.
        let mut ctx_target = target("10.9.9.9");
        ctx_target.community = "public@10".to_string();
        let vlan10 = engine.walk(&ctx_target, DOT1D_TP_FDB_PORT).await.unwrap();
        for (oid, _) in &vlan10 {
            assert!(oid.starts_with(DOT1D_TP_FDB_PORT));
            // index is exactly six octets
            let suffix = &oid[DOT1D_TP_FDB_PORT.len() + 1..];
            assert_eq!(suffix.split('.').count(), 6);
        }
    }

    #[tokio::test]
    async fn vtp_walk_lists_active_vlans() {
        let engine = MockSnmpEngine::new().without_failures();
        let rows = engine.walk(&target("10.0.0.2"), CISCO_VTP_VLAN_STATE).await.unwrap();
        assert_eq!(rows.len(), VALID_VLANS.len());
        assert!(rows.iter().all(|(_, v)| v == "1"));
    }

    #[tokio::test]
    async fn uplink_plan_overrides_default_neighbors() {
        let mut plan = UplinkPlan::new();
        plan.insert(
            "10.1.3.21".to_string(),
            vec![(
                "XGE1/0/51".to_string(),
                "SW-NEW-003-AGG".to_string(),
                "XGE1/0/1".to_string(),
            )],
        );
        let engine = MockSnmpEngine::new().without_failures().with_uplink_plan(plan);
        let rows = engine.walk(&target("10.1.3.21"), LLDP_REM_SYS_NAME).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, "SW-NEW-003-AGG");
    }

    #[tokio::test]
    async fn lag_oper_state_carries_sync_bit() {
        let engine = MockSnmpEngine::new().without_failures();
        let rows = engine
            .walk(&target("10.0.0.3"), DOT3AD_AGG_PORT_ACTOR_OPER_STATE)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        for (_, value) in rows {
            let byte: i64 = value.parse().unwrap();
            assert_ne!(byte & 0x08, 0, "sync bit must be set when healthy");
        }
    }

    #[tokio::test]
    async fn unknown_prefix_walks_empty() {
        let engine = MockSnmpEngine::new();
        let rows = engine.walk(&target("10.0.0.1"), "1.3.6.1.4.1.99999.1").await.unwrap();
        assert!(rows.is_empty());
    }
}
