//! Transceiver DOM diagnostics via SNMP.
//!
//! HPE Comware: HH3C-TRANSCEIVER-INFO-MIB, indexed by ifIndex.
//! Cisco IOS/NXOS: CISCO-ENTITY-SENSOR-MIB crossed with
//! ENTITY-MIB::entPhysicalContainedIn to attribute sensors to their parent
//! interface entity. dBm sensors split into Tx/Rx by name keywords, with
//! alternating assignment as the fallback.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use nmv_domain::{DeviceType, ParsedRecord, Transceiver, TransceiverChannel};
use tracing::debug;

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    sensor_scale_factor, CISCO_ENT_SENSOR_PRECISION, CISCO_ENT_SENSOR_SCALE,
    CISCO_ENT_SENSOR_TYPE, CISCO_ENT_SENSOR_VALUE, CISCO_SENSOR_TYPE_CELSIUS,
    CISCO_SENSOR_TYPE_DBM, CISCO_SENSOR_TYPE_VOLTS_DC, ENT_PHYSICAL_CONTAINED_IN,
    ENT_PHYSICAL_NAME, HH3C_TRANSCEIVER_RX_POWER, HH3C_TRANSCEIVER_TEMPERATURE,
    HH3C_TRANSCEIVER_TX_POWER, HH3C_TRANSCEIVER_VOLTAGE,
};
use crate::session_cache::SnmpSessionCache;

pub struct TransceiverCollector;

#[async_trait]
impl SnmpCollector for TransceiverCollector {
    fn api_name(&self) -> &'static str {
        "get_gbic_details"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        match device_type {
            DeviceType::Hpe => self.collect_hpe(target, device_type, cache, engine).await,
            _ => self.collect_cisco(target, device_type, engine).await,
        }
    }
}

impl TransceiverCollector {
    /// HH3C values: temperature in 1°C, voltage in 0.01 V, power in
    /// 0.01 dBm; all indexed by ifIndex, one lane per SFP interface.
    async fn collect_hpe(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let temp_varbinds = engine.walk(target, HH3C_TRANSCEIVER_TEMPERATURE).await?;
        let volt_varbinds = engine.walk(target, HH3C_TRANSCEIVER_VOLTAGE).await?;
        let tx_varbinds = engine.walk(target, HH3C_TRANSCEIVER_TX_POWER).await?;
        let rx_varbinds = engine.walk(target, HH3C_TRANSCEIVER_RX_POWER).await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let index_values = |varbinds: &[(String, String)], prefix: &str| -> HashMap<i64, i64> {
            let mut map = HashMap::new();
            for (oid, value) in varbinds {
                let idx = safe_int(extract_index(oid, prefix), -1);
                if idx >= 0 {
                    map.insert(idx, safe_int(value, 0));
                }
            }
            map
        };

        let temps = index_values(&temp_varbinds, HH3C_TRANSCEIVER_TEMPERATURE);
        let volts = index_values(&volt_varbinds, HH3C_TRANSCEIVER_VOLTAGE);
        let tx_powers = index_values(&tx_varbinds, HH3C_TRANSCEIVER_TX_POWER);
        let rx_powers = index_values(&rx_varbinds, HH3C_TRANSCEIVER_RX_POWER);

        let all_indexes: BTreeSet<i64> = temps
            .keys()
            .chain(volts.keys())
            .chain(tx_powers.keys())
            .chain(rx_powers.keys())
            .copied()
            .collect();

        let mut results = Vec::new();
        for ifindex in all_indexes {
            let Some(ifname) = ifindex_map.get(&ifindex) else {
                debug!(ifindex, ip = %target.ip, "no ifName for transceiver, skipping");
                continue;
            };
            results.push(ParsedRecord::Transceiver(Transceiver {
                interface_name: ifname.clone(),
                temperature: temps.get(&ifindex).map(|v| *v as f64),
                voltage: volts.get(&ifindex).map(|v| *v as f64 / 100.0),
                channels: vec![TransceiverChannel {
                    channel: 1,
                    tx_power: tx_powers.get(&ifindex).map(|v| *v as f64 / 100.0),
                    rx_power: rx_powers.get(&ifindex).map(|v| *v as f64 / 100.0),
                }],
                serial_number: None,
                part_number: None,
            }));
        }

        let mut all = temp_varbinds;
        all.extend(volt_varbinds);
        all.extend(tx_varbinds);
        all.extend(rx_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }

    async fn collect_cisco(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let value_varbinds = engine.walk(target, CISCO_ENT_SENSOR_VALUE).await?;
        let type_varbinds = engine.walk(target, CISCO_ENT_SENSOR_TYPE).await?;
        let scale_varbinds = engine.walk(target, CISCO_ENT_SENSOR_SCALE).await?;
        let prec_varbinds = engine.walk(target, CISCO_ENT_SENSOR_PRECISION).await?;
        let name_varbinds = engine.walk(target, ENT_PHYSICAL_NAME).await?;
        let contained_varbinds = engine.walk(target, ENT_PHYSICAL_CONTAINED_IN).await?;

        let index_map = |varbinds: &[(String, String)], prefix: &str| -> HashMap<String, i64> {
            let mut map = HashMap::new();
            for (oid, value) in varbinds {
                map.insert(extract_index(oid, prefix).to_string(), safe_int(value, 0));
            }
            map
        };

        let sensor_values = index_map(&value_varbinds, CISCO_ENT_SENSOR_VALUE);
        let sensor_types = index_map(&type_varbinds, CISCO_ENT_SENSOR_TYPE);
        let sensor_scales = index_map(&scale_varbinds, CISCO_ENT_SENSOR_SCALE);
        let sensor_precisions = index_map(&prec_varbinds, CISCO_ENT_SENSOR_PRECISION);

        let mut entity_names: HashMap<String, String> = HashMap::new();
        for (oid, value) in &name_varbinds {
            entity_names.insert(extract_index(oid, ENT_PHYSICAL_NAME).to_string(), value.clone());
        }
        let mut contained_in: HashMap<String, String> = HashMap::new();
        for (oid, value) in &contained_varbinds {
            contained_in.insert(
                extract_index(oid, ENT_PHYSICAL_CONTAINED_IN).to_string(),
                value.clone(),
            );
        }

        // parent entity → [(sensor type, actual value, sensor name)]
        let mut parent_sensors: BTreeMap<String, Vec<(i64, f64, String)>> = BTreeMap::new();
        for (idx, raw_value) in &sensor_values {
            let Some(s_type) = sensor_types.get(idx) else {
                continue;
            };
            if ![
                CISCO_SENSOR_TYPE_CELSIUS,
                CISCO_SENSOR_TYPE_VOLTS_DC,
                CISCO_SENSOR_TYPE_DBM,
            ]
            .contains(s_type)
            {
                continue;
            }
            let scale = sensor_scales.get(idx).copied().unwrap_or(9); // units
            let precision = sensor_precisions.get(idx).copied().unwrap_or(0);
            let actual =
                *raw_value as f64 * sensor_scale_factor(scale) * 10f64.powi(-(precision as i32));

            let parent = contained_in.get(idx).cloned().unwrap_or_else(|| idx.clone());
            let sensor_name = entity_names.get(idx).cloned().unwrap_or_default();
            parent_sensors
                .entry(parent)
                .or_default()
                .push((*s_type, actual, sensor_name));
        }

        let mut results = Vec::new();
        for (parent_idx, sensors) in parent_sensors {
            let iface_name = match entity_names.get(&parent_idx) {
                Some(name) if !name.is_empty() => name.clone(),
                _ => {
                    // Walk one level further up for a named ancestor.
                    let grandparent = contained_in.get(&parent_idx).cloned().unwrap_or_default();
                    entity_names
                        .get(&grandparent)
                        .cloned()
                        .unwrap_or_else(|| format!("Entity-{parent_idx}"))
                }
            };

            let mut temperature = None;
            let mut voltage = None;
            let mut tx_powers: Vec<f64> = Vec::new();
            let mut rx_powers: Vec<f64> = Vec::new();

            for (s_type, actual, sensor_name) in sensors {
                match s_type {
                    t if t == CISCO_SENSOR_TYPE_CELSIUS => temperature = Some(actual),
                    t if t == CISCO_SENSOR_TYPE_VOLTS_DC => voltage = Some(actual),
                    _ => {
                        let lower = sensor_name.to_ascii_lowercase();
                        if lower.contains("transmit") || lower.contains("tx") {
                            tx_powers.push(actual);
                        } else if lower.contains("receive") || lower.contains("rx") {
                            rx_powers.push(actual);
                        } else if tx_powers.len() <= rx_powers.len() {
                            tx_powers.push(actual);
                        } else {
                            rx_powers.push(actual);
                        }
                    }
                }
            }

            // One channel per lane, paired by position.
            let lanes = tx_powers.len().max(rx_powers.len());
            let mut channels = Vec::new();
            for lane in 0..lanes {
                let tx = tx_powers.get(lane).copied();
                let rx = rx_powers.get(lane).copied();
                if tx.is_none() && rx.is_none() {
                    continue;
                }
                channels.push(TransceiverChannel {
                    channel: (lane + 1) as u8,
                    tx_power: tx,
                    rx_power: rx,
                });
            }

            if channels.is_empty() && temperature.is_none() && voltage.is_none() {
                continue;
            }
            if channels.is_empty() {
                channels.push(TransceiverChannel {
                    channel: 1,
                    tx_power: None,
                    rx_power: None,
                });
            }

            results.push(ParsedRecord::Transceiver(Transceiver {
                interface_name: iface_name,
                temperature,
                voltage,
                channels,
                serial_number: None,
                part_number: None,
            }));
        }

        let mut all = value_varbinds;
        all.extend(type_varbinds);
        all.extend(scale_varbinds);
        all.extend(prec_varbinds);
        all.extend(name_varbinds);
        all.extend(contained_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testutil::{scripted_cache, ScriptedEngine};
    use crate::oids::IF_NAME;

    fn xcvrs(records: Vec<ParsedRecord>) -> Vec<Transceiver> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Transceiver(t) => t,
                other => panic!("expected transceiver, got {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn hpe_units_convert() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("19", "XGE1/0/1")])
            .walk(HH3C_TRANSCEIVER_TEMPERATURE, &[("19", "36")])
            .walk(HH3C_TRANSCEIVER_VOLTAGE, &[("19", "330")])
            .walk(HH3C_TRANSCEIVER_TX_POWER, &[("19", "-250")])
            .walk(HH3C_TRANSCEIVER_RX_POWER, &[("19", "-820")]);
        let cache = scripted_cache(&engine);

        let (_, records) = TransceiverCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::Hpe,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        let xcvrs = xcvrs(records);
        assert_eq!(xcvrs.len(), 1);
        assert_eq!(xcvrs[0].interface_name, "XGE1/0/1");
        assert_eq!(xcvrs[0].temperature, Some(36.0));
        assert_eq!(xcvrs[0].voltage, Some(3.3));
        assert_eq!(xcvrs[0].channels.len(), 1);
        assert_eq!(xcvrs[0].channels[0].tx_power, Some(-2.5));
        assert_eq!(xcvrs[0].channels[0].rx_power, Some(-8.2));
    }

    #[tokio::test]
    async fn cisco_sensors_cross_reference_parents() {
        // Entity 1019: uplink module. Sensors 10191-10194 contained in it.
        let engine = ScriptedEngine::new()
            .walk(
                ENT_PHYSICAL_NAME,
                &[
                    ("1019", "Ethernet1/49"),
                    ("10191", "Ethernet1/49 Temperature Sensor"),
                    ("10192", "Ethernet1/49 Supply Voltage Sensor"),
                    ("10193", "Ethernet1/49 Transmit Power Sensor"),
                    ("10194", "Ethernet1/49 Receive Power Sensor"),
                ],
            )
            .walk(
                ENT_PHYSICAL_CONTAINED_IN,
                &[
                    ("10191", "1019"),
                    ("10192", "1019"),
                    ("10193", "1019"),
                    ("10194", "1019"),
                ],
            )
            .walk(
                CISCO_ENT_SENSOR_TYPE,
                &[("10191", "8"), ("10192", "4"), ("10193", "14"), ("10194", "14")],
            )
            .walk(
                CISCO_ENT_SENSOR_SCALE,
                &[("10191", "9"), ("10192", "8"), ("10193", "9"), ("10194", "9")],
            )
            .walk(
                CISCO_ENT_SENSOR_PRECISION,
                &[("10191", "1"), ("10192", "0"), ("10193", "1"), ("10194", "1")],
            )
            .walk(
                CISCO_ENT_SENSOR_VALUE,
                &[("10191", "345"), ("10192", "3300"), ("10193", "-15"), ("10194", "-92")],
            );
        let cache = scripted_cache(&engine);

        let (_, records) = TransceiverCollector
            .collect(
                &SnmpTarget::new("10.0.0.2", "public"),
                DeviceType::CiscoNxos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        let xcvrs = xcvrs(records);
        assert_eq!(xcvrs.len(), 1);
        let x = &xcvrs[0];
        assert_eq!(x.interface_name, "Ethernet1/49");
        let close = |v: Option<f64>, expected: f64| (v.unwrap() - expected).abs() < 1e-9;
        assert!(close(x.temperature, 34.5)); // 345 × 10^-1
        assert!(close(x.voltage, 3.3)); // 3300 milli
        assert_eq!(x.channels.len(), 1);
        assert!(close(x.channels[0].tx_power, -1.5));
        assert!(close(x.channels[0].rx_power, -9.2));
    }

    #[tokio::test]
    async fn dbm_without_direction_keywords_alternates() {
        let engine = ScriptedEngine::new()
            .walk(
                ENT_PHYSICAL_NAME,
                &[("100", "Te1/1/1"), ("1001", "Sensor A"), ("1002", "Sensor B")],
            )
            .walk(ENT_PHYSICAL_CONTAINED_IN, &[("1001", "100"), ("1002", "100")])
            .walk(CISCO_ENT_SENSOR_TYPE, &[("1001", "14"), ("1002", "14")])
            .walk(CISCO_ENT_SENSOR_SCALE, &[("1001", "9"), ("1002", "9")])
            .walk(CISCO_ENT_SENSOR_PRECISION, &[("1001", "1"), ("1002", "1")])
            .walk(CISCO_ENT_SENSOR_VALUE, &[("1001", "-20"), ("1002", "-50")]);
        let cache = scripted_cache(&engine);

        let (_, records) = TransceiverCollector
            .collect(
                &SnmpTarget::new("10.0.0.3", "public"),
                DeviceType::CiscoIos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        let xcvrs = xcvrs(records);
        assert_eq!(xcvrs.len(), 1);
        // One sensor lands tx, the other rx — a single lane either way.
        assert_eq!(xcvrs[0].channels.len(), 1);
        assert!(xcvrs[0].channels[0].tx_power.is_some());
        assert!(xcvrs[0].channels[0].rx_power.is_some());
    }
}
