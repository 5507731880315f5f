//! Power supply status via SNMP.
//!
//! HPE Comware: HH3C-ENTITY-EXT-MIB filtered to entPhysicalClass = 6.
//! Cisco IOS/NXOS: CISCO-ENVMON-MIB supply table.

use std::collections::HashMap;

use async_trait::async_trait;
use nmv_domain::{DeviceType, ParsedRecord, PowerStatus};

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    envmon_state, hh3c_error_status, CISCO_ENV_SUPPLY_DESCR, CISCO_ENV_SUPPLY_STATE,
    ENT_PHYSICAL_CLASS, ENT_PHYSICAL_CLASS_POWER_SUPPLY, ENT_PHYSICAL_NAME,
    HH3C_ENTITY_EXT_ERROR_STATUS,
};
use crate::session_cache::SnmpSessionCache;

pub struct PowerCollector;

#[async_trait]
impl SnmpCollector for PowerCollector {
    fn api_name(&self) -> &'static str {
        "get_power"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        _cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        match device_type {
            DeviceType::Hpe => collect_hpe(target, device_type, engine).await,
            _ => collect_cisco(target, device_type, engine).await,
        }
    }
}

async fn collect_hpe(
    target: &SnmpTarget,
    device_type: DeviceType,
    engine: &dyn SnmpEngine,
) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
    let error_varbinds = engine.walk(target, HH3C_ENTITY_EXT_ERROR_STATUS).await?;
    let class_varbinds = engine.walk(target, ENT_PHYSICAL_CLASS).await?;
    let name_varbinds = engine.walk(target, ENT_PHYSICAL_NAME).await?;

    let mut class_map: HashMap<&str, i64> = HashMap::new();
    for (oid, value) in &class_varbinds {
        class_map.insert(extract_index(oid, ENT_PHYSICAL_CLASS), safe_int(value, 0));
    }
    let mut name_map: HashMap<&str, &str> = HashMap::new();
    for (oid, value) in &name_varbinds {
        name_map.insert(extract_index(oid, ENT_PHYSICAL_NAME), value.as_str());
    }
    let mut error_map: HashMap<&str, i64> = HashMap::new();
    for (oid, value) in &error_varbinds {
        error_map.insert(
            extract_index(oid, HH3C_ENTITY_EXT_ERROR_STATUS),
            safe_int(value, 0),
        );
    }

    let mut psu_indexes: Vec<&&str> = class_map
        .iter()
        .filter(|(_, class)| **class == ENT_PHYSICAL_CLASS_POWER_SUPPLY)
        .map(|(idx, _)| idx)
        .collect();
    psu_indexes.sort_by_key(|idx| safe_int(idx, i64::MAX));

    let mut results = Vec::new();
    for idx in psu_indexes {
        let Some(error_code) = error_map.get(*idx) else {
            continue;
        };
        let status = hh3c_error_status(*error_code);
        let name = name_map
            .get(*idx)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("PSU-{idx}"));
        results.push(ParsedRecord::Power(PowerStatus::new(name, status)));
    }

    let mut all = error_varbinds;
    all.extend(class_varbinds);
    all.extend(name_varbinds);
    let raw = format_raw("get_power", &target.ip, device_type, &all);
    Ok((raw, results))
}

async fn collect_cisco(
    target: &SnmpTarget,
    device_type: DeviceType,
    engine: &dyn SnmpEngine,
) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
    let state_varbinds = engine.walk(target, CISCO_ENV_SUPPLY_STATE).await?;
    let descr_varbinds = engine.walk(target, CISCO_ENV_SUPPLY_DESCR).await?;

    let mut descr_map: HashMap<&str, &str> = HashMap::new();
    for (oid, value) in &descr_varbinds {
        descr_map.insert(extract_index(oid, CISCO_ENV_SUPPLY_DESCR), value.as_str());
    }

    let mut results = Vec::new();
    for (oid, value) in &state_varbinds {
        let idx = extract_index(oid, CISCO_ENV_SUPPLY_STATE);
        let status = envmon_state(safe_int(value, 0));
        let name = descr_map
            .get(idx)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("PSU-{idx}"));
        results.push(ParsedRecord::Power(PowerStatus::new(name, status)));
    }

    let mut all = state_varbinds;
    all.extend(descr_varbinds);
    let raw = format_raw("get_power", &target.ip, device_type, &all);
    Ok((raw, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testutil::{scripted_cache, ScriptedEngine};
    use nmv_domain::OperationalStatus;

    #[tokio::test]
    async fn hpe_filters_to_power_entities() {
        let engine = ScriptedEngine::new()
            .walk(HH3C_ENTITY_EXT_ERROR_STATUS, &[("1", "2"), ("5", "51"), ("6", "2")])
            .walk(ENT_PHYSICAL_CLASS, &[("1", "7"), ("5", "6"), ("6", "6")])
            .walk(ENT_PHYSICAL_NAME, &[("1", "Fan 1"), ("5", "PSU 1"), ("6", "PSU 2")]);
        let cache = scripted_cache(&engine);

        let (_, records) = PowerCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::Hpe,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let ParsedRecord::Power(psu1) = &records[0] else {
            panic!("expected power")
        };
        assert_eq!(psu1.ps_id, "PSU 1");
        assert_eq!(psu1.status, OperationalStatus::Fail); // psuError(51)
    }

    #[tokio::test]
    async fn cisco_supply_table() {
        let engine = ScriptedEngine::new()
            .walk(CISCO_ENV_SUPPLY_STATE, &[("1", "1"), ("2", "5")])
            .walk(
                CISCO_ENV_SUPPLY_DESCR,
                &[("1", "Power Supply 1"), ("2", "Power Supply 2")],
            );
        let cache = scripted_cache(&engine);

        let (_, records) = PowerCollector
            .collect(
                &SnmpTarget::new("10.0.0.2", "public"),
                DeviceType::CiscoNxos,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let ParsedRecord::Power(psu2) = &records[1] else {
            panic!("expected power")
        };
        assert_eq!(psu2.status, OperationalStatus::Absent);
    }
}
