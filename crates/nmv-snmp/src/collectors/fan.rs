//! Fan status via SNMP.
//!
//! HPE Comware: HH3C-ENTITY-EXT-MIB error status filtered to fan entities
//! (entPhysicalClass = 7). Cisco IOS/NXOS: CISCO-ENVMON-MIB fan table.

use std::collections::HashMap;

use async_trait::async_trait;
use nmv_domain::{DeviceType, FanStatus, ParsedRecord};

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    envmon_state, hh3c_error_status, CISCO_ENV_FAN_DESCR, CISCO_ENV_FAN_STATE,
    ENT_PHYSICAL_CLASS, ENT_PHYSICAL_CLASS_FAN, ENT_PHYSICAL_NAME,
    HH3C_ENTITY_EXT_ERROR_STATUS,
};
use crate::session_cache::SnmpSessionCache;

pub struct FanCollector;

#[async_trait]
impl SnmpCollector for FanCollector {
    fn api_name(&self) -> &'static str {
        "get_fan"
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

    let mut results = Vec::new();
    let mut fan_indexes: Vec<&&str> = class_map
        .iter()
        .filter(|(_, class)| **class == ENT_PHYSICAL_CLASS_FAN)
        .map(|(idx, _)| idx)
        .collect();
    fan_indexes.sort_by_key(|idx| safe_int(idx, i64::MAX));

    for idx in fan_indexes {
        let Some(error_code) = error_map.get(*idx) else {
            continue;
        };
        let status = hh3c_error_status(*error_code);
        let fan_name = name_map
            .get(*idx)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Fan-{idx}"));
        results.push(ParsedRecord::Fan(FanStatus::new(fan_name, status)));
    }

    let mut all = error_varbinds;
    all.extend(class_varbinds);
    all.extend(name_varbinds);
    let raw = format_raw("get_fan", &target.ip, device_type, &all);
    Ok((raw, results))
}

async fn collect_cisco(
    target: &SnmpTarget,
    device_type: DeviceType,
    engine: &dyn SnmpEngine,
) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
    let state_varbinds = engine.walk(target, CISCO_ENV_FAN_STATE).await?;
    let descr_varbinds = engine.walk(target, CISCO_ENV_FAN_DESCR).await?;

    let mut descr_map: HashMap<&str, &str> = HashMap::new();
    for (oid, value) in &descr_varbinds {
        descr_map.insert(extract_index(oid, CISCO_ENV_FAN_DESCR), value.as_str());
    }

    let mut results = Vec::new();
    for (oid, value) in &state_varbinds {
        let idx = extract_index(oid, CISCO_ENV_FAN_STATE);
        let status = envmon_state(safe_int(value, 0));
        let fan_name = descr_map
            .get(idx)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Fan-{idx}"));
        results.push(ParsedRecord::Fan(FanStatus::new(fan_name, status)));
    }

    let mut all = state_varbinds;
    all.extend(descr_varbinds);
    let raw = format_raw("get_fan", &target.ip, device_type, &all);
    Ok((raw, results))
}
