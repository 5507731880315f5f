//! LLDP neighbors via LLDP-MIB.
//!
//! Remote table index is `lldpRemTimeMark.lldpRemLocalPortNum.lldpRemIndex`.
//! Local port numbers map to interface names through lldpLocPortDesc.
//! Remote interface prefers lldpRemPortDesc, falling back to lldpRemPortId.

use std::collections::HashMap;

use async_trait::async_trait;
use nmv_domain::{DeviceType, Neighbor, ParsedRecord};
use tracing::debug;

use crate::collectors::base::{extract_index, format_raw, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{LLDP_LOC_PORT_DESC, LLDP_REM_PORT_DESC, LLDP_REM_PORT_ID, LLDP_REM_SYS_NAME};
use crate::session_cache::SnmpSessionCache;

/// `(time_mark, local_port_num, rem_index)` from a remote-table OID suffix.
fn parse_remote_index<'a>(oid: &'a str, prefix: &str) -> Option<(&'a str, &'a str, &'a str)> {
    let suffix = extract_index(oid, prefix);
    let mut parts = suffix.split('.');
    let time_mark = parts.next()?;
    let local_port = parts.next()?;
    let rem_index = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((time_mark, local_port, rem_index))
}

pub struct NeighborLldpCollector;

#[async_trait]
impl SnmpCollector for NeighborLldpCollector {
    fn api_name(&self) -> &'static str {
        "get_uplink_lldp"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        _cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let sys_name_varbinds = engine.walk(target, LLDP_REM_SYS_NAME).await?;
        let port_id_varbinds = engine.walk(target, LLDP_REM_PORT_ID).await?;
        let port_desc_varbinds = engine.walk(target, LLDP_REM_PORT_DESC).await?;
        let loc_port_varbinds = engine.walk(target, LLDP_LOC_PORT_DESC).await?;

        // local port number → interface name
        let mut local_ports: HashMap<&str, &str> = HashMap::new();
        for (oid, value) in &loc_port_varbinds {
            let port_num = extract_index(oid, LLDP_LOC_PORT_DESC);
            if !port_num.is_empty() && !value.is_empty() {
                local_ports.insert(port_num, value.as_str());
            }
        }

        // keyed remote entries: "{time_mark}.{local_port}.{rem_index}"
        let mut sys_names: Vec<(String, String, String)> = Vec::new(); // (key, local_port, name)
        for (oid, value) in &sys_name_varbinds {
            if let Some((tm, lp, ri)) = parse_remote_index(oid, LLDP_REM_SYS_NAME) {
                sys_names.push((format!("{tm}.{lp}.{ri}"), lp.to_string(), value.clone()));
            }
        }
        let mut port_ids: HashMap<String, &str> = HashMap::new();
        for (oid, value) in &port_id_varbinds {
            if let Some((tm, lp, ri)) = parse_remote_index(oid, LLDP_REM_PORT_ID) {
                port_ids.insert(format!("{tm}.{lp}.{ri}"), value.as_str());
            }
        }
        let mut port_descs: HashMap<String, &str> = HashMap::new();
        for (oid, value) in &port_desc_varbinds {
            if let Some((tm, lp, ri)) = parse_remote_index(oid, LLDP_REM_PORT_DESC) {
                port_descs.insert(format!("{tm}.{lp}.{ri}"), value.as_str());
            }
        }

        let mut results = Vec::new();
        for (key, local_port, remote_hostname) in sys_names {
            if remote_hostname.is_empty() {
                continue;
            }
            let local_interface = local_ports
                .get(local_port.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("port{local_port}"));

            let remote_interface = match (port_descs.get(&key), port_ids.get(&key)) {
                (Some(desc), _) if !desc.is_empty() => desc.to_string(),
                (_, Some(id)) if !id.is_empty() => id.to_string(),
                _ => {
                    debug!(key = %key, ip = %target.ip, "no remote interface for LLDP entry, skipping");
                    continue;
                }
            };

            results.push(ParsedRecord::Neighbor(Neighbor::new(
                local_interface,
                remote_hostname,
                remote_interface,
            )));
        }

        let mut all = sys_name_varbinds;
        all.extend(port_id_varbinds);
        all.extend(port_desc_varbinds);
        all.extend(loc_port_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }
}
