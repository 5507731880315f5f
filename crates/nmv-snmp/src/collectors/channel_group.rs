//! Port-channel membership and sync state via IEEE8023-LAG-MIB + IF-MIB.
//!
//! `dot3adAggPortActorOperState` is OCTET STRING(SIZE(1)); agents render
//! it as decimal or hex. Bit 3 (mask 0x08) is Synchronization: set means
//! the member is bundled and passing traffic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use nmv_domain::{AggProtocol, DeviceType, LinkStatus, ParsedRecord, PortChannel};
use tracing::debug;

use crate::collectors::base::{
    extract_index, format_raw, parse_oper_state_byte, safe_int, SnmpCollector,
};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{
    if_oper_status, DOT3AD_AGG_PORT_ACTOR_OPER_STATE, DOT3AD_AGG_PORT_ATTACHED_AGG_ID,
    IF_OPER_STATUS,
};
use crate::session_cache::SnmpSessionCache;

const SYNC_BIT_MASK: i64 = 0x08;
/// Bit 0 of the actor oper state: lacpActivity. Set for active LACP.
const LACP_ACTIVITY_MASK: i64 = 0x01;

pub struct ChannelGroupCollector;

#[async_trait]
impl SnmpCollector for ChannelGroupCollector {
    fn api_name(&self) -> &'static str {
        "get_channel_group"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let agg_id_varbinds = engine.walk(target, DOT3AD_AGG_PORT_ATTACHED_AGG_ID).await?;
        let oper_state_varbinds = engine
            .walk(target, DOT3AD_AGG_PORT_ACTOR_OPER_STATE)
            .await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        // member ifIndex → aggregate ifIndex
        let mut member_to_agg: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &agg_id_varbinds {
            let member = safe_int(extract_index(oid, DOT3AD_AGG_PORT_ATTACHED_AGG_ID), -1);
            let agg = safe_int(value, 0);
            if member >= 0 && agg > 0 {
                member_to_agg.insert(member, agg);
            }
        }

        // member ifIndex → oper-state byte
        let mut member_oper: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &oper_state_varbinds {
            let member = safe_int(extract_index(oid, DOT3AD_AGG_PORT_ACTOR_OPER_STATE), -1);
            if member >= 0 {
                member_oper.insert(member, parse_oper_state_byte(value));
            }
        }

        // aggregate ifIndex → members
        let mut agg_members: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (member, agg) in &member_to_agg {
            agg_members.entry(*agg).or_default().push(*member);
        }

        // Aggregate link status from IF-MIB, only when there are LAGs.
        let mut agg_oper: HashMap<i64, &'static str> = HashMap::new();
        let mut oper_varbinds = Vec::new();
        if !agg_members.is_empty() {
            oper_varbinds = engine.walk(target, IF_OPER_STATUS).await?;
            for (oid, value) in &oper_varbinds {
                let ifindex = safe_int(extract_index(oid, IF_OPER_STATUS), -1);
                if agg_members.contains_key(&ifindex) {
                    agg_oper.insert(ifindex, if_oper_status(safe_int(value, 0)));
                }
            }
        }

        let mut results = Vec::new();
        for (agg_ifindex, mut members) in agg_members {
            let Some(agg_name) = ifindex_map.get(&agg_ifindex) else {
                debug!(agg_ifindex, ip = %target.ip, "no ifName for aggregate, skipping");
                continue;
            };
            members.sort_unstable();

            let mut member_names = Vec::new();
            let mut member_status = BTreeMap::new();
            let mut any_lacp = false;
            for member in members {
                let Some(name) = ifindex_map.get(&member) else {
                    debug!(member, ip = %target.ip, "no ifName for member, skipping");
                    continue;
                };
                let oper_byte = member_oper.get(&member).copied().unwrap_or(0);
                let state = if oper_byte & SYNC_BIT_MASK != 0 {
                    LinkStatus::Up
                } else {
                    LinkStatus::Down
                };
                if oper_byte & LACP_ACTIVITY_MASK != 0 {
                    any_lacp = true;
                }
                member_status.insert(name.clone(), state);
                member_names.push(name.clone());
            }
            if member_names.is_empty() {
                continue;
            }

            results.push(ParsedRecord::PortChannel(PortChannel {
                interface_name: agg_name.clone(),
                status: LinkStatus::parse(agg_oper.get(&agg_ifindex).unwrap_or(&"unknown")),
                protocol: if any_lacp {
                    AggProtocol::Lacp
                } else {
                    AggProtocol::Static
                },
                members: member_names,
                member_status,
            }));
        }

        let mut all = agg_id_varbinds;
        all.extend(oper_state_varbinds);
        all.extend(oper_varbinds);
        let raw = format_raw(self.api_name(), &target.ip, device_type, &all);
        Ok((raw, results))
    }
}
