//! Interface error counters via IF-MIB::ifInErrors / ifOutErrors.
//! Only interfaces with a non-zero combined count are reported.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use nmv_domain::{DeviceType, ErrorCount, ParsedRecord};
use tracing::debug;

use crate::collectors::base::{extract_index, format_raw, safe_int, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{IF_IN_ERRORS, IF_OUT_ERRORS};
use crate::session_cache::SnmpSessionCache;

pub struct ErrorCountCollector;

#[async_trait]
impl SnmpCollector for ErrorCountCollector {
    fn api_name(&self) -> &'static str {
        "get_error_count"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let in_varbinds = engine.walk(target, IF_IN_ERRORS).await?;
        let out_varbinds = engine.walk(target, IF_OUT_ERRORS).await?;
        let ifindex_map = cache.get_ifindex_map(&target.ip).await?;

        let mut in_errors: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &in_varbinds {
            let ifindex = safe_int(extract_index(oid, IF_IN_ERRORS), -1);
            if ifindex >= 0 {
                in_errors.insert(ifindex, safe_int(value, 0));
            }
        }
        let mut out_errors: HashMap<i64, i64> = HashMap::new();
        for (oid, value) in &out_varbinds {
            let ifindex = safe_int(extract_index(oid, IF_OUT_ERRORS), -1);
            if ifindex >= 0 {
                out_errors.insert(ifindex, safe_int(value, 0));
            }
        }

        let all_indexes: BTreeSet<i64> =
            in_errors.keys().chain(out_errors.keys()).copied().collect();

        let mut results = Vec::new();
        for ifindex in all_indexes {
            let input = in_errors.get(&ifindex).copied().unwrap_or(0);
            let output = out_errors.get(&ifindex).copied().unwrap_or(0);
            if input + output <= 0 {
                continue;
            }
            let Some(ifname) = ifindex_map.get(&ifindex) else {
                debug!(ifindex, ip = %target.ip, "no ifName for errored interface, skipping");
                continue;
            };
            results.push(ParsedRecord::ErrorCount(ErrorCount {
                interface_name: ifname.clone(),
                crc_errors: input + output,
                input_errors: input,
                output_errors: output,
            }));
        }

        let mut all = in_varbinds;
        all.extend(out_varbinds);
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
    async fn only_errored_interfaces_appear() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("1", "GE1/0/1"), ("2", "GE1/0/2"), ("3", "GE1/0/3")])
            .walk(IF_IN_ERRORS, &[("1", "0"), ("2", "5"), ("3", "0")])
            .walk(IF_OUT_ERRORS, &[("1", "0"), ("2", "1"), ("3", "2")]);
        let cache = scripted_cache(&engine);

        let (_, records) = ErrorCountCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::Hpe,
                &cache,
                &engine,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let ParsedRecord::ErrorCount(second) = &records[0] else {
            panic!("expected error count")
        };
        assert_eq!(second.interface_name, "GE1/0/2");
        assert_eq!(second.input_errors, 5);
        assert_eq!(second.output_errors, 1);
        assert_eq!(second.crc_errors, 6);
    }

    #[tokio::test]
    async fn unnamed_ifindex_is_skipped() {
        let engine = ScriptedEngine::new()
            .walk(IF_NAME, &[("1", "GE1/0/1")])
            .walk(IF_IN_ERRORS, &[("9", "3")])
            .walk(IF_OUT_ERRORS, &[]);
        let cache = scripted_cache(&engine);

        let (_, records) = ErrorCountCollector
            .collect(
                &SnmpTarget::new("10.0.0.1", "public"),
                DeviceType::CiscoIos,
                &cache,
                &engine,
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
