//! Scripted engine + cache helpers shared by the collector tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::codec::SnmpValue;
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::SYS_OBJECT_ID;
use crate::session_cache::SnmpSessionCache;

/// Engine whose walk/get results are scripted per OID prefix. Walks can be
/// scoped to a specific community to model Cisco's per-VLAN
/// `community@vlan` contexts.
#[derive(Clone, Default)]
pub(crate) struct ScriptedEngine {
    walks: HashMap<(Option<String>, String), Vec<(String, String)>>,
    gets: HashMap<String, String>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn walk(mut self, prefix: &str, rows: &[(&str, &str)]) -> Self {
        self.walks.insert(
            (None, prefix.to_string()),
            rows.iter()
                .map(|(suffix, value)| (format!("{prefix}.{suffix}"), value.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn walk_for_community(
        mut self,
        community: &str,
        prefix: &str,
        rows: &[(&str, &str)],
    ) -> Self {
        self.walks.insert(
            (Some(community.to_string()), prefix.to_string()),
            rows.iter()
                .map(|(suffix, value)| (format!("{prefix}.{suffix}"), value.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn get_value(mut self, oid: &str, value: &str) -> Self {
        self.gets.insert(oid.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SnmpEngine for ScriptedEngine {
    async fn get(
        &self,
        _target: &SnmpTarget,
        oids: &[&str],
    ) -> Result<BTreeMap<String, String>, SnmpError> {
        let mut result = BTreeMap::new();
        for oid in oids {
            if let Some(value) = self.gets.get(*oid) {
                result.insert(oid.to_string(), value.clone());
            } else if *oid == SYS_OBJECT_ID {
                // Community probes always succeed against the script.
                result.insert(oid.to_string(), "1.3.6.1.4.1.9.1.1".to_string());
            }
        }
        Ok(result)
    }

    async fn walk(
        &self,
        target: &SnmpTarget,
        oid_prefix: &str,
    ) -> Result<Vec<(String, String)>, SnmpError> {
        if let Some(rows) = self
            .walks
            .get(&(Some(target.community.clone()), oid_prefix.to_string()))
        {
            return Ok(rows.clone());
        }
        Ok(self
            .walks
            .get(&(None, oid_prefix.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_bulk(
        &self,
        _target: &SnmpTarget,
        _oids: &[&str],
        _non_repeaters: u32,
        _max_repetitions: u32,
    ) -> Result<Vec<(String, SnmpValue)>, SnmpError> {
        Ok(vec![])
    }
}

pub(crate) fn scripted_cache(engine: &ScriptedEngine) -> SnmpSessionCache {
    SnmpSessionCache::new(
        Arc::new(engine.clone()),
        vec!["public".to_string()],
        161,
        Duration::from_secs(1),
        0,
    )
}
