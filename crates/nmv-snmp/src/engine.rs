use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::codec::SnmpValue;
use crate::error::SnmpError;

/// Connection parameters for a single SNMP target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpTarget {
    pub ip: String,
    pub community: String,
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
}

impl SnmpTarget {
    pub fn new(ip: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            community: community.into(),
            port: 161,
            timeout: Duration::from_secs(5),
            retries: 2,
        }
    }

    /// Clone this target with a per-VLAN community context
    /// (`community@vlan`), the Cisco IOS convention for BRIDGE-MIB walks.
    pub fn with_vlan_context(&self, vlan_id: u16) -> Self {
        Self {
            community: format!("{}@{}", self.community, vlan_id),
            ..self.clone()
        }
    }
}

/// Engine-level configuration.
#[derive(Debug, Clone)]
pub struct SnmpEngineConfig {
    pub max_repetitions: u32,
    pub walk_timeout: Duration,
}

impl Default for SnmpEngineConfig {
    fn default() -> Self {
        Self {
            max_repetitions: 25,
            walk_timeout: Duration::from_secs(120),
        }
    }
}

/// Async SNMP operations against a single target.
///
/// OIDs are dotted strings on this seam — collectors index varbinds by
/// string prefix, and the mock engine matches on the same constants.
/// Values are pre-rendered (integers decimal, printable octet strings as
/// text, binary as `0x…`); exception sentinels are filtered before return.
///
/// Shared across all collection cycles and read-only after construction.
#[async_trait]
pub trait SnmpEngine: Send + Sync {
    /// GET one or more scalar OIDs. Exception values are dropped from the
    /// result map; a missing key means the object does not exist.
    async fn get(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
    ) -> Result<BTreeMap<String, String>, SnmpError>;

    /// Walk an entire subtree via repeated GETBULK. Terminates when a
    /// returned OID leaves the subtree or endOfMibView appears; the whole
    /// walk is bounded by the engine's `walk_timeout`.
    async fn walk(
        &self,
        target: &SnmpTarget,
        oid_prefix: &str,
    ) -> Result<Vec<(String, String)>, SnmpError>;

    /// Single GETBULK primitive. Rarely called directly.
    async fn get_bulk(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<(String, SnmpValue)>, SnmpError>;
}
