//! Per-cycle SNMP session cache.
//!
//! Absorbs the work every collector would otherwise repeat for each device:
//! community probing, the ifIndex→ifName map, and the bridge-port→ifIndex
//! map. A cache lives for exactly one collection cycle — communities and
//! topology can change between cycles, so it is never reused.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::{DOT1D_BASE_PORT_IF_INDEX, IF_NAME, SYS_OBJECT_ID};

pub struct SnmpSessionCache {
    engine: Arc<dyn SnmpEngine>,
    communities: Vec<String>,
    port: u16,
    timeout: Duration,
    retries: u32,
    community_cache: Mutex<HashMap<String, String>>,
    ifindex_cache: Mutex<HashMap<String, Arc<HashMap<i64, String>>>>,
    bridge_port_cache: Mutex<HashMap<String, Arc<HashMap<i64, i64>>>>,
}

impl SnmpSessionCache {
    pub fn new(
        engine: Arc<dyn SnmpEngine>,
        communities: Vec<String>,
        port: u16,
        timeout: Duration,
        retries: u32,
    ) -> Self {
        Self {
            engine,
            communities,
            port,
            timeout,
            retries,
            community_cache: Mutex::new(HashMap::new()),
            ifindex_cache: Mutex::new(HashMap::new()),
            bridge_port_cache: Mutex::new(HashMap::new()),
        }
    }

    fn target_with(&self, ip: &str, community: &str) -> SnmpTarget {
        SnmpTarget {
            ip: ip.to_string(),
            community: community.to_string(),
            port: self.port,
            timeout: self.timeout,
            retries: self.retries,
        }
    }

    /// Return a target with the working community for this IP.
    ///
    /// Probes candidates in order with a sysObjectID.0 GET and caches the
    /// first success. A timeout or auth failure on one community falls
    /// through to the next; exhausting the list reports as a timeout so
    /// upstream retry policy treats it like an unreachable device.
    pub async fn get_target(&self, ip: &str) -> Result<SnmpTarget, SnmpError> {
        if let Some(community) = self.community_cache.lock().await.get(ip) {
            return Ok(self.target_with(ip, community));
        }

        for community in &self.communities {
            let target = self.target_with(ip, community);
            match self.engine.get(&target, &[SYS_OBJECT_ID]).await {
                Ok(result) if !result.is_empty() => {
                    debug!(ip, community = %community, "community probe succeeded");
                    self.community_cache
                        .lock()
                        .await
                        .insert(ip.to_string(), community.clone());
                    return Ok(target);
                }
                Ok(_) => {
                    debug!(ip, community = %community, "community probe returned no data, trying next");
                }
                Err(e) => {
                    debug!(ip, community = %community, error = %e, "community probe failed, trying next");
                }
            }
        }

        Err(SnmpError::Timeout(format!(
            "all communities failed for {ip}: tried {:?}",
            self.communities
        )))
    }

    /// ifIndex → ifName for a device. Walks IF-MIB::ifName once per cycle.
    pub async fn get_ifindex_map(&self, ip: &str) -> Result<Arc<HashMap<i64, String>>, SnmpError> {
        if let Some(map) = self.ifindex_cache.lock().await.get(ip) {
            return Ok(map.clone());
        }

        let target = self.get_target(ip).await?;
        let varbinds = self.engine.walk(&target, IF_NAME).await?;

        let mut map = HashMap::new();
        for (oid, value) in varbinds {
            if let Some(ifindex) = oid.rsplit('.').next().and_then(|s| s.parse::<i64>().ok()) {
                map.insert(ifindex, value);
            }
        }
        debug!(ip, interfaces = map.len(), "built ifIndex map");

        let map = Arc::new(map);
        self.ifindex_cache
            .lock()
            .await
            .insert(ip.to_string(), map.clone());
        Ok(map)
    }

    /// Bridge port → ifIndex for a device. Walks
    /// BRIDGE-MIB::dot1dBasePortIfIndex once per cycle; the MAC-table
    /// collector needs it to turn FDB bridge ports into interfaces.
    pub async fn get_bridge_port_map(&self, ip: &str) -> Result<Arc<HashMap<i64, i64>>, SnmpError> {
        if let Some(map) = self.bridge_port_cache.lock().await.get(ip) {
            return Ok(map.clone());
        }

        let target = self.get_target(ip).await?;
        let varbinds = self.engine.walk(&target, DOT1D_BASE_PORT_IF_INDEX).await?;

        let mut map = HashMap::new();
        for (oid, value) in varbinds {
            let bridge_port = oid.rsplit('.').next().and_then(|s| s.parse::<i64>().ok());
            let ifindex = value.parse::<i64>().ok();
            if let (Some(bp), Some(idx)) = (bridge_port, ifindex) {
                map.insert(bp, idx);
            }
        }
        debug!(ip, ports = map.len(), "built bridge port map");

        let map = Arc::new(map);
        self.bridge_port_cache
            .lock()
            .await
            .insert(ip.to_string(), map.clone());
        Ok(map)
    }

    /// Reset all three maps (start of a new cycle).
    pub async fn clear(&self) {
        self.community_cache.lock().await.clear();
        self.ifindex_cache.lock().await.clear();
        self.bridge_port_cache.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::codec::SnmpValue;

    /// Scripted engine: fails `fail_first` probes, then answers; counts
    /// get/walk calls so the tests can assert caching behaviour.
    struct ScriptedEngine {
        fail_first: usize,
        gets: AtomicUsize,
        walks: AtomicUsize,
        walk_result: Vec<(String, String)>,
    }

    impl ScriptedEngine {
        fn new(fail_first: usize, walk_result: Vec<(String, String)>) -> Self {
            Self {
                fail_first,
                gets: AtomicUsize::new(0),
                walks: AtomicUsize::new(0),
                walk_result,
            }
        }
    }

    #[async_trait]
    impl SnmpEngine for ScriptedEngine {
        async fn get(
            &self,
            _target: &SnmpTarget,
            _oids: &[&str],
        ) -> Result<BTreeMap<String, String>, SnmpError> {
            let n = self.gets.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(SnmpError::Timeout("probe timeout".to_string()));
            }
            let mut map = BTreeMap::new();
            map.insert(SYS_OBJECT_ID.to_string(), "1.3.6.1.4.1.9.1.1".to_string());
            Ok(map)
        }

        async fn walk(
            &self,
            _target: &SnmpTarget,
            _oid_prefix: &str,
        ) -> Result<Vec<(String, String)>, SnmpError> {
            self.walks.fetch_add(1, Ordering::SeqCst);
            Ok(self.walk_result.clone())
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

    fn cache_with(engine: Arc<ScriptedEngine>, communities: &[&str]) -> SnmpSessionCache {
        SnmpSessionCache::new(
            engine,
            communities.iter().map(|c| c.to_string()).collect(),
            161,
            Duration::from_secs(5),
            2,
        )
    }

    #[tokio::test]
    async fn community_is_cached_after_first_probe() {
        let engine = Arc::new(ScriptedEngine::new(0, vec![]));
        let cache = cache_with(engine.clone(), &["comm1", "comm2"]);

        let t1 = cache.get_target("10.0.0.1").await.unwrap();
        let t2 = cache.get_target("10.0.0.1").await.unwrap();

        assert_eq!(engine.gets.load(Ordering::SeqCst), 1);
        assert_eq!(t1.community, "comm1");
        assert_eq!(t2.community, "comm1");
    }

    #[tokio::test]
    async fn timeout_falls_through_to_next_community() {
        let engine = Arc::new(ScriptedEngine::new(1, vec![]));
        let cache = cache_with(engine.clone(), &["comm1", "comm2"]);

        let target = cache.get_target("10.0.0.1").await.unwrap();
        assert_eq!(target.community, "comm2");
        assert_eq!(engine.gets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausting_communities_is_a_timeout() {
        let engine = Arc::new(ScriptedEngine::new(usize::MAX, vec![]));
        let cache = cache_with(engine.clone(), &["comm1", "comm2"]);

        let err = cache.get_target("10.0.0.1").await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(engine.gets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ifindex_map_walks_once_and_parses() {
        let engine = Arc::new(ScriptedEngine::new(
            0,
            vec![
                ("1.3.6.1.2.1.31.1.1.1.1.1".to_string(), "GigabitEthernet0/1".to_string()),
                ("1.3.6.1.2.1.31.1.1.1.1.49".to_string(), "GigabitEthernet1/0/1".to_string()),
            ],
        ));
        let cache = cache_with(engine.clone(), &["public"]);

        let m1 = cache.get_ifindex_map("10.0.0.1").await.unwrap();
        let m2 = cache.get_ifindex_map("10.0.0.1").await.unwrap();

        assert_eq!(engine.walks.load(Ordering::SeqCst), 1);
        assert_eq!(m1.get(&1).map(String::as_str), Some("GigabitEthernet0/1"));
        assert_eq!(m1.get(&49).map(String::as_str), Some("GigabitEthernet1/0/1"));
        assert_eq!(m1.len(), m2.len());
    }

    #[tokio::test]
    async fn bridge_port_map_parses_values_as_ifindex() {
        let engine = Arc::new(ScriptedEngine::new(
            0,
            vec![
                ("1.3.6.1.2.1.17.1.4.1.2.1".to_string(), "10001".to_string()),
                ("1.3.6.1.2.1.17.1.4.1.2.48".to_string(), "10048".to_string()),
            ],
        ));
        let cache = cache_with(engine.clone(), &["public"]);

        let map = cache.get_bridge_port_map("10.0.0.1").await.unwrap();
        assert_eq!(map.get(&1), Some(&10001));
        assert_eq!(map.get(&48), Some(&10048));
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let engine = Arc::new(ScriptedEngine::new(0, vec![]));
        let cache = cache_with(engine.clone(), &["public"]);

        cache.get_target("10.0.0.1").await.unwrap();
        cache.get_ifindex_map("10.0.0.1").await.unwrap();
        cache.clear().await;

        cache.get_target("10.0.0.1").await.unwrap();
        // Probe ran again after clear (1 initial + 1 inside ifindex path is
        // cached, so: first probe, then post-clear probe).
        assert_eq!(engine.gets.load(Ordering::SeqCst), 2);
    }
}
