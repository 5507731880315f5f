//! Production SNMPv2c engine over UDP.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use crate::codec::{
    decode_message, encode_message, Oid, Pdu, SnmpValue, TAG_RESPONSE,
};
use crate::engine::{SnmpEngine, SnmpEngineConfig, SnmpTarget};
use crate::error::SnmpError;

const MAX_DATAGRAM: usize = 65_535;

/// SNMPv2c over `tokio::net::UdpSocket`. One ephemeral socket per request;
/// responses are matched on request-id, and stray datagrams are ignored
/// until the per-request deadline.
pub struct UdpSnmpEngine {
    config: SnmpEngineConfig,
    request_id: AtomicI64,
}

impl UdpSnmpEngine {
    pub fn new(config: SnmpEngineConfig) -> Self {
        Self {
            config,
            request_id: AtomicI64::new(1),
        }
    }

    fn next_request_id(&self) -> i64 {
        // Wrap within the positive i32 range the PDU field allows.
        self.request_id.fetch_add(1, Ordering::Relaxed) % (i32::MAX as i64)
    }

    /// Send one PDU and await the matching response, honouring the
    /// target's per-request timeout and retry count.
    async fn request(&self, target: &SnmpTarget, pdu: &Pdu) -> Result<Pdu, SnmpError> {
        let bytes = encode_message(&target.community, pdu)?;
        let addr = format!("{}:{}", target.ip, target.port);

        let mut last_timeout = String::new();
        for _attempt in 0..=target.retries {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            socket.connect(&addr).await?;
            socket.send(&bytes).await?;

            let mut buf = vec![0u8; MAX_DATAGRAM];
            let deadline = tokio::time::Instant::now() + target.timeout;
            loop {
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    break;
                }
                match timeout(deadline - now, socket.recv(&mut buf)).await {
                    Ok(Ok(n)) => {
                        let Ok(message) = decode_message(&buf[..n]) else {
                            continue; // not ours, keep listening
                        };
                        if message.pdu.tag != TAG_RESPONSE
                            || message.pdu.request_id != pdu.request_id
                        {
                            continue;
                        }
                        if message.pdu.error_status != 0 {
                            return Err(SnmpError::ErrorStatus {
                                status: message.pdu.error_status,
                                index: message.pdu.error_index,
                            });
                        }
                        return Ok(message.pdu);
                    }
                    Ok(Err(e)) => return Err(SnmpError::Io(e)),
                    Err(_) => break,
                }
            }
            last_timeout = format!("{addr} after {:?}", target.timeout);
        }
        Err(SnmpError::Timeout(format!("no response from {last_timeout}")))
    }

    async fn walk_impl(
        &self,
        target: &SnmpTarget,
        prefix: &Oid,
    ) -> Result<Vec<(String, String)>, SnmpError> {
        let mut results = Vec::new();
        let mut current = prefix.clone();

        loop {
            let pdu = Pdu::get_bulk_request(
                self.next_request_id(),
                vec![current.clone()],
                0,
                self.config.max_repetitions,
            );
            let response = self.request(target, &pdu).await?;
            if response.varbinds.is_empty() {
                break;
            }

            let mut out_of_scope = false;
            for (oid, value) in response.varbinds {
                if value == SnmpValue::EndOfMibView || !oid.starts_with(prefix) {
                    out_of_scope = true;
                    break;
                }
                if value.is_exception() {
                    out_of_scope = true;
                    break;
                }
                results.push((oid.to_string(), value.render()));
                current = oid;
            }
            if out_of_scope {
                break;
            }
        }

        debug!(prefix = %prefix, count = results.len(), ip = %target.ip, "walk complete");
        Ok(results)
    }
}

#[async_trait]
impl SnmpEngine for UdpSnmpEngine {
    async fn get(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
    ) -> Result<BTreeMap<String, String>, SnmpError> {
        let parsed: Result<Vec<Oid>, _> = oids.iter().map(|o| Oid::parse(o)).collect();
        let pdu = Pdu::get_request(self.next_request_id(), parsed?);
        let response = self.request(target, &pdu).await?;

        let mut result = BTreeMap::new();
        for (oid, value) in response.varbinds {
            if value.is_exception() {
                continue; // caller handles missing data
            }
            result.insert(oid.to_string(), value.render());
        }
        Ok(result)
    }

    async fn walk(
        &self,
        target: &SnmpTarget,
        oid_prefix: &str,
    ) -> Result<Vec<(String, String)>, SnmpError> {
        let prefix = Oid::parse(oid_prefix)?;
        match timeout(self.config.walk_timeout, self.walk_impl(target, &prefix)).await {
            Ok(result) => result,
            Err(_) => Err(SnmpError::Timeout(format!(
                "walk of {oid_prefix} on {} exceeded {:?}",
                target.ip, self.config.walk_timeout
            ))),
        }
    }

    async fn get_bulk(
        &self,
        target: &SnmpTarget,
        oids: &[&str],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Vec<(String, SnmpValue)>, SnmpError> {
        let parsed: Result<Vec<Oid>, _> = oids.iter().map(|o| Oid::parse(o)).collect();
        let pdu = Pdu::get_bulk_request(self.next_request_id(), parsed?, non_repeaters, max_repetitions);
        let response = self.request(target, &pdu).await?;
        Ok(response
            .varbinds
            .into_iter()
            .map(|(oid, value)| (oid.to_string(), value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Minimal in-process agent: answers GETs for sysObjectID and serves a
    /// two-entry ifName subtree over GETBULK.
    async fn spawn_agent() -> std::net::SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(message) = decode_message(&buf[..n]) else {
                    continue;
                };
                let subtree = [
                    (
                        Oid::parse("1.3.6.1.2.1.31.1.1.1.1.1").unwrap(),
                        SnmpValue::OctetString(b"GE1/0/1".to_vec()),
                    ),
                    (
                        Oid::parse("1.3.6.1.2.1.31.1.1.1.1.2").unwrap(),
                        SnmpValue::OctetString(b"GE1/0/2".to_vec()),
                    ),
                    (
                        Oid::parse("1.3.6.1.2.1.31.1.1.1.15.1").unwrap(),
                        SnmpValue::Integer(1000),
                    ),
                ];

                let varbinds: Vec<(Oid, SnmpValue)> = match message.pdu.tag {
                    crate::codec::TAG_GET_REQUEST => message
                        .pdu
                        .varbinds
                        .iter()
                        .map(|(oid, _)| {
                            if oid.to_string() == "1.3.6.1.2.1.1.2.0" {
                                (
                                    oid.clone(),
                                    SnmpValue::Oid(Oid::parse("1.3.6.1.4.1.25506.11.1.136").unwrap()),
                                )
                            } else {
                                (oid.clone(), SnmpValue::NoSuchObject)
                            }
                        })
                        .collect(),
                    crate::codec::TAG_GET_BULK_REQUEST => {
                        let start = &message.pdu.varbinds[0].0;
                        subtree
                            .iter()
                            .filter(|(oid, _)| oid > start)
                            .take(message.pdu.error_index as usize)
                            .map(|(oid, value)| (oid.clone(), value.clone()))
                            .collect()
                    }
                    _ => vec![],
                };

                let response = Pdu {
                    tag: TAG_RESPONSE,
                    request_id: message.pdu.request_id,
                    error_status: 0,
                    error_index: 0,
                    varbinds,
                };
                let bytes = encode_message(&message.community, &response).unwrap();
                let _ = socket.send_to(&bytes, peer).await;
            }
        });
        addr
    }

    fn target_for(addr: std::net::SocketAddr) -> SnmpTarget {
        SnmpTarget {
            ip: addr.ip().to_string(),
            community: "public".to_string(),
            port: addr.port(),
            timeout: Duration::from_millis(500),
            retries: 0,
        }
    }

    #[tokio::test]
    async fn get_filters_exception_values() {
        let addr = spawn_agent().await;
        let engine = UdpSnmpEngine::new(SnmpEngineConfig::default());
        let target = target_for(addr);

        let result = engine
            .get(&target, &["1.3.6.1.2.1.1.2.0", "1.3.6.1.2.1.1.99.0"])
            .await
            .unwrap();
        assert_eq!(
            result.get("1.3.6.1.2.1.1.2.0").map(String::as_str),
            Some("1.3.6.1.4.1.25506.11.1.136")
        );
        // noSuchObject never reaches the caller
        assert!(!result.contains_key("1.3.6.1.2.1.1.99.0"));
    }

    #[tokio::test]
    async fn walk_stays_inside_subtree() {
        let addr = spawn_agent().await;
        let engine = UdpSnmpEngine::new(SnmpEngineConfig::default());
        let target = target_for(addr);

        let results = engine.walk(&target, "1.3.6.1.2.1.31.1.1.1.1").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, "GE1/0/1");
        assert_eq!(results[1].1, "GE1/0/2");
        // The ifHighSpeed row (…1.15.1) must not leak into the ifName walk.
        assert!(results.iter().all(|(oid, _)| oid.starts_with("1.3.6.1.2.1.31.1.1.1.1.")));
    }

    #[tokio::test]
    async fn silent_target_times_out() {
        // An agent that receives and never answers.
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                if socket.recv_from(&mut buf).await.is_err() {
                    return;
                }
            }
        });

        let engine = UdpSnmpEngine::new(SnmpEngineConfig::default());
        let target = SnmpTarget {
            ip: addr.ip().to_string(),
            community: "public".to_string(),
            port: addr.port(),
            timeout: Duration::from_millis(100),
            retries: 1,
        };
        let err = engine.get(&target, &["1.3.6.1.2.1.1.2.0"]).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }
}
