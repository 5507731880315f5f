//! Content fingerprinting for change detection.
//!
//! The fingerprint covers the business-meaningful fields of each parsed
//! item — never parent-entity identity, device hostnames of other rows, or
//! timestamps — in the fixed order `fingerprint_fields()` defines per
//! variant. Identical device state therefore hashes identically across
//! cycles, and persistence is skipped when nothing changed.

use nmv_domain::ParsedRecord;
use sha2::{Digest, Sha256};

/// 16-hex-char digest of a parsed item list.
pub fn content_fingerprint(items: &[ParsedRecord]) -> String {
    let mut canonical = String::new();
    for item in items {
        canonical.push_str(item.kind());
        for (name, value) in item.fingerprint_fields() {
            canonical.push('\x1f');
            canonical.push_str(name);
            canonical.push('=');
            canonical.push_str(&value);
        }
        canonical.push('\n');
    }
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmv_domain::{ClientRecord, Duplex, FanStatus, LinkStatus, MacAddr, VlanId};

    fn client(mac: &str, ip: &str, reachable: Option<bool>) -> ParsedRecord {
        ParsedRecord::Client(ClientRecord {
            mac_address: MacAddr::parse(mac).unwrap(),
            ip_address: Some(ip.to_string()),
            switch_hostname: Some("SW-01".to_string()),
            interface_name: Some("GE1/0/1".to_string()),
            vlan_id: Some(VlanId::new(10).unwrap()),
            speed: Some("1G".to_string()),
            duplex: Some(Duplex::Full),
            link_status: Some(LinkStatus::Up),
            ping_reachable: reachable,
            acl_rules_applied: Some("3001".to_string()),
        })
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let fp = content_fingerprint(&[ParsedRecord::Fan(FanStatus::new("Fan 1/1", "normal"))]);
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_items_same_fingerprint() {
        let a = vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", "normal"))];
        let b = vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", "normal"))];
        assert_eq!(content_fingerprint(&a), content_fingerprint(&b));
    }

    #[test]
    fn behaviour_change_changes_fingerprint() {
        let a = vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", "normal"))];
        let b = vec![ParsedRecord::Fan(FanStatus::new("Fan 1/1", "absent"))];
        assert_ne!(content_fingerprint(&a), content_fingerprint(&b));
    }

    #[test]
    fn client_identity_fields_do_not_affect_fingerprint() {
        let a = vec![client("AA:BB:CC:DD:EE:FF", "10.0.0.1", Some(true))];
        let b = vec![client("11:22:33:44:55:66", "10.0.0.2", Some(true))];
        assert_eq!(content_fingerprint(&a), content_fingerprint(&b));
    }

    #[test]
    fn none_is_distinct_from_concrete_values() {
        let a = vec![client("AA:BB:CC:DD:EE:FF", "10.0.0.1", None)];
        let b = vec![client("AA:BB:CC:DD:EE:FF", "10.0.0.1", Some(true))];
        let c = vec![client("AA:BB:CC:DD:EE:FF", "10.0.0.1", Some(false))];
        assert_ne!(content_fingerprint(&a), content_fingerprint(&b));
        assert_ne!(content_fingerprint(&a), content_fingerprint(&c));
        assert_ne!(content_fingerprint(&b), content_fingerprint(&c));
    }

    #[test]
    fn item_order_matters_but_empty_is_stable() {
        assert_eq!(content_fingerprint(&[]), content_fingerprint(&[]));
    }
}
