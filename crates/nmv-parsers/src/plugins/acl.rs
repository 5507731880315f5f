//! ACL binding parsers — static bindings from running configuration and
//! dynamic bindings from authentication-session style tables. All six
//! share the `Interface,ACL` CSV fallback (empty ACL column = no binding).

use std::sync::LazyLock;

use nmv_domain::{AclBinding, DeviceType, ParsedRecord};
use regex::Regex;

use crate::csvutil;
use crate::parser::Parser;

fn csv_bindings(raw: &str) -> Vec<ParsedRecord> {
    let mut results = Vec::new();
    for row in csvutil::csv_rows(raw) {
        let interface = csvutil::col(&row, "Interface");
        if interface.is_empty() {
            continue;
        }
        let acl = csvutil::col(&row, "ACL");
        results.push(ParsedRecord::Acl(AclBinding {
            interface_name: interface.to_string(),
            acl_number: if acl.is_empty() || acl == "--" {
                None
            } else {
                Some(acl.to_string())
            },
        }));
    }
    results
}

/// Parse `interface <name> / <binding line>` blocks from running config.
fn config_bindings(raw: &str, intf_re: &Regex, binding_re: &Regex) -> Vec<ParsedRecord> {
    let matches: Vec<_> = intf_re.captures_iter(raw).collect();
    let mut results = Vec::new();
    for (i, caps) in matches.iter().enumerate() {
        let interface = caps[1].to_string();
        let start = caps.get(0).unwrap().end();
        let end = matches
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let block = &raw[start..end];
        let acl = binding_re
            .captures(block)
            .map(|c| c[1].to_string());
        results.push(ParsedRecord::Acl(AclBinding {
            interface_name: interface,
            acl_number: acl,
        }));
    }
    results
}

// ── Static ACL (running config) ───────────────────────────────────────────────

static IOS_INTF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^interface\s+(\S+)").unwrap());
static IOS_ACCESS_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s+ip\s+access-group\s+(\S+)").unwrap());
static NXOS_ACCESS_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s+ip(?:\s+port)?\s+access-group\s+(\S+)").unwrap()
});
static HPE_INTF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^interface\s+(\S+)").unwrap());
static HPE_PACKET_FILTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s+packet-filter\s+(?:name\s+)?(\S+)").unwrap());

/// Cisco IOS `show running-config` interface ACL bindings:
///
/// ```text
/// interface GigabitEthernet1/0/1
///  ip access-group 101 in
/// interface GigabitEthernet1/0/3
/// ```
pub struct IosStaticAclParser;

impl Parser for IosStaticAclParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_static_acl_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if IOS_INTF_RE.is_match(raw) {
            return config_bindings(raw, &IOS_INTF_RE, &IOS_ACCESS_GROUP_RE);
        }
        if raw.contains(',') {
            return csv_bindings(raw);
        }
        Vec::new()
    }
}

/// Cisco NX-OS running-config bindings (`ip access-group` and the
/// port-ACL `ip port access-group` spelling).
pub struct NxosStaticAclParser;

impl Parser for NxosStaticAclParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_static_acl_nxos_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if IOS_INTF_RE.is_match(raw) {
            return config_bindings(raw, &IOS_INTF_RE, &NXOS_ACCESS_GROUP_RE);
        }
        if raw.contains(',') {
            return csv_bindings(raw);
        }
        Vec::new()
    }
}

/// HPE Comware `display current-configuration` packet-filter bindings:
///
/// ```text
/// interface GigabitEthernet1/0/1
///  packet-filter 3001 inbound
/// ```
pub struct HpeStaticAclParser;

impl Parser for HpeStaticAclParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_static_acl_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if HPE_INTF_RE.is_match(raw) {
            return config_bindings(raw, &HPE_INTF_RE, &HPE_PACKET_FILTER_RE);
        }
        if raw.contains(',') {
            return csv_bindings(raw);
        }
        Vec::new()
    }
}

// ── Dynamic ACL (auth-session tables) ─────────────────────────────────────────

static DYNAMIC_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Gi1/0/1  0050.5687.1234  101  Authorized" — MAC in any vendor form.
    Regex::new(
        r"(?m)^\s*(?P<intf>\S+)\s+(?:[0-9a-fA-F]{4}[.\-][0-9a-fA-F]{4}[.\-][0-9a-fA-F]{4}|(?:[0-9a-fA-F]{2}[:\-]){5}[0-9a-fA-F]{2})\s+(?P<acl>\S+)\s+\S+\s*$",
    )
    .unwrap()
});

fn dynamic_bindings(raw: &str) -> Vec<ParsedRecord> {
    if csvutil::looks_like_csv(raw, "Interface") {
        return csv_bindings(raw);
    }
    let mut results = Vec::new();
    for caps in DYNAMIC_ROW_RE.captures_iter(raw) {
        let interface = caps["intf"].to_string();
        if interface.eq_ignore_ascii_case("interface") || interface.starts_with('-') {
            continue;
        }
        let acl = &caps["acl"];
        results.push(ParsedRecord::Acl(AclBinding {
            interface_name: interface,
            acl_number: if acl == "--" || acl == "-" {
                None
            } else {
                Some(acl.to_string())
            },
        }));
    }
    results
}

macro_rules! dynamic_acl_parser {
    ($name:ident, $device:expr, $api:literal) => {
        pub struct $name;

        impl Parser for $name {
            fn device_type(&self) -> Option<DeviceType> {
                Some($device)
            }

            fn api_name(&self) -> &'static str {
                $api
            }

            fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
                if raw.trim().is_empty() {
                    return Vec::new();
                }
                dynamic_bindings(raw)
            }
        }
    };
}

dynamic_acl_parser!(HpeDynamicAclParser, DeviceType::Hpe, "get_dynamic_acl_hpe_fna");
dynamic_acl_parser!(IosDynamicAclParser, DeviceType::CiscoIos, "get_dynamic_acl_ios_fna");
dynamic_acl_parser!(NxosDynamicAclParser, DeviceType::CiscoNxos, "get_dynamic_acl_nxos_fna");

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(records: Vec<ParsedRecord>) -> Vec<AclBinding> {
        records
            .into_iter()
            .map(|r| match r {
                ParsedRecord::Acl(b) => b,
                other => panic!("expected acl record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn ios_running_config() {
        let raw = "interface GigabitEthernet1/0/1\n\
                   \x20ip access-group 101 in\n\
                   interface GigabitEthernet1/0/2\n\
                   \x20ip access-group 102 in\n\
                   interface GigabitEthernet1/0/3\n";
        let bindings = bindings(IosStaticAclParser.parse(raw));
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].acl_number.as_deref(), Some("101"));
        assert_eq!(bindings[2].acl_number, None);
    }

    #[test]
    fn hpe_packet_filter() {
        let raw = "interface GigabitEthernet1/0/1\n\
                   \x20packet-filter 3001 inbound\n\
                   interface GigabitEthernet1/0/2\n";
        let bindings = bindings(HpeStaticAclParser.parse(raw));
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].acl_number.as_deref(), Some("3001"));
    }

    #[test]
    fn nxos_port_access_group() {
        let raw = "interface Ethernet1/1\n\
                   \x20ip port access-group CLIENT-ACL in\n";
        let bindings = bindings(NxosStaticAclParser.parse(raw));
        assert_eq!(bindings[0].acl_number.as_deref(), Some("CLIENT-ACL"));
    }

    #[test]
    fn dynamic_table_with_mac() {
        let raw = "Interface         MAC Address        ACL         Status\n\
                   Gi1/0/1           0050.5687.1234     101         Authorized\n\
                   Gi1/0/2           0050.5687.5678     --          Unauthorized\n";
        let bindings = bindings(IosDynamicAclParser.parse(raw));
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].acl_number.as_deref(), Some("101"));
        assert_eq!(bindings[1].acl_number, None);
    }

    #[test]
    fn csv_fallback_with_empty_acl() {
        let raw = "Interface,ACL\nGE1/0/1,3001\nGE1/0/2,\n";
        for parser in [
            &HpeStaticAclParser as &dyn Parser,
            &IosStaticAclParser,
            &NxosStaticAclParser,
            &HpeDynamicAclParser,
            &IosDynamicAclParser,
            &NxosDynamicAclParser,
        ] {
            let bindings = bindings(parser.parse(raw));
            assert_eq!(bindings.len(), 2);
            assert_eq!(bindings[0].acl_number.as_deref(), Some("3001"));
            assert_eq!(bindings[1].acl_number, None);
        }
    }

    #[test]
    fn empty_input() {
        assert!(IosStaticAclParser.parse("").is_empty());
        assert!(HpeDynamicAclParser.parse("  \n").is_empty());
    }
}
