use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AggProtocol, Duplex, LinkStatus, MacAddr, OperationalStatus, VlanId};

// ── Fingerprint rendering ─────────────────────────────────────────────────────

/// Render an optional field for fingerprinting. `None` must stay distinct
/// from every concrete value, including booleans.
fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

fn opt_f64(v: &Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "None".to_string(),
    }
}

// ── Per-indicator payloads ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanStatus {
    pub fan_id: String,
    pub status: OperationalStatus,
    pub speed_rpm: Option<i64>,
    pub speed_percent: Option<i64>,
}

impl FanStatus {
    pub fn new(fan_id: impl Into<String>, status: &str) -> Self {
        Self {
            fan_id: fan_id.into(),
            status: OperationalStatus::parse(status),
            speed_rpm: None,
            speed_percent: None,
        }
    }

    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fan_id", self.fan_id.clone()),
            ("status", self.status.to_string()),
            ("speed_rpm", opt(&self.speed_rpm)),
            ("speed_percent", opt(&self.speed_percent)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerStatus {
    pub ps_id: String,
    pub status: OperationalStatus,
    pub input_status: Option<String>,
    pub output_status: Option<String>,
    pub capacity_watts: Option<f64>,
    pub actual_output_watts: Option<f64>,
}

impl PowerStatus {
    pub fn new(ps_id: impl Into<String>, status: &str) -> Self {
        Self {
            ps_id: ps_id.into(),
            status: OperationalStatus::parse(status),
            input_status: None,
            output_status: None,
            capacity_watts: None,
            actual_output_watts: None,
        }
    }

    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ps_id", self.ps_id.clone()),
            ("status", self.status.to_string()),
            ("input_status", opt(&self.input_status)),
            ("output_status", opt(&self.output_status)),
            ("capacity_watts", opt_f64(&self.capacity_watts)),
            ("actual_output_watts", opt_f64(&self.actual_output_watts)),
        ]
    }
}

/// One optical lane of a transceiver. SFP modules have a single lane;
/// QSFP/QSFP-DD modules report four or eight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransceiverChannel {
    pub channel: u8,
    pub tx_power: Option<f64>,
    pub rx_power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transceiver {
    pub interface_name: String,
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
    pub channels: Vec<TransceiverChannel>,
    pub serial_number: Option<String>,
    pub part_number: Option<String>,
}

impl Transceiver {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("interface_name", self.interface_name.clone()),
            ("temperature", opt_f64(&self.temperature)),
            ("voltage", opt_f64(&self.voltage)),
            ("serial_number", opt(&self.serial_number)),
        ];
        for ch in &self.channels {
            fields.push(("channel", ch.channel.to_string()));
            fields.push(("tx_power", opt_f64(&ch.tx_power)));
            fields.push(("rx_power", opt_f64(&ch.rx_power)));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacTableEntry {
    pub mac_address: MacAddr,
    pub interface_name: String,
    pub vlan_id: VlanId,
}

impl MacTableEntry {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mac_address", self.mac_address.to_string()),
            ("interface_name", self.interface_name.clone()),
            ("vlan_id", self.vlan_id.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub local_interface: String,
    pub remote_hostname: String,
    pub remote_interface: String,
    pub remote_platform: Option<String>,
}

impl Neighbor {
    /// All three key fields are required; callers drop entries that would
    /// violate this rather than constructing partial neighbors.
    pub fn new(
        local_interface: impl Into<String>,
        remote_hostname: impl Into<String>,
        remote_interface: impl Into<String>,
    ) -> Self {
        Self {
            local_interface: local_interface.into(),
            remote_hostname: remote_hostname.into(),
            remote_interface: remote_interface.into(),
            remote_platform: None,
        }
    }

    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("local_interface", self.local_interface.clone()),
            ("remote_hostname", self.remote_hostname.clone()),
            ("remote_interface", self.remote_interface.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChannel {
    pub interface_name: String,
    pub status: LinkStatus,
    pub protocol: AggProtocol,
    pub members: Vec<String>,
    /// Per-member link/selection state, keyed by member interface name.
    pub member_status: BTreeMap<String, LinkStatus>,
}

impl PortChannel {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("interface_name", self.interface_name.clone()),
            ("status", self.status.to_string()),
            ("protocol", self.protocol.to_string()),
            ("members", self.members.join(",")),
        ];
        for (member, status) in &self.member_status {
            fields.push(("member", format!("{member}={status}")));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub interface_name: String,
    pub link_status: LinkStatus,
    pub speed: Option<String>,
    pub duplex: Option<Duplex>,
}

impl InterfaceStatus {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("interface_name", self.interface_name.clone()),
            ("link_status", self.link_status.to_string()),
            ("speed", opt(&self.speed)),
            ("duplex", opt(&self.duplex)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclBinding {
    pub interface_name: String,
    pub acl_number: Option<String>,
}

impl AclBinding {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("interface_name", self.interface_name.clone()),
            ("acl_number", opt(&self.acl_number)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub uptime: Option<String>,
}

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            model: None,
            serial_number: None,
            uptime: None,
        }
    }

    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        // Uptime changes every cycle and must not defeat change detection.
        vec![
            ("version", self.version.clone()),
            ("model", opt(&self.model)),
            ("serial_number", opt(&self.serial_number)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCount {
    pub interface_name: String,
    pub crc_errors: i64,
    pub input_errors: i64,
    pub output_errors: i64,
}

impl ErrorCount {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("interface_name", self.interface_name.clone()),
            ("crc_errors", self.crc_errors.to_string()),
            ("input_errors", self.input_errors.to_string()),
            ("output_errors", self.output_errors.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub target: String,
    pub is_reachable: bool,
    pub success_rate: f64,
    pub avg_rtt_ms: Option<f64>,
}

impl PingResult {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("target", self.target.clone()),
            ("is_reachable", self.is_reachable.to_string()),
            ("success_rate", format!("{:.1}", self.success_rate)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub ip_address: String,
    pub mac_address: MacAddr,
}

impl ArpEntry {
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ip_address", self.ip_address.clone()),
            ("mac_address", self.mac_address.to_string()),
        ]
    }
}

/// A per-client (per-MAC) view joined from MAC table, ARP, interface
/// status, ACL bindings and reachability probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub mac_address: MacAddr,
    pub ip_address: Option<String>,
    pub switch_hostname: Option<String>,
    pub interface_name: Option<String>,
    pub vlan_id: Option<VlanId>,
    pub speed: Option<String>,
    pub duplex: Option<Duplex>,
    pub link_status: Option<LinkStatus>,
    pub ping_reachable: Option<bool>,
    pub acl_rules_applied: Option<String>,
}

impl ClientRecord {
    /// `mac_address` and `ip_address` are the record's identity: a client
    /// with a different MAC or IP is a different record, not a change to
    /// this one, so both stay out of the fingerprint.
    fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("switch_hostname", opt(&self.switch_hostname)),
            ("interface_name", opt(&self.interface_name)),
            ("vlan_id", opt(&self.vlan_id)),
            ("speed", opt(&self.speed)),
            ("duplex", opt(&self.duplex)),
            ("link_status", opt(&self.link_status)),
            ("ping_reachable", opt(&self.ping_reachable)),
            ("acl_rules_applied", opt(&self.acl_rules_applied)),
        ]
    }
}

// ── The closed record sum type ────────────────────────────────────────────────

/// Everything a parser or SNMP collector can produce. One variant per
/// indicator; repositories are generic over the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedRecord {
    Fan(FanStatus),
    Power(PowerStatus),
    Transceiver(Transceiver),
    MacTable(MacTableEntry),
    Neighbor(Neighbor),
    PortChannel(PortChannel),
    InterfaceStatus(InterfaceStatus),
    Acl(AclBinding),
    Version(Version),
    ErrorCount(ErrorCount),
    Ping(PingResult),
    Arp(ArpEntry),
    Client(ClientRecord),
}

impl ParsedRecord {
    /// Short tag used in table names and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedRecord::Fan(_) => "fan",
            ParsedRecord::Power(_) => "power",
            ParsedRecord::Transceiver(_) => "transceiver",
            ParsedRecord::MacTable(_) => "mac_table",
            ParsedRecord::Neighbor(_) => "neighbor",
            ParsedRecord::PortChannel(_) => "port_channel",
            ParsedRecord::InterfaceStatus(_) => "interface_status",
            ParsedRecord::Acl(_) => "acl",
            ParsedRecord::Version(_) => "version",
            ParsedRecord::ErrorCount(_) => "error_count",
            ParsedRecord::Ping(_) => "ping",
            ParsedRecord::Arp(_) => "arp",
            ParsedRecord::Client(_) => "client",
        }
    }

    /// Business fields in canonical order, identity fields excluded.
    /// Never includes parent-entity identity, hostnames of other rows,
    /// or timestamps — the content hash is built from exactly this.
    pub fn fingerprint_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ParsedRecord::Fan(r) => r.fingerprint_fields(),
            ParsedRecord::Power(r) => r.fingerprint_fields(),
            ParsedRecord::Transceiver(r) => r.fingerprint_fields(),
            ParsedRecord::MacTable(r) => r.fingerprint_fields(),
            ParsedRecord::Neighbor(r) => r.fingerprint_fields(),
            ParsedRecord::PortChannel(r) => r.fingerprint_fields(),
            ParsedRecord::InterfaceStatus(r) => r.fingerprint_fields(),
            ParsedRecord::Acl(r) => r.fingerprint_fields(),
            ParsedRecord::Version(r) => r.fingerprint_fields(),
            ParsedRecord::ErrorCount(r) => r.fingerprint_fields(),
            ParsedRecord::Ping(r) => r.fingerprint_fields(),
            ParsedRecord::Arp(r) => r.fingerprint_fields(),
            ParsedRecord::Client(r) => r.fingerprint_fields(),
        }
    }
}
