use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// ── Device classification ─────────────────────────────────────────────────────

/// Vendor/platform of a device under test. Closed set: parsers and SNMP
/// collectors branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Hpe,
    CiscoIos,
    CiscoNxos,
}

impl DeviceType {
    /// The short form used in fetcher URL templates and query params.
    pub fn api_value(&self) -> &'static str {
        match self {
            DeviceType::Hpe => "hpe",
            DeviceType::CiscoIos => "ios",
            DeviceType::CiscoNxos => "nxos",
        }
    }

    /// Lenient parse accepting both the DB spellings ("HPE", "Cisco-IOS",
    /// "Cisco-NXOS") and the api values ("hpe", "ios", "nxos").
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hpe" | "hpe-comware" | "comware" => Ok(DeviceType::Hpe),
            "ios" | "cisco-ios" | "cisco_ios" => Ok(DeviceType::CiscoIos),
            "nxos" | "cisco-nxos" | "cisco_nxos" => Ok(DeviceType::CiscoNxos),
            other => Err(DomainError::UnknownDeviceType(other.to_string())),
        }
    }
}

impl std::str::FromStr for DeviceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::parse(s)
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Hpe => write!(f, "HPE"),
            DeviceType::CiscoIos => write!(f, "Cisco-IOS"),
            DeviceType::CiscoNxos => write!(f, "Cisco-NXOS"),
        }
    }
}

// ── Normalized status enums ───────────────────────────────────────────────────

/// Component health as reported by a device, folded to a fixed vocabulary.
/// Anything a vendor emits outside this set maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    Ok,
    Good,
    Normal,
    Online,
    Active,
    Fail,
    Absent,
    Unknown,
}

impl OperationalStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => OperationalStatus::Ok,
            "good" => OperationalStatus::Good,
            "normal" => OperationalStatus::Normal,
            "online" => OperationalStatus::Online,
            "active" => OperationalStatus::Active,
            "fail" | "failed" | "failure" | "critical" | "fanerror" | "psuerror" => {
                OperationalStatus::Fail
            }
            "absent" | "notpresent" | "not present" => OperationalStatus::Absent,
            _ => OperationalStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalStatus::Ok => "ok",
            OperationalStatus::Good => "good",
            OperationalStatus::Normal => "normal",
            OperationalStatus::Online => "online",
            OperationalStatus::Active => "active",
            OperationalStatus::Fail => "fail",
            OperationalStatus::Absent => "absent",
            OperationalStatus::Unknown => "unknown",
        }
    }

    /// Whether this status counts as healthy for evaluation purposes.
    pub fn is_healthy(&self) -> bool {
        matches!(
            self,
            OperationalStatus::Ok
                | OperationalStatus::Good
                | OperationalStatus::Normal
                | OperationalStatus::Online
                | OperationalStatus::Active
        )
    }
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down,
    Unknown,
}

impl LinkStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "connected" | "selected" => LinkStatus::Up,
            "down" | "notconnect" | "disabled" | "unselected" | "err-disabled" => LinkStatus::Down,
            _ => LinkStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Up => "up",
            LinkStatus::Down => "down",
            LinkStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Full,
    Half,
    Auto,
    Unknown,
}

impl Duplex {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "a-full" | "full-duplex" => Duplex::Full,
            "half" | "a-half" | "half-duplex" => Duplex::Half,
            "auto" => Duplex::Auto,
            _ => Duplex::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Duplex::Full => "full",
            Duplex::Half => "half",
            Duplex::Auto => "auto",
            Duplex::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Duplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Link-aggregation protocol of a port-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggProtocol {
    Lacp,
    Static,
    Pagp,
    None,
}

impl AggProtocol {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "lacp" | "d" | "dynamic" => AggProtocol::Lacp,
            "static" | "s" | "on" => AggProtocol::Static,
            "pagp" => AggProtocol::Pagp,
            _ => AggProtocol::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggProtocol::Lacp => "lacp",
            AggProtocol::Static => "static",
            AggProtocol::Pagp => "pagp",
            AggProtocol::None => "none",
        }
    }
}

impl std::fmt::Display for AggProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── VLAN id ───────────────────────────────────────────────────────────────────

/// A VLAN id in the valid 802.1Q range 1-4094.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    pub fn new(id: u32) -> Result<Self, DomainError> {
        if (1..=4094).contains(&id) {
            Ok(VlanId(id as u16))
        } else {
            Err(DomainError::InvalidVlan(id))
        }
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for VlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── MAC address ───────────────────────────────────────────────────────────────

/// A MAC address in canonical `AA:BB:CC:DD:EE:FF` form.
///
/// The constructor accepts every vendor rendering seen on the wire:
/// HPE `aabb-ccdd-eeff`, Cisco `aabb.ccdd.eeff`, per-octet colon or hyphen
/// separators, and bare 12-digit hex. Parsing is idempotent on the
/// canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddr(String);

impl MacAddr {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let hex: String = s
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.' | ' '))
            .collect();
        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidMac(s.to_string()));
        }
        let upper = hex.to_ascii_uppercase();
        let canonical = upper
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":");
        Ok(MacAddr(canonical))
    }

    /// Build from six raw octets (SNMP FDB index form).
    pub fn from_octets(octets: [u8; 6]) -> Self {
        MacAddr(
            octets
                .iter()
                .map(|o| format!("{o:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Switch value object ───────────────────────────────────────────────────────

/// Device info passed between services. Not a persistence row — the store
/// has its own `Switch` entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchInfo {
    pub hostname: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub site: Option<String>,
    pub tenant_group: Option<String>,
}

impl SwitchInfo {
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            hostname: hostname.into(),
            ip_address: ip.into(),
            device_type,
            site: None,
            tenant_group: None,
        }
    }
}
