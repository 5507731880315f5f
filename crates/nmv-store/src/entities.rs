use chrono::{DateTime, Utc};
use nmv_domain::DeviceType;
use serde::{Deserialize, Serialize};

pub type BatchId = i64;

// ── Switch ────────────────────────────────────────────────────────────────────

/// A device known to the system. Owned by the configuration layer; the
/// core only reads it. Soft-deleted via `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub hostname: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub site: Option<String>,
    pub tenant_group: Option<String>,
    pub is_active: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
}

// ── Maintenance device list ───────────────────────────────────────────────────

/// One OLD→NEW binding inside a maintenance window. Collection cycles
/// iterate these rows; entries without a NEW hostname/IP never enter the
/// fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceDevice {
    pub maintenance_id: String,
    pub old_hostname: Option<String>,
    pub old_ip_address: Option<String>,
    pub old_device_type: Option<DeviceType>,
    pub new_hostname: Option<String>,
    pub new_ip_address: Option<String>,
    pub new_device_type: Option<DeviceType>,
    pub use_same_port: bool,
    pub is_reachable: bool,
}

impl MaintenanceDevice {
    /// The NEW side as a collection target, when both fields are present.
    pub fn target(&self) -> Option<(String, String)> {
        match (&self.new_hostname, &self.new_ip_address) {
            (Some(hostname), Some(ip)) => Some((hostname.clone(), ip.clone())),
            _ => None,
        }
    }
}

// ── Collection batches ────────────────────────────────────────────────────────

/// Immutable snapshot anchor. For a given (api_name, switch_hostname,
/// maintenance_id) the batches form a time-ordered sequence and the latest
/// `content_hash` is the device's current state fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionBatch {
    pub id: BatchId,
    pub api_name: String,
    pub switch_hostname: String,
    pub maintenance_id: String,
    pub collected_at: DateTime<Utc>,
    pub raw_data: String,
    /// 16-hex-char fingerprint of the parsed item list.
    pub content_hash: String,
}

// ── Collection errors ─────────────────────────────────────────────────────────

/// Per-device, per-indicator error record, unique on
/// (maintenance_id, api_name, switch_hostname). Upserted on failure,
/// deleted on success — its presence is the UI's health signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionError {
    pub maintenance_id: String,
    pub api_name: String,
    pub switch_hostname: String,
    pub error_message: String,
    pub occurred_at: DateTime<Utc>,
}

// ── Expectations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub local_interface: String,
    pub expected_neighbor: String,
    pub expected_interface: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub expected_versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortChannelExpectation {
    pub maintenance_id: String,
    pub hostname: String,
    pub interface_name: String,
    pub expected_members: Vec<String>,
}

/// Priority-ordered ARP collection point for client discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArpSource {
    pub maintenance_id: String,
    pub hostname: String,
    pub ip_address: String,
    pub priority: i32,
}
