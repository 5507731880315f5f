use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("VLAN id {0} outside 1-4094")]
    InvalidVlan(u32),

    #[error("unknown device type: {0}")]
    UnknownDeviceType(String),

    #[error("invalid hostname: {0}")]
    InvalidHostname(String),
}
