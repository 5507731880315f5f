use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnmpError {
    /// Transport timed out (single request or whole-walk deadline). This is
    /// the variant retry policy keys on.
    #[error("SNMP timeout: {0}")]
    Timeout(String),

    #[error("SNMP encode/decode error: {0}")]
    Codec(String),

    /// Agent returned a non-zero error-status in the response PDU.
    #[error("SNMP error status {status} at index {index}")]
    ErrorStatus { status: i64, index: i64 },

    #[error("SNMP transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnmpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SnmpError::Timeout(_))
    }
}
