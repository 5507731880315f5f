use serde::Serialize;

/// Aggregate result of one collection cycle. Invariant:
/// `total == success + failed`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CycleReport {
    pub api_name: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<DeviceFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceFailure {
    pub switch: String,
    pub error: String,
}

impl CycleReport {
    pub fn new(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            ..Default::default()
        }
    }
}
