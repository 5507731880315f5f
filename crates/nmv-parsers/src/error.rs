use nmv_domain::DeviceType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry is frozen after startup, so a second registration for
    /// one key can only be a wiring mistake. Startup fails loudly instead
    /// of silently keeping the last one.
    #[error("duplicate parser registration for ({device_type:?}, {api_name})")]
    DuplicateParser {
        device_type: Option<DeviceType>,
        api_name: String,
    },

    #[error("no parser found for api_name='{api_name}' device_type={device_type:?}; available: [{available}]")]
    NoParser {
        device_type: Option<DeviceType>,
        api_name: String,
        available: String,
    },
}
