use nmv_domain::{DeviceType, ParsedRecord};

/// A stateless parser bound to one `(device_type?, api_name)` key.
///
/// Contract: `parse` never fails. Well-formed vendor output yields typed
/// records; empty, whitespace-only or unrecognisable input yields an empty
/// vec. Parsers must tolerate banner lines, header lookalikes, odd
/// whitespace, and a CSV fallback where the fetcher pre-processed the
/// output. Rows that cannot be normalised (bad MAC, VLAN out of range,
/// missing required neighbor fields) are dropped, never propagated as
/// errors.
pub trait Parser: Send + Sync {
    /// `None` means cross-vendor (e.g. `ping_batch`) and is the registry's
    /// fallback position.
    fn device_type(&self) -> Option<DeviceType>;

    /// Canonical indicator identifier, e.g. `get_fan_hpe_dna`.
    fn api_name(&self) -> &'static str;

    fn parse(&self, raw: &str) -> Vec<ParsedRecord>;
}

impl std::fmt::Debug for dyn Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("device_type", &self.device_type())
            .field("api_name", &self.api_name())
            .finish()
    }
}
