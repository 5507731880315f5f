//! Firmware version via SNMPv2-MIB::sysDescr.0 plus per-vendor regex
//! extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use nmv_domain::{DeviceType, ParsedRecord, Version};

use crate::collectors::base::{format_raw, SnmpCollector};
use crate::engine::{SnmpEngine, SnmpTarget};
use crate::error::SnmpError;
use crate::oids::SYS_DESCR;
use crate::session_cache::SnmpSessionCache;

// "Version 7.1.070, Release 6728P06"
static HPE_VERSION_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"Version\s+(\S+),\s*Release\s+(\S+)").unwrap());

pub struct VersionCollector;

/// Extract the version token from a sysDescr string.
fn parse_version(sys_descr: &str, device_type: DeviceType) -> String {
    match device_type {
        DeviceType::Hpe => {
            if let Some(caps) = HPE_VERSION_RE.captures(sys_descr) {
                return format!("{} {}", &caps[1], &caps[2]);
            }
            if let Some(version) = after_keyword(sys_descr, "Software Version") {
                return version;
            }
        }
        DeviceType::CiscoIos | DeviceType::CiscoNxos => {
            if let Some(version) = after_keyword(sys_descr, "Version") {
                return version.trim_end_matches(',').to_string();
            }
        }
    }
    sys_descr.trim().to_string()
}

/// First whitespace-delimited token following `keyword`.
fn after_keyword(text: &str, keyword: &str) -> Option<String> {
    let pos = text.find(keyword)?;
    let rest = &text[pos + keyword.len()..];
    rest.split_whitespace()
        .next()
        .map(|t| t.trim_end_matches(',').to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl SnmpCollector for VersionCollector {
    fn api_name(&self) -> &'static str {
        "get_version"
    }

    async fn collect(
        &self,
        target: &SnmpTarget,
        device_type: DeviceType,
        _cache: &SnmpSessionCache,
        engine: &dyn SnmpEngine,
    ) -> Result<(String, Vec<ParsedRecord>), SnmpError> {
        let result = engine.get(target, &[SYS_DESCR]).await?;
        let sys_descr = result.get(SYS_DESCR).cloned().unwrap_or_default();

        let varbinds = vec![(SYS_DESCR.to_string(), sys_descr.clone())];
        let raw = format_raw(self.api_name(), &target.ip, device_type, &varbinds);

        if sys_descr.is_empty() {
            return Ok((raw, vec![]));
        }
        let version = parse_version(&sys_descr, device_type);
        Ok((raw, vec![ParsedRecord::Version(Version::new(version))]))
    }
}
