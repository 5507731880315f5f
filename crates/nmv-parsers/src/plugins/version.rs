//! Firmware version parsers.
//!
//! Contract detail worth stating: when no version pattern matches, these
//! return an empty list, never a record with an empty version.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, ParsedRecord, Version};
use regex::Regex;

use crate::parser::Parser;

// ── HPE ───────────────────────────────────────────────────────────────────────

static COMWARE_VERSION_RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Version\s+(?P<version>\S+),\s*Release\s+(?P<release>\S+)").unwrap()
});
static SOFTWARE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Software\s+Version:\s*(?P<version>\S+)").unwrap());
static PLAIN_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Version\s+(?P<version>\S+)").unwrap());

/// HPE Comware `display version`:
///
/// ```text
/// Comware Software, Version 7.1.070, Release 6635P07
/// ```
///
/// ArubaOS-CX style `Software Version: WC.16.11.0012` is also accepted.
pub struct HpeVersionParser;

impl Parser for HpeVersionParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_version_hpe_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        if let Some(caps) = SOFTWARE_VERSION_RE.captures(raw) {
            return vec![ParsedRecord::Version(Version::new(&caps["version"]))];
        }
        if let Some(caps) = COMWARE_VERSION_RELEASE_RE.captures(raw) {
            return vec![ParsedRecord::Version(Version::new(format!(
                "{} Release {}",
                &caps["version"], &caps["release"]
            )))];
        }
        if let Some(caps) = PLAIN_VERSION_RE.captures(raw) {
            return vec![ParsedRecord::Version(Version::new(
                caps["version"].trim_end_matches(','),
            ))];
        }
        Vec::new()
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

/// Cisco IOS/IOS-XE `show version` — first `Version X` occurrence wins.
pub struct IosVersionParser;

impl Parser for IosVersionParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_version_ios_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match PLAIN_VERSION_RE.captures(raw) {
            Some(caps) => vec![ParsedRecord::Version(Version::new(
                caps["version"].trim_end_matches(','),
            ))],
            None => Vec::new(),
        }
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NXOS:\s*version\s+(?P<version>\S+)").unwrap());
static NXOS_SYSTEM_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:system|NXOS|Software)\s*:\s*version\s+(?P<version>\S+)").unwrap()
});

/// Cisco NX-OS `show version` — `NXOS: version 9.3(8)` and the older
/// `system: version …` spelling.
pub struct NxosVersionParser;

impl Parser for NxosVersionParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_version_nxos_dna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if let Some(caps) = NXOS_VERSION_RE.captures(raw) {
            return vec![ParsedRecord::Version(Version::new(&caps["version"]))];
        }
        if let Some(caps) = NXOS_SYSTEM_VERSION_RE.captures(raw) {
            return vec![ParsedRecord::Version(Version::new(&caps["version"]))];
        }
        Vec::new()
    }
}
