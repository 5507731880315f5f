//! Transceiver DOM parsers. Multi-lane optics (QSFP/QSFP-DD) must produce
//! one channel record per lane; collapsing lanes loses exactly the signal
//! the evaluator needs.

use std::sync::LazyLock;

use nmv_domain::{DeviceType, ParsedRecord, Transceiver, TransceiverChannel};
use regex::Regex;

use crate::parser::Parser;

fn split_blocks<'a>(raw: &'a str, header: &Regex) -> Vec<(String, &'a str)> {
    let matches: Vec<_> = header.captures_iter(raw).collect();
    matches
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let name = caps["interface"].to_string();
            let start = caps.get(0).unwrap().start();
            let end = matches
                .get(i + 1)
                .and_then(|c| c.get(0))
                .map(|m| m.start())
                .unwrap_or(raw.len());
            (name, &raw[start..end])
        })
        .collect()
}

// ── HPE ───────────────────────────────────────────────────────────────────────

static HPE_INTF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(?P<interface>(?:GigabitEthernet|Ten-GigabitEthernet|FortyGigE|HundredGigE|FourHundredGigE|Twenty-FiveGigE)\S+)\s+transceiver")
        .unwrap()
});
static HPE_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Temp\.?\((?:°?C|°)\)\s+Voltage\(V\)\s*\n\s*(?P<temp>-?\d+(?:\.\d+)?)\s+(?P<voltage>\d+\.\d+)")
        .unwrap()
});
static HPE_CHANNEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?P<channel>\d+)\s+(?P<bias>\d+\.\d+)\s+(?P<rx>-?\d+\.\d+)\s+(?P<tx>-?\d+\.\d+)")
        .unwrap()
});

/// HPE Comware `display transceiver diagnosis interface`:
///
/// ```text
/// FortyGigE1/0/25 transceiver diagnostic information:
/// Current diagnostic parameters:
///   Temp(°C)  Voltage(V)
///   34        3.29
///   Channel   Bias(mA)  RX power(dBm)  TX power(dBm)
///   1         6.50      -2.10          -1.50
///   2         6.48      -2.30          -1.55
/// ```
pub struct HpeTransceiverParser;

impl Parser for HpeTransceiverParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::Hpe)
    }

    fn api_name(&self) -> &'static str {
        "get_gbic_details_hpe_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for (interface, block) in split_blocks(raw, &HPE_INTF_RE) {
            let lower = block.to_ascii_lowercase();
            if lower.contains("absent") || lower.contains("does not support") {
                continue;
            }
            let Some(module) = HPE_MODULE_RE.captures(block) else {
                continue;
            };
            let mut channels = Vec::new();
            for caps in HPE_CHANNEL_RE.captures_iter(block) {
                let Ok(channel) = caps["channel"].parse::<u8>() else {
                    continue;
                };
                if !(1..=8).contains(&channel) {
                    continue;
                }
                let tx: Option<f64> = caps["tx"].parse().ok();
                let rx: Option<f64> = caps["rx"].parse().ok();
                // Values outside DOM range indicate a parse misfire, not data.
                let in_range = |v: &Option<f64>| v.map_or(true, |v| (-40.0..=10.0).contains(&v));
                if !in_range(&tx) || !in_range(&rx) {
                    continue;
                }
                channels.push(TransceiverChannel {
                    channel,
                    tx_power: tx,
                    rx_power: rx,
                });
            }
            if channels.is_empty() {
                continue;
            }
            results.push(ParsedRecord::Transceiver(Transceiver {
                interface_name: interface,
                temperature: module["temp"].parse().ok(),
                voltage: module["voltage"].parse().ok(),
                channels,
                serial_number: None,
                part_number: None,
            }));
        }
        results
    }
}

// ── Cisco IOS ─────────────────────────────────────────────────────────────────

static IOS_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    // show interfaces transceiver:
    // "Gi1/1/1   31.5   3.28   6.1   -2.2   -3.0"
    Regex::new(r"(?m)^\s*(?P<interface>(?:Gi|Te|Tw|Fo|Hu)\S+)\s+(?P<temp>-?\d+\.\d+)\s+(?P<voltage>\d+\.\d+)\s+(?P<bias>-?\d+\.\d+)\s+(?P<tx>-?\d+\.\d+)\s+(?P<rx>-?\d+\.\d+)\s*$")
        .unwrap()
});

/// Cisco IOS `show interfaces transceiver` summary table. IOS reports one
/// lane per row; multi-lane optics appear as separate rows suffixed with
/// the lane number, which we fold into channels on the same interface.
pub struct IosTransceiverParser;

impl Parser for IosTransceiverParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoIos)
    }

    fn api_name(&self) -> &'static str {
        "get_gbic_details_ios_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results: Vec<Transceiver> = Vec::new();
        if raw.trim().is_empty() {
            return Vec::new();
        }

        for caps in IOS_ROW_RE.captures_iter(raw) {
            let full = caps["interface"].to_string();
            // Lane rows render as "Te1/1/1/1" — last path element beyond the
            // physical port triple is the lane.
            let (interface, lane) = match full.rsplit_once('/') {
                Some((head, tail))
                    if head.matches('/').count() >= 2 && tail.len() == 1 =>
                {
                    (head.to_string(), tail.parse::<u8>().unwrap_or(1))
                }
                _ => (full.clone(), 1),
            };

            let channel = TransceiverChannel {
                channel: lane,
                tx_power: caps["tx"].parse().ok(),
                rx_power: caps["rx"].parse().ok(),
            };

            if let Some(existing) = results.iter_mut().find(|t| t.interface_name == interface) {
                existing.channels.push(channel);
            } else {
                results.push(Transceiver {
                    interface_name: interface,
                    temperature: caps["temp"].parse().ok(),
                    voltage: caps["voltage"].parse().ok(),
                    channels: vec![channel],
                    serial_number: None,
                    part_number: None,
                });
            }
        }
        results.into_iter().map(ParsedRecord::Transceiver).collect()
    }
}

// ── Cisco NX-OS ───────────────────────────────────────────────────────────────

static NXOS_INTF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<interface>(?:Ethernet|mgmt)\S*)\s*$").unwrap());
static NXOS_SFP_TEMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Temperature\s+(?P<val>-?\d+(?:\.\d+)?)\s*C").unwrap());
static NXOS_SFP_VOLT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Voltage\s+(?P<val>\d+(?:\.\d+)?)\s*V").unwrap());
static NXOS_SFP_TX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Tx\s*Power\s+(?P<val>-?\d+(?:\.\d+)?)\s*dBm").unwrap());
static NXOS_SFP_RX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Rx\s*Power\s+(?P<val>-?\d+(?:\.\d+)?)\s*dBm").unwrap());
static NXOS_QSFP_TEMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Temperature\s*:\s*(?P<val>-?\d+(?:\.\d+)?)\s*C").unwrap());
static NXOS_QSFP_VOLT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Voltage\s*:\s*(?P<val>\d+(?:\.\d+)?)\s*V").unwrap());
static NXOS_LANE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?P<lane>[1-8])\s+(?P<bias>\d+(?:\.\d+)?)\s+(?P<tx>-?\d+(?:\.\d+)?)\s+(?P<rx>-?\d+(?:\.\d+)?)")
        .unwrap()
});

/// Cisco NX-OS `show interface transceiver details`. SFP blocks carry a
/// threshold table (single lane); QSFP blocks carry module temperature and
/// voltage plus a per-lane table.
pub struct NxosTransceiverParser;

impl NxosTransceiverParser {
    fn parse_sfp(interface: String, block: &str) -> Option<Transceiver> {
        let temp = NXOS_SFP_TEMP_RE.captures(block);
        let tx = NXOS_SFP_TX_RE.captures(block);
        let rx = NXOS_SFP_RX_RE.captures(block);
        if temp.is_none() && tx.is_none() && rx.is_none() {
            return None;
        }
        Some(Transceiver {
            interface_name: interface,
            temperature: temp.and_then(|c| c["val"].parse().ok()),
            voltage: NXOS_SFP_VOLT_RE
                .captures(block)
                .and_then(|c| c["val"].parse().ok()),
            channels: vec![TransceiverChannel {
                channel: 1,
                tx_power: tx.and_then(|c| c["val"].parse().ok()),
                rx_power: rx.and_then(|c| c["val"].parse().ok()),
            }],
            serial_number: None,
            part_number: None,
        })
    }

    fn parse_qsfp(interface: String, block: &str) -> Option<Transceiver> {
        let channels: Vec<TransceiverChannel> = NXOS_LANE_RE
            .captures_iter(block)
            .filter_map(|caps| {
                Some(TransceiverChannel {
                    channel: caps["lane"].parse().ok()?,
                    tx_power: caps["tx"].parse().ok(),
                    rx_power: caps["rx"].parse().ok(),
                })
            })
            .collect();
        if channels.is_empty() {
            // Some QSFP modules report single-channel in the SFP layout.
            return Self::parse_sfp(interface, block);
        }
        Some(Transceiver {
            interface_name: interface,
            temperature: NXOS_QSFP_TEMP_RE
                .captures(block)
                .and_then(|c| c["val"].parse().ok()),
            voltage: NXOS_QSFP_VOLT_RE
                .captures(block)
                .and_then(|c| c["val"].parse().ok()),
            channels,
            serial_number: None,
            part_number: None,
        })
    }
}

impl Parser for NxosTransceiverParser {
    fn device_type(&self) -> Option<DeviceType> {
        Some(DeviceType::CiscoNxos)
    }

    fn api_name(&self) -> &'static str {
        "get_gbic_details_nxos_fna"
    }

    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        let mut results = Vec::new();
        if raw.trim().is_empty() {
            return results;
        }

        for (interface, block) in split_blocks(raw, &NXOS_INTF_RE) {
            if block.to_ascii_lowercase().contains("not present") {
                continue;
            }
            let parsed = if block.to_ascii_uppercase().contains("QSFP") {
                Self::parse_qsfp(interface, block)
            } else {
                Self::parse_sfp(interface, block)
            };
            if let Some(xcvr) = parsed {
                results.push(ParsedRecord::Transceiver(xcvr));
            }
        }
        results
    }
}
