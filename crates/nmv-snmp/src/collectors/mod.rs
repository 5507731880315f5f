pub mod base;
#[cfg(test)]
pub(crate) mod testutil;

pub mod channel_group;
pub mod error_count;
pub mod fan;
pub mod interface_status;
pub mod mac_table;
pub mod neighbor_cdp;
pub mod neighbor_lldp;
pub mod power;
pub mod transceiver;
pub mod version;

use std::sync::Arc;

pub use base::SnmpCollector;

/// All SNMP collectors, keyed later by api_name in the collection service.
pub fn builtin_collectors() -> Vec<Arc<dyn SnmpCollector>> {
    vec![
        Arc::new(fan::FanCollector),
        Arc::new(power::PowerCollector),
        Arc::new(version::VersionCollector),
        Arc::new(transceiver::TransceiverCollector),
        Arc::new(error_count::ErrorCountCollector),
        Arc::new(channel_group::ChannelGroupCollector),
        Arc::new(neighbor_lldp::NeighborLldpCollector),
        Arc::new(neighbor_cdp::NeighborCdpCollector),
        Arc::new(mac_table::MacTableCollector),
        Arc::new(interface_status::InterfaceStatusCollector),
    ]
}
