pub mod acl;
pub mod arp;
pub mod channel_group;
pub mod client;
pub mod error_count;
pub mod fan;
pub mod interface_status;
pub mod mac_table;
pub mod neighbor;
pub mod ping;
pub mod power;
pub mod transceiver;
pub mod version;

use std::sync::Arc;

use crate::parser::Parser;

/// Every built-in parser, in registration order. This is the single place a
/// new plugin gets wired in.
pub fn builtin_parsers() -> Vec<Arc<dyn Parser>> {
    vec![
        // fan
        Arc::new(fan::HpeFanParser),
        Arc::new(fan::IosFanParser),
        Arc::new(fan::NxosFanParser),
        // power
        Arc::new(power::HpePowerParser),
        Arc::new(power::IosPowerParser),
        Arc::new(power::NxosPowerParser),
        // version
        Arc::new(version::HpeVersionParser),
        Arc::new(version::IosVersionParser),
        Arc::new(version::NxosVersionParser),
        // mac table
        Arc::new(mac_table::HpeMacTableParser),
        Arc::new(mac_table::IosMacTableParser),
        Arc::new(mac_table::NxosMacTableParser),
        // arp
        Arc::new(arp::HpeArpParser),
        Arc::new(arp::IosArpParser),
        Arc::new(arp::NxosArpParser),
        // neighbors / uplinks
        Arc::new(neighbor::HpeLldpNeighborParser),
        Arc::new(neighbor::IosCdpNeighborParser),
        Arc::new(neighbor::IosLldpNeighborParser),
        Arc::new(neighbor::NxosLldpNeighborParser),
        Arc::new(neighbor::NxosCdpNeighborParser),
        // transceivers
        Arc::new(transceiver::HpeTransceiverParser),
        Arc::new(transceiver::IosTransceiverParser),
        Arc::new(transceiver::NxosTransceiverParser),
        // channel groups
        Arc::new(channel_group::HpeChannelGroupParser),
        Arc::new(channel_group::IosChannelGroupParser),
        Arc::new(channel_group::NxosChannelGroupParser),
        Arc::new(channel_group::HpePortChannelParser),
        // error counters
        Arc::new(error_count::HpeErrorCountParser),
        Arc::new(error_count::IosErrorCountParser),
        Arc::new(error_count::NxosErrorCountParser),
        // ACL bindings
        Arc::new(acl::HpeStaticAclParser),
        Arc::new(acl::IosStaticAclParser),
        Arc::new(acl::NxosStaticAclParser),
        Arc::new(acl::HpeDynamicAclParser),
        Arc::new(acl::IosDynamicAclParser),
        Arc::new(acl::NxosDynamicAclParser),
        // interface status
        Arc::new(interface_status::IosInterfaceStatusParser),
        Arc::new(interface_status::NxosInterfaceStatusParser),
        // cross-vendor
        Arc::new(ping::PingBatchParser),
    ]
}
