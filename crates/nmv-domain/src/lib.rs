pub mod error;
pub mod records;
pub mod types;


pub use error::DomainError;
pub use records::{
    AclBinding, ArpEntry, ClientRecord, ErrorCount, FanStatus, InterfaceStatus, MacTableEntry,
    Neighbor, ParsedRecord, PingResult, PortChannel, PowerStatus, Transceiver,
    TransceiverChannel, Version,
};
pub use types::{
    AggProtocol, DeviceType, Duplex, LinkStatus, MacAddr, OperationalStatus, SwitchInfo, VlanId,
};
