pub mod codec;
pub mod collectors;
pub mod engine;
pub mod error;
pub mod mock;
pub mod oids;
pub mod session_cache;
pub mod udp;

pub use collectors::{builtin_collectors, SnmpCollector};
pub use engine::{SnmpEngine, SnmpEngineConfig, SnmpTarget};
pub use error::SnmpError;
pub use mock::{MockSnmpEngine, UplinkPlan};
pub use session_cache::SnmpSessionCache;
pub use udp::UdpSnmpEngine;
