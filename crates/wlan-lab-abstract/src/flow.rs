use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Flow id the engine uses for its own control traffic.
pub const CONTROL_FLOW_ID: u32 = 0;

/// Byte counter of one flow observed by the engine's flow monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub flow_id: u32,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub received_bytes: u64,
}

impl FlowRecord {
    pub fn new(flow_id: u32, source: Ipv4Addr, destination: Ipv4Addr, received_bytes: u64) -> Self {
        Self {
            flow_id,
            source,
            destination,
            received_bytes,
        }
    }

    pub fn is_control(&self) -> bool {
        self.flow_id == CONTROL_FLOW_ID
    }
}
