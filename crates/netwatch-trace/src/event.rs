//! Raw trace events as delivered by the tracing collaborator.
//!
//! Each family only carries the fields it guarantees; the kernel network
//! payload keeps its addressing optional because truncated events happen.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimestamp {
    /// Wall-clock time, microsecond capable.
    pub wall: DateTime<Utc>,
    /// Monotonic counter in microseconds since session start.
    #[serde(default)]
    pub monotonic_us: u64,
}

impl EventTimestamp {
    /// Creates a timestamp from both clocks.
    #[must_use]
    pub const fn new(wall: DateTime<Utc>, monotonic_us: u64) -> Self {
        Self { wall, monotonic_us }
    }

    /// Creates a timestamp with only a wall-clock reading.
    #[must_use]
    pub const fn from_wall(wall: DateTime<Utc>) -> Self {
        Self::new(wall, 0)
    }
}

/// Transport the kernel network event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// `TcpIp` task.
    Tcp,
    /// `UdpIp` task.
    Udp,
}

/// Network operation tag of a kernel network event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetOp {
    /// Connection established.
    Connect,
    /// Connection closed.
    Disconnect,
    /// Connection attempt failed.
    Fail,
    /// Segment retransmitted.
    Retransmit,
    /// Data sent.
    Send,
    /// Data received.
    Recv,
    /// Inbound connection accepted.
    Accept,
    /// Connection re-established.
    Reconnect,
    /// Receive buffer copy.
    Copy,
    /// Any tag this build does not know.
    #[serde(other)]
    Unknown,
}

/// IP version variant, carried as its own tag rather than derived from addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 event variant.
    V4,
    /// IPv6 event variant.
    V6,
}

/// Source/destination address pair of a network event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTuple {
    /// Source address.
    pub saddr: IpAddr,
    /// Source port.
    pub sport: u16,
    /// Destination address.
    pub daddr: IpAddr,
    /// Destination port.
    pub dport: u16,
}

impl FlowTuple {
    /// Creates a flow tuple.
    #[must_use]
    pub const fn new(saddr: IpAddr, sport: u16, daddr: IpAddr, dport: u16) -> Self {
        Self {
            saddr,
            sport,
            daddr,
            dport,
        }
    }
}

/// Payload of a kernel network (TCP/IP, UDP/IP) event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelNetEvent {
    /// Transport task.
    pub transport: Transport,
    /// Operation tag.
    pub op: NetOp,
    /// IP version tag.
    pub ip_version: IpVersion,
    /// Addresses and ports, when the event carries them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowTuple>,
    /// Connection identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connid: Option<u64>,
    /// Failure code of a failed connection attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<u32>,
}

impl KernelNetEvent {
    /// Creates a payload with no addressing.
    #[must_use]
    pub const fn new(transport: Transport, op: NetOp, ip_version: IpVersion) -> Self {
        Self {
            transport,
            op,
            ip_version,
            flow: None,
            connid: None,
            failure_code: None,
        }
    }

    /// Sets the address pair.
    #[must_use]
    pub const fn with_flow(mut self, flow: FlowTuple) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Sets the connection identifier.
    #[must_use]
    pub const fn with_connid(mut self, connid: u64) -> Self {
        self.connid = Some(connid);
        self
    }

    /// Sets the failure code.
    #[must_use]
    pub const fn with_failure_code(mut self, code: u32) -> Self {
        self.failure_code = Some(code);
        self
    }
}

/// Payload of a DNS client provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsClientEvent {
    /// Provider event id.
    pub event_id: u16,
}

/// Family-tagged payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum TracePayload {
    /// Kernel network stack.
    KernelNetwork(KernelNetEvent),
    /// DNS client component.
    DnsClient(DnsClientEvent),
    /// Any other provider enabled on the session.
    Foreign {
        /// Provider name.
        provider: String,
        /// Event name as reported by the provider.
        event_name: String,
    },
}

/// One event delivered by the tracing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTraceEvent {
    /// When the event happened.
    pub timestamp: EventTimestamp,
    /// Process the event is attributed to.
    pub pid: u32,
    /// Process name, for families that populate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    /// Pre-rendered human readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Family specific fields.
    pub payload: TracePayload,
}

impl RawTraceEvent {
    /// Creates an event without inline name or message.
    #[must_use]
    pub const fn new(timestamp: EventTimestamp, pid: u32, payload: TracePayload) -> Self {
        Self {
            timestamp,
            pid,
            process_name: None,
            message: None,
            payload,
        }
    }

    /// Sets the inline process name.
    #[must_use]
    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Sets the pre-rendered message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the kernel network payload, if this is one.
    #[must_use]
    pub const fn kernel(&self) -> Option<&KernelNetEvent> {
        match &self.payload {
            TracePayload::KernelNetwork(net) => Some(net),
            _ => None,
        }
    }
}
