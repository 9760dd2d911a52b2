//! Domain primitive types used across the netwatch workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic category of a trace event.
///
/// The set is closed: anything the classifier does not recognise is
/// [`EventKind::Unclassified`] and never reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// IPv4 TCP connection established.
    TcpConnect,
    /// IPv6 TCP connection established.
    TcpConnectV6,
    /// IPv4 TCP connection closed.
    TcpDisconnect,
    /// IPv6 TCP connection closed.
    TcpDisconnectV6,
    /// TCP connection attempt failed.
    TcpFail,
    /// IPv4 TCP segment retransmitted.
    TcpRetransmit,
    /// IPv6 TCP segment retransmitted.
    TcpRetransmitV6,
    /// IPv4 UDP datagram sent.
    UdpSend,
    /// IPv6 UDP datagram sent.
    UdpSendV6,
    /// IPv4 UDP datagram received.
    UdpRecv,
    /// IPv6 UDP datagram received.
    UdpRecvV6,
    /// DNS query sent.
    DnsQuery,
    /// DNS query sent to a failover server. Not produced by classification,
    /// which folds failover ids into [`Self::DnsQuery`].
    DnsQueryFailover,
    /// DNS response received.
    DnsResponse,
    /// DNS response received from a failover server. Not produced by
    /// classification, which folds failover ids into [`Self::DnsResponse`].
    DnsResponseFailover,
    /// DNS client cache lookup.
    DnsCacheEvent,
    /// Filtered out; produces no record.
    Unclassified,
}

impl EventKind {
    /// Returns the protocol column for this kind, or `None` for
    /// [`EventKind::Unclassified`].
    #[must_use]
    pub const fn protocol(self) -> Option<Protocol> {
        match self {
            Self::TcpConnect | Self::TcpDisconnect | Self::TcpFail | Self::TcpRetransmit => {
                Some(Protocol::Tcp)
            }
            Self::TcpConnectV6 | Self::TcpDisconnectV6 | Self::TcpRetransmitV6 => {
                Some(Protocol::TcpV6)
            }
            Self::UdpSend | Self::UdpRecv => Some(Protocol::Udp),
            Self::UdpSendV6 | Self::UdpRecvV6 => Some(Protocol::UdpV6),
            Self::DnsQuery
            | Self::DnsQueryFailover
            | Self::DnsResponse
            | Self::DnsResponseFailover
            | Self::DnsCacheEvent => Some(Protocol::Dns),
            Self::Unclassified => None,
        }
    }

    /// Returns the event column for transport kinds.
    ///
    /// DNS kinds are labelled by their event id instead and return `None`.
    #[must_use]
    pub const fn transport_label(self) -> Option<&'static str> {
        match self {
            Self::TcpConnect | Self::TcpConnectV6 => Some("Connect"),
            Self::TcpDisconnect | Self::TcpDisconnectV6 => Some("Disconn"),
            Self::TcpFail => Some("Fail"),
            Self::TcpRetransmit | Self::TcpRetransmitV6 => Some("Retr"),
            Self::UdpSend | Self::UdpSendV6 => Some("Send"),
            Self::UdpRecv | Self::UdpRecvV6 => Some("Recv"),
            _ => None,
        }
    }

    /// Whether this kind comes from the DNS client family.
    #[must_use]
    pub const fn is_dns(self) -> bool {
        matches!(self.protocol(), Some(Protocol::Dns))
    }

    /// Whether the event describes inbound data (rendered `local <- remote`).
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        matches!(self, Self::UdpRecv | Self::UdpRecvV6)
    }
}

/// Protocol column of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// TCP over IPv4.
    #[serde(rename = "TCP")]
    Tcp,
    /// TCP over IPv6.
    #[serde(rename = "TCPv6")]
    TcpV6,
    /// UDP over IPv4.
    #[serde(rename = "UDP")]
    Udp,
    /// UDP over IPv6.
    #[serde(rename = "UDPv6")]
    UdpV6,
    /// DNS client.
    #[serde(rename = "DNS")]
    Dns,
}

impl Protocol {
    /// Returns the column text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::TcpV6 => "TCPv6",
            Self::Udp => "UDP",
            Self::UdpV6 => "UDPv6",
            Self::Dns => "DNS",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A running process as seen by the startup snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process identifier.
    pub pid: u32,
    /// Executable name.
    pub name: String,
}

impl ProcessInfo {
    /// Creates a process entry.
    #[must_use]
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}
