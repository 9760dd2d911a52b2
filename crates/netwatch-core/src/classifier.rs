//! Maps raw trace events to semantic event kinds.
//!
//! Classification is a pure function of the event family and its
//! operation tag or event id. The family is inspected first; an
//! unrecognised code inside a known family is [`EventKind::Unclassified`].

use netwatch_common::constants::{
    DNS_CACHE, DNS_QUERY, DNS_QUERY_FAILOVER, DNS_RESPONSE, DNS_RESPONSE_FAILOVER,
};
use netwatch_common::types::EventKind;
use netwatch_trace::event::{IpVersion, KernelNetEvent, NetOp, RawTraceEvent, TracePayload, Transport};

/// Classifies one event. Never fails.
#[must_use]
pub fn classify(event: &RawTraceEvent) -> EventKind {
    match &event.payload {
        TracePayload::KernelNetwork(net) => classify_kernel(net),
        TracePayload::DnsClient(dns) => classify_dns(dns.event_id),
        TracePayload::Foreign { .. } => EventKind::Unclassified,
    }
}

/// Classifies a kernel network payload by transport, operation, and IP version tag.
#[must_use]
pub const fn classify_kernel(net: &KernelNetEvent) -> EventKind {
    use IpVersion::{V4, V6};

    match (net.transport, net.op, net.ip_version) {
        (Transport::Tcp, NetOp::Connect, V4) => EventKind::TcpConnect,
        (Transport::Tcp, NetOp::Connect, V6) => EventKind::TcpConnectV6,
        (Transport::Tcp, NetOp::Disconnect, V4) => EventKind::TcpDisconnect,
        (Transport::Tcp, NetOp::Disconnect, V6) => EventKind::TcpDisconnectV6,
        // failure events have a single, unversioned variant
        (Transport::Tcp, NetOp::Fail, _) => EventKind::TcpFail,
        (Transport::Tcp, NetOp::Retransmit, V4) => EventKind::TcpRetransmit,
        (Transport::Tcp, NetOp::Retransmit, V6) => EventKind::TcpRetransmitV6,
        (Transport::Udp, NetOp::Send, V4) => EventKind::UdpSend,
        (Transport::Udp, NetOp::Send, V6) => EventKind::UdpSendV6,
        (Transport::Udp, NetOp::Recv, V4) => EventKind::UdpRecv,
        (Transport::Udp, NetOp::Recv, V6) => EventKind::UdpRecvV6,
        _ => EventKind::Unclassified,
    }
}

/// Classifies a DNS client event id.
///
/// Failover ids fold into their base kind; the record label still shows
/// the id that was received.
#[must_use]
pub const fn classify_dns(event_id: u16) -> EventKind {
    match event_id {
        DNS_QUERY | DNS_QUERY_FAILOVER => EventKind::DnsQuery,
        DNS_RESPONSE | DNS_RESPONSE_FAILOVER => EventKind::DnsResponse,
        DNS_CACHE => EventKind::DnsCacheEvent,
        _ => EventKind::Unclassified,
    }
}
