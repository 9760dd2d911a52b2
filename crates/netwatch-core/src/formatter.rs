//! Builds [`FormattedRecord`]s from classified, resolved events.
//!
//! Field presence follows the event family: flows carry endpoints,
//! failures carry a code and message with placeholder endpoints, DNS
//! records carry the provider's message. Absent or damaged inputs degrade
//! to empty fields. Free text is stripped of tabs and line breaks so a
//! record always renders as one positional line.

use netwatch_common::constants::{
    DNS_CACHE, DNS_QUERY, DNS_QUERY_FAILOVER, DNS_RESPONSE, DNS_RESPONSE_FAILOVER,
};
use netwatch_common::types::EventKind;
use netwatch_trace::event::{FlowTuple, RawTraceEvent, TracePayload};

use crate::record::{Endpoint, FormattedRecord, RecordBody};

/// Formats one event. Returns `None` (skip) for [`EventKind::Unclassified`].
#[must_use]
pub fn format(
    event: &RawTraceEvent,
    kind: EventKind,
    process_name: &str,
) -> Option<FormattedRecord> {
    let protocol = kind.protocol()?;
    let (label, body) = if kind.is_dns() {
        (dns_label(event, kind), dns_body(event, kind, process_name))
    } else if kind == EventKind::TcpFail {
        (transport_label(kind), failure_body(event))
    } else {
        (transport_label(kind), flow_body(event, kind))
    };
    Some(FormattedRecord {
        timestamp: event.timestamp.wall,
        protocol,
        kind,
        label,
        pid: event.pid,
        process_name: sanitize(process_name),
        body,
    })
}

/// Whether records of `kind` carry a connection id.
#[must_use]
pub const fn carries_connection_id(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::TcpConnect
            | EventKind::TcpConnectV6
            | EventKind::TcpDisconnect
            | EventKind::TcpDisconnectV6
            | EventKind::TcpRetransmit
            | EventKind::TcpRetransmitV6
            | EventKind::UdpSendV6
            | EventKind::UdpRecvV6
    )
}

fn transport_label(kind: EventKind) -> String {
    kind.transport_label().unwrap_or_default().to_owned()
}

fn dns_label(event: &RawTraceEvent, kind: EventKind) -> String {
    let code = match &event.payload {
        TracePayload::DnsClient(dns) => dns.event_id,
        _ => match kind {
            EventKind::DnsQueryFailover => DNS_QUERY_FAILOVER,
            EventKind::DnsResponse => DNS_RESPONSE,
            EventKind::DnsResponseFailover => DNS_RESPONSE_FAILOVER,
            EventKind::DnsCacheEvent => DNS_CACHE,
            _ => DNS_QUERY,
        },
    };
    format!("EventID({code})")
}

fn dns_body(event: &RawTraceEvent, kind: EventKind, process_name: &str) -> RecordBody {
    let message = sanitize(event.message.as_deref().unwrap_or_default());
    let message = if kind == EventKind::DnsCacheEvent {
        format!("{message} {}", sanitize(process_name))
    } else {
        message
    };
    RecordBody::Dns { message }
}

fn failure_body(event: &RawTraceEvent) -> RecordBody {
    RecordBody::Failure {
        failure_code: event.kernel().and_then(|net| net.failure_code),
        failure_message: sanitize(event.message.as_deref().unwrap_or_default()),
    }
}

fn flow_body(event: &RawTraceEvent, kind: EventKind) -> RecordBody {
    let net = event.kernel();
    let inbound = kind.is_inbound();
    let (local, remote) = match net.and_then(|n| n.flow) {
        Some(FlowTuple {
            saddr,
            sport,
            daddr,
            dport,
        }) => {
            let source = Endpoint::new(saddr, sport);
            let destination = Endpoint::new(daddr, dport);
            if inbound {
                (destination, source)
            } else {
                (source, destination)
            }
        }
        None => (Endpoint::default(), Endpoint::default()),
    };
    let connection_id = if carries_connection_id(kind) {
        net.and_then(|n| n.connid)
    } else {
        None
    };
    RecordBody::Flow {
        connection_id,
        local,
        remote,
        inbound,
    }
}

fn sanitize(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}
