//! End-to-end tests for the netwatch pipeline.
//!
//! These drive raw events through classification, process resolution,
//! formatting, and the dispatch loop exactly as the binary does:
//! 1. Direct pipeline calls (classify, resolve, format)
//! 2. Channel-fed dispatch worker with cancellation
//! 3. NDJSON capture replay into a writer sink

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use netwatch_common::config::MonitorConfig;
use netwatch_common::constants::HEADER_LINE;
use netwatch_common::types::{EventKind, ProcessInfo};
use netwatch_core::classifier::classify;
use netwatch_core::dispatch::{Monitor, RunSummary};
use netwatch_core::formatter::format;
use netwatch_core::process_cache::ProcessCache;
use netwatch_core::resolver::resolve;
use netwatch_core::sink::{MemorySink, WriterSink};
use netwatch_trace::channel::channel;
use netwatch_trace::event::{
    DnsClientEvent, EventTimestamp, FlowTuple, IpVersion, KernelNetEvent, NetOp, RawTraceEvent,
    TracePayload, Transport,
};
use netwatch_trace::replay::ReplaySource;
use netwatch_trace::source::CancelToken;

fn ts() -> EventTimestamp {
    EventTimestamp::new(
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00.987654Z")
            .expect("valid")
            .with_timezone(&Utc),
        1_000,
    )
}

fn tcp_connect(inline_name: &str) -> RawTraceEvent {
    RawTraceEvent::new(
        ts(),
        4242,
        TracePayload::KernelNetwork(
            KernelNetEvent::new(Transport::Tcp, NetOp::Connect, IpVersion::V4)
                .with_flow(FlowTuple::new(
                    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                    51000,
                    IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
                    443,
                ))
                .with_connid(7),
        ),
    )
    .with_process_name(inline_name)
}

fn dns(event_id: u16, pid: u32, message: &str) -> RawTraceEvent {
    RawTraceEvent::new(ts(), pid, TracePayload::DnsClient(DnsClientEvent { event_id }))
        .with_message(message)
}

fn pipeline(event: &RawTraceEvent, cache: &ProcessCache) -> Option<String> {
    let kind = classify(event);
    let name = resolve(event, cache);
    format(event, kind, &name).map(|r| r.render_text())
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn scenario_tcp_connect_with_inline_name() {
    let cache = ProcessCache::from_processes([ProcessInfo::new(4242, "svchost.exe")]);
    let line = pipeline(&tcp_connect("chrome.exe"), &cache).expect("record");

    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 8, "{line}");
    assert_eq!(fields[0], "2024-05-01T10:00:00.987Z: TCP");
    assert_eq!(fields[1], "Connect");
    assert_eq!(fields[2], "7");
    assert_eq!(fields[3], "10.0.0.5:51000 -> 93.184.216.34:443");
    assert_eq!(fields[4], "4242");
    assert_eq!(fields[5], "chrome.exe");
}

#[test]
fn scenario_tcp_connect_falls_back_to_cache() {
    let cache = ProcessCache::from_processes([ProcessInfo::new(4242, "svchost.exe")]);
    let line = pipeline(&tcp_connect(""), &cache).expect("record");
    assert_eq!(line.split('\t').nth(5), Some("svchost.exe"));
}

#[test]
fn scenario_dns_cache_event_echoes_process_name() {
    let event = dns(3018, 6100, "Cache lookup for example.com").with_process_name("nslookup.exe");
    assert_eq!(classify(&event), EventKind::DnsCacheEvent);

    let record = format(&event, EventKind::DnsCacheEvent, &resolve(&event, &ProcessCache::empty()))
        .expect("record");
    assert_eq!(record.message(), Some("Cache lookup for example.com nslookup.exe"));
    assert_eq!(
        record.render_text(),
        "2024-05-01T10:00:00.987Z: DNS EventID(3018) Cache lookup for example.com nslookup.exe"
    );
}

#[test]
fn scenario_unknown_dns_code_produces_nothing() {
    let event = dns(9999, 1, "whatever");
    assert_eq!(classify(&event), EventKind::Unclassified);
    assert!(format(&event, EventKind::Unclassified, "").is_none());
    assert!(pipeline(&event, &ProcessCache::empty()).is_none());
}

// ── Dispatch worker ──────────────────────────────────────────────────

#[test]
fn worker_preserves_delivery_order_and_filters() {
    let sink = MemorySink::new();
    let cache = Arc::new(ProcessCache::from_processes([ProcessInfo::new(
        4242,
        "svchost.exe",
    )]));
    let (tx, source) = channel(16);
    let cancel = CancelToken::new();
    let handle = Monitor::new(cache, sink.clone(), MonitorConfig::default())
        .spawn(source, cancel)
        .expect("spawn");

    tx.send(dns(3008, 10, "second in time")).expect("send");
    tx.send(dns(9999, 10, "dropped")).expect("send");
    tx.send(tcp_connect("")).expect("send");
    drop(tx);

    let summary = handle.join().expect("join").expect("run");
    assert_eq!(
        summary,
        RunSummary {
            events: 3,
            emitted: 2,
            filtered: 1
        }
    );

    let lines = sink.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER_LINE);
    assert!(lines[1].contains("DNS EventID(3008) second in time"));
    assert!(lines[2].contains("\tsvchost.exe\t"));
}

#[test]
fn worker_stops_on_cancel_while_idle() {
    let sink = MemorySink::new();
    let (_tx, source) = channel(4);
    let cancel = CancelToken::new();
    let handle = Monitor::new(Arc::new(ProcessCache::empty()), sink.clone(), MonitorConfig::default())
        .spawn(source, cancel.clone())
        .expect("spawn");

    cancel.cancel();
    let summary = handle.join().expect("join").expect("clean shutdown");
    assert_eq!(summary.events, 0);
    assert!(sink.is_closed());
}

// ── Capture replay ───────────────────────────────────────────────────

#[test]
fn replayed_capture_renders_every_family() {
    let capture = [
        serde_json::to_string(&tcp_connect("chrome.exe")).expect("serialize"),
        r#"{"timestamp":{"wall":"2024-05-01T10:00:01Z"},"pid":4,"message":"connection refused","payload":{"family":"kernel_network","transport":"tcp","op":"fail","ip_version":"v4","failure_code":10061}}"#.to_string(),
        r#"{"timestamp":{"wall":"2024-05-01T10:00:02Z"},"pid":4,"payload":{"family":"kernel_network","transport":"udp","op":"recv","ip_version":"v4","flow":{"saddr":"8.8.8.8","sport":53,"daddr":"10.0.0.5","dport":5353},"connid":3}}"#.to_string(),
        "garbage line".to_string(),
        r#"{"timestamp":{"wall":"2024-05-01T10:00:03Z"},"pid":4,"payload":{"family":"foreign","provider":"Other","event_name":"X"}}"#.to_string(),
    ];
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    for line in &capture {
        writeln!(file, "{line}").expect("write");
    }

    let cache = Arc::new(ProcessCache::from_processes([ProcessInfo::new(4, "System")]));
    let mut monitor = Monitor::new(cache, WriterSink::new(Vec::new()), MonitorConfig::default());
    let mut source = ReplaySource::from_path(file.path());
    let summary = monitor
        .run(&mut source, &CancelToken::new())
        .expect("replay");

    assert_eq!(summary.events, 4);
    assert_eq!(summary.emitted, 3);
    assert_eq!(summary.filtered, 1);
    assert_eq!(source.skipped(), 1);
}

#[test]
fn replayed_lines_match_contract() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        r#"{{"timestamp":{{"wall":"2024-05-01T10:00:01.5Z"}},"pid":4,"message":"connection refused","payload":{{"family":"kernel_network","transport":"tcp","op":"fail","ip_version":"v4","failure_code":10061}}}}"#
    )
    .expect("write");

    let sink = MemorySink::new();
    let mut monitor = Monitor::new(
        Arc::new(ProcessCache::from_processes([ProcessInfo::new(4, "System")])),
        sink.clone(),
        MonitorConfig::default(),
    );
    let _ = monitor
        .run(&mut ReplaySource::from_path(file.path()), &CancelToken::new())
        .expect("replay");

    assert_eq!(
        sink.lines(),
        vec![
            HEADER_LINE.to_string(),
            "2024-05-01T10:00:01.500Z: TCP\tFail\t\txxxx:xx - xxxx:xx\t4\tSystem\t10061\tconnection refused"
                .to_string(),
        ]
    );
}

#[test]
fn missing_capture_is_a_startup_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = MemorySink::new();
    let err = Monitor::new(Arc::new(ProcessCache::empty()), sink.clone(), MonitorConfig::default())
        .run(
            &mut ReplaySource::from_path(dir.path().join("none.ndjson")),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(err.is_startup());
    assert!(sink.lines().is_empty());
}
