//! Canonical output records and their line renderings.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use netwatch_common::constants::FAILURE_ENDPOINT_PLACEHOLDER;
use netwatch_common::error::Result;
use netwatch_common::types::{EventKind, Protocol};
use serde::{Serialize, Serializer};

/// One side of a flow. Missing parts render empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// IP address.
    pub addr: Option<IpAddr>,
    /// Port.
    pub port: Option<u16>,
}

impl Endpoint {
    /// Creates a fully known endpoint.
    #[must_use]
    pub const fn new(addr: IpAddr, port: u16) -> Self {
        Self {
            addr: Some(addr),
            port: Some(port),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(addr) = self.addr {
            write!(f, "{addr}")?;
        }
        f.write_str(":")?;
        if let Some(port) = self.port {
            write!(f, "{port}")?;
        }
        Ok(())
    }
}

/// Family specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RecordBody {
    /// A TCP or UDP flow between two endpoints.
    Flow {
        /// Connection identifier, when the kind carries one.
        connection_id: Option<u64>,
        /// Local side.
        local: Endpoint,
        /// Remote side.
        remote: Endpoint,
        /// Data flowed from remote to local.
        inbound: bool,
    },
    /// A failed TCP connection attempt. Carries no endpoints.
    Failure {
        /// Failure code reported by the stack.
        failure_code: Option<u32>,
        /// Human readable failure text.
        failure_message: String,
    },
    /// A DNS client notification.
    Dns {
        /// Pre-rendered provider message.
        message: String,
    },
}

/// A classified, enriched event ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedRecord {
    /// Event time.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
    /// Protocol column.
    pub protocol: Protocol,
    /// Semantic kind.
    pub kind: EventKind,
    /// Event column (`Connect`, `EventID(3006)`, ...).
    pub label: String,
    /// Owning process id.
    pub pid: u32,
    /// Owning process name, possibly empty.
    pub process_name: String,
    /// Family specific fields.
    #[serde(flatten)]
    pub body: RecordBody,
}

impl FormattedRecord {
    /// Connection identifier, if any.
    #[must_use]
    pub const fn connection_id(&self) -> Option<u64> {
        match &self.body {
            RecordBody::Flow { connection_id, .. } => *connection_id,
            _ => None,
        }
    }

    /// Local endpoint of a flow record.
    #[must_use]
    pub const fn local_endpoint(&self) -> Option<&Endpoint> {
        match &self.body {
            RecordBody::Flow { local, .. } => Some(local),
            _ => None,
        }
    }

    /// Remote endpoint of a flow record.
    #[must_use]
    pub const fn remote_endpoint(&self) -> Option<&Endpoint> {
        match &self.body {
            RecordBody::Flow { remote, .. } => Some(remote),
            _ => None,
        }
    }

    /// Failure code of a failure record.
    #[must_use]
    pub const fn failure_code(&self) -> Option<u32> {
        match &self.body {
            RecordBody::Failure { failure_code, .. } => *failure_code,
            _ => None,
        }
    }

    /// Failure text of a failure record.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match &self.body {
            RecordBody::Failure {
                failure_message, ..
            } => Some(failure_message),
            _ => None,
        }
    }

    /// Message of a DNS record.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            RecordBody::Dns { message } => Some(message),
            _ => None,
        }
    }

    /// Renders the tab-delimited text line.
    ///
    /// Field order: timestamp and protocol, event, connection id,
    /// endpoints, pid, process name, failure code, failure message.
    /// DNS records keep the space separated `DNS <label> <message>` shape
    /// and have no tab fields, so positional readers must check the
    /// protocol before splitting on tabs.
    #[must_use]
    pub fn render_text(&self) -> String {
        let ts = format_timestamp(&self.timestamp);
        let Self {
            protocol,
            label,
            pid,
            process_name,
            ..
        } = self;
        match &self.body {
            RecordBody::Flow {
                connection_id,
                local,
                remote,
                inbound,
            } => {
                let connid = connection_id.map(|id| id.to_string()).unwrap_or_default();
                let arrow = if *inbound { "<-" } else { "->" };
                format!(
                    "{ts}: {protocol}\t{label}\t{connid}\t{local} {arrow} {remote}\t{pid}\t{process_name}\t\t"
                )
            }
            RecordBody::Failure {
                failure_code,
                failure_message,
            } => {
                let code = failure_code.map(|c| c.to_string()).unwrap_or_default();
                format!(
                    "{ts}: {protocol}\t{label}\t\t{FAILURE_ENDPOINT_PLACEHOLDER}\t{pid}\t{process_name}\t{code}\t{failure_message}"
                )
            }
            RecordBody::Dns { message } => format!("{ts}: {protocol} {label} {message}"),
        }
    }

    /// Renders the record as a single-line JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Formats a timestamp as ISO-8601 with millisecond precision.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_millis<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}
