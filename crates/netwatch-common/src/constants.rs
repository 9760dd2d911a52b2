//! Output contract constants and well-known event codes.

/// Header line written once before the first record.
pub const HEADER_LINE: &str =
    "DateTime: Protocol\tEvent\tConnectionID\tLocal > Remote\tPID\tProcessName\tFailureCode\tFailureMsg";

/// Endpoint field rendered for TCP failure records, which carry no usable addresses.
pub const FAILURE_ENDPOINT_PLACEHOLDER: &str = "xxxx:xx - xxxx:xx";

/// DNS client: query sent.
pub const DNS_QUERY: u16 = 3006;
/// DNS client: query sent to a failover server.
pub const DNS_QUERY_FAILOVER: u16 = 3009;
/// DNS client: response received.
pub const DNS_RESPONSE: u16 = 3008;
/// DNS client: response received from a failover server.
pub const DNS_RESPONSE_FAILOVER: u16 = 3020;
/// DNS client: cache lookup result.
pub const DNS_CACHE: u16 = 3018;

/// Default bound of the push-adapter event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// Name of the dispatch worker thread.
pub const DISPATCH_THREAD_NAME: &str = "netwatch-dispatch";
