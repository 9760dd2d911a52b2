//! Owning-process name resolution.

use netwatch_trace::event::RawTraceEvent;

use crate::process_cache::ProcessCache;

/// Resolves the display name of the process behind `event`.
///
/// A non-empty inline name wins since it reflects the process at event
/// time; otherwise the startup snapshot is consulted. Unknown pids yield
/// an empty name.
#[must_use]
pub fn resolve(event: &RawTraceEvent, cache: &ProcessCache) -> String {
    match event.process_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => cache.lookup(event.pid).unwrap_or_default().to_owned(),
    }
}
