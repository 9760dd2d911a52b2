//! Startup snapshot of running processes.
//!
//! Built once before the dispatch worker starts and never updated:
//! processes launched later resolve only through inline event names.

use std::collections::HashMap;

use netwatch_common::error::{NetwatchError, Result};
use netwatch_common::types::ProcessInfo;
use sysinfo::{ProcessesToUpdate, System};

/// Lists running processes at a point in time.
pub trait ProcessEnumerator {
    /// Returns every process visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`NetwatchError::ProcessEnumeration`] if the process table
    /// cannot be read.
    fn snapshot(&self) -> Result<Vec<ProcessInfo>>;
}

/// Enumerates the host's process table through `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl ProcessEnumerator for SystemProcesses {
    fn snapshot(&self) -> Result<Vec<ProcessInfo>> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(NetwatchError::ProcessEnumeration {
                message: "process enumeration is not supported on this platform".into(),
            });
        }
        let mut system = System::new();
        let _ = system.refresh_processes(ProcessesToUpdate::All, true);
        let processes: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .map(|(pid, process)| {
                ProcessInfo::new(pid.as_u32(), process.name().to_string_lossy().into_owned())
            })
            .collect();
        if processes.is_empty() {
            return Err(NetwatchError::ProcessEnumeration {
                message: "no processes visible (insufficient privilege?)".into(),
            });
        }
        Ok(processes)
    }
}

/// Read-only pid to name mapping.
#[derive(Debug, Clone, Default)]
pub struct ProcessCache {
    names: HashMap<u32, String>,
}

impl ProcessCache {
    /// Creates a cache with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a cache from a list of processes. A repeated pid keeps the
    /// last name seen.
    #[must_use]
    pub fn from_processes(processes: impl IntoIterator<Item = ProcessInfo>) -> Self {
        let names = processes.into_iter().map(|p| (p.pid, p.name)).collect();
        Self { names }
    }

    /// Takes the snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the enumerator's failure.
    pub fn build(enumerator: &dyn ProcessEnumerator) -> Result<Self> {
        let cache = Self::from_processes(enumerator.snapshot()?);
        tracing::info!(processes = cache.len(), "process snapshot taken");
        Ok(cache)
    }

    /// Takes the snapshot, falling back to an empty cache on failure.
    #[must_use]
    pub fn build_or_empty(enumerator: &dyn ProcessEnumerator) -> Self {
        Self::build(enumerator).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "continuing with an empty process cache");
            Self::empty()
        })
    }

    /// Applies the configured failure policy.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error only when `strict` is set.
    pub fn for_policy(enumerator: &dyn ProcessEnumerator, strict: bool) -> Result<Self> {
        if strict {
            Self::build(enumerator)
        } else {
            Ok(Self::build_or_empty(enumerator))
        }
    }

    /// Name of `pid` at snapshot time.
    #[must_use]
    pub fn lookup(&self, pid: u32) -> Option<&str> {
        self.names.get(&pid).map(String::as_str)
    }

    /// Number of processes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
