use crate::prelude::*;
use serde::Serialize;

mod sysinfo_table;

pub use sysinfo_table::SysinfoProcessTable;

/// A point-in-time view of one OS process. Never owned: the process may be gone by the time the
/// record is acted upon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub command_line: String,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub rss_kib: u64,
}

#[cfg(test)]
impl ProcessRecord {
    pub fn test(pid: u32, command_line: &str) -> Self {
        ProcessRecord {
            pid,
            parent_pid: None,
            command_line: command_line.to_string(),
            cpu_percent: 0.0,
            mem_percent: 0.0,
            rss_kib: 0,
        }
    }
}

/// Read-only access to the host's process table.
///
/// Snapshots are ordered by ascending process ID so that enumeration order is stable.
pub trait ProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>>;
}

/// A fixed process table, for exercising the tracker without real processes.
#[cfg(test)]
pub struct StaticProcessTable(pub Vec<ProcessRecord>);

#[cfg(test)]
impl ProcessTable for StaticProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        let mut records = self.0.clone();
        records.sort_by_key(|record| record.pid);
        Ok(records)
    }
}
