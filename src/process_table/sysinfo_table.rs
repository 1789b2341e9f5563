use super::{ProcessRecord, ProcessTable};
use crate::prelude::*;
use itertools::Itertools;
use sysinfo::{
    MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, UpdateKind,
};

/// The live process table, as exposed by `sysinfo`.
#[derive(Debug, Default)]
pub struct SysinfoProcessTable {
    sample_cpu: bool,
}

impl SysinfoProcessTable {
    /// Command lines and memory only. CPU usage is reported as zero.
    pub fn new() -> Self {
        Self { sample_cpu: false }
    }

    /// Also measure CPU usage, which needs two samples taken
    /// `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` apart.
    pub fn with_cpu_sampling() -> Self {
        Self { sample_cpu: true }
    }

    fn process_refresh_kind(&self) -> ProcessRefreshKind {
        let kind = ProcessRefreshKind::nothing()
            .with_cmd(UpdateKind::Always)
            .with_memory();
        if self.sample_cpu {
            kind.with_cpu()
        } else {
            kind
        }
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        let refresh_kind = self.process_refresh_kind();
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::nothing().with_ram())
                .with_processes(refresh_kind),
        );

        if self.sample_cpu {
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            system.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing().with_cpu(),
            );
        }

        let total_memory = system.total_memory();
        ensure!(
            !system.processes().is_empty(),
            "The process table could not be read"
        );

        let records = system
            .processes()
            .values()
            // Threads share their process' command line and would show up as duplicates
            .filter(|process| process.thread_kind().is_none())
            .map(|process| {
                let memory = process.memory();
                ProcessRecord {
                    pid: process.pid().as_u32(),
                    parent_pid: process.parent().map(|pid| pid.as_u32()),
                    command_line: process
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy())
                        .join(" "),
                    cpu_percent: process.cpu_usage(),
                    mem_percent: if total_memory == 0 {
                        0.0
                    } else {
                        (memory as f64 / total_memory as f64 * 100.0) as f32
                    },
                    rss_kib: memory / 1024,
                }
            })
            .sorted_by_key(|record| record.pid)
            .collect_vec();
        trace!("Read {} processes from the process table", records.len());

        Ok(records)
    }
}
