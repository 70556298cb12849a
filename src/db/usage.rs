//! Per-connection checkout counting.
//!
//! sqlx has no notion of a use limit, so the pool hooks key each physical
//! connection by its backend PID and count releases here.

use dashmap::DashMap;

/// Backend process id of a PostgreSQL connection.
pub type BackendPid = i32;

/// Counts uses of each live physical connection.
#[derive(Debug)]
pub struct UsageLedger {
    max_uses: u32,
    uses: DashMap<BackendPid, u32>,
}

impl UsageLedger {
    pub fn new(max_uses: u32) -> Self {
        Self {
            max_uses: max_uses.max(1),
            uses: DashMap::new(),
        }
    }

    /// Start tracking a freshly opened connection.
    ///
    /// PIDs are reused by the server, so any stale count is reset.
    pub fn register(&self, pid: BackendPid) {
        self.uses.insert(pid, 0);
    }

    /// Record one completed use.
    ///
    /// Returns `true` if the connection may go back to the idle set, `false`
    /// once it has reached its use limit. A retired connection is forgotten.
    pub fn record_use(&self, pid: BackendPid) -> bool {
        let retire = {
            let mut count = self.uses.entry(pid).or_insert(0);
            *count += 1;
            *count >= self.max_uses
        };
        if retire {
            self.uses.remove(&pid);
        }
        !retire
    }

    pub fn uses(&self, pid: BackendPid) -> Option<u32> {
        self.uses.get(&pid).map(|count| *count)
    }

    pub fn tracked(&self) -> usize {
        self.uses.len()
    }
}
