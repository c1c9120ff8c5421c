use std::collections::VecDeque;

use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::scoring::team::{Scope, TeamId};

/// One persisted score, shown in the recent-activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub logged_at: OffsetDateTime,
    pub team_id: TeamId,
    pub team_name: String,
    pub school_name: String,
    pub activity_name: String,
    pub scope: Scope,
    pub score: f64,
}

/// Bounded feed of recent saves; the oldest entry is dropped once full.
pub struct ActivityLog {
    capacity: usize,
    entries: Mutex<VecDeque<ActivityEntry>>,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub async fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(entry);
    }

    /// Entries newest first.
    pub async fn recent(&self) -> Vec<ActivityEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }
}
