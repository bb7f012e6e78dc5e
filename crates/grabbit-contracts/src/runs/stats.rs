use serde::{Deserialize, Serialize};

use crate::naming::ArtifactKind;

/// How one unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Generated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    pub generated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl KindStats {
    pub fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Generated => self.generated += 1,
            ItemStatus::Skipped => self.skipped += 1,
            ItemStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.generated + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub prizes: KindStats,
    pub banners: KindStats,
}

impl BatchStats {
    pub fn record(&mut self, kind: ArtifactKind, status: ItemStatus) {
        match kind {
            ArtifactKind::Prize => self.prizes.record(status),
            ArtifactKind::Banner => self.banners.record(status),
        }
    }

    pub fn total(&self) -> u64 {
        self.prizes.total() + self.banners.total()
    }

    pub fn failed(&self) -> u64 {
        self.prizes.failed + self.banners.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
