use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{GroupRef, UserId},
    Result,
};

/// Milestone events emitted by the orchestrator during one run.
///
/// `Completed` is always the last event of a non-fatal run; `Failed` is the
/// only terminal event of a fatal one. `position` in `Progress` is 1-indexed.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferEvent {
    Started {
        source: GroupRef,
        target: GroupRef,
        admin: UserId,
    },
    Found {
        total: usize,
    },
    Progress {
        transferred: usize,
        failed: usize,
        position: usize,
        total: usize,
    },
    Completed {
        transferred: usize,
        failed: usize,
        total: usize,
        finished_at: DateTime<Utc>,
    },
    Failed {
        reason: String,
    },
}

/// Callback interface through which the pipeline reports milestones.
///
/// Rendering and delivery transport belong to the implementation; the
/// orchestrator logs and otherwise ignores delivery failures.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn notify(&self, event: TransferEvent) -> Result<()>;
}
