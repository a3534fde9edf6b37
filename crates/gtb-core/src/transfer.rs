//! Transfer orchestration: enumerate the source, invite members one by one,
//! keep the tally, emit milestone events.

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    domain::{GroupRef, MemberRecord, ResolvedEntity, UserId},
    events::{ProgressSink, TransferEvent},
    governor::{RateGovernor, ThrottleDecision},
    ports::{GroupClient, InviteOutcome},
    roster::MemberEnumerator,
};

/// Numeric pipeline settings, all with platform-safe defaults.
#[derive(Clone, Copy, Debug)]
pub struct TransferSettings {
    /// Fixed spacing between invitation attempts.
    pub transfer_delay: Duration,
    /// Fixed spacing between enumeration pages.
    pub page_delay: Duration,
    /// Longest platform-demanded wait honored before giving up.
    pub flood_wait_ceiling: Duration,
    pub page_size: usize,
    /// Emit a progress event every N processed members.
    pub progress_interval: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            transfer_delay: Duration::from_secs(10),
            page_delay: Duration::from_secs(1),
            flood_wait_ceiling: Duration::from_secs(3600),
            page_size: 100,
            progress_interval: 10,
        }
    }
}

impl TransferSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            transfer_delay: cfg.transfer_delay,
            page_delay: cfg.page_delay,
            flood_wait_ceiling: cfg.flood_wait_ceiling,
            page_size: cfg.page_size,
            progress_interval: cfg.progress_interval,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransferRequest {
    pub source: GroupRef,
    pub target: GroupRef,
    pub admin: UserId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Starting,
    Enumerating,
    Transferring,
    Completed,
    Failed,
}

/// Aggregate state of one run. Owned by the orchestrator while running,
/// returned to the caller at the end; never persisted across runs.
#[derive(Clone, Debug)]
pub struct TransferReport {
    pub source: GroupRef,
    pub target: GroupRef,
    pub admin: UserId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub transferred: usize,
    pub failed: usize,
    pub total: usize,
    pub state: RunState,
    pub failure: Option<String>,
}

impl TransferReport {
    fn new(request: &TransferRequest) -> Self {
        Self {
            source: request.source.clone(),
            target: request.target.clone(),
            admin: request.admin,
            started_at: Utc::now(),
            finished_at: None,
            transferred: 0,
            failed: 0,
            total: 0,
            state: RunState::Starting,
            failure: None,
        }
    }
}

/// Handle to a fire-and-forget run. There is no cancellation: a run proceeds
/// to completion or fatal error.
pub struct RunHandle {
    handle: JoinHandle<TransferReport>,
}

impl RunHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Option<TransferReport> {
        self.handle.await.ok()
    }
}

/// Drives the enumerate -> invite loop against injected platform handles.
pub struct TransferOrchestrator {
    client: Arc<dyn GroupClient>,
    governor: RateGovernor,
    enumerator: MemberEnumerator,
    progress_interval: usize,
    // One run at a time per credential: uncoordinated concurrent runs would
    // only multiply flood pressure on the shared platform limit.
    credential_lock: tokio::sync::Mutex<()>,
}

enum Attempt {
    Invited,
    FloodWait(u64),
    Failed(String),
}

impl TransferOrchestrator {
    pub fn new(client: Arc<dyn GroupClient>, settings: TransferSettings) -> Self {
        let governor = RateGovernor::new(
            settings.transfer_delay,
            settings.page_delay,
            settings.flood_wait_ceiling,
        );
        let enumerator = MemberEnumerator::new(client.clone(), governor, settings.page_size);
        Self {
            client,
            governor,
            enumerator,
            progress_interval: settings.progress_interval.max(1),
            credential_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Launch a run in the background and return immediately.
    pub fn spawn(self: &Arc<Self>, request: TransferRequest, sink: Arc<dyn ProgressSink>) -> RunHandle {
        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move { orchestrator.run(request, sink.as_ref()).await });
        RunHandle { handle }
    }

    /// Execute one full transfer run.
    ///
    /// Never returns an error: every failure is converted into a `Failed`
    /// sink event plus a report carrying the partial counts.
    pub async fn run(&self, request: TransferRequest, sink: &dyn ProgressSink) -> TransferReport {
        let _serial = self.credential_lock.lock().await;

        let mut report = TransferReport::new(&request);
        println!(
            "[TRANSFER] run started: {} -> {} (admin {})",
            request.source, request.target, request.admin.0
        );
        notify(
            sink,
            TransferEvent::Started {
                source: request.source.clone(),
                target: request.target.clone(),
                admin: request.admin,
            },
        )
        .await;

        report.state = RunState::Enumerating;
        let members = match self.enumerator.enumerate(&request.source).await {
            Ok(m) => m,
            Err(e) => return self.fail(report, sink, e.to_string()).await,
        };

        // Duplicates are not expected, but platform_id is the dedup key in
        // case the platform ever repeats a page.
        let mut seen = HashSet::new();
        let members: Vec<MemberRecord> =
            members.into_iter().filter(|m| seen.insert(m.id)).collect();

        report.total = members.len();
        notify(sink, TransferEvent::Found { total: report.total }).await;

        if members.is_empty() {
            return self.complete(report, sink).await;
        }

        let target = match self.client.resolve_entity(&request.target).await {
            Ok(t) => t,
            Err(e) => return self.fail(report, sink, e.to_string()).await,
        };

        report.state = RunState::Transferring;
        for (idx, member) in members.iter().enumerate() {
            let position = idx + 1;
            self.process_member(&target, member, &mut report).await;
            debug_assert!(report.transferred + report.failed <= report.total);

            if position % self.progress_interval == 0 {
                notify(
                    sink,
                    TransferEvent::Progress {
                        transferred: report.transferred,
                        failed: report.failed,
                        position,
                        total: report.total,
                    },
                )
                .await;
            }

            self.governor.pace().await;
        }

        self.complete(report, sink).await
    }

    /// Process one member to a terminal classification. A flood wait below
    /// the ceiling retries the same member; everything else counts once and
    /// the loop moves on.
    async fn process_member(
        &self,
        target: &ResolvedEntity,
        member: &MemberRecord,
        report: &mut TransferReport,
    ) {
        loop {
            match self.attempt(target, member).await {
                Attempt::Invited => {
                    report.transferred += 1;
                    println!(
                        "[TRANSFER] invited user {} ({})",
                        member.id.0,
                        member.username.as_deref().unwrap_or("n/a")
                    );
                    return;
                }
                Attempt::FloodWait(seconds) => {
                    eprintln!(
                        "[TRANSFER] flood wait of {seconds}s for user {}",
                        member.id.0
                    );
                    match self.governor.handle_flood_wait(seconds).await {
                        ThrottleDecision::Retry => continue,
                        ThrottleDecision::Abort => {
                            report.failed += 1;
                            return;
                        }
                    }
                }
                Attempt::Failed(reason) => {
                    eprintln!("[TRANSFER] cannot invite user {}: {reason}", member.id.0);
                    report.failed += 1;
                    return;
                }
            }
        }
    }

    async fn attempt(&self, target: &ResolvedEntity, member: &MemberRecord) -> Attempt {
        // Resolve a fresh handle immediately before the invitation.
        let handle = match self.client.resolve_member(member.id).await {
            Ok(h) => h,
            Err(e) => return Attempt::Failed(e.to_string()),
        };

        match self.client.invite_to_group(target, &handle).await {
            InviteOutcome::Invited => Attempt::Invited,
            InviteOutcome::FloodWait { seconds } => Attempt::FloodWait(seconds),
            InviteOutcome::PermissionDenied => {
                Attempt::Failed("privacy settings or missing admin rights".to_string())
            }
            InviteOutcome::ResolutionFailed => {
                Attempt::Failed("member handle could not be resolved".to_string())
            }
            InviteOutcome::Error(reason) => Attempt::Failed(reason),
        }
    }

    async fn complete(&self, mut report: TransferReport, sink: &dyn ProgressSink) -> TransferReport {
        let finished_at = Utc::now();
        report.state = RunState::Completed;
        report.finished_at = Some(finished_at);
        println!(
            "[TRANSFER] run completed: {} transferred, {} failed, {} total",
            report.transferred, report.failed, report.total
        );
        notify(
            sink,
            TransferEvent::Completed {
                transferred: report.transferred,
                failed: report.failed,
                total: report.total,
                finished_at,
            },
        )
        .await;
        report
    }

    async fn fail(
        &self,
        mut report: TransferReport,
        sink: &dyn ProgressSink,
        reason: String,
    ) -> TransferReport {
        report.state = RunState::Failed;
        report.finished_at = Some(Utc::now());
        report.failure = Some(reason.clone());
        eprintln!("[TRANSFER] run failed: {reason}");
        notify(sink, TransferEvent::Failed { reason }).await;
        report
    }
}

async fn notify(sink: &dyn ProgressSink, event: TransferEvent) {
    if let Err(e) = sink.notify(event).await {
        eprintln!("[TRANSFER] progress notification failed: {e}");
    }
}
