use std::time::Duration;

use tokio::time::sleep;

/// What to do after a platform-reported mandatory wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// The wait elapsed; retry the same operation.
    Retry,
    /// The demanded wait exceeds the ceiling; give up on this operation.
    Abort,
}

/// Pacing + flood-wait policy for all calls against the user API.
///
/// The pipeline is single-threaded towards the platform by design (flood
/// control is a shared resource keyed by the credential), so this holds no
/// state beyond configuration and is safe to share within one run.
#[derive(Clone, Copy, Debug)]
pub struct RateGovernor {
    invite_delay: Duration,
    page_delay: Duration,
    flood_ceiling: Duration,
}

impl RateGovernor {
    pub fn new(invite_delay: Duration, page_delay: Duration, flood_ceiling: Duration) -> Self {
        Self {
            invite_delay,
            page_delay,
            flood_ceiling,
        }
    }

    pub fn flood_ceiling(&self) -> Duration {
        self.flood_ceiling
    }

    /// Unconditional spacing between successive invitation attempts.
    pub async fn pace(&self) {
        sleep(self.invite_delay).await;
    }

    /// Unconditional spacing between enumeration pages.
    pub async fn pace_page(&self) {
        sleep(self.page_delay).await;
    }

    /// Honor a platform flood wait, bounded by the configured ceiling.
    pub async fn handle_flood_wait(&self, seconds: u64) -> ThrottleDecision {
        let wait = Duration::from_secs(seconds);
        if wait > self.flood_ceiling {
            return ThrottleDecision::Abort;
        }
        sleep(wait).await;
        ThrottleDecision::Retry
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            Duration::from_secs(3600),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn flood_wait_below_ceiling_sleeps_then_retries() {
        let gov = RateGovernor::new(
            Duration::from_secs(0),
            Duration::from_secs(0),
            Duration::from_secs(3600),
        );
        let before = Instant::now();
        let decision = gov.handle_flood_wait(5).await;
        assert_eq!(decision, ThrottleDecision::Retry);
        assert!(before.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_above_ceiling_aborts_without_sleeping() {
        let gov = RateGovernor::new(
            Duration::from_secs(0),
            Duration::from_secs(0),
            Duration::from_secs(3600),
        );
        let before = Instant::now();
        let decision = gov.handle_flood_wait(3601).await;
        assert_eq!(decision, ThrottleDecision::Abort);
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn pace_waits_the_configured_delay() {
        let gov = RateGovernor::new(
            Duration::from_secs(10),
            Duration::from_secs(1),
            Duration::from_secs(3600),
        );
        let before = Instant::now();
        gov.pace().await;
        assert!(before.elapsed() >= Duration::from_secs(10));
    }
}
