//! Paginated member enumeration.

use std::sync::Arc;

use crate::{
    domain::{GroupRef, MemberRecord},
    governor::{RateGovernor, ThrottleDecision},
    ports::{GroupClient, Participant, ParticipantPage},
    Error, Result,
};

/// Fetches the full member list of a source group, one page at a time,
/// keeping only human accounts.
pub struct MemberEnumerator {
    client: Arc<dyn GroupClient>,
    governor: RateGovernor,
    page_size: usize,
}

impl MemberEnumerator {
    pub fn new(client: Arc<dyn GroupClient>, governor: RateGovernor, page_size: usize) -> Self {
        Self {
            client,
            governor,
            page_size,
        }
    }

    /// Enumerate all eligible members of `source` in platform return order.
    ///
    /// Read-only with respect to the source: calling this twice against an
    /// unchanged group yields the same sequence.
    pub async fn enumerate(&self, source: &GroupRef) -> Result<Vec<MemberRecord>> {
        let entity = self.client.resolve_entity(source).await?;
        println!("[ENUM] listing members of {} ({source})", entity.title);

        let mut members = Vec::new();
        let mut offset = 0usize;

        loop {
            let page = self
                .client
                .list_participants(&entity, "", offset, self.page_size)
                .await?;

            match page {
                ParticipantPage::FloodWait { seconds } => {
                    eprintln!("[ENUM] flood wait of {seconds}s at offset {offset}");
                    match self.governor.handle_flood_wait(seconds).await {
                        // Retry the same page: the cursor did not move.
                        ThrottleDecision::Retry => continue,
                        ThrottleDecision::Abort => {
                            return Err(Error::FloodWaitExceeded {
                                wait_seconds: seconds,
                                ceiling_seconds: self.governor.flood_ceiling().as_secs(),
                            })
                        }
                    }
                }
                ParticipantPage::Page(raw) => {
                    if raw.is_empty() {
                        break;
                    }
                    // Advance by the raw count, not the filtered count, to
                    // stay aligned with the platform's pagination cursor.
                    offset += raw.len();
                    members.extend(raw.into_iter().filter(is_human).map(into_member));
                    self.governor.pace_page().await;
                }
            }
        }

        println!("[ENUM] found {} eligible members", members.len());
        Ok(members)
    }
}

fn is_human(p: &Participant) -> bool {
    !p.is_bot && !p.is_deleted
}

fn into_member(p: Participant) -> MemberRecord {
    let display_name = match (p.first_name, p.last_name) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(first), None) => Some(first),
        (None, Some(last)) => Some(last),
        (None, None) => None,
    };
    MemberRecord {
        id: p.id,
        username: p.username,
        display_name,
        access_token: p.access_token,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::UserId;
    use crate::testutil::{bot_account, deleted_account, human, FakeGroupClient, SRC};
    use tokio::time::Instant;

    fn governor() -> RateGovernor {
        RateGovernor::new(
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(3600),
        )
    }

    fn source() -> GroupRef {
        GroupRef(SRC.to_string())
    }

    #[tokio::test]
    async fn filters_bots_and_deleted_accounts() {
        let client = Arc::new(FakeGroupClient::new().with_roster(vec![
            human(1),
            bot_account(2),
            deleted_account(3),
            human(4),
        ]));
        let enumerator = MemberEnumerator::new(client.clone(), governor(), 100);

        let members = enumerator.enumerate(&source()).await.unwrap();
        let ids: Vec<i64> = members.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn offset_advances_by_raw_count_not_filtered_count() {
        // 3 raw participants, only 1 human, page size 2: the cursor must
        // still walk 0 -> 2 -> 3 to drain the source.
        let client = Arc::new(
            FakeGroupClient::new().with_roster(vec![bot_account(1), bot_account(2), human(3)]),
        );
        let enumerator = MemberEnumerator::new(client.clone(), governor(), 2);

        let members = enumerator.enumerate(&source()).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(*client.list_offsets.lock().unwrap(), vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn terminates_on_first_empty_page() {
        let roster: Vec<_> = (1..=5).map(human).collect();
        let client = Arc::new(FakeGroupClient::new().with_roster(roster));
        let enumerator = MemberEnumerator::new(client.clone(), governor(), 100);

        let members = enumerator.enumerate(&source()).await.unwrap();
        assert_eq!(members.len(), 5);
        // One full page, then the empty page that ends the loop.
        assert_eq!(*client.list_offsets.lock().unwrap(), vec![0, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_below_ceiling_retries_the_same_page() {
        let roster: Vec<_> = (1..=3).map(human).collect();
        let client = Arc::new(FakeGroupClient::new().with_roster(roster));
        client.plan_page_flood(5);
        let enumerator = MemberEnumerator::new(client.clone(), governor(), 100);

        let before = Instant::now();
        let members = enumerator.enumerate(&source()).await.unwrap();
        assert!(before.elapsed() >= Duration::from_secs(5));

        // The flooded request is repeated at the same offset and its data is
        // not duplicated in the result.
        assert_eq!(*client.list_offsets.lock().unwrap(), vec![0, 0, 3]);
        let ids: Vec<i64> = members.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn flood_wait_above_ceiling_aborts_enumeration() {
        let client = Arc::new(FakeGroupClient::new().with_roster(vec![human(1)]));
        client.plan_page_flood(4000);
        let enumerator = MemberEnumerator::new(client.clone(), governor(), 100);

        let err = enumerator.enumerate(&source()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::FloodWaitExceeded {
                wait_seconds: 4000,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_reference_is_a_resolution_error() {
        let client = Arc::new(FakeGroupClient::new());
        let enumerator = MemberEnumerator::new(client, governor(), 100);

        let err = enumerator
            .enumerate(&GroupRef("@missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[tokio::test]
    async fn enumeration_is_idempotent() {
        let roster: Vec<_> = (1..=7).map(human).collect();
        let client = Arc::new(FakeGroupClient::new().with_roster(roster));
        let enumerator = MemberEnumerator::new(client, governor(), 3);

        let first: Vec<UserId> = enumerator
            .enumerate(&source())
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        let second: Vec<UserId> = enumerator
            .enumerate(&source())
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(first, second);
    }
}
