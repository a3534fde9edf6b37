//! Scriptable fakes for pipeline tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{AccessToken, GroupRef, ResolvedEntity, UserId},
    events::{ProgressSink, TransferEvent},
    ports::{GroupClient, InviteOutcome, MemberHandle, Participant, ParticipantPage},
    Error, Result,
};

pub(crate) const SRC: &str = "@source";
pub(crate) const DST: &str = "@target";

pub(crate) fn human(id: i64) -> Participant {
    Participant {
        id: UserId(id),
        username: Some(format!("user{id}")),
        first_name: Some(format!("User {id}")),
        last_name: None,
        access_token: AccessToken(id * 1000),
        is_bot: false,
        is_deleted: false,
    }
}

pub(crate) fn bot_account(id: i64) -> Participant {
    Participant {
        is_bot: true,
        ..human(id)
    }
}

pub(crate) fn deleted_account(id: i64) -> Participant {
    Participant {
        is_deleted: true,
        ..human(id)
    }
}

enum PageStep {
    Serve,
    FloodWait(u64),
}

/// In-memory `GroupClient` with scriptable flood waits and invite outcomes.
///
/// `list_participants` serves slices of a fixed roster unless a flood step
/// was planned; `invite_to_group` pops a planned per-user outcome queue and
/// defaults to `Invited`. All calls are recorded for assertions.
pub(crate) struct FakeGroupClient {
    entities: HashMap<String, ResolvedEntity>,
    roster: Vec<Participant>,
    page_plan: Mutex<VecDeque<PageStep>>,
    invite_plan: Mutex<HashMap<i64, VecDeque<InviteOutcome>>>,
    unresolvable_members: HashSet<i64>,
    pub list_offsets: Mutex<Vec<usize>>,
    pub invite_calls: Mutex<Vec<i64>>,
}

impl FakeGroupClient {
    pub fn new() -> Self {
        let mut entities = HashMap::new();
        entities.insert(
            SRC.to_string(),
            ResolvedEntity {
                id: 100,
                title: "Source Group".to_string(),
            },
        );
        entities.insert(
            DST.to_string(),
            ResolvedEntity {
                id: 200,
                title: "Target Group".to_string(),
            },
        );
        Self {
            entities,
            roster: Vec::new(),
            page_plan: Mutex::new(VecDeque::new()),
            invite_plan: Mutex::new(HashMap::new()),
            unresolvable_members: HashSet::new(),
            list_offsets: Mutex::new(Vec::new()),
            invite_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_roster(mut self, roster: Vec<Participant>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_unresolvable_member(mut self, id: i64) -> Self {
        self.unresolvable_members.insert(id);
        self
    }

    /// Respond to the next `list_participants` call with a flood wait.
    pub fn plan_page_flood(&self, seconds: u64) {
        self.page_plan
            .lock()
            .unwrap()
            .push_back(PageStep::FloodWait(seconds));
    }

    /// Queue an outcome for the next invitation of `user_id`.
    pub fn plan_invite(&self, user_id: i64, outcome: InviteOutcome) {
        self.invite_plan
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push_back(outcome);
    }

    pub fn invite_count(&self, user_id: i64) -> usize {
        self.invite_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|&&id| id == user_id)
            .count()
    }

    pub fn total_invite_calls(&self) -> usize {
        self.invite_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GroupClient for FakeGroupClient {
    async fn resolve_entity(&self, reference: &GroupRef) -> Result<ResolvedEntity> {
        self.entities
            .get(&reference.0)
            .cloned()
            .ok_or_else(|| Error::Resolution {
                reference: reference.0.clone(),
                reason: "no such chat".to_string(),
            })
    }

    async fn list_participants(
        &self,
        _entity: &ResolvedEntity,
        _search: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ParticipantPage> {
        self.list_offsets.lock().unwrap().push(offset);

        let step = self
            .page_plan
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PageStep::Serve);
        if let PageStep::FloodWait(seconds) = step {
            return Ok(ParticipantPage::FloodWait { seconds });
        }

        let end = (offset + limit).min(self.roster.len());
        let page = if offset >= self.roster.len() {
            Vec::new()
        } else {
            self.roster[offset..end].to_vec()
        };
        Ok(ParticipantPage::Page(page))
    }

    async fn resolve_member(&self, id: UserId) -> Result<MemberHandle> {
        if self.unresolvable_members.contains(&id.0) {
            return Err(Error::External(format!("user {} not found", id.0)));
        }
        let token = self
            .roster
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.access_token)
            .unwrap_or(AccessToken(0));
        Ok(MemberHandle {
            id,
            access_token: token,
        })
    }

    async fn invite_to_group(
        &self,
        _target: &ResolvedEntity,
        member: &MemberHandle,
    ) -> InviteOutcome {
        self.invite_calls.lock().unwrap().push(member.id.0);
        self.invite_plan
            .lock()
            .unwrap()
            .get_mut(&member.id.0)
            .and_then(|q| q.pop_front())
            .unwrap_or(InviteOutcome::Invited)
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<TransferEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TransferEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn notify(&self, event: TransferEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
