use async_trait::async_trait;

use crate::{
    domain::{AccessToken, ChatId, GroupRef, ResolvedEntity, UserId},
    Result,
};

/// Raw participant as returned by the user API, before eligibility filtering.
#[derive(Clone, Debug)]
pub struct Participant {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub access_token: AccessToken,
    pub is_bot: bool,
    pub is_deleted: bool,
}

/// One page of a participant listing.
///
/// A flood wait is a normal page-level response, not an error: the caller
/// decides (via the rate governor) whether to sleep-and-retry or abort.
#[derive(Clone, Debug)]
pub enum ParticipantPage {
    Page(Vec<Participant>),
    FloodWait { seconds: u64 },
}

/// Fresh per-member handle resolved immediately before an invitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberHandle {
    pub id: UserId,
    pub access_token: AccessToken,
}

/// Closed classification of a single invitation attempt.
///
/// Platform exceptions are mapped into this type at the adapter so the
/// pipeline switches over variants instead of error hierarchies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InviteOutcome {
    Invited,
    FloodWait { seconds: u64 },
    /// Caller lacks admin rights in the target, or the member's privacy
    /// settings block invites. Never retried.
    PermissionDenied,
    /// The member handle went stale between resolution and invitation.
    ResolutionFailed,
    Error(String),
}

/// Port for the high-privilege user API (enumeration + invitation).
///
/// Session establishment and authentication are the embedding application's
/// job; the pipeline only ever sees an already-connected handle.
#[async_trait]
pub trait GroupClient: Send + Sync {
    async fn resolve_entity(&self, reference: &GroupRef) -> Result<ResolvedEntity>;

    /// Request one page of participants. `search` is an unfiltered search
    /// term (empty string matches all); `offset` is the raw platform cursor.
    async fn list_participants(
        &self,
        entity: &ResolvedEntity,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ParticipantPage>;

    async fn resolve_member(&self, id: UserId) -> Result<MemberHandle>;

    async fn invite_to_group(&self, target: &ResolvedEntity, member: &MemberHandle)
        -> InviteOutcome;
}

/// Port for the low-privilege bot API used for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()>;
}
