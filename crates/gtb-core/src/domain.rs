use std::fmt;

/// Platform user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Chat id of a notification destination (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Opaque per-user handle required by the user API alongside the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessToken(pub i64);

/// A group/channel reference as typed by an admin: `-1001234567890` or
/// `@channelname`. Resolution to a live entity happens at the client port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupRef(pub String);

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved group/channel entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntity {
    pub id: i64,
    pub title: String,
}

/// One eligible member of the source group.
///
/// Produced only by the enumerator; immutable; owned by the orchestrator's
/// working set for the duration of one run and discarded afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: UserId,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub access_token: AccessToken,
}
