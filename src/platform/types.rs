//! Platform entity identifiers and the per-invocation context.
//!
//! The crate never inspects platform entities beyond their ids and display
//! names; everything richer stays behind the `ChatPlatform` trait.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Chat-platform server id — the isolation scope for tags.
    GuildId
);
id_type!(
    /// Text channel id.
    ChannelId
);
id_type!(
    /// User id.
    UserId
);
id_type!(
    /// Message id.
    MessageId
);
id_type!(
    /// Role id.
    RoleId
);

// ── Entity references ───────────────────────────────────────────────

/// A guild member as seen by the template engine (id + display name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub id: UserId,
    pub name: String,
}

/// A text channel reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

/// A guild reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRef {
    pub id: GuildId,
    pub name: String,
}

// ── Invocation context ──────────────────────────────────────────────

/// Everything the pipeline knows about the triggering message.
///
/// Built by the platform glue per inbound message and shared (by reference)
/// across guard evaluation, destination resolution, and dispatch. Sub-command
/// invocations reuse the same context with substituted content.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub guild: GuildRef,
    pub channel: ChannelRef,
    pub message: MessageId,
    pub author: MemberRef,
    /// Roles the invoker holds — consulted by guard evaluation.
    pub author_roles: Vec<RoleId>,
    /// Whether the invoker is a bot account. Bot messages never trigger tags.
    pub author_is_bot: bool,
    /// First mentioned member, if any. Seeds the `target` binding.
    pub mention_target: Option<MemberRef>,
    /// Command prefix active for this guild.
    pub prefix: String,
}
