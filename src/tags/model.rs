//! Tag data model — stored records, guard policies, and the action bundle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{GuildId, UserId};

// ── Tag record ──────────────────────────────────────────────────────

/// A stored tag: a named template owned by a guild member.
///
/// Invariants: `name` is unique within the guild, `uses` never decreases,
/// and `owner` only changes through an explicit edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,
    pub guild: GuildId,
    pub owner: UserId,
    /// Raw template text, handed verbatim to the template engine.
    pub template: String,
    /// Monotonic use counter, incremented per invocation.
    pub uses: u64,
    pub created_at: DateTime<Utc>,
}

impl TagRecord {
    /// Create a fresh record with a zeroed use counter.
    pub fn new(
        guild: GuildId,
        owner: UserId,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            guild,
            owner,
            template: template.into(),
            uses: 0,
            created_at: Utc::now(),
        }
    }

    /// Template length in characters.
    pub fn len(&self) -> usize {
        self.template.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }
}

// ── Guard policy ────────────────────────────────────────────────────

/// A requires/blacklist access rule on an action bundle.
///
/// Each item is a role-or-channel token; `response` is sent on denial
/// (falling back to a reaction on the invoking message when absent).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardPolicy {
    pub items: Vec<String>,
    pub response: Option<String>,
}

impl GuardPolicy {
    pub fn new<I, S>(items: I, response: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            response: response.map(str::to_string),
        }
    }
}

// ── Action bundle ───────────────────────────────────────────────────

/// Structured side-effect description from one template execution.
///
/// Produced fresh per invocation by the template engine and never persisted.
/// Every field is optional; an empty bundle means "just send the body".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionBundle {
    /// Raw embed payload, passed opaquely to the platform.
    pub embed: Option<serde_json::Value>,
    /// Delete the invoking message. Mutually exclusive in effect with
    /// `react_to_invocation`: a deleted message cannot be reacted to.
    pub delete: bool,
    /// Reactions to apply to the invoking message.
    pub react_to_invocation: Vec<String>,
    /// Reactions to apply to the response message after a successful send.
    pub react_to_response: Vec<String>,
    /// Sub-commands to synthesize as new invocations (prefix excluded).
    pub commands: Vec<String>,
    /// Destination token: `"dm"` or a channel reference.
    pub target: Option<String>,
    pub requires: Option<GuardPolicy>,
    pub blacklist: Option<GuardPolicy>,
    /// Suppress response output of synthesized sub-commands.
    pub silent: bool,
}

impl ActionBundle {
    /// True when the bundle carries no actions at all.
    pub fn is_empty(&self) -> bool {
        self.embed.is_none()
            && !self.delete
            && self.react_to_invocation.is_empty()
            && self.react_to_response.is_empty()
            && self.commands.is_empty()
            && self.target.is_none()
            && self.requires.is_none()
            && self.blacklist.is_none()
    }

    /// True when either guard policy is present.
    pub fn has_guards(&self) -> bool {
        self.requires.is_some() || self.blacklist.is_some()
    }
}
