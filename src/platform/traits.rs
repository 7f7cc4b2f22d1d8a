//! Chat platform seams — pure I/O, no business logic.
//!
//! `ChatPlatform` covers every side effect the dispatcher can perform;
//! `CommandInvoker` re-enters the host bot's command tree for queued
//! sub-commands. Both are injected as trait objects so the pipeline can be
//! exercised against in-memory fakes.

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::platform::types::{ChannelId, GuildId, InvocationContext, MessageId, RoleId, UserId};

/// Chat platform I/O used by the tag pipeline.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send a message with optional text content and/or a raw embed payload.
    /// Returns the id of the sent message.
    async fn send_message(
        &self,
        channel: ChannelId,
        content: Option<&str>,
        embed: Option<&serde_json::Value>,
    ) -> Result<MessageId, PlatformError>;

    /// Delete a message.
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError>;

    /// Add a reaction emoji to a message.
    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    /// Open (or reuse) a direct-message channel with a user.
    async fn create_dm(&self, user: UserId) -> Result<ChannelId, PlatformError>;

    /// Resolve a role token (id, mention, or name) within a guild.
    async fn resolve_role(&self, guild: GuildId, token: &str) -> Option<RoleId>;

    /// Resolve a channel token (id, mention, or name) within a guild.
    async fn resolve_channel(&self, guild: GuildId, token: &str) -> Option<ChannelId>;

    /// Whether the bot may delete other members' messages in this channel.
    async fn can_manage_messages(&self, channel: ChannelId) -> bool;

    /// Whether the bot may send messages to this channel.
    async fn can_send(&self, channel: ChannelId) -> bool;
}

/// Re-enters the host bot's command dispatch with synthesized content.
///
/// Used for the sub-command list of an action bundle: each entry becomes a
/// fresh command invocation sharing the triggering context. `silent`
/// suppresses the synthesized command's own response output.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    async fn invoke(
        &self,
        ctx: &InvocationContext,
        content: &str,
        silent: bool,
    ) -> Result<(), PlatformError>;
}
