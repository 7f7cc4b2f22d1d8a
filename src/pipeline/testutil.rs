//! Shared fakes for pipeline unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::PlatformError;
use crate::platform::{
    ChannelId, ChannelRef, ChatPlatform, CommandInvoker, GuildId, GuildRef, InvocationContext,
    MemberRef, MessageId, RoleId, UserId,
};

/// One recorded platform side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Send {
        channel: ChannelId,
        content: Option<String>,
        has_embed: bool,
    },
    Delete {
        channel: ChannelId,
        message: MessageId,
    },
    React {
        message: MessageId,
        emoji: String,
    },
    OpenDm {
        user: UserId,
    },
}

/// Scriptable in-memory platform that records every side effect.
pub struct MockPlatform {
    pub roles: HashMap<String, RoleId>,
    pub channels: HashMap<String, ChannelId>,
    pub manage_messages: bool,
    pub sendable: bool,
    pub fail_sends: bool,
    pub dm_channel: ChannelId,
    pub calls: Mutex<Vec<PlatformCall>>,
    next_message: AtomicU64,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            roles: HashMap::new(),
            channels: HashMap::new(),
            manage_messages: true,
            sendable: true,
            fail_sends: false,
            dm_channel: ChannelId(9999),
            calls: Mutex::new(Vec::new()),
            next_message: AtomicU64::new(1000),
        }
    }
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_role(mut self, token: &str, role: RoleId) -> Self {
        self.roles.insert(token.to_string(), role);
        self
    }

    pub fn with_channel(mut self, token: &str, channel: ChannelId) -> Self {
        self.channels.insert(token.to_string(), channel);
        self
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().await.clone()
    }

    pub async fn sent_messages(&self) -> Vec<(ChannelId, Option<String>)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                PlatformCall::Send {
                    channel, content, ..
                } => Some((*channel, content.clone())),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: Option<&str>,
        embed: Option<&serde_json::Value>,
    ) -> Result<MessageId, PlatformError> {
        if self.fail_sends {
            return Err(PlatformError::SendFailed {
                channel: channel.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.calls.lock().await.push(PlatformCall::Send {
            channel,
            content: content.map(str::to_string),
            has_embed: embed.is_some(),
        });
        Ok(MessageId(self.next_message.fetch_add(1, Ordering::SeqCst)))
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .await
            .push(PlatformCall::Delete { channel, message });
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        self.calls.lock().await.push(PlatformCall::React {
            message,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn create_dm(&self, user: UserId) -> Result<ChannelId, PlatformError> {
        self.calls.lock().await.push(PlatformCall::OpenDm { user });
        Ok(self.dm_channel)
    }

    async fn resolve_role(&self, _guild: GuildId, token: &str) -> Option<RoleId> {
        self.roles.get(token).copied()
    }

    async fn resolve_channel(&self, _guild: GuildId, token: &str) -> Option<ChannelId> {
        self.channels.get(token).copied()
    }

    async fn can_manage_messages(&self, _channel: ChannelId) -> bool {
        self.manage_messages
    }

    async fn can_send(&self, _channel: ChannelId) -> bool {
        self.sendable
    }
}

/// Command invoker that records synthesized invocations.
#[derive(Default)]
pub struct RecordingInvoker {
    pub invocations: Mutex<Vec<(String, bool)>>,
}

impl RecordingInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn invocations(&self) -> Vec<(String, bool)> {
        self.invocations.lock().await.clone()
    }
}

#[async_trait]
impl CommandInvoker for RecordingInvoker {
    async fn invoke(
        &self,
        _ctx: &InvocationContext,
        content: &str,
        silent: bool,
    ) -> Result<(), PlatformError> {
        self.invocations
            .lock()
            .await
            .push((content.to_string(), silent));
        Ok(())
    }
}

/// A ready-to-use invocation context: alice in #general of guild 100.
pub fn test_context() -> InvocationContext {
    InvocationContext {
        guild: GuildRef {
            id: GuildId(100),
            name: "testguild".into(),
        },
        channel: ChannelRef {
            id: ChannelId(200),
            name: "general".into(),
        },
        message: MessageId(300),
        author: MemberRef {
            id: UserId(400),
            name: "alice".into(),
        },
        author_roles: vec![],
        author_is_bot: false,
        mention_target: None,
        prefix: "!".into(),
    }
}
