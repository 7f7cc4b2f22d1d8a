//! Guard evaluation — requires/blacklist access rules on action bundles.

use std::sync::Arc;

use tracing::debug;

use crate::platform::{ChatPlatform, ChannelId, GuildId, InvocationContext, RoleId};
use crate::tags::model::{ActionBundle, GuardPolicy};

/// Outcome of guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Allowed,
    /// Denied with the failing guard's configured response, if any.
    Denied { response: Option<String> },
}

impl GuardVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardVerdict::Allowed)
    }
}

/// What a guard token resolved to. Role resolution is tried first.
enum RoleOrChannel {
    Role(RoleId),
    Channel(ChannelId),
}

/// Resolves guard tokens against the platform and decides allow/deny.
pub struct GuardEvaluator {
    platform: Arc<dyn ChatPlatform>,
}

impl GuardEvaluator {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Evaluate both guards of a bundle. Each guard that is present must
    /// pass; the first failure wins and carries its response.
    pub async fn evaluate(&self, bundle: &ActionBundle, ctx: &InvocationContext) -> GuardVerdict {
        if let Some(requires) = &bundle.requires
            && !self.requires_satisfied(requires, ctx).await
        {
            debug!(author = %ctx.author.id, "Requires guard denied invocation");
            return GuardVerdict::Denied {
                response: requires.response.clone(),
            };
        }

        if let Some(blacklist) = &bundle.blacklist
            && self.blacklist_matches(blacklist, ctx).await
        {
            debug!(author = %ctx.author.id, "Blacklist guard denied invocation");
            return GuardVerdict::Denied {
                response: blacklist.response.clone(),
            };
        }

        GuardVerdict::Allowed
    }

    /// A requires guard passes when the invoker holds a resolved role or is
    /// in a resolved channel. Unresolvable tokens are vacuously satisfied, so
    /// a guard with no resolvable tokens passes.
    async fn requires_satisfied(&self, policy: &GuardPolicy, ctx: &InvocationContext) -> bool {
        let mut any_resolved = false;
        for token in &policy.items {
            match self.resolve(ctx.guild.id, token).await {
                Some(RoleOrChannel::Role(role)) => {
                    any_resolved = true;
                    if ctx.author_roles.contains(&role) {
                        return true;
                    }
                }
                Some(RoleOrChannel::Channel(channel)) => {
                    any_resolved = true;
                    if ctx.channel.id == channel {
                        return true;
                    }
                }
                None => {}
            }
        }
        !any_resolved
    }

    /// A blacklist guard matches (denies) when the invoker holds any
    /// resolved role or is in any resolved channel.
    async fn blacklist_matches(&self, policy: &GuardPolicy, ctx: &InvocationContext) -> bool {
        for token in &policy.items {
            match self.resolve(ctx.guild.id, token).await {
                Some(RoleOrChannel::Role(role)) if ctx.author_roles.contains(&role) => {
                    return true;
                }
                Some(RoleOrChannel::Channel(channel)) if ctx.channel.id == channel => {
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Resolve a token as a role first, falling back to a channel.
    async fn resolve(&self, guild: GuildId, token: &str) -> Option<RoleOrChannel> {
        if let Some(role) = self.platform.resolve_role(guild, token).await {
            return Some(RoleOrChannel::Role(role));
        }
        self.platform
            .resolve_channel(guild, token)
            .await
            .map(RoleOrChannel::Channel)
    }
}
