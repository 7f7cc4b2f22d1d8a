//! Destination resolution for response output.

use std::sync::Arc;

use tracing::debug;

use crate::platform::{ChannelId, ChatPlatform, InvocationContext};

/// Destination token that routes output to the invoker's DMs.
const DM_TOKEN: &str = "dm";

/// Maps an action's target token to a concrete output channel.
///
/// Resolution is non-fatal by design: anything that cannot be resolved, or
/// that the bot cannot send to, falls back to the invocation channel.
pub struct DestinationResolver {
    platform: Arc<dyn ChatPlatform>,
}

impl DestinationResolver {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    pub async fn resolve(&self, target: Option<&str>, ctx: &InvocationContext) -> ChannelId {
        let Some(token) = target else {
            return ctx.channel.id;
        };

        if token == DM_TOKEN {
            return match self.platform.create_dm(ctx.author.id).await {
                Ok(dm) => dm,
                Err(e) => {
                    debug!(user = %ctx.author.id, error = %e, "DM open failed; using invocation channel");
                    ctx.channel.id
                }
            };
        }

        match self.platform.resolve_channel(ctx.guild.id, token).await {
            Some(channel) if self.platform.can_send(channel).await => channel,
            Some(channel) => {
                debug!(channel = %channel, "No send permission for target; falling back");
                ctx.channel.id
            }
            None => {
                debug!(token, "Unresolvable target token; falling back");
                ctx.channel.id
            }
        }
    }
}
