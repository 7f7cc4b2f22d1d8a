//! Action dispatch — executes a bundle's side effects against the platform.
//!
//! Ordering rules:
//! - guards first, then the anti-recursion check; either aborts the dispatch
//! - deletion (permission-gated) excludes reactions on the invoking message
//! - response reactions are sequenced after a successful send
//! - everything else runs as independent branches, jointly awaited; one
//!   branch failing never cancels its siblings

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use crate::config::TagConfig;
use crate::pipeline::destination::DestinationResolver;
use crate::pipeline::guard::{GuardEvaluator, GuardVerdict};
use crate::pipeline::truncate_chars;
use crate::platform::{ChannelId, ChatPlatform, CommandInvoker, InvocationContext, MessageId};
use crate::tags::model::ActionBundle;

/// Reaction applied to the invoking message when a guard denies without a
/// configured response.
const DENIAL_FALLBACK_EMOJI: &str = "❌";

/// Message sent when a sub-command would re-enter the tag command.
const LOOP_MESSAGE: &str = "Looping isn't allowed.";

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// All branches launched and jointly awaited.
    Completed,
    /// A guard denied the invocation; nothing but the denial ran.
    GuardDenied,
    /// The sub-command batch failed the anti-recursion check; the whole
    /// dispatch was aborted.
    RecursionRejected,
}

/// Executes action bundles. Holds the guard evaluator and destination
/// resolver; sub-commands re-enter the host bot through `CommandInvoker`.
pub struct ActionDispatcher {
    platform: Arc<dyn ChatPlatform>,
    invoker: Arc<dyn CommandInvoker>,
    guards: GuardEvaluator,
    destinations: DestinationResolver,
    config: TagConfig,
}

impl ActionDispatcher {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        invoker: Arc<dyn CommandInvoker>,
        config: TagConfig,
    ) -> Self {
        Self {
            guards: GuardEvaluator::new(Arc::clone(&platform)),
            destinations: DestinationResolver::new(Arc::clone(&platform)),
            platform,
            invoker,
            config,
        }
    }

    /// Execute `(body, bundle)` for one invocation.
    pub async fn dispatch(
        &self,
        body: Option<String>,
        bundle: ActionBundle,
        ctx: &InvocationContext,
    ) -> DispatchOutcome {
        // Guards gate everything else.
        if bundle.has_guards()
            && let GuardVerdict::Denied { response } = self.guards.evaluate(&bundle, ctx).await
        {
            match response {
                Some(text) => {
                    let text = truncate_chars(&text, self.config.max_body_chars);
                    send_quietly(&*self.platform, ctx.channel.id, Some(&text), None).await;
                }
                None => {
                    react_quietly(
                        &*self.platform,
                        ctx.channel.id,
                        ctx.message,
                        DENIAL_FALLBACK_EMOJI,
                    )
                    .await;
                }
            }
            return DispatchOutcome::GuardDenied;
        }

        // Static anti-recursion check: one level of self-reinvocation, not
        // cycle detection. Any match rejects the whole dispatch.
        if bundle
            .commands
            .iter()
            .any(|command| command.starts_with(&self.config.command_name))
        {
            warn!(guild = %ctx.guild.id, "Sub-command batch rejected: tag re-invocation");
            send_quietly(&*self.platform, ctx.channel.id, Some(LOOP_MESSAGE), None).await;
            return DispatchOutcome::RecursionRejected;
        }

        let mut branches: Vec<BoxFuture<'_, ()>> = Vec::new();

        // Deletion and invoking-message reactions are mutually exclusive:
        // the delete flag alone suppresses reactions, even when the missing
        // permission keeps the deletion itself from being queued.
        if bundle.delete {
            if self.platform.can_manage_messages(ctx.channel.id).await {
                let platform = &*self.platform;
                branches.push(
                    async move {
                        delete_quietly(platform, ctx.channel.id, ctx.message).await;
                    }
                    .boxed(),
                );
            }
        } else if !bundle.react_to_invocation.is_empty() {
            let platform = &*self.platform;
            let emojis = &bundle.react_to_invocation;
            branches.push(
                async move {
                    for emoji in emojis {
                        react_quietly(platform, ctx.channel.id, ctx.message, emoji).await;
                    }
                }
                .boxed(),
            );
        }

        // Send, then response reactions — the one true data dependency.
        if body.is_some() || bundle.embed.is_some() {
            let platform = &*self.platform;
            let destinations = &self.destinations;
            let target = bundle.target.as_deref();
            let embed = bundle.embed.as_ref();
            let react = &bundle.react_to_response;
            let body = body.clone();
            branches.push(
                async move {
                    let dest = destinations.resolve(target, ctx).await;
                    if let Some(sent) =
                        send_quietly(platform, dest, body.as_deref(), embed).await
                    {
                        for emoji in react {
                            react_quietly(platform, dest, sent, emoji).await;
                        }
                    }
                }
                .boxed(),
            );
        }

        // Sub-command batch, fanned out within its own branch.
        if !bundle.commands.is_empty() {
            let invoker = &*self.invoker;
            let prefix = &ctx.prefix;
            let silent = bundle.silent;
            let commands = &bundle.commands;
            branches.push(
                async move {
                    let invocations = commands.iter().map(|command| async move {
                        let content = format!("{prefix}{command}");
                        if let Err(e) = invoker.invoke(ctx, &content, silent).await {
                            debug!(error = %e, "Sub-command invocation failed");
                        }
                    });
                    join_all(invocations).await;
                }
                .boxed(),
            );
        }

        join_all(branches).await;
        DispatchOutcome::Completed
    }
}

// ── Best-effort platform helpers ────────────────────────────────────

/// Send and swallow failures. Returns the sent message id on success.
pub async fn send_quietly(
    platform: &dyn ChatPlatform,
    channel: ChannelId,
    content: Option<&str>,
    embed: Option<&serde_json::Value>,
) -> Option<MessageId> {
    match platform.send_message(channel, content, embed).await {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(channel = %channel, error = %e, "Send failed (best-effort)");
            None
        }
    }
}

/// Delete and swallow failures.
pub async fn delete_quietly(platform: &dyn ChatPlatform, channel: ChannelId, message: MessageId) {
    if let Err(e) = platform.delete_message(channel, message).await {
        debug!(message = %message, error = %e, "Delete failed (best-effort)");
    }
}

/// React and swallow failures.
pub async fn react_quietly(
    platform: &dyn ChatPlatform,
    channel: ChannelId,
    message: MessageId,
    emoji: &str,
) {
    if let Err(e) = platform.add_reaction(channel, message, emoji).await {
        debug!(message = %message, emoji, error = %e, "Reaction failed (best-effort)");
    }
}
