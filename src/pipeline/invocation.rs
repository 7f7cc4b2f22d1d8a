//! Tag invocation pipeline — the per-invocation orchestrator.
//!
//! Composes the store, name cache, template engine, and action dispatcher:
//! record fetch + use-counter increment → seed bindings → engine → body
//! truncation → dispatch. Two entry points share the path: explicit
//! invocation (`tag <name> [args]`) and the implicit message intercept.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{EngineFailurePolicy, TagConfig};
use crate::engine::{SeedBindings, SeedValue, TemplateEngine, seed_bindings};
use crate::error::PipelineError;
use crate::pipeline::dispatch::{ActionDispatcher, DispatchOutcome, send_quietly};
use crate::pipeline::truncate_chars;
use crate::platform::{ChatPlatform, CommandInvoker, InvocationContext};
use crate::store::TagStore;
use crate::tags::cache::TagNameCache;

/// How one invocation ended. All variants are terminal for the invocation
/// and none corrupt shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// No tag under that name. Reported to the user only on the explicit
    /// path.
    NotFound,
    /// The template engine failed and the configured policy reported it.
    EngineFailed,
    /// The bundle reached the dispatcher.
    Dispatched(DispatchOutcome),
}

/// Top-level orchestrator, one logical task per invocation.
pub struct TagInvocationPipeline {
    store: Arc<dyn TagStore>,
    cache: Arc<TagNameCache>,
    engine: Arc<dyn TemplateEngine>,
    platform: Arc<dyn ChatPlatform>,
    dispatcher: ActionDispatcher,
    config: TagConfig,
}

impl TagInvocationPipeline {
    pub fn new(
        store: Arc<dyn TagStore>,
        cache: Arc<TagNameCache>,
        engine: Arc<dyn TemplateEngine>,
        platform: Arc<dyn ChatPlatform>,
        invoker: Arc<dyn CommandInvoker>,
        config: TagConfig,
    ) -> Self {
        Self {
            store,
            cache,
            engine,
            dispatcher: ActionDispatcher::new(Arc::clone(&platform), invoker, config.clone()),
            platform,
            config,
        }
    }

    /// Explicit invocation: `tag <name> [args]`.
    ///
    /// `report_errors` controls whether a lookup miss is reported to the
    /// user; the implicit path always disables it.
    pub async fn invoke(
        &self,
        ctx: &InvocationContext,
        name: &str,
        args: &str,
        report_errors: bool,
    ) -> Result<InvocationOutcome, PipelineError> {
        // Counter increment rides the same read-modify-write as the fetch;
        // the store serializes writes per key, so counts are race-safe.
        let record = self
            .store
            .mutate(ctx.guild.id, name, Box::new(|tag| tag.uses += 1))
            .await?;

        let Some(record) = record else {
            debug!(guild = %ctx.guild.id, name, "Tag not found");
            if report_errors {
                let text = format!("Tag `{name}` not found.");
                send_quietly(&*self.platform, ctx.channel.id, Some(&text), None).await;
            }
            return Ok(InvocationOutcome::NotFound);
        };

        info!(
            tag = %record.name,
            guild = %ctx.guild.id,
            uses = record.uses,
            "Processing tag invocation"
        );

        let mut bindings = seed_bindings(ctx);
        bindings.insert("args".into(), SeedValue::Text(args.to_string()));
        self.execute(ctx, &record.template, &bindings).await
    }

    /// Implicit invocation: the message-create fast path.
    ///
    /// Returns `Ok(None)` when the message is not a tag invocation (wrong
    /// prefix, bot author, or cache miss). Lookup errors past the cache are
    /// always silent here.
    pub async fn handle_message(
        &self,
        ctx: &InvocationContext,
        content: &str,
    ) -> Result<Option<InvocationOutcome>, PipelineError> {
        if ctx.author_is_bot {
            return Ok(None);
        }
        let Some(rest) = content.strip_prefix(ctx.prefix.as_str()) else {
            return Ok(None);
        };

        let mut parts = rest.splitn(2, ' ');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() || !self.cache.contains(ctx.guild.id, name).await {
            return Ok(None);
        }

        // Cache hit: route as the explicit command, silently.
        let args = parts.next().unwrap_or("");
        self.invoke(ctx, name, args, false).await.map(Some)
    }

    /// Run a template through the full dispatch path without a stored
    /// record. No counter is touched. Backs the `tag process` command.
    pub async fn run_unstored(
        &self,
        ctx: &InvocationContext,
        template: &str,
    ) -> Result<InvocationOutcome, PipelineError> {
        let bindings = seed_bindings(ctx);
        self.execute(ctx, template, &bindings).await
    }

    async fn execute(
        &self,
        ctx: &InvocationContext,
        template: &str,
        bindings: &SeedBindings,
    ) -> Result<InvocationOutcome, PipelineError> {
        let output = match self.engine.process(template, bindings) {
            Ok(output) => output,
            Err(e) => {
                warn!(guild = %ctx.guild.id, error = %e, "Template engine failed");
                return match self.config.engine_failure_policy {
                    EngineFailurePolicy::Propagate => Err(e.into()),
                    EngineFailurePolicy::Report => {
                        let text = format!("Template error: {e}");
                        send_quietly(&*self.platform, ctx.channel.id, Some(&text), None).await;
                        Ok(InvocationOutcome::EngineFailed)
                    }
                };
            }
        };

        let body = output
            .body
            .filter(|b| !b.is_empty())
            .map(|b| truncate_chars(&b, self.config.max_body_chars));

        let outcome = self.dispatcher.dispatch(body, output.actions, ctx).await;
        Ok(InvocationOutcome::Dispatched(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use crate::error::EngineError;
    use crate::pipeline::testutil::{MockPlatform, RecordingInvoker, test_context};
    use crate::platform::UserId;
    use crate::store::MemoryTagStore;
    use crate::tags::model::TagRecord;

    /// Engine that substitutes `{args}` or fails on demand.
    struct SubstEngine {
        fail: bool,
    }

    impl TemplateEngine for SubstEngine {
        fn process(
            &self,
            template: &str,
            bindings: &SeedBindings,
        ) -> Result<EngineOutput, EngineError> {
            if self.fail {
                return Err(EngineError::Process("boom".into()));
            }
            let args = bindings
                .get("args")
                .map(|v| v.render().to_string())
                .unwrap_or_default();
            Ok(EngineOutput::text(template.replace("{args}", &args)))
        }
    }

    struct Fixture {
        store: Arc<MemoryTagStore>,
        cache: Arc<TagNameCache>,
        platform: Arc<MockPlatform>,
        pipeline: TagInvocationPipeline,
    }

    async fn fixture(fail_engine: bool, policy: EngineFailurePolicy) -> Fixture {
        let store = Arc::new(MemoryTagStore::new());
        let cache = TagNameCache::new(Arc::clone(&store) as Arc<dyn TagStore>);
        let platform = MockPlatform::new();
        let config = TagConfig {
            engine_failure_policy: policy,
            ..Default::default()
        };
        let pipeline = TagInvocationPipeline::new(
            Arc::clone(&store) as Arc<dyn TagStore>,
            Arc::clone(&cache),
            Arc::new(SubstEngine { fail: fail_engine }),
            Arc::clone(&platform) as Arc<dyn ChatPlatform>,
            RecordingInvoker::new(),
            config,
        );
        Fixture {
            store,
            cache,
            platform,
            pipeline,
        }
    }

    async fn seed_tag(f: &Fixture, name: &str, template: &str) {
        let ctx = test_context();
        f.store
            .put(TagRecord::new(ctx.guild.id, UserId(1), name, template))
            .await
            .unwrap();
        f.cache.refresh(ctx.guild.id).await.unwrap();
    }

    #[tokio::test]
    async fn invoke_substitutes_args_and_sends() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "Hello {args}").await;
        let ctx = test_context();

        let outcome = f.pipeline.invoke(&ctx, "greet", "World", true).await.unwrap();

        assert_eq!(
            outcome,
            InvocationOutcome::Dispatched(DispatchOutcome::Completed)
        );
        let sent = f.platform.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.as_deref(), Some("Hello World"));
    }

    #[tokio::test]
    async fn invoke_increments_use_counter() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "hi").await;
        let ctx = test_context();

        for _ in 0..3 {
            f.pipeline.invoke(&ctx, "greet", "", true).await.unwrap();
        }

        let tag = f.store.get(ctx.guild.id, "greet").await.unwrap().unwrap();
        assert_eq!(tag.uses, 3);
    }

    #[tokio::test]
    async fn explicit_not_found_is_reported() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        let ctx = test_context();

        let outcome = f.pipeline.invoke(&ctx, "ghost", "", true).await.unwrap();

        assert_eq!(outcome, InvocationOutcome::NotFound);
        let sent = f.platform.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.as_deref(), Some("Tag `ghost` not found."));
    }

    #[tokio::test]
    async fn silent_not_found_sends_nothing() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        let ctx = test_context();

        let outcome = f.pipeline.invoke(&ctx, "ghost", "", false).await.unwrap();

        assert_eq!(outcome, InvocationOutcome::NotFound);
        assert!(f.platform.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn body_truncated_to_limit() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "wall", &"x".repeat(3000)).await;
        let ctx = test_context();

        f.pipeline.invoke(&ctx, "wall", "", true).await.unwrap();

        let sent = f.platform.sent_messages().await;
        assert_eq!(sent[0].1.as_ref().unwrap().chars().count(), 2000);
    }

    #[tokio::test]
    async fn handle_message_hits_cached_tag() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "Hello {args}").await;
        let ctx = test_context();

        let outcome = f
            .pipeline
            .handle_message(&ctx, "!greet World")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(InvocationOutcome::Dispatched(DispatchOutcome::Completed))
        );
        assert_eq!(
            f.platform.sent_messages().await[0].1.as_deref(),
            Some("Hello World")
        );
    }

    #[tokio::test]
    async fn handle_message_ignores_non_tags() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "hi").await;
        let ctx = test_context();

        // Wrong prefix.
        assert!(f.pipeline.handle_message(&ctx, "greet").await.unwrap().is_none());
        // Cache miss.
        assert!(f.pipeline.handle_message(&ctx, "!other").await.unwrap().is_none());
        assert!(f.platform.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn handle_message_ignores_bots() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "hi").await;
        let mut ctx = test_context();
        ctx.author_is_bot = true;

        let outcome = f.pipeline.handle_message(&ctx, "!greet").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn removed_tag_yields_not_found_after_refresh() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "hi").await;
        let ctx = test_context();

        f.store.remove(ctx.guild.id, "greet").await.unwrap();
        f.cache.refresh(ctx.guild.id).await.unwrap();

        assert!(!f.cache.contains(ctx.guild.id, "greet").await);
        let outcome = f.pipeline.invoke(&ctx, "greet", "", false).await.unwrap();
        assert_eq!(outcome, InvocationOutcome::NotFound);
    }

    #[tokio::test]
    async fn engine_failure_reported_by_policy() {
        let f = fixture(true, EngineFailurePolicy::Report).await;
        seed_tag(&f, "bad", "{broken").await;
        let ctx = test_context();

        let outcome = f.pipeline.invoke(&ctx, "bad", "", true).await.unwrap();

        assert_eq!(outcome, InvocationOutcome::EngineFailed);
        let sent = f.platform.sent_messages().await;
        assert!(sent[0].1.as_ref().unwrap().contains("Template error"));
    }

    #[tokio::test]
    async fn engine_failure_propagated_by_policy() {
        let f = fixture(true, EngineFailurePolicy::Propagate).await;
        seed_tag(&f, "bad", "{broken").await;
        let ctx = test_context();

        let result = f.pipeline.invoke(&ctx, "bad", "", true).await;

        assert!(matches!(result, Err(PipelineError::Engine(_))));
        assert!(f.platform.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn run_unstored_does_not_touch_counters() {
        let f = fixture(false, EngineFailurePolicy::Report).await;
        seed_tag(&f, "greet", "hi").await;
        let ctx = test_context();

        f.pipeline.run_unstored(&ctx, "ad hoc").await.unwrap();

        let tag = f.store.get(ctx.guild.id, "greet").await.unwrap().unwrap();
        assert_eq!(tag.uses, 0);
        assert_eq!(
            f.platform.sent_messages().await[0].1.as_deref(),
            Some("ad hoc")
        );
    }
}
