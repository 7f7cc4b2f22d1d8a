//! Template engine seam and seed variable bindings.
//!
//! The template language itself (block grammar, control flow) is owned by an
//! external engine. This crate only defines the exchange types: read-only
//! entity adapters seeded per invocation, and the `{body, actions}` output
//! the dispatcher executes.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::platform::InvocationContext;
use crate::tags::model::ActionBundle;

// ── Seed bindings ───────────────────────────────────────────────────

/// A read-only variable value exposed to the template engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    /// Free text (e.g. the invocation arguments).
    Text(String),
    /// A guild member adapter (id + display name).
    Member { id: u64, name: String },
    /// A text channel adapter.
    Channel { id: u64, name: String },
    /// A guild adapter.
    Guild { id: u64, name: String },
}

impl SeedValue {
    /// The value's default string rendering, as a bare variable substitution
    /// would produce it.
    pub fn render(&self) -> &str {
        match self {
            SeedValue::Text(s) => s,
            SeedValue::Member { name, .. }
            | SeedValue::Channel { name, .. }
            | SeedValue::Guild { name, .. } => name,
        }
    }
}

/// Variable name → seed value map handed to the engine.
pub type SeedBindings = HashMap<String, SeedValue>;

/// Build the standard per-invocation bindings from the triggering context.
///
/// `author`/`user` are the invoker; `target`/`member` are the first mentioned
/// member, defaulting to the invoker; `channel` and `guild`/`server` describe
/// where the invocation happened. Caller-supplied bindings (like `args`)
/// layer on top.
pub fn seed_bindings(ctx: &InvocationContext) -> SeedBindings {
    let author = SeedValue::Member {
        id: ctx.author.id.0,
        name: ctx.author.name.clone(),
    };
    let target = match &ctx.mention_target {
        Some(member) => SeedValue::Member {
            id: member.id.0,
            name: member.name.clone(),
        },
        None => author.clone(),
    };
    let channel = SeedValue::Channel {
        id: ctx.channel.id.0,
        name: ctx.channel.name.clone(),
    };
    let guild = SeedValue::Guild {
        id: ctx.guild.id.0,
        name: ctx.guild.name.clone(),
    };

    let mut seed = SeedBindings::new();
    seed.insert("author".into(), author.clone());
    seed.insert("user".into(), author);
    seed.insert("target".into(), target.clone());
    seed.insert("member".into(), target);
    seed.insert("channel".into(), channel);
    seed.insert("guild".into(), guild.clone());
    seed.insert("server".into(), guild);
    seed
}

// ── Engine output ───────────────────────────────────────────────────

/// Result of one template execution: response text plus an action bundle.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub body: Option<String>,
    pub actions: ActionBundle,
}

impl EngineOutput {
    /// Plain-text output with no actions.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            actions: ActionBundle::default(),
        }
    }
}

// ── Engine trait ────────────────────────────────────────────────────

/// External template engine: pure function from template text and bindings
/// to structured output. Failures propagate as `EngineError`.
pub trait TemplateEngine: Send + Sync {
    fn process(&self, template: &str, bindings: &SeedBindings)
    -> Result<EngineOutput, EngineError>;
}
