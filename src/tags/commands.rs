//! Tag command surface — `tag <name> [args]` and the management subcommands.
//!
//! `TagService` is the assembly point: it owns the pipeline and routes every
//! inbound message either into the command group (explicit path) or the
//! cached fast filter (implicit path). Replies are best-effort sends; only
//! store failures propagate.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use regex::Regex;
use tracing::info;

use crate::config::TagConfig;
use crate::engine::{SeedBindings, SeedValue, TemplateEngine, seed_bindings};
use crate::error::{CommandError, Result};
use crate::pipeline::TagInvocationPipeline;
use crate::pipeline::dispatch::send_quietly;
use crate::platform::{ChatPlatform, CommandInvoker, InvocationContext};
use crate::store::TagStore;
use crate::tags::cache::TagNameCache;
use crate::tags::model::TagRecord;

/// Subcommand tokens (with aliases) that tag names may not shadow.
const RESERVED_NAMES: &[&str] = &[
    "add", "create", "+", "edit", "e", "remove", "delete", "-", "info", "raw", "list", "run",
    "execute", "process", "explain",
];

/// Block documentation shown by `tag explain`.
const TAG_DOCS: &str = "\
**Tags**
Stored templates are processed by the template engine on every invocation.

Seeded variables: `author`/`user` (invoker), `target`/`member` (first mention, \
defaulting to the invoker), `channel`, `guild`/`server`, and `args` (free text \
after the tag name).

Action blocks a template may emit: `delete` (remove the invoking message), \
`reactu`/`react` (reactions on the invoking/response message), `target` \
(`dm` or a channel to send to), `command` (run another command — the tag \
command itself is refused), `silent`, and `requires`/`blacklist` guards with \
an optional denial response.";

// ── Command parsing ─────────────────────────────────────────────────

/// One parsed `tag` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    Invoke { name: String, args: String },
    Add { name: String, template: String },
    Edit { name: String, template: String },
    Remove { name: String },
    Info { name: String },
    Raw { name: String },
    List,
    Run { template: String },
    Process { template: String },
    Explain,
}

impl TagCommand {
    /// Parse the content following the `tag` command token.
    pub fn parse(rest: &str) -> std::result::Result<Self, CommandError> {
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(CommandError::Usage("tag <name> [args]"));
        }

        let (head, tail) = match rest.split_once(' ') {
            Some((head, tail)) => (head, tail.trim_start()),
            None => (rest, ""),
        };

        let name_and_body = |usage| -> std::result::Result<(String, String), CommandError> {
            match tail.split_once(' ') {
                Some((name, body)) if !body.trim().is_empty() => {
                    Ok((name.to_string(), body.trim_start().to_string()))
                }
                _ => Err(CommandError::Usage(usage)),
            }
        };
        let name_only = |usage| -> std::result::Result<String, CommandError> {
            if tail.is_empty() || tail.contains(' ') {
                Err(CommandError::Usage(usage))
            } else {
                Ok(tail.to_string())
            }
        };

        match head {
            "add" | "create" | "+" => {
                let (name, template) = name_and_body("tag add <name> <template>")?;
                Ok(TagCommand::Add { name, template })
            }
            "edit" | "e" => {
                let (name, template) = name_and_body("tag edit <name> <template>")?;
                Ok(TagCommand::Edit { name, template })
            }
            "remove" | "delete" | "-" => Ok(TagCommand::Remove {
                name: name_only("tag remove <name>")?,
            }),
            "info" => Ok(TagCommand::Info {
                name: name_only("tag info <name>")?,
            }),
            "raw" => Ok(TagCommand::Raw {
                name: name_only("tag raw <name>")?,
            }),
            "list" => Ok(TagCommand::List),
            "run" | "execute" => {
                if tail.is_empty() {
                    return Err(CommandError::Usage("tag run <template>"));
                }
                Ok(TagCommand::Run {
                    template: tail.to_string(),
                })
            }
            "process" => {
                if tail.is_empty() {
                    return Err(CommandError::Usage("tag process <template>"));
                }
                Ok(TagCommand::Process {
                    template: tail.to_string(),
                })
            }
            "explain" => Ok(TagCommand::Explain),
            name => Ok(TagCommand::Invoke {
                name: name.to_string(),
                args: tail.to_string(),
            }),
        }
    }
}

/// Validate a tag name: bounded, no whitespace, no subcommand shadowing.
fn validate_name(name: &str) -> std::result::Result<(), CommandError> {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = NAME_RE.get_or_init(|| Regex::new(r"^\S{1,100}$").unwrap());

    if !re.is_match(name) {
        return Err(CommandError::InvalidName {
            name: name.to_string(),
            reason: "names are 1-100 characters without whitespace".into(),
        });
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(CommandError::InvalidName {
            name: name.to_string(),
            reason: "that word is reserved for a subcommand".into(),
        });
    }
    Ok(())
}

// ── Service ─────────────────────────────────────────────────────────

/// The tag subsystem's front door: command group plus message intercept.
pub struct TagService {
    store: Arc<dyn TagStore>,
    cache: Arc<TagNameCache>,
    engine: Arc<dyn TemplateEngine>,
    platform: Arc<dyn ChatPlatform>,
    pipeline: TagInvocationPipeline,
    config: TagConfig,
}

impl TagService {
    pub fn new(
        store: Arc<dyn TagStore>,
        cache: Arc<TagNameCache>,
        engine: Arc<dyn TemplateEngine>,
        platform: Arc<dyn ChatPlatform>,
        invoker: Arc<dyn CommandInvoker>,
        config: TagConfig,
    ) -> Self {
        let pipeline = TagInvocationPipeline::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&engine),
            Arc::clone(&platform),
            invoker,
            config.clone(),
        );
        Self {
            store,
            cache,
            engine,
            platform,
            pipeline,
            config,
        }
    }

    /// Hydrate the name cache from the store. Call once at startup.
    pub async fn hydrate(&self) -> Result<()> {
        self.cache.hydrate_all().await?;
        Ok(())
    }

    /// Message-create entry point. Routes `tag ...` content into the command
    /// group and everything else through the implicit fast filter.
    pub async fn on_message(&self, ctx: &InvocationContext, content: &str) -> Result<()> {
        let Some(rest) = content.strip_prefix(ctx.prefix.as_str()) else {
            return Ok(());
        };

        if let Some(sub) = rest.strip_prefix(&self.config.command_name)
            && (sub.is_empty() || sub.starts_with(' '))
            && !ctx.author_is_bot
        {
            return self.handle(ctx, sub).await;
        }

        self.pipeline.handle_message(ctx, content).await?;
        Ok(())
    }

    /// Execute one `tag` command. `rest` is the content after the command
    /// token. User-facing failures become replies; store failures propagate.
    pub async fn handle(&self, ctx: &InvocationContext, rest: &str) -> Result<()> {
        let command = match TagCommand::parse(rest) {
            Ok(command) => command,
            Err(e) => {
                self.reply(ctx, &e.to_string()).await;
                return Ok(());
            }
        };

        match command {
            TagCommand::Invoke { name, args } => {
                self.pipeline.invoke(ctx, &name, &args, true).await?;
                Ok(())
            }
            TagCommand::Add { name, template } => self.add(ctx, &name, template).await,
            TagCommand::Edit { name, template } => self.edit(ctx, &name, template).await,
            TagCommand::Remove { name } => self.remove(ctx, &name).await,
            TagCommand::Info { name } => self.info(ctx, &name).await,
            TagCommand::Raw { name } => self.raw(ctx, &name).await,
            TagCommand::List => self.list(ctx).await,
            TagCommand::Run { template } => self.run(ctx, &template).await,
            TagCommand::Process { template } => {
                self.pipeline.run_unstored(ctx, &template).await?;
                Ok(())
            }
            TagCommand::Explain => {
                self.reply(ctx, TAG_DOCS).await;
                Ok(())
            }
        }
    }

    async fn add(&self, ctx: &InvocationContext, name: &str, template: String) -> Result<()> {
        if let Err(e) = validate_name(name) {
            self.reply(ctx, &e.to_string()).await;
            return Ok(());
        }
        if self.store.get(ctx.guild.id, name).await?.is_some() {
            let e = CommandError::AlreadyExists {
                name: name.to_string(),
            };
            self.reply(ctx, &format!("{e}. Use `tag edit` to overwrite it."))
                .await;
            return Ok(());
        }

        self.store
            .put(TagRecord::new(ctx.guild.id, ctx.author.id, name, template))
            .await?;
        self.cache.refresh(ctx.guild.id).await?;

        info!(guild = %ctx.guild.id, name, owner = %ctx.author.id, "Tag stored");
        self.reply(ctx, &format!("Tag stored under the name `{name}`."))
            .await;
        Ok(())
    }

    async fn edit(&self, ctx: &InvocationContext, name: &str, template: String) -> Result<()> {
        let updated = self
            .store
            .mutate(
                ctx.guild.id,
                name,
                Box::new(move |tag| tag.template = template),
            )
            .await?;

        match updated {
            Some(_) => self.reply(ctx, &format!("Tag `{name}` edited.")).await,
            None => self.reply_not_found(ctx, name).await,
        }
        Ok(())
    }

    async fn remove(&self, ctx: &InvocationContext, name: &str) -> Result<()> {
        match self.store.remove(ctx.guild.id, name).await? {
            Some(_) => {
                self.cache.refresh(ctx.guild.id).await?;
                info!(guild = %ctx.guild.id, name, "Tag removed");
                self.reply(ctx, "Tag deleted.").await;
            }
            None => self.reply_not_found(ctx, name).await,
        }
        Ok(())
    }

    /// Remove every tag in the guild. Not reachable from the parsed command
    /// group; exposed for host-bot data management.
    pub async fn clear_guild(&self, ctx: &InvocationContext) -> Result<()> {
        self.store.clear(ctx.guild.id).await?;
        self.cache.evict(ctx.guild.id).await;
        info!(guild = %ctx.guild.id, "All tags cleared");
        Ok(())
    }

    async fn info(&self, ctx: &InvocationContext, name: &str) -> Result<()> {
        match self.store.get(ctx.guild.id, name).await? {
            Some(tag) => {
                let text = format!(
                    "`{}` Info\nOwner: <@!{}>\nUses: {}\nLength: {}\nCreated: {}",
                    tag.name,
                    tag.owner,
                    tag.uses,
                    tag.len(),
                    tag.created_at.format("%Y-%m-%d %H:%M UTC"),
                );
                self.reply(ctx, &text).await;
            }
            None => self.reply_not_found(ctx, name).await,
        }
        Ok(())
    }

    async fn raw(&self, ctx: &InvocationContext, name: &str) -> Result<()> {
        match self.store.get(ctx.guild.id, name).await? {
            Some(tag) => self.reply(ctx, &tag.template).await,
            None => self.reply_not_found(ctx, name).await,
        }
        Ok(())
    }

    async fn list(&self, ctx: &InvocationContext) -> Result<()> {
        let tags = self.store.get_all(ctx.guild.id).await?;
        if tags.is_empty() {
            self.reply(ctx, "There are no stored tags on this server.")
                .await;
            return Ok(());
        }

        let mut names: Vec<&String> = tags.keys().collect();
        names.sort();
        let lines: Vec<String> = names
            .iter()
            .map(|name| format!("`{}` - Created by <@!{}>", name, tags[*name].owner))
            .collect();
        self.reply(ctx, &lines.join("\n")).await;
        Ok(())
    }

    /// Debug execution: runs the engine directly and reports timing, actions,
    /// and output. Engine failures are always surfaced here, regardless of
    /// the normal-path policy.
    async fn run(&self, ctx: &InvocationContext, template: &str) -> Result<()> {
        let bindings: SeedBindings = {
            let mut seed = seed_bindings(ctx);
            seed.insert("args".into(), SeedValue::Text(String::new()));
            seed
        };

        let start = Instant::now();
        let result = self.engine.process(template, &bindings);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let report = match result {
            Ok(output) => {
                let mut report = format!("Executed in **{elapsed_ms:.3}** ms\nInput: {template}");
                if !output.actions.is_empty() {
                    report.push_str(&format!("\nActions: {:?}", output.actions));
                }
                report.push_str(&format!(
                    "\nOutput: {}",
                    output.body.as_deref().unwrap_or("NO OUTPUT")
                ));
                report
            }
            Err(e) => format!("Engine failed after **{elapsed_ms:.3}** ms\n{e}"),
        };
        self.reply(ctx, &report).await;
        Ok(())
    }

    async fn reply(&self, ctx: &InvocationContext, text: &str) {
        let text = crate::pipeline::truncate_chars(text, self.config.max_body_chars);
        send_quietly(&*self.platform, ctx.channel.id, Some(&text), None).await;
    }

    async fn reply_not_found(&self, ctx: &InvocationContext, name: &str) {
        let e = CommandError::NotFound {
            name: name.to_string(),
        };
        self.reply(ctx, &format!("{e}.")).await;
    }
}
