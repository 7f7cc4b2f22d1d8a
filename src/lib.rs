//! tagflow — guild-scoped stored message templates invoked like commands.
//!
//! A tag is a named template stored per guild. Members invoke one with
//! `tag <name> [args]` or, after a cache hit, by typing the prefixed name
//! directly. Invocation runs the template through a pluggable engine and
//! dispatches the resulting body and action bundle: sends, deletes,
//! reactions, destination redirects (including DMs), guard checks, and
//! synthesized follow-up commands with recursion refused.
//!
//! The crate is platform-agnostic: hosts implement [`platform::ChatPlatform`]
//! and [`platform::CommandInvoker`] for their chat backend, pick a
//! [`store::TagStore`] backend, plug in an [`engine::TemplateEngine`], and
//! hand messages to [`tags::TagService::on_message`].

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod store;
pub mod tags;

pub use config::{EngineFailurePolicy, TagConfig};
pub use error::{Error, Result};
