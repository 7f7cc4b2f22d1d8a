//! Tag domain: records, action bundles, the name cache, and the command
//! surface.

pub mod cache;
pub mod commands;
pub mod model;

pub use cache::TagNameCache;
pub use commands::{TagCommand, TagService};
pub use model::{ActionBundle, GuardPolicy, TagRecord};
