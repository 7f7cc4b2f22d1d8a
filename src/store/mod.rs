//! Persistent tag storage.

pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileStore;
pub use memory::MemoryTagStore;
pub use traits::{MutateFn, TagStore};
