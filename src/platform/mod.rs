//! Platform abstraction for chat I/O.

pub mod traits;
pub mod types;

pub use traits::{ChatPlatform, CommandInvoker};
pub use types::{
    ChannelId, ChannelRef, GuildId, GuildRef, InvocationContext, MemberRef, MessageId, RoleId,
    UserId,
};
