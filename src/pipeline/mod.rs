//! The tag invocation pipeline and its collaborators.

pub mod destination;
pub mod dispatch;
pub mod guard;
pub mod invocation;

#[cfg(test)]
pub(crate) mod testutil;

pub use destination::DestinationResolver;
pub use dispatch::{ActionDispatcher, DispatchOutcome};
pub use guard::{GuardEvaluator, GuardVerdict};
pub use invocation::{InvocationOutcome, TagInvocationPipeline};

/// Truncate to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
