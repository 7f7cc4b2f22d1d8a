//! Configuration types.

/// What to do when the template engine fails on the normal invocation path.
///
/// Debug commands (`tag run`) always surface engine diagnostics; this policy
/// only governs stored-tag invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailurePolicy {
    /// Send the engine's diagnostic text to the invocation channel.
    Report,
    /// Return the error to the caller's generic handler.
    Propagate,
}

/// Tag subsystem configuration.
#[derive(Debug, Clone)]
pub struct TagConfig {
    /// Name of the tag invocation command. Also the token the anti-recursion
    /// guard matches queued sub-commands against.
    pub command_name: String,
    /// Maximum response body length in characters.
    pub max_body_chars: usize,
    /// Engine failure handling on the normal invocation path.
    pub engine_failure_policy: EngineFailurePolicy,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            command_name: "tag".to_string(),
            max_body_chars: 2000,
            engine_failure_policy: EngineFailurePolicy::Report,
        }
    }
}
