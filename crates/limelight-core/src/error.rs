use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while resolving focus regions and applying decorations.
///
/// Only [`FocusError::Setup`] is meant to reach the user. Everything else is contained within a
/// single refresh cycle.
pub enum FocusError {
    #[error("line {line} is out of range (document has {line_count} lines)")]
    /// A line or position lies outside the current document.
    OutOfRange {
        /// The offending line.
        line: usize,
        /// Line count of the document at the time of the check.
        line_count: usize,
    },

    #[error("symbol provider unavailable: {0}")]
    /// The symbol provider failed; callers fall back to another strategy.
    ProviderUnavailable(String),

    #[error("stale snapshot: {reason}")]
    /// The document or selection changed underneath an in-flight computation.
    StaleSnapshot {
        /// Human-readable description of what changed.
        reason: &'static str,
    },

    #[error("setup failed: {0}")]
    /// Creating the dim style or wiring the host failed.
    Setup(String),

    #[error("invalid setting '{key}': {message}")]
    /// A configuration value could not be used.
    Config {
        /// Fully qualified setting key (e.g. `limelight.dimOpacity`).
        key: String,
        /// What was wrong with it.
        message: String,
    },
}
