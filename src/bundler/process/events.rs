//! Build events reported by esbuild in watch mode.

use crate::bundler::error::MalformedEventError;
use serde::Deserialize;

/// Source position of a problem.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Location {
    /// File path as reported by esbuild (relative to the work dir)
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// Column as reported by esbuild
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A single error or warning of a build.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Problem {
    /// Human-readable message
    #[serde(rename = "text")]
    pub message: String,
    /// Where the problem was found, when known
    #[serde(default)]
    pub location: Option<Location>,
}

impl Problem {
    /// Creates a problem without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of one rebuild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Build produced output without errors
    Success,
    /// Build failed with at least one error
    Failure {
        /// Errors in reporting order
        problems: Vec<Problem>,
    },
}

/// One completed rebuild cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildEvent {
    /// Success or failure with problems
    pub outcome: BuildOutcome,
    /// Warnings reported during the cycle
    pub warnings: Vec<Problem>,
}

impl BuildEvent {
    pub(crate) fn from_problems(errors: Vec<Problem>, warnings: Vec<Problem>) -> Self {
        let outcome = if errors.is_empty() {
            BuildOutcome::Success
        } else {
            BuildOutcome::Failure { problems: errors }
        };
        Self { outcome, warnings }
    }

    /// Whether the build succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Success)
    }

    /// Errors of a failed build; empty on success.
    pub fn problems(&self) -> &[Problem] {
        match &self.outcome {
            BuildOutcome::Success => &[],
            BuildOutcome::Failure { problems } => problems,
        }
    }
}

/// Notification delivered to a [`BuildEventListener`](super::BuildEventListener).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// A rebuild finished
    Build(BuildEvent),
    /// A payload could not be decoded; the session keeps running
    Malformed(MalformedEventError),
}
