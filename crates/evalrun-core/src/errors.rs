//! Error types for planning, scoring and suite configuration.

use std::path::PathBuf;

/// Errors raised by the planning and scoring engine.
///
/// The first three variants are configuration errors: they are raised while a
/// declaration is expanded, before anything executes, and abort the whole call.
/// The rest happen inside a single execution and end up on its run record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Two eval cases resolved to the same id.
    #[error("eval id \"{eval_id}\" is duplicated in task \"{task}\"")]
    DuplicateEvalId { eval_id: String, task: String },

    /// A matrix entry is not a non-empty list.
    #[error("matrix entry \"{key}\" must be a non-empty array for task \"{task}\"")]
    InvalidMatrix { key: String, task: String },

    /// A scorer name is set but neither registry knows it.
    #[error("scorer \"{scorer}\" is not registered for task \"{task}\"")]
    UnknownScorer { scorer: String, task: String },

    /// A scorer returned something that is not a valid score result.
    #[error("scorer \"{scorer}\" {reason}")]
    ScorerContract { scorer: String, reason: String },

    /// A built-in scorer received a value of the wrong shape.
    #[error("expected {label} to be {expected}")]
    TypeMismatch {
        label: &'static str,
        expected: &'static str,
    },
}

impl EvalError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEvalId { .. } | Self::InvalidMatrix { .. } | Self::UnknownScorer { .. }
        )
    }

    /// Stable kind name, used as the `name` of captured run errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateEvalId { .. } => "DuplicateEvalId",
            Self::InvalidMatrix { .. } => "InvalidMatrix",
            Self::UnknownScorer { .. } => "UnknownScorer",
            Self::ScorerContract { .. } => "ScorerContract",
            Self::TypeMismatch { .. } => "TypeMismatch",
        }
    }
}

/// Suite file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read suite {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suite {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported suite version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("suite {path} has no evals")]
    NoEvals { path: PathBuf },

    #[error("failed to write sample suite {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
