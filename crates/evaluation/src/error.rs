//! Error types for evaluation runs.

use std::path::PathBuf;

use thiserror::Error;

/// Evaluation error types
#[derive(Error, Debug)]
pub enum EvalError {
    /// Required environment variables are unset or empty
    #[error("Missing required environment variables: {}. Please source the environment setup first", names.join(", "))]
    MissingEnv { names: Vec<String> },

    /// Environment variable present but malformed
    #[error("Invalid value '{value}' for {name}: {message}")]
    InvalidEnv {
        name: String,
        value: String,
        message: String,
    },

    /// Evaluator process could not be started
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Evaluator exited unsuccessfully
    #[error("Leaderboard evaluator exited with {status}")]
    EvaluatorFailed { status: String },

    /// Checkpoint file unreadable or malformed
    #[error("Failed to read checkpoint {}: {message}", path.display())]
    Checkpoint { path: PathBuf, message: String },

    /// Simulator façade error during a drive
    #[error(transparent)]
    Simulator(#[from] simulator::FacadeError),

    /// Rendering error during a drive
    #[error(transparent)]
    Render(#[from] renderer::RenderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvalError {
    pub fn invalid_env(
        name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidEnv {
            name: name.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn checkpoint(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_lists_every_name() {
        let err = EvalError::MissingEnv {
            names: vec!["CARLA_ROOT".into(), "LEADERBOARD_ROOT".into()],
        };
        let text = err.to_string();
        assert!(text.contains("CARLA_ROOT, LEADERBOARD_ROOT"));
    }
}
