use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing required id columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Invalid value for parameter '{name}' ({value}): {reason}")]
    InvalidParameter {
        name:   String,
        value:  String,
        reason: String,
    },

    #[error("Dataset error at line {line}: {message}")]
    Dataset { line: usize, message: String },

    #[error("Baseline join failed for person {person_id}: {reason}")]
    BaselineJoin { person_id: i64, reason: String },

    #[error("Distribution statistic must be 1..=4, got {0}")]
    InvalidSelector(u8),

    #[error("Time budget exceeded during {stage}: {elapsed_ms}ms elapsed, limit {limit_ms}ms")]
    TimeBudgetExceeded {
        stage:      &'static str,
        elapsed_ms: u128,
        limit_ms:   u128,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// True for errors that only affect a single parameter field.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InvalidParameter { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
