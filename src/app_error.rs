use thiserror::Error;

use crate::api::EntityKind;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// A raw record could not be normalized. `index` is the record's position
    /// in its collection, when the fault is inside a record.
    #[error("malformed {kind} input{}: {reason}", record_suffix(.index))]
    MalformedInput {
        kind: EntityKind,
        index: Option<usize>,
        reason: String,
    },

    #[error("aggregation input table `{0}` is missing")]
    AggregationInputMissing(&'static str),

    #[error("{0} is unreachable")]
    ServiceUnreachable(String),

    #[error("storage error on `{name}`: {source}")]
    Storage {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tabular encoding failed for `{table}`: {source}")]
    Tabular {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn record_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" at record {i}")).unwrap_or_default()
}

impl AppError {
    pub fn malformed_document(kind: EntityKind, reason: impl Into<String>) -> Self {
        AppError::MalformedInput {
            kind,
            index: None,
            reason: reason.into(),
        }
    }

    pub fn malformed(kind: EntityKind, index: usize, reason: impl Into<String>) -> Self {
        AppError::MalformedInput {
            kind,
            index: Some(index),
            reason: reason.into(),
        }
    }
}
