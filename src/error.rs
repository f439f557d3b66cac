use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlHelperError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// A transactional operation failed and the transaction was rolled back.
    ///
    /// `source` is the failure that triggered the rollback. `rollback` is only
    /// set when the rollback itself failed as well.
    #[error("{}", transaction_message(source, rollback.as_deref()))]
    TransactionError {
        source: Box<SqlHelperError>,
        rollback: Option<Box<SqlHelperError>>,
    },

    #[error("Mapping error: column `{column}` holds {found}, expected {expected}")]
    MappingError {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl SqlHelperError {
    /// Wrap `source` after a rollback attempt. Pass the rollback failure, if any.
    #[must_use]
    pub fn rolled_back(source: SqlHelperError, rollback: Option<SqlHelperError>) -> Self {
        SqlHelperError::TransactionError {
            source: Box::new(source),
            rollback: rollback.map(Box::new),
        }
    }

    /// Short stable name of the variant, used as a structured logging field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlHelperError::ConfigError(_) => "config",
            SqlHelperError::ConnectionError(_) => "connection",
            SqlHelperError::ParameterError(_) => "parameter",
            SqlHelperError::ExecutionError(_) => "execution",
            SqlHelperError::TransactionError { .. } => "transaction",
            SqlHelperError::MappingError { .. } => "mapping",
        }
    }

    /// The error that started a transaction failure, or `self` for every other variant.
    #[must_use]
    pub fn root_cause(&self) -> &SqlHelperError {
        match self {
            SqlHelperError::TransactionError { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn transaction_message(source: &SqlHelperError, rollback: Option<&SqlHelperError>) -> String {
    match rollback {
        None => format!("Transaction rolled back: {source}"),
        Some(rollback) => {
            format!("Transaction rollback failed ({rollback}) after error: {source}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_failure_keeps_both_messages() {
        let err = SqlHelperError::rolled_back(
            SqlHelperError::ExecutionError("deadlock victim".into()),
            Some(SqlHelperError::ConnectionError("socket closed".into())),
        );
        let text = err.to_string();
        assert!(text.contains("deadlock victim"), "{text}");
        assert!(text.contains("socket closed"), "{text}");
        assert_eq!(err.kind(), "transaction");
        assert_eq!(err.root_cause().kind(), "execution");
    }

    #[test]
    fn clean_rollback_mentions_original_error() {
        let err = SqlHelperError::rolled_back(
            SqlHelperError::ExecutionError("constraint violated".into()),
            None,
        );
        assert_eq!(
            err.to_string(),
            "Transaction rolled back: SQL execution error: constraint violated"
        );
    }
}
