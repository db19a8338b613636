use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("invalid batch: {0}")]
    InvalidBatch(#[from] divcode_importer::persist::BatchError),

    #[error(transparent)]
    Import(#[from] divcode_importer::ImporterError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use divcode_importer::persist::BatchError;

    #[test]
    fn test_batch_error_maps_to_invalid_batch() {
        let err = StoreError::from(BatchError::InvalidParent { row: 1, parent: 2 });
        assert!(matches!(err, StoreError::InvalidBatch(_)));
        assert_eq!(
            err.to_string(),
            "invalid batch: row 1 references parent 2, which does not precede it"
        );
    }
}
