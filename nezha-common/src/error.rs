use thiserror::Error;

/// Main error type for the Nezha exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field is not numeric: {0}")]
    TypeMismatch(String),

    #[error("Field registered twice: {0}")]
    DuplicateField(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ExporterError {
    /// Whether the error only affects a single server record.
    ///
    /// Record-level errors come from the upstream data and are expected;
    /// anything else points at the exporter itself.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            ExporterError::FieldNotFound(_) | ExporterError::TypeMismatch(_)
        )
    }
}

impl From<config::ConfigError> for ExporterError {
    fn from(error: config::ConfigError) -> Self {
        ExporterError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
