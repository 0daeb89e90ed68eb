use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Dataset '{dataset}' is missing required column '{field}'")]
    MissingField { dataset: String, field: String },

    #[error("Dataset '{dataset}' row {row} has no usable value for '{field}'")]
    MissingValue {
        dataset: String,
        field: String,
        row: usize,
    },

    #[error("Invalid filter kind: '{kind}'")]
    InvalidFilterKind { kind: String },

    #[error("Filter '{kind}' requires payload field '{field}'")]
    MissingPayloadField { kind: String, field: String },

    #[error("Filter '{kind}' does not accept payload field '{field}'")]
    UnexpectedPayloadField { kind: String, field: String },

    #[error("Invalid value '{value}' for payload field '{field}': {reason}")]
    InvalidPayloadValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid action '{input}': {reason}")]
    InvalidAction { input: String, reason: String },

    #[error("Row {row} is out of range for table '{table}' ({len} rows)")]
    RowOutOfRange {
        table: String,
        row: usize,
        len: usize,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Caller can retry with different input; session state is untouched.
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DashboardError::InvalidAction { .. }
            | DashboardError::RowOutOfRange { .. }
            | DashboardError::InvalidPayloadValue { .. }
            | DashboardError::MissingPayloadField { .. }
            | DashboardError::UnexpectedPayloadField { .. } => ErrorSeverity::Low,
            DashboardError::InvalidFilterKind { .. } => ErrorSeverity::Medium,
            DashboardError::CsvError(_)
            | DashboardError::MissingField { .. }
            | DashboardError::MissingValue { .. }
            | DashboardError::SerializationError(_) => ErrorSeverity::High,
            DashboardError::IoError(_)
            | DashboardError::ConfigError { .. }
            | DashboardError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DashboardError::MissingField { dataset, field } => format!(
                "The extract '{}' cannot be trusted: column '{}' is missing",
                dataset, field
            ),
            DashboardError::MissingValue {
                dataset,
                field,
                row,
            } => format!(
                "The extract '{}' cannot be trusted: row {} has no '{}'",
                dataset, row, field
            ),
            DashboardError::IoError(e) => format!("Could not read or write a file: {}", e),
            DashboardError::CsvError(e) => format!("A CSV extract is malformed: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::MissingField { .. } | DashboardError::MissingValue { .. } => {
                "Regenerate the extracts with the upstream extraction process"
            }
            DashboardError::CsvError(_) => "Check that every extract is a valid comma-separated file",
            DashboardError::IoError(_) => {
                "Check --data-dir / SNIP_OUT_DIR and the extract prefix"
            }
            DashboardError::InvalidFilterKind { .. } => {
                "Use one of: all, snip, municipality, department, entity, status, inconsistency"
            }
            DashboardError::MissingPayloadField { .. }
            | DashboardError::UnexpectedPayloadField { .. }
            | DashboardError::InvalidPayloadValue { .. } => {
                "Pass exactly the key=value pairs the filter kind needs"
            }
            DashboardError::InvalidAction { .. } => {
                "Actions look like: reset, inconsistencies, filter:<kind>:k=v, select:<table>:<row>"
            }
            DashboardError::RowOutOfRange { .. } => "Pick a row index shown in the table",
            DashboardError::SerializationError(_) => "Retry without --json",
            DashboardError::ConfigError { .. }
            | DashboardError::InvalidConfigValueError { .. } => "Run with --help to review the options",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
