use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemuxError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot open {role} '{path}': {source}")]
    OpenInputError {
        role: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output file '{path}': {source}")]
    DestinationError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interval line {line}: {message}")]
    IntervalLineError { line: u64, message: String },

    #[error("{}", record_error_text(.line, .field, .value, .reason))]
    RecordParseError {
        line: Option<u64>,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

fn record_error_text(line: &Option<u64>, field: &str, value: &str, reason: &str) -> String {
    match line {
        Some(line) => format!("Input line {}: bad {} '{}': {}", line, field, value, reason),
        None => format!("Bad {} '{}': {}", field, value, reason),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Input,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DemuxError {
    pub fn record(field: &str, value: &str, reason: impl Into<String>) -> Self {
        DemuxError::RecordParseError {
            line: None,
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Attaches the 1-based input line number to a record parse failure.
    pub fn at_line(self, line_number: u64) -> Self {
        match self {
            DemuxError::RecordParseError {
                field,
                value,
                reason,
                ..
            } => DemuxError::RecordParseError {
                line: Some(line_number),
                field,
                value,
                reason,
            },
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DemuxError::IoError(_) | DemuxError::CsvError(_) => ErrorCategory::Io,
            DemuxError::ConfigError { .. }
            | DemuxError::ConfigValidationError { .. }
            | DemuxError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DemuxError::OpenInputError { .. }
            | DemuxError::IntervalLineError { .. }
            | DemuxError::RecordParseError { .. } => ErrorCategory::Input,
            DemuxError::DestinationError { .. } => ErrorCategory::Output,
            DemuxError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DemuxError::IntervalLineError { .. } => ErrorSeverity::Low,
            DemuxError::ConfigError { .. }
            | DemuxError::ConfigValidationError { .. }
            | DemuxError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            DemuxError::RecordParseError { .. } | DemuxError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            DemuxError::IoError(_)
            | DemuxError::CsvError(_)
            | DemuxError::OpenInputError { .. }
            | DemuxError::DestinationError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Only malformed interval lines are skipped; everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        self.severity() > ErrorSeverity::Low
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DemuxError::IoError(_) | DemuxError::CsvError(_) => {
                "Check that the files are readable and the disk is not full"
            }
            DemuxError::ConfigError { .. }
            | DemuxError::ConfigValidationError { .. }
            | DemuxError::InvalidConfigValueError { .. } => {
                "Review the command line flags or the TOML run file"
            }
            DemuxError::OpenInputError { .. } => {
                "Check the --filein / --intervals paths and file permissions"
            }
            DemuxError::DestinationError { .. } => {
                "Check that --output-path exists and is writable"
            }
            DemuxError::IntervalLineError { .. } => {
                "Use 'id,dd-mm-yyyy HH:MM[:SS],dd-mm-yyyy HH:MM[:SS]' with start before end"
            }
            DemuxError::RecordParseError { .. } => {
                "Fix or remove the offending input line; run with --test to inspect column positions"
            }
            DemuxError::ProcessingError { .. } => "Re-run with --verbose and inspect the log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DemuxError::OpenInputError { role, path, .. } => {
                format!("Could not open the {} '{}'", role, path)
            }
            DemuxError::DestinationError { path, .. } => {
                format!("Could not create the output file '{}'", path)
            }
            DemuxError::RecordParseError { .. } => {
                format!("The input data file contains a malformed line. {}", self)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DemuxError>;
