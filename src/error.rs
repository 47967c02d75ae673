//! Error types for the schema explorer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Failures local to one table or one entity type are represented here too, but they
//! are absorbed and logged by the catalog, graph and search code rather than returned.
//! Only query rejections, unknown filters and "no table could be searched" reach
//! the caller as request-level errors.

use thiserror::Error;

/// Structured rejection reason for the query gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRejectionKind {
    NotASelect,
    ForbiddenKeyword,
    ExecutionFailed,
}

impl QueryRejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotASelect => "NotASelect",
            Self::ForbiddenKeyword => "ForbiddenKeyword",
            Self::ExecutionFailed => "ExecutionFailed",
        }
    }
}

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Column reflection failed for table '{table}': {message}")]
    ReflectionFailed { table: String, message: String },

    #[error("Entity metadata unavailable for '{entity_type}': {message}")]
    MetadataUnavailable {
        entity_type: String,
        message: String,
    },

    #[error("Entity type not found: {entity_type}")]
    EntityTypeNotFound { entity_type: String },

    #[error("Scan of table '{table}' exceeded {elapsed_ms}ms")]
    ScanTimeout { table: String, elapsed_ms: u64 },

    #[error("Scan of table '{table}' failed: {message}")]
    ScanFailed { table: String, message: String },

    #[error("No tables could be searched ({failed} scan(s) failed)")]
    NoSearchableTables { failed: usize },

    #[error("Only SELECT queries are allowed")]
    NotASelect,

    #[error("Query contains forbidden keyword: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Query execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ExplorerError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn reflection_failed(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReflectionFailed {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn metadata_unavailable(
        entity_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MetadataUnavailable {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    pub fn entity_type_not_found(entity_type: impl Into<String>) -> Self {
        Self::EntityTypeNotFound {
            entity_type: entity_type.into(),
        }
    }

    pub fn scan_timeout(table: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::ScanTimeout {
            table: table.into(),
            elapsed_ms,
        }
    }

    pub fn scan_failed(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScanFailed {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn forbidden_keyword(keyword: impl Into<String>) -> Self {
        Self::ForbiddenKeyword {
            keyword: keyword.into(),
        }
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::NotASelect => Some("Start the query with SELECT"),
            Self::ForbiddenKeyword { .. } => {
                Some("Remove data-modifying keywords; only read-only queries are accepted")
            }
            Self::NoSearchableTables { .. } => {
                Some("Check table permissions or raise the per-table scan timeout")
            }
            _ => None,
        }
    }

    /// Structured rejection kind for errors produced by the query gate.
    pub fn rejection_kind(&self) -> Option<QueryRejectionKind> {
        match self {
            Self::NotASelect => Some(QueryRejectionKind::NotASelect),
            Self::ForbiddenKeyword { .. } => Some(QueryRejectionKind::ForbiddenKeyword),
            Self::ExecutionFailed { .. } => Some(QueryRejectionKind::ExecutionFailed),
            _ => None,
        }
    }
}

/// Convert sqlx errors to ExplorerError.
impl From<sqlx::Error> for ExplorerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => ExplorerError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ExplorerError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => ExplorerError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => ExplorerError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                ExplorerError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => ExplorerError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => ExplorerError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => ExplorerError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                ExplorerError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => {
                ExplorerError::internal(format!("Decode error: {}", source))
            }
            sqlx::Error::WorkerCrashed => ExplorerError::internal("Database worker crashed"),
            _ => ExplorerError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for explorer operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Error data for an explorer error: its suggestion and, for query
/// rejections, the rejection kind and offending keyword.
fn error_data(err: &ExplorerError) -> Option<serde_json::Value> {
    let mut data = serde_json::Map::new();
    if let Some(suggestion) = err.suggestion() {
        data.insert("suggestion".into(), suggestion.into());
    }
    if let Some(kind) = err.rejection_kind() {
        data.insert("rejection".into(), kind.as_str().into());
    }
    if let ExplorerError::ForbiddenKeyword { keyword } = err {
        data.insert("keyword".into(), keyword.as_str().into());
    }
    (!data.is_empty()).then_some(serde_json::Value::Object(data))
}

/// Convert ExplorerError to MCP ErrorData for semantic error categorization.
impl From<ExplorerError> for rmcp::ErrorData {
    fn from(err: ExplorerError) -> Self {
        let data = error_data(&err);
        match &err {
            ExplorerError::InvalidInput { .. }
            | ExplorerError::NotASelect
            | ExplorerError::ForbiddenKeyword { .. }
            | ExplorerError::ExecutionFailed { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }

            ExplorerError::Database {
                message, sql_state, ..
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, data)
            }

            ExplorerError::EntityTypeNotFound { .. } => {
                rmcp::ErrorData::resource_not_found(err.to_string(), data)
            }

            ExplorerError::Timeout { .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                suggestion_data(Some(
                    "Consider increasing the timeout or narrowing the query",
                )),
            ),

            _ => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
