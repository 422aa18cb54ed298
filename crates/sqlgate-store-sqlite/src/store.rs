// crates/sqlgate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Tenant Store
// Description: Open-or-create tenant databases and dispatch single statements.
// Purpose: Implement the sqlgate store traits over rusqlite.
// Dependencies: sqlgate-core, rusqlite, base64, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteTenantStore`] holds only configuration; it caches no connections.
//! [`SqliteTenantStore::acquire`] opens the tenant file with create semantics,
//! so a missing store is never an error. [`SqliteStoreHandle::dispatch`]
//! prepares the statement and asks the engine whether it yields result
//! columns: if so, all rows are read; otherwise the statement is executed and
//! a mutation summary returned.
//! Security posture: database contents and SQL text are untrusted. Every
//! connection refuses `ATTACH`/`DETACH` and allows zero attached databases,
//! so statements cannot open files outside the tenant store (this also
//! covers `VACUUM INTO`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rusqlite::Batch;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::fallible_iterator::FallibleIterator as _;
use rusqlite::hooks::AuthAction;
use rusqlite::hooks::AuthContext;
use rusqlite::hooks::Authorization;
use rusqlite::limits::Limit;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde_json::Number;
use serde_json::Value;
use sqlgate_core::MutationSummary;
use sqlgate_core::Row;
use sqlgate_core::StatementOutcome;
use sqlgate_core::StoreError;
use sqlgate_core::StoreHandle;
use sqlgate_core::StoreLocation;
use sqlgate_core::TenantStore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Diagnostic for SQL text that contains no statement.
const EMPTY_STATEMENT_MESSAGE: &str = "SQL text contains no statements";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// Rollback journal deleted after each transaction; one file per tenant.
    #[default]
    Delete,
    /// WAL journal mode.
    Wal,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Wal => "wal",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Connection settings applied to every tenant handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store path rejected by safety limits.
    #[error("sqlite store invalid path: {0}")]
    InvalidPath(String),
    /// Opening or creating the database failed.
    #[error("sqlite store open error: {0}")]
    Open(String),
    /// Applying connection pragmas failed.
    #[error("sqlite store pragma error: {0}")]
    Pragma(String),
    /// Installing the file-access restrictions failed.
    #[error("sqlite store confinement error: {0}")]
    Confine(String),
    /// The engine rejected or failed the statement.
    #[error("{0}")]
    Statement(String),
    /// Closing the connection failed.
    #[error("sqlite store close error: {0}")]
    Close(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::InvalidPath(message)
            | SqliteStoreError::Open(message)
            | SqliteStoreError::Pragma(message)
            | SqliteStoreError::Confine(message) => Self::Unavailable(message),
            SqliteStoreError::Statement(message) => Self::Statement(message),
            SqliteStoreError::Close(message) => Self::Release(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed tenant store. Holds configuration only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTenantStore {
    /// Connection settings.
    config: SqliteStoreConfig,
}

impl SqliteTenantStore {
    /// Creates a store backend with the provided settings.
    #[must_use]
    pub const fn new(config: SqliteStoreConfig) -> Self {
        Self {
            config,
        }
    }

    /// Opens the tenant database at `path`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe or the database
    /// cannot be opened and configured.
    pub fn open(&self, path: &Path) -> Result<SqliteStoreHandle, SqliteStoreError> {
        validate_store_path(path)?;
        let connection = open_connection(path, &self.config)?;
        Ok(SqliteStoreHandle {
            connection,
        })
    }
}

impl TenantStore for SqliteTenantStore {
    type Handle = SqliteStoreHandle;

    fn acquire(&self, location: &StoreLocation) -> Result<Self::Handle, StoreError> {
        self.open(location.path()).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// One open connection to a tenant database.
pub struct SqliteStoreHandle {
    /// Connection owned exclusively by one request.
    connection: Connection,
}

impl SqliteStoreHandle {
    /// Prepares and executes a single statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Statement`] carrying the engine diagnostic.
    /// Text with no statement (blank, comments, bare `;`) and text with more
    /// than one statement are rejected before anything runs.
    pub fn execute(&mut self, sql: &str) -> Result<StatementOutcome, SqliteStoreError> {
        let mut batch = Batch::new(&self.connection, sql);
        let Some(mut statement) = batch.next().map_err(statement_error)? else {
            return Err(SqliteStoreError::Statement(EMPTY_STATEMENT_MESSAGE.to_string()));
        };
        if batch.next().map_err(statement_error)?.is_some() {
            return Err(statement_error(rusqlite::Error::MultipleStatement));
        }
        if statement.column_count() > 0 {
            let columns: Vec<String> =
                statement.column_names().into_iter().map(str::to_string).collect();
            let mut rows = statement.query([]).map_err(statement_error)?;
            let mut collected = Vec::new();
            while let Some(row) = rows.next().map_err(statement_error)? {
                let mut record = Row::new();
                for (index, name) in columns.iter().enumerate() {
                    let value = row.get_ref(index).map_err(statement_error)?;
                    record.insert(name.clone(), json_value(value));
                }
                collected.push(record);
            }
            return Ok(StatementOutcome::Rows(collected));
        }
        let changes = statement.execute([]).map_err(statement_error)?;
        drop(statement);
        Ok(StatementOutcome::Mutation(MutationSummary {
            changes: u64::try_from(changes).unwrap_or(u64::MAX),
            last_insert_rowid: self.connection.last_insert_rowid(),
        }))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Close`] when `SQLite` refuses to close.
    pub fn close(self) -> Result<(), SqliteStoreError> {
        self.connection.close().map_err(|(_, err)| SqliteStoreError::Close(err.to_string()))
    }
}

impl StoreHandle for SqliteStoreHandle {
    fn dispatch(&mut self, sql: &str) -> Result<StatementOutcome, StoreError> {
        self.execute(sql).map_err(StoreError::from)
    }

    fn release(self) -> Result<(), StoreError> {
        self.close().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Wraps an engine error as a statement diagnostic.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn statement_error(error: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Statement(error.to_string())
}

/// Converts a `SQLite` value into JSON.
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::Number(number.into()),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::InvalidPath("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::InvalidPath(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::InvalidPath(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with create semantics.
fn open_connection(path: &Path, config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    confine_connection(&connection)?;
    Ok(connection)
}

/// Restricts the connection to its own database file.
fn confine_connection(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .set_limit(Limit::SQLITE_LIMIT_ATTACHED, 0)
        .map_err(|err| SqliteStoreError::Confine(err.to_string()))?;
    connection
        .authorizer(Some(authorize))
        .map_err(|err| SqliteStoreError::Confine(err.to_string()))
}

/// Authorizer callback: denies attaching or detaching databases.
fn authorize(context: AuthContext<'_>) -> Authorization {
    match context.action {
        AuthAction::Attach { .. } | AuthAction::Detach { .. } => Authorization::Deny,
        _ => Authorization::Allow,
    }
}

/// Applies per-connection pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Pragma(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Pragma(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Pragma(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Pragma(err.to_string()))?;
    Ok(())
}
