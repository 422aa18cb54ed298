// crates/sqlgate-core/src/interfaces.rs
// ============================================================================
// Module: Store Interfaces
// Description: Backend-agnostic tenant store traits and scoped handle lease.
// Purpose: Pair every handle acquisition with exactly one release.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`TenantStore`] opens (creating if absent) the store at a
//! [`StoreLocation`] and yields a [`StoreHandle`]. Handles are wrapped in a
//! [`StoreLease`], which releases the handle exactly once: explicitly through
//! [`StoreLease::release`], or from `Drop` when the scope is left early or
//! unwinds. [`with_store`] is the scoped entry point the gateway uses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::locator::StoreLocation;
use crate::outcome::StatementOutcome;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Store backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Environment-level failure opening or creating a store.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The engine rejected or failed the statement.
    #[error("{0}")]
    Statement(String),
    /// Releasing the handle failed.
    #[error("store release failed: {0}")]
    Release(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Opens tenant stores on demand.
pub trait TenantStore: Send + Sync {
    /// Handle type produced by this backend.
    type Handle: StoreHandle;

    /// Opens the store at `location`, creating an empty store if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] for environment-level failures only.
    fn acquire(&self, location: &StoreLocation) -> Result<Self::Handle, StoreError>;
}

/// Request-scoped connection to a single tenant store.
pub trait StoreHandle {
    /// Prepares and executes one statement, classifying it by the prepared
    /// statement's own result shape.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Statement`] with the engine diagnostic.
    fn dispatch(&mut self, sql: &str) -> Result<StatementOutcome, StoreError>;

    /// Closes the handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Release`] when the engine refuses to close.
    fn release(self) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Scoped Lease
// ============================================================================

/// Owns an acquired handle and guarantees its release.
pub struct StoreLease<H: StoreHandle> {
    /// Live handle; `None` once released.
    handle: Option<H>,
}

impl<H: StoreHandle> StoreLease<H> {
    /// Acquires a handle from `store` for `location`.
    ///
    /// # Errors
    ///
    /// Propagates the backend acquisition error.
    pub fn acquire<S>(store: &S, location: &StoreLocation) -> Result<Self, StoreError>
    where
        S: TenantStore<Handle = H>,
    {
        let handle = store.acquire(location)?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Dispatches one statement on the leased handle.
    ///
    /// # Errors
    ///
    /// Returns the backend statement error.
    pub fn dispatch(&mut self, sql: &str) -> Result<StatementOutcome, StoreError> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| StoreError::Release("store handle already released".to_string()))?;
        handle.dispatch(sql)
    }

    /// Releases the handle and reports the backend close result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Release`] when the backend close fails.
    pub fn release(mut self) -> Result<(), StoreError> {
        self.handle.take().map_or(Ok(()), StoreHandle::release)
    }
}

impl<H: StoreHandle> Drop for StoreLease<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.release();
        }
    }
}

/// Runs `scope` against a freshly leased handle and always releases it.
///
/// A statement failure takes precedence over a release failure.
///
/// # Errors
///
/// Returns the acquisition, scope, or release error.
pub fn with_store<S, T, F>(store: &S, location: &StoreLocation, scope: F) -> Result<T, StoreError>
where
    S: TenantStore,
    F: FnOnce(&mut StoreLease<S::Handle>) -> Result<T, StoreError>,
{
    let mut lease = StoreLease::acquire(store, location)?;
    let result = scope(&mut lease);
    let released = lease.release();
    match (result, released) {
        (Err(err), _) | (Ok(_), Err(err)) => Err(err),
        (Ok(value), Ok(())) => Ok(value),
    }
}
