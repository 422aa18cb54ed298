// crates/sqlgate-core/src/locator.rs
// ============================================================================
// Module: Store Locator
// Description: Maps validated tenant identifiers to store locations.
// Purpose: Keep every tenant store a direct child of one storage root.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The storage root is established once at startup and passed explicitly to
//! the gateway. [`StoreRoot::locate`] only accepts a [`TenantId`], so the
//! validator always runs before a location can be computed. The resulting
//! file name is derived from the identifier alone, which makes the mapping
//! injective and keeps every location inside the root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::identifiers::TenantId;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension appended to every tenant store file name.
pub const STORE_FILE_EXTENSION: &str = "db";

// ============================================================================
// SECTION: Storage Root
// ============================================================================

/// Canonical directory under which all tenant stores live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRoot {
    /// Absolute, canonicalized root directory.
    path: PathBuf,
}

impl StoreRoot {
    /// Creates the root directory if absent and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the directory cannot be
    /// created or resolved, or when the path is not a directory.
    pub fn establish(path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(path)
            .map_err(|err| StoreError::Unavailable(format!("storage root create failed: {err}")))?;
        let canonical = fs::canonicalize(path)
            .map_err(|err| StoreError::Unavailable(format!("storage root resolve failed: {err}")))?;
        if !canonical.is_dir() {
            return Err(StoreError::Unavailable("storage root is not a directory".to_string()));
        }
        Ok(Self {
            path: canonical,
        })
    }

    /// Returns the canonical root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the store location for a validated tenant identifier.
    #[must_use]
    pub fn locate(&self, tenant: &TenantId) -> StoreLocation {
        let file_name = format!("{}.{STORE_FILE_EXTENSION}", tenant.as_str());
        StoreLocation {
            path: self.path.join(file_name),
        }
    }
}

// ============================================================================
// SECTION: Store Location
// ============================================================================

/// On-disk location of one tenant store.
///
/// # Invariants
/// - Only constructed by [`StoreRoot::locate`]; always a direct child of the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreLocation {
    /// Full path to the store file.
    path: PathBuf,
}

impl StoreLocation {
    /// Returns the full path to the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
