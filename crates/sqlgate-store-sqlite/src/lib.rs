// crates/sqlgate-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Tenant Store
// Description: Per-tenant SQLite stores behind the sqlgate store traits.
// Purpose: Open-or-create tenant databases and execute one statement each.
// Dependencies: sqlgate-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a `SQLite`-backed [`sqlgate_core::TenantStore`]. Every
//! acquisition opens a fresh connection to the tenant's database file,
//! creating it if absent, and every release closes it. Statements are
//! classified by the prepared statement's column count, never by SQL text.
//! Security posture: SQL text is untrusted but confined to the tenant's own
//! database file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreHandle;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteTenantStore;
