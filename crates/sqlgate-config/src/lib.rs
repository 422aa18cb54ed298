// crates/sqlgate-config/src/lib.rs
// ============================================================================
// Module: sqlgate Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for sqlgate.toml semantics.
// Dependencies: serde, toml, sqlgate-store-sqlite
// ============================================================================

//! ## Overview
//! `sqlgate-config` defines the configuration model for the gateway server
//! and CLI, with strict, fail-closed validation.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
