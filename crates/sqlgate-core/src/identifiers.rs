// crates/sqlgate-core/src/identifiers.rs
// ============================================================================
// Module: Tenant Identifiers
// Description: Generation and validation of opaque tenant identifiers.
// Purpose: Guarantee identifiers are safe to embed as a path segment.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! A [`TenantId`] is the only credential a client holds for its store. Fresh
//! identifiers are drawn from the operating system CSPRNG and rendered as
//! lowercase hex. Client-supplied identifiers are accepted only when every
//! character is a hex digit; nothing is trimmed or repaired. Because a
//! [`TenantId`] can only be obtained through [`TenantId::generate`] or
//! [`TenantId::parse`], any value of this type is safe to hand to the store
//! locator.
//! Security posture: identifier input is untrusted and is the sole path
//! traversal defense.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of random bytes backing a generated identifier.
pub const TENANT_ID_BYTES: usize = 8;
/// Length in characters of a generated identifier.
pub const TENANT_ID_LENGTH: usize = TENANT_ID_BYTES * 2;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Returns true when `candidate` is an acceptable tenant identifier.
///
/// Accepts iff the input is non-empty and every character is an ASCII hex
/// digit (either case). Pure and total.
#[must_use]
pub fn is_valid_tenant_id(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|byte| byte.is_ascii_hexdigit())
}

// ============================================================================
// SECTION: Identifier Type
// ============================================================================

/// Validated tenant identifier.
///
/// # Invariants
/// - Non-empty and composed only of ASCII hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Generates a fresh identifier from the OS entropy source.
    ///
    /// Entropy failure aborts via the RNG; it is not a recoverable condition.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TENANT_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex_encode(&bytes))
    }

    /// Parses a client-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTenantId`] when the input fails [`is_valid_tenant_id`].
    pub fn parse(candidate: &str) -> Result<Self, InvalidTenantId> {
        if is_valid_tenant_id(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(InvalidTenantId)
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rejection returned for identifiers outside the hex alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid tenant identifier")]
pub struct InvalidTenantId;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[usize::from(byte >> 4)] as char);
        out.push(HEX[usize::from(byte & 0x0f)] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
