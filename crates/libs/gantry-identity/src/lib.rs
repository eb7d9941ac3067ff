//! Delegated identity construction for the gantry wallet bridge.
//!
//! The host wallet answers a connection request with an *identity package*:
//! short-lived secret key material plus a delegation chain proving the key
//! may act on behalf of the wallet's root identity. This crate validates
//! that package and turns it into a [`DelegatedIdentity`] the embedded
//! application can sign backend requests with — without ever seeing the
//! root's own key.
//!
//! Validation is strict and silent: an expired package, a stale package
//! (older than [`FRESHNESS_WINDOW_MS`]), or unparseable key material all
//! yield `None` and a debug log line. The caller decides whether to keep the
//! identity it already holds; packages are immutable and replaced wholesale
//! on renewal, never patched.

mod delegated;
mod package;

pub use delegated::{build, build_at, DelegatedIdentity};
pub use package::{Delegation, IdentityPackage, SecretMaterial, SignedDelegation};

/// How stale a package may be before it is rejected: `now - issued_at` must
/// not exceed this (inclusive at the boundary).
pub const FRESHNESS_WINDOW_MS: u64 = 2 * 60 * 60 * 1000;

pub(crate) fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
