//! Hashing and signature primitives for the gantry wallet bridge.
//!
//! Everything in this crate is a pure function over its inputs:
//!
//! - [`canonical_digest`] — deterministic SHA-256 over a canonical JSON
//!   serialization, the exact bytes both ends of the bridge sign and verify
//! - [`verify_signature`] — secp256k1 ECDSA check of a host-wallet signature
//!   against that digest
//! - [`compute_txid`] — double-SHA-256, byte-reversed transaction identifier
//!   in the display form the downstream indexer uses
//!
//! None of these raise: malformed input maps to `false`/`None`. The trust
//! decision (drop, log, retry) belongs to the caller.

mod canonical;
mod txid;
mod verify;

pub use canonical::canonical_digest;
pub use txid::compute_txid;
pub use verify::verify_signature;
