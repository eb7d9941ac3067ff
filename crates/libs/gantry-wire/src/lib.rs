//! Boundary types for the gantry wallet bridge.
//!
//! This crate defines the wire contract between the embedded trading client
//! and its host wallet process, plus the contract with the backend ledger.
//! It provides:
//!
//! - **Outbound command shapes** ([`OutboundCommand`]) posted to the host,
//!   fire-and-forget
//! - **Inbound envelope and payloads** ([`InboundEnvelope`],
//!   [`ConnectionResponse`], [`PayResponse`], [`GenericResponse`]) parsed
//!   from untrusted structured data
//! - **[`LedgerActor`]** — the async boundary trait for the backend ledger,
//!   with [`StubLedger`] returning `NotImplemented` for every method
//! - **[`ActorError`]** with a `NotImplemented` variant for incremental
//!   development
//!
//! The bridge itself (signature gating, session state, correlation) lives in
//! `gantry-bridge`; nothing here performs cryptography.

pub mod actor;
pub mod envelope;
pub mod error;

pub use actor::{ClaimOutcome, LedgerActor, OrderAck, OrderRequest, OrderSide, StubLedger};
pub use envelope::{
    kind, ConnectionResponse, GenericResponse, InboundEnvelope, OutboundCommand, PayResponse,
    Recipient, WalletInfo,
};
pub use error::ActorError;
