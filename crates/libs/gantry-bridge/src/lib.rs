//! The gantry wallet bridge.
//!
//! An embedded trading client has exactly one trust link to the outside
//! world: a message channel to the host wallet process, with no delivery
//! guarantee, no request/response pairing, and no sandbox between the two.
//! This crate is that link:
//!
//! - [`channel`] — the duplex command channel: fire-and-forget outbound
//!   posts, signature-gated inbound dispatch, broadcast subscriptions
//! - [`session`] — the single-writer connection session (bind-once address
//!   and key, refresh-only renewal)
//! - `lifecycle` (internal) — connect retry loop plus liveness and
//!   expiry-renewal timers
//! - [`correlate`] — pending-request map pairing tagged responses with the
//!   futures awaiting them, under a bounded timeout
//! - [`bridge`] — the [`WalletBridge`] facade wiring it all together
//!
//! Trust failures (bad signatures, stale identity packages) are silent by
//! design: the offending message is dropped and logged, and the system
//! waits for a better one. Correlation failures surface as
//! [`BridgeError`]s on the calling flow.

pub mod bridge;
pub mod channel;
pub mod config;
pub mod correlate;
pub mod error;
mod lifecycle;
pub mod session;
pub mod stamp;

pub use bridge::{PayReceipt, TransactionProof, WalletBridge, WalletBridgeBuilder};
pub use channel::{BridgeEvent, HostPost};
pub use config::BridgeConfig;
pub use correlate::{reference_id, CorrelationEngine, PendingTicket};
pub use error::BridgeError;
pub use session::{ConnectionSession, Phase, SessionMode, SessionState};
pub use stamp::{FileStampStore, MemoryStampStore, StampStore};

pub(crate) fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
