use std::sync::Arc;

use gantry_wire::{GenericResponse, LedgerActor, OutboundCommand, PayResponse, Recipient};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::channel::{BridgeEvent, CommandChannel, HostPost};
use crate::config::BridgeConfig;
use crate::correlate::{reference_id, CorrelationEngine};
use crate::error::BridgeError;
use crate::lifecycle;
use crate::session::{ConnectionSession, Phase, SessionState};
use crate::stamp::{MemoryStampStore, StampStore};

/// A settled payment, with the txid glue the claim flow correlates on.
#[derive(Clone, Debug)]
pub struct PayReceipt {
    response: PayResponse,
}

impl PayReceipt {
    pub fn response(&self) -> &PayResponse {
        &self.response
    }

    /// The canonical id of the transaction the wallet reports having sent —
    /// the key that matches this payment to its pending claim once the
    /// indexer has an inclusion proof.
    pub fn txid(&self) -> Option<String> {
        self.response.raw_tx_hex.as_deref().and_then(gantry_crypto::compute_txid)
    }

    pub fn transfer_outcome(&self) -> Option<&Value> {
        self.response.transfer_outcome.as_ref()
    }
}

/// Raw transaction plus inclusion proof, with the host's not-found
/// sentinels normalized to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionProof {
    pub tx_hex: Option<String>,
    pub proof_hex: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    match field.as_deref() {
        None | Some("") | Some("not_found") => None,
        Some(_) => field,
    }
}

impl From<GenericResponse> for TransactionProof {
    fn from(response: GenericResponse) -> Self {
        Self { tx_hex: present(response.tx_hex), proof_hex: present(response.bump_hex) }
    }
}

/// Configure and launch a [`WalletBridge`].
#[derive(Default)]
pub struct WalletBridgeBuilder {
    config: BridgeConfig,
    stamps: Option<Arc<dyn StampStore>>,
    ledger: Option<Arc<dyn LedgerActor>>,
}

impl WalletBridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Where the last-connected stamp persists. Defaults to in-memory.
    pub fn stamp_store(mut self, stamps: Arc<dyn StampStore>) -> Self {
        self.stamps = Some(stamps);
        self
    }

    /// Backend actor to hand the delegated identity to as it is (re)built.
    pub fn ledger(mut self, ledger: Arc<dyn LedgerActor>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Wire everything up and start the reader and lifecycle tasks.
    pub fn spawn(
        self,
        post: Arc<dyn HostPost>,
        inbound: mpsc::UnboundedReceiver<Value>,
    ) -> WalletBridge {
        let stamps = self.stamps.unwrap_or_else(|| Arc::new(MemoryStampStore::default()));
        let session = Arc::new(SessionState::new(stamps));
        let engine = Arc::new(CorrelationEngine::new());
        let channel = Arc::new(CommandChannel::new(
            post,
            Arc::clone(&session),
            Arc::clone(&engine),
            self.config.event_capacity,
            self.ledger,
        ));
        let cancel = CancellationToken::new();

        channel.spawn_reader(inbound, cancel.child_token());
        lifecycle::spawn(
            Arc::clone(&channel),
            Arc::clone(&session),
            self.config.clone(),
            cancel.child_token(),
        );

        WalletBridge { channel, session, engine, config: self.config, cancel }
    }
}

/// The embedded client's handle to the host wallet.
///
/// Construction immediately begins connection acquisition; observe progress
/// via [`WalletBridge::phase`] or [`WalletBridge::subscribe`]. Dropping the
/// bridge (or calling [`WalletBridge::disconnect`]) cancels the reader and
/// all timers.
pub struct WalletBridge {
    channel: Arc<CommandChannel>,
    session: Arc<SessionState>,
    engine: Arc<CorrelationEngine>,
    config: BridgeConfig,
    cancel: CancellationToken,
}

impl WalletBridge {
    pub fn builder() -> WalletBridgeBuilder {
        WalletBridgeBuilder::new()
    }

    /// Request a payment and wait for the host's verdict.
    ///
    /// Suspends until the matching `pay-response` arrives or the payment
    /// timeout (long: the user may be reviewing the request in the wallet
    /// UI) elapses. A response with `success: false` rejects with the
    /// host's message and code.
    pub async fn request_payment(
        &self,
        token: &str,
        recipients: Vec<Recipient>,
    ) -> Result<PayReceipt, BridgeError> {
        let reference = reference_id("pay");
        let ticket = self.engine.register(&reference)?;
        self.channel.send(&OutboundCommand::Pay {
            reference,
            token: token.to_string(),
            recipients,
        });
        let payload = self.engine.wait(ticket, self.config.pay_timeout()).await?;
        let response: PayResponse = serde_json::from_value(payload)
            .map_err(|err| BridgeError::invalid(format!("malformed pay-response: {err}")))?;
        Ok(PayReceipt { response })
    }

    /// Fetch a transaction's raw bytes and inclusion proof by txid.
    pub async fn fetch_transaction(&self, txid: &str) -> Result<TransactionProof, BridgeError> {
        let reference = reference_id("tx");
        let ticket = self.engine.register(&reference)?;
        self.channel.send(&OutboundCommand::FullTransaction {
            txid: txid.to_string(),
            reference,
        });
        let payload = self.engine.wait(ticket, self.config.lookup_timeout()).await?;
        let response: GenericResponse = serde_json::from_value(payload)
            .map_err(|err| BridgeError::invalid(format!("malformed lookup response: {err}")))?;
        Ok(response.into())
    }

    /// Ask the host to copy text to the user's clipboard.
    pub fn write_clipboard(&self, text: impl Into<String>) {
        self.channel.send(&OutboundCommand::WriteClipboard { text: text.into() });
    }

    /// Ask the host to open a URL outside the embedded frame.
    pub fn open_link(&self, url: impl Into<String>) {
        self.channel.send(&OutboundCommand::OpenLink { text: url.into() });
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn session(&self) -> Option<ConnectionSession> {
        self.session.snapshot()
    }

    pub fn identity(&self) -> Option<Arc<gantry_identity::DelegatedIdentity>> {
        self.session.identity()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.channel.subscribe()
    }

    /// Tear down: clear the session and identity and cancel every task.
    /// The connect loop is not restarted — build a new bridge to reconnect.
    pub fn disconnect(&self) {
        log::debug!("bridge: disconnecting");
        self.session.disconnect();
        self.cancel.cancel();
    }
}

impl Drop for WalletBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
