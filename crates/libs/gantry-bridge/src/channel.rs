use std::sync::Arc;

use gantry_crypto::verify_signature;
use gantry_wire::{
    kind, ConnectionResponse, GenericResponse, InboundEnvelope, LedgerActor, OutboundCommand,
    PayResponse,
};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::correlate::CorrelationEngine;
use crate::error::BridgeError;
use crate::session::{Applied, SessionState};

/// Outbound half of the host transport: post a message to the parent
/// context, fire-and-forget. No acknowledgment and no delivery guarantee.
pub trait HostPost: Send + Sync {
    fn post(&self, message: Value) -> Result<(), BridgeError>;
}

impl HostPost for mpsc::UnboundedSender<Value> {
    fn post(&self, message: Value) -> Result<(), BridgeError> {
        self.send(message).map_err(|_| BridgeError::transport("host channel closed"))
    }
}

/// Verified inbound traffic, broadcast to subscribers. Dropping the
/// receiver unsubscribes.
#[derive(Clone, Debug)]
pub enum BridgeEvent {
    /// A session was bound for the first time.
    Connected(crate::session::ConnectionSession),
    /// An already-bound session was renewed.
    Refreshed(crate::session::ConnectionSession),
    Pay(PayResponse),
    Transaction(GenericResponse),
}

/// The duplex command channel between the embedded client and the host
/// wallet.
///
/// Outbound commands are serialized and posted without return. Inbound
/// messages pass the envelope check and the per-type signature policy
/// before anything else sees them:
///
/// - `connection-response` is self-certifying (first trusted message) and
///   may be anonymous, which skips verification by design;
/// - every other type verifies against the *previously bound* session key,
///   never a key carried in the message itself.
///
/// Messages failing any gate are dropped and logged; callers cannot tell a
/// dropped message from one that never arrived.
pub struct CommandChannel {
    post: Arc<dyn HostPost>,
    session: Arc<SessionState>,
    engine: Arc<CorrelationEngine>,
    events: broadcast::Sender<BridgeEvent>,
    ledger: Option<Arc<dyn LedgerActor>>,
}

impl CommandChannel {
    pub(crate) fn new(
        post: Arc<dyn HostPost>,
        session: Arc<SessionState>,
        engine: Arc<CorrelationEngine>,
        event_capacity: usize,
        ledger: Option<Arc<dyn LedgerActor>>,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self { post, session, engine, events, ledger }
    }

    /// Serialize and post a command. Transport failures are logged here and
    /// go no further — the worst outcome of a lost command is a retry or a
    /// timeout upstream.
    pub fn send(&self, command: &OutboundCommand) {
        let message = match serde_json::to_value(command) {
            Ok(message) => message,
            Err(err) => {
                log::error!("channel: failed to serialize '{}': {err}", command.kind());
                return;
            }
        };
        log::trace!("channel: >> {}", command.kind());
        if let Err(err) = self.post.post(message) {
            log::warn!("channel: dropping outbound '{}': {err}", command.kind());
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Consume inbound messages until cancelled or the transport closes.
    pub(crate) fn spawn_reader(
        self: &Arc<Self>,
        mut inbound: mpsc::UnboundedReceiver<Value>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    message = inbound.recv() => match message {
                        Some(message) => channel.dispatch(message).await,
                        None => break,
                    },
                }
            }
            log::trace!("channel: reader stopped");
        })
    }

    pub(crate) async fn dispatch(&self, raw: Value) {
        let Some(envelope) = InboundEnvelope::parse(&raw) else {
            log::debug!("channel: ignoring message without an envelope shape");
            return;
        };
        log::trace!("channel: << {}", envelope.kind);
        if envelope.kind == kind::CONNECTION_RESPONSE {
            self.handle_connection(envelope).await;
        } else {
            self.handle_signed(envelope);
        }
    }

    async fn handle_connection(&self, envelope: InboundEnvelope) {
        let response: ConnectionResponse = match serde_json::from_value(envelope.payload.clone()) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("channel: malformed connection-response: {err}");
                return;
            }
        };

        if response.anonymous {
            let applied = self.session.apply_anonymous();
            self.publish_session(applied);
            return;
        }

        let Some(wallet) = response.wallet else {
            log::warn!("channel: connection-response carries neither wallet nor anonymous flag");
            return;
        };
        let Some(signature) = envelope.signature.as_deref() else {
            log::warn!("channel: unsigned connection-response dropped");
            return;
        };
        // Self-certifying: the first trusted message proves possession of
        // the key it names; later messages are held to this bound key.
        if !verify_signature(&envelope.payload, signature, &wallet.public_key_hex) {
            log::warn!("channel: connection-response failed signature verification");
            return;
        }

        let Some(package) = response.ic_identity_package else {
            log::warn!("channel: connection-response without an identity package dropped");
            return;
        };
        let Some(identity) = gantry_identity::build(&package) else {
            log::warn!("channel: stale or malformed identity package rejected");
            return;
        };
        let identity = match &wallet.root_principal {
            Some(principal) => identity.with_root_principal(principal.clone()),
            None => identity,
        };
        let identity = Arc::new(identity);

        let expiry_ms = identity.expires_at_ms();
        let applied = self.session.apply_identified(&wallet, Arc::clone(&identity), expiry_ms);

        if let Some(ledger) = &self.ledger {
            if let Err(err) = ledger.attach_identity(identity).await {
                log::warn!("channel: ledger actor rejected the new identity: {err}");
            }
        }
        self.publish_session(applied);
    }

    fn handle_signed(&self, envelope: InboundEnvelope) {
        let Some(bound_key) = self.session.bound_key() else {
            log::warn!("channel: dropping '{}' before a session key is bound", envelope.kind);
            return;
        };
        let Some(signature) = envelope.signature.as_deref() else {
            log::warn!("channel: unsigned '{}' dropped", envelope.kind);
            return;
        };
        if !verify_signature(&envelope.payload, signature, &bound_key) {
            log::warn!("channel: '{}' failed signature verification, dropped", envelope.kind);
            return;
        }

        match envelope.kind.as_str() {
            kind::PAY_RESPONSE => self.handle_pay(envelope.payload),
            _ => self.handle_generic(envelope.payload),
        }
    }

    fn handle_pay(&self, payload: Value) {
        let response: PayResponse = match serde_json::from_value(payload.clone()) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("channel: malformed pay-response: {err}");
                return;
            }
        };
        let outcome = if response.success {
            Ok(payload)
        } else {
            Err(BridgeError::rejected(
                response.message.clone().unwrap_or_else(|| "payment failed".into()),
                response.response_code.clone(),
            ))
        };
        if !self.engine.complete(&response.reference, outcome) {
            log::trace!("channel: pay-response for unknown ref '{}'", response.reference);
        }
        let _ = self.events.send(BridgeEvent::Pay(response));
    }

    fn handle_generic(&self, payload: Value) {
        let response: GenericResponse = match serde_json::from_value(payload.clone()) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("channel: malformed correlated response: {err}");
                return;
            }
        };
        let outcome = if response.success {
            Ok(payload)
        } else {
            Err(BridgeError::rejected(
                response.error.clone().unwrap_or_else(|| "request failed".into()),
                None,
            ))
        };
        if !self.engine.complete(&response.reference, outcome) {
            log::trace!("channel: response for unknown ref '{}'", response.reference);
        }
        let _ = self.events.send(BridgeEvent::Transaction(response));
    }

    fn publish_session(&self, applied: Applied) {
        let session = self.session.snapshot().unwrap_or_default();
        let event = match applied {
            Applied::Bound => BridgeEvent::Connected(session),
            Applied::Refreshed => BridgeEvent::Refreshed(session),
        };
        let _ = self.events.send(event);
    }
}
