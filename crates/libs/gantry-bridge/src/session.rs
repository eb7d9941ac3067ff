use std::sync::{Arc, Mutex};

use gantry_identity::DelegatedIdentity;
use gantry_wire::WalletInfo;

use crate::now_ms;
use crate::stamp::StampStore;

/// Connection state as observed by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Anonymous,
    Identified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected(SessionMode),
}

/// The bound session. `initiator_address` and `initiator_public_key` are
/// immutable once set — a renewal response never replaces them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionSession {
    pub anonymous: bool,
    pub initiator_address: Option<String>,
    pub initiator_public_key: Option<String>,
    pub root_principal: Option<String>,
    pub delegation_expiry_ms: Option<u64>,
}

/// What a connection response did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Applied {
    Bound,
    Refreshed,
}

/// Single-writer holder of the one piece of shared mutable state in the
/// bridge: the session, the delegated identity, and the last-connected
/// stamp. Only the inbound dispatch path writes here; everything else reads
/// snapshots.
pub struct SessionState {
    inner: Mutex<Inner>,
    stamps: Arc<dyn StampStore>,
}

struct Inner {
    connecting: bool,
    session: Option<ConnectionSession>,
    identity: Option<Arc<DelegatedIdentity>>,
}

impl SessionState {
    pub fn new(stamps: Arc<dyn StampStore>) -> Self {
        Self {
            inner: Mutex::new(Inner { connecting: false, session: None, identity: None }),
            stamps,
        }
    }

    pub fn phase(&self) -> Phase {
        let inner = self.lock();
        match &inner.session {
            Some(session) if session.anonymous => Phase::Connected(SessionMode::Anonymous),
            Some(_) => Phase::Connected(SessionMode::Identified),
            None if inner.connecting => Phase::Connecting,
            None => Phase::Disconnected,
        }
    }

    pub fn snapshot(&self) -> Option<ConnectionSession> {
        self.lock().session.clone()
    }

    pub fn identity(&self) -> Option<Arc<DelegatedIdentity>> {
        self.lock().identity.clone()
    }

    /// The session key inbound messages must verify against.
    pub fn bound_key(&self) -> Option<String> {
        self.lock().session.as_ref().and_then(|s| s.initiator_public_key.clone())
    }

    pub fn is_bound(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Last successful connection, read from the persistent store so the
    /// value survives reloads.
    pub fn last_connected_ms(&self) -> Option<u64> {
        self.stamps.load()
    }

    pub(crate) fn mark_connecting(&self) {
        self.lock().connecting = true;
    }

    /// Anonymous response: binds an anonymous session when none exists.
    /// A bound session is left untouched apart from the liveness stamp —
    /// anonymous responses carry nothing renewable.
    pub(crate) fn apply_anonymous(&self) -> Applied {
        let mut inner = self.lock();
        let applied = if inner.session.is_none() {
            inner.session = Some(ConnectionSession { anonymous: true, ..Default::default() });
            Applied::Bound
        } else {
            Applied::Refreshed
        };
        self.stamp();
        applied
    }

    /// Identified response: binds the full session on first contact (or
    /// when upgrading an anonymous session), otherwise refreshes only the
    /// renewable fields. The initiator address and public key stay as
    /// first bound; a response claiming a different wallet is logged and
    /// its wallet fields ignored.
    pub(crate) fn apply_identified(
        &self,
        wallet: &WalletInfo,
        identity: Arc<DelegatedIdentity>,
        expiry_ms: u64,
    ) -> Applied {
        let mut inner = self.lock();
        let bind = match &inner.session {
            None => true,
            Some(session) => session.initiator_address.is_none(),
        };

        let applied = if bind {
            inner.session = Some(ConnectionSession {
                anonymous: false,
                initiator_address: Some(wallet.address.clone()),
                initiator_public_key: Some(wallet.public_key_hex.clone()),
                root_principal: wallet.root_principal.clone(),
                delegation_expiry_ms: Some(expiry_ms),
            });
            Applied::Bound
        } else {
            let session = inner.session.as_mut().expect("session checked above");
            if session.initiator_address.as_deref() != Some(wallet.address.as_str()) {
                log::warn!(
                    "session: connection response for a different wallet ignored (bound {:?})",
                    session.initiator_address
                );
            }
            session.anonymous = false;
            session.delegation_expiry_ms = Some(expiry_ms);
            Applied::Refreshed
        };

        inner.identity = Some(identity);
        self.stamp();
        applied
    }

    /// Clear everything and return to `Disconnected`. The connect loop is
    /// not restarted; the caller builds a new bridge to reconnect.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.session = None;
        inner.identity = None;
        inner.connecting = false;
    }

    fn stamp(&self) {
        self.stamps.save(now_ms());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("session mutex poisoned")
    }
}
