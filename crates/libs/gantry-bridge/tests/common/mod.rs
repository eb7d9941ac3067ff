//! Shared harness for bridge behavior tests: a recording host transport and
//! a wallet that signs responses the way the host process does.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use gantry_bridge::{BridgeConfig, BridgeError, HostPost, WalletBridge};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Records everything the bridge posts to the host.
#[derive(Default)]
pub struct MockPost {
    sent: Mutex<Vec<Value>>,
}

impl MockPost {
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().expect("sent mutex").clone()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.sent().iter().filter(|message| message["type"] == kind).count()
    }

    /// The `ref` of the most recent posted command of `kind`.
    pub fn last_reference(&self, kind: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|message| message["type"] == kind)
            .and_then(|message| message["ref"].as_str().map(str::to_string))
    }
}

impl HostPost for MockPost {
    fn post(&self, message: Value) -> Result<(), BridgeError> {
        self.sent.lock().expect("sent mutex").push(message);
        Ok(())
    }
}

/// A host wallet with a real secp256k1 key, signing payloads exactly as the
/// bridge verifies them.
pub struct TestWallet {
    signing: SigningKey,
    pub address: String,
}

impl TestWallet {
    pub fn new(address: &str) -> Self {
        Self { signing: SigningKey::random(&mut rand_core::OsRng), address: address.into() }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing.verifying_key().to_encoded_point(true).as_bytes())
    }

    pub fn sign_payload(&self, payload: &Value) -> String {
        let digest = gantry_crypto::canonical_digest(payload);
        let signature: Signature = self.signing.sign_prehash(&digest).expect("sign");
        hex::encode(signature.to_bytes())
    }

    /// A full inbound envelope with a valid signature over `payload`.
    pub fn envelope(&self, kind: &str, payload: Value) -> Value {
        let signature = self.sign_payload(&payload);
        json!({"type": kind, "payload": payload, "signature": signature})
    }

    /// An identified connection response carrying `package`.
    pub fn connection_response(&self, package: Value) -> Value {
        self.envelope(
            "connection-response",
            json!({
                "wallet": {
                    "address": self.address,
                    "publicKeyHex": self.public_key_hex(),
                    "rootPrincipal": "w7x7r-cok77-xa",
                },
                "icDelegation": {"sig": "00"},
                "icIdentityPackage": package,
                "genericUseSeed": "8d42",
            }),
        )
    }
}

/// A fresh identity package expiring one hour out.
pub fn identity_package() -> Value {
    identity_package_expiring(now_ms() + 3_600_000)
}

pub fn identity_package_expiring(expiration_ms: u64) -> Value {
    json!({
        "appId": "trade-desk",
        "issuedAt": now_ms() - 1_000,
        "expirationDate": expiration_ms,
        "privateKeyMaterial": hex::encode([7u8; 32]),
        "delegationChain": [],
    })
}

pub fn anonymous_response() -> Value {
    json!({"type": "connection-response", "payload": {"anonymous": true}})
}

pub struct Harness {
    pub bridge: Arc<WalletBridge>,
    pub post: Arc<MockPost>,
    pub inbound: mpsc::UnboundedSender<Value>,
}

pub fn spawn_bridge(config: BridgeConfig) -> Harness {
    let post = Arc::new(MockPost::default());
    let (inbound, receiver) = mpsc::unbounded_channel();
    let bridge = WalletBridge::builder()
        .config(config)
        .spawn(Arc::clone(&post) as Arc<dyn HostPost>, receiver);
    Harness { bridge: Arc::new(bridge), post, inbound }
}

/// Let spawned bridge tasks run without moving the clock.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
