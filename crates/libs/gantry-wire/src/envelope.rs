use gantry_identity::IdentityPackage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Wire values of the envelope `type` field.
pub mod kind {
    pub const CONNECTION: &str = "connection";
    pub const CONNECTION_RESPONSE: &str = "connection-response";
    pub const PAY: &str = "pay";
    pub const PAY_RESPONSE: &str = "pay-response";
    pub const WRITE_CLIPBOARD: &str = "write-clipboard";
    pub const OPEN_LINK: &str = "open-link";
    pub const FULL_TRANSACTION: &str = "full-transaction";
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// A payment destination.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub address: String,
    /// Amount in the token's base unit.
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Recipient {
    pub fn new(address: impl Into<String>, value: u64) -> Self {
        Self { address: address.into(), value, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Commands posted to the host context. Fire-and-forget: no return value and
/// no delivery guarantee. Serialized flat, `type` alongside the fields.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundCommand {
    /// Request or refresh the wallet connection.
    Connection {
        #[serde(skip_serializing_if = "Option::is_none")]
        navbg: Option<String>,
    },
    /// Request a payment; the response echoes `ref`.
    Pay {
        #[serde(rename = "ref")]
        reference: String,
        token: String,
        recipients: Vec<Recipient>,
    },
    /// Ask the host to copy text to the clipboard.
    WriteClipboard { text: String },
    /// Ask the host to open a URL.
    OpenLink { text: String },
    /// Request raw transaction bytes plus an inclusion proof.
    FullTransaction {
        txid: String,
        #[serde(rename = "ref")]
        reference: String,
    },
}

impl OutboundCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => kind::CONNECTION,
            Self::Pay { .. } => kind::PAY,
            Self::WriteClipboard { .. } => kind::WRITE_CLIPBOARD,
            Self::OpenLink { .. } => kind::OPEN_LINK,
            Self::FullTransaction { .. } => kind::FULL_TRANSACTION,
        }
    }
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Wire-level envelope of every inbound host message: `{type, payload,
/// signature}`. The payload stays untyped until its signature is checked.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub signature: Option<String>,
}

impl InboundEnvelope {
    /// Parse an untrusted message. `None` when the message does not match
    /// the envelope shape at all.
    pub fn parse(raw: &Value) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }
        serde_json::from_value(raw.clone()).ok()
    }

    /// The correlation token carried by the payload, if any.
    pub fn reference(&self) -> Option<&str> {
        self.payload.get("ref").and_then(Value::as_str)
    }
}

/// Wallet fields of an identified connection response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub public_key_hex: String,
    #[serde(default)]
    pub root_principal: Option<String>,
}

/// Payload of a `connection-response` message.
///
/// The anonymous variant carries no wallet and no signing key; the
/// identified variant is self-certifying (verified against the key it
/// carries) because it is the first trusted message of a session.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub wallet: Option<WalletInfo>,
    /// Opaque delegation payload, replaced wholesale on renewal.
    #[serde(default)]
    pub ic_delegation: Option<Value>,
    #[serde(default)]
    pub ic_identity_package: Option<IdentityPackage>,
    #[serde(default)]
    pub generic_use_seed: Option<String>,
}

/// Payload of a `pay-response` message.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response_code: Option<String>,
    #[serde(default)]
    pub raw_tx_hex: Option<String>,
    #[serde(default)]
    pub transfer_outcome: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Payload of the remaining correlated responses (transaction lookups).
/// These arrive snake_cased from the host.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GenericResponse {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub tx_hex: Option<String>,
    #[serde(default)]
    pub bump_hex: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_commands_serialize_flat_and_kebab_cased() {
        let command = OutboundCommand::Pay {
            reference: "pay-1".into(),
            token: "BTC".into(),
            recipients: vec![Recipient::new("bc1qexample", 1200)],
        };
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["type"], "pay");
        assert_eq!(value["ref"], "pay-1");
        assert_eq!(value["recipients"][0]["address"], "bc1qexample");
        assert_eq!(value["recipients"][0]["value"], 1200);
        // An absent note is omitted entirely, not serialized as null.
        assert!(value["recipients"][0].get("note").is_none());

        let command = OutboundCommand::FullTransaction { txid: "ab".into(), reference: "tx-1".into() };
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["type"], "full-transaction");

        let command = OutboundCommand::WriteClipboard { text: "copied".into() };
        assert_eq!(command.kind(), kind::WRITE_CLIPBOARD);
    }

    #[test]
    fn connection_without_navbg_omits_the_field() {
        let value =
            serde_json::to_value(OutboundCommand::Connection { navbg: None }).expect("serialize");
        assert_eq!(value, json!({"type": "connection"}));
    }

    #[test]
    fn envelope_parses_and_exposes_reference() {
        let raw = json!({
            "type": "pay-response",
            "payload": {"ref": "pay-9", "success": true},
            "signature": "abcd"
        });
        let envelope = InboundEnvelope::parse(&raw).expect("envelope");
        assert_eq!(envelope.kind, "pay-response");
        assert_eq!(envelope.reference(), Some("pay-9"));
        assert_eq!(envelope.signature.as_deref(), Some("abcd"));
    }

    #[test]
    fn non_envelope_messages_are_rejected() {
        assert!(InboundEnvelope::parse(&json!("just a string")).is_none());
        assert!(InboundEnvelope::parse(&json!(42)).is_none());
        assert!(InboundEnvelope::parse(&json!({"payload": {}})).is_none());
    }

    #[test]
    fn connection_response_parses_camel_case_payload() {
        let payload = json!({
            "wallet": {
                "address": "bc1qwallet",
                "publicKeyHex": "02ab",
                "rootPrincipal": "aaaaa-aa"
            },
            "icDelegation": {"opaque": true},
            "icIdentityPackage": {
                "appId": "trade-desk",
                "issuedAt": 5,
                "expirationDate": 9,
                "privateKeyMaterial": "00"
            },
            "genericUseSeed": "seed"
        });
        let response: ConnectionResponse = serde_json::from_value(payload).expect("payload");
        assert!(!response.anonymous);
        let wallet = response.wallet.expect("wallet");
        assert_eq!(wallet.address, "bc1qwallet");
        assert_eq!(wallet.public_key_hex, "02ab");
        assert_eq!(wallet.root_principal.as_deref(), Some("aaaaa-aa"));
        assert!(response.ic_identity_package.is_some());
        assert_eq!(response.generic_use_seed.as_deref(), Some("seed"));
    }

    #[test]
    fn anonymous_connection_response_needs_no_wallet() {
        let response: ConnectionResponse =
            serde_json::from_value(json!({"anonymous": true})).expect("payload");
        assert!(response.anonymous);
        assert!(response.wallet.is_none());
    }

    #[test]
    fn generic_response_is_snake_cased() {
        let response: GenericResponse = serde_json::from_value(json!({
            "ref": "tx-1",
            "success": true,
            "tx_hex": "0100",
            "bump_hex": "beef"
        }))
        .expect("payload");
        assert_eq!(response.tx_hex.as_deref(), Some("0100"));
        assert_eq!(response.bump_hex.as_deref(), Some("beef"));
    }

    #[test]
    fn pay_response_tolerates_missing_optionals() {
        let response: PayResponse =
            serde_json::from_value(json!({"ref": "pay-1", "success": false})).expect("payload");
        assert_eq!(response.reference, "pay-1");
        assert!(!response.success);
        assert!(response.raw_tx_hex.is_none());
    }
}
