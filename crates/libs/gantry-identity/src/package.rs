use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Hex-encoded secret key material as delivered by the host wallet.
///
/// Wiped on drop; the `Debug` impl never prints the material itself.
#[derive(Clone, Deserialize, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretMaterial(String);

impl SecretMaterial {
    pub fn new(material_hex: impl Into<String>) -> Self {
        Self(material_hex.into())
    }

    /// Decode into a 32-byte ed25519 secret. `None` on bad hex or length.
    pub(crate) fn key_bytes(&self) -> Option<[u8; 32]> {
        let mut decoded = hex::decode(&self.0).ok()?;
        let result = <[u8; 32]>::try_from(decoded.as_slice()).ok();
        decoded.zeroize();
        result
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(..)")
    }
}

/// A single authorization statement: `pubkey` may act until `expiration`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Delegation {
    /// Hex-encoded public key being delegated to.
    pub pubkey: String,
    /// Expiry of this statement, unix milliseconds.
    pub expiration: u64,
}

/// A delegation plus the signature of the identity that granted it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignedDelegation {
    pub delegation: Delegation,
    /// Hex-encoded signature over the delegation.
    pub signature: String,
}

/// Identity package issued by the host wallet in a connection response.
///
/// Field names follow the wire format. Immutable once validated; a renewal
/// supersedes the whole package.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPackage {
    pub app_id: String,
    /// Issue time, unix milliseconds.
    pub issued_at: u64,
    /// Hard expiry, unix milliseconds.
    pub expiration_date: u64,
    #[serde(rename = "privateKeyMaterial")]
    pub secret: SecretMaterial,
    /// Chain ordered root first, leaf last.
    #[serde(rename = "delegationChain", default)]
    pub delegations: Vec<SignedDelegation>,
}
