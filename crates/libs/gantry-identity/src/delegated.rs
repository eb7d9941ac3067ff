use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::package::{IdentityPackage, SignedDelegation};
use crate::{now_ms, FRESHNESS_WINDOW_MS};

/// A short-lived key pair authorized, via its delegation chain, to act on
/// behalf of the wallet's root identity.
#[derive(Clone)]
pub struct DelegatedIdentity {
    signing_key: SigningKey,
    chain: Vec<SignedDelegation>,
    expires_at_ms: u64,
    root_principal: Option<String>,
}

/// Validate an identity package against the current wall clock.
///
/// Returns `None` (never an error) when the package is expired, stale,
/// incomplete, or its key material / delegation chain fails to parse.
pub fn build(package: &IdentityPackage) -> Option<DelegatedIdentity> {
    build_at(package, now_ms())
}

/// [`build`] with an injected clock, for boundary checks.
pub fn build_at(package: &IdentityPackage, now_ms: u64) -> Option<DelegatedIdentity> {
    if package.app_id.is_empty() || package.issued_at == 0 || package.expiration_date == 0 {
        log::debug!("identity: package missing app id or timestamps");
        return None;
    }
    if package.expiration_date <= now_ms {
        log::debug!("identity: package already expired");
        return None;
    }
    if now_ms.saturating_sub(package.issued_at) > FRESHNESS_WINDOW_MS {
        log::debug!("identity: package older than the freshness window");
        return None;
    }

    let Some(secret) = package.secret.key_bytes() else {
        log::debug!("identity: secret key material failed to parse");
        return None;
    };
    let signing_key = SigningKey::from_bytes(&secret);

    let mut parent_expiration: Option<u64> = None;
    for entry in &package.delegations {
        if hex::decode(&entry.delegation.pubkey).is_err() || hex::decode(&entry.signature).is_err()
        {
            log::debug!("identity: delegation chain entry failed to parse");
            return None;
        }
        if let Some(parent) = parent_expiration {
            if entry.delegation.expiration > parent {
                log::debug!("identity: delegation outlives its parent");
                return None;
            }
        }
        parent_expiration = Some(entry.delegation.expiration);
    }

    // Leaf delegation caps the effective expiry when it is tighter than the
    // package's own expiration date.
    let expires_at_ms = parent_expiration
        .map_or(package.expiration_date, |leaf| leaf.min(package.expiration_date));

    Some(DelegatedIdentity {
        signing_key,
        chain: package.delegations.clone(),
        expires_at_ms,
        root_principal: None,
    })
}

impl DelegatedIdentity {
    /// Sign an outbound backend request on behalf of the root identity.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().as_bytes())
    }

    /// Chain ordered root first, as delivered in the package.
    pub fn chain(&self) -> &[SignedDelegation] {
        &self.chain
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    /// True once the identity expires within `margin_ms` of now (or has
    /// already expired). Drives proactive renewal.
    pub fn expires_within(&self, margin_ms: u64) -> bool {
        self.expires_within_at(margin_ms, now_ms())
    }

    pub fn expires_within_at(&self, margin_ms: u64, now_ms: u64) -> bool {
        self.expires_at_ms.saturating_sub(now_ms) <= margin_ms
    }

    /// Principal of the delegating root identity, when the wallet shared it.
    pub fn root_principal(&self) -> Option<&str> {
        self.root_principal.as_deref()
    }

    pub fn with_root_principal(mut self, principal: impl Into<String>) -> Self {
        self.root_principal = Some(principal.into());
        self
    }
}

impl fmt::Debug for DelegatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedIdentity")
            .field("public_key", &self.public_key_hex())
            .field("chain_len", &self.chain.len())
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Delegation, SecretMaterial};
    use ed25519_dalek::Verifier;

    const NOW: u64 = 1_700_000_000_000;

    fn package() -> IdentityPackage {
        IdentityPackage {
            app_id: "trade-desk".into(),
            issued_at: NOW - 1_000,
            expiration_date: NOW + 60_000,
            secret: SecretMaterial::new(hex::encode([7u8; 32])),
            delegations: Vec::new(),
        }
    }

    #[test]
    fn fresh_package_builds() {
        assert!(build_at(&package(), NOW).is_some());
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let mut pkg = package();
        pkg.expiration_date = NOW;
        assert!(build_at(&pkg, NOW).is_none());
        pkg.expiration_date = NOW + 1;
        assert!(build_at(&pkg, NOW).is_some());
    }

    #[test]
    fn freshness_boundary_is_inclusive() {
        let mut pkg = package();
        pkg.issued_at = NOW - FRESHNESS_WINDOW_MS;
        assert!(build_at(&pkg, NOW).is_some());
        pkg.issued_at = NOW - FRESHNESS_WINDOW_MS - 1;
        assert!(build_at(&pkg, NOW).is_none());
    }

    #[test]
    fn missing_fields_are_rejected_before_key_parsing() {
        let mut pkg = package();
        pkg.app_id = String::new();
        // The secret is deliberately broken too: field validation must come
        // first and still return None, not panic.
        pkg.secret = SecretMaterial::new("zz");
        assert!(build_at(&pkg, NOW).is_none());
    }

    #[test]
    fn bad_secret_material_is_rejected() {
        let mut pkg = package();
        pkg.secret = SecretMaterial::new("not-hex");
        assert!(build_at(&pkg, NOW).is_none());

        pkg.secret = SecretMaterial::new(hex::encode([7u8; 16]));
        assert!(build_at(&pkg, NOW).is_none());
    }

    #[test]
    fn chain_entries_must_parse() {
        let mut pkg = package();
        pkg.delegations = vec![SignedDelegation {
            delegation: Delegation { pubkey: "xx".into(), expiration: NOW + 50_000 },
            signature: "aa".into(),
        }];
        assert!(build_at(&pkg, NOW).is_none());
    }

    #[test]
    fn delegation_cannot_outlive_parent() {
        let mut pkg = package();
        pkg.delegations = vec![
            SignedDelegation {
                delegation: Delegation { pubkey: "aa".into(), expiration: NOW + 10_000 },
                signature: "01".into(),
            },
            SignedDelegation {
                delegation: Delegation { pubkey: "bb".into(), expiration: NOW + 20_000 },
                signature: "02".into(),
            },
        ];
        assert!(build_at(&pkg, NOW).is_none());
    }

    #[test]
    fn leaf_delegation_caps_effective_expiry() {
        let mut pkg = package();
        pkg.delegations = vec![SignedDelegation {
            delegation: Delegation { pubkey: "aa".into(), expiration: NOW + 10_000 },
            signature: "01".into(),
        }];
        let identity = build_at(&pkg, NOW).expect("identity");
        assert_eq!(identity.expires_at_ms(), NOW + 10_000);
    }

    #[test]
    fn signatures_verify_against_the_delegated_key() {
        let identity = build_at(&package(), NOW).expect("identity");
        let message = b"place-order";
        let signature = identity.sign(message);
        assert!(identity.verifying_key().verify(message, &signature).is_ok());
    }

    #[test]
    fn expires_within_margin() {
        let identity = build_at(&package(), NOW).expect("identity");
        // Expiry is NOW + 60s.
        assert!(identity.expires_within_at(60_000, NOW));
        assert!(!identity.expires_within_at(10_000, NOW));
        assert!(identity.expires_within_at(0, NOW + 60_000));
    }

    #[test]
    fn debug_output_omits_key_material() {
        let identity = build_at(&package(), NOW).expect("identity");
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains(&hex::encode([7u8; 32])));
    }
}
