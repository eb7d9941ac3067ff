use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use serde_json::Value;

use crate::canonical::canonical_digest;

/// Check that `payload` was signed by `public_key_hex` over secp256k1.
///
/// The signed bytes are the canonical digest of the payload. The public key
/// is SEC1-encoded hex (compressed or uncompressed); the signature is hex,
/// either 64-byte fixed form or DER.
///
/// This is the trust boundary for every inbound host message, so it must
/// never panic: any parse or format failure maps to `false`.
pub fn verify_signature(payload: &Value, signature_hex: &str, public_key_hex: &str) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_sec1_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Some(signature) = parse_signature(&sig_bytes) else {
        return false;
    };

    let digest = canonical_digest(payload);
    key.verify_prehash(&digest, &signature).is_ok()
}

fn parse_signature(bytes: &[u8]) -> Option<Signature> {
    if let Ok(signature) = Signature::from_slice(bytes) {
        return Some(signature);
    }
    Signature::from_der(bytes).ok()
}
