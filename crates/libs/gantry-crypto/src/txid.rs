use sha2::{Digest, Sha256};

/// Canonical transaction identifier for a raw transaction.
///
/// Double SHA-256 over the decoded bytes, byte order reversed, re-encoded as
/// lowercase hex. This is the display form the downstream indexing service
/// computes, so both the double hash and the single reversal are
/// wire-compatibility requirements, not implementation choices.
///
/// Returns `None` for empty, odd-length, or non-hex input.
pub fn compute_txid(raw_tx_hex: &str) -> Option<String> {
    if raw_tx_hex.is_empty() || raw_tx_hex.len() % 2 != 0 {
        return None;
    }
    let bytes = hex::decode(raw_tx_hex).ok()?;

    let first = Sha256::digest(&bytes);
    let second = Sha256::digest(first);
    let mut id = second.to_vec();
    id.reverse();
    Some(hex::encode(id))
}
