use std::sync::Arc;

use async_trait::async_trait;
use gantry_identity::DelegatedIdentity;
use serde::{Deserialize, Serialize};

use crate::error::ActorError;

// ── Boundary types ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    #[default]
    Buy,
    Sell,
}

/// An order to place on the ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub token: String,
    pub side: OrderSide,
    pub quantity: u64,
    /// Limit price in the quote token's base unit.
    pub price: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct OrderAck {
    pub order_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ClaimOutcome {
    pub settled: bool,
    pub block_ref: Option<String>,
}

// ── Contract ──────────────────────────────────────────────────────────────────

/// The backend ledger reached through an actor stub.
///
/// The bridge treats this interface as opaque: it hands over the delegated
/// identity once built and never inspects the underlying protocol. Every
/// method returns a discriminated success/error result.
#[async_trait]
pub trait LedgerActor: Send + Sync {
    /// Supply (or replace) the identity used to sign subsequent calls.
    async fn attach_identity(&self, identity: Arc<DelegatedIdentity>) -> Result<(), ActorError>;

    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck, ActorError>;

    /// Balance of `token` for the attached identity, in base units.
    async fn balance(&self, token: &str) -> Result<u64, ActorError>;

    /// Submit a raw transaction for broadcast; returns its txid.
    async fn submit_transaction(&self, raw_tx_hex: &str) -> Result<String, ActorError>;

    /// Settle a pending claim once the named transaction has an inclusion
    /// proof.
    async fn settle_claim(&self, claim_id: &str, txid: &str) -> Result<ClaimOutcome, ActorError>;
}

/// A ledger implementation that returns `NotImplemented` for every method.
pub struct StubLedger;

#[async_trait]
impl LedgerActor for StubLedger {
    async fn attach_identity(&self, _identity: Arc<DelegatedIdentity>) -> Result<(), ActorError> {
        Err(ActorError::not_implemented("attach_identity"))
    }

    async fn place_order(&self, _order: OrderRequest) -> Result<OrderAck, ActorError> {
        Err(ActorError::not_implemented("place_order"))
    }

    async fn balance(&self, _token: &str) -> Result<u64, ActorError> {
        Err(ActorError::not_implemented("balance"))
    }

    async fn submit_transaction(&self, _raw_tx_hex: &str) -> Result<String, ActorError> {
        Err(ActorError::not_implemented("submit_transaction"))
    }

    async fn settle_claim(&self, _claim_id: &str, _txid: &str) -> Result<ClaimOutcome, ActorError> {
        Err(ActorError::not_implemented("settle_claim"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_reports_not_implemented_per_method() {
        let stub = StubLedger;
        let err = stub.balance("BTC").await.expect_err("stub");
        assert_eq!(err, ActorError::not_implemented("balance"));
        assert!(!err.is_retryable());

        let err = stub.place_order(OrderRequest::default()).await.expect_err("stub");
        assert_eq!(err, ActorError::not_implemented("place_order"));
    }

    #[test]
    fn unavailable_is_retryable() {
        let err = ActorError::Unavailable { reason: "canister busy".into() };
        assert!(err.is_retryable());
        assert!(!ActorError::Rejected { message: "no".into() }.is_retryable());
    }
}
