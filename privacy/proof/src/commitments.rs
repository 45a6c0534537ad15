//! Ledger-facing context for proof verification.

use std::collections::HashMap;

use curve25519_dalek::ristretto::RistrettoPoint;
use privacy_coin::TokenId;
use privacy_primitives::{PrivacyError, PrivacyParams, Result};

/// Resolves stored output commitments by position.
///
/// V1 privacy proofs hide each input among `COMMITMENT_RING_SIZE` ledger
/// commitments; the proof carries their indices and the verifier fetches the
/// points through this trait.
pub trait CommitmentProvider {
    fn commitment_by_index(&self, token_id: &TokenId, shard_id: u8, index: u64) -> Result<RistrettoPoint>;
}

/// Append-only commitment list per `(token, shard)`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCommitments {
    entries: HashMap<(TokenId, u8), Vec<RistrettoPoint>>,
}

impl InMemoryCommitments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `commitment` and returns its index.
    pub fn push(&mut self, token_id: TokenId, shard_id: u8, commitment: RistrettoPoint) -> u64 {
        let list = self.entries.entry((token_id, shard_id)).or_default();
        list.push(commitment);
        (list.len() - 1) as u64
    }

    pub fn count(&self, token_id: &TokenId, shard_id: u8) -> usize {
        self.entries
            .get(&(*token_id, shard_id))
            .map_or(0, Vec::len)
    }
}

impl CommitmentProvider for InMemoryCommitments {
    fn commitment_by_index(&self, token_id: &TokenId, shard_id: u8, index: u64) -> Result<RistrettoPoint> {
        self.entries
            .get(&(*token_id, shard_id))
            .and_then(|list| usize::try_from(index).ok().and_then(|i| list.get(i)))
            .copied()
            .ok_or(PrivacyError::InvalidInput("unknown commitment index"))
    }
}

/// Transaction-level facts the verifier checks a proof against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyContext {
    pub params: PrivacyParams,
    pub fee: u64,
    pub shard_id: u8,
    pub token_id: TokenId,
    pub has_confidential_asset: bool,
}

impl VerifyContext {
    pub fn new(params: PrivacyParams, fee: u64, shard_id: u8) -> Self {
        Self {
            params,
            fee,
            shard_id,
            token_id: TokenId::PRV,
            has_confidential_asset: false,
        }
    }

    pub fn with_token(mut self, token_id: TokenId, has_confidential_asset: bool) -> Self {
        self.token_id = token_id;
        self.has_confidential_asset = has_confidential_asset;
        self
    }
}
