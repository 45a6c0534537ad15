//! Version 2 payment proof.
//!
//! Inputs are reduced to their key images; outputs carry one-time addresses
//! and concealed openings. A single range proof (version 2) covers every
//! output commitment. Confidential-asset transfers prove on the base
//! `outputs[0].assetTag`; the other outputs' masks are shifted by
//! `(b_i - b_0)·v_i` so their commitments are unchanged on that base.
//!
//! ```text
//! version(1)=2 ‖ len(4) ‖ rangeProof ‖ n ‖ (len(4) ‖ CoinV2)×n ‖ n ‖ (len(4) ‖ CoinV2)×n
//! ```

use std::collections::HashSet;

use curve25519_dalek::scalar::Scalar;
use log::{debug, warn};
use privacy_coin::{asset_tag::asset_tag_blinder, Coin, CoinParams, CoinV2, PlainCoin, TokenId};
use privacy_primitives::{
    encoding::{point_to_bytes, write_len32_prefixed, Reader},
    params::{CoinPrivacyType, MAX_INPUT_COIN, MAX_OUTPUT_COIN},
    PaymentInfo, PrivacyError, PrivacyParams, PrivateKey, Result,
};
use privacy_zkp::{AggregatedRangeProof, AggregatedRangeWitness, RANGE_PROOF_VERSION_2};
use rand::{CryptoRng, RngCore};

use crate::{expect_variant, CommitmentProvider, PaymentProof, VerifyContext, PROOF_VERSION_2};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProofV2 {
    range_proof: Option<AggregatedRangeProof>,
    input_coins: Vec<CoinV2>,
    output_coins: Vec<CoinV2>,
}

#[derive(Clone, Debug)]
pub struct PaymentWitnessParamV2 {
    pub private_key: PrivateKey,
    /// Decrypted inputs owned by `private_key`.
    pub input_coins: Vec<CoinV2>,
    pub payment_infos: Vec<PaymentInfo>,
    pub fee: u64,
    pub token_id: TokenId,
    pub has_confidential_asset: bool,
    /// When set, output addresses also encode the sender shard.
    pub sender_shard: Option<u8>,
}

impl PaymentWitnessParamV2 {
    fn check(&self) -> Result<()> {
        if self.input_coins.is_empty() || self.input_coins.len() > MAX_INPUT_COIN {
            return Err(PrivacyError::InvalidInput("input coin count"));
        }
        if self.payment_infos.is_empty() || self.payment_infos.len() > MAX_OUTPUT_COIN {
            return Err(PrivacyError::InvalidInput("output coin count"));
        }
        if self.input_coins.iter().any(CoinV2::is_encrypted) {
            return Err(PrivacyError::InvalidInput("input coin is still concealed"));
        }
        let total_in = self
            .input_coins
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.value()));
        let total_out = self
            .payment_infos
            .iter()
            .try_fold(self.fee, |acc, p| acc.checked_add(p.amount));
        match (total_in, total_out) {
            (Some(i), Some(o)) if i == o => Ok(()),
            _ => Err(PrivacyError::InvalidInput("inputs do not balance outputs and fee")),
        }
    }

    /// Builds the range proof over fresh outputs, then conceals every coin.
    pub fn prove<R: RngCore + CryptoRng>(&self, params: &PrivacyParams, rng: &mut R) -> Result<ProofV2> {
        self.check()?;
        debug!(
            "proof v2: proving {} inputs, {} outputs, confidential asset {}",
            self.input_coins.len(),
            self.payment_infos.len(),
            self.has_confidential_asset
        );

        // ===== Outputs =====
        let mut outputs = Vec::with_capacity(self.payment_infos.len());
        let mut blinders = Vec::with_capacity(self.payment_infos.len());
        for info in &self.payment_infos {
            let mut coin_params = CoinParams::new(info.clone());
            if let Some(shard) = self.sender_shard {
                coin_params = coin_params.with_sender_shard(shard, CoinPrivacyType::Transfer);
            }
            if self.has_confidential_asset {
                let (coin, shared_secret) = CoinV2::new_ca(params, &coin_params, &self.token_id, rng)?;
                blinders.push(asset_tag_blinder(&shared_secret));
                outputs.push(coin);
            } else {
                outputs.push(CoinV2::new_from_payment_info(params, &coin_params, rng)?);
            }
        }

        let values: Vec<u64> = self.payment_infos.iter().map(|p| p.amount).collect();
        let masks = outputs
            .iter()
            .map(|c| c.mask().copied().ok_or(PrivacyError::InvalidInput("output has no mask")))
            .collect::<Result<Vec<_>>>()?;

        let range_proof = if self.has_confidential_asset {
            let base = *outputs[0]
                .asset_tag()
                .ok_or(PrivacyError::InvalidInput("output has no asset tag"))?;
            let b0 = blinders[0];
            let shifted = masks
                .iter()
                .zip(&blinders)
                .zip(&values)
                .map(|((mask, b), v)| mask + (b - b0) * Scalar::from(*v))
                .collect();
            AggregatedRangeWitness::new(values, shifted)?.prove_using_base(RANGE_PROOF_VERSION_2, &base, rng)?
        } else {
            AggregatedRangeWitness::new(values, masks)?.prove(RANGE_PROOF_VERSION_2, rng)?
        };

        // ===== Conceal =====
        for (coin, info) in outputs.iter_mut().zip(&self.payment_infos) {
            coin.conceal_output_coin(&info.payment_address.public_view)?;
        }
        let mut inputs = Vec::with_capacity(self.input_coins.len());
        for coin in &self.input_coins {
            let mut input = coin.clone();
            input.set_key_image(Some(coin.key_image_with_private_key(&self.private_key)?));
            input.conceal_input_coin();
            inputs.push(input);
        }

        Ok(ProofV2 {
            range_proof: Some(range_proof),
            input_coins: inputs,
            output_coins: outputs,
        })
    }
}

impl ProofV2 {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        if r.read_u8()? != PROOF_VERSION_2 {
            return Err(PrivacyError::MalformedEncoding("proof v2 version"));
        }
        let range_bytes = r.read_len32_prefixed()?;
        let range_proof = if range_bytes.is_empty() {
            None
        } else {
            Some(AggregatedRangeProof::from_bytes(range_bytes)?)
        };
        let n = r.read_u8()? as usize;
        let input_coins = (0..n)
            .map(|_| CoinV2::from_bytes(r.read_len32_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let output_coins = (0..n)
            .map(|_| CoinV2::from_bytes(r.read_len32_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        r.finish()?;
        Ok(Self {
            range_proof,
            input_coins,
            output_coins,
        })
    }

    fn check_key_images(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.input_coins.len());
        for coin in &self.input_coins {
            let ki = coin
                .key_image()
                .ok_or(PrivacyError::ProofVerificationFailed("proof v2: input without key image"))?;
            if !seen.insert(point_to_bytes(ki)) {
                warn!("proof v2: duplicate key image");
                return Err(PrivacyError::ProofVerificationFailed("proof v2: duplicate key image"));
            }
        }
        Ok(())
    }
}

impl PaymentProof for ProofV2 {
    fn version(&self) -> u8 {
        PROOF_VERSION_2
    }

    fn input_coins(&self) -> Vec<PlainCoin> {
        self.input_coins.iter().cloned().map(PlainCoin::V2).collect()
    }

    fn output_coins(&self) -> Vec<Coin> {
        self.output_coins.iter().cloned().map(Coin::V2).collect()
    }

    fn range_proof(&self) -> Option<&AggregatedRangeProof> {
        self.range_proof.as_ref()
    }

    fn set_input_coins(&mut self, coins: Vec<PlainCoin>) -> Result<()> {
        self.input_coins = expect_variant(coins, "CoinV2", PlainCoin::variant_name, |c| match c {
            PlainCoin::V2(c) => Some(c),
            PlainCoin::V1(_) => None,
        })?;
        Ok(())
    }

    fn set_output_coins(&mut self, coins: Vec<Coin>) -> Result<()> {
        self.output_coins = expect_variant(coins, "CoinV2", Coin::variant_name, |c| match c {
            Coin::V2(c) => Some(c),
            Coin::V1(_) => None,
        })?;
        Ok(())
    }

    /// A V2 proof hides amounts exactly when its outputs are concealed.
    fn is_privacy(&self) -> bool {
        self.output_coins.iter().any(CoinV2::is_encrypted)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![PROOF_VERSION_2];
        let range = self
            .range_proof
            .as_ref()
            .map(AggregatedRangeProof::to_bytes)
            .unwrap_or_default();
        write_len32_prefixed(&mut out, &range);
        out.push(self.input_coins.len() as u8);
        for c in &self.input_coins {
            write_len32_prefixed(&mut out, &c.to_bytes());
        }
        out.push(self.output_coins.len() as u8);
        for c in &self.output_coins {
            write_len32_prefixed(&mut out, &c.to_bytes());
        }
        out
    }

    fn verify(&self, ctx: &VerifyContext, _provider: &dyn CommitmentProvider) -> Result<()> {
        debug!(
            "proof v2: verifying {} inputs, {} outputs",
            self.input_coins.len(),
            self.output_coins.len()
        );
        if self.input_coins.is_empty() {
            return Err(PrivacyError::ProofVerificationFailed("proof v2: no inputs"));
        }
        if self.output_coins.is_empty() || self.output_coins.len() > MAX_OUTPUT_COIN {
            return Err(PrivacyError::ProofVerificationFailed("proof v2: output count"));
        }
        self.check_key_images()?;

        let range_proof = self
            .range_proof
            .as_ref()
            .ok_or(PrivacyError::ProofVerificationFailed("proof v2: missing range proof"))?;
        if range_proof.version() != RANGE_PROOF_VERSION_2 {
            return Err(PrivacyError::ProofVerificationFailed("proof v2: range proof version"));
        }
        let commitments = self
            .output_coins
            .iter()
            .map(|c| {
                c.commitment()
                    .copied()
                    .ok_or(PrivacyError::ProofVerificationFailed("proof v2: output without commitment"))
            })
            .collect::<Result<Vec<_>>>()?;
        if range_proof.commitments() != commitments.as_slice() {
            warn!("proof v2: range proof covers other commitments");
            return Err(PrivacyError::ProofVerificationFailed(
                "proof v2: range proof covers other commitments",
            ));
        }

        if ctx.has_confidential_asset {
            if self.output_coins.iter().any(|c| c.asset_tag().is_none()) {
                return Err(PrivacyError::TypeMismatch {
                    expected: "confidential asset coin",
                    found: "plain coin",
                });
            }
            let base = self.output_coins[0]
                .asset_tag()
                .ok_or(PrivacyError::ProofVerificationFailed("proof v2: output without asset tag"))?;
            range_proof.verify_faster_using_base(base)
        } else {
            if self.output_coins.iter().any(|c| c.asset_tag().is_some()) {
                return Err(PrivacyError::TypeMismatch {
                    expected: "plain coin",
                    found: "confidential asset coin",
                });
            }
            range_proof.verify_faster()
        }
    }
}
