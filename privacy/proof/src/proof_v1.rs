//! Version 1 payment proof.
//!
//! With privacy, every input commitment `C = pk + G1^v + G2^snd + G3^shard + G4^r`
//! is split into the separately blinded pieces `comInputSK`, `comInputValue[i]`,
//! `comInputSND[i]` and `comInputShardID`. Subtracting their sum from each of
//! `COMMITMENT_RING_SIZE` ledger commitments leaves exactly one ring member that
//! opens to zero, which the one-out-of-many proof shows without naming it.
//! Outputs are split the same way so the range proof can run on the value part.
//!
//! The prover picks the last output's value blinding so that
//! `Σ comInputValue - Σ comOutputValue - G1^fee` is the identity; verifiers check
//! that identity directly.
//!
//! ```text
//! version(1)=1
//! n ‖ (len(2) ‖ oneOfMany)×n
//! n ‖ (len(2) ‖ snPrivacy)×n
//! n ‖ (len(1) ‖ snNoPrivacy)×n
//! len(2) ‖ rangeProof
//! n ‖ (len(1) ‖ PlainCoinV1)×n
//! n ‖ (dualLen ‖ CoinV1)×n
//! comOutputValue, comOutputSND, comOutputShardID      (n ‖ (0x20 ‖ P)×n each)
//! comInputSK                                           (0x20 ‖ P | 0x00)
//! comInputValue, comInputSND                           (n ‖ (0x20 ‖ P)×n each)
//! comInputShardID                                      (0x20 ‖ P | 0x00)
//! n ‖ index(8, BE)×n
//! ```

use std::collections::HashSet;

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::IsIdentity};
use log::{debug, warn};
use privacy_coin::{
    coin_v1::{read_dual_len, write_dual_len},
    Coin, CoinV1, PlainCoin, PlainCoinV1, TokenId,
};
use privacy_primitives::{
    derive_serial_number,
    encoding::{
        point_to_bytes, write_len16_prefixed, write_len_prefixed, write_opt_point,
        write_point_list, Reader,
    },
    params::{COMMITMENT_RING_SIZE, MAX_INPUT_COIN, MAX_OUTPUT_COIN},
    pedersen, random_scalar, PaymentInfo, PrivacyError, PrivacyParams, PrivateKey, Result,
    PEDERSEN_PRIVATE_KEY_INDEX, PEDERSEN_SHARD_ID_INDEX, PEDERSEN_SND_INDEX,
    PEDERSEN_VALUE_INDEX,
};
use privacy_zkp::{
    AggregatedRangeProof, AggregatedRangeWitness, OneOutOfManyProof, OneOutOfManyWitness,
    SnNoPrivacyProof, SnNoPrivacyWitness, SnPrivacyProof, SnPrivacyStatement, SnPrivacyWitness,
    RANGE_PROOF_VERSION_1,
};
use rand::{CryptoRng, RngCore};

use crate::{
    expect_variant, CommitmentProvider, PaymentProof, VerifyContext, PROOF_VERSION_1,
};

/// Largest privacy input count whose ring indices fit the one-byte list count.
const MAX_PRIVACY_INPUTS: usize = u8::MAX as usize / COMMITMENT_RING_SIZE;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProofV1 {
    one_of_many_proofs: Vec<OneOutOfManyProof>,
    serial_number_proofs: Vec<SnPrivacyProof>,
    serial_number_no_privacy_proofs: Vec<SnNoPrivacyProof>,
    range_proof: Option<AggregatedRangeProof>,
    input_coins: Vec<PlainCoinV1>,
    output_coins: Vec<CoinV1>,
    com_output_value: Vec<RistrettoPoint>,
    com_output_snd: Vec<RistrettoPoint>,
    com_output_shard_id: Vec<RistrettoPoint>,
    com_input_sk: Option<RistrettoPoint>,
    com_input_value: Vec<RistrettoPoint>,
    com_input_snd: Vec<RistrettoPoint>,
    com_input_shard_id: Option<RistrettoPoint>,
    commitment_indices: Vec<u64>,
}

/// Everything the sender knows when building a V1 proof.
#[derive(Clone, Debug)]
pub struct PaymentWitnessParamV1 {
    pub has_privacy: bool,
    pub private_key: PrivateKey,
    /// Opened inputs owned by `private_key`.
    pub input_coins: Vec<PlainCoinV1>,
    pub payment_infos: Vec<PaymentInfo>,
    pub fee: u64,
    pub token_id: TokenId,
    /// Shard whose ledger holds the input commitments.
    pub shard_id: u8,
    /// Privacy: `COMMITMENT_RING_SIZE` ledger indices per input.
    /// No privacy: the ledger index of each input.
    pub commitment_indices: Vec<u64>,
    /// Privacy only: position of each input inside its ring.
    pub my_commitment_indices: Vec<usize>,
}

fn sum_values<'a>(values: impl IntoIterator<Item = &'a u64>) -> Result<u64> {
    values
        .into_iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .ok_or(PrivacyError::InvalidInput("value sum overflows"))
}

fn no_duplicate_serial_numbers(coins: &[PlainCoinV1]) -> Result<()> {
    let mut seen = HashSet::with_capacity(coins.len());
    for sn in coins.iter().filter_map(|c| c.serial_number.as_ref()) {
        if !seen.insert(point_to_bytes(sn)) {
            warn!("proof v1: duplicate serial number");
            return Err(PrivacyError::ProofVerificationFailed("proof v1: duplicate serial number"));
        }
    }
    Ok(())
}

fn balance_point(inputs: &[RistrettoPoint], outputs: &[RistrettoPoint], fee: u64) -> RistrettoPoint {
    let input: RistrettoPoint = inputs.iter().sum();
    let output: RistrettoPoint = outputs.iter().sum();
    input - output - pedersen().commit_at_index(&Scalar::from(fee), &Scalar::ZERO, PEDERSEN_VALUE_INDEX)
}

impl PaymentWitnessParamV1 {
    fn check(&self, params: &PrivacyParams) -> Result<()> {
        if self.input_coins.is_empty() || self.input_coins.len() > MAX_INPUT_COIN {
            return Err(PrivacyError::InvalidInput("input coin count"));
        }
        if self.payment_infos.is_empty() || self.payment_infos.len() > MAX_OUTPUT_COIN {
            return Err(PrivacyError::InvalidInput("output coin count"));
        }
        let total_in = sum_values(self.input_coins.iter().map(|c| &c.value))?;
        let total_out = sum_values(self.payment_infos.iter().map(|p| &p.amount))?;
        if total_out.checked_add(self.fee) != Some(total_in) {
            return Err(PrivacyError::InvalidInput("inputs do not balance outputs and fee"));
        }
        let owner = self.private_key.public_spend();
        for coin in &self.input_coins {
            if coin.public_key != Some(owner) {
                return Err(PrivacyError::InvalidInput("input coin not owned by private key"));
            }
            coin.verify_commitment(params)?;
        }
        if self.has_privacy {
            if self.input_coins.len() > MAX_PRIVACY_INPUTS {
                return Err(PrivacyError::InvalidInput("too many inputs for a privacy proof"));
            }
            if self.commitment_indices.len() != self.input_coins.len() * COMMITMENT_RING_SIZE
                || self.my_commitment_indices.len() != self.input_coins.len()
            {
                return Err(PrivacyError::InvalidInput("ring index count"));
            }
        } else if self.commitment_indices.len() != self.input_coins.len() {
            return Err(PrivacyError::InvalidInput("commitment index count"));
        }
        Ok(())
    }

    /// Builds every sub-proof, then conceals the coins.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the coins do not balance, are not owned by the key,
    ///   or a ring does not contain the spent commitment at the given position
    /// - `CommitmentMismatch` if an input's opening disagrees with its commitment
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        params: &PrivacyParams,
        provider: &dyn CommitmentProvider,
        rng: &mut R,
    ) -> Result<ProofV1> {
        self.check(params)?;
        debug!(
            "proof v1: proving {} inputs, {} outputs, privacy {}",
            self.input_coins.len(),
            self.payment_infos.len(),
            self.has_privacy
        );
        if self.has_privacy {
            self.prove_privacy(params, provider, rng)
        } else {
            self.prove_no_privacy(params, provider, rng)
        }
    }

    fn prove_no_privacy<R: RngCore + CryptoRng>(
        &self,
        params: &PrivacyParams,
        provider: &dyn CommitmentProvider,
        rng: &mut R,
    ) -> Result<ProofV1> {
        let sk = *self.private_key.as_scalar();
        let pk = self.private_key.public_spend();
        let mut proof = ProofV1 {
            commitment_indices: self.commitment_indices.clone(),
            ..ProofV1::default()
        };

        for (coin, index) in self.input_coins.iter().zip(&self.commitment_indices) {
            let stored = provider.commitment_by_index(&self.token_id, self.shard_id, *index)?;
            if Some(stored) != coin.commitment {
                return Err(PrivacyError::InvalidInput("input commitment not found at ledger index"));
            }
            let snd = coin
                .snd
                .ok_or(PrivacyError::InvalidInput("coin has no serial number derivator"))?;
            let sn = derive_serial_number(&sk, &snd);
            proof
                .serial_number_no_privacy_proofs
                .push(SnNoPrivacyWitness::new(sn, pk, snd, sk).prove(None, rng));

            let mut input = coin.clone();
            input.serial_number = Some(sn);
            input.info.clear();
            proof.input_coins.push(input);
        }

        for info in &self.payment_infos {
            let mut coin = PlainCoinV1::new(
                info.payment_address.public_spend,
                info.amount,
                random_scalar(rng),
                info.message.clone(),
            );
            coin.randomness = Some(random_scalar(rng));
            coin.commit_all(params)?;
            proof.output_coins.push(CoinV1::new(coin));
        }
        Ok(proof)
    }

    fn prove_privacy<R: RngCore + CryptoRng>(
        &self,
        params: &PrivacyParams,
        provider: &dyn CommitmentProvider,
        rng: &mut R,
    ) -> Result<ProofV1> {
        let gens = pedersen();
        let sk = *self.private_key.as_scalar();
        let pk = self.private_key.public_spend();
        let shard = Scalar::from(params.shard_id_from_last_byte(point_to_bytes(&pk)[31]) as u64);

        let r_sk = random_scalar(rng);
        let r_shard = random_scalar(rng);
        let com_input_sk = gens.commit_at_index(&sk, &r_sk, PEDERSEN_PRIVATE_KEY_INDEX);
        let com_input_shard_id = gens.commit_at_index(&shard, &r_shard, PEDERSEN_SHARD_ID_INDEX);

        let mut proof = ProofV1 {
            com_input_sk: Some(com_input_sk),
            com_input_shard_id: Some(com_input_shard_id),
            commitment_indices: self.commitment_indices.clone(),
            ..ProofV1::default()
        };

        // ===== Inputs =====
        let mut input_value_blinding = Scalar::ZERO;
        for (i, coin) in self.input_coins.iter().enumerate() {
            let snd = coin
                .snd
                .ok_or(PrivacyError::InvalidInput("coin has no serial number derivator"))?;
            let randomness = coin
                .randomness
                .ok_or(PrivacyError::InvalidInput("coin has no randomness"))?;

            let r_value = random_scalar(rng);
            let r_snd = random_scalar(rng);
            let com_value = gens.commit_at_index(&Scalar::from(coin.value), &r_value, PEDERSEN_VALUE_INDEX);
            let com_snd = gens.commit_at_index(&snd, &r_snd, PEDERSEN_SND_INDEX);
            input_value_blinding += r_value;

            let sum = com_input_sk + com_value + com_snd + com_input_shard_id;
            let ring_indices = &self.commitment_indices[i * COMMITMENT_RING_SIZE..(i + 1) * COMMITMENT_RING_SIZE];
            let ring = ring_indices
                .iter()
                .map(|idx| {
                    provider
                        .commitment_by_index(&self.token_id, self.shard_id, *idx)
                        .map(|c| c - sum)
                })
                .collect::<Result<Vec<_>>>()?;
            let zero_rand = randomness - (r_sk + r_value + r_snd + r_shard);
            let one_of_many = OneOutOfManyWitness::new(zero_rand, self.my_commitment_indices[i])
                .prove(&ring, rng)?;

            let sn = derive_serial_number(&sk, &snd);
            let stmt = SnPrivacyStatement {
                sn,
                com_sk: com_input_sk,
                com_input: com_snd,
            };
            let sn_proof = SnPrivacyWitness::new(stmt, sk, r_sk, snd, r_snd).prove(None, rng);

            let mut input = coin.clone();
            input.serial_number = Some(sn);
            proof.one_of_many_proofs.push(one_of_many);
            proof.serial_number_proofs.push(sn_proof);
            proof.com_input_value.push(com_value);
            proof.com_input_snd.push(com_snd);
            proof.input_coins.push(input);
        }

        // ===== Outputs =====
        let last = self.payment_infos.len() - 1;
        let mut output_value_blinding = Scalar::ZERO;
        let mut value_rands = Vec::with_capacity(self.payment_infos.len());
        let mut plain_outputs = Vec::with_capacity(self.payment_infos.len());
        for (j, info) in self.payment_infos.iter().enumerate() {
            let address = &info.payment_address;
            let snd = random_scalar(rng);
            let out_shard = Scalar::from(params.shard_id_from_last_byte(address.last_byte()) as u64);
            let r_value = if j == last {
                input_value_blinding - output_value_blinding
            } else {
                random_scalar(rng)
            };
            output_value_blinding += r_value;
            let r_snd = random_scalar(rng);
            let r_shard = random_scalar(rng);

            let com_value = gens.commit_at_index(&Scalar::from(info.amount), &r_value, PEDERSEN_VALUE_INDEX);
            let com_snd = gens.commit_at_index(&snd, &r_snd, PEDERSEN_SND_INDEX);
            let com_shard = gens.commit_at_index(&out_shard, &r_shard, PEDERSEN_SHARD_ID_INDEX);

            let mut coin = PlainCoinV1::new(address.public_spend, info.amount, snd, info.message.clone());
            coin.randomness = Some(r_value + r_snd + r_shard);
            coin.commitment = Some(address.public_spend + com_value + com_snd + com_shard);

            proof.com_output_value.push(com_value);
            proof.com_output_snd.push(com_snd);
            proof.com_output_shard_id.push(com_shard);
            value_rands.push(r_value);
            plain_outputs.push(coin);
        }

        let values = self.payment_infos.iter().map(|p| p.amount).collect();
        proof.range_proof =
            Some(AggregatedRangeWitness::new(values, value_rands)?.prove(RANGE_PROOF_VERSION_1, rng)?);

        // ===== Conceal =====
        for (coin, info) in plain_outputs.into_iter().zip(&self.payment_infos) {
            let mut output = CoinV1::new(coin);
            output.encrypt(&info.payment_address.public_view, rng)?;
            output.conceal_output();
            proof.output_coins.push(output);
        }
        for input in &mut proof.input_coins {
            input.conceal_input();
        }
        Ok(proof)
    }
}

impl ProofV1 {
    pub fn one_of_many_proofs(&self) -> &[OneOutOfManyProof] {
        &self.one_of_many_proofs
    }

    pub fn serial_number_proofs(&self) -> &[SnPrivacyProof] {
        &self.serial_number_proofs
    }

    pub fn serial_number_no_privacy_proofs(&self) -> &[SnNoPrivacyProof] {
        &self.serial_number_no_privacy_proofs
    }

    pub fn commitment_indices(&self) -> &[u64] {
        &self.commitment_indices
    }

    pub fn com_output_value(&self) -> &[RistrettoPoint] {
        &self.com_output_value
    }

    pub fn com_input_value(&self) -> &[RistrettoPoint] {
        &self.com_input_value
    }

    fn verify_no_privacy(&self, ctx: &VerifyContext, provider: &dyn CommitmentProvider) -> Result<()> {
        let n = self.input_coins.len();
        if self.serial_number_no_privacy_proofs.len() != n
            || self.commitment_indices.len() != n
            || !self.serial_number_proofs.is_empty()
        {
            return Err(PrivacyError::ProofVerificationFailed("proof v1: input proof count"));
        }
        no_duplicate_serial_numbers(&self.input_coins)?;

        for ((coin, sn_proof), index) in self
            .input_coins
            .iter()
            .zip(&self.serial_number_no_privacy_proofs)
            .zip(&self.commitment_indices)
        {
            let stmt = &sn_proof.stmt;
            if coin.public_key != Some(stmt.vkey)
                || coin.snd != Some(stmt.input)
                || coin.serial_number != Some(stmt.output)
            {
                warn!("proof v1: input coin does not match its serial number statement");
                return Err(PrivacyError::ProofVerificationFailed(
                    "proof v1: input coin and serial number statement differ",
                ));
            }
            coin.verify_commitment(&ctx.params)?;
            let stored = provider.commitment_by_index(&ctx.token_id, ctx.shard_id, *index)?;
            if Some(stored) != coin.commitment {
                return Err(PrivacyError::CommitmentMismatch("input commitment not on ledger"));
            }
            sn_proof.verify(None)?;
        }

        for coin in &self.output_coins {
            if coin.is_encrypted() {
                return Err(PrivacyError::ProofVerificationFailed(
                    "proof v1: encrypted output without privacy",
                ));
            }
            coin.details.verify_commitment(&ctx.params)?;
        }

        let total_in = sum_values(self.input_coins.iter().map(|c| &c.value))?;
        let total_out = sum_values(self.output_coins.iter().map(|c| &c.details.value))?;
        if total_out.checked_add(ctx.fee) != Some(total_in) {
            warn!("proof v1: transparent balance failed");
            return Err(PrivacyError::ProofVerificationFailed("proof v1: balance"));
        }
        Ok(())
    }

    fn verify_privacy(&self, ctx: &VerifyContext, provider: &dyn CommitmentProvider) -> Result<()> {
        let n = self.input_coins.len();
        if self.one_of_many_proofs.len() != n
            || self.serial_number_proofs.len() != n
            || self.com_input_value.len() != n
            || self.com_input_snd.len() != n
            || self.commitment_indices.len() != n * COMMITMENT_RING_SIZE
            || !self.serial_number_no_privacy_proofs.is_empty()
        {
            return Err(PrivacyError::ProofVerificationFailed("proof v1: input proof count"));
        }
        let m = self.output_coins.len();
        if m == 0
            || self.com_output_value.len() != m
            || self.com_output_snd.len() != m
            || self.com_output_shard_id.len() != m
        {
            return Err(PrivacyError::ProofVerificationFailed("proof v1: output commitment count"));
        }
        let (Some(com_input_sk), Some(com_input_shard_id)) = (self.com_input_sk, self.com_input_shard_id) else {
            return Err(PrivacyError::ProofVerificationFailed("proof v1: missing input key commitments"));
        };
        no_duplicate_serial_numbers(&self.input_coins)?;

        // ===== Inputs =====
        for (i, coin) in self.input_coins.iter().enumerate() {
            let sum = com_input_sk + self.com_input_value[i] + self.com_input_snd[i] + com_input_shard_id;
            let ring = self.commitment_indices[i * COMMITMENT_RING_SIZE..(i + 1) * COMMITMENT_RING_SIZE]
                .iter()
                .map(|idx| {
                    provider
                        .commitment_by_index(&ctx.token_id, ctx.shard_id, *idx)
                        .map(|c| c - sum)
                })
                .collect::<Result<Vec<_>>>()?;
            self.one_of_many_proofs[i].verify(&ring)?;

            let sn_proof = &self.serial_number_proofs[i];
            if *sn_proof.com_input() != self.com_input_snd[i] {
                return Err(PrivacyError::ProofVerificationFailed(
                    "proof v1: serial number proof bound to another derivator commitment",
                ));
            }
            if coin.serial_number != Some(*sn_proof.serial_number()) {
                return Err(PrivacyError::ProofVerificationFailed(
                    "proof v1: input serial number differs from proven one",
                ));
            }
            sn_proof.verify(&com_input_sk, None)?;
        }

        // ===== Outputs =====
        for (j, coin) in self.output_coins.iter().enumerate() {
            let pk = coin
                .details
                .public_key
                .ok_or(PrivacyError::ProofVerificationFailed("proof v1: output has no public key"))?;
            let expected = pk + self.com_output_value[j] + self.com_output_snd[j] + self.com_output_shard_id[j];
            if coin.details.commitment != Some(expected) {
                warn!("proof v1: output commitment {j} does not match its decomposition");
                return Err(PrivacyError::CommitmentMismatch("output commitment decomposition"));
            }
        }

        let range_proof = self
            .range_proof
            .as_ref()
            .ok_or(PrivacyError::ProofVerificationFailed("proof v1: missing range proof"))?;
        if range_proof.commitments() != self.com_output_value.as_slice() {
            return Err(PrivacyError::ProofVerificationFailed(
                "proof v1: range proof covers other commitments",
            ));
        }
        range_proof.verify_faster()?;

        if !balance_point(&self.com_input_value, &self.com_output_value, ctx.fee).is_identity() {
            warn!("proof v1: committed balance failed");
            return Err(PrivacyError::ProofVerificationFailed("proof v1: balance"));
        }
        Ok(())
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        if r.read_u8()? != PROOF_VERSION_1 {
            return Err(PrivacyError::MalformedEncoding("proof v1 version"));
        }

        let n = r.read_u8()? as usize;
        let one_of_many_proofs = (0..n)
            .map(|_| OneOutOfManyProof::from_bytes(r.read_len16_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let serial_number_proofs = (0..n)
            .map(|_| SnPrivacyProof::from_bytes(r.read_len16_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let serial_number_no_privacy_proofs = (0..n)
            .map(|_| SnNoPrivacyProof::from_bytes(r.read_len_prefixed()?))
            .collect::<Result<Vec<_>>>()?;

        let range_bytes = r.read_len16_prefixed()?;
        let range_proof = if range_bytes.is_empty() {
            None
        } else {
            Some(AggregatedRangeProof::from_bytes(range_bytes)?)
        };

        let n = r.read_u8()? as usize;
        let input_coins = (0..n)
            .map(|_| PlainCoinV1::from_bytes(r.read_len_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let output_coins = (0..n)
            .map(|_| read_dual_len(&mut r, CoinV1::from_bytes))
            .collect::<Result<Vec<_>>>()?;

        let com_output_value = r.read_point_list()?;
        let com_output_snd = r.read_point_list()?;
        let com_output_shard_id = r.read_point_list()?;
        let com_input_sk = r.read_opt_point()?;
        let com_input_value = r.read_point_list()?;
        let com_input_snd = r.read_point_list()?;
        let com_input_shard_id = r.read_opt_point()?;

        let n = r.read_u8()? as usize;
        let commitment_indices = (0..n).map(|_| r.read_u64_be()).collect::<Result<Vec<_>>>()?;
        r.finish()?;

        Ok(Self {
            one_of_many_proofs,
            serial_number_proofs,
            serial_number_no_privacy_proofs,
            range_proof,
            input_coins,
            output_coins,
            com_output_value,
            com_output_snd,
            com_output_shard_id,
            com_input_sk,
            com_input_value,
            com_input_snd,
            com_input_shard_id,
            commitment_indices,
        })
    }
}

impl PaymentProof for ProofV1 {
    fn version(&self) -> u8 {
        PROOF_VERSION_1
    }

    fn input_coins(&self) -> Vec<PlainCoin> {
        self.input_coins.iter().cloned().map(PlainCoin::V1).collect()
    }

    fn output_coins(&self) -> Vec<Coin> {
        self.output_coins.iter().cloned().map(Coin::V1).collect()
    }

    fn range_proof(&self) -> Option<&AggregatedRangeProof> {
        self.range_proof.as_ref()
    }

    fn set_input_coins(&mut self, coins: Vec<PlainCoin>) -> Result<()> {
        self.input_coins = expect_variant(coins, "PlainCoinV1", PlainCoin::variant_name, |c| match c {
            PlainCoin::V1(c) => Some(c),
            PlainCoin::V2(_) => None,
        })?;
        Ok(())
    }

    fn set_output_coins(&mut self, coins: Vec<Coin>) -> Result<()> {
        self.output_coins = expect_variant(coins, "CoinV1", Coin::variant_name, |c| match c {
            Coin::V1(c) => Some(c),
            Coin::V2(_) => None,
        })?;
        Ok(())
    }

    fn is_privacy(&self) -> bool {
        !self.one_of_many_proofs.is_empty()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![PROOF_VERSION_1];

        out.push(self.one_of_many_proofs.len() as u8);
        for p in &self.one_of_many_proofs {
            write_len16_prefixed(&mut out, &p.to_bytes());
        }
        out.push(self.serial_number_proofs.len() as u8);
        for p in &self.serial_number_proofs {
            write_len16_prefixed(&mut out, &p.to_bytes());
        }
        out.push(self.serial_number_no_privacy_proofs.len() as u8);
        for p in &self.serial_number_no_privacy_proofs {
            write_len_prefixed(&mut out, &p.to_bytes());
        }

        let range = self
            .range_proof
            .as_ref()
            .map(AggregatedRangeProof::to_bytes)
            .unwrap_or_default();
        write_len16_prefixed(&mut out, &range);

        out.push(self.input_coins.len() as u8);
        for c in &self.input_coins {
            write_len_prefixed(&mut out, &c.to_bytes());
        }
        out.push(self.output_coins.len() as u8);
        for c in &self.output_coins {
            let bytes = c.to_bytes();
            write_dual_len(&mut out, bytes.len());
            out.extend_from_slice(&bytes);
        }

        write_point_list(&mut out, &self.com_output_value);
        write_point_list(&mut out, &self.com_output_snd);
        write_point_list(&mut out, &self.com_output_shard_id);
        write_opt_point(&mut out, self.com_input_sk.as_ref());
        write_point_list(&mut out, &self.com_input_value);
        write_point_list(&mut out, &self.com_input_snd);
        write_opt_point(&mut out, self.com_input_shard_id.as_ref());

        out.push(self.commitment_indices.len() as u8);
        for index in &self.commitment_indices {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out
    }

    fn verify(&self, ctx: &VerifyContext, provider: &dyn CommitmentProvider) -> Result<()> {
        debug!(
            "proof v1: verifying {} inputs, {} outputs, privacy {}",
            self.input_coins.len(),
            self.output_coins.len(),
            self.is_privacy()
        );
        if self.is_privacy() {
            self.verify_privacy(ctx, provider)
        } else {
            self.verify_no_privacy(ctx, provider)
        }
    }
}
