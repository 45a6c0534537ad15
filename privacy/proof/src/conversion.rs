//! Conversion proof: spends transparent V1 coins into transparent V2 outputs.
//!
//! ```text
//! version(1)=255 ‖ n ‖ (len(4) ‖ PlainCoinV1)×n ‖ n ‖ (len(4) ‖ CoinV2)×n ‖ n ‖ (len(1) ‖ snNoPrivacy)×n
//! ```

use std::collections::HashSet;

use log::{debug, warn};
use privacy_coin::{Coin, CoinParams, CoinV2, PlainCoin, PlainCoinV1};
use privacy_primitives::{
    derive_serial_number,
    encoding::{point_to_bytes, write_len32_prefixed, write_len_prefixed, Reader},
    params::{MAX_INPUT_COIN, MAX_OUTPUT_COIN},
    PaymentInfo, PrivacyError, PrivacyParams, PrivateKey, Result,
};
use privacy_zkp::{AggregatedRangeProof, SnNoPrivacyProof, SnNoPrivacyWitness};
use rand::{CryptoRng, RngCore};

use crate::{expect_variant, CommitmentProvider, PaymentProof, VerifyContext, CONVERSION_PROOF_VERSION};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionProof {
    input_coins: Vec<PlainCoinV1>,
    output_coins: Vec<CoinV2>,
    serial_number_no_privacy_proofs: Vec<SnNoPrivacyProof>,
}

#[derive(Clone, Debug)]
pub struct ConversionWitness {
    pub private_key: PrivateKey,
    /// Opened V1 inputs owned by `private_key`.
    pub input_coins: Vec<PlainCoinV1>,
    pub payment_infos: Vec<PaymentInfo>,
    pub fee: u64,
}

fn total<I: IntoIterator<Item = u64>>(values: I) -> Option<u64> {
    values.into_iter().try_fold(0u64, u64::checked_add)
}

impl ConversionWitness {
    pub fn prove<R: RngCore + CryptoRng>(&self, params: &PrivacyParams, rng: &mut R) -> Result<ConversionProof> {
        if self.input_coins.is_empty() || self.input_coins.len() > MAX_INPUT_COIN {
            return Err(PrivacyError::InvalidInput("input coin count"));
        }
        if self.payment_infos.is_empty() || self.payment_infos.len() > MAX_OUTPUT_COIN {
            return Err(PrivacyError::InvalidInput("output coin count"));
        }
        let total_in = total(self.input_coins.iter().map(|c| c.value));
        let total_out = total(self.payment_infos.iter().map(|p| p.amount)).and_then(|v| v.checked_add(self.fee));
        if total_in.is_none() || total_in != total_out {
            return Err(PrivacyError::InvalidInput("inputs do not balance outputs and fee"));
        }
        debug!(
            "conversion: proving {} inputs, {} outputs",
            self.input_coins.len(),
            self.payment_infos.len()
        );

        let sk = *self.private_key.as_scalar();
        let pk = self.private_key.public_spend();
        let mut proof = ConversionProof::default();
        for coin in &self.input_coins {
            if coin.public_key != Some(pk) {
                return Err(PrivacyError::InvalidInput("input coin not owned by private key"));
            }
            coin.verify_commitment(params)?;
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
            let mut coin = CoinV2::new_from_payment_info(params, &CoinParams::new(info.clone()), rng)?;
            coin.clear_shared_randoms();
            proof.output_coins.push(coin);
        }
        Ok(proof)
    }
}

impl ConversionProof {
    pub fn serial_number_no_privacy_proofs(&self) -> &[SnNoPrivacyProof] {
        &self.serial_number_no_privacy_proofs
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        if r.read_u8()? != CONVERSION_PROOF_VERSION {
            return Err(PrivacyError::MalformedEncoding("conversion proof version"));
        }
        let n = r.read_u8()? as usize;
        let input_coins = (0..n)
            .map(|_| PlainCoinV1::from_bytes(r.read_len32_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let output_coins = (0..n)
            .map(|_| CoinV2::from_bytes(r.read_len32_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        let n = r.read_u8()? as usize;
        let serial_number_no_privacy_proofs = (0..n)
            .map(|_| SnNoPrivacyProof::from_bytes(r.read_len_prefixed()?))
            .collect::<Result<Vec<_>>>()?;
        r.finish()?;
        Ok(Self {
            input_coins,
            output_coins,
            serial_number_no_privacy_proofs,
        })
    }
}

impl PaymentProof for ConversionProof {
    fn version(&self) -> u8 {
        CONVERSION_PROOF_VERSION
    }

    fn input_coins(&self) -> Vec<PlainCoin> {
        self.input_coins.iter().cloned().map(PlainCoin::V1).collect()
    }

    fn output_coins(&self) -> Vec<Coin> {
        self.output_coins.iter().cloned().map(Coin::V2).collect()
    }

    fn range_proof(&self) -> Option<&AggregatedRangeProof> {
        None
    }

    fn set_input_coins(&mut self, coins: Vec<PlainCoin>) -> Result<()> {
        self.input_coins = expect_variant(coins, "PlainCoinV1", PlainCoin::variant_name, |c| match c {
            PlainCoin::V1(c) => Some(c),
            PlainCoin::V2(_) => None,
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

    fn is_privacy(&self) -> bool {
        false
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![CONVERSION_PROOF_VERSION];
        out.push(self.input_coins.len() as u8);
        for c in &self.input_coins {
            write_len32_prefixed(&mut out, &c.to_bytes());
        }
        out.push(self.output_coins.len() as u8);
        for c in &self.output_coins {
            write_len32_prefixed(&mut out, &c.to_bytes());
        }
        out.push(self.serial_number_no_privacy_proofs.len() as u8);
        for p in &self.serial_number_no_privacy_proofs {
            write_len_prefixed(&mut out, &p.to_bytes());
        }
        out
    }

    fn verify(&self, ctx: &VerifyContext, _provider: &dyn CommitmentProvider) -> Result<()> {
        debug!(
            "conversion: verifying {} inputs, {} outputs",
            self.input_coins.len(),
            self.output_coins.len()
        );
        if self.input_coins.is_empty() || self.serial_number_no_privacy_proofs.len() != self.input_coins.len() {
            return Err(PrivacyError::ProofVerificationFailed("conversion: input proof count"));
        }
        if self.output_coins.is_empty() || self.output_coins.len() > MAX_OUTPUT_COIN {
            return Err(PrivacyError::ProofVerificationFailed("conversion: output count"));
        }

        let mut seen = HashSet::with_capacity(self.input_coins.len());
        for (coin, sn_proof) in self.input_coins.iter().zip(&self.serial_number_no_privacy_proofs) {
            let stmt = &sn_proof.stmt;
            if coin.public_key != Some(stmt.vkey)
                || coin.snd != Some(stmt.input)
                || coin.serial_number != Some(stmt.output)
            {
                warn!("conversion: input coin does not match its serial number statement");
                return Err(PrivacyError::ProofVerificationFailed(
                    "conversion: input coin and serial number statement differ",
                ));
            }
            if !seen.insert(point_to_bytes(&stmt.output)) {
                return Err(PrivacyError::ProofVerificationFailed("conversion: duplicate serial number"));
            }
            coin.verify_commitment(&ctx.params)?;
            sn_proof.verify(None)?;
        }

        for coin in &self.output_coins {
            if coin.asset_tag().is_some() {
                return Err(PrivacyError::TypeMismatch {
                    expected: "plain coin",
                    found: "confidential asset coin",
                });
            }
            if coin.is_encrypted() {
                return Err(PrivacyError::ProofVerificationFailed("conversion: concealed output"));
            }
        }

        let total_in = total(self.input_coins.iter().map(|c| c.value));
        let total_out = total(self.output_coins.iter().map(CoinV2::value)).and_then(|v| v.checked_add(ctx.fee));
        if total_in.is_none() || total_in != total_out {
            warn!("conversion: balance failed");
            return Err(PrivacyError::ProofVerificationFailed("conversion: balance"));
        }
        Ok(())
    }
}
