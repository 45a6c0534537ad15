//! # privacy-proof — transaction payment proofs
//!
//! A payment proof bundles the sub-proofs that let a verifier accept a
//! transaction without learning which coins were spent or how much moved:
//!
//! - [`ProofV1`]: serial-number proofs per input, one-out-of-many ring proofs
//!   under privacy, an aggregated range proof over the output values, and the
//!   decomposed input/output commitments
//! - [`ProofV2`]: one-time-address coins; a single range proof (optionally on
//!   a confidential-asset base) plus the concealed coins
//! - [`ConversionProof`]: moves transparent V1 coins into V2 outputs
//!
//! [`Proof`] is the version-tagged sum type; [`PaymentProof`] the capability
//! set each variant implements.
//!
//! ## Wire discrimination
//!
//! The first byte is the proof version: `1`, `2` or `255` (conversion).
//!
//! ## Concealment
//!
//! Provers conceal coins only after every sub-proof is built: outputs are
//! encrypted to their recipients and inputs are stripped down to the data a
//! verifier needs to check serial numbers or key images.

pub mod commitments;
pub mod conversion;
pub mod proof_v1;
pub mod proof_v2;

pub use commitments::{CommitmentProvider, InMemoryCommitments, VerifyContext};
pub use conversion::{ConversionProof, ConversionWitness};
pub use proof_v1::{PaymentWitnessParamV1, ProofV1};
pub use proof_v2::{PaymentWitnessParamV2, ProofV2};

use privacy_coin::{Coin, PlainCoin};
use privacy_primitives::{PrivacyError, Result};
use privacy_zkp::AggregatedRangeProof;

pub const PROOF_VERSION_1: u8 = 1;
pub const PROOF_VERSION_2: u8 = 2;
pub const CONVERSION_PROOF_VERSION: u8 = 255;

/// Operations shared by every payment-proof version.
pub trait PaymentProof {
    fn version(&self) -> u8;
    fn input_coins(&self) -> Vec<PlainCoin>;
    fn output_coins(&self) -> Vec<Coin>;
    fn range_proof(&self) -> Option<&AggregatedRangeProof>;
    /// Fails with `TypeMismatch` when a coin is not of this version's input type.
    fn set_input_coins(&mut self, coins: Vec<PlainCoin>) -> Result<()>;
    /// Fails with `TypeMismatch` when a coin is not of this version's output type.
    fn set_output_coins(&mut self, coins: Vec<Coin>) -> Result<()>;
    fn is_privacy(&self) -> bool;
    fn to_bytes(&self) -> Vec<u8>;
    fn verify(&self, ctx: &VerifyContext, provider: &dyn CommitmentProvider) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proof {
    V1(ProofV1),
    V2(ProofV2),
    Conversion(ConversionProof),
}

impl Proof {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        match b.first() {
            None => Err(PrivacyError::MalformedEncoding("empty proof")),
            Some(&PROOF_VERSION_1) => ProofV1::from_bytes(b).map(Proof::V1),
            Some(&PROOF_VERSION_2) => ProofV2::from_bytes(b).map(Proof::V2),
            Some(&CONVERSION_PROOF_VERSION) => ConversionProof::from_bytes(b).map(Proof::Conversion),
            Some(_) => Err(PrivacyError::MalformedEncoding("unknown proof version")),
        }
    }

    fn inner(&self) -> &dyn PaymentProof {
        match self {
            Proof::V1(p) => p,
            Proof::V2(p) => p,
            Proof::Conversion(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PaymentProof {
        match self {
            Proof::V1(p) => p,
            Proof::V2(p) => p,
            Proof::Conversion(p) => p,
        }
    }
}

impl PaymentProof for Proof {
    fn version(&self) -> u8 {
        self.inner().version()
    }
    fn input_coins(&self) -> Vec<PlainCoin> {
        self.inner().input_coins()
    }
    fn output_coins(&self) -> Vec<Coin> {
        self.inner().output_coins()
    }
    fn range_proof(&self) -> Option<&AggregatedRangeProof> {
        self.inner().range_proof()
    }
    fn set_input_coins(&mut self, coins: Vec<PlainCoin>) -> Result<()> {
        self.inner_mut().set_input_coins(coins)
    }
    fn set_output_coins(&mut self, coins: Vec<Coin>) -> Result<()> {
        self.inner_mut().set_output_coins(coins)
    }
    fn is_privacy(&self) -> bool {
        self.inner().is_privacy()
    }
    fn to_bytes(&self) -> Vec<u8> {
        self.inner().to_bytes()
    }
    fn verify(&self, ctx: &VerifyContext, provider: &dyn CommitmentProvider) -> Result<()> {
        self.inner().verify(ctx, provider)
    }
}

impl From<ProofV1> for Proof {
    fn from(p: ProofV1) -> Self {
        Proof::V1(p)
    }
}

impl From<ProofV2> for Proof {
    fn from(p: ProofV2) -> Self {
        Proof::V2(p)
    }
}

impl From<ConversionProof> for Proof {
    fn from(p: ConversionProof) -> Self {
        Proof::Conversion(p)
    }
}

/// Unwraps coins of one variant, reporting the first stranger.
pub(crate) fn expect_variant<C, T>(
    coins: Vec<C>,
    expected: &'static str,
    name: impl Fn(&C) -> &'static str,
    pick: impl Fn(C) -> Option<T>,
) -> Result<Vec<T>> {
    coins
        .into_iter()
        .map(|c| {
            let found = name(&c);
            pick(c).ok_or(PrivacyError::TypeMismatch { expected, found })
        })
        .collect()
}
