//! The fixed Pedersen generator set and multi-base commitments.

use std::sync::OnceLock;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, scalar::Scalar,
    traits::MultiscalarMul,
};

use crate::{hash::hash_to_point, PrivacyError, Result};

// Generator roles. Indices are part of every commitment ever produced.
pub const PEDERSEN_PRIVATE_KEY_INDEX: usize = 0;
pub const PEDERSEN_VALUE_INDEX: usize = 1;
pub const PEDERSEN_SND_INDEX: usize = 2;
pub const PEDERSEN_SHARD_ID_INDEX: usize = 3;
pub const PEDERSEN_RANDOMNESS_INDEX: usize = 4;
pub const PEDERSEN_GENERATOR_COUNT: usize = 5;

#[derive(Clone, Debug)]
pub struct PedersenGens {
    pub g: [RistrettoPoint; PEDERSEN_GENERATOR_COUNT],
}

impl Default for PedersenGens {
    fn default() -> Self {
        Self::new()
    }
}

impl PedersenGens {
    /// `G[0]` is the group base point; the rest are hashed from their index.
    pub fn new() -> Self {
        let mut g = [RISTRETTO_BASEPOINT_POINT; PEDERSEN_GENERATOR_COUNT];
        for (i, gi) in g.iter_mut().enumerate().skip(1) {
            let mut seed = b"privacy-core/pedersen/".to_vec();
            seed.push(i as u8);
            *gi = hash_to_point(&seed);
        }
        Self { g }
    }

    pub fn base(&self, index: usize) -> &RistrettoPoint {
        &self.g[index]
    }

    pub fn value_base(&self) -> &RistrettoPoint {
        &self.g[PEDERSEN_VALUE_INDEX]
    }

    pub fn randomness_base(&self) -> &RistrettoPoint {
        &self.g[PEDERSEN_RANDOMNESS_INDEX]
    }

    /// `G[index]^value · G[Randomness]^rand`.
    pub fn commit_at_index(&self, value: &Scalar, rand: &Scalar, index: usize) -> RistrettoPoint {
        value * self.g[index] + rand * self.g[PEDERSEN_RANDOMNESS_INDEX]
    }

    /// `Σ values[i]·G[i]` over the full generator set.
    pub fn commit_all(&self, values: &[Scalar; PEDERSEN_GENERATOR_COUNT]) -> RistrettoPoint {
        RistrettoPoint::multiscalar_mul(values.iter(), self.g.iter())
    }

    /// `Σ values[i]·G[indices[i]]`.
    pub fn multi_commit(&self, values: &[Scalar], indices: &[usize]) -> Result<RistrettoPoint> {
        if values.len() != indices.len() {
            return Err(PrivacyError::InvalidInput("commitment values and indices differ"));
        }
        let mut bases = Vec::with_capacity(indices.len());
        for &i in indices {
            bases.push(
                *self
                    .g
                    .get(i)
                    .ok_or(PrivacyError::InvalidInput("generator index out of range"))?,
            );
        }
        Ok(RistrettoPoint::multiscalar_mul(values.iter(), bases.iter()))
    }
}

/// Process-wide generator set, computed on first use and never modified.
pub fn pedersen() -> &'static PedersenGens {
    static GENS: OnceLock<PedersenGens> = OnceLock::new();
    GENS.get_or_init(PedersenGens::new)
}

/// Serial number `(sk + snd)^{-1}·G[0]`.
pub fn derive_serial_number(sk: &Scalar, snd: &Scalar) -> RistrettoPoint {
    (sk + snd).invert() * pedersen().g[PEDERSEN_PRIVATE_KEY_INDEX]
}
