//! Serial-number proof without hiding.
//!
//! Statement: `sn = (sk + snd)^{-1}·G0`, `pk = G0^sk`, `snd` public.
//! The prover shows knowledge of `sk` for both relations at once.
//!
//! ```text
//! sn(32) || pk(32) || snd(32) || tSeed(32) || tOutput(32) || zSeed(32)
//! ```

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use log::warn;
use privacy_primitives::{
    append_point, append_scalar, challenge_scalar,
    encoding::{point_to_bytes, Reader},
    labels, new_transcript, pedersen, random_scalar,
    params::POINT_SIZE,
    PrivacyError, Result, PEDERSEN_PRIVATE_KEY_INDEX,
};
use rand::{CryptoRng, RngCore};

pub const SN_NO_PRIVACY_PROOF_SIZE: usize = 6 * POINT_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnNoPrivacyStatement {
    /// Serial number.
    pub output: RistrettoPoint,
    /// Owner public key.
    pub vkey: RistrettoPoint,
    /// Serial-number derivator.
    pub input: Scalar,
}

#[derive(Clone, Debug)]
pub struct SnNoPrivacyWitness {
    stmt: SnNoPrivacyStatement,
    seed: Scalar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnNoPrivacyProof {
    pub stmt: SnNoPrivacyStatement,
    t_seed: RistrettoPoint,
    t_output: RistrettoPoint,
    z_seed: Scalar,
}

fn challenge(
    stmt: &SnNoPrivacyStatement,
    t_seed: &RistrettoPoint,
    t_output: &RistrettoPoint,
    mess: Option<&Scalar>,
) -> Scalar {
    if let Some(x) = mess {
        return *x;
    }
    let mut t = new_transcript(labels::SN_NO_PRIVACY);
    append_point(&mut t, b"sn", &stmt.output);
    append_point(&mut t, b"pk", &stmt.vkey);
    append_scalar(&mut t, b"snd", &stmt.input);
    append_point(&mut t, b"t_seed", t_seed);
    append_point(&mut t, b"t_output", t_output);
    challenge_scalar(&mut t, labels::CHAL_X)
}

impl SnNoPrivacyWitness {
    pub fn new(output: RistrettoPoint, vkey: RistrettoPoint, input: Scalar, seed: Scalar) -> Self {
        Self {
            stmt: SnNoPrivacyStatement {
                output,
                vkey,
                input,
            },
            seed,
        }
    }

    pub fn statement(&self) -> &SnNoPrivacyStatement {
        &self.stmt
    }

    /// `mess` replaces the Fiat–Shamir challenge when the caller batches proofs.
    pub fn prove<R: RngCore + CryptoRng>(&self, mess: Option<&Scalar>, rng: &mut R) -> SnNoPrivacyProof {
        let e = random_scalar(rng);
        let t_seed = e * pedersen().g[PEDERSEN_PRIVATE_KEY_INDEX];
        let t_output = e * self.stmt.output;
        let x = challenge(&self.stmt, &t_seed, &t_output, mess);
        SnNoPrivacyProof {
            stmt: self.stmt,
            t_seed,
            t_output,
            z_seed: self.seed * x + e,
        }
    }
}

impl SnNoPrivacyProof {
    pub fn verify(&self, mess: Option<&Scalar>) -> Result<()> {
        let g0 = pedersen().g[PEDERSEN_PRIVATE_KEY_INDEX];
        let x = challenge(&self.stmt, &self.t_seed, &self.t_output, mess);

        // G0^z == pk^x · tSeed
        if self.z_seed * g0 != x * self.stmt.vkey + self.t_seed {
            warn!("serial number proof: public key relation failed");
            return Err(PrivacyError::ProofVerificationFailed(
                "serial number no-privacy: public key relation",
            ));
        }
        // sn^(z + x·snd) == G0^x · tOutput
        if (self.z_seed + x * self.stmt.input) * self.stmt.output != x * g0 + self.t_output {
            warn!("serial number proof: serial number relation failed");
            return Err(PrivacyError::ProofVerificationFailed(
                "serial number no-privacy: serial number relation",
            ));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SN_NO_PRIVACY_PROOF_SIZE);
        out.extend_from_slice(&point_to_bytes(&self.stmt.output));
        out.extend_from_slice(&point_to_bytes(&self.stmt.vkey));
        out.extend_from_slice(self.stmt.input.as_bytes());
        out.extend_from_slice(&point_to_bytes(&self.t_seed));
        out.extend_from_slice(&point_to_bytes(&self.t_output));
        out.extend_from_slice(self.z_seed.as_bytes());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != SN_NO_PRIVACY_PROOF_SIZE {
            return Err(PrivacyError::MalformedEncoding("serial number no-privacy proof length"));
        }
        let mut r = Reader::new(b);
        let stmt = SnNoPrivacyStatement {
            output: r.read_point()?,
            vkey: r.read_point()?,
            input: r.read_scalar()?,
        };
        Ok(Self {
            stmt,
            t_seed: r.read_point()?,
            t_output: r.read_point()?,
            z_seed: r.read_scalar()?,
        })
    }
}
