//! Serial-number proof with hidden key and derivator.
//!
//! Statement: `sn = (sk + snd)^{-1}·G0`, with `comSK = G0^sk·G4^rSK` and
//! `comInput = G2^snd·G4^rInput`. `comSK` is shared by every input of a
//! transaction, so it travels once with the enclosing proof and is handed to
//! [`SnPrivacyProof::verify`] rather than serialized here.
//!
//! ```text
//! sn || comInput || tSK || tInput || tSN || zSK || zRSK || zInput || zRInput   (9 × 32)
//! ```

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use log::warn;
use privacy_primitives::{
    append_point, challenge_scalar,
    encoding::{point_to_bytes, Reader},
    labels, new_transcript, pedersen, random_scalar,
    params::POINT_SIZE,
    PrivacyError, Result, PEDERSEN_PRIVATE_KEY_INDEX, PEDERSEN_SND_INDEX,
};
use rand::{CryptoRng, RngCore};

pub const SN_PRIVACY_PROOF_SIZE: usize = 9 * POINT_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnPrivacyStatement {
    pub sn: RistrettoPoint,
    pub com_sk: RistrettoPoint,
    pub com_input: RistrettoPoint,
}

#[derive(Clone, Debug)]
pub struct SnPrivacyWitness {
    stmt: SnPrivacyStatement,
    sk: Scalar,
    r_sk: Scalar,
    input: Scalar,
    r_input: Scalar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnPrivacyProof {
    sn: RistrettoPoint,
    com_input: RistrettoPoint,
    t_sk: RistrettoPoint,
    t_input: RistrettoPoint,
    t_sn: RistrettoPoint,
    z_sk: Scalar,
    z_rsk: Scalar,
    z_input: Scalar,
    z_rinput: Scalar,
}

fn challenge(
    stmt: &SnPrivacyStatement,
    t_sk: &RistrettoPoint,
    t_input: &RistrettoPoint,
    t_sn: &RistrettoPoint,
    mess: Option<&Scalar>,
) -> Scalar {
    if let Some(x) = mess {
        return *x;
    }
    let mut t = new_transcript(labels::SN_PRIVACY);
    append_point(&mut t, b"sn", &stmt.sn);
    append_point(&mut t, b"com_sk", &stmt.com_sk);
    append_point(&mut t, b"com_input", &stmt.com_input);
    append_point(&mut t, b"t_sk", t_sk);
    append_point(&mut t, b"t_input", t_input);
    append_point(&mut t, b"t_sn", t_sn);
    challenge_scalar(&mut t, labels::CHAL_X)
}

impl SnPrivacyWitness {
    pub fn new(stmt: SnPrivacyStatement, sk: Scalar, r_sk: Scalar, input: Scalar, r_input: Scalar) -> Self {
        Self {
            stmt,
            sk,
            r_sk,
            input,
            r_input,
        }
    }

    pub fn statement(&self) -> &SnPrivacyStatement {
        &self.stmt
    }

    pub fn prove<R: RngCore + CryptoRng>(&self, mess: Option<&Scalar>, rng: &mut R) -> SnPrivacyProof {
        let gens = pedersen();
        let e_sk = random_scalar(rng);
        let e_input = random_scalar(rng);
        let d_sk = random_scalar(rng);
        let d_input = random_scalar(rng);

        let t_sk = gens.commit_at_index(&e_sk, &d_sk, PEDERSEN_PRIVATE_KEY_INDEX);
        let t_input = gens.commit_at_index(&e_input, &d_input, PEDERSEN_SND_INDEX);
        let t_sn = (e_sk + e_input) * self.stmt.sn;

        let x = challenge(&self.stmt, &t_sk, &t_input, &t_sn, mess);
        SnPrivacyProof {
            sn: self.stmt.sn,
            com_input: self.stmt.com_input,
            t_sk,
            t_input,
            t_sn,
            z_sk: e_sk + self.sk * x,
            z_rsk: d_sk + self.r_sk * x,
            z_input: e_input + self.input * x,
            z_rinput: d_input + self.r_input * x,
        }
    }
}

impl SnPrivacyProof {
    pub fn serial_number(&self) -> &RistrettoPoint {
        &self.sn
    }

    pub fn com_input(&self) -> &RistrettoPoint {
        &self.com_input
    }

    pub fn verify(&self, com_sk: &RistrettoPoint, mess: Option<&Scalar>) -> Result<()> {
        let gens = pedersen();
        let stmt = SnPrivacyStatement {
            sn: self.sn,
            com_sk: *com_sk,
            com_input: self.com_input,
        };
        let x = challenge(&stmt, &self.t_sk, &self.t_input, &self.t_sn, mess);

        // comSK^x · tSK == G0^zSK · G4^zRSK
        if x * com_sk + self.t_sk
            != gens.commit_at_index(&self.z_sk, &self.z_rsk, PEDERSEN_PRIVATE_KEY_INDEX)
        {
            warn!("serial number proof: secret key opening failed");
            return Err(PrivacyError::ProofVerificationFailed(
                "serial number privacy: secret key opening",
            ));
        }
        // comInput^x · tInput == G2^zInput · G4^zRInput
        if x * self.com_input + self.t_input
            != gens.commit_at_index(&self.z_input, &self.z_rinput, PEDERSEN_SND_INDEX)
        {
            warn!("serial number proof: derivator opening failed");
            return Err(PrivacyError::ProofVerificationFailed(
                "serial number privacy: derivator opening",
            ));
        }
        // sn^(zSK + zInput) == G0^x · tSN
        if (self.z_sk + self.z_input) * self.sn
            != x * gens.g[PEDERSEN_PRIVATE_KEY_INDEX] + self.t_sn
        {
            warn!("serial number proof: serial number relation failed");
            return Err(PrivacyError::ProofVerificationFailed(
                "serial number privacy: serial number relation",
            ));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SN_PRIVACY_PROOF_SIZE);
        for p in [&self.sn, &self.com_input, &self.t_sk, &self.t_input, &self.t_sn] {
            out.extend_from_slice(&point_to_bytes(p));
        }
        for s in [&self.z_sk, &self.z_rsk, &self.z_input, &self.z_rinput] {
            out.extend_from_slice(s.as_bytes());
        }
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != SN_PRIVACY_PROOF_SIZE {
            return Err(PrivacyError::MalformedEncoding("serial number privacy proof length"));
        }
        let mut r = Reader::new(b);
        Ok(Self {
            sn: r.read_point()?,
            com_input: r.read_point()?,
            t_sk: r.read_point()?,
            t_input: r.read_point()?,
            t_sn: r.read_point()?,
            z_sk: r.read_scalar()?,
            z_rsk: r.read_scalar()?,
            z_input: r.read_scalar()?,
            z_rinput: r.read_scalar()?,
        })
    }
}
