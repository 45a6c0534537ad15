//! Aggregated range proof: every committed value lies in `[0, 2^MAX_EXP)`.
//!
//! Values are committed as `V_j = base^v_j · G4^r_j`. `base` defaults to the
//! value generator `G1`; confidential-asset transfers substitute the blinded
//! asset tag. The value count is padded to a power of two with zero values.
//!
//! ```text
//! [0x00 || version]? || count(1) || V × count || A || S || T1 || T2 || tauX || tHat || mu || ipa
//! ```
//!
//! Version 1 carries no prefix. Any later version is prefixed with a zero
//! byte, which cannot collide with a count because `count >= 1`.

use std::iter::once;

use curve25519_dalek::{
    ristretto::RistrettoPoint,
    scalar::Scalar,
    traits::{IsIdentity, MultiscalarMul, VartimeMultiscalarMul},
};
use log::{debug, warn};
use merlin::Transcript;
use privacy_primitives::{
    append_point, append_points, append_scalar, challenge_scalar,
    encoding::{point_to_bytes, Reader},
    labels, new_transcript, pedersen,
    params::{MAX_EXP, MAX_OUTPUT_COIN, POINT_SIZE},
    random_scalar, PrivacyError, Result, PEDERSEN_RANDOMNESS_INDEX, PEDERSEN_VALUE_INDEX,
};
use rand::{CryptoRng, RngCore};

use super::{bulletproof_gens, inner_product, powers, InnerProductProof};

pub const RANGE_PROOF_VERSION_1: u8 = 1;
pub const RANGE_PROOF_VERSION_2: u8 = 2;

#[derive(Clone, Debug)]
pub struct AggregatedRangeWitness {
    values: Vec<u64>,
    rands: Vec<Scalar>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedRangeProof {
    version: u8,
    cms_value: Vec<RistrettoPoint>,
    a: RistrettoPoint,
    s: RistrettoPoint,
    t1: RistrettoPoint,
    t2: RistrettoPoint,
    tau_x: Scalar,
    t_hat: Scalar,
    mu: Scalar,
    inner_product_proof: InnerProductProof,
}

fn padded_size(count: usize) -> Result<(usize, usize)> {
    if count == 0 || count > MAX_OUTPUT_COIN {
        return Err(PrivacyError::InvalidInput("range proof value count"));
    }
    let m = count.next_power_of_two();
    Ok((m, m * MAX_EXP))
}

fn transcript(version: u8, base: &RistrettoPoint, cms: &[RistrettoPoint], m: usize) -> Transcript {
    let mut t = new_transcript(labels::RANGE_PROOF);
    t.append_u64(b"version", u64::from(version));
    append_point(&mut t, b"base", base);
    append_points(&mut t, b"V", cms);
    t.append_u64(b"m", m as u64);
    t
}

/// `z^{2+j}` for each aggregated value `j`.
fn z_weights(z: &Scalar, m: usize) -> Vec<Scalar> {
    let z_sq = z * z;
    powers(z, m).into_iter().map(|zp| zp * z_sq).collect()
}

impl AggregatedRangeWitness {
    pub fn new(values: Vec<u64>, rands: Vec<Scalar>) -> Result<Self> {
        padded_size(values.len())?;
        if rands.len() != values.len() {
            return Err(PrivacyError::InvalidInput("range proof randomness count"));
        }
        Ok(Self { values, rands })
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn rands(&self) -> &[Scalar] {
        &self.rands
    }

    /// Proves against the default value base `G1`.
    pub fn prove<R: RngCore + CryptoRng>(&self, version: u8, rng: &mut R) -> Result<AggregatedRangeProof> {
        self.prove_using_base(version, &pedersen().g[PEDERSEN_VALUE_INDEX], rng)
    }

    pub fn prove_using_base<R: RngCore + CryptoRng>(
        &self,
        version: u8,
        base: &RistrettoPoint,
        rng: &mut R,
    ) -> Result<AggregatedRangeProof> {
        let count = self.values.len();
        let (m, nm) = padded_size(count)?;
        debug!("range proof: proving {count} values padded to {m}");

        let gens = bulletproof_gens();
        let g = &gens.g_vec[..nm];
        let h = &gens.h_vec[..nm];
        let hb = pedersen().g[PEDERSEN_RANDOMNESS_INDEX];

        let cms_value: Vec<RistrettoPoint> = self
            .values
            .iter()
            .zip(&self.rands)
            .map(|(v, r)| RistrettoPoint::multiscalar_mul([Scalar::from(*v), *r], [*base, hb]))
            .collect();

        let mut a_l = vec![Scalar::ZERO; nm];
        for (j, v) in self.values.iter().enumerate() {
            for i in 0..MAX_EXP {
                if (v >> i) & 1 == 1 {
                    a_l[j * MAX_EXP + i] = Scalar::ONE;
                }
            }
        }
        let a_r: Vec<Scalar> = a_l.iter().map(|b| b - Scalar::ONE).collect();

        let alpha = random_scalar(rng);
        let a = RistrettoPoint::multiscalar_mul(
            a_l.iter().chain(&a_r).chain(once(&alpha)),
            g.iter().chain(h).chain(once(&hb)),
        );

        let s_l: Vec<Scalar> = (0..nm).map(|_| random_scalar(rng)).collect();
        let s_r: Vec<Scalar> = (0..nm).map(|_| random_scalar(rng)).collect();
        let rho = random_scalar(rng);
        let s = RistrettoPoint::multiscalar_mul(
            s_l.iter().chain(&s_r).chain(once(&rho)),
            g.iter().chain(h).chain(once(&hb)),
        );

        let mut t = transcript(version, base, &cms_value, m);
        append_point(&mut t, b"A", &a);
        append_point(&mut t, b"S", &s);
        let y = challenge_scalar(&mut t, labels::CHAL_Y);
        let z = challenge_scalar(&mut t, labels::CHAL_Z);

        let y_pow = powers(&y, nm);
        let two_pow = powers(&Scalar::from(2u64), MAX_EXP);
        let z_j = z_weights(&z, m);

        // l(X) = (aL - z) + sL·X
        // r(X) = y^n ∘ (aR + z + sR·X) + z^{2+j}·2^n
        let l0: Vec<Scalar> = a_l.iter().map(|v| v - z).collect();
        let r0: Vec<Scalar> = (0..nm)
            .map(|i| y_pow[i] * (a_r[i] + z) + z_j[i / MAX_EXP] * two_pow[i % MAX_EXP])
            .collect();
        let r1: Vec<Scalar> = (0..nm).map(|i| y_pow[i] * s_r[i]).collect();

        let t1 = inner_product(&l0, &r1) + inner_product(&s_l, &r0);
        let t2 = inner_product(&s_l, &r1);
        let tau1 = random_scalar(rng);
        let tau2 = random_scalar(rng);
        let t1_point = RistrettoPoint::multiscalar_mul([t1, tau1], [*base, hb]);
        let t2_point = RistrettoPoint::multiscalar_mul([t2, tau2], [*base, hb]);

        append_point(&mut t, b"T1", &t1_point);
        append_point(&mut t, b"T2", &t2_point);
        let x = challenge_scalar(&mut t, labels::CHAL_X);

        let l: Vec<Scalar> = (0..nm).map(|i| l0[i] + s_l[i] * x).collect();
        let r: Vec<Scalar> = (0..nm).map(|i| r0[i] + r1[i] * x).collect();
        let t_hat = inner_product(&l, &r);
        let blinded: Scalar = z_j.iter().zip(&self.rands).map(|(zw, rand)| zw * rand).sum();
        let tau_x = tau2 * x * x + tau1 * x + blinded;
        let mu = alpha + rho * x;

        append_scalar(&mut t, b"tau_x", &tau_x);
        append_scalar(&mut t, b"t_hat", &t_hat);
        append_scalar(&mut t, b"mu", &mu);
        let w = challenge_scalar(&mut t, labels::CHAL_W);
        let u = w * gens.u;

        let y_inv_pow = powers(&y.invert(), nm);
        let h_prime: Vec<RistrettoPoint> = h.iter().zip(&y_inv_pow).map(|(h_i, yi)| yi * h_i).collect();
        let p = RistrettoPoint::multiscalar_mul(
            l.iter().chain(&r).chain(once(&t_hat)),
            g.iter().chain(&h_prime).chain(once(&u)),
        );
        let inner_product_proof = InnerProductProof::prove(&mut t, g, &h_prime, &u, p, l, r)?;

        Ok(AggregatedRangeProof {
            version,
            cms_value,
            a,
            s,
            t1: t1_point,
            t2: t2_point,
            tau_x,
            t_hat,
            mu,
            inner_product_proof,
        })
    }
}

impl AggregatedRangeProof {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn commitments(&self) -> &[RistrettoPoint] {
        &self.cms_value
    }

    /// Replaces the value commitments, e.g. with the output coin commitments
    /// a verifier expects the proof to cover.
    pub fn set_commitments(&mut self, cms: Vec<RistrettoPoint>) {
        self.cms_value = cms;
    }

    pub fn inner_product_proof(&self) -> &InnerProductProof {
        &self.inner_product_proof
    }

    pub fn verify(&self) -> Result<()> {
        self.verify_with(&pedersen().g[PEDERSEN_VALUE_INDEX], false)
    }

    pub fn verify_faster(&self) -> Result<()> {
        self.verify_with(&pedersen().g[PEDERSEN_VALUE_INDEX], true)
    }

    pub fn verify_using_base(&self, base: &RistrettoPoint) -> Result<()> {
        self.verify_with(base, false)
    }

    pub fn verify_faster_using_base(&self, base: &RistrettoPoint) -> Result<()> {
        self.verify_with(base, true)
    }

    fn verify_with(&self, base: &RistrettoPoint, faster: bool) -> Result<()> {
        let (m, nm) = padded_size(self.cms_value.len())?;
        if self.inner_product_proof.rounds() >= usize::BITS as usize
            || 1usize << self.inner_product_proof.rounds() != nm
        {
            warn!("range proof: inner product size does not match {nm} bits");
            return Err(PrivacyError::ProofVerificationFailed("range proof: inner product size"));
        }

        let gens = bulletproof_gens();
        let g = &gens.g_vec[..nm];
        let h = &gens.h_vec[..nm];
        let hb = pedersen().g[PEDERSEN_RANDOMNESS_INDEX];

        let mut t = transcript(self.version, base, &self.cms_value, m);
        append_point(&mut t, b"A", &self.a);
        append_point(&mut t, b"S", &self.s);
        let y = challenge_scalar(&mut t, labels::CHAL_Y);
        let z = challenge_scalar(&mut t, labels::CHAL_Z);
        append_point(&mut t, b"T1", &self.t1);
        append_point(&mut t, b"T2", &self.t2);
        let x = challenge_scalar(&mut t, labels::CHAL_X);
        append_scalar(&mut t, b"tau_x", &self.tau_x);
        append_scalar(&mut t, b"t_hat", &self.t_hat);
        append_scalar(&mut t, b"mu", &self.mu);
        let w = challenge_scalar(&mut t, labels::CHAL_W);

        let y_pow = powers(&y, nm);
        let y_inv_pow = powers(&y.invert(), nm);
        let two_pow = powers(&Scalar::from(2u64), MAX_EXP);
        let z_j = z_weights(&z, m);

        // delta(y, z) = (z - z^2)·<1, y^nm> - Σ_j z^{3+j}·<1, 2^n>
        let sum_y: Scalar = y_pow.iter().sum();
        let sum_z3: Scalar = z_j.iter().map(|zw| zw * z).sum();
        let delta = (z - z * z) * sum_y - sum_z3 * Scalar::from(u64::MAX);

        // base^tHat · G4^tauX == Π V_j^{z^{2+j}} · base^delta · T1^x · T2^{x^2}
        let poly_check = RistrettoPoint::vartime_multiscalar_mul(
            [self.t_hat - delta, self.tau_x, -x, -(x * x)]
                .into_iter()
                .chain(z_j.iter().take(self.cms_value.len()).map(|zw| -zw)),
            [*base, hb, self.t1, self.t2].into_iter().chain(self.cms_value.iter().copied()),
        );
        if !poly_check.is_identity() {
            warn!("range proof: polynomial commitment check failed");
            return Err(PrivacyError::ProofVerificationFailed("range proof: polynomial check"));
        }

        // P = A · S^x · G^{-z} · H^{z + z^{2+j}·2^i·y^{-i}} · G4^{-mu} · U^{w·tHat}
        let h_scalars = (0..nm).map(|i| z + z_j[i / MAX_EXP] * two_pow[i % MAX_EXP] * y_inv_pow[i]);
        let expected_p = RistrettoPoint::vartime_multiscalar_mul(
            [Scalar::ONE, x, -self.mu, w * self.t_hat]
                .into_iter()
                .chain((0..nm).map(|_| -z))
                .chain(h_scalars),
            [self.a, self.s, hb, gens.u]
                .iter()
                .chain(g)
                .chain(h),
        );
        if expected_p != *self.inner_product_proof.p() {
            warn!("range proof: inner product statement mismatch");
            return Err(PrivacyError::ProofVerificationFailed("range proof: inner product statement"));
        }

        let u = w * gens.u;
        let ipa_ok = if faster {
            self.inner_product_proof
                .verify_scaled(&mut t, g, h, Some(&y_inv_pow), &u)
        } else {
            let h_prime: Vec<RistrettoPoint> =
                h.iter().zip(&y_inv_pow).map(|(h_i, yi)| yi * h_i).collect();
            self.inner_product_proof.verify(&mut t, g, &h_prime, &u)
        };
        if !ipa_ok {
            warn!("range proof: inner product argument failed");
            return Err(PrivacyError::ProofVerificationFailed("range proof: inner product argument"));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let ipa = self.inner_product_proof.to_bytes();
        let mut out = Vec::with_capacity(3 + (self.cms_value.len() + 7) * POINT_SIZE + ipa.len());
        if self.version >= RANGE_PROOF_VERSION_2 {
            out.push(0);
            out.push(self.version);
        }
        out.push(self.cms_value.len() as u8);
        for cm in &self.cms_value {
            out.extend_from_slice(&point_to_bytes(cm));
        }
        for p in [&self.a, &self.s, &self.t1, &self.t2] {
            out.extend_from_slice(&point_to_bytes(p));
        }
        for s in [&self.tau_x, &self.t_hat, &self.mu] {
            out.extend_from_slice(s.as_bytes());
        }
        out.extend_from_slice(&ipa);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        let mut version = RANGE_PROOF_VERSION_1;
        let mut count = r.read_u8()? as usize;
        if count == 0 {
            version = r.read_u8()?;
            if version < RANGE_PROOF_VERSION_2 {
                return Err(PrivacyError::MalformedEncoding("range proof version prefix"));
            }
            count = r.read_u8()? as usize;
        }
        if count == 0 || count > MAX_OUTPUT_COIN {
            return Err(PrivacyError::MalformedEncoding("range proof commitment count"));
        }
        let cms_value = (0..count).map(|_| r.read_point()).collect::<Result<Vec<_>>>()?;
        let proof = Self {
            version,
            cms_value,
            a: r.read_point()?,
            s: r.read_point()?,
            t1: r.read_point()?,
            t2: r.read_point()?,
            tau_x: r.read_scalar()?,
            t_hat: r.read_scalar()?,
            mu: r.read_scalar()?,
            inner_product_proof: InnerProductProof::read(&mut r)?,
        };
        r.finish()?;
        Ok(proof)
    }
}
