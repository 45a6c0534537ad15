//! One-out-of-many proof over a ring of `COMMITMENT_RING_SIZE` commitments.
//!
//! The prover shows that one ring member at a hidden index `l` opens to zero,
//! i.e. `C_l = G4^r` for a known `r`. The index is decomposed into
//! `n = COMMITMENT_RING_SIZE_EXP` bits and every ring member is weighted by a
//! degree-`n` polynomial whose leading coefficient is one only at `l`.
//!
//! ```text
//! cl[n] || ca[n] || cb[n] || cd[n] || f[n] || za[n] || zb[n] || zd   ((7n + 1) × 32)
//! ```

use curve25519_dalek::{
    ristretto::RistrettoPoint,
    scalar::Scalar,
    traits::{IsIdentity, VartimeMultiscalarMul},
};
use log::{debug, warn};
use privacy_primitives::{
    append_points, challenge_scalar,
    encoding::{point_to_bytes, Reader},
    labels, new_transcript, pedersen,
    params::{COMMITMENT_RING_SIZE, COMMITMENT_RING_SIZE_EXP, POINT_SIZE},
    random_scalar, PrivacyError, Result, PEDERSEN_PRIVATE_KEY_INDEX, PEDERSEN_RANDOMNESS_INDEX,
};
use rand::{CryptoRng, RngCore};

pub const ONE_OF_MANY_PROOF_SIZE: usize = (7 * COMMITMENT_RING_SIZE_EXP + 1) * POINT_SIZE;

#[derive(Clone, Debug)]
pub struct OneOutOfManyWitness {
    rand: Scalar,
    index_is_zero: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OneOutOfManyProof {
    cl: Vec<RistrettoPoint>,
    ca: Vec<RistrettoPoint>,
    cb: Vec<RistrettoPoint>,
    cd: Vec<RistrettoPoint>,
    f: Vec<Scalar>,
    za: Vec<Scalar>,
    zb: Vec<Scalar>,
    zd: Scalar,
}

fn bit(i: usize, j: usize) -> bool {
    (i >> j) & 1 == 1
}

/// `G0^value · G4^rand`
fn commit(value: &Scalar, rand: &Scalar) -> RistrettoPoint {
    pedersen().commit_at_index(value, rand, PEDERSEN_PRIVATE_KEY_INDEX)
}

/// Multiplies `poly` in place by `(c1·x + c0)`.
fn mul_linear(poly: &mut Vec<Scalar>, c0: Scalar, c1: Scalar) {
    let mut next = vec![Scalar::ZERO; poly.len() + 1];
    for (k, coeff) in poly.iter().enumerate() {
        next[k] += coeff * c0;
        next[k + 1] += coeff * c1;
    }
    *poly = next;
}

fn read_points(r: &mut Reader<'_>, n: usize) -> Result<Vec<RistrettoPoint>> {
    (0..n).map(|_| r.read_point()).collect()
}

fn read_scalars(r: &mut Reader<'_>, n: usize) -> Result<Vec<Scalar>> {
    (0..n).map(|_| r.read_scalar()).collect()
}

fn challenge(
    commitments: &[RistrettoPoint],
    cl: &[RistrettoPoint],
    ca: &[RistrettoPoint],
    cb: &[RistrettoPoint],
    cd: &[RistrettoPoint],
) -> Scalar {
    let mut t = new_transcript(labels::ONE_OF_MANY);
    append_points(&mut t, b"ring", commitments);
    append_points(&mut t, b"cl", cl);
    append_points(&mut t, b"ca", ca);
    append_points(&mut t, b"cb", cb);
    append_points(&mut t, b"cd", cd);
    challenge_scalar(&mut t, labels::CHAL_X)
}

impl OneOutOfManyWitness {
    pub fn new(rand: Scalar, index_is_zero: usize) -> Self {
        Self {
            rand,
            index_is_zero,
        }
    }

    pub fn index(&self) -> usize {
        self.index_is_zero
    }

    /// Proves that `commitments[index]` opens to zero under randomness `rand`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the ring has the wrong size, the index is out
    /// of range, or the selected member does not open to zero.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        commitments: &[RistrettoPoint],
        rng: &mut R,
    ) -> Result<OneOutOfManyProof> {
        let n = COMMITMENT_RING_SIZE_EXP;
        let l = self.index_is_zero;
        if commitments.len() != COMMITMENT_RING_SIZE {
            return Err(PrivacyError::InvalidInput("ring size"));
        }
        if l >= COMMITMENT_RING_SIZE {
            return Err(PrivacyError::InvalidInput("ring index out of range"));
        }
        if commitments[l] != commit(&Scalar::ZERO, &self.rand) {
            return Err(PrivacyError::InvalidInput("ring member does not open to zero"));
        }
        debug!("one-out-of-many: proving over ring of {}", commitments.len());

        let mut cl = Vec::with_capacity(n);
        let mut ca = Vec::with_capacity(n);
        let mut cb = Vec::with_capacity(n);
        let mut r = Vec::with_capacity(n);
        let mut a = Vec::with_capacity(n);
        let mut s = Vec::with_capacity(n);
        let mut t = Vec::with_capacity(n);
        let mut u = Vec::with_capacity(n);
        for j in 0..n {
            let l_j = Scalar::from(bit(l, j) as u64);
            let (r_j, a_j, s_j, t_j) = (
                random_scalar(rng),
                random_scalar(rng),
                random_scalar(rng),
                random_scalar(rng),
            );
            cl.push(commit(&l_j, &r_j));
            ca.push(commit(&a_j, &s_j));
            cb.push(commit(&(l_j * a_j), &t_j));
            r.push(r_j);
            a.push(a_j);
            s.push(s_j);
            t.push(t_j);
            u.push(random_scalar(rng));
        }

        // p_i(x) = Π_j f_{j, i_j}(x), with f_{j,1} = l_j·x + a_j and f_{j,0} = (1 - l_j)·x - a_j
        let polys: Vec<Vec<Scalar>> = (0..COMMITMENT_RING_SIZE)
            .map(|i| {
                let mut poly = vec![Scalar::ONE];
                for j in 0..n {
                    let l_j = Scalar::from(bit(l, j) as u64);
                    if bit(i, j) {
                        mul_linear(&mut poly, a[j], l_j);
                    } else {
                        mul_linear(&mut poly, -a[j], Scalar::ONE - l_j);
                    }
                }
                poly
            })
            .collect();

        let h = pedersen().g[PEDERSEN_RANDOMNESS_INDEX];
        let cd: Vec<RistrettoPoint> = (0..n)
            .map(|k| {
                let weighted: RistrettoPoint = commitments
                    .iter()
                    .zip(polys.iter())
                    .map(|(c, p)| p[k] * c)
                    .sum();
                weighted + u[k] * h
            })
            .collect();

        let x = challenge(commitments, &cl, &ca, &cb, &cd);

        let mut f = Vec::with_capacity(n);
        let mut za = Vec::with_capacity(n);
        let mut zb = Vec::with_capacity(n);
        for j in 0..n {
            let l_j = Scalar::from(bit(l, j) as u64);
            let f_j = l_j * x + a[j];
            za.push(r[j] * x + s[j]);
            zb.push(r[j] * (x - f_j) + t[j]);
            f.push(f_j);
        }

        let mut x_pow = Scalar::ONE;
        let mut masked = Scalar::ZERO;
        for u_k in &u {
            masked += u_k * x_pow;
            x_pow *= x;
        }
        let zd = self.rand * x_pow - masked;

        Ok(OneOutOfManyProof {
            cl,
            ca,
            cb,
            cd,
            f,
            za,
            zb,
            zd,
        })
    }
}

impl OneOutOfManyProof {
    pub fn verify(&self, commitments: &[RistrettoPoint]) -> Result<()> {
        let n = COMMITMENT_RING_SIZE_EXP;
        if commitments.len() != COMMITMENT_RING_SIZE {
            return Err(PrivacyError::InvalidInput("ring size"));
        }
        let lengths = [
            self.cl.len(),
            self.ca.len(),
            self.cb.len(),
            self.cd.len(),
            self.f.len(),
            self.za.len(),
            self.zb.len(),
        ];
        if lengths.iter().any(|len| *len != n) {
            return Err(PrivacyError::MalformedEncoding("one-out-of-many component count"));
        }

        let gens = pedersen();
        let h = gens.g[PEDERSEN_RANDOMNESS_INDEX];
        let x = challenge(commitments, &self.cl, &self.ca, &self.cb, &self.cd);

        for j in 0..n {
            // cl^x · ca == G0^f · G4^za
            if x * self.cl[j] + self.ca[j] != commit(&self.f[j], &self.za[j]) {
                warn!("one-out-of-many: bit commitment {j} failed");
                return Err(PrivacyError::ProofVerificationFailed("one-out-of-many: bit opening"));
            }
            // cl^(x - f) · cb == G4^zb
            if (x - self.f[j]) * self.cl[j] + self.cb[j] != self.zb[j] * h {
                warn!("one-out-of-many: bit product {j} failed");
                return Err(PrivacyError::ProofVerificationFailed("one-out-of-many: bit product"));
            }
        }

        // Π_i C_i^{Π_j f_{j,i_j}} · Π_k cd_k^{-x^k} == G4^zd
        let mut scalars = Vec::with_capacity(COMMITMENT_RING_SIZE + n + 1);
        let mut points = Vec::with_capacity(COMMITMENT_RING_SIZE + n + 1);
        for (i, c) in commitments.iter().enumerate() {
            let weight = (0..n).fold(Scalar::ONE, |acc, j| {
                if bit(i, j) {
                    acc * self.f[j]
                } else {
                    acc * (x - self.f[j])
                }
            });
            scalars.push(weight);
            points.push(*c);
        }
        let mut x_pow = Scalar::ONE;
        for cd_k in &self.cd {
            scalars.push(-x_pow);
            points.push(*cd_k);
            x_pow *= x;
        }
        scalars.push(-self.zd);
        points.push(h);

        if !RistrettoPoint::vartime_multiscalar_mul(scalars, points).is_identity() {
            warn!("one-out-of-many: ring relation failed");
            return Err(PrivacyError::ProofVerificationFailed("one-out-of-many: ring relation"));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ONE_OF_MANY_PROOF_SIZE);
        for list in [&self.cl, &self.ca, &self.cb, &self.cd] {
            for p in list {
                out.extend_from_slice(&point_to_bytes(p));
            }
        }
        for list in [&self.f, &self.za, &self.zb] {
            for s in list {
                out.extend_from_slice(s.as_bytes());
            }
        }
        out.extend_from_slice(self.zd.as_bytes());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != ONE_OF_MANY_PROOF_SIZE {
            return Err(PrivacyError::MalformedEncoding("one-out-of-many proof length"));
        }
        let n = COMMITMENT_RING_SIZE_EXP;
        let mut r = Reader::new(b);
        let cl = read_points(&mut r, n)?;
        let ca = read_points(&mut r, n)?;
        let cb = read_points(&mut r, n)?;
        let cd = read_points(&mut r, n)?;
        let f = read_scalars(&mut r, n)?;
        let za = read_scalars(&mut r, n)?;
        let zb = read_scalars(&mut r, n)?;
        let zd = r.read_scalar()?;
        Ok(Self {
            cl,
            ca,
            cb,
            cd,
            f,
            za,
            zb,
            zd,
        })
    }
}
