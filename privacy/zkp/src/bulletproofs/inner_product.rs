//! Logarithmic inner-product argument.
//!
//! Proves knowledge of `a`, `b` with `P = <a, G> + <b, H> + <a, b>·U`.
//! Each round halves the vectors:
//!
//! ```text
//! L = <a_lo, G_hi> + <b_hi, H_lo> + <a_lo, b_hi>·U
//! R = <a_hi, G_lo> + <b_lo, H_hi> + <a_hi, b_lo>·U
//! G' = x^{-1}·G_lo + x·G_hi      H' = x·H_lo + x^{-1}·H_hi
//! a' = x·a_lo + x^{-1}·a_hi      b' = x^{-1}·b_lo + x·b_hi
//! ```
//!
//! Encoding: `count(1) || (L || R) × count || a || b || p`.

use curve25519_dalek::{
    ristretto::RistrettoPoint,
    scalar::Scalar,
    traits::{IsIdentity, MultiscalarMul, VartimeMultiscalarMul},
};
use merlin::Transcript;
use privacy_primitives::{
    append_point, challenge_scalar,
    encoding::{point_to_bytes, Reader},
    labels, PrivacyError, Result,
};

/// Upper bound on folding rounds: `log2(MAX_EXP · MAX_OUTPUT_COIN)`.
const MAX_ROUNDS: usize = 11;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerProductProof {
    pub(crate) l: Vec<RistrettoPoint>,
    pub(crate) r: Vec<RistrettoPoint>,
    pub(crate) a: Scalar,
    pub(crate) b: Scalar,
    pub(crate) p: RistrettoPoint,
}

pub fn inner_product(a: &[Scalar], b: &[Scalar]) -> Scalar {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn round_challenge(t: &mut Transcript, l: &RistrettoPoint, r: &RistrettoPoint) -> Scalar {
    append_point(t, b"L", l);
    append_point(t, b"R", r);
    challenge_scalar(t, labels::CHAL_IPA)
}

impl InnerProductProof {
    /// Runs the prover against generators `g`, `h`, `u`; `p` is the statement point.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the vector lengths disagree or are not a power of two.
    pub fn prove(
        t: &mut Transcript,
        g: &[RistrettoPoint],
        h: &[RistrettoPoint],
        u: &RistrettoPoint,
        p: RistrettoPoint,
        a: Vec<Scalar>,
        b: Vec<Scalar>,
    ) -> Result<Self> {
        let n = a.len();
        if n == 0 || !n.is_power_of_two() || b.len() != n || g.len() != n || h.len() != n {
            return Err(PrivacyError::InvalidInput("inner product vector lengths"));
        }

        let mut a = a;
        let mut b = b;
        let mut g = g.to_vec();
        let mut h = h.to_vec();
        let mut ls = Vec::new();
        let mut rs = Vec::new();

        let mut n = n;
        while n > 1 {
            n /= 2;
            let (a_lo, a_hi) = a.split_at(n);
            let (b_lo, b_hi) = b.split_at(n);
            let (g_lo, g_hi) = g.split_at(n);
            let (h_lo, h_hi) = h.split_at(n);

            let c_l = inner_product(a_lo, b_hi);
            let c_r = inner_product(a_hi, b_lo);

            let l = RistrettoPoint::multiscalar_mul(
                a_lo.iter().chain(b_hi).chain(std::iter::once(&c_l)),
                g_hi.iter().chain(h_lo).chain(std::iter::once(u)),
            );
            let r = RistrettoPoint::multiscalar_mul(
                a_hi.iter().chain(b_lo).chain(std::iter::once(&c_r)),
                g_lo.iter().chain(h_hi).chain(std::iter::once(u)),
            );

            let x = round_challenge(t, &l, &r);
            let x_inv = x.invert();

            let next_a = (0..n).map(|i| a_lo[i] * x + a_hi[i] * x_inv).collect();
            let next_b = (0..n).map(|i| b_lo[i] * x_inv + b_hi[i] * x).collect();
            let next_g = (0..n)
                .map(|i| RistrettoPoint::vartime_multiscalar_mul([x_inv, x], [g_lo[i], g_hi[i]]))
                .collect();
            let next_h = (0..n)
                .map(|i| RistrettoPoint::vartime_multiscalar_mul([x, x_inv], [h_lo[i], h_hi[i]]))
                .collect();

            a = next_a;
            b = next_b;
            g = next_g;
            h = next_h;
            ls.push(l);
            rs.push(r);
        }

        Ok(Self {
            l: ls,
            r: rs,
            a: a[0],
            b: b[0],
            p,
        })
    }

    pub fn p(&self) -> &RistrettoPoint {
        &self.p
    }

    pub fn rounds(&self) -> usize {
        self.l.len()
    }

    fn check_shape(&self, n: usize) -> bool {
        self.l.len() == self.r.len() && n.is_power_of_two() && 1usize << self.l.len() == n
    }

    /// Folds the generators round by round and checks the final relation.
    pub fn verify(
        &self,
        t: &mut Transcript,
        g: &[RistrettoPoint],
        h: &[RistrettoPoint],
        u: &RistrettoPoint,
    ) -> bool {
        let n = g.len();
        if h.len() != n || !self.check_shape(n) {
            return false;
        }

        let mut g = g.to_vec();
        let mut h = h.to_vec();
        let mut p = self.p;
        let mut n = n;
        for (l, r) in self.l.iter().zip(&self.r) {
            n /= 2;
            let x = round_challenge(t, l, r);
            let x_inv = x.invert();
            let x_sq = x * x;
            let x_inv_sq = x_inv * x_inv;

            let (g_lo, g_hi) = g.split_at(n);
            let (h_lo, h_hi) = h.split_at(n);
            let next_g: Vec<RistrettoPoint> = (0..n)
                .map(|i| RistrettoPoint::vartime_multiscalar_mul([x_inv, x], [g_lo[i], g_hi[i]]))
                .collect();
            let next_h: Vec<RistrettoPoint> = (0..n)
                .map(|i| RistrettoPoint::vartime_multiscalar_mul([x, x_inv], [h_lo[i], h_hi[i]]))
                .collect();
            g = next_g;
            h = next_h;
            p = RistrettoPoint::vartime_multiscalar_mul([x_sq, Scalar::ONE, x_inv_sq], [*l, p, *r]);
        }

        let expected = RistrettoPoint::vartime_multiscalar_mul(
            [self.a, self.b, self.a * self.b],
            [g[0], h[0], *u],
        );
        expected == p
    }

    /// Single multiscalar-multiplication verification.
    ///
    /// Equivalent to [`Self::verify`]: the folded generators are expanded as
    /// `G'_0 = Σ s_i·G_i` and `H'_0 = Σ s_i^{-1}·H_i`.
    pub fn verify_faster(
        &self,
        t: &mut Transcript,
        g: &[RistrettoPoint],
        h: &[RistrettoPoint],
        u: &RistrettoPoint,
    ) -> bool {
        self.verify_scaled(t, g, h, None, u)
    }

    /// As [`Self::verify_faster`], with `H_i` implicitly replaced by `h_scale[i]·H_i`.
    pub(crate) fn verify_scaled(
        &self,
        t: &mut Transcript,
        g: &[RistrettoPoint],
        h: &[RistrettoPoint],
        h_scale: Option<&[Scalar]>,
        u: &RistrettoPoint,
    ) -> bool {
        let n = g.len();
        if h.len() != n || !self.check_shape(n) {
            return false;
        }
        if h_scale.is_some_and(|s| s.len() != n) {
            return false;
        }

        let rounds = self.l.len();
        let mut x_sq = Vec::with_capacity(rounds);
        let mut x_inv_sq = Vec::with_capacity(rounds);
        let mut all_inv = Scalar::ONE;
        for (l, r) in self.l.iter().zip(&self.r) {
            let x = round_challenge(t, l, r);
            let x_inv = x.invert();
            all_inv *= x_inv;
            x_sq.push(x * x);
            x_inv_sq.push(x_inv * x_inv);
        }

        // s_i = Π_k x_k^{b(i, k)}, where b(i, k) = +1 if bit (rounds-1-k) of i is set, else -1
        let mut s = Vec::with_capacity(n);
        s.push(all_inv);
        for i in 1..n {
            let msb = usize::BITS as usize - 1 - i.leading_zeros() as usize;
            let k = rounds - 1 - msb;
            s.push(s[i - (1 << msb)] * x_sq[k]);
        }

        let ab = self.a * self.b;
        let g_scalars = s.iter().map(|s_i| self.a * s_i);
        let h_scalars = (0..n).map(|i| {
            let base = self.b * s[n - 1 - i];
            match h_scale {
                Some(scale) => base * scale[i],
                None => base,
            }
        });
        let scalars = g_scalars
            .chain(h_scalars)
            .chain(std::iter::once(ab))
            .chain(x_sq.iter().map(|v| -v))
            .chain(x_inv_sq.iter().map(|v| -v))
            .chain(std::iter::once(-Scalar::ONE));
        let points = g
            .iter()
            .chain(h)
            .chain(std::iter::once(u))
            .chain(&self.l)
            .chain(&self.r)
            .chain(std::iter::once(&self.p));

        RistrettoPoint::vartime_multiscalar_mul(scalars, points).is_identity()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + (2 * self.l.len() + 3) * 32);
        out.push(self.l.len() as u8);
        for (l, r) in self.l.iter().zip(&self.r) {
            out.extend_from_slice(&point_to_bytes(l));
            out.extend_from_slice(&point_to_bytes(r));
        }
        out.extend_from_slice(self.a.as_bytes());
        out.extend_from_slice(self.b.as_bytes());
        out.extend_from_slice(&point_to_bytes(&self.p));
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        let proof = Self::read(&mut r)?;
        r.finish()?;
        Ok(proof)
    }

    pub(crate) fn read(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_u8()? as usize;
        if count > MAX_ROUNDS {
            return Err(PrivacyError::MalformedEncoding("inner product round count"));
        }
        let mut ls = Vec::with_capacity(count);
        let mut rs = Vec::with_capacity(count);
        for _ in 0..count {
            ls.push(r.read_point()?);
            rs.push(r.read_point()?);
        }
        Ok(Self {
            l: ls,
            r: rs,
            a: r.read_scalar()?,
            b: r.read_scalar()?,
            p: r.read_point()?,
        })
    }
}
