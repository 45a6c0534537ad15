//! Aggregated Bulletproofs range proof over `[0, 2^MAX_EXP)` and its inner-product argument.

mod generators;
mod inner_product;
mod range_proof;

pub use generators::{bulletproof_gens, BulletproofGens};
pub use inner_product::{inner_product, InnerProductProof};
pub use range_proof::{
    AggregatedRangeProof, AggregatedRangeWitness, RANGE_PROOF_VERSION_1, RANGE_PROOF_VERSION_2,
};

use curve25519_dalek::scalar::Scalar;

/// `[1, x, x^2, ..., x^{n-1}]`
pub(crate) fn powers(x: &Scalar, n: usize) -> Vec<Scalar> {
    let mut out = Vec::with_capacity(n);
    let mut acc = Scalar::ONE;
    for _ in 0..n {
        out.push(acc);
        acc *= x;
    }
    out
}
