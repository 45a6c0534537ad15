use std::sync::OnceLock;

use curve25519_dalek::ristretto::RistrettoPoint;
use privacy_primitives::{
    hash_to_point,
    params::{MAX_EXP, MAX_OUTPUT_COIN},
};

const LABEL_G: &[u8] = b"privacy-core/bulletproofs/G";
const LABEL_H: &[u8] = b"privacy-core/bulletproofs/H";
const LABEL_U: &[u8] = b"privacy-core/bulletproofs/U";

/// Vector generators `G_i`, `H_i` and the inner-product base `U`.
///
/// Derived by hashing fixed labels, so no discrete-log relation between them
/// or with the Pedersen generators is known.
#[derive(Clone, Debug)]
pub struct BulletproofGens {
    pub g_vec: Vec<RistrettoPoint>,
    pub h_vec: Vec<RistrettoPoint>,
    pub u: RistrettoPoint,
}

fn labelled(label: &[u8], i: u32) -> RistrettoPoint {
    let mut data = Vec::with_capacity(label.len() + 4);
    data.extend_from_slice(label);
    data.extend_from_slice(&i.to_be_bytes());
    hash_to_point(&data)
}

impl BulletproofGens {
    pub fn new(capacity: usize) -> Self {
        let g_vec = (0..capacity as u32).map(|i| labelled(LABEL_G, i)).collect();
        let h_vec = (0..capacity as u32).map(|i| labelled(LABEL_H, i)).collect();
        Self {
            g_vec,
            h_vec,
            u: hash_to_point(LABEL_U),
        }
    }

    pub fn capacity(&self) -> usize {
        self.g_vec.len()
    }
}

/// Generators sized for `MAX_OUTPUT_COIN` aggregated `MAX_EXP`-bit values.
pub fn bulletproof_gens() -> &'static BulletproofGens {
    static GENS: OnceLock<BulletproofGens> = OnceLock::new();
    GENS.get_or_init(|| BulletproofGens::new(MAX_EXP * MAX_OUTPUT_COIN))
}
