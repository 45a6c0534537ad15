//! ElGamal over Ristretto, used as the key-encapsulation half of hybrid encryption.

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G, ristretto::RistrettoPoint, scalar::Scalar,
};
use rand::{CryptoRng, RngCore};

use crate::{
    encoding::{write_opt_point, Reader},
    hash::random_scalar,
    params::POINT_SIZE,
    PrivacyError, Result,
};

/// `0x20 ‖ C1 ‖ 0x20 ‖ C2`.
pub const ELGAMAL_CIPHERTEXT_SIZE: usize = 2 * (POINT_SIZE + 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    pub c1: RistrettoPoint,
    pub c2: RistrettoPoint,
}

impl ElGamalCiphertext {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ELGAMAL_CIPHERTEXT_SIZE);
        write_opt_point(&mut out, Some(&self.c1));
        write_opt_point(&mut out, Some(&self.c2));
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != ELGAMAL_CIPHERTEXT_SIZE {
            return Err(PrivacyError::MalformedEncoding("elgamal ciphertext length"));
        }
        let mut r = Reader::new(b);
        let c1 = r.read_prefixed_point()?;
        let c2 = r.read_prefixed_point()?;
        Ok(Self { c1, c2 })
    }
}

/// `(G^k, pub^k · m)` for fresh `k`.
pub fn encrypt<R: RngCore + CryptoRng>(
    public_key: &RistrettoPoint,
    message: &RistrettoPoint,
    rng: &mut R,
) -> ElGamalCiphertext {
    let k = random_scalar(rng);
    ElGamalCiphertext {
        c1: k * G,
        c2: k * public_key + message,
    }
}

pub fn decrypt(secret_key: &Scalar, ct: &ElGamalCiphertext) -> RistrettoPoint {
    ct.c2 - secret_key * ct.c1
}
