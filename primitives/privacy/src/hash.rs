//! Domain-separated hashing onto the scalar field and the group.

use blake2::{Blake2b512, Digest};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use rand::{CryptoRng, RngCore};
use sha2::Sha512;

const HASH_TO_SCALAR_DOMAIN: &[u8] = b"privacy-core/hash-to-scalar";
const HASH_TO_POINT_DOMAIN: &[u8] = b"privacy-core/hash-to-point";

pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    hash_to_scalar_parts(&[data])
}

/// Hash the concatenation of `parts`, each length-framed so that part
/// boundaries cannot shift.
pub fn hash_to_scalar_parts(parts: &[&[u8]]) -> Scalar {
    let mut h = Blake2b512::new().chain_update(HASH_TO_SCALAR_DOMAIN);
    for part in parts {
        h.update((part.len() as u32).to_be_bytes());
        h.update(part);
    }
    Scalar::from_hash(h)
}

pub fn hash_to_point(data: &[u8]) -> RistrettoPoint {
    let h = Sha512::new()
        .chain_update(HASH_TO_POINT_DOMAIN)
        .chain_update(data);
    RistrettoPoint::from_hash(h)
}

/// Random scalar with full 512-bit input entropy.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Scalar::from_bytes_mod_order_wide(&bytes)
}

pub fn random_point<R: RngCore + CryptoRng>(rng: &mut R) -> RistrettoPoint {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    RistrettoPoint::from_uniform_bytes(&bytes)
}
