//! # privacy-primitives
//!
//! Building blocks shared by the coin model and every proof system:
//!
//! - [`pedersen`]: the ordered generator set `G[0..5)` and multi-base commitments
//! - [`hash`]: domain-separated hash-to-scalar / hash-to-point
//! - [`transcript`]: Fiat–Shamir helpers over `merlin`
//! - [`encoding`]: bounds-checked readers and the optional-field codec
//! - [`keys`]: private key, payment address, viewing/OTA keys, key sets
//! - [`hybrid`]: ElGamal key encapsulation + AES-CTR data encapsulation
//! - [`params`]: protocol constants and the explicit shard configuration
//!
//! ## Generator roles
//!
//! ```text
//! G[0] private key   G[1] value   G[2] serial-number derivator
//! G[3] shard id      G[4] randomness
//! ```

pub mod elgamal;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod hybrid;
pub mod keys;
pub mod params;
pub mod pedersen;
pub mod transcript;
#[cfg(test)]
mod tests;

pub use error::{PrivacyError, Result};
pub use hash::{hash_to_point, hash_to_scalar, hash_to_scalar_parts, random_point, random_scalar};
pub use hybrid::{hybrid_decrypt, hybrid_decrypt_bytes, hybrid_encrypt, HybridCipherText};
pub use keys::{KeySet, OtaKey, PaymentAddress, PaymentInfo, PrivateKey, ViewingKey};
pub use params::{CoinPrivacyType, PrivacyParams, ShardInfo};
pub use pedersen::{
    derive_serial_number, pedersen, PedersenGens, PEDERSEN_PRIVATE_KEY_INDEX,
    PEDERSEN_RANDOMNESS_INDEX, PEDERSEN_SHARD_ID_INDEX, PEDERSEN_SND_INDEX, PEDERSEN_VALUE_INDEX,
};
pub use transcript::{append_point, append_points, append_scalar, challenge_scalar, labels, new_transcript};
