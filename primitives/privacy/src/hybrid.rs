//! Hybrid encryption: ElGamal carries a random group element whose encoding
//! keys AES-256-CTR over the message.
//!
//! ```text
//! symKeyCiphertext(66) || IV(16) || AES-CTR(msg)
//! ```

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use log::warn;
use rand::{CryptoRng, RngCore};

use crate::{
    elgamal::{self, ElGamalCiphertext, ELGAMAL_CIPHERTEXT_SIZE},
    encoding::point_to_bytes,
    hash::random_point,
    PrivacyError, Result,
};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

pub const AES_IV_SIZE: usize = 16;
pub const HYBRID_MIN_SIZE: usize = ELGAMAL_CIPHERTEXT_SIZE + AES_IV_SIZE;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HybridCipherText {
    sym_key_encrypted: Vec<u8>,
    msg_encrypted: Vec<u8>,
}

impl HybridCipherText {
    pub fn is_empty(&self) -> bool {
        self.sym_key_encrypted.is_empty() && self.msg_encrypted.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.sym_key_encrypted.len() + self.msg_encrypted.len());
        out.extend_from_slice(&self.sym_key_encrypted);
        out.extend_from_slice(&self.msg_encrypted);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() < HYBRID_MIN_SIZE {
            return Err(PrivacyError::MalformedEncoding("hybrid ciphertext too short"));
        }
        // Key ciphertext must at least parse as two group elements.
        ElGamalCiphertext::from_bytes(&b[..ELGAMAL_CIPHERTEXT_SIZE])?;
        Ok(Self {
            sym_key_encrypted: b[..ELGAMAL_CIPHERTEXT_SIZE].to_vec(),
            msg_encrypted: b[ELGAMAL_CIPHERTEXT_SIZE..].to_vec(),
        })
    }
}

fn apply_aes(key_point: &RistrettoPoint, iv: &[u8; AES_IV_SIZE], buf: &mut [u8]) {
    let key = point_to_bytes(key_point);
    let mut cipher = Aes256Ctr::new((&key).into(), iv.into());
    cipher.apply_keystream(buf);
}

pub fn hybrid_encrypt<R: RngCore + CryptoRng>(
    msg: &[u8],
    public_key: &RistrettoPoint,
    rng: &mut R,
) -> HybridCipherText {
    let key_point = random_point(rng);
    let mut iv = [0u8; AES_IV_SIZE];
    rng.fill_bytes(&mut iv);

    let mut body = msg.to_vec();
    apply_aes(&key_point, &iv, &mut body);

    let mut msg_encrypted = Vec::with_capacity(AES_IV_SIZE + body.len());
    msg_encrypted.extend_from_slice(&iv);
    msg_encrypted.extend_from_slice(&body);

    HybridCipherText {
        sym_key_encrypted: elgamal::encrypt(public_key, &key_point, rng).to_bytes(),
        msg_encrypted,
    }
}

pub fn hybrid_decrypt(ct: &HybridCipherText, secret_key: &Scalar) -> Result<Vec<u8>> {
    if ct.msg_encrypted.len() < AES_IV_SIZE {
        return Err(PrivacyError::DecryptionFailure("aes ciphertext too short"));
    }
    let key_ct = ElGamalCiphertext::from_bytes(&ct.sym_key_encrypted).map_err(|e| {
        warn!("hybrid decrypt: key ciphertext does not parse: {e}");
        PrivacyError::DecryptionFailure("elgamal ciphertext")
    })?;
    let key_point = elgamal::decrypt(secret_key, &key_ct);

    let mut iv = [0u8; AES_IV_SIZE];
    iv.copy_from_slice(&ct.msg_encrypted[..AES_IV_SIZE]);
    let mut body = ct.msg_encrypted[AES_IV_SIZE..].to_vec();
    apply_aes(&key_point, &iv, &mut body);
    Ok(body)
}

pub fn hybrid_decrypt_bytes(bytes: &[u8], secret_key: &Scalar) -> Result<Vec<u8>> {
    hybrid_decrypt(&HybridCipherText::from_bytes(bytes)?, secret_key)
}
