//! Version 1 coins: transparent fields with an optional hybrid-encrypted opening.
//!
//! ```text
//! PlainCoinV1: pk ‖ commitment ‖ snd ‖ serialNumber ‖ randomness ‖ value ‖ info
//!              (each `len(1) ‖ bytes`, zero length = absent)
//! CoinV1:      len(1) ‖ encryptedDetail ‖ dualLen ‖ PlainCoinV1
//! ```

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use log::debug;
use privacy_primitives::{
    derive_serial_number,
    encoding::{
        point_to_bytes, scalar_from_bytes, u64_from_be_trimmed, u64_to_be_trimmed,
        write_len_prefixed, write_opt_point, write_opt_scalar, Reader,
    },
    hybrid_decrypt, hybrid_encrypt,
    params::{MAX_SIZE_INFO_COIN, POINT_SIZE, SCALAR_SIZE},
    pedersen, HybridCipherText, KeySet, PaymentAddress, PrivacyError, PrivacyParams, Result,
};
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlainCoinV1 {
    pub public_key: Option<RistrettoPoint>,
    pub commitment: Option<RistrettoPoint>,
    pub snd: Option<Scalar>,
    pub serial_number: Option<RistrettoPoint>,
    pub randomness: Option<Scalar>,
    pub value: u64,
    pub info: Vec<u8>,
}

impl PlainCoinV1 {
    pub fn new(public_key: RistrettoPoint, value: u64, snd: Scalar, info: Vec<u8>) -> Self {
        let mut info = info;
        info.truncate(MAX_SIZE_INFO_COIN);
        Self {
            public_key: Some(public_key),
            value,
            snd: Some(snd),
            info,
            ..Self::default()
        }
    }

    pub fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
        let pk = self
            .public_key
            .as_ref()
            .ok_or(PrivacyError::InvalidInput("coin has no public key"))?;
        Ok(params.shard_id_from_last_byte(point_to_bytes(pk)[POINT_SIZE - 1]))
    }

    /// `G0^pk-term · G1^value · G2^snd · G3^shard · G4^randomness`; the spend
    /// key enters as the public point itself.
    pub fn expected_commitment(&self, params: &PrivacyParams) -> Result<RistrettoPoint> {
        let pk = self
            .public_key
            .ok_or(PrivacyError::InvalidInput("coin has no public key"))?;
        let snd = self
            .snd
            .ok_or(PrivacyError::InvalidInput("coin has no serial number derivator"))?;
        let randomness = self
            .randomness
            .ok_or(PrivacyError::InvalidInput("coin has no randomness"))?;
        let shard = Scalar::from(self.shard_id(params)? as u64);
        Ok(pk
            + pedersen().commit_all(&[
                Scalar::ZERO,
                Scalar::from(self.value),
                snd,
                shard,
                randomness,
            ]))
    }

    pub fn commit_all(&mut self, params: &PrivacyParams) -> Result<()> {
        self.commitment = Some(self.expected_commitment(params)?);
        Ok(())
    }

    /// Recompute and compare against the stored commitment.
    pub fn verify_commitment(&self, params: &PrivacyParams) -> Result<()> {
        let stored = self
            .commitment
            .ok_or(PrivacyError::CommitmentMismatch("coin has no commitment"))?;
        let expected = self.expected_commitment(params)?;
        if bool::from(stored.compress().ct_eq(&expected.compress())) {
            Ok(())
        } else {
            Err(PrivacyError::CommitmentMismatch("coin v1 commitment"))
        }
    }

    /// Keep only what serial-number verification needs.
    pub fn conceal_input(&mut self) {
        self.commitment = None;
        self.value = 0;
        self.randomness = None;
        self.public_key = None;
        self.snd = None;
        self.info.clear();
    }

    pub fn check_coin_valid(&self, params: &PrivacyParams, address: &PaymentAddress, amount: u64) -> bool {
        self.value == amount
            && self.public_key == Some(address.public_spend)
            && self.verify_commitment(params).is_ok()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 * (POINT_SIZE + 1) + 9 + 1 + self.info.len());
        write_opt_point(&mut out, self.public_key.as_ref());
        write_opt_point(&mut out, self.commitment.as_ref());
        write_opt_scalar(&mut out, self.snd.as_ref());
        write_opt_point(&mut out, self.serial_number.as_ref());
        write_opt_scalar(&mut out, self.randomness.as_ref());
        write_len_prefixed(&mut out, &u64_to_be_trimmed(self.value));
        write_len_prefixed(&mut out, &self.info);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.is_empty() {
            return Err(PrivacyError::MalformedEncoding("empty plain coin"));
        }
        let mut r = Reader::new(b);
        let public_key = r.read_opt_point()?;
        let commitment = r.read_opt_point()?;
        let snd = r.read_opt_scalar()?;
        let serial_number = r.read_opt_point()?;
        let randomness = r.read_opt_scalar()?;
        let value = u64_from_be_trimmed(r.read_len_prefixed()?)?;
        let info = r.read_len_prefixed()?.to_vec();
        Ok(Self {
            public_key,
            commitment,
            snd,
            serial_number,
            randomness,
            value,
            info,
        })
    }
}

/// A V1 output: plaintext details plus, under privacy, the encrypted opening.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoinV1 {
    pub details: PlainCoinV1,
    pub encrypted: Option<HybridCipherText>,
}

impl CoinV1 {
    pub fn new(details: PlainCoinV1) -> Self {
        Self {
            details,
            encrypted: None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted.is_some()
    }

    /// Seal `randomness ‖ value` to the recipient's transmission key.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &mut self,
        transmission_key: &RistrettoPoint,
        rng: &mut R,
    ) -> Result<()> {
        let randomness = self
            .details
            .randomness
            .ok_or(PrivacyError::InvalidInput("coin has no randomness to encrypt"))?;
        let mut msg = randomness.to_bytes().to_vec();
        msg.extend_from_slice(&u64_to_be_trimmed(self.details.value));
        self.encrypted = Some(hybrid_encrypt(&msg, transmission_key, rng));
        Ok(())
    }

    /// Strip everything the encrypted payload and commitment already carry.
    pub fn conceal_output(&mut self) {
        self.details.value = 0;
        self.details.randomness = None;
        self.details.serial_number = None;
    }

    pub fn decrypt(&self, key_set: &KeySet, params: &PrivacyParams) -> Result<PlainCoinV1> {
        if key_set.private_key.is_none() && key_set.viewing_key.is_none() {
            return Err(PrivacyError::DecryptionFailure(
                "key set has neither a private key nor a viewing key",
            ));
        }
        let mut plain = self.details.clone();

        if let Some(ct) = &self.encrypted {
            let view = key_set
                .viewing_key
                .as_ref()
                .map(|vk| vk.private_view)
                .or_else(|| key_set.private_key.as_ref().map(|sk| sk.private_view()))
                .ok_or(PrivacyError::DecryptionFailure("no viewing key"))?;
            let msg = hybrid_decrypt(ct, &view)?;
            if msg.len() < SCALAR_SIZE {
                return Err(PrivacyError::DecryptionFailure("opening too short"));
            }
            plain.randomness = Some(
                scalar_from_bytes(&msg[..SCALAR_SIZE])
                    .map_err(|_| PrivacyError::DecryptionFailure("opening randomness"))?,
            );
            plain.value = u64_from_be_trimmed(&msg[SCALAR_SIZE..])
                .map_err(|_| PrivacyError::DecryptionFailure("opening value"))?;
            if plain.commitment.is_some() {
                plain.verify_commitment(params)?;
            }
        }

        if let Some(sk) = &key_set.private_key {
            let snd = plain
                .snd
                .ok_or(PrivacyError::DecryptionFailure("coin has no serial number derivator"))?;
            plain.serial_number = Some(derive_serial_number(sk.as_scalar(), &snd));
        }
        Ok(plain)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match &self.encrypted {
            Some(ct) => write_len_prefixed(&mut out, &ct.to_bytes()),
            None => out.push(0),
        }
        let detail = self.details.to_bytes();
        write_dual_len(&mut out, detail.len());
        out.extend_from_slice(&detail);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.is_empty() {
            return Err(PrivacyError::MalformedEncoding("empty coin"));
        }
        let mut r = Reader::new(b);
        let enc = r.read_len_prefixed()?;
        let encrypted = if enc.is_empty() {
            None
        } else {
            Some(HybridCipherText::from_bytes(enc)?)
        };
        let details = read_dual_len(&mut r, PlainCoinV1::from_bytes)?;
        Ok(Self { details, encrypted })
    }
}

/// One byte when the length fits, otherwise two big-endian bytes.
pub fn write_dual_len(out: &mut Vec<u8>, len: usize) {
    if len <= u8::MAX as usize {
        out.push(len as u8);
    } else {
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
}

/// Legacy length prefix with no discriminator: try a one-byte length and
/// parse; if that parse fails (or the byte is zero), re-read the prefix as two
/// big-endian bytes. The order of attempts is part of the wire format.
pub fn read_dual_len<'a, T>(
    r: &mut Reader<'a>,
    parse: impl Fn(&'a [u8]) -> Result<T>,
) -> Result<T> {
    let rest = r.rest();
    let first = *rest
        .first()
        .ok_or(PrivacyError::MalformedEncoding("missing length prefix"))? as usize;

    if first > 0 {
        if 1 + first > rest.len() {
            return Err(PrivacyError::MalformedEncoding("length prefix past end"));
        }
        if let Ok(v) = parse(&rest[1..1 + first]) {
            r.read_bytes(1 + first)?;
            return Ok(v);
        }
    }

    debug!("one-byte length parse failed, retrying with two-byte length");
    let n = r.read_u16_be()? as usize;
    parse(r.read_bytes(n)?)
}
