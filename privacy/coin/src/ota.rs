//! One-time address derivation and the OTA receiver.
//!
//! A sender picks `r`, computes `rK = OTAPublicKey^r` and walks indices
//! `1, 2, ...` until `G^H(rK ‖ index) + publicSpend` lands in the target shard.
//! The recipient recomputes `rK = (G^r)^otaSecret` from the published
//! `TxRandom` and subtracts.

use core::{fmt, str::FromStr};

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G, ristretto::RistrettoPoint, scalar::Scalar,
};
use log::{debug, trace};
use privacy_primitives::{
    encoding::{point_to_bytes, Reader},
    hash_to_scalar_parts,
    params::{CoinPrivacyType, POINT_SIZE, PRIVATE_RECEIVING_ADDRESS_TYPE, TX_RANDOM_SIZE},
    random_scalar, PaymentAddress, PrivacyError, PrivacyParams, Result,
};
use rand::{CryptoRng, RngCore};

use crate::tx_random::TxRandom;

const OTA_RECEIVER_SIZE: usize = 1 + POINT_SIZE + TX_RANDOM_SIZE;

/// `H(rK ‖ index)`, the scalar offset of the one-time key from the spend key.
pub fn ota_offset(shared_secret: &RistrettoPoint, index: u32) -> Scalar {
    hash_to_scalar_parts(&[&point_to_bytes(shared_secret), &index.to_be_bytes()])
}

pub fn derive_one_time_public_key(
    shared_secret: &RistrettoPoint,
    index: u32,
    public_spend: &RistrettoPoint,
) -> RistrettoPoint {
    ota_offset(shared_secret, index) * G + public_spend
}

/// Which shard digits a candidate one-time key must hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OtaTarget {
    pub receiver_shard: u8,
    /// When set, the sender digit and coin type are packed into the last byte as well.
    pub sender_shard: Option<u8>,
    pub privacy_type: CoinPrivacyType,
}

impl OtaTarget {
    pub fn for_address(params: &PrivacyParams, address: &PaymentAddress) -> Self {
        Self {
            receiver_shard: params.shard_id_from_last_byte(address.last_byte()),
            sender_shard: None,
            privacy_type: CoinPrivacyType::Transfer,
        }
    }

    pub fn with_sender(mut self, sender_shard: u8, privacy_type: CoinPrivacyType) -> Self {
        self.sender_shard = Some(sender_shard);
        self.privacy_type = privacy_type;
        self
    }

    fn matches(&self, params: &PrivacyParams, candidate: &RistrettoPoint) -> Result<bool> {
        let last = point_to_bytes(candidate)[POINT_SIZE - 1];
        match self.sender_shard {
            None => Ok(params.shard_id_from_last_byte(last) == self.receiver_shard),
            Some(sender) => {
                let info = match params.derive_shard_info(last) {
                    Ok(info) => info,
                    Err(PrivacyError::MalformedEncoding(_)) => return Ok(false),
                    Err(e) => return Err(e),
                };
                Ok(info.receiver_shard == self.receiver_shard
                    && info.sender_shard == sender
                    && info.privacy_type == self.privacy_type)
            }
        }
    }
}

/// Lowest index in `1..max_tries_ota` whose one-time key satisfies `target`.
pub fn search_one_time_address(
    params: &PrivacyParams,
    target: &OtaTarget,
    shared_secret: &RistrettoPoint,
    public_spend: &RistrettoPoint,
) -> Result<(RistrettoPoint, u32)> {
    if target.sender_shard.is_some() {
        params.check_packed_shards()?;
    }
    for index in 1..params.max_tries_ota {
        let candidate = derive_one_time_public_key(shared_secret, index, public_spend);
        if target.matches(params, &candidate)? {
            trace!("one-time address found at index {index}");
            return Ok((candidate, index));
        }
    }
    debug!("one-time address search exhausted for {target:?}");
    Err(PrivacyError::OtaExhausted(params.max_tries_ota))
}

/// A pre-computed one-time destination a recipient can hand to a payer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OtaReceiver {
    pub public_key: RistrettoPoint,
    pub tx_random: TxRandom,
}

impl OtaReceiver {
    pub fn from_address<R: RngCore + CryptoRng>(
        params: &PrivacyParams,
        address: &PaymentAddress,
        rng: &mut R,
    ) -> Result<Self> {
        let public_ota = address.ota_public()?;
        let target = OtaTarget::for_address(params, address);

        let r = random_scalar(rng);
        let shared_secret = r * public_ota;
        let (public_key, index) =
            search_one_time_address(params, &target, &shared_secret, &address.public_spend)?;

        // Receivers built ahead of time have no conceal secret to share.
        let conceal = random_scalar(rng) * G;
        Ok(Self {
            public_key,
            tx_random: TxRandom::new(&(r * G), index, &conceal),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.tx_random.ota_random_point().is_ok() && self.tx_random.conceal_random_point().is_ok()
    }

    /// `prefix(1) ‖ pk(32) ‖ txRandom(68)`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(OTA_RECEIVER_SIZE);
        out.push(PRIVATE_RECEIVING_ADDRESS_TYPE);
        out.extend_from_slice(&point_to_bytes(&self.public_key));
        out.extend_from_slice(self.tx_random.as_bytes());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != OTA_RECEIVER_SIZE {
            return Err(PrivacyError::MalformedEncoding("ota receiver length"));
        }
        let mut r = Reader::new(b);
        if r.read_u8()? != PRIVATE_RECEIVING_ADDRESS_TYPE {
            return Err(PrivacyError::MalformedEncoding("ota receiver prefix"));
        }
        let public_key = r.read_point()?;
        let tx_random = TxRandom::from_bytes(r.read_bytes(TX_RANDOM_SIZE)?)?;
        Ok(Self {
            public_key,
            tx_random,
        })
    }
}

impl fmt::Display for OtaReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.to_bytes()).with_check().into_string())
    }
}

impl FromStr for OtaReceiver {
    type Err = PrivacyError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| PrivacyError::MalformedEncoding("ota receiver base58check"))?;
        Self::from_bytes(&raw)
    }
}
