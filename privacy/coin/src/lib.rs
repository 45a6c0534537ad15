//! # privacy-coin — versioned coins
//!
//! A coin is the unit of value moved by a transaction. Two versions coexist:
//!
//! - [`CoinV1`] / [`PlainCoinV1`]: the owner's long-lived public key, a
//!   five-generator commitment, and an optional hybrid-encrypted opening.
//! - [`CoinV2`]: a one-time public key derived from the recipient's OTA key,
//!   a two-generator commitment (or an asset-tag commitment for confidential
//!   assets), and in-place concealment of mask and amount.
//!
//! [`Coin`] and [`PlainCoin`] are the version-tagged sum types handed to the
//! proof layer; [`CoinCommon`] is the capability set every variant implements.
//!
//! ## Wire discrimination
//!
//! A V2 encoding starts with the version byte `2`. A V1 encoding starts with
//! the length of its encrypted detail, which is `0` or at least the hybrid
//! ciphertext minimum, so the first byte alone selects the decoder.

pub mod asset_tag;
pub mod coin_v1;
pub mod coin_v2;
pub mod ota;
pub mod tx_random;
#[cfg(test)]
mod tests;

pub use asset_tag::{raw_asset_tag_map, TokenId};
pub use coin_v1::{CoinV1, PlainCoinV1};
pub use coin_v2::{CoinParams, CoinV2, COIN_VERSION_2};
pub use ota::{OtaReceiver, OtaTarget};
pub use tx_random::TxRandom;

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use privacy_primitives::{KeySet, PrivacyError, PrivacyParams, Result};

pub const COIN_VERSION_1: u8 = 1;

/// Accessors and ownership checks shared by every coin variant.
pub trait CoinCommon {
    fn version(&self) -> u8;
    fn value(&self) -> u64;
    fn commitment(&self) -> Option<&RistrettoPoint>;
    fn public_key(&self) -> Option<&RistrettoPoint>;
    /// Serial number (V1) or key image (V2).
    fn key_image(&self) -> Option<&RistrettoPoint>;
    fn randomness(&self) -> Option<&Scalar>;
    fn shard_id(&self, params: &PrivacyParams) -> Result<u8>;
    fn asset_tag(&self) -> Option<&RistrettoPoint>;
    fn tx_random(&self) -> Option<&TxRandom>;
    fn info(&self) -> &[u8];
    fn is_encrypted(&self) -> bool;
    fn to_bytes(&self) -> Vec<u8>;
    fn conceal_input(&mut self);
    fn does_coin_belong_to_key_set(&mut self, key_set: &KeySet) -> (bool, Option<RistrettoPoint>);
}

impl CoinCommon for PlainCoinV1 {
    fn version(&self) -> u8 {
        COIN_VERSION_1
    }
    fn value(&self) -> u64 {
        self.value
    }
    fn commitment(&self) -> Option<&RistrettoPoint> {
        self.commitment.as_ref()
    }
    fn public_key(&self) -> Option<&RistrettoPoint> {
        self.public_key.as_ref()
    }
    fn key_image(&self) -> Option<&RistrettoPoint> {
        self.serial_number.as_ref()
    }
    fn randomness(&self) -> Option<&Scalar> {
        self.randomness.as_ref()
    }
    fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
        PlainCoinV1::shard_id(self, params)
    }
    fn asset_tag(&self) -> Option<&RistrettoPoint> {
        None
    }
    fn tx_random(&self) -> Option<&TxRandom> {
        None
    }
    fn info(&self) -> &[u8] {
        &self.info
    }
    fn is_encrypted(&self) -> bool {
        false
    }
    fn to_bytes(&self) -> Vec<u8> {
        PlainCoinV1::to_bytes(self)
    }
    fn conceal_input(&mut self) {
        PlainCoinV1::conceal_input(self)
    }
    fn does_coin_belong_to_key_set(&mut self, key_set: &KeySet) -> (bool, Option<RistrettoPoint>) {
        (self.public_key == Some(key_set.payment_address.public_spend), None)
    }
}

impl CoinCommon for CoinV1 {
    fn version(&self) -> u8 {
        COIN_VERSION_1
    }
    fn value(&self) -> u64 {
        self.details.value
    }
    fn commitment(&self) -> Option<&RistrettoPoint> {
        self.details.commitment.as_ref()
    }
    fn public_key(&self) -> Option<&RistrettoPoint> {
        self.details.public_key.as_ref()
    }
    fn key_image(&self) -> Option<&RistrettoPoint> {
        self.details.serial_number.as_ref()
    }
    fn randomness(&self) -> Option<&Scalar> {
        self.details.randomness.as_ref()
    }
    fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
        self.details.shard_id(params)
    }
    fn asset_tag(&self) -> Option<&RistrettoPoint> {
        None
    }
    fn tx_random(&self) -> Option<&TxRandom> {
        None
    }
    fn info(&self) -> &[u8] {
        &self.details.info
    }
    fn is_encrypted(&self) -> bool {
        CoinV1::is_encrypted(self)
    }
    fn to_bytes(&self) -> Vec<u8> {
        CoinV1::to_bytes(self)
    }
    fn conceal_input(&mut self) {
        self.details.conceal_input()
    }
    fn does_coin_belong_to_key_set(&mut self, key_set: &KeySet) -> (bool, Option<RistrettoPoint>) {
        self.details.does_coin_belong_to_key_set(key_set)
    }
}

impl CoinCommon for CoinV2 {
    fn version(&self) -> u8 {
        COIN_VERSION_2
    }
    fn value(&self) -> u64 {
        CoinV2::value(self)
    }
    fn commitment(&self) -> Option<&RistrettoPoint> {
        CoinV2::commitment(self)
    }
    fn public_key(&self) -> Option<&RistrettoPoint> {
        CoinV2::public_key(self)
    }
    fn key_image(&self) -> Option<&RistrettoPoint> {
        CoinV2::key_image(self)
    }
    fn randomness(&self) -> Option<&Scalar> {
        self.mask()
    }
    fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
        CoinV2::shard_id(self, params)
    }
    fn asset_tag(&self) -> Option<&RistrettoPoint> {
        CoinV2::asset_tag(self)
    }
    fn tx_random(&self) -> Option<&TxRandom> {
        CoinV2::tx_random(self)
    }
    fn info(&self) -> &[u8] {
        CoinV2::info(self)
    }
    fn is_encrypted(&self) -> bool {
        CoinV2::is_encrypted(self)
    }
    fn to_bytes(&self) -> Vec<u8> {
        CoinV2::to_bytes(self)
    }
    fn conceal_input(&mut self) {
        self.conceal_input_coin()
    }
    fn does_coin_belong_to_key_set(&mut self, key_set: &KeySet) -> (bool, Option<RistrettoPoint>) {
        CoinV2::does_coin_belong_to_key_set(self, key_set)
    }
}

macro_rules! delegate_coin_common {
    ($ty:ident) => {
        impl CoinCommon for $ty {
            fn version(&self) -> u8 {
                match self {
                    $ty::V1(c) => c.version(),
                    $ty::V2(c) => CoinCommon::version(c),
                }
            }
            fn value(&self) -> u64 {
                match self {
                    $ty::V1(c) => CoinCommon::value(c),
                    $ty::V2(c) => c.value(),
                }
            }
            fn commitment(&self) -> Option<&RistrettoPoint> {
                match self {
                    $ty::V1(c) => CoinCommon::commitment(c),
                    $ty::V2(c) => c.commitment(),
                }
            }
            fn public_key(&self) -> Option<&RistrettoPoint> {
                match self {
                    $ty::V1(c) => CoinCommon::public_key(c),
                    $ty::V2(c) => c.public_key(),
                }
            }
            fn key_image(&self) -> Option<&RistrettoPoint> {
                match self {
                    $ty::V1(c) => CoinCommon::key_image(c),
                    $ty::V2(c) => c.key_image(),
                }
            }
            fn randomness(&self) -> Option<&Scalar> {
                match self {
                    $ty::V1(c) => CoinCommon::randomness(c),
                    $ty::V2(c) => c.mask(),
                }
            }
            fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
                match self {
                    $ty::V1(c) => CoinCommon::shard_id(c, params),
                    $ty::V2(c) => c.shard_id(params),
                }
            }
            fn asset_tag(&self) -> Option<&RistrettoPoint> {
                match self {
                    $ty::V1(_) => None,
                    $ty::V2(c) => c.asset_tag(),
                }
            }
            fn tx_random(&self) -> Option<&TxRandom> {
                match self {
                    $ty::V1(_) => None,
                    $ty::V2(c) => c.tx_random(),
                }
            }
            fn info(&self) -> &[u8] {
                match self {
                    $ty::V1(c) => CoinCommon::info(c),
                    $ty::V2(c) => c.info(),
                }
            }
            fn is_encrypted(&self) -> bool {
                match self {
                    $ty::V1(c) => CoinCommon::is_encrypted(c),
                    $ty::V2(c) => c.is_encrypted(),
                }
            }
            fn to_bytes(&self) -> Vec<u8> {
                match self {
                    $ty::V1(c) => CoinCommon::to_bytes(c),
                    $ty::V2(c) => c.to_bytes(),
                }
            }
            fn conceal_input(&mut self) {
                match self {
                    $ty::V1(c) => CoinCommon::conceal_input(c),
                    $ty::V2(c) => c.conceal_input_coin(),
                }
            }
            fn does_coin_belong_to_key_set(
                &mut self,
                key_set: &KeySet,
            ) -> (bool, Option<RistrettoPoint>) {
                match self {
                    $ty::V1(c) => CoinCommon::does_coin_belong_to_key_set(c, key_set),
                    $ty::V2(c) => c.does_coin_belong_to_key_set(key_set),
                }
            }
        }
    };
}

/// A coin as spent by a transaction: its opening is known to the spender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlainCoin {
    V1(PlainCoinV1),
    V2(CoinV2),
}

/// A coin as created by a transaction, possibly concealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coin {
    V1(CoinV1),
    V2(CoinV2),
}

delegate_coin_common!(PlainCoin);
delegate_coin_common!(Coin);

impl PlainCoin {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        match b.first() {
            None => Err(PrivacyError::MalformedEncoding("empty coin")),
            Some(&COIN_VERSION_2) => CoinV2::from_bytes(b).map(PlainCoin::V2),
            Some(_) => PlainCoinV1::from_bytes(b).map(PlainCoin::V1),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            PlainCoin::V1(_) => "PlainCoinV1",
            PlainCoin::V2(_) => "CoinV2",
        }
    }
}

impl Coin {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        match b.first() {
            None => Err(PrivacyError::MalformedEncoding("empty coin")),
            Some(&COIN_VERSION_2) => CoinV2::from_bytes(b).map(Coin::V2),
            Some(_) => CoinV1::from_bytes(b).map(Coin::V1),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Coin::V1(_) => "CoinV1",
            Coin::V2(_) => "CoinV2",
        }
    }

    /// Recover the opening with `key_set`.
    pub fn decrypt(&self, key_set: &KeySet, params: &PrivacyParams) -> Result<PlainCoin> {
        match self {
            Coin::V1(c) => c.decrypt(key_set, params).map(PlainCoin::V1),
            Coin::V2(c) => c.decrypt(key_set).map(PlainCoin::V2),
        }
    }
}

impl From<PlainCoinV1> for PlainCoin {
    fn from(c: PlainCoinV1) -> Self {
        PlainCoin::V1(c)
    }
}

impl From<CoinV2> for PlainCoin {
    fn from(c: CoinV2) -> Self {
        PlainCoin::V2(c)
    }
}

impl From<CoinV1> for Coin {
    fn from(c: CoinV1) -> Self {
        Coin::V1(c)
    }
}

impl From<CoinV2> for Coin {
    fn from(c: CoinV2) -> Self {
        Coin::V2(c)
    }
}
