//! Protocol constants and the runtime shard configuration.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{PrivacyError, Result};

/// Upper bound on candidate indices tried by the one-time address search.
pub const MAX_TRIES_OTA: u32 = 50_000;
/// Coin `info` payloads are truncated to this many bytes.
pub const MAX_SIZE_INFO_COIN: usize = 255;
/// Largest shard count the packed last-byte digit scheme can represent.
pub const MAX_PACKED_SHARDS: u8 = 8;
pub const DEFAULT_NUM_SHARDS: u8 = 8;

/// Ring size of the one-out-of-many proof and its binary exponent.
pub const COMMITMENT_RING_SIZE: usize = 8;
pub const COMMITMENT_RING_SIZE_EXP: usize = 3;

/// Bit length of every range-proven value.
pub const MAX_EXP: usize = 64;
/// Most outputs one aggregated range proof may cover.
pub const MAX_OUTPUT_COIN: usize = 32;
/// Most inputs one transaction proof may spend.
pub const MAX_INPUT_COIN: usize = 255;

pub const POINT_SIZE: usize = 32;
pub const SCALAR_SIZE: usize = 32;
/// OTA random point ‖ index (u32, BE) ‖ conceal random point.
pub const TX_RANDOM_SIZE: usize = POINT_SIZE + 4 + POINT_SIZE;

/// Address-type prefix of the OTA receiver wire form.
pub const PRIVATE_RECEIVING_ADDRESS_TYPE: u8 = 0x1;

/// Whether a coin was produced by a transfer or minted by the protocol itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoinPrivacyType {
    Transfer = 0,
    Mint = 1,
}

impl TryFrom<u8> for CoinPrivacyType {
    type Error = PrivacyError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(CoinPrivacyType::Transfer),
            1 => Ok(CoinPrivacyType::Mint),
            _ => Err(PrivacyError::MalformedEncoding("coin privacy type digit")),
        }
    }
}

/// Digits multiplexed into the last byte of a packed one-time public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShardInfo {
    pub receiver_shard: u8,
    pub sender_shard: u8,
    pub privacy_type: CoinPrivacyType,
}

/// Shard layout threaded through every call that does shard arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacyParams {
    pub num_shards: u8,
    pub max_tries_ota: u32,
}

impl Default for PrivacyParams {
    fn default() -> Self {
        Self {
            num_shards: DEFAULT_NUM_SHARDS,
            max_tries_ota: MAX_TRIES_OTA,
        }
    }
}

impl PrivacyParams {
    pub fn new(num_shards: u8) -> Result<Self> {
        let params = Self {
            num_shards,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse a JSON document such as `{"numShards": 4}`; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json).map_err(|e| {
            warn!("privacy params: rejecting json: {e}");
            PrivacyError::MalformedEncoding("privacy params json")
        })?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_shards == 0 {
            warn!("privacy params: zero shards");
            return Err(PrivacyError::UnsupportedShardConfig(self.num_shards));
        }
        if self.max_tries_ota == 0 {
            return Err(PrivacyError::InvalidInput("max_tries_ota must be positive"));
        }
        Ok(())
    }

    pub fn shard_id_from_last_byte(&self, last_byte: u8) -> u8 {
        last_byte % self.num_shards
    }

    /// Fails unless the packed digit scheme can address every shard.
    pub fn check_packed_shards(&self) -> Result<()> {
        if self.num_shards == 0 || self.num_shards > MAX_PACKED_SHARDS {
            return Err(PrivacyError::UnsupportedShardConfig(self.num_shards));
        }
        Ok(())
    }

    /// Split a last byte into base-`num_shards` digits: receiver, sender, privacy type.
    pub fn derive_shard_info(&self, last_byte: u8) -> Result<ShardInfo> {
        self.check_packed_shards()?;
        let n = self.num_shards as u16;
        let b = last_byte as u16;
        let receiver_shard = (b % n) as u8;
        let sender_shard = ((b / n) % n) as u8;
        let privacy_type = CoinPrivacyType::try_from((b / (n * n)) as u8)?;
        Ok(ShardInfo {
            receiver_shard,
            sender_shard,
            privacy_type,
        })
    }

    /// Inverse of [`Self::derive_shard_info`].
    pub fn encode_shard_info(&self, info: &ShardInfo) -> Result<u8> {
        self.check_packed_shards()?;
        if info.receiver_shard >= self.num_shards || info.sender_shard >= self.num_shards {
            return Err(PrivacyError::InvalidInput("shard id out of range"));
        }
        let n = self.num_shards as u16;
        let packed = info.receiver_shard as u16
            + info.sender_shard as u16 * n
            + info.privacy_type as u16 * n * n;
        Ok(packed as u8)
    }
}
