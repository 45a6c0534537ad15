//! Confidential-asset tags.
//!
//! `assetTag = hashToPoint(tokenId) + G[Randomness]^blinder`, where the
//! blinder is `H(sharedSecret ‖ "assettag")`. A coin without a tag is native.

use core::fmt;
use std::collections::HashMap;

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use privacy_primitives::{
    encoding::point_to_bytes, hash_to_point, hash_to_scalar_parts, pedersen, PrivacyError, Result,
};

const ASSET_TAG_LABEL: &[u8] = b"assettag";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    /// The native coin.
    pub const PRV: TokenId = {
        let mut b = [0u8; 32];
        b[31] = 4;
        TokenId(b)
    };

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = b
            .try_into()
            .map_err(|_| PrivacyError::MalformedEncoding("token id length"))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_native(&self) -> bool {
        *self == Self::PRV
    }

    /// Unblinded tag, `hashToPoint(tokenId)`.
    pub fn raw_asset_tag(&self) -> RistrettoPoint {
        hash_to_point(&self.0)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", hex::encode(self.0))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

pub fn asset_tag_blinder(shared_secret: &RistrettoPoint) -> Scalar {
    hash_to_scalar_parts(&[&point_to_bytes(shared_secret), ASSET_TAG_LABEL])
}

pub fn blind_asset_tag(raw_tag: &RistrettoPoint, blinder: &Scalar) -> RistrettoPoint {
    raw_tag + blinder * pedersen().randomness_base()
}

pub fn unblind_asset_tag(asset_tag: &RistrettoPoint, blinder: &Scalar) -> RistrettoPoint {
    asset_tag - blinder * pedersen().randomness_base()
}

/// Lookup table from compressed raw tag to token, used to name CA coins.
pub fn raw_asset_tag_map<'a>(tokens: impl IntoIterator<Item = &'a TokenId>) -> HashMap<[u8; 32], TokenId> {
    tokens
        .into_iter()
        .map(|t| (point_to_bytes(&t.raw_asset_tag()), *t))
        .collect()
}
