//! Wallet key material consumed by coins and proofs.
//!
//! Every public component is `G[0]^secret`. The view and OTA secrets are
//! derived from the spending key, so a [`KeySet`] built from a private key
//! carries all three capabilities; sets built from a [`ViewingKey`] or an
//! [`OtaKey`] can only decrypt or recognise coins.

use core::fmt;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G, ristretto::RistrettoPoint, scalar::Scalar,
};
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

use crate::{
    encoding::{point_to_bytes, Reader},
    hash::{hash_to_scalar, hash_to_scalar_parts, random_scalar},
    params::POINT_SIZE,
    PrivacyError, Result,
};

const VIEW_KEY_LABEL: &[u8] = b"view";
const OTA_KEY_LABEL: &[u8] = b"ota";

#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Scalar);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl PrivateKey {
    pub fn from_scalar(sk: Scalar) -> Self {
        Self(sk)
    }

    /// Deterministic key from wallet seed material.
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(hash_to_scalar(seed))
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(random_scalar(rng))
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        crate::encoding::scalar_from_bytes(b).map(Self)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    pub fn public_spend(&self) -> RistrettoPoint {
        self.0 * G
    }

    pub fn private_view(&self) -> Scalar {
        hash_to_scalar_parts(&[VIEW_KEY_LABEL, self.0.as_bytes()])
    }

    pub fn ota_secret(&self) -> Scalar {
        hash_to_scalar_parts(&[OTA_KEY_LABEL, self.0.as_bytes()])
    }
}

/// Spend, view and (optionally) OTA public keys of a recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentAddress {
    pub public_spend: RistrettoPoint,
    pub public_view: RistrettoPoint,
    pub public_ota: Option<RistrettoPoint>,
}

impl PaymentAddress {
    pub fn last_byte(&self) -> u8 {
        point_to_bytes(&self.public_spend)[POINT_SIZE - 1]
    }

    /// OTA public key; addresses predating one-time addresses have none.
    pub fn ota_public(&self) -> Result<&RistrettoPoint> {
        self.public_ota
            .as_ref()
            .ok_or(PrivacyError::InvalidInput("payment address has no OTA public key"))
    }

    /// `spend(32) ‖ view(32) [‖ ota(32)]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 * POINT_SIZE);
        out.extend_from_slice(&point_to_bytes(&self.public_spend));
        out.extend_from_slice(&point_to_bytes(&self.public_view));
        if let Some(ota) = &self.public_ota {
            out.extend_from_slice(&point_to_bytes(ota));
        }
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() != 2 * POINT_SIZE && b.len() != 3 * POINT_SIZE {
            return Err(PrivacyError::MalformedEncoding("payment address length"));
        }
        let mut r = Reader::new(b);
        let public_spend = r.read_point()?;
        let public_view = r.read_point()?;
        let public_ota = if r.is_empty() {
            None
        } else {
            Some(r.read_point()?)
        };
        Ok(Self {
            public_spend,
            public_view,
            public_ota,
        })
    }
}

/// Decrypts coin amounts; cannot spend.
#[derive(Clone, PartialEq, Eq)]
pub struct ViewingKey {
    pub public_spend: RistrettoPoint,
    pub private_view: Scalar,
}

impl fmt::Debug for ViewingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewingKey")
            .field("public_spend", &self.public_spend.compress())
            .finish_non_exhaustive()
    }
}

impl ViewingKey {
    pub fn public_view(&self) -> RistrettoPoint {
        self.private_view * G
    }
}

/// Recognises one-time addresses; cannot spend.
#[derive(Clone, PartialEq, Eq)]
pub struct OtaKey {
    pub public_spend: RistrettoPoint,
    pub ota_secret: Scalar,
}

impl fmt::Debug for OtaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtaKey")
            .field("public_spend", &self.public_spend.compress())
            .finish_non_exhaustive()
    }
}

impl OtaKey {
    pub fn public_ota(&self) -> RistrettoPoint {
        self.ota_secret * G
    }

    /// True when `candidate` equals this key's spend component.
    pub fn owns_spend_key(&self, candidate: &RistrettoPoint) -> bool {
        bool::from(
            candidate
                .compress()
                .ct_eq(&self.public_spend.compress()),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySet {
    pub private_key: Option<PrivateKey>,
    pub payment_address: PaymentAddress,
    pub viewing_key: Option<ViewingKey>,
    pub ota_key: Option<OtaKey>,
}

impl KeySet {
    pub fn from_private_key(sk: &PrivateKey) -> Self {
        let public_spend = sk.public_spend();
        let private_view = sk.private_view();
        let ota_secret = sk.ota_secret();
        Self {
            private_key: Some(sk.clone()),
            payment_address: PaymentAddress {
                public_spend,
                public_view: private_view * G,
                public_ota: Some(ota_secret * G),
            },
            viewing_key: Some(ViewingKey {
                public_spend,
                private_view,
            }),
            ota_key: Some(OtaKey {
                public_spend,
                ota_secret,
            }),
        }
    }

    pub fn from_viewing_key(vk: ViewingKey, address: PaymentAddress) -> Self {
        Self {
            private_key: None,
            payment_address: address,
            viewing_key: Some(vk),
            ota_key: None,
        }
    }

    pub fn from_ota_key(ota: OtaKey, address: PaymentAddress) -> Self {
        Self {
            private_key: None,
            payment_address: address,
            viewing_key: None,
            ota_key: Some(ota),
        }
    }

    pub fn from_payment_address(address: PaymentAddress) -> Self {
        Self {
            private_key: None,
            payment_address: address,
            viewing_key: None,
            ota_key: None,
        }
    }
}

/// Recipient, amount and free-form memo of one output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentInfo {
    pub payment_address: PaymentAddress,
    pub amount: u64,
    pub message: Vec<u8>,
}

impl PaymentInfo {
    pub fn new(payment_address: PaymentAddress, amount: u64, message: Vec<u8>) -> Self {
        Self {
            payment_address,
            amount,
            message,
        }
    }
}
