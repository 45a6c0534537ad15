//! Version 2 coins: one-time public key, Pedersen commitment, in-place concealment.
//!
//! ```text
//! version(1)=2 ‖ info ‖ pk ‖ commitment ‖ keyImage ‖ sharedRandom ‖
//! sharedConcealRandom ‖ txRandom ‖ mask ‖ amount [‖ assetTag]
//! ```
//!
//! Every field but the version is `len(1) ‖ bytes`; a missing trailing asset
//! tag decodes as a plain (native) coin.

use std::collections::HashMap;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G, ristretto::RistrettoPoint, scalar::Scalar,
};
use log::debug;
use privacy_primitives::{
    encoding::{point_to_bytes, write_len_prefixed, write_opt_point, write_opt_scalar, Reader},
    hash_to_point, hash_to_scalar_parts,
    params::{CoinPrivacyType, ShardInfo, MAX_SIZE_INFO_COIN, POINT_SIZE, TX_RANDOM_SIZE},
    pedersen, random_scalar, KeySet, PaymentAddress, PaymentInfo, PrivacyError, PrivacyParams,
    PrivateKey, Result, PEDERSEN_VALUE_INDEX,
};
use rand::{CryptoRng, RngCore};

use crate::{
    asset_tag::{asset_tag_blinder, blind_asset_tag, unblind_asset_tag, TokenId},
    ota::{derive_one_time_public_key, ota_offset, search_one_time_address, OtaTarget},
    tx_random::TxRandom,
};

pub const COIN_VERSION_2: u8 = 2;

const MASK_LABEL: &[u8] = b"mask";
const AMOUNT_LABEL: &[u8] = b"amount";

/// Scalars added to the mask and amount when concealing to `rK`.
fn conceal_offsets(shared_secret: &RistrettoPoint) -> (Scalar, Scalar) {
    let rk = point_to_bytes(shared_secret);
    (
        hash_to_scalar_parts(&[MASK_LABEL, &rk]),
        hash_to_scalar_parts(&[AMOUNT_LABEL, &rk]),
    )
}

fn scalar_to_u64(s: &Scalar) -> u64 {
    let mut low = [0u8; 8];
    low.copy_from_slice(&s.as_bytes()[..8]);
    u64::from_le_bytes(low)
}

/// Output parameters: the payment plus optional packed sender-shard routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinParams {
    pub payment_info: PaymentInfo,
    pub sender_shard: Option<u8>,
    pub privacy_type: CoinPrivacyType,
}

impl CoinParams {
    pub fn new(payment_info: PaymentInfo) -> Self {
        Self {
            payment_info,
            sender_shard: None,
            privacy_type: CoinPrivacyType::Transfer,
        }
    }

    pub fn with_sender_shard(mut self, sender_shard: u8, privacy_type: CoinPrivacyType) -> Self {
        self.sender_shard = Some(sender_shard);
        self.privacy_type = privacy_type;
        self
    }

    fn target(&self, params: &PrivacyParams) -> OtaTarget {
        let target = OtaTarget::for_address(params, &self.payment_info.payment_address);
        match self.sender_shard {
            Some(s) => target.with_sender(s, self.privacy_type),
            None => target,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CoinV2 {
    info: Vec<u8>,
    public_key: Option<RistrettoPoint>,
    commitment: Option<RistrettoPoint>,
    key_image: Option<RistrettoPoint>,
    shared_random: Option<Scalar>,
    shared_conceal_random: Option<Scalar>,
    tx_random: Option<TxRandom>,
    mask: Option<Scalar>,
    amount: Option<Scalar>,
    asset_tag: Option<RistrettoPoint>,
    // Filled by `does_coin_belong_to_key_set`; never serialized.
    raw_asset_tag: Option<RistrettoPoint>,
}

impl PartialEq for CoinV2 {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
            && self.public_key == other.public_key
            && self.commitment == other.commitment
            && self.key_image == other.key_image
            && self.shared_random == other.shared_random
            && self.shared_conceal_random == other.shared_conceal_random
            && self.tx_random == other.tx_random
            && self.mask == other.mask
            && self.amount == other.amount
            && self.asset_tag == other.asset_tag
    }
}

impl Eq for CoinV2 {}

impl CoinV2 {
    // ========================= Construction =========================

    fn with_ota<R: RngCore + CryptoRng>(
        params: &PrivacyParams,
        coin_params: &CoinParams,
        rng: &mut R,
    ) -> Result<(Self, RistrettoPoint)> {
        let info = &coin_params.payment_info;
        let address = &info.payment_address;
        let public_ota = address.ota_public()?;

        let shared_random = random_scalar(rng);
        let shared_conceal_random = random_scalar(rng);
        let shared_secret = shared_random * public_ota;
        let (public_key, index) = search_one_time_address(
            params,
            &coin_params.target(params),
            &shared_secret,
            &address.public_spend,
        )?;

        let mut message = info.message.clone();
        message.truncate(MAX_SIZE_INFO_COIN);
        let coin = Self {
            info: message,
            public_key: Some(public_key),
            shared_random: Some(shared_random),
            shared_conceal_random: Some(shared_conceal_random),
            tx_random: Some(TxRandom::new(
                &(shared_random * G),
                index,
                &(shared_conceal_random * G),
            )),
            mask: Some(random_scalar(rng)),
            amount: Some(Scalar::from(info.amount)),
            ..Self::default()
        };
        Ok((coin, shared_secret))
    }

    /// Plain output paying `payment_info` through a fresh one-time address.
    pub fn new_from_payment_info<R: RngCore + CryptoRng>(
        params: &PrivacyParams,
        coin_params: &CoinParams,
        rng: &mut R,
    ) -> Result<Self> {
        let (mut coin, _) = Self::with_ota(params, coin_params, rng)?;
        coin.commit()?;
        Ok(coin)
    }

    /// Confidential-asset output of `token_id`. Returns the coin and the shared
    /// secret the asset tag is blinded with.
    pub fn new_ca<R: RngCore + CryptoRng>(
        params: &PrivacyParams,
        coin_params: &CoinParams,
        token_id: &TokenId,
        rng: &mut R,
    ) -> Result<(Self, RistrettoPoint)> {
        let (mut coin, shared_secret) = Self::with_ota(params, coin_params, rng)?;
        let raw = token_id.raw_asset_tag();
        coin.asset_tag = Some(blind_asset_tag(&raw, &asset_tag_blinder(&shared_secret)));
        coin.raw_asset_tag = Some(raw);
        coin.commit()?;
        Ok((coin, shared_secret))
    }

    /// Output to a pre-computed one-time address (see `OtaReceiver`). The
    /// sender holds no conceal secret, so the amount stays in the clear.
    pub fn new_from_amount_and_tx_random<R: RngCore + CryptoRng>(
        amount: u64,
        public_key: RistrettoPoint,
        tx_random: TxRandom,
        info: Vec<u8>,
        rng: &mut R,
    ) -> Result<Self> {
        let mut info = info;
        info.truncate(MAX_SIZE_INFO_COIN);
        let mut coin = Self {
            info,
            public_key: Some(public_key),
            tx_random: Some(tx_random),
            mask: Some(random_scalar(rng)),
            amount: Some(Scalar::from(amount)),
            ..Self::default()
        };
        coin.commit()?;
        Ok(coin)
    }

    fn expected_commitment(&self) -> Option<RistrettoPoint> {
        let mask = self.mask?;
        let amount = self.amount?;
        Some(match &self.asset_tag {
            None => pedersen().commit_at_index(&amount, &mask, PEDERSEN_VALUE_INDEX),
            Some(tag) => amount * tag + mask * pedersen().randomness_base(),
        })
    }

    fn commit(&mut self) -> Result<()> {
        self.commitment = Some(
            self.expected_commitment()
                .ok_or(PrivacyError::InvalidInput("coin has no amount or mask"))?,
        );
        Ok(())
    }

    // ========================= Accessors =========================

    pub fn version(&self) -> u8 {
        COIN_VERSION_2
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }

    pub fn public_key(&self) -> Option<&RistrettoPoint> {
        self.public_key.as_ref()
    }

    pub fn commitment(&self) -> Option<&RistrettoPoint> {
        self.commitment.as_ref()
    }

    pub fn key_image(&self) -> Option<&RistrettoPoint> {
        self.key_image.as_ref()
    }

    pub fn shared_random(&self) -> Option<&Scalar> {
        self.shared_random.as_ref()
    }

    pub fn shared_conceal_random(&self) -> Option<&Scalar> {
        self.shared_conceal_random.as_ref()
    }

    pub fn tx_random(&self) -> Option<&TxRandom> {
        self.tx_random.as_ref()
    }

    /// The commitment randomness.
    pub fn mask(&self) -> Option<&Scalar> {
        self.mask.as_ref()
    }

    pub fn amount(&self) -> Option<&Scalar> {
        self.amount.as_ref()
    }

    pub fn asset_tag(&self) -> Option<&RistrettoPoint> {
        self.asset_tag.as_ref()
    }

    pub fn raw_asset_tag(&self) -> Option<&RistrettoPoint> {
        self.raw_asset_tag.as_ref()
    }

    /// Plaintext value, or zero while concealed.
    pub fn value(&self) -> u64 {
        match (&self.amount, self.is_encrypted()) {
            (Some(amount), false) => scalar_to_u64(amount),
            _ => 0,
        }
    }

    /// Concealment is detected, not flagged: the coin is encrypted exactly
    /// when its stored commitment does not open to the stored amount and mask.
    pub fn is_encrypted(&self) -> bool {
        match (self.expected_commitment(), &self.commitment) {
            (Some(expected), Some(stored)) => expected != *stored,
            _ => true,
        }
    }

    pub fn shard_id(&self, params: &PrivacyParams) -> Result<u8> {
        Ok(params.shard_id_from_last_byte(self.last_byte()?))
    }

    /// Packed receiver/sender/type digits of the one-time key.
    pub fn shard_info(&self, params: &PrivacyParams) -> Result<ShardInfo> {
        params.derive_shard_info(self.last_byte()?)
    }

    fn last_byte(&self) -> Result<u8> {
        let pk = self
            .public_key
            .as_ref()
            .ok_or(PrivacyError::InvalidInput("coin has no public key"))?;
        Ok(point_to_bytes(pk)[POINT_SIZE - 1])
    }

    pub fn set_key_image(&mut self, key_image: Option<RistrettoPoint>) {
        self.key_image = key_image;
    }

    pub fn set_commitment(&mut self, commitment: Option<RistrettoPoint>) {
        self.commitment = commitment;
    }

    pub fn set_info(&mut self, info: Vec<u8>) {
        let mut info = info;
        info.truncate(MAX_SIZE_INFO_COIN);
        self.info = info;
    }

    /// Forget the shared randoms before the coin leaves the sender.
    pub fn clear_shared_randoms(&mut self) {
        self.shared_random = None;
        self.shared_conceal_random = None;
    }

    // ========================= Concealment =========================

    /// Blind mask and amount to the recipient's view key. The commitment is
    /// left untouched, which is what makes [`Self::is_encrypted`] flip.
    pub fn conceal_output_coin(&mut self, public_view: &RistrettoPoint) -> Result<()> {
        if self.is_encrypted() {
            return Err(PrivacyError::InvalidInput("coin is already concealed"));
        }
        let conceal = self
            .shared_conceal_random
            .ok_or(PrivacyError::InvalidInput("coin has no conceal randomness"))?;
        let (mask_offset, amount_offset) = conceal_offsets(&(conceal * public_view));
        self.mask = self.mask.map(|m| m + mask_offset);
        self.amount = self.amount.map(|a| a + amount_offset);
        self.clear_shared_randoms();
        Ok(())
    }

    /// Reduce a spent coin to its key image.
    pub fn conceal_input_coin(&mut self) {
        self.info.clear();
        self.public_key = None;
        self.commitment = None;
        self.mask = None;
        self.amount = None;
        self.asset_tag = None;
        self.raw_asset_tag = None;
        self.tx_random = Some(TxRandom::default());
        self.clear_shared_randoms();
    }

    /// Undo [`Self::conceal_output_coin`] with the view key, then derive the
    /// key image when the spending key is present.
    pub fn decrypt(&self, key_set: &KeySet) -> Result<Self> {
        if key_set.private_key.is_none() && key_set.viewing_key.is_none() {
            return Err(PrivacyError::DecryptionFailure(
                "key set has neither a private key nor a viewing key",
            ));
        }
        let mut out = self.clone();

        if self.is_encrypted() {
            let view = key_set
                .viewing_key
                .as_ref()
                .map(|vk| vk.private_view)
                .or_else(|| key_set.private_key.as_ref().map(|sk| sk.private_view()))
                .ok_or(PrivacyError::DecryptionFailure("no viewing key"))?;
            let tx = self
                .tx_random
                .ok_or(PrivacyError::DecryptionFailure("coin has no tx random"))?;
            let conceal_point = tx
                .conceal_random_point()
                .map_err(|_| PrivacyError::DecryptionFailure("conceal random point"))?;
            let (mask_offset, amount_offset) = conceal_offsets(&(view * conceal_point));
            let mask = self
                .mask
                .ok_or(PrivacyError::DecryptionFailure("coin has no mask"))?;
            let amount = self
                .amount
                .ok_or(PrivacyError::DecryptionFailure("coin has no amount"))?;
            out.mask = Some(mask - mask_offset);
            out.amount = Some(amount - amount_offset);
            if out.is_encrypted() {
                return Err(PrivacyError::CommitmentMismatch("coin v2 opening"));
            }
        }

        if let Some(sk) = &key_set.private_key {
            out.key_image = Some(self.key_image_with_private_key(sk)?);
        }
        Ok(out)
    }

    // ========================= Ownership =========================

    /// `txOtaRandomPoint^otaSecret`, the sender's `rK` seen from the receiver.
    pub fn recompute_shared_secret(&self, ota_secret: &Scalar) -> Result<RistrettoPoint> {
        let tx = self
            .tx_random
            .ok_or(PrivacyError::InvalidInput("coin has no tx random"))?;
        Ok(ota_secret * tx.ota_random_point()?)
    }

    /// One-time spending key `H(rK ‖ index) + sk`.
    pub fn private_key_of_coin(&self, sk: &PrivateKey) -> Result<Scalar> {
        let tx = self
            .tx_random
            .ok_or(PrivacyError::InvalidInput("coin has no tx random"))?;
        let rk = self.recompute_shared_secret(&sk.ota_secret())?;
        Ok(ota_offset(&rk, tx.index()) + sk.as_scalar())
    }

    /// `x · hashToPoint(pk)` with `x` the one-time spending key.
    pub fn key_image_with_private_key(&self, sk: &PrivateKey) -> Result<RistrettoPoint> {
        let pk = self
            .public_key
            .as_ref()
            .ok_or(PrivacyError::InvalidInput("coin has no public key"))?;
        let x = self.private_key_of_coin(sk)?;
        Ok(x * hash_to_point(&point_to_bytes(pk)))
    }

    /// Recognise the coin with the OTA secret. On success returns `rK` and, for
    /// CA coins, caches the unblinded asset tag.
    pub fn does_coin_belong_to_key_set(&mut self, key_set: &KeySet) -> (bool, Option<RistrettoPoint>) {
        let Some(ota) = &key_set.ota_key else {
            return (false, None);
        };
        let (Some(pk), Some(tx)) = (self.public_key, self.tx_random) else {
            return (false, None);
        };
        let Ok(rk) = self.recompute_shared_secret(&ota.ota_secret) else {
            return (false, None);
        };
        let spend = pk - ota_offset(&rk, tx.index()) * G;
        if !ota.owns_spend_key(&spend) {
            return (false, None);
        }
        if let Some(tag) = &self.asset_tag {
            self.raw_asset_tag = Some(unblind_asset_tag(tag, &asset_tag_blinder(&rk)));
        }
        (true, Some(rk))
    }

    /// Receiver-side acceptance check of an advertised output.
    pub fn check_coin_valid(&self, address: &PaymentAddress, shared_random: &Scalar, amount: u64) -> bool {
        if self.is_encrypted() || self.value() != amount {
            return false;
        }
        let (Some(pk), Some(tx)) = (&self.public_key, &self.tx_random) else {
            return false;
        };
        let Ok(public_ota) = address.ota_public() else {
            return false;
        };
        if tx.ota_random_point().ok() != Some(shared_random * G) {
            return false;
        }
        let expected =
            derive_one_time_public_key(&(shared_random * public_ota), tx.index(), &address.public_spend);
        expected == *pk
    }

    /// Whether the asset tag blinds `token_id` under `shared_secret`.
    pub fn validate_asset_tag(&self, shared_secret: &RistrettoPoint, token_id: &TokenId) -> bool {
        match &self.asset_tag {
            None => token_id.is_native(),
            Some(tag) => {
                blind_asset_tag(&token_id.raw_asset_tag(), &asset_tag_blinder(shared_secret))
                    == *tag
            }
        }
    }

    /// Token of this coin, looked up by its raw asset tag.
    pub fn token_id(
        &mut self,
        key_set: &KeySet,
        raw_tags: &HashMap<[u8; 32], TokenId>,
    ) -> Result<TokenId> {
        if self.asset_tag.is_none() {
            return Ok(TokenId::PRV);
        }
        if self.raw_asset_tag.is_none() {
            let (belongs, _) = self.does_coin_belong_to_key_set(key_set);
            if !belongs {
                return Err(PrivacyError::InvalidInput("coin does not belong to key set"));
            }
        }
        let raw = self
            .raw_asset_tag
            .as_ref()
            .ok_or(PrivacyError::InvalidInput("raw asset tag unavailable"))?;
        raw_tags.get(&point_to_bytes(raw)).copied().ok_or_else(|| {
            debug!("asset tag does not match any known token");
            PrivacyError::InvalidInput("unknown asset tag")
        })
    }

    // ========================= Codec =========================

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.info.len() + 9 * (POINT_SIZE + 1) + TX_RANDOM_SIZE);
        out.push(COIN_VERSION_2);
        write_len_prefixed(&mut out, &self.info);
        write_opt_point(&mut out, self.public_key.as_ref());
        write_opt_point(&mut out, self.commitment.as_ref());
        write_opt_point(&mut out, self.key_image.as_ref());
        write_opt_scalar(&mut out, self.shared_random.as_ref());
        write_opt_scalar(&mut out, self.shared_conceal_random.as_ref());
        match &self.tx_random {
            Some(tx) => write_len_prefixed(&mut out, tx.as_bytes()),
            None => out.push(0),
        }
        write_opt_scalar(&mut out, self.mask.as_ref());
        write_opt_scalar(&mut out, self.amount.as_ref());
        write_opt_point(&mut out, self.asset_tag.as_ref());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let mut r = Reader::new(b);
        if r.read_u8()? != COIN_VERSION_2 {
            return Err(PrivacyError::MalformedEncoding("coin version"));
        }
        let info = r.read_len_prefixed()?.to_vec();
        let public_key = r.read_opt_point()?;
        let commitment = r.read_opt_point()?;
        let key_image = r.read_opt_point()?;
        let shared_random = r.read_opt_scalar()?;
        let shared_conceal_random = r.read_opt_scalar()?;
        let tx_random = match r.read_u8()? as usize {
            0 => None,
            TX_RANDOM_SIZE => Some(TxRandom::from_bytes(r.read_bytes(TX_RANDOM_SIZE)?)?),
            _ => return Err(PrivacyError::MalformedEncoding("tx random field length")),
        };
        let mask = r.read_opt_scalar()?;
        let amount = r.read_opt_scalar()?;
        let asset_tag = if r.is_empty() {
            None
        } else {
            r.read_opt_point()?
        };
        r.finish()?;
        Ok(Self {
            info,
            public_key,
            commitment,
            key_image,
            shared_random,
            shared_conceal_random,
            tx_random,
            mask,
            amount,
            asset_tag,
            raw_asset_tag: None,
        })
    }
}
