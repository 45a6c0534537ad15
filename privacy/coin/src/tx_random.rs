use curve25519_dalek::{ristretto::RistrettoPoint, traits::Identity};
use privacy_primitives::{
    encoding::{point_from_bytes, point_to_bytes},
    params::{POINT_SIZE, TX_RANDOM_SIZE},
    PrivacyError, Result,
};

const INDEX_OFFSET: usize = POINT_SIZE;
const CONCEAL_OFFSET: usize = POINT_SIZE + 4;

/// Randomness published with a V2 coin:
///
/// ```text
/// otaRandomPoint(32) || index(4, BE) || concealRandomPoint(32)
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TxRandom([u8; TX_RANDOM_SIZE]);

impl core::fmt::Debug for TxRandom {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TxRandom({})", hex::encode(self.0))
    }
}

impl Default for TxRandom {
    fn default() -> Self {
        Self::new(&RistrettoPoint::identity(), 0, &RistrettoPoint::identity())
    }
}

impl TxRandom {
    pub fn new(ota_random: &RistrettoPoint, index: u32, conceal_random: &RistrettoPoint) -> Self {
        let mut b = [0u8; TX_RANDOM_SIZE];
        b[..INDEX_OFFSET].copy_from_slice(&point_to_bytes(ota_random));
        b[INDEX_OFFSET..CONCEAL_OFFSET].copy_from_slice(&index.to_be_bytes());
        b[CONCEAL_OFFSET..].copy_from_slice(&point_to_bytes(conceal_random));
        Self(b)
    }

    pub fn ota_random_point(&self) -> Result<RistrettoPoint> {
        point_from_bytes(&self.0[..INDEX_OFFSET])
    }

    pub fn index(&self) -> u32 {
        let mut idx = [0u8; 4];
        idx.copy_from_slice(&self.0[INDEX_OFFSET..CONCEAL_OFFSET]);
        u32::from_be_bytes(idx)
    }

    pub fn conceal_random_point(&self) -> Result<RistrettoPoint> {
        point_from_bytes(&self.0[CONCEAL_OFFSET..])
    }

    pub fn as_bytes(&self) -> &[u8; TX_RANDOM_SIZE] {
        &self.0
    }

    /// Both embedded points must decode.
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let arr: [u8; TX_RANDOM_SIZE] = b
            .try_into()
            .map_err(|_| PrivacyError::MalformedEncoding("tx random length"))?;
        let tx = Self(arr);
        tx.ota_random_point()?;
        tx.conceal_random_point()?;
        Ok(tx)
    }
}
