//! Fiat–Shamir transcript helpers.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use merlin::Transcript;

pub mod labels {
    pub const PROTOCOL_V: &[u8] = b"privacy-core/v1";

    pub const SN_NO_PRIVACY: &[u8] = b"sn-no-privacy";
    pub const SN_PRIVACY: &[u8] = b"sn-privacy";
    pub const ONE_OF_MANY: &[u8] = b"one-out-of-many";
    pub const RANGE_PROOF: &[u8] = b"aggregated-range-proof";

    pub const CHAL_X: &[u8] = b"x";
    pub const CHAL_Y: &[u8] = b"y";
    pub const CHAL_Z: &[u8] = b"z";
    pub const CHAL_W: &[u8] = b"w";
    pub const CHAL_IPA: &[u8] = b"ipa-u";
}

pub fn new_transcript(protocol: &'static [u8]) -> Transcript {
    let mut t = Transcript::new(protocol);
    t.append_message(b"proto", labels::PROTOCOL_V);
    t
}

pub fn append_point(t: &mut Transcript, label: &'static [u8], p: &RistrettoPoint) {
    t.append_message(label, p.compress().as_bytes());
}

pub fn append_points(t: &mut Transcript, label: &'static [u8], ps: &[RistrettoPoint]) {
    t.append_u64(label, ps.len() as u64);
    for p in ps {
        append_point(t, label, p);
    }
}

pub fn append_scalar(t: &mut Transcript, label: &'static [u8], s: &Scalar) {
    t.append_message(label, s.as_bytes());
}

pub fn challenge_scalar(t: &mut Transcript, label: &'static [u8]) -> Scalar {
    let mut wide = [0u8; 64];
    t.challenge_bytes(label, &mut wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}
