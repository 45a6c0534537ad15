//! Unit tests for the proof systems.
//! Covered:
//!   1) Serial-number proofs: honest proofs verify, wrong keys and tampered bytes are rejected
//!   2) One-out-of-many: every ring position verifies, a ring without a zero opening cannot be proven
//!   3) Range proofs: single and aggregated values, out-of-range commitments, alternate bases,
//!      slow and faster verification agree

use crate::*;
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use privacy_primitives::{
    derive_serial_number, hash_to_point, pedersen, random_scalar, PrivacyError,
    PEDERSEN_PRIVATE_KEY_INDEX, PEDERSEN_RANDOMNESS_INDEX, PEDERSEN_SND_INDEX,
    PEDERSEN_VALUE_INDEX,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng(seed: u8) -> ChaCha20Rng {
    ChaCha20Rng::from_seed([seed; 32])
}

fn flip(bytes: &mut [u8], at: usize) {
    bytes[at] ^= 0x01;
}

// ---------- Serial number, no privacy ----------

fn sn_no_privacy_witness(seed: u8) -> SnNoPrivacyWitness {
    let mut r = rng(seed);
    let sk = random_scalar(&mut r);
    let snd = random_scalar(&mut r);
    let pk = sk * pedersen().g[PEDERSEN_PRIVATE_KEY_INDEX];
    SnNoPrivacyWitness::new(derive_serial_number(&sk, &snd), pk, snd, sk)
}

#[test]
fn sn_no_privacy_verifies() {
    let proof = sn_no_privacy_witness(1).prove(None, &mut rng(2));
    proof.verify(None).expect("verify");

    let bytes = proof.to_bytes();
    assert_eq!(bytes.len(), SN_NO_PRIVACY_PROOF_SIZE);
    let decoded = SnNoPrivacyProof::from_bytes(&bytes).expect("decode");
    assert_eq!(decoded, proof);
    decoded.verify(None).expect("verify decoded");
}

#[test]
fn sn_no_privacy_external_challenge_must_match() {
    let mess = Scalar::from(42u64);
    let proof = sn_no_privacy_witness(3).prove(Some(&mess), &mut rng(4));
    proof.verify(Some(&mess)).expect("same challenge");
    assert!(proof.verify(Some(&Scalar::from(43u64))).is_err());
    assert!(proof.verify(None).is_err());
}

#[test]
fn sn_no_privacy_rejects_foreign_key() {
    let mut r = rng(5);
    let sk = random_scalar(&mut r);
    let other = random_scalar(&mut r);
    let snd = random_scalar(&mut r);
    let pk = other * pedersen().g[PEDERSEN_PRIVATE_KEY_INDEX];
    let proof = SnNoPrivacyWitness::new(derive_serial_number(&sk, &snd), pk, snd, sk).prove(None, &mut r);
    assert!(matches!(
        proof.verify(None),
        Err(PrivacyError::ProofVerificationFailed(_))
    ));
}

#[test]
fn sn_no_privacy_rejects_tampered_response() {
    let mut bytes = sn_no_privacy_witness(6).prove(None, &mut rng(7)).to_bytes();
    // low byte of zSeed
    flip(&mut bytes, 5 * 32);
    let tampered = SnNoPrivacyProof::from_bytes(&bytes).expect("still canonical");
    assert!(tampered.verify(None).is_err());
}

#[test]
fn sn_no_privacy_rejects_wrong_length() {
    let bytes = sn_no_privacy_witness(8).prove(None, &mut rng(9)).to_bytes();
    assert!(matches!(
        SnNoPrivacyProof::from_bytes(&bytes[..bytes.len() - 1]),
        Err(PrivacyError::MalformedEncoding(_))
    ));
}

// ---------- Serial number, with privacy ----------

struct SnPrivacyFixture {
    witness: SnPrivacyWitness,
    com_sk: RistrettoPoint,
}

fn sn_privacy_fixture(seed: u8) -> SnPrivacyFixture {
    let mut r = rng(seed);
    let gens = pedersen();
    let sk = random_scalar(&mut r);
    let r_sk = random_scalar(&mut r);
    let snd = random_scalar(&mut r);
    let r_snd = random_scalar(&mut r);
    let com_sk = gens.commit_at_index(&sk, &r_sk, PEDERSEN_PRIVATE_KEY_INDEX);
    let stmt = SnPrivacyStatement {
        sn: derive_serial_number(&sk, &snd),
        com_sk,
        com_input: gens.commit_at_index(&snd, &r_snd, PEDERSEN_SND_INDEX),
    };
    SnPrivacyFixture {
        witness: SnPrivacyWitness::new(stmt, sk, r_sk, snd, r_snd),
        com_sk,
    }
}

#[test]
fn sn_privacy_verifies() {
    let fx = sn_privacy_fixture(10);
    let proof = fx.witness.prove(None, &mut rng(11));
    proof.verify(&fx.com_sk, None).expect("verify");

    let bytes = proof.to_bytes();
    assert_eq!(bytes.len(), SN_PRIVACY_PROOF_SIZE);
    let decoded = SnPrivacyProof::from_bytes(&bytes).expect("decode");
    assert_eq!(decoded.serial_number(), &fx.witness.statement().sn);
    decoded.verify(&fx.com_sk, None).expect("verify decoded");
}

#[test]
fn sn_privacy_rejects_other_key_commitment() {
    let fx = sn_privacy_fixture(12);
    let other = sn_privacy_fixture(13);
    let proof = fx.witness.prove(None, &mut rng(14));
    assert!(proof.verify(&other.com_sk, None).is_err());
}

#[test]
fn sn_privacy_rejects_tampered_bytes() {
    let fx = sn_privacy_fixture(15);
    let bytes = fx.witness.prove(None, &mut rng(16)).to_bytes();
    // one response byte in each of zSK, zRSK, zInput, zRInput
    for at in [5 * 32, 6 * 32, 7 * 32, 8 * 32] {
        let mut tampered = bytes.clone();
        flip(&mut tampered, at);
        let proof = SnPrivacyProof::from_bytes(&tampered).expect("still canonical");
        assert!(proof.verify(&fx.com_sk, None).is_err(), "byte {at}");
    }
}

// ---------- One out of many ----------

fn ring_with_zero_at(index: usize, seed: u8) -> (Vec<RistrettoPoint>, Scalar) {
    let mut r = rng(seed);
    let gens = pedersen();
    let rand = random_scalar(&mut r);
    let ring = (0..8)
        .map(|i| {
            if i == index {
                gens.commit_at_index(&Scalar::ZERO, &rand, PEDERSEN_PRIVATE_KEY_INDEX)
            } else {
                gens.commit_at_index(
                    &random_scalar(&mut r),
                    &random_scalar(&mut r),
                    PEDERSEN_PRIVATE_KEY_INDEX,
                )
            }
        })
        .collect();
    (ring, rand)
}

#[test]
fn one_out_of_many_verifies_at_every_index() {
    for index in 0..8 {
        let (ring, rand) = ring_with_zero_at(index, 20 + index as u8);
        let proof = OneOutOfManyWitness::new(rand, index)
            .prove(&ring, &mut rng(40))
            .expect("prove");
        proof.verify(&ring).expect("verify");

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), ONE_OF_MANY_PROOF_SIZE);
        assert_eq!(OneOutOfManyProof::from_bytes(&bytes).expect("decode"), proof);
    }
}

#[test]
fn one_out_of_many_requires_zero_opening() {
    let (ring, rand) = ring_with_zero_at(2, 41);
    let err = OneOutOfManyWitness::new(rand, 3).prove(&ring, &mut rng(42));
    assert!(matches!(err, Err(PrivacyError::InvalidInput(_))));
    let err = OneOutOfManyWitness::new(rand, 8).prove(&ring, &mut rng(42));
    assert!(matches!(err, Err(PrivacyError::InvalidInput(_))));
}

#[test]
fn one_out_of_many_rejects_swapped_ring() {
    let (ring, rand) = ring_with_zero_at(5, 43);
    let proof = OneOutOfManyWitness::new(rand, 5)
        .prove(&ring, &mut rng(44))
        .expect("prove");
    let (other_ring, _) = ring_with_zero_at(5, 45);
    assert!(proof.verify(&other_ring).is_err());
    assert!(proof.verify(&ring[..7]).is_err());
}

#[test]
fn one_out_of_many_rejects_tampered_bytes() {
    let (ring, rand) = ring_with_zero_at(1, 46);
    let bytes = OneOutOfManyWitness::new(rand, 1)
        .prove(&ring, &mut rng(47))
        .expect("prove")
        .to_bytes();
    // f[0], za[1], zb[2], zd
    for at in [12 * 32, 16 * 32, 20 * 32, 21 * 32] {
        let mut tampered = bytes.clone();
        flip(&mut tampered, at);
        let proof = OneOutOfManyProof::from_bytes(&tampered).expect("still canonical");
        assert!(proof.verify(&ring).is_err(), "byte {at}");
    }
}

// ---------- Range proof ----------

fn range_witness(values: &[u64], seed: u8) -> AggregatedRangeWitness {
    let mut r = rng(seed);
    let rands = values.iter().map(|_| random_scalar(&mut r)).collect();
    AggregatedRangeWitness::new(values.to_vec(), rands).expect("witness")
}

#[test]
fn range_proof_single_value() {
    let witness = range_witness(&[1_000_000], 50);
    let proof = witness.prove(RANGE_PROOF_VERSION_1, &mut rng(51)).expect("prove");
    proof.verify().expect("verify");
    proof.verify_faster().expect("verify faster");

    let expected = pedersen().commit_at_index(
        &Scalar::from(1_000_000u64),
        &witness.rands()[0],
        PEDERSEN_VALUE_INDEX,
    );
    assert_eq!(proof.commitments(), &[expected]);
}

#[test]
fn range_proof_aggregates_and_pads() {
    let values = [0, 1, u64::MAX];
    let proof = range_witness(&values, 52)
        .prove(RANGE_PROOF_VERSION_1, &mut rng(53))
        .expect("prove");
    assert_eq!(proof.commitments().len(), 3);
    // padded to four values: 256 bits, eight folding rounds
    assert_eq!(proof.inner_product_proof().rounds(), 8);
    proof.verify().expect("verify");
    proof.verify_faster().expect("verify faster");
}

#[test]
fn range_proof_rejects_out_of_range_commitment() {
    let mut proof = range_witness(&[7], 54)
        .prove(RANGE_PROOF_VERSION_1, &mut rng(55))
        .expect("prove");
    let rand = random_scalar(&mut rng(56));
    // 2^64 does not fit in 64 bits
    let two_64 = Scalar::from(u64::MAX) + Scalar::ONE;
    proof.set_commitments(vec![pedersen().commit_at_index(&two_64, &rand, PEDERSEN_VALUE_INDEX)]);
    assert!(proof.verify().is_err());
    assert!(proof.verify_faster().is_err());
}

#[test]
fn range_proof_rejects_reordered_commitments() {
    let mut proof = range_witness(&[5, 6], 57)
        .prove(RANGE_PROOF_VERSION_1, &mut rng(58))
        .expect("prove");
    let mut cms = proof.commitments().to_vec();
    cms.swap(0, 1);
    proof.set_commitments(cms);
    assert!(proof.verify().is_err());
    assert!(proof.verify_faster().is_err());
}

#[test]
fn range_proof_with_asset_base() {
    let base = hash_to_point(b"some asset tag");
    let proof = range_witness(&[10, 20], 59)
        .prove_using_base(RANGE_PROOF_VERSION_2, &base, &mut rng(60))
        .expect("prove");
    proof.verify_using_base(&base).expect("verify");
    proof.verify_faster_using_base(&base).expect("verify faster");
    assert!(proof.verify().is_err());
    assert!(proof
        .verify_faster_using_base(&pedersen().g[PEDERSEN_RANDOMNESS_INDEX])
        .is_err());
}

#[test]
fn range_proof_versions_encode_differently() {
    let witness = range_witness(&[3], 61);
    let v1 = witness.prove(RANGE_PROOF_VERSION_1, &mut rng(62)).expect("prove v1");
    let v2 = witness.prove(RANGE_PROOF_VERSION_2, &mut rng(62)).expect("prove v2");

    let b1 = v1.to_bytes();
    let b2 = v2.to_bytes();
    assert_eq!(b1[0], 1);
    assert_eq!(&b2[..3], &[0, RANGE_PROOF_VERSION_2, 1]);
    assert_eq!(b2.len(), b1.len() + 2);

    let d1 = AggregatedRangeProof::from_bytes(&b1).expect("decode v1");
    let d2 = AggregatedRangeProof::from_bytes(&b2).expect("decode v2");
    assert_eq!(d1.version(), RANGE_PROOF_VERSION_1);
    assert_eq!(d2.version(), RANGE_PROOF_VERSION_2);
    d1.verify_faster().expect("verify v1");
    d2.verify_faster().expect("verify v2");
    assert_eq!(d2, v2);
}

#[test]
fn range_proof_version_is_bound_to_transcript() {
    let proof = range_witness(&[3], 63)
        .prove(RANGE_PROOF_VERSION_2, &mut rng(64))
        .expect("prove");
    let mut bytes = proof.to_bytes();
    bytes[1] = 3;
    let relabelled = AggregatedRangeProof::from_bytes(&bytes).expect("decode");
    assert!(relabelled.verify().is_err());
}

#[test]
fn range_proof_rejects_bad_encodings() {
    let bytes = range_witness(&[9], 65)
        .prove(RANGE_PROOF_VERSION_1, &mut rng(66))
        .expect("prove")
        .to_bytes();
    assert!(AggregatedRangeProof::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    let mut extra = bytes.clone();
    extra.push(0);
    assert!(AggregatedRangeProof::from_bytes(&extra).is_err());
    assert!(AggregatedRangeProof::from_bytes(&[0, 1, 1]).is_err());
    assert!(AggregatedRangeProof::from_bytes(&[]).is_err());
}

#[test]
fn range_proof_rejects_tampered_scalars() {
    let bytes = range_witness(&[12345], 67)
        .prove(RANGE_PROOF_VERSION_1, &mut rng(68))
        .expect("prove")
        .to_bytes();
    // count(1) + V(32) + A, S, T1, T2 (128) puts tauX at 161
    for at in [161, 161 + 32, 161 + 64] {
        let mut tampered = bytes.clone();
        flip(&mut tampered, at);
        let proof = AggregatedRangeProof::from_bytes(&tampered).expect("still canonical");
        assert!(proof.verify_faster().is_err(), "byte {at}");
        assert!(proof.verify().is_err(), "byte {at}");
    }
}

#[test]
fn range_witness_validates_counts() {
    assert!(AggregatedRangeWitness::new(vec![], vec![]).is_err());
    assert!(AggregatedRangeWitness::new(vec![1, 2], vec![Scalar::ONE]).is_err());
    assert!(AggregatedRangeWitness::new(vec![0; 33], vec![Scalar::ONE; 33]).is_err());
}

// ---------- Inner product ----------

#[test]
fn inner_product_argument_standalone() {
    use merlin::Transcript;
    let gens = bulletproofs::bulletproof_gens();
    let n = 16;
    let mut r = rng(70);
    let a: Vec<Scalar> = (0..n).map(|_| random_scalar(&mut r)).collect();
    let b: Vec<Scalar> = (0..n).map(|_| random_scalar(&mut r)).collect();
    let g = &gens.g_vec[..n];
    let h = &gens.h_vec[..n];
    let c = bulletproofs::inner_product(&a, &b);
    let p: RistrettoPoint = a.iter().zip(g).map(|(s, p)| s * p).sum::<RistrettoPoint>()
        + b.iter().zip(h).map(|(s, p)| s * p).sum::<RistrettoPoint>()
        + c * gens.u;

    let proof = InnerProductProof::prove(&mut Transcript::new(b"ipa-test"), g, h, &gens.u, p, a, b)
        .expect("prove");
    assert_eq!(proof.rounds(), 4);
    assert!(proof.verify(&mut Transcript::new(b"ipa-test"), g, h, &gens.u));
    assert!(proof.verify_faster(&mut Transcript::new(b"ipa-test"), g, h, &gens.u));
    assert!(!proof.verify_faster(&mut Transcript::new(b"other"), g, h, &gens.u));

    let decoded = InnerProductProof::from_bytes(&proof.to_bytes()).expect("decode");
    assert_eq!(decoded, proof);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn range_proof_accepts_any_u64(v in any::<u64>(), seed in any::<u8>()) {
        let proof = range_witness(&[v], seed)
            .prove(RANGE_PROOF_VERSION_1, &mut rng(seed.wrapping_add(1)))
            .expect("prove");
        prop_assert!(proof.verify_faster().is_ok());
    }
}
