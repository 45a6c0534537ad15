use crate::*;
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT as G, ristretto::RistrettoPoint, scalar::Scalar,
    traits::Identity,
};
use encoding::{u64_from_be_trimmed, u64_to_be_trimmed, write_opt_point, write_opt_scalar, Reader};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng(seed: u8) -> ChaCha20Rng {
    ChaCha20Rng::from_seed([seed; 32])
}

#[test]
fn generators_are_distinct_and_stable() {
    let gens = pedersen();
    assert_eq!(gens.g[PEDERSEN_PRIVATE_KEY_INDEX], G);
    for i in 0..gens.g.len() {
        for j in (i + 1)..gens.g.len() {
            assert_ne!(gens.g[i], gens.g[j], "generators {i} and {j} collide");
        }
    }
    let again = PedersenGens::new();
    assert_eq!(gens.g, again.g);
}

#[test]
fn commit_all_matches_single_index_sum() {
    let mut r = rng(1);
    let gens = pedersen();
    let sk = random_scalar(&mut r);
    let v = Scalar::from(1000u64);
    let snd = random_scalar(&mut r);
    let shard = Scalar::from(3u64);
    let rand = random_scalar(&mut r);

    let all = gens.commit_all(&[sk, v, snd, shard, rand]);
    let by_parts = sk * gens.g[0] + v * gens.g[1] + snd * gens.g[2] + shard * gens.g[3]
        + rand * gens.g[4];
    assert_eq!(all, by_parts);

    let multi = gens
        .multi_commit(&[v, rand], &[PEDERSEN_VALUE_INDEX, PEDERSEN_RANDOMNESS_INDEX])
        .expect("multi commit");
    assert_eq!(multi, gens.commit_at_index(&v, &rand, PEDERSEN_VALUE_INDEX));

    assert!(gens.multi_commit(&[v], &[7]).is_err());
    assert!(gens.multi_commit(&[v, rand], &[1]).is_err());
}

#[test]
fn hashes_are_deterministic_and_domain_separated() {
    assert_eq!(hash_to_scalar(b"abc"), hash_to_scalar(b"abc"));
    assert_ne!(hash_to_scalar(b"abc"), hash_to_scalar(b"abd"));
    assert_eq!(hash_to_point(b"abc"), hash_to_point(b"abc"));
    // part framing: ("ab","c") differs from ("a","bc")
    assert_ne!(
        hash_to_scalar_parts(&[b"ab", b"c"]),
        hash_to_scalar_parts(&[b"a", b"bc"])
    );
}

#[test]
fn serial_number_inverts_sum() {
    let mut r = rng(2);
    let sk = random_scalar(&mut r);
    let snd = random_scalar(&mut r);
    let sn = derive_serial_number(&sk, &snd);
    assert_eq!((sk + snd) * sn, G);
}

#[test]
fn key_set_components_line_up() {
    let sk = PrivateKey::from_seed(b"alice");
    let ks = KeySet::from_private_key(&sk);
    let vk = ks.viewing_key.as_ref().expect("view key");
    let ota = ks.ota_key.as_ref().expect("ota key");

    assert_eq!(ks.payment_address.public_spend, sk.public_spend());
    assert_eq!(ks.payment_address.public_view, vk.public_view());
    assert_eq!(ks.payment_address.public_ota, Some(ota.public_ota()));
    assert!(ota.owns_spend_key(&sk.public_spend()));
    assert!(!ota.owns_spend_key(&G));

    let addr = PaymentAddress::from_bytes(&ks.payment_address.to_bytes()).expect("decode");
    assert_eq!(addr, ks.payment_address);

    let legacy = PaymentAddress {
        public_ota: None,
        ..ks.payment_address
    };
    assert_eq!(legacy.to_bytes().len(), 64);
    assert_eq!(PaymentAddress::from_bytes(&legacy.to_bytes()).expect("decode"), legacy);
    assert!(legacy.ota_public().is_err());
    assert!(PaymentAddress::from_bytes(&[0u8; 65]).is_err());
}

#[test]
fn private_key_debug_hides_secret() {
    let sk = PrivateKey::from_scalar(Scalar::from(5u64));
    assert_eq!(format!("{sk:?}"), "PrivateKey(..)");
}

#[test]
fn hybrid_round_trip() {
    let mut r = rng(3);
    let sk = random_scalar(&mut r);
    let pk = sk * G;
    let msg = b"randomness and value travel together".to_vec();

    let ct = hybrid_encrypt(&msg, &pk, &mut r);
    let bytes = ct.to_bytes();
    assert_eq!(bytes.len(), hybrid::HYBRID_MIN_SIZE + msg.len());
    // each ElGamal half carries a 32-byte length marker
    assert_eq!(hex::encode([bytes[0], bytes[33]]), "2020");
    assert_eq!(HybridCipherText::from_bytes(&bytes).expect("parse"), ct);

    assert_eq!(hybrid_decrypt(&ct, &sk).expect("decrypt"), msg);
    assert_eq!(hybrid_decrypt_bytes(&bytes, &sk).expect("decrypt"), msg);

    let wrong = hybrid_decrypt(&ct, &(sk + Scalar::ONE)).expect("decrypts to garbage");
    assert_ne!(wrong, msg);
}

#[test]
fn hybrid_rejects_short_input() {
    let sk = Scalar::from(9u64);
    let err = hybrid_decrypt_bytes(&[0x20; 65], &sk).unwrap_err();
    assert!(matches!(err, PrivacyError::MalformedEncoding(_)));
    assert!(matches!(
        HybridCipherText::from_bytes(&[0x20; hybrid::HYBRID_MIN_SIZE - 1]),
        Err(PrivacyError::MalformedEncoding(_))
    ));
    assert!(HybridCipherText::from_bytes(&[]).is_err());
}

#[test]
fn reader_handles_optional_fields() {
    let p = Scalar::from(11u64) * G;
    let s = Scalar::from(12u64);
    let mut buf = Vec::new();
    write_opt_point(&mut buf, Some(&p));
    write_opt_point(&mut buf, None);
    write_opt_scalar(&mut buf, Some(&s));
    write_opt_scalar(&mut buf, None);

    let mut r = Reader::new(&buf);
    assert_eq!(r.read_opt_point().expect("p"), Some(p));
    assert_eq!(r.read_opt_point().expect("none"), None);
    assert_eq!(r.read_opt_scalar().expect("s"), Some(s));
    assert_eq!(r.read_opt_scalar().expect("none"), None);
    assert!(r.finish().is_ok());
    assert!(r.read_u8().is_err());

    // A length other than 0 or 32 is malformed.
    let mut r = Reader::new(&[5, 1, 2, 3, 4, 5]);
    assert!(matches!(
        r.read_opt_point(),
        Err(PrivacyError::MalformedEncoding(_))
    ));
}

#[test]
fn reader_rejects_invalid_points_and_scalars() {
    let mut bad = vec![32u8];
    bad.extend_from_slice(&[0xffu8; 32]);
    let mut r = Reader::new(&bad);
    assert!(matches!(
        r.read_opt_point(),
        Err(PrivacyError::InvalidCurveElement(_))
    ));
    let mut r = Reader::new(&bad);
    assert!(matches!(
        r.read_opt_scalar(),
        Err(PrivacyError::InvalidCurveElement(_))
    ));
    let id = RistrettoPoint::identity().compress().to_bytes();
    assert!(encoding::point_from_bytes(&id).is_ok());
}

#[test]
fn trimmed_value_encoding() {
    assert!(u64_to_be_trimmed(0).is_empty());
    assert_eq!(hex::encode(u64_to_be_trimmed(1000)), "03e8");
    assert_eq!(hex::encode(u64_to_be_trimmed(u64::MAX)), "ffffffffffffffff");
    let bytes = hex::decode("03e8").expect("hex");
    assert_eq!(u64_from_be_trimmed(&bytes).expect("decode"), 1000);
    assert_eq!(u64_from_be_trimmed(&[]).expect("decode"), 0);
    assert!(u64_from_be_trimmed(&[1; 9]).is_err());
}

#[test]
fn params_from_json_and_validation() {
    let p = PrivacyParams::from_json(r#"{"numShards": 4}"#).expect("parse");
    assert_eq!(p.num_shards, 4);
    assert_eq!(p.max_tries_ota, params::MAX_TRIES_OTA);
    assert_eq!(PrivacyParams::from_json("{}").expect("defaults"), PrivacyParams::default());
    assert!(PrivacyParams::from_json(r#"{"numShards": 0}"#).is_err());
    assert!(PrivacyParams::from_json("not json").is_err());
}

#[test]
fn packed_shard_digits() {
    let p = PrivacyParams::default();
    let info = ShardInfo {
        receiver_shard: 5,
        sender_shard: 2,
        privacy_type: CoinPrivacyType::Mint,
    };
    let b = p.encode_shard_info(&info).expect("encode");
    assert_eq!(b, 5 + 2 * 8 + 64);
    assert_eq!(p.derive_shard_info(b).expect("decode"), info);
    assert_eq!(p.shard_id_from_last_byte(b), 5);

    // digit 2 in the privacy-type position is not a coin type
    assert!(p.derive_shard_info(128).is_err());

    let wide = PrivacyParams::new(16).expect("16 shards");
    assert_eq!(
        wide.derive_shard_info(3).unwrap_err(),
        PrivacyError::UnsupportedShardConfig(16)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn trimmed_value_round_trip(v in any::<u64>()) {
        prop_assert_eq!(u64_from_be_trimmed(&u64_to_be_trimmed(v)).unwrap(), v);
    }

    #[test]
    fn shard_digits_round_trip(n in 1u8..=8, recv in 0u8..8, send in 0u8..8, mint in any::<bool>()) {
        let p = PrivacyParams::new(n).unwrap();
        let info = ShardInfo {
            receiver_shard: recv % n,
            sender_shard: send % n,
            privacy_type: if mint { CoinPrivacyType::Mint } else { CoinPrivacyType::Transfer },
        };
        let b = p.encode_shard_info(&info).unwrap();
        prop_assert_eq!(p.derive_shard_info(b).unwrap(), info);
    }
}
