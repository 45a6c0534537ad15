use crate::*;
use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT as G, scalar::Scalar};
use privacy_primitives::{
    params::CoinPrivacyType, pedersen, random_scalar, PaymentInfo, PrivateKey,
    PEDERSEN_VALUE_INDEX,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng(seed: u8) -> ChaCha20Rng {
    ChaCha20Rng::from_seed([seed; 32])
}

fn key_set(seed: &[u8]) -> KeySet {
    KeySet::from_private_key(&PrivateKey::from_seed(seed))
}

fn v2_coin(ks: &KeySet, amount: u64, seed: u8) -> CoinV2 {
    let info = PaymentInfo::new(ks.payment_address, amount, b"memo".to_vec());
    CoinV2::new_from_payment_info(&PrivacyParams::default(), &CoinParams::new(info), &mut rng(seed))
        .expect("coin")
}

// ---------- V2: construction, concealment, decryption ----------

#[test]
fn payment_scenario_value_visibility() {
    let alice = key_set(b"alice");
    let mut coin = v2_coin(&alice, 1000, 1);

    assert!(!coin.is_encrypted());
    assert_eq!(coin.value(), 1000);
    let expected = pedersen().commit_at_index(
        &Scalar::from(1000u64),
        coin.mask().expect("mask"),
        PEDERSEN_VALUE_INDEX,
    );
    assert_eq!(coin.commitment(), Some(&expected));

    coin.conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");
    assert!(coin.is_encrypted());
    assert_eq!(coin.value(), 0);
    assert!(coin.shared_random().is_none());
    assert!(coin.shared_conceal_random().is_none());

    let opened = coin.decrypt(&alice).expect("decrypt");
    assert!(!opened.is_encrypted());
    assert_eq!(opened.value(), 1000);
    assert_eq!(opened.commitment(), Some(&expected));
    assert!(opened.key_image().is_some());

    let mut spent = opened.clone();
    spent.conceal_input_coin();
    assert_eq!(spent.value(), 0);
    assert!(spent.public_key().is_none());
    assert_eq!(spent.key_image(), opened.key_image());
}

#[test]
fn concealing_twice_is_rejected() {
    let alice = key_set(b"alice");
    let mut coin = v2_coin(&alice, 5, 2);
    coin.conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");
    assert!(coin
        .conceal_output_coin(&alice.payment_address.public_view)
        .is_err());
}

#[test]
fn decrypt_with_wrong_view_key_is_a_commitment_mismatch() {
    let alice = key_set(b"alice");
    let bob = key_set(b"bob");
    let mut coin = v2_coin(&alice, 77, 3);
    coin.conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");
    assert!(matches!(
        coin.decrypt(&bob),
        Err(PrivacyError::CommitmentMismatch(_))
    ));
}

#[test]
fn decrypt_without_key_material_fails() {
    let alice = key_set(b"alice");
    let coin = v2_coin(&alice, 77, 4);
    let public_only = KeySet::from_payment_address(alice.payment_address);
    assert!(matches!(
        coin.decrypt(&public_only),
        Err(PrivacyError::DecryptionFailure(_))
    ));
}

#[test]
fn viewing_key_decrypts_without_key_image() {
    let alice = key_set(b"alice");
    let mut coin = v2_coin(&alice, 31, 5);
    coin.conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");
    let vk_only = KeySet::from_viewing_key(
        alice.viewing_key.clone().expect("vk"),
        alice.payment_address,
    );
    let opened = coin.decrypt(&vk_only).expect("decrypt");
    assert_eq!(opened.value(), 31);
    assert!(opened.key_image().is_none());
}

#[test]
fn key_image_is_reproducible_and_bound_to_owner() {
    let sk = PrivateKey::from_seed(b"alice");
    let alice = KeySet::from_private_key(&sk);
    let coin = v2_coin(&alice, 9, 6);
    let ki1 = coin.key_image_with_private_key(&sk).expect("ki");
    let ki2 = coin.decrypt(&alice).expect("decrypt").key_image().copied();
    assert_eq!(Some(ki1), ki2);

    // the one-time key opens the coin's public key
    let x = coin.private_key_of_coin(&sk).expect("x");
    assert_eq!(Some(&(x * G)), coin.public_key());
}

// ---------- V2: ownership and OTA ----------

#[test]
fn ownership_is_detected_only_for_recipient() {
    let alice = key_set(b"alice");
    let bob = key_set(b"bob");
    let mut coin = v2_coin(&alice, 10, 7);

    let (mine, rk) = coin.does_coin_belong_to_key_set(&alice);
    assert!(mine);
    let expected_rk = coin.shared_random().copied().expect("r")
        * alice.payment_address.public_ota.expect("ota");
    assert_eq!(rk, Some(expected_rk));

    let (theirs, none) = coin.does_coin_belong_to_key_set(&bob);
    assert!(!theirs);
    assert!(none.is_none());

    let public_only = KeySet::from_payment_address(alice.payment_address);
    assert!(!coin.does_coin_belong_to_key_set(&public_only).0);
}

#[test]
fn one_time_key_lands_in_recipient_shard() {
    let params = PrivacyParams::default();
    let alice = key_set(b"alice");
    let coin = v2_coin(&alice, 10, 8);
    assert_eq!(
        coin.shard_id(&params).expect("shard"),
        params.shard_id_from_last_byte(alice.payment_address.last_byte())
    );
    assert!(coin.tx_random().expect("tx").index() >= 1);
}

#[test]
fn packed_sender_shard_routing() {
    let params = PrivacyParams::default();
    let alice = key_set(b"alice");
    let info = PaymentInfo::new(alice.payment_address, 3, vec![]);
    let cp = CoinParams::new(info).with_sender_shard(6, CoinPrivacyType::Mint);
    let coin = CoinV2::new_from_payment_info(&params, &cp, &mut rng(9)).expect("coin");
    let shard_info = coin.shard_info(&params).expect("digits");
    assert_eq!(shard_info.sender_shard, 6);
    assert_eq!(shard_info.privacy_type, CoinPrivacyType::Mint);
    assert_eq!(
        shard_info.receiver_shard,
        params.shard_id_from_last_byte(alice.payment_address.last_byte())
    );
}

#[test]
fn packed_routing_rejects_wide_shard_configs() {
    let params = PrivacyParams::new(16).expect("params");
    let alice = key_set(b"alice");
    let info = PaymentInfo::new(alice.payment_address, 3, vec![]);
    let cp = CoinParams::new(info).with_sender_shard(1, CoinPrivacyType::Transfer);
    assert_eq!(
        CoinV2::new_from_payment_info(&params, &cp, &mut rng(10)).unwrap_err(),
        PrivacyError::UnsupportedShardConfig(16)
    );
}

#[test]
fn ota_search_reports_exhaustion() {
    let params = PrivacyParams {
        num_shards: 8,
        max_tries_ota: 1,
    };
    let alice = key_set(b"alice");
    let info = PaymentInfo::new(alice.payment_address, 3, vec![]);
    assert_eq!(
        CoinV2::new_from_payment_info(&params, &CoinParams::new(info), &mut rng(11)).unwrap_err(),
        PrivacyError::OtaExhausted(1)
    );
}

#[test]
fn legacy_address_cannot_receive_v2() {
    let alice = key_set(b"alice");
    let mut addr = alice.payment_address;
    addr.public_ota = None;
    let info = PaymentInfo::new(addr, 3, vec![]);
    assert!(
        CoinV2::new_from_payment_info(&PrivacyParams::default(), &CoinParams::new(info), &mut rng(12))
            .is_err()
    );
}

#[test]
fn check_coin_valid_accepts_only_the_advertised_output() {
    let alice = key_set(b"alice");
    let bob = key_set(b"bob");
    let coin = v2_coin(&alice, 1000, 13);
    let r = *coin.shared_random().expect("r");

    assert!(coin.check_coin_valid(&alice.payment_address, &r, 1000));
    assert!(!coin.check_coin_valid(&alice.payment_address, &r, 999));
    assert!(!coin.check_coin_valid(&bob.payment_address, &r, 1000));
    assert!(!coin.check_coin_valid(&alice.payment_address, &(r + Scalar::ONE), 1000));
}

#[test]
fn ota_receiver_round_trip_and_payment() {
    let params = PrivacyParams::default();
    let alice = key_set(b"alice");
    let recv = OtaReceiver::from_address(&params, &alice.payment_address, &mut rng(14))
        .expect("receiver");
    assert!(recv.is_valid());

    let s = recv.to_string();
    let parsed: OtaReceiver = s.parse().expect("base58check");
    assert_eq!(parsed, recv);
    assert_eq!(recv.to_bytes().len(), 1 + 32 + 68);

    let mut coin = CoinV2::new_from_amount_and_tx_random(
        42,
        recv.public_key,
        recv.tx_random,
        vec![],
        &mut rng(15),
    )
    .expect("coin");
    assert!(coin.does_coin_belong_to_key_set(&alice).0);
    assert_eq!(coin.value(), 42);

    let mut tampered = s.into_bytes();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == b'1' { b'2' } else { b'1' };
    let tampered = String::from_utf8(tampered).expect("ascii");
    assert!(tampered.parse::<OtaReceiver>().is_err());
}

// ---------- Confidential assets ----------

#[test]
fn ca_asset_tag_validates_only_its_token() {
    let params = PrivacyParams::default();
    let alice = key_set(b"alice");
    let token = TokenId([7u8; 32]);
    let other = TokenId([8u8; 32]);
    let info = PaymentInfo::new(alice.payment_address, 500, vec![]);

    let (coin, shared_secret) =
        CoinV2::new_ca(&params, &CoinParams::new(info), &token, &mut rng(16)).expect("ca coin");
    assert!(coin.validate_asset_tag(&shared_secret, &token));
    assert!(!coin.validate_asset_tag(&shared_secret, &other));
    assert!(!coin.is_encrypted());
    assert_eq!(coin.value(), 500);

    let tag = coin.asset_tag().expect("tag");
    let expected = Scalar::from(500u64) * tag
        + coin.mask().expect("mask") * pedersen().randomness_base();
    assert_eq!(coin.commitment(), Some(&expected));
}

#[test]
fn ca_token_id_recovered_by_recipient() {
    let params = PrivacyParams::default();
    let alice = key_set(b"alice");
    let token = TokenId([9u8; 32]);
    let info = PaymentInfo::new(alice.payment_address, 500, vec![]);
    let (mut coin, _) =
        CoinV2::new_ca(&params, &CoinParams::new(info), &token, &mut rng(17)).expect("ca coin");
    coin.conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");

    // A fresh decode has no cached raw tag.
    let mut received = CoinV2::from_bytes(&coin.to_bytes()).expect("decode");
    assert!(received.raw_asset_tag().is_none());

    let map = raw_asset_tag_map([TokenId::PRV, token].iter());
    assert_eq!(received.token_id(&alice, &map).expect("token"), token);
    assert!(received.raw_asset_tag().is_some());

    let opened = received.decrypt(&alice).expect("decrypt");
    assert_eq!(opened.value(), 500);

    let unknown = raw_asset_tag_map([TokenId::PRV].iter());
    let mut again = CoinV2::from_bytes(&coin.to_bytes()).expect("decode");
    assert!(again.token_id(&alice, &unknown).is_err());

    let mut plain = v2_coin(&alice, 1, 18);
    assert_eq!(plain.token_id(&alice, &map).expect("native"), TokenId::PRV);
}

// ---------- Codecs ----------

#[test]
fn coin_v2_round_trip_in_every_state() {
    let alice = key_set(b"alice");
    let fresh = v2_coin(&alice, 123, 19);
    assert_eq!(CoinV2::from_bytes(&fresh.to_bytes()).expect("fresh"), fresh);

    let mut concealed = fresh.clone();
    concealed
        .conceal_output_coin(&alice.payment_address.public_view)
        .expect("conceal");
    assert_eq!(
        CoinV2::from_bytes(&concealed.to_bytes()).expect("concealed"),
        concealed
    );

    let mut input = concealed.decrypt(&alice).expect("decrypt");
    input.conceal_input_coin();
    assert_eq!(CoinV2::from_bytes(&input.to_bytes()).expect("input"), input);

    assert_eq!(
        Coin::from_bytes(&fresh.to_bytes()).expect("dispatch"),
        Coin::V2(fresh)
    );
}

#[test]
fn coin_v2_without_trailing_asset_tag_is_native() {
    let alice = key_set(b"alice");
    let coin = v2_coin(&alice, 1, 20);
    let mut legacy = coin.to_bytes();
    assert_eq!(legacy.pop(), Some(0));
    let decoded = CoinV2::from_bytes(&legacy).expect("legacy");
    assert_eq!(decoded, coin);
    assert!(decoded.asset_tag().is_none());
}

#[test]
fn coin_v2_rejects_bad_encodings() {
    let alice = key_set(b"alice");
    let bytes = v2_coin(&alice, 1, 21).to_bytes();

    let mut wrong_version = bytes.clone();
    wrong_version[0] = 3;
    assert!(CoinV2::from_bytes(&wrong_version).is_err());

    for cut in [1, 10, bytes.len() / 2, bytes.len() - 40] {
        assert!(CoinV2::from_bytes(&bytes[..cut]).is_err(), "truncated at {cut}");
    }
    assert!(CoinV2::from_bytes(&[]).is_err());
}

fn v1_coin(seed: u8, value: u64, info: Vec<u8>) -> (CoinV1, KeySet) {
    let mut r = rng(seed);
    let sk = PrivateKey::random(&mut r);
    let ks = KeySet::from_private_key(&sk);
    let mut details = PlainCoinV1::new(ks.payment_address.public_spend, value, random_scalar(&mut r), info);
    details.randomness = Some(random_scalar(&mut r));
    details.commit_all(&PrivacyParams::default()).expect("commit");
    (CoinV1::new(details), ks)
}

#[test]
fn coin_v1_encrypt_decrypt() {
    let params = PrivacyParams::default();
    let (mut coin, ks) = v1_coin(22, 4242, b"v1".to_vec());
    let original = coin.details.clone();

    coin.encrypt(&ks.payment_address.public_view, &mut rng(23))
        .expect("encrypt");
    coin.conceal_output();
    assert_eq!(CoinCommon::value(&coin), 0);
    assert!(coin.details.randomness.is_none());

    let decoded = CoinV1::from_bytes(&coin.to_bytes()).expect("decode");
    assert_eq!(decoded, coin);

    let opened = decoded.decrypt(&ks, &params).expect("decrypt");
    assert_eq!(opened.value, 4242);
    assert_eq!(opened.randomness, original.randomness);
    let sk = ks.private_key.as_ref().expect("sk");
    assert_eq!(
        opened.serial_number,
        Some(privacy_primitives::derive_serial_number(
            sk.as_scalar(),
            &original.snd.expect("snd")
        ))
    );
    assert!(opened.check_coin_valid(&params, &ks.payment_address, 4242));
}

#[test]
fn coin_v1_concealed_input_keeps_only_its_serial_number() {
    let params = PrivacyParams::default();
    let (coin, ks) = v1_coin(29, 77, b"spent".to_vec());
    let mut input = coin.decrypt(&ks, &params).expect("decrypt");
    let sn = input.serial_number;
    assert!(sn.is_some());

    input.conceal_input();
    assert_eq!(input.serial_number, sn);
    assert!(input.commitment.is_none());
    assert!(input.public_key.is_none());
    assert!(input.snd.is_none());
    assert!(input.randomness.is_none());
    assert_eq!(input.value, 0);
    assert!(input.info.is_empty());
    assert_eq!(PlainCoinV1::from_bytes(&input.to_bytes()).expect("decode"), input);
}

#[test]
fn coin_v1_tampered_commitment_is_detected() {
    let params = PrivacyParams::default();
    let (mut coin, ks) = v1_coin(24, 10, vec![]);
    coin.encrypt(&ks.payment_address.public_view, &mut rng(25))
        .expect("encrypt");
    coin.conceal_output();
    coin.details.commitment = Some(coin.details.commitment.expect("c") + G);
    assert!(matches!(
        coin.decrypt(&ks, &params),
        Err(PrivacyError::CommitmentMismatch(_))
    ));
}

#[test]
fn coin_v1_long_detail_uses_two_byte_length() {
    let (coin, _) = v1_coin(26, 1, vec![0xab; 255]);
    let bytes = coin.to_bytes();
    let detail_len = coin.details.to_bytes().len();
    assert!(detail_len > 255);
    // no encrypted detail, then a two-byte big-endian length
    assert_eq!(bytes[0], 0);
    assert_eq!(u16::from_be_bytes([bytes[1], bytes[2]]) as usize, detail_len);
    assert_eq!(CoinV1::from_bytes(&bytes).expect("decode"), coin);
    assert_eq!(Coin::from_bytes(&bytes).expect("dispatch"), Coin::V1(coin));
}

#[test]
fn coin_v1_short_detail_uses_one_byte_length() {
    let (coin, _) = v1_coin(27, 1, b"hi".to_vec());
    let bytes = coin.to_bytes();
    assert_eq!(bytes[1] as usize, coin.details.to_bytes().len());
    assert_eq!(CoinV1::from_bytes(&bytes).expect("decode"), coin);
}

#[test]
fn plain_coin_dispatch_and_type_names() {
    let (coin, _) = v1_coin(28, 5, vec![]);
    let plain = PlainCoin::from_bytes(&coin.details.to_bytes()).expect("decode");
    assert_eq!(plain.variant_name(), "PlainCoinV1");
    assert_eq!(plain.version(), COIN_VERSION_1);
    assert_eq!(plain.value(), 5);
    assert!(PlainCoin::from_bytes(&[]).is_err());
}

prop_compose! {
    fn arb_plain_v1()(
        seed in any::<[u8; 32]>(),
        value in any::<u64>(),
        info in proptest::collection::vec(any::<u8>(), 0..300),
        with_sn in any::<bool>(),
    ) -> PlainCoinV1 {
        let mut r = ChaCha20Rng::from_seed(seed);
        let sk = PrivateKey::random(&mut r);
        let snd = random_scalar(&mut r);
        let mut c = PlainCoinV1::new(sk.public_spend(), value, snd, info);
        c.randomness = Some(random_scalar(&mut r));
        c.commit_all(&PrivacyParams::default()).unwrap();
        if with_sn {
            c.serial_number = Some(privacy_primitives::derive_serial_number(sk.as_scalar(), &snd));
        }
        c
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn plain_coin_v1_round_trip(c in arb_plain_v1()) {
        prop_assert_eq!(PlainCoinV1::from_bytes(&c.to_bytes()).unwrap(), c.clone());
        let wrapped = CoinV1::new(c);
        prop_assert_eq!(CoinV1::from_bytes(&wrapped.to_bytes()).unwrap(), wrapped);
    }

    #[test]
    fn tx_random_round_trip(a in any::<u64>(), b in any::<u64>(), index in any::<u32>()) {
        let p = Scalar::from(a) * G;
        let q = Scalar::from(b) * G;
        let tx = TxRandom::new(&p, index, &q);
        let back = TxRandom::from_bytes(tx.as_bytes()).unwrap();
        prop_assert_eq!(back.index(), index);
        prop_assert_eq!(back.ota_random_point().unwrap(), p);
        prop_assert_eq!(back.conceal_random_point().unwrap(), q);
    }
}
