use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use privacy_coin::{CoinParams, CoinV2, TokenId};
use privacy_primitives::{
    params::COMMITMENT_RING_SIZE, pedersen, random_point, random_scalar, KeySet, PaymentInfo,
    PrivacyParams, PrivateKey,
};
use privacy_proof::{InMemoryCommitments, PaymentProof, PaymentWitnessParamV2, VerifyContext};
use privacy_zkp::{AggregatedRangeWitness, OneOutOfManyWitness, RANGE_PROOF_VERSION_2};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::hint::black_box;

fn bench_range_proof_verify(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([1; 32]);
    let mut g = c.benchmark_group("verify_range_proof");
    g.throughput(Throughput::Elements(1));

    for outputs in [1usize, 2, 8] {
        let values = (0..outputs as u64).map(|v| v * 1_000 + 7).collect();
        let rands = (0..outputs).map(|_| random_scalar(&mut rng)).collect();
        let proof = AggregatedRangeWitness::new(values, rands)
            .and_then(|w| w.prove(RANGE_PROOF_VERSION_2, &mut rng))
            .expect("range prove");

        g.bench_function(BenchmarkId::new("folding", outputs), |b| {
            b.iter(|| black_box(proof.verify()).expect("range verify"));
        });
        g.bench_function(BenchmarkId::new("faster", outputs), |b| {
            b.iter(|| black_box(proof.verify_faster()).expect("range verify faster"));
        });
    }

    g.finish();
}

fn bench_one_out_of_many_verify(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([2; 32]);
    let r = random_scalar(&mut rng);
    let mut ring: Vec<_> = (0..COMMITMENT_RING_SIZE).map(|_| random_point(&mut rng)).collect();
    ring[3] = r * pedersen().randomness_base();
    let proof = OneOutOfManyWitness::new(r, 3)
        .prove(&ring, &mut rng)
        .expect("one-out-of-many prove");

    let mut g = c.benchmark_group("verify_one_out_of_many");
    g.throughput(Throughput::Elements(1));
    g.bench_function(BenchmarkId::from_parameter("ring8"), |b| {
        b.iter(|| black_box(proof.verify(&ring)).expect("one-out-of-many verify"));
    });
    g.finish();
}

fn bench_proof_v2_verify(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::from_seed([3; 32]);
    let params = PrivacyParams::default();
    let sk = PrivateKey::from_seed(b"bench-sender");
    let sender = KeySet::from_private_key(&sk);
    let receiver = KeySet::from_private_key(&PrivateKey::from_seed(b"bench-receiver"));

    let mut input = CoinV2::new_from_payment_info(
        &params,
        &CoinParams::new(PaymentInfo::new(sender.payment_address, 1_000, Vec::new())),
        &mut rng,
    )
    .expect("input coin");
    input
        .conceal_output_coin(&sender.payment_address.public_view)
        .expect("conceal");
    let input = input.decrypt(&sender).expect("decrypt");

    let witness = PaymentWitnessParamV2 {
        private_key: sk,
        input_coins: vec![input],
        payment_infos: vec![
            PaymentInfo::new(receiver.payment_address, 900, Vec::new()),
            PaymentInfo::new(sender.payment_address, 90, Vec::new()),
        ],
        fee: 10,
        token_id: TokenId::PRV,
        has_confidential_asset: false,
        sender_shard: None,
    };
    let proof = witness.prove(&params, &mut rng).expect("proof v2");
    let ctx = VerifyContext::new(params, 10, 0);
    let ledger = InMemoryCommitments::new();

    let mut g = c.benchmark_group("verify_proof_v2");
    g.throughput(Throughput::Elements(1));
    g.bench_function(BenchmarkId::from_parameter("1in_2out"), |b| {
        b.iter(|| black_box(proof.verify(&ctx, &ledger)).expect("proof v2 verify"));
    });
    g.finish();
}

criterion_group!(
    benches,
    bench_range_proof_verify,
    bench_one_out_of_many_verify,
    bench_proof_v2_verify
);
criterion_main!(benches);
