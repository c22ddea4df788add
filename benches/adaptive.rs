use std::io::{Read, Write};

use arithmetic_codec::byte_stream::{ByteDecoder, ByteEncoder};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn round_trip(input: &[u8]) {
    let mut encoder = ByteEncoder::new(Vec::new());
    encoder.write_all(input).unwrap();
    let coded = encoder.finish().unwrap();

    let mut decoder = ByteDecoder::new(coded.as_slice());
    let mut decoded = Vec::with_capacity(input.len());
    decoder.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, input);
}

pub fn criterion_benchmark(c: &mut Criterion) {
    // skewed pseudo-text: a small alphabet with an uneven distribution
    let mut rng = StdRng::seed_from_u64(1);
    let input: Vec<u8> = (0..16_384)
        .map(|_| {
            let roll: u8 = rng.gen_range(0..10);
            if roll < 6 {
                b'e'
            } else {
                rng.gen_range(b'a'..=b'z')
            }
        })
        .collect();

    c.bench_function("byte stream round trip", |b| {
        b.iter(|| round_trip(black_box(&input)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
