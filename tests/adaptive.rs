//! Adaptive-model round trip with context switching and multiplexed framing.

use std::io::{Cursor, Read};

use arithmetic_codec::{ArrayContext, Decoder, Encoder};
use bitstream_io::{BigEndian, BitReader, BitWriter};
use rand::{rngs::StdRng, Rng, SeedableRng};

const ALPHABET: usize = 1000;
const EXCURSION: [i64; 6] = [0, 1, 0, 1, 0, 2];

fn primary() -> ArrayContext {
    ArrayContext::new(ALPHABET).unwrap()
}

fn secondary() -> ArrayContext {
    ArrayContext::from_frequencies(vec![3, 2, 1]).unwrap()
}

#[test]
fn adaptive_round_trip_with_framing() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let symbols: Vec<i64> = (0..100_000)
        .map(|_| rng.gen_range(0..ALPHABET as i64))
        .collect();

    // frame the coded region with markers the codec must not disturb
    let mut sink = Vec::new();
    sink.extend_from_slice(&12345i32.to_be_bytes());

    let mut writer = BitWriter::endian(sink, BigEndian);
    let mut encoder = Encoder::new(primary());
    for (i, &symbol) in symbols.iter().enumerate() {
        if i % 1000 == 0 {
            let saved = encoder.set_context(secondary()).unwrap();
            for &s in &EXCURSION {
                encoder.write_symbol(s, &mut writer).unwrap();
            }
            encoder.set_context(saved).unwrap();
        }
        encoder.write_symbol(symbol, &mut writer).unwrap();
        encoder
            .context_mut()
            .increment_symbol_frequency(symbol, 1)
            .unwrap();
    }
    encoder.finalize(&mut writer).unwrap();

    let mut buffer = writer.into_writer();
    let coded_end = buffer.len();
    buffer.extend_from_slice(&(-54321i32).to_be_bytes());

    // decode, mirroring the adaptation and the context switches
    let mut cursor = Cursor::new(buffer);
    let mut marker = [0u8; 4];
    cursor.read_exact(&mut marker).unwrap();
    assert_eq!(i32::from_be_bytes(marker), 12345);

    let mut reader = BitReader::endian(&mut cursor, BigEndian);
    let mut decoder = Decoder::new(primary());
    for (i, &expected) in symbols.iter().enumerate() {
        if i % 1000 == 0 {
            let saved = decoder.set_context(secondary()).unwrap();
            for &s in &EXCURSION {
                assert_eq!(decoder.read_symbol(&mut reader).unwrap(), s);
            }
            decoder.set_context(saved).unwrap();
        }
        assert_eq!(decoder.read_symbol(&mut reader).unwrap(), expected);
        decoder
            .context_mut()
            .increment_symbol_frequency(expected, 1)
            .unwrap();
    }
    decoder.finalize(&mut reader).unwrap();
    drop(reader);

    // the decoder stopped exactly where the encoder stopped
    assert_eq!(cursor.position(), coded_end as u64);
    cursor.read_exact(&mut marker).unwrap();
    assert_eq!(i32::from_be_bytes(marker), -54321);
}
