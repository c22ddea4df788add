#![allow(dead_code)]

use arithmetic_codec::{ArrayContext, Decoder, Encoder};
use bitstream_io::{BigEndian, BitReader, BitWriter};

pub fn round_trip(context: ArrayContext, input: &[i64]) {
    let buffer = encode(context.clone(), input);
    let output = decode(context, &buffer, input.len());

    assert_eq!(input, output.as_slice());
}

pub fn encode(context: ArrayContext, input: &[i64]) -> Vec<u8> {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut encoder = Encoder::new(context);

    for &symbol in input {
        encoder
            .write_symbol(symbol, &mut writer)
            .expect("failed to encode symbol");
    }
    encoder.finalize(&mut writer).expect("failed to finalize");

    writer.into_writer()
}

pub fn decode(context: ArrayContext, buffer: &[u8], count: usize) -> Vec<i64> {
    let mut reader = BitReader::endian(buffer, BigEndian);
    let mut decoder = Decoder::new(context);

    let output = (0..count)
        .map(|_| {
            decoder
                .read_symbol(&mut reader)
                .expect("failed to decode symbol")
        })
        .collect();
    decoder.finalize(&mut reader).expect("failed to finalize");
    output
}
