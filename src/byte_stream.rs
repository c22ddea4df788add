//! Adapters that code plain byte streams through the codec.
//!
//! The alphabet has 257 symbols: the 256 byte values plus a reserved
//! end-of-stream symbol, written once when the encoder is finished. Both
//! sides adapt an order-0 [`ArrayContext`] as bytes flow, so the pair stays
//! self-synchronizing without any out-of-band length.

use std::fmt;
use std::io::{Read, Write};

use bitstream_io::{BigEndian, BitReader, BitWriter};

use crate::{ArrayContext, Decoder, Encoder, Error, SymbolContext, MAX_TOTAL};

/// Symbols 0-255 are bytes; this one terminates the stream.
const END_OF_STREAM: i64 = 256;

const ALPHABET: usize = 257;

fn byte_context() -> ArrayContext {
    ArrayContext::new(ALPHABET).expect("a fresh 257-symbol context cannot overflow")
}

/// Bump the frequency of a just-seen symbol, unless the model is saturated.
fn adapt(context: &mut ArrayContext, symbol: i64) -> Result<(), Error> {
    if context.total() < MAX_TOTAL {
        context.increment_symbol_frequency(symbol, 1)?;
    }
    Ok(())
}

/// An [`io::Write`](Write) adapter that arithmetic-codes every byte written
/// to it.
///
/// Call [`ByteEncoder::finish`] to terminate the stream; dropping the
/// encoder without finishing loses the tail of the data.
pub struct ByteEncoder<W: Write> {
    writer: BitWriter<W, BigEndian>,
    encoder: Encoder<ArrayContext, BitWriter<W, BigEndian>>,
}

impl<W: Write> ByteEncoder<W> {
    /// Wrap `writer`, starting from a uniform byte distribution.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: BitWriter::endian(writer, BigEndian),
            encoder: Encoder::new(byte_context()),
        }
    }

    fn encode_symbol(&mut self, symbol: i64) -> Result<(), Error> {
        self.encoder.write_symbol(symbol, &mut self.writer)?;
        adapt(self.encoder.context_mut(), symbol)
    }

    /// Encode the end-of-stream symbol and the synchronization trailer,
    /// returning the underlying writer positioned right after them.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.encoder.write_symbol(END_OF_STREAM, &mut self.writer)?;
        self.encoder.finalize(&mut self.writer)?;
        Ok(self.writer.into_writer())
    }
}

impl<W: Write> fmt::Debug for ByteEncoder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteEncoder")
            .field("context", self.encoder.context())
            .finish_non_exhaustive()
    }
}

impl<W: Write> Write for ByteEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &byte in buf {
            self.encode_symbol(i64::from(byte))?;
        }
        Ok(buf.len())
    }

    /// No-op: coded bits leave the partial byte only at
    /// [`ByteEncoder::finish`].
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// An [`io::Read`](Read) adapter that decodes a stream produced by
/// [`ByteEncoder`].
///
/// Returns end-of-file once the end-of-stream symbol is decoded; at that
/// point the trailer has been consumed and [`ByteDecoder::into_inner`]
/// yields the source positioned on the first non-codec byte.
pub struct ByteDecoder<R: Read> {
    reader: BitReader<R, BigEndian>,
    decoder: Decoder<ArrayContext, BitReader<R, BigEndian>>,
    ended: bool,
}

impl<R: Read> ByteDecoder<R> {
    /// Wrap `reader`, starting from a uniform byte distribution.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BitReader::endian(reader, BigEndian),
            decoder: Decoder::new(byte_context()),
            ended: false,
        }
    }

    /// Unwrap the underlying reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.reader.into_reader()
    }
}

impl<R: Read> fmt::Debug for ByteDecoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteDecoder")
            .field("context", self.decoder.context())
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Read for ByteDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.ended {
            return Ok(0);
        }
        let mut filled = 0;
        while filled < buf.len() {
            let symbol = self.decoder.read_symbol(&mut self.reader)?;
            if symbol == END_OF_STREAM {
                // flag first, so a partial return cannot be re-entered
                self.ended = true;
                self.decoder.finalize(&mut self.reader)?;
                break;
            }
            buf[filled] = symbol as u8;
            filled += 1;
            adapt(self.decoder.context_mut(), symbol)?;
        }
        Ok(filled)
    }
}
