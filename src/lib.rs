//! Arithmetic coding codec driven by swappable symbol contexts.
//!
//! The [`Encoder`] turns a stream of symbols into a compact stream of bits,
//! and the [`Decoder`] reverses the process exactly, given the same sequence
//! of probability models. The codec itself never adapts probabilities and
//! never marks where the symbol stream ends; both are the caller's job,
//! expressed through the [`SymbolContext`] supplied to each coder.
//!
//! # Example
//!
//! ```
//! use arithmetic_codec::{ArrayContext, Decoder, Encoder};
//! use bitstream_io::{BigEndian, BitReader, BitWriter};
//!
//! # fn main() -> Result<(), arithmetic_codec::Error> {
//! let context = ArrayContext::from_frequencies(vec![10, 30, 10])?;
//!
//! let mut writer = BitWriter::endian(Vec::new(), BigEndian);
//! let mut encoder = Encoder::new(context.clone());
//! for &symbol in &[1, 0, 1, 2, 1] {
//!     encoder.write_symbol(symbol, &mut writer)?;
//! }
//! encoder.finalize(&mut writer)?;
//!
//! let buffer = writer.into_writer();
//! let mut reader = BitReader::endian(buffer.as_slice(), BigEndian);
//! let mut decoder = Decoder::new(context);
//! let mut decoded = Vec::new();
//! for _ in 0..5 {
//!     decoded.push(decoder.read_symbol(&mut reader)?);
//! }
//! decoder.finalize(&mut reader)?;
//!
//! assert_eq!(decoded, [1, 0, 1, 2, 1]);
//! # Ok(())
//! # }
//! ```

#![deny(
    missing_docs,
    clippy::all,
    missing_debug_implementations,
    clippy::cargo
)]
#![warn(clippy::pedantic)]

pub mod byte_stream;
pub mod context;
pub mod decoder;
pub mod encoder;

pub use context::{ArrayContext, SwitchingContext, SymbolContext};
pub use decoder::Decoder;
pub use encoder::Encoder;

/// Largest frequency total a context may report.
///
/// Renormalization guarantees the working interval never shrinks below
/// 2³¹ + 1 values between symbols, so any total up to this bound maps every
/// positive-frequency symbol onto a non-empty subinterval. Beyond it the
/// encoder and decoder can silently desynchronize.
pub const MAX_TOTAL: u64 = 1 << 31;

/// Mask of the interval's most significant (decided) bit.
pub(crate) const TOP_BIT: u32 = 0x8000_0000;

/// Mask of the bit just below the top; set in `low` and clear in `high`
/// exactly when the interval straddles the midpoint undecided.
pub(crate) const UNDERFLOW_BIT: u32 = 0x4000_0000;

/// Everything but the top bit.
pub(crate) const WORKING_BITS: u32 = 0x7FFF_FFFF;

/// Trailer appended after the last data byte. The decoder reads four bytes
/// ahead of the symbols it returns; these bytes make its consumed byte count
/// equal the encoder's written byte count. They are not a delimiter.
pub(crate) const SYNC_PADDING: [u8; 4] = [0x51, 0x51, 0x51, 0x50];

/// The trailer as a 32-bit window, for the case where the decoder has already
/// pulled all four padding bytes into its code register.
pub(crate) const SYNC_PADDING_WORD: u32 = 0x5151_5150;

/// The filler byte of the trailer; everything up to the final `0x50`.
pub(crate) const SYNC_PADDING_FILL: u8 = 0x51;

/// Lifecycle of an encoder or decoder.
///
/// `Fresh` coders have performed no symbol I/O and finalize to nothing;
/// `Finalized` is terminal and further symbol operations are a signaled bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Fresh,
    Active,
    Finalized,
}

/// Errors reported by the codec and its contexts.
///
/// None of these are recoverable in place: a coder that has returned an error
/// is in an indeterminate state and must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Attempted to encode a symbol whose frequency is zero.
    #[error("symbol {0} has zero frequency and cannot be encoded")]
    ZeroFrequencySymbol(i64),

    /// The supplied context reported values that cannot describe a valid
    /// cumulative distribution (`pos + freq > total`, or a total outside
    /// `1..=MAX_TOTAL` observed while decoding).
    #[error("inconsistent context (pos {pos}, freq {freq}, total {total})")]
    InconsistentContext {
        /// Cumulative position reported for the offending symbol.
        pos: u64,
        /// Frequency reported for the offending symbol.
        freq: u64,
        /// Total frequency reported by the context.
        total: u64,
    },

    /// A mutation addressed a symbol outside the context's alphabet.
    #[error("symbol {symbol} is out of range for an alphabet of {len} symbols")]
    OutOfRange {
        /// The offending symbol.
        symbol: i64,
        /// Number of symbols in the alphabet.
        len: usize,
    },

    /// A mutation would push the frequency total past [`MAX_TOTAL`].
    #[error("total frequency would exceed the {MAX_TOTAL} ceiling")]
    Overflow,

    /// A frequency decrement would produce a negative frequency.
    #[error("frequency delta would make a frequency negative")]
    InvalidArgument,

    /// Symbol I/O or a context swap was attempted after `finalize`.
    #[error("coder was already finalized")]
    AlreadyFinalized,

    /// The synchronization trailer was not found where the stream ended.
    #[error("synchronization padding not found at end of stream")]
    StreamEndedImproperly,

    /// The underlying byte sink failed.
    #[error("failed to write to the byte sink")]
    SinkIo(#[source] std::io::Error),

    /// The underlying byte source failed.
    #[error("failed to read from the byte source")]
    SourceIo(#[source] std::io::Error),
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::SinkIo(inner) | Error::SourceIo(inner) => inner,
            other => Self::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
