//! The [`Decoder`] half of the codec.

use std::io;
use std::marker::PhantomData;

use bitstream_io::BitRead;

use crate::{
    Error, Stage, SymbolContext, MAX_TOTAL, SYNC_PADDING_FILL, SYNC_PADDING_WORD, TOP_BIT,
    UNDERFLOW_BIT, WORKING_BITS,
};

/// An arithmetic decoder.
///
/// Mirrors the encoder's interval arithmetic bit for bit: a 32-bit code
/// window tracks the stream's position inside the current interval, the
/// target cumulative position is computed from it, and the context's
/// distribution locates the symbol that owns that position. The caller must
/// present the same sequence of context states the encoder saw, one state
/// per symbol.
///
/// Bits come from a caller-supplied [`BitRead`]; wrap the byte source with
/// `BitReader::endian(source, BigEndian)`. After [`Decoder::finalize`] the
/// source is positioned exactly past the bytes the encoder wrote, so
/// surrounding non-codec data can be multiplexed in the same stream.
#[derive(Debug)]
pub struct Decoder<C, R>
where
    C: SymbolContext,
    R: BitRead,
{
    context: C,
    low: u32,
    high: u32,
    code: u32,
    stage: Stage,
    _marker: PhantomData<R>,
}

impl<C, R> Decoder<C, R>
where
    C: SymbolContext,
    R: BitRead,
{
    /// Construct a new [`Decoder`] reading probabilities from `context`.
    #[must_use]
    pub fn new(context: C) -> Self {
        Self {
            context,
            low: 0,
            high: u32::MAX,
            code: 0,
            stage: Stage::Fresh,
            _marker: PhantomData,
        }
    }

    /// The current context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the current context, for in-place adaptation
    /// between symbols.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Swap in a different context, returning the previous one. Takes effect
    /// for the next symbol.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyFinalized`] after [`Decoder::finalize`].
    pub fn set_context(&mut self, context: C) -> Result<C, Error> {
        if self.stage == Stage::Finalized {
            return Err(Error::AlreadyFinalized);
        }
        Ok(std::mem::replace(&mut self.context, context))
    }

    /// Consume the decoder, returning its context.
    #[must_use]
    pub fn into_context(self) -> C {
        self.context
    }

    /// Decode the next symbol from `input` under the current context.
    ///
    /// # Errors
    ///
    /// [`Error::InconsistentContext`] if the context reports an unusable
    /// total, [`Error::AlreadyFinalized`] after [`Decoder::finalize`], and
    /// [`Error::SourceIo`] if `input` fails (including a truncated stream).
    pub fn read_symbol(&mut self, input: &mut R) -> Result<i64, Error> {
        match self.stage {
            Stage::Finalized => return Err(Error::AlreadyFinalized),
            Stage::Fresh => {
                let mut window = [0; 4];
                input.read_bytes(&mut window).map_err(Error::SourceIo)?;
                self.code = u32::from_be_bytes(window);
                self.stage = Stage::Active;
            }
            Stage::Active => self.renormalize(input)?,
        }

        let total = self.context.total();
        if total == 0 || total > MAX_TOTAL {
            return Err(Error::InconsistentContext {
                pos: 0,
                freq: 0,
                total,
            });
        }

        let low = u64::from(self.low);
        let range = u64::from(self.high) - low + 1;
        // A corrupt stream can leave the window outside [low, high]; the
        // wrapping difference and the clamp keep the search bounded.
        let offset = u64::from(self.code.wrapping_sub(self.low)) + 1;
        let wide = (u128::from(offset) * u128::from(total) - 1) / u128::from(range);
        let target = (wide as u64).min(total - 1);

        let symbol = self.locate(target);
        let pos = self.context.symbol_pos(symbol);
        let freq = self.context.symbol_freq(symbol);

        self.high = (low + range * (pos + freq) / total - 1) as u32;
        self.low = (low + range * pos / total) as u32;
        Ok(symbol)
    }

    /// Find the symbol whose cumulative interval contains `target`:
    /// `symbol_pos(symbol) <= target < symbol_pos(symbol + 1)`.
    ///
    /// Gallops forward doubling the step, then refines by halving. The
    /// galloping phase probes strictly increasing positions, which is the
    /// access pattern [`ArrayContext`](crate::ArrayContext) extends its
    /// cumulative cache for in amortized constant time.
    fn locate(&mut self, target: u64) -> i64 {
        let mut symbol: i64 = 0;
        let mut step: i64 = 1;
        while target >= self.context.symbol_pos(symbol + step) {
            symbol += step;
            step <<= 1;
        }
        while step > 1 {
            step >>= 1;
            if target >= self.context.symbol_pos(symbol + step) {
                symbol += step;
            }
        }
        symbol
    }

    /// Mirror the encoder's renormalization, pulling one fresh bit into the
    /// window per shift.
    fn renormalize(&mut self, input: &mut R) -> Result<(), Error> {
        while (self.low ^ self.high) & TOP_BIT == 0 {
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            self.code = (self.code << 1) | next_bit(input)?;
        }

        while (self.low & UNDERFLOW_BIT) != 0 && (self.high & UNDERFLOW_BIT) == 0 {
            self.low = (self.low << 1) & WORKING_BITS;
            self.high = ((self.high & WORKING_BITS) << 1) | TOP_BIT | 1;
            self.code = (((self.code & WORKING_BITS) ^ UNDERFLOW_BIT) << 1) | next_bit(input)?;
        }

        Ok(())
    }

    /// Consume the synchronization trailer, leaving the source positioned
    /// exactly after the last byte the encoder wrote.
    ///
    /// A decoder that never decoded a symbol reads nothing. After this call
    /// the decoder is finished; further symbol reads and context swaps fail.
    ///
    /// # Errors
    ///
    /// [`Error::StreamEndedImproperly`] if the trailer is missing,
    /// [`Error::AlreadyFinalized`] on a second call, [`Error::SourceIo`] if
    /// `input` fails.
    pub fn finalize(&mut self, input: &mut R) -> Result<(), Error> {
        match self.stage {
            Stage::Finalized => return Err(Error::AlreadyFinalized),
            Stage::Fresh => {
                self.stage = Stage::Finalized;
                return Ok(());
            }
            Stage::Active => {}
        }

        while !input.byte_aligned() {
            self.code = (self.code << 1) | next_bit(input)?;
        }

        // If the window holds the whole trailer, the source is already in
        // position. Otherwise the trailer's tail is still in the source:
        // skip filler until its final byte.
        if self.code != SYNC_PADDING_WORD {
            let mut terminated = false;
            for _ in 0..5 {
                let mut byte = [0; 1];
                match input.read_bytes(&mut byte) {
                    Ok(()) => {}
                    Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                        return Err(Error::StreamEndedImproperly);
                    }
                    Err(error) => return Err(Error::SourceIo(error)),
                }
                if byte[0] != SYNC_PADDING_FILL {
                    terminated = true;
                    break;
                }
            }
            if !terminated {
                return Err(Error::StreamEndedImproperly);
            }
        }

        self.stage = Stage::Finalized;
        Ok(())
    }
}

fn next_bit<R: BitRead>(input: &mut R) -> Result<u32, Error> {
    input.read_bit().map(u32::from).map_err(Error::SourceIo)
}
