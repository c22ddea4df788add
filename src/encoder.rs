//! The [`Encoder`] half of the codec.

use std::io;
use std::marker::PhantomData;

use bitstream_io::BitWrite;

use crate::{
    Error, Stage, SymbolContext, MAX_TOTAL, SYNC_PADDING, TOP_BIT, UNDERFLOW_BIT, WORKING_BITS,
};

/// An arithmetic encoder.
///
/// Narrows a 32-bit working interval once per symbol, according to the
/// cumulative distribution reported by the current [`SymbolContext`], and
/// emits each top bit of the interval as soon as it is decided. Bits whose
/// identity is still pending (the interval straddling the midpoint) are
/// counted and emitted in a burst once the next top bit settles.
///
/// The encoder owns its context; use [`Encoder::context_mut`] to adapt it in
/// place between symbols or [`Encoder::set_context`] to swap in another
/// instance at a symbol boundary. Bits go to a caller-supplied
/// [`BitWrite`], passed to each call; wrap the byte sink with
/// `BitWriter::endian(sink, BigEndian)` so bytes fill most significant bit
/// first.
#[derive(Debug)]
pub struct Encoder<C, W>
where
    C: SymbolContext,
    W: BitWrite,
{
    context: C,
    low: u32,
    high: u32,
    underflow: u64,
    stage: Stage,
    _marker: PhantomData<W>,
}

impl<C, W> Encoder<C, W>
where
    C: SymbolContext,
    W: BitWrite,
{
    /// Construct a new [`Encoder`] reading probabilities from `context`.
    #[must_use]
    pub fn new(context: C) -> Self {
        Self {
            context,
            low: 0,
            high: u32::MAX,
            underflow: 0,
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
    /// Fails with [`Error::AlreadyFinalized`] after [`Encoder::finalize`].
    pub fn set_context(&mut self, context: C) -> Result<C, Error> {
        if self.stage == Stage::Finalized {
            return Err(Error::AlreadyFinalized);
        }
        Ok(std::mem::replace(&mut self.context, context))
    }

    /// Consume the encoder, returning its context.
    #[must_use]
    pub fn into_context(self) -> C {
        self.context
    }

    /// Encode `symbol` under the current context, emitting any bits decided
    /// by the narrowed interval to `output`.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroFrequencySymbol`] if the context gives `symbol` no
    /// probability mass, [`Error::InconsistentContext`] if the context's
    /// queries contradict each other, [`Error::AlreadyFinalized`] after
    /// [`Encoder::finalize`], and [`Error::SinkIo`] if `output` fails.
    pub fn write_symbol(&mut self, symbol: i64, output: &mut W) -> Result<(), Error> {
        if self.stage == Stage::Finalized {
            return Err(Error::AlreadyFinalized);
        }

        let total = self.context.total();
        let pos = self.context.symbol_pos(symbol);
        let freq = self.context.symbol_freq(symbol);
        if freq == 0 {
            return Err(Error::ZeroFrequencySymbol(symbol));
        }
        let end = pos
            .checked_add(freq)
            .filter(|&end| end <= total && total <= MAX_TOTAL)
            .ok_or(Error::InconsistentContext { pos, freq, total })?;

        let low = u64::from(self.low);
        let range = u64::from(self.high) - low + 1;
        self.high = (low + range * end / total - 1) as u32;
        self.low = (low + range * pos / total) as u32;

        while (self.low ^ self.high) & TOP_BIT == 0 {
            self.emit((self.low & TOP_BIT) != 0, output)
                .map_err(Error::SinkIo)?;
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
        }

        while (self.low & UNDERFLOW_BIT) != 0 && (self.high & UNDERFLOW_BIT) == 0 {
            self.underflow += 1;
            self.low = (self.low << 1) & WORKING_BITS;
            self.high = ((self.high & WORKING_BITS) << 1) | TOP_BIT | 1;
        }
        debug_assert!(self.low <= self.high);

        self.stage = Stage::Active;
        Ok(())
    }

    /// Write one decided bit, then flush the pending underflow bits as its
    /// complement.
    fn emit(&mut self, bit: bool, output: &mut W) -> io::Result<()> {
        output.write_bit(bit)?;
        for _ in 0..self.underflow {
            output.write_bit(!bit)?;
        }
        self.underflow = 0;
        Ok(())
    }

    /// Terminate the stream: emit the bits that pin the final interval, pad
    /// the last byte, and append the synchronization trailer.
    ///
    /// An encoder that never encoded a symbol writes nothing at all. After
    /// this call the encoder is finished; further symbol writes and context
    /// swaps fail.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyFinalized`] on a second call, [`Error::SinkIo`] if
    /// `output` fails.
    pub fn finalize(&mut self, output: &mut W) -> Result<(), Error> {
        match self.stage {
            Stage::Finalized => return Err(Error::AlreadyFinalized),
            Stage::Fresh => {
                self.stage = Stage::Finalized;
                return Ok(());
            }
            Stage::Active => {}
        }

        // Of the final interval only one more bit matters: whether `low`
        // sits above or below the quarter mark. The extra pending bit keeps
        // the decoder's window inside the interval while it drains.
        let bit = (self.low & UNDERFLOW_BIT) != 0;
        self.underflow += 1;
        self.emit(bit, output).map_err(Error::SinkIo)?;

        output.byte_align().map_err(Error::SinkIo)?;
        output.write_bytes(&SYNC_PADDING).map_err(Error::SinkIo)?;
        self.stage = Stage::Finalized;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitstream_io::{BigEndian, BitWriter};

    use super::*;
    use crate::ArrayContext;

    fn writer() -> BitWriter<Vec<u8>, BigEndian> {
        BitWriter::endian(Vec::new(), BigEndian)
    }

    #[test]
    fn fresh_finalize_writes_nothing() {
        let mut output = writer();
        let mut encoder = Encoder::new(ArrayContext::new(4).unwrap());
        encoder.finalize(&mut output).unwrap();
        assert!(output.into_writer().is_empty());
    }

    #[test]
    fn finalized_is_terminal() {
        let mut output = writer();
        let mut encoder = Encoder::new(ArrayContext::new(4).unwrap());
        encoder.write_symbol(2, &mut output).unwrap();
        encoder.finalize(&mut output).unwrap();

        assert!(matches!(
            encoder.write_symbol(0, &mut output),
            Err(Error::AlreadyFinalized)
        ));
        assert!(matches!(
            encoder.set_context(ArrayContext::new(4).unwrap()),
            Err(Error::AlreadyFinalized)
        ));
        assert!(matches!(
            encoder.finalize(&mut output),
            Err(Error::AlreadyFinalized)
        ));
    }

    #[test]
    fn zero_frequency_is_rejected_before_any_output() {
        let mut output = writer();
        let mut encoder =
            Encoder::new(ArrayContext::from_frequencies(vec![0, 1, 1]).unwrap());
        assert!(matches!(
            encoder.write_symbol(0, &mut output),
            Err(Error::ZeroFrequencySymbol(0))
        ));
        assert!(output.into_writer().is_empty());
    }

    #[test]
    fn context_swap_returns_the_previous_context() {
        let mut encoder: Encoder<_, BitWriter<Vec<u8>, BigEndian>> =
            Encoder::new(ArrayContext::from_frequencies(vec![7]).unwrap());
        let old = encoder
            .set_context(ArrayContext::new(2).unwrap())
            .unwrap();
        assert_eq!(old.frequencies(), &[7]);
        assert_eq!(encoder.context().len(), 2);
    }
}
