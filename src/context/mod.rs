//! Symbol contexts: the probability models queried by the codec.

mod array;
mod switching;

pub use array::ArrayContext;
pub use switching::SwitchingContext;

/// A cumulative-frequency model over an alphabet of non-negative integers.
///
/// A [`SymbolContext`] is queried by the [`Encoder`](crate::Encoder) and
/// [`Decoder`](crate::Decoder) once per symbol; the more closely its
/// frequencies track the real distribution of the stream, the fewer bits the
/// coded output takes. The codec reads the three queries fresh on every
/// symbol, so the owner is free to mutate the context, or swap in a different
/// one, between any two symbol operations.
///
/// # Contract
///
/// The three queries must stay mutually consistent for every state the codec
/// observes:
///
/// - `total()` equals the sum of `symbol_freq(s)` over the whole alphabet,
///   and never exceeds [`MAX_TOTAL`](crate::MAX_TOTAL);
/// - `symbol_pos(s)` is monotonic non-decreasing in `s`, returns `0` at or
///   below the least symbol and `total()` above the greatest;
/// - `symbol_pos(s + 1) - symbol_pos(s) == symbol_freq(s)` for every `s`.
///
/// The decoder's symbol search relies on all three; the encoder reports a
/// detected violation as [`Error::InconsistentContext`](crate::Error).
/// Repeated queries on an unchanged context must return identical values.
pub trait SymbolContext {
    /// Sum of all symbol frequencies.
    fn total(&self) -> u64;

    /// Frequency of `symbol`; `0` for symbols outside the alphabet.
    fn symbol_freq(&self, symbol: i64) -> u64;

    /// Sum of the frequencies of all symbols strictly less than `symbol`.
    ///
    /// Takes `&mut self` so implementations may maintain internal caches;
    /// the returned value must behave as a pure function of the context's
    /// logical state.
    fn symbol_pos(&mut self, symbol: i64) -> u64;
}

impl<C: SymbolContext + ?Sized> SymbolContext for &mut C {
    fn total(&self) -> u64 {
        (**self).total()
    }

    fn symbol_freq(&self, symbol: i64) -> u64 {
        (**self).symbol_freq(symbol)
    }

    fn symbol_pos(&mut self, symbol: i64) -> u64 {
        (**self).symbol_pos(symbol)
    }
}
