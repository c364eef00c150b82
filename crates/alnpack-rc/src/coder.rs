// crates/alnpack-rc/src/coder.rs

//! Carry-less binary range coder, 32-bit state, byte output.
//!
//! Renormalisation emits the top byte whenever it is settled, and when the
//! range underflows below 2^16 it is clamped to the distance to the next
//! 2^16 boundary, which keeps the coder carry-free at the cost of a
//! fraction of a bit. Encoder and decoder must perform identical state
//! updates symbol for symbol; the decoder is allowed to read (zero) bytes
//! past the end of its input because the encoder's four flush bytes only
//! pad the final interval.

use crate::model::AdaptiveModel;

const TOP: u32 = 1 << 24;
const BOT: u32 = 1 << 16;

/// Range encoder writing to an owned byte vector.
#[derive(Debug)]
pub struct RangeEncoder {
    low: u32,
    range: u32,
    out: Vec<u8>,
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeEncoder {
    /// Fresh encoder with an empty output buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            low: 0,
            range: u32::MAX,
            out: Vec::new(),
        }
    }

    /// Encode `symbol` under `model` and update the model.
    pub fn encode(&mut self, model: &mut AdaptiveModel, symbol: usize) {
        let (cum, freq, total) = model.interval(symbol);
        self.range /= total;
        self.low = self.low.wrapping_add(cum * self.range);
        self.range *= freq;
        self.normalize();
        model.bump(symbol);
    }

    fn normalize(&mut self) {
        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) >= TOP {
                if self.range >= BOT {
                    break;
                }
                // Underflow: clamp the range up to the next 2^16 boundary.
                self.range = self.low.wrapping_neg() & (BOT - 1);
            }
            self.out.push((self.low >> 24) as u8);
            self.low <<= 8;
            self.range <<= 8;
        }
    }

    /// Flush the final interval and return the compressed bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..4 {
            self.out.push((self.low >> 24) as u8);
            self.low <<= 8;
        }
        self.out
    }
}

/// Range decoder reading from a borrowed byte slice.
#[derive(Debug)]
pub struct RangeDecoder<'a> {
    low: u32,
    range: u32,
    code: u32,
    input: &'a [u8],
    pos: usize,
}

impl<'a> RangeDecoder<'a> {
    /// Decoder primed with the first four code bytes of `input`.
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        let mut d = Self {
            low: 0,
            range: u32::MAX,
            code: 0,
            input,
            pos: 0,
        };
        for _ in 0..4 {
            d.code = (d.code << 8) | u32::from(d.next_byte());
        }
        d
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        let b = self.input.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    /// Decode the next symbol under `model` and update the model.
    pub fn decode(&mut self, model: &mut AdaptiveModel) -> usize {
        let total = model.total();
        self.range /= total;
        let target = (self.code.wrapping_sub(self.low) / self.range).min(total - 1);
        let symbol = model.symbol_for(target);
        let (cum, freq, _) = model.interval(symbol);
        self.low = self.low.wrapping_add(cum * self.range);
        self.range *= freq;
        self.normalize();
        model.bump(symbol);
        symbol
    }

    fn normalize(&mut self) {
        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) >= TOP {
                if self.range >= BOT {
                    break;
                }
                self.range = self.low.wrapping_neg() & (BOT - 1);
            }
            self.code = (self.code << 8) | u32::from(self.next_byte());
            self.low <<= 8;
            self.range <<= 8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(symbols: &[usize], n_symbols: usize, rescale: u32) {
        let mut enc = RangeEncoder::new();
        let mut m = AdaptiveModel::new(n_symbols, rescale);
        for &s in symbols {
            enc.encode(&mut m, s);
        }
        let bytes = enc.finish();

        let mut dec = RangeDecoder::new(&bytes);
        let mut m = AdaptiveModel::new(n_symbols, rescale);
        for &s in symbols {
            assert_eq!(dec.decode(&mut m), s);
        }
    }

    #[test]
    fn empty_stream() {
        let enc = RangeEncoder::new();
        assert_eq!(enc.finish().len(), 4);
    }

    #[test]
    fn single_symbol_stream() {
        roundtrip(&[0], 4, 256);
        roundtrip(&[3], 4, 256);
    }

    #[test]
    fn skewed_stream_roundtrips() {
        // Heavy zero bias, the shape RLE output takes after a gappy column.
        let mut symbols = vec![0usize; 4000];
        for i in (0..4000).step_by(17) {
            symbols[i] = 1 + (i % 3);
        }
        roundtrip(&symbols, 4, 256);
    }

    #[test]
    fn wide_alphabet_roundtrips() {
        let symbols: Vec<usize> = (0..2000).map(|i| (i * 37) % 64).collect();
        roundtrip(&symbols, 64, 1024);
    }

    #[test]
    fn interleaved_models_roundtrip() {
        // Two models sharing one coder, the way prefix/selector banks do.
        let mut enc = RangeEncoder::new();
        let mut a = AdaptiveModel::new(4, 256);
        let mut b = AdaptiveModel::new(6, 256);
        for i in 0..500 {
            enc.encode(&mut a, i % 4);
            enc.encode(&mut b, (i * 5) % 6);
        }
        let bytes = enc.finish();

        let mut dec = RangeDecoder::new(&bytes);
        let mut a = AdaptiveModel::new(4, 256);
        let mut b = AdaptiveModel::new(6, 256);
        for i in 0..500 {
            assert_eq!(dec.decode(&mut a), i % 4);
            assert_eq!(dec.decode(&mut b), (i * 5) % 6);
        }
    }
}
