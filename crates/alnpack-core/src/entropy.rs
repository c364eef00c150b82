// crates/alnpack-core/src/entropy.rs

//! Context-modelled range coding of the RLE-0 column stream.
//!
//! Every byte is split into a 4-way prefix class (the two zero-run code
//! bytes, the literal 1, everything else), and non-trivial literals carry
//! a log₂ selector plus low suffix bits. Each of the three symbol kinds is
//! coded under a bank of adaptive models indexed by a rolling hash of the
//! recent history; bank sizes scale with the input via the context-length
//! class. Contexts reset at every column boundary, so the decoder — driven
//! only by the pre-entropy byte count and the alignment height — can
//! re-synchronise column by column.

use crate::queue::OrderedQueue;
use crate::rle::{RUN_BIT_0, RUN_BIT_1};
use crate::types::Column;
use alnpack_rc::{AdaptiveModel, RangeDecoder, RangeEncoder};
use anyhow::{bail, ensure, Result};

/// Prefix/selector/suffix bank sizes per context-length class, widest last.
const PREFIX_CONTEXTS: [usize; 5] = [25, 125, 625, 3125, 3125]; // 5^k
const SELECTOR_CONTEXTS: [usize; 5] = [8, 64, 64, 64, 512]; // 8^k
const SUFFIX_CONTEXTS: [usize; 5] = [8, 8, 64, 64, 64]; // 8^k

const PREFIX_SYMBOLS: usize = 4;
/// Selectors cover literals 2..=127: ⌊log₂⌋+1 in 2..=7, stored −2.
const SELECTOR_SYMBOLS: usize = 6;

const SMALL_RESCALE: u32 = 1 << 8;
const SUFFIX_RESCALE: u32 = 1 << 10;

/// Context-length class, chosen from the raw alignment size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextClass {
    /// `< 10⁴` bytes.
    Tiny,
    /// `< 2·10⁵` bytes.
    Small,
    /// `< 5·10⁶` bytes.
    Medium,
    /// `< 2·10⁷` bytes.
    Large,
    /// Everything above.
    Huge,
}

impl ContextClass {
    /// Classify an alignment of `n_bytes = rows × columns`.
    ///
    /// The thresholds are empirical; changing them invalidates nothing but
    /// re-tunes compression, so they live in exactly one place.
    #[must_use]
    pub fn classify(n_bytes: usize) -> Self {
        if n_bytes < 10_000 {
            Self::Tiny
        } else if n_bytes < 200_000 {
            Self::Small
        } else if n_bytes < 5_000_000 {
            Self::Medium
        } else if n_bytes < 20_000_000 {
            Self::Large
        } else {
            Self::Huge
        }
    }

    /// Stable index for the blob header (3 bits).
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::Tiny => 0,
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
            Self::Huge => 4,
        }
    }

    /// Inverse of [`Self::index`].
    pub fn from_index(i: u8) -> Result<Self> {
        Ok(match i {
            0 => Self::Tiny,
            1 => Self::Small,
            2 => Self::Medium,
            3 => Self::Large,
            4 => Self::Huge,
            _ => bail!("context class index {i} out of range"),
        })
    }
}

/// The three model banks of one coding pass.
struct Models {
    prefix: Vec<AdaptiveModel>,
    selector: Vec<AdaptiveModel>,
    suffix: Vec<AdaptiveModel>,
}

impl Models {
    fn new(class: ContextClass) -> Self {
        let k = class.index() as usize;
        let prefix = (0..PREFIX_CONTEXTS[k])
            .map(|_| AdaptiveModel::new(PREFIX_SYMBOLS, SMALL_RESCALE))
            .collect();
        let selector = (0..SELECTOR_CONTEXTS[k])
            .map(|_| AdaptiveModel::new(SELECTOR_SYMBOLS, SMALL_RESCALE))
            .collect();
        // Suffix model i holds 2^(i mod 8 + 1) symbols; the selector
        // context's low 3 bits are the selector itself, so lookups always
        // land on a model exactly covering [0, 2^(selector−1)).
        let suffix = (0..SUFFIX_CONTEXTS[k])
            .map(|i| AdaptiveModel::new(1 << (i % 8 + 1), SUFFIX_RESCALE))
            .collect();
        Self {
            prefix,
            selector,
            suffix,
        }
    }
}

#[inline]
fn bit_len(x: u8) -> usize {
    (8 - x.leading_zeros()) as usize
}

#[inline]
fn prefix_class(x: u8) -> usize {
    match x {
        RUN_BIT_0 => 0,
        RUN_BIT_1 => 1,
        1 => 2,
        _ => 3,
    }
}

/// Encode the RLE column stream into one range-coded payload.
///
/// Returns the payload and the pre-entropy byte count `P` the decoder
/// needs to terminate.
pub fn encode(input: &OrderedQueue<Column>, class: ContextClass) -> Result<(Vec<u8>, u64)> {
    let mut models = Models::new(class);
    let n_prefix = models.prefix.len();
    let n_selector = models.selector.len();
    let n_suffix = models.suffix.len();

    let mut enc = RangeEncoder::new();
    let mut pre_entropy = 0u64;

    while let Some((_, col)) = input.pop() {
        let mut ctx_prefix = n_prefix - 1;
        let mut ctx_sel = n_selector - 1;

        for &x in &col {
            let prefix = prefix_class(x);
            enc.encode(&mut models.prefix[ctx_prefix], prefix);
            ctx_prefix = (ctx_prefix * 5 + prefix) % n_prefix;
            if prefix < 3 {
                continue;
            }

            ensure!(x >= 2, "rle stream byte {x} cannot carry a selector");
            let selector = bit_len(x);
            let suffix = x as usize - (1 << (selector - 1));

            enc.encode(&mut models.selector[ctx_sel], selector - 2);
            ctx_sel = ((ctx_sel << 3) + (selector - 2)) % n_selector;
            enc.encode(&mut models.suffix[ctx_sel % n_suffix], suffix);
        }

        pre_entropy += col.len() as u64;
    }

    Ok((enc.finish(), pre_entropy))
}

/// Decode `pre_entropy` RLE bytes from `payload`, regrouping them into
/// columns of `n_rows` alignment symbols pushed to `output` with
/// priorities `0, 1, …`.
pub fn decode(
    payload: &[u8],
    class: ContextClass,
    n_rows: usize,
    pre_entropy: u64,
    output: &OrderedQueue<Column>,
) -> Result<()> {
    let res = decode_inner(payload, class, n_rows, pre_entropy, output);
    output.mark_completed();
    res
}

fn decode_inner(
    payload: &[u8],
    class: ContextClass,
    n_rows: usize,
    pre_entropy: u64,
    output: &OrderedQueue<Column>,
) -> Result<()> {
    if pre_entropy == 0 {
        return Ok(());
    }
    ensure!(n_rows > 0, "non-empty payload for a zero-height alignment");

    let mut models = Models::new(class);
    let n_prefix = models.prefix.len();
    let n_selector = models.selector.len();
    let n_suffix = models.suffix.len();

    let mut dec = RangeDecoder::new(payload);
    let mut ctx_prefix = n_prefix - 1;
    let mut ctx_sel = n_selector - 1;

    let mut priority = 0u64;
    let mut dest: Column = Vec::new();
    let mut decoded = 0u64;

    // Alignment symbols accounted for in the current column; zero runs
    // count in full, so this is what detects the column boundary.
    let mut col_symbols = 0u64;
    let mut run_code = 0u64;
    let mut run_bits = 0u32;

    while decoded < pre_entropy {
        if col_symbols == n_rows as u64 {
            ctx_prefix = n_prefix - 1;
            ctx_sel = n_selector - 1;
            output.push(priority, std::mem::take(&mut dest));
            priority += 1;
            col_symbols = 0;
        }

        let prefix = dec.decode(&mut models.prefix[ctx_prefix]);
        ctx_prefix = (ctx_prefix * 5 + prefix) % n_prefix;

        // A non-run symbol terminates any pending zero-run code.
        if prefix > 1 && run_bits > 0 {
            let run_len = run_code + (1u64 << run_bits) - 1;
            col_symbols += run_len;
            ensure!(
                col_symbols < n_rows as u64,
                "zero run of {run_len} overflows a column of {n_rows}"
            );
            run_code = 0;
            run_bits = 0;
        }

        let x: u8;
        if prefix == 2 {
            x = 1;
            col_symbols += 1;
        } else if prefix < 2 {
            x = if prefix == 1 { RUN_BIT_1 } else { RUN_BIT_0 };
            run_code += (prefix as u64) << run_bits;
            run_bits += 1;

            let run_len = run_code + (1u64 << run_bits) - 1;
            match (col_symbols + run_len).cmp(&(n_rows as u64)) {
                std::cmp::Ordering::Equal => {
                    // The run closes the column exactly; flush it.
                    col_symbols = n_rows as u64;
                    run_code = 0;
                    run_bits = 0;
                }
                std::cmp::Ordering::Greater => {
                    bail!("zero run of {run_len} overflows a column of {n_rows}")
                }
                std::cmp::Ordering::Less => {}
            }
        } else {
            let selector = dec.decode(&mut models.selector[ctx_sel]) + 2;
            ctx_sel = ((ctx_sel << 3) + (selector - 2)) % n_selector;
            let suffix = dec.decode(&mut models.suffix[ctx_sel % n_suffix]);
            x = (suffix + (1 << (selector - 1))) as u8;
            col_symbols += 1;
        }

        dest.push(x);
        decoded += 1;
    }

    ensure!(
        col_symbols == n_rows as u64 && run_bits == 0,
        "payload ended mid-column ({col_symbols} of {n_rows} symbols)"
    );
    output.push(priority, dest);
    Ok(())
}
