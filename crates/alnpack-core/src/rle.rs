// crates/alnpack-core/src/rle.rs

//! RLE-0: run-length coding of zero runs with a bijective base-2 code.
//!
//! A run of `n ≥ 1` zeros becomes the bits of `m = n + 1`, least
//! significant first and excluding the leading 1, mapped 0 → 125 and
//! 1 → 126 — so the code costs `⌊log₂(n+1)⌋` bytes and every sentinel
//! string decodes to exactly one run length. Non-zero bytes pass through.
//! Both directions append a 127 byte internally to flush trailing state
//! and strip it again; 125 and 126 must therefore never appear as
//! literals, which the rank stage output guarantees in practice.

use crate::queue::OrderedQueue;
use crate::types::Column;
use anyhow::Result;

/// Run-code byte for a 0 bit.
pub const RUN_BIT_0: u8 = 125;
/// Run-code byte for a 1 bit.
pub const RUN_BIT_1: u8 = 126;

const FLUSH: u8 = 127;

/// Encode one column of rank bytes.
#[must_use]
pub fn encode_column(src: &[u8]) -> Column {
    let mut dest = Vec::with_capacity(src.len());
    let mut run = 0u64;
    for &x in src.iter().chain(std::iter::once(&FLUSH)) {
        if x == 0 {
            run += 1;
        } else {
            if run > 0 {
                emit_run(&mut dest, run);
                run = 0;
            }
            dest.push(x);
        }
    }
    dest.pop(); // the flush byte
    dest
}

fn emit_run(dest: &mut Vec<u8>, n: u64) {
    let mut m = n + 1;
    while m != 1 {
        dest.push(if m & 1 == 1 { RUN_BIT_1 } else { RUN_BIT_0 });
        m >>= 1;
    }
}

/// Decode one column back to rank bytes.
#[must_use]
pub fn decode_column(src: &[u8]) -> Column {
    let mut dest = Vec::with_capacity(src.len());
    let mut code = 0u64;
    let mut bits = 0u32;
    for &x in src.iter().chain(std::iter::once(&FLUSH)) {
        if x == RUN_BIT_0 || x == RUN_BIT_1 {
            if x == RUN_BIT_1 {
                code += 1 << bits;
            }
            bits += 1;
        } else {
            if bits > 0 {
                let run = code + (1 << bits) - 1;
                dest.resize(dest.len() + run as usize, 0);
                code = 0;
                bits = 0;
            }
            dest.push(x);
        }
    }
    dest.pop(); // the flush byte
    dest
}

/// Forward stage worker.
pub fn run_forward(input: &OrderedQueue<Column>, output: &OrderedQueue<Column>) -> Result<()> {
    while let Some((priority, col)) = input.pop() {
        output.push(priority, encode_column(&col));
    }
    output.mark_completed();
    Ok(())
}

/// Reverse stage worker.
pub fn run_reverse(input: &OrderedQueue<Column>, output: &OrderedQueue<Column>) -> Result<()> {
    while let Some((priority, col)) = input.pop() {
        output.push(priority, decode_column(&col));
    }
    output.mark_completed();
    Ok(())
}
