// crates/alnpack-core/src/pbwt.rs

//! Positional Burrows–Wheeler permutation of alignment columns.
//!
//! State is one permutation of row indices (`prev`), identity on the first
//! column and refined every step by a counting sort on the column's
//! symbols. Forward and reverse walk through identical `prev` sequences —
//! that is what makes the transform invertible.

use crate::queue::OrderedQueue;
use crate::types::Column;
use anyhow::{ensure, Result};

const ALPHABET: usize = 128;

/// Column-stable sort state for one alignment.
#[derive(Debug, Default)]
pub struct Pbwt {
    prev: Vec<u32>,
    curr: Vec<u32>,
}

impl Pbwt {
    /// Fresh state; the first column seen initialises the ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn init(&mut self, height: usize) -> Result<()> {
        if self.prev.is_empty() {
            self.prev = (0..height as u32).collect();
            self.curr = vec![0; height];
        }
        ensure!(
            height == self.prev.len(),
            "column height changed mid-alignment ({height} vs {})",
            self.prev.len()
        );
        Ok(())
    }

    /// Apply the forward permutation to one column.
    pub fn forward_column(&mut self, src: &[u8]) -> Result<Column> {
        self.init(src.len())?;
        let dest: Column = self.prev.iter().map(|&r| src[r as usize]).collect();
        self.refine(src)?;
        Ok(dest)
    }

    /// Invert the permutation for one column produced by
    /// [`Self::forward_column`] at the same step.
    pub fn reverse_column(&mut self, src: &[u8]) -> Result<Column> {
        self.init(src.len())?;
        let mut dest = vec![0u8; src.len()];
        for (i, &row) in self.prev.iter().enumerate() {
            dest[row as usize] = src[i];
        }
        self.refine(&dest)?;
        Ok(dest)
    }

    /// Ordering refinement shared by both directions: counting-sort the
    /// rows of `col` (in `prev` order) by symbol, then swap in the result.
    fn refine(&mut self, col: &[u8]) -> Result<()> {
        let mut offsets = symbol_offsets(col)?;
        for i in 0..self.prev.len() {
            let row = self.prev[i];
            let sym = col[row as usize] as usize;
            let slot = offsets[sym] as usize;
            offsets[sym] += 1;
            self.curr[slot] = row;
        }
        std::mem::swap(&mut self.prev, &mut self.curr);
        Ok(())
    }
}

/// Histogram + exclusive prefix sums → first write slot per symbol.
fn symbol_offsets(col: &[u8]) -> Result<[u32; ALPHABET]> {
    let mut occ = [0u32; ALPHABET];
    for &c in col {
        ensure!(c < 128, "sequence byte {c:#04x} outside the 7-bit alphabet");
        occ[c as usize] += 1;
    }
    let mut offsets = [0u32; ALPHABET];
    for i in 1..ALPHABET {
        offsets[i] = offsets[i - 1] + occ[i - 1];
    }
    Ok(offsets)
}

/// Forward stage worker: pops columns, permutes, pushes at the same
/// priority.
pub fn run_forward(input: &OrderedQueue<Column>, output: &OrderedQueue<Column>) -> Result<()> {
    let res = run_inner(input, output, false);
    output.mark_completed();
    res
}

/// Reverse stage worker.
pub fn run_reverse(input: &OrderedQueue<Column>, output: &OrderedQueue<Column>) -> Result<()> {
    let res = run_inner(input, output, true);
    output.mark_completed();
    res
}

fn run_inner(
    input: &OrderedQueue<Column>,
    output: &OrderedQueue<Column>,
    reverse: bool,
) -> Result<()> {
    let mut state = Pbwt::new();
    while let Some((priority, col)) = input.pop() {
        let dest = if reverse {
            state.reverse_column(&col)?
        } else {
            state.forward_column(&col)?
        };
        output.push(priority, dest);
    }
    Ok(())
}
