// crates/alnpack-core/src/transpose.rs

//! Row-major alignment ↔ column stream, in reverse column order.
//!
//! The last column is emitted first (priority 0) so the PBWT downstream is
//! anchored at the final column, which gives it a meaningful initial
//! ordering. Columns are gathered 64 at a time purely for cache locality;
//! only the emission order is contract.

use crate::queue::OrderedQueue;
use crate::types::{Column, Row};
use anyhow::{ensure, Result};

const BLOCK: usize = 64;

/// Emit the columns of `rows` into `out`, last column first, with
/// priorities `0, 1, …`. Fatal if the rows differ in length.
pub fn forward(rows: &[Row], out: &OrderedQueue<Column>) -> Result<()> {
    let res = forward_inner(rows, out);
    out.mark_completed();
    res
}

fn forward_inner(rows: &[Row], out: &OrderedQueue<Column>) -> Result<()> {
    let n_columns = rows.first().map_or(0, Vec::len);
    for (i, r) in rows.iter().enumerate() {
        ensure!(
            r.len() == n_columns,
            "alignment rows differ in length: row 0 has {n_columns} columns, row {i} has {}",
            r.len()
        );
    }

    let n_rows = rows.len();
    let mut block: Vec<Column> = vec![vec![0u8; n_rows]; BLOCK];
    let mut priority = 0u64;

    let mut hi = n_columns;
    while hi > 0 {
        let lo = hi.saturating_sub(BLOCK);
        for (j, row) in rows.iter().enumerate() {
            for ci in lo..hi {
                block[ci % BLOCK][j] = row[ci];
            }
        }
        for ci in (lo..hi).rev() {
            let col = std::mem::replace(&mut block[ci % BLOCK], vec![0u8; n_rows]);
            out.push(priority, col);
            priority += 1;
        }
        hi = lo;
    }

    Ok(())
}

/// Rebuild the `n_rows × n_columns` matrix from columns arriving in the
/// order [`forward`] emits them.
pub fn reverse(
    n_rows: usize,
    n_columns: usize,
    input: &OrderedQueue<Column>,
) -> Result<Vec<Row>> {
    let mut rows = vec![vec![0u8; n_columns]; n_rows];
    let mut received = 0usize;

    while let Some((priority, col)) = input.pop() {
        let idx = usize::try_from(priority)?;
        ensure!(
            idx < n_columns,
            "column priority {priority} out of range for width {n_columns}"
        );
        ensure!(
            col.len() == n_rows,
            "column holds {} symbols, alignment height is {n_rows}",
            col.len()
        );
        let ci = n_columns - 1 - idx;
        for (row, &b) in rows.iter_mut().zip(col.iter()) {
            row[ci] = b;
        }
        received += 1;
    }

    ensure!(
        received == n_columns,
        "expected {n_columns} columns, received {received}"
    );
    Ok(rows)
}
