// crates/alnpack-core/src/codec.rs

//! The per-alignment engine: wires the stage workers together, runs the
//! metadata side-channel alongside them, and assembles/parses the blob.
//!
//! All pipeline objects are local to one call — nothing survives between
//! alignments — and columns move through the queues by value, owned by
//! exactly one stage at a time. A stage that fails marks its output queue
//! completed before returning, so the remaining workers drain and the
//! join-all below never wedges; the first error wins.

use crate::blob::{self, BlobHeader};
use crate::entropy::{self, ContextClass};
use crate::queue::OrderedQueue;
use crate::rank::{RankDirection, SymbolRanker};
use crate::side;
use crate::types::{Column, CompressStats, Row, StockholmParts, Variant};
use crate::{pbwt, rank, rle, transpose};
use anyhow::{anyhow, ensure, Result};
use std::thread;

/// Replace individual stages with pass-through workers (ablation builds
/// only). RLE-0 cannot be a pure identity — the entropy stage has no code
/// for a zero byte — so its bypass shifts bytes by one instead.
#[cfg(feature = "ablation")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyStages {
    /// Bypass the PBWT.
    pub pbwt: bool,
    /// Bypass the MTF/WFC ranking.
    pub rank: bool,
    /// Bypass the RLE-0 (±1 byte shift instead of identity).
    pub rle: bool,
}

/// MSA compression engine. Construction picks the second-stage variant;
/// decompression follows the flag recorded in the blob instead.
#[derive(Debug, Default)]
pub struct MsaCodec {
    variant: Variant,
    #[cfg(feature = "ablation")]
    copy: CopyStages,
}

impl MsaCodec {
    /// Engine using `variant` for compression.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            #[cfg(feature = "ablation")]
            copy: CopyStages::default(),
        }
    }

    /// Engine with some stages bypassed, for ablation experiments.
    #[cfg(feature = "ablation")]
    #[must_use]
    pub fn with_copy_stages(variant: Variant, copy: CopyStages) -> Self {
        Self { variant, copy }
    }

    /* ------------------------------ compress --------------------------- */

    /// Compress a FASTA alignment (names ‖ rows).
    pub fn compress_fasta(
        &self,
        names: &[Vec<u8>],
        rows: &[Row],
    ) -> Result<(Vec<u8>, CompressStats)> {
        let mut text = Vec::new();
        side::append_lines(&mut text, names);
        self.compress_parts(&text, rows)
    }

    /// Compress one Stockholm family (metadata ‖ names ‖ offsets ‖ rows).
    pub fn compress_stockholm(
        &self,
        meta: &[Vec<u8>],
        offsets: &[u32],
        names: &[Vec<u8>],
        rows: &[Row],
    ) -> Result<(Vec<u8>, CompressStats)> {
        let mut text = Vec::new();
        side::append_lines(&mut text, meta);
        side::append_lines(&mut text, names);
        side::append_u32s(&mut text, offsets);
        self.compress_parts(&text, rows)
    }

    fn compress_parts(&self, text: &[u8], rows: &[Row]) -> Result<(Vec<u8>, CompressStats)> {
        let n_rows = rows.len();
        let n_columns = rows.first().map_or(0, Vec::len);
        ensure!(
            n_rows <= u32::MAX as usize && n_columns <= u32::MAX as usize,
            "alignment dimensions exceed 32 bits ({n_rows} × {n_columns})"
        );
        let class = ContextClass::classify(n_rows.saturating_mul(n_columns));

        let (text_comp, seq) = thread::scope(|s| {
            let lzma = s.spawn(|| side::compress_text(text));
            let seq = if rows.is_empty() {
                Ok((Vec::new(), 0u64))
            } else {
                self.run_forward_pipeline(rows, class)
            };
            (join(lzma), seq)
        });
        let text_comp = text_comp?;
        let (seq_comp, pre_entropy) = seq?;

        let header = BlobHeader {
            class,
            fast: self.variant.is_fast(),
            n_sequences: n_rows as u64,
            n_columns: if pre_entropy > 0 { n_columns as u64 } else { 0 },
            pre_entropy,
        };
        let stats = CompressStats {
            text_bytes: text_comp.len(),
            seq_bytes: seq_comp.len(),
        };
        Ok((blob::assemble(&header, &text_comp, &seq_comp), stats))
    }

    fn run_forward_pipeline(&self, rows: &[Row], class: ContextClass) -> Result<(Vec<u8>, u64)> {
        let n_workers = self.variant.n_workers();
        let q_columns = OrderedQueue::new(1);
        let q_pbwt = OrderedQueue::new(1);
        let q_ranked = OrderedQueue::new(n_workers);
        let q_rle = OrderedQueue::new(1);

        thread::scope(|s| {
            let t = s.spawn(|| transpose::forward(rows, &q_columns));
            let p = s.spawn(|| self.run_pbwt(RankDirection::Forward, &q_columns, &q_pbwt));
            let workers: Vec<_> = (0..n_workers)
                .map(|_| {
                    let ranker = self.variant.ranker();
                    let (input, output) = (&q_pbwt, &q_ranked);
                    s.spawn(move || self.run_rank(RankDirection::Forward, ranker, input, output))
                })
                .collect();
            let r = s.spawn(|| self.run_rle(RankDirection::Forward, &q_ranked, &q_rle));
            let e = s.spawn(|| entropy::encode(&q_rle, class));

            join(t)?;
            join(p)?;
            for w in workers {
                join(w)?;
            }
            join(r)?;
            join(e)
        })
    }

    /* ----------------------------- decompress -------------------------- */

    /// Decompress a FASTA blob back into (names, rows).
    pub fn decompress_fasta(&self, data: &[u8]) -> Result<(Vec<Vec<u8>>, Vec<Row>)> {
        let (text, rows) = self.decompress_parts(data)?;
        let mut pos = 0usize;
        let names = side::read_lines(&text, &mut pos)?;
        ensure!(
            names.len() == rows.len(),
            "decoded {} names for {} sequences",
            names.len(),
            rows.len()
        );
        Ok((names, rows))
    }

    /// Decompress a Stockholm family blob.
    pub fn decompress_stockholm(&self, data: &[u8]) -> Result<StockholmParts> {
        let (text, rows) = self.decompress_parts(data)?;
        let mut pos = 0usize;
        let meta = side::read_lines(&text, &mut pos)?;
        let names = side::read_lines(&text, &mut pos)?;
        let offsets = side::read_u32s(&text, &mut pos)?;
        ensure!(
            names.len() == rows.len(),
            "decoded {} names for {} sequences",
            names.len(),
            rows.len()
        );
        ensure!(
            offsets.len() <= meta.len(),
            "{} interleaving offsets for {} metadata lines",
            offsets.len(),
            meta.len()
        );
        Ok(StockholmParts {
            meta,
            offsets,
            names,
            rows,
        })
    }

    fn decompress_parts(&self, data: &[u8]) -> Result<(Vec<u8>, Vec<Row>)> {
        let (header, text_comp, seq_comp) = blob::parse(data)?;
        ensure!(
            header.n_sequences <= u64::from(u32::MAX)
                && header.n_columns <= u64::from(u32::MAX),
            "blob header declares oversized alignment"
        );
        let n_rows = usize::try_from(header.n_sequences)?;
        let n_columns = usize::try_from(header.n_columns)?;
        let variant = if header.fast {
            Variant::Mtf
        } else {
            Variant::Wfc
        };

        let (text, rows) = thread::scope(|s| {
            let lzma = s.spawn(|| side::decompress_text(text_comp));
            let rows = if header.pre_entropy == 0 {
                Ok(vec![Vec::new(); n_rows])
            } else {
                self.run_reverse_pipeline(&header, seq_comp, variant, n_rows, n_columns)
            };
            (join(lzma), rows)
        });
        Ok((text?, rows?))
    }

    fn run_reverse_pipeline(
        &self,
        header: &BlobHeader,
        payload: &[u8],
        variant: Variant,
        n_rows: usize,
        n_columns: usize,
    ) -> Result<Vec<Row>> {
        ensure!(
            n_rows > 0 && n_columns > 0,
            "blob carries a payload for an empty alignment"
        );
        let n_workers = variant.n_workers();
        let q_entropy = OrderedQueue::new(1);
        let q_rle = OrderedQueue::new(1);
        let q_ranked = OrderedQueue::new(n_workers);
        let q_pbwt = OrderedQueue::new(1);
        let (class, pre_entropy) = (header.class, header.pre_entropy);

        thread::scope(|s| {
            let e = s.spawn(|| entropy::decode(payload, class, n_rows, pre_entropy, &q_entropy));
            let r = s.spawn(|| self.run_rle(RankDirection::Reverse, &q_entropy, &q_rle));
            let workers: Vec<_> = (0..n_workers)
                .map(|_| {
                    let ranker = variant.ranker();
                    let (input, output) = (&q_rle, &q_ranked);
                    s.spawn(move || self.run_rank(RankDirection::Reverse, ranker, input, output))
                })
                .collect();
            let p = s.spawn(|| self.run_pbwt(RankDirection::Reverse, &q_ranked, &q_pbwt));
            let t = s.spawn(|| transpose::reverse(n_rows, n_columns, &q_pbwt));

            join(e)?;
            join(r)?;
            for w in workers {
                join(w)?;
            }
            join(p)?;
            join(t)
        })
    }

    /* --------------------------- stage dispatch ------------------------ */

    fn run_pbwt(
        &self,
        direction: RankDirection,
        input: &OrderedQueue<Column>,
        output: &OrderedQueue<Column>,
    ) -> Result<()> {
        #[cfg(feature = "ablation")]
        if self.copy.pbwt {
            return copy_stage(input, output);
        }
        match direction {
            RankDirection::Forward => pbwt::run_forward(input, output),
            RankDirection::Reverse => pbwt::run_reverse(input, output),
        }
    }

    fn run_rank(
        &self,
        direction: RankDirection,
        mut ranker: Box<dyn SymbolRanker>,
        input: &OrderedQueue<Column>,
        output: &OrderedQueue<Column>,
    ) -> Result<()> {
        #[cfg(feature = "ablation")]
        if self.copy.rank {
            return copy_stage(input, output);
        }
        rank::run(direction, ranker.as_mut(), input, output)
    }

    fn run_rle(
        &self,
        direction: RankDirection,
        input: &OrderedQueue<Column>,
        output: &OrderedQueue<Column>,
    ) -> Result<()> {
        #[cfg(feature = "ablation")]
        if self.copy.rle {
            return shifted_copy_stage(direction, input, output);
        }
        match direction {
            RankDirection::Forward => rle::run_forward(input, output),
            RankDirection::Reverse => rle::run_reverse(input, output),
        }
    }
}

/// Join a stage worker, turning a panic into an error.
fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("pipeline worker panicked"))?
}

#[cfg(feature = "ablation")]
fn copy_stage(input: &OrderedQueue<Column>, output: &OrderedQueue<Column>) -> Result<()> {
    while let Some((priority, col)) = input.pop() {
        output.push(priority, col);
    }
    output.mark_completed();
    Ok(())
}

#[cfg(feature = "ablation")]
fn shifted_copy_stage(
    direction: RankDirection,
    input: &OrderedQueue<Column>,
    output: &OrderedQueue<Column>,
) -> Result<()> {
    while let Some((priority, col)) = input.pop() {
        let mapped = match direction {
            RankDirection::Forward => col.iter().map(|&x| x + 1).collect(),
            RankDirection::Reverse => col.iter().map(|&x| x - 1).collect(),
        };
        output.push(priority, mapped);
    }
    output.mark_completed();
    Ok(())
}
