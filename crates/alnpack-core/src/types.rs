// crates/alnpack-core/src/types.rs

//! Canonical core types used across the alnpack workspace.
//!
//! Sequence data is 7-bit ASCII by contract, so rows, columns, names and
//! metadata lines are plain byte vectors; anything ≥ 128 is rejected where
//! the PBWT histograms a column.

/// One alignment row (all rows of an alignment share one length).
pub type Row = Vec<u8>;

/// One alignment column — one byte per row, travelling through the
/// pipeline queues tagged with a `u64` priority.
pub type Column = Vec<u8>;

/// Second-stage ranking variant, chosen at codec construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Time-weighted frequency count (default; 4 parallel workers).
    #[default]
    Wfc,
    /// MTF-1 ranking (the fast variant; 2 parallel workers).
    Mtf,
}

impl Variant {
    /// Number of parallel second-stage workers for this variant.
    #[inline]
    #[must_use]
    pub fn n_workers(self) -> usize {
        match self {
            Self::Wfc => 4,
            Self::Mtf => 2,
        }
    }

    /// Whether this is the fast (MTF) variant, as recorded in the blob header.
    #[inline]
    #[must_use]
    pub fn is_fast(self) -> bool {
        matches!(self, Self::Mtf)
    }
}

/// Compressed-size breakdown reported per alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompressStats {
    /// Bytes of the LZMA-compressed metadata/name side-channel.
    pub text_bytes: usize,
    /// Bytes of the entropy-coded sequence payload.
    pub seq_bytes: usize,
}

impl CompressStats {
    /// Total compressed payload size (header bytes excluded).
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.text_bytes + self.seq_bytes
    }
}

/// Decompressed pieces of one Stockholm family, in the shape the format
/// layer consumes: raw metadata lines, the metadata/sequence interleaving
/// offsets, sequence names and sequence rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StockholmParts {
    /// Raw metadata lines (`#`-prefixed in the source file).
    pub meta: Vec<Vec<u8>>,
    /// Sequence-line counts separating non-leading metadata lines.
    pub offsets: Vec<u32>,
    /// Sequence names, 1:1 with `rows`.
    pub names: Vec<Vec<u8>>,
    /// Alignment rows.
    pub rows: Vec<Row>,
}
