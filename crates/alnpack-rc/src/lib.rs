// crates/alnpack-rc/src/lib.rs

//! Range-coder substrate for alnpack: a carry-less binary range coder with
//! 32-bit state and byte output, plus the adaptive frequency model driving
//! it. No I/O here — the encoder owns a byte vector, the decoder borrows a
//! slice — so the entropy stage can treat compressed payloads as plain
//! in-memory byte streams.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod coder;
pub mod model;

pub use coder::{RangeDecoder, RangeEncoder};
pub use model::AdaptiveModel;
