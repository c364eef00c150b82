// crates/alnpack-core/src/lib.rs

//! Core MSA compression pipeline.
//!
//! One alignment flows through `transpose → pbwt → rank → rle → entropy`
//! as a set of concurrent stage workers joined by priority-ordered queues;
//! metadata takes the LZMA side-channel in parallel. The reverse pipeline
//! mirrors the forward one stage for stage and must be bit-exact.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod blob;
pub mod codec;
pub mod entropy;
pub mod pbwt;
pub mod queue;
pub mod rank;
pub mod rle;
pub mod side;
pub mod transpose;
pub mod types;

// ---- Re-exports for workspace compatibility ----
pub use codec::MsaCodec;
pub use entropy::ContextClass;
pub use queue::OrderedQueue;
pub use types::{Column, CompressStats, Row, StockholmParts, Variant};
