// crates/alnpack-formats/src/lib.rs

//! FASTA and Stockholm parsing/emission for alnpack.
//!
//! The parsers produce exactly the pieces the codec consumes — metadata
//! lines, interleaving offsets, names and rows — and the emitters invert
//! them byte for byte. File syntax stays in this crate; the codec never
//! sees it.

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

pub mod fasta;
pub mod io;
pub mod stockholm;

// (Intentionally no broad re-exports so downstream callers import
// stable module paths like `alnpack_formats::stockholm::read_family`.)
