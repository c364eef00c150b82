// crates/alnpack-core/src/blob.rs

//! Per-alignment blob layout and the shared varint.
//!
//! Varint: one length byte `b` (0..=8) followed by `b` little-endian value
//! bytes; `b = 0` encodes zero. The blob is a one-byte class/flags header,
//! five varints (rows, columns, side-text length, payload length,
//! pre-entropy count) and the two byte blocks. The archive footer reuses
//! the same varint.

use crate::entropy::ContextClass;
use anyhow::{ensure, Context, Result};

/// Bit 6 of the class byte: MTF-1 (fast) second stage.
pub const FAST_FLAG: u8 = 1 << 6;
/// Bits 0–2 of the class byte: context-class index.
const CLASS_MASK: u8 = 0b0000_0111;

/// Parsed blob header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobHeader {
    /// Context-length class the alignment was coded under.
    pub class: ContextClass,
    /// Whether the fast (MTF-1) second stage was used.
    pub fast: bool,
    /// Alignment height `N`.
    pub n_sequences: u64,
    /// Alignment width `L` (0 when the pipeline was skipped).
    pub n_columns: u64,
    /// Pre-entropy byte count `P` driving the decoder.
    pub pre_entropy: u64,
}

/// Append `x` as a varint.
pub fn write_uint(out: &mut Vec<u8>, x: u64) {
    let mut n_bytes = 0u8;
    let mut t = x;
    while t != 0 {
        n_bytes += 1;
        t >>= 8;
    }
    out.push(n_bytes);
    let mut v = x;
    for _ in 0..n_bytes {
        out.push((v & 0xff) as u8);
        v >>= 8;
    }
}

/// Read a varint at `*pos`, advancing it.
pub fn read_uint(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let n = *buf.get(*pos).context("truncated varint length")? as usize;
    *pos += 1;
    ensure!(n <= 8, "varint length {n} out of range");
    ensure!(*pos + n <= buf.len(), "truncated varint payload");
    let mut x = 0u64;
    for i in 0..n {
        x |= u64::from(buf[*pos + i]) << (8 * i);
    }
    *pos += n;
    Ok(x)
}

/// Assemble a complete per-alignment blob.
#[must_use]
pub fn assemble(header: &BlobHeader, text: &[u8], seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 5 * 9 + text.len() + seq.len());
    out.push(header.class.index() | if header.fast { FAST_FLAG } else { 0 });
    write_uint(&mut out, header.n_sequences);
    write_uint(&mut out, header.n_columns);
    write_uint(&mut out, text.len() as u64);
    write_uint(&mut out, seq.len() as u64);
    write_uint(&mut out, header.pre_entropy);
    out.extend_from_slice(text);
    out.extend_from_slice(seq);
    out
}

/// Split a blob into its header and the side-text / sequence payloads.
pub fn parse(blob: &[u8]) -> Result<(BlobHeader, &[u8], &[u8])> {
    let mut pos = 0usize;
    let tag = *blob.first().context("empty blob")?;
    pos += 1;

    let class = ContextClass::from_index(tag & CLASS_MASK)?;
    let fast = tag & FAST_FLAG != 0;

    let n_sequences = read_uint(blob, &mut pos)?;
    let n_columns = read_uint(blob, &mut pos)?;
    let text_len = usize::try_from(read_uint(blob, &mut pos)?)?;
    let seq_len = usize::try_from(read_uint(blob, &mut pos)?)?;
    let pre_entropy = read_uint(blob, &mut pos)?;

    ensure!(
        (blob.len() - pos) as u128 == text_len as u128 + seq_len as u128,
        "blob payload is {} bytes, header declares {}",
        blob.len() - pos,
        text_len as u128 + seq_len as u128
    );
    let text = &blob[pos..pos + text_len];
    let seq = &blob[pos + text_len..];

    Ok((
        BlobHeader {
            class,
            fast,
            n_sequences,
            n_columns,
            pre_entropy,
        },
        text,
        seq,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn varint_zero_is_one_byte() {
        let mut buf = Vec::new();
        write_uint(&mut buf, 0);
        assert_eq!(buf, vec![0]);
        let mut pos = 0;
        assert_eq!(read_uint(&buf, &mut pos).unwrap(), 0);
        assert_eq!(pos, 1);
    }

    #[test]
    fn varint_known_encodings() {
        let mut buf = Vec::new();
        write_uint(&mut buf, 0x1234);
        assert_eq!(buf, vec![2, 0x34, 0x12]);
    }

    #[test]
    fn varint_rejects_truncation() {
        assert!(read_uint(&[], &mut 0).is_err());
        assert!(read_uint(&[3, 1, 2], &mut 0).is_err());
        assert!(read_uint(&[9, 0, 0, 0, 0, 0, 0, 0, 0, 0], &mut 0).is_err());
    }

    #[test]
    fn blob_roundtrip() {
        let header = BlobHeader {
            class: ContextClass::Small,
            fast: true,
            n_sequences: 17,
            n_columns: 421,
            pre_entropy: 3000,
        };
        let blob = assemble(&header, b"meta", b"payload");
        let (h, text, seq) = parse(&blob).unwrap();
        assert_eq!(h, header);
        assert_eq!(text, b"meta");
        assert_eq!(seq, b"payload");
    }

    #[test]
    fn blob_rejects_length_mismatch() {
        let header = BlobHeader {
            class: ContextClass::Tiny,
            fast: false,
            n_sequences: 1,
            n_columns: 1,
            pre_entropy: 1,
        };
        let mut blob = assemble(&header, b"", b"xy");
        blob.pop();
        assert!(parse(&blob).is_err());
    }

    proptest! {
        #[test]
        fn varint_roundtrips(x in any::<u64>()) {
            let mut buf = Vec::new();
            write_uint(&mut buf, x);
            let mut pos = 0;
            prop_assert_eq!(read_uint(&buf, &mut pos).unwrap(), x);
            prop_assert_eq!(pos, buf.len());
        }
    }
}
