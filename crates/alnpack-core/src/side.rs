// crates/alnpack-core/src/side.rs

//! Metadata side-channel: length-prefixed text framing + LZMA.
//!
//! Names, metadata lines and interleaving offsets are packed into one text
//! block (each section prefixed with its byte length, lines joined with
//! `\n`) and handed to the xz codec as an opaque collaborator. An empty
//! block stays empty on both sides.

use crate::blob::{read_uint, write_uint};
use anyhow::{anyhow, ensure, Result};

/// Append a line section: varint total length, then every line + `\n`.
pub fn append_lines(buf: &mut Vec<u8>, lines: &[Vec<u8>]) {
    let total: u64 = lines.iter().map(|l| l.len() as u64 + 1).sum();
    write_uint(buf, total);
    buf.reserve(total as usize);
    for l in lines {
        buf.extend_from_slice(l);
        buf.push(b'\n');
    }
}

/// Read back a line section written by [`append_lines`].
pub fn read_lines(buf: &[u8], pos: &mut usize) -> Result<Vec<Vec<u8>>> {
    let len = usize::try_from(read_uint(buf, pos)?)?;
    ensure!(*pos + len <= buf.len(), "truncated line section");

    let mut out: Vec<Vec<u8>> = vec![Vec::new()];
    for &c in &buf[*pos..*pos + len] {
        if c == b'\n' {
            out.push(Vec::new());
        } else if let Some(line) = out.last_mut() {
            line.push(c);
        }
    }
    *pos += len;
    // The final newline leaves one empty tail entry.
    if out.last().is_some_and(Vec::is_empty) {
        out.pop();
    }
    Ok(out)
}

/// Append an integer section: varint count, then one varint per value.
pub fn append_u32s(buf: &mut Vec<u8>, values: &[u32]) {
    write_uint(buf, values.len() as u64);
    for &v in values {
        write_uint(buf, u64::from(v));
    }
}

/// Read back an integer section written by [`append_u32s`].
pub fn read_u32s(buf: &[u8], pos: &mut usize) -> Result<Vec<u32>> {
    let count = usize::try_from(read_uint(buf, pos)?)?;
    let mut out = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        out.push(u32::try_from(read_uint(buf, pos)?)?);
    }
    Ok(out)
}

/// Compress the packed text block. Empty in, empty out.
pub fn compress_text(text: &[u8]) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    lzma_rs::xz_compress(&mut &text[..], &mut out)
        .map_err(|e| anyhow!("lzma side-channel compression failed: {e}"))?;
    Ok(out)
}

/// Decompress the packed text block. Empty in, empty out.
pub fn decompress_text(compressed: &[u8]) -> Result<Vec<u8>> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    lzma_rs::xz_decompress(&mut &compressed[..], &mut out)
        .map_err(|e| anyhow!("lzma side-channel stream error: {e}"))?;
    Ok(out)
}
