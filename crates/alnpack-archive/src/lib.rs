// crates/alnpack-archive/src/lib.rs

//! Multi-family container with a footer index and random seek.
//!
//! Layout: per-family records `[size: 8-byte LE][blob]` back to back, then
//! a footer listing one descriptor per family (varint fields, identifiers
//! NUL-terminated), then an 8-byte little-endian count of footer bytes.
//! There are no magic bytes. On open, the footer is parsed from the tail
//! and the data region boundary (`logical_file_size`) derived from it;
//! sequential reads stop at that boundary, random access seeks straight to
//! a descriptor's data pointer. A file without a parseable footer size is
//! read as holding zero families.

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

use alnpack_core::blob::{read_uint, write_uint};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// One footer entry, in compression order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    /// Alignment height.
    pub n_sequences: u64,
    /// Alignment width.
    pub n_columns: u64,
    /// Byte span of the family in the source file.
    pub raw_size: u64,
    /// Compressed payload size (side-channel + sequence bytes).
    pub compressed_size: u64,
    /// Offset of the family's record in the archive.
    pub data_ptr: u64,
    /// `#=GF ID` value.
    pub id: String,
    /// `#=GF AC` value.
    pub ac: String,
}

fn encode_descriptor(out: &mut Vec<u8>, d: &FamilyDescriptor) {
    write_uint(out, d.n_sequences);
    write_uint(out, d.n_columns);
    write_uint(out, d.raw_size);
    write_uint(out, d.compressed_size);
    write_uint(out, d.data_ptr);
    out.extend_from_slice(d.id.as_bytes());
    out.push(0);
    out.extend_from_slice(d.ac.as_bytes());
    out.push(0);
}

fn read_cstr(buf: &[u8], pos: &mut usize) -> Result<String> {
    let nul = buf[*pos..]
        .iter()
        .position(|&c| c == 0)
        .context("unterminated identifier in archive footer")?;
    let s = std::str::from_utf8(&buf[*pos..*pos + nul])
        .context("archive identifier is not UTF-8")?
        .to_owned();
    *pos += nul + 1;
    Ok(s)
}

fn decode_descriptor(buf: &[u8], pos: &mut usize) -> Result<FamilyDescriptor> {
    Ok(FamilyDescriptor {
        n_sequences: read_uint(buf, pos)?,
        n_columns: read_uint(buf, pos)?,
        raw_size: read_uint(buf, pos)?,
        compressed_size: read_uint(buf, pos)?,
        data_ptr: read_uint(buf, pos)?,
        id: read_cstr(buf, pos)?,
        ac: read_cstr(buf, pos)?,
    })
}

/// Archive writer: records appended in compression order, footer written
/// on [`ArchiveWriter::finish`]. A mid-write failure leaves the partial
/// file behind for operator cleanup; it will read as zero families.
pub struct ArchiveWriter {
    out: BufWriter<File>,
    descriptors: Vec<FamilyDescriptor>,
    pos: u64,
}

impl ArchiveWriter {
    /// Create (truncate) the archive at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(f),
            descriptors: Vec::new(),
            pos: 0,
        })
    }

    /// Current append offset — the `data_ptr` the next record will get.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Append one family record; the descriptor's `data_ptr` is filled in
    /// here.
    pub fn append(&mut self, mut desc: FamilyDescriptor, blob: &[u8]) -> Result<()> {
        ensure!(
            !desc.id.as_bytes().contains(&0) && !desc.ac.as_bytes().contains(&0),
            "family identifiers must not contain NUL"
        );
        desc.data_ptr = self.pos;
        self.out
            .write_all(&(blob.len() as u64).to_le_bytes())
            .context("write record size")?;
        self.out.write_all(blob).context("write record payload")?;
        self.pos += 8 + blob.len() as u64;
        self.descriptors.push(desc);
        Ok(())
    }

    /// Write the footer and flush. Consumes the writer.
    pub fn finish(mut self) -> Result<()> {
        let mut footer = Vec::new();
        for d in &self.descriptors {
            encode_descriptor(&mut footer, d);
        }
        self.out.write_all(&footer).context("write footer")?;
        self.out
            .write_all(&(footer.len() as u64).to_le_bytes())
            .context("write footer size")?;
        self.out.flush().context("flush archive")?;
        Ok(())
    }
}

/// Archive reader with the footer index parsed up front.
pub struct ArchiveReader {
    file: File,
    descriptors: Vec<FamilyDescriptor>,
    logical_size: u64,
    pos: u64,
}

impl ArchiveReader {
    /// Open `path` and parse the footer index from the tail.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let total = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();

        let mut descriptors = Vec::new();
        let mut logical_size = total;

        if total >= 8 {
            file.seek(SeekFrom::End(-8)).context("seek to footer size")?;
            let mut tail = [0u8; 8];
            file.read_exact(&mut tail).context("read footer size")?;
            let footer_size = u64::from_le_bytes(tail);

            if footer_size <= total - 8 {
                logical_size = total - footer_size - 8;
                file.seek(SeekFrom::Start(logical_size))
                    .context("seek to footer")?;
                let mut footer = vec![0u8; usize::try_from(footer_size)?];
                file.read_exact(&mut footer).context("read footer")?;

                let mut pos = 0usize;
                while pos < footer.len() {
                    let d = decode_descriptor(&footer, &mut pos)
                        .context("parse archive footer descriptor")?;
                    ensure!(
                        d.data_ptr < logical_size,
                        "descriptor data pointer {} outside the data region (0..{})",
                        d.data_ptr,
                        logical_size
                    );
                    descriptors.push(d);
                }
            }
            // A footer size that does not fit the file means there is no
            // footer; read the whole file as a bare record stream.
        }

        file.seek(SeekFrom::Start(0)).context("rewind archive")?;
        Ok(Self {
            file,
            descriptors,
            logical_size,
            pos: 0,
        })
    }

    /// Footer descriptors in compression order.
    #[must_use]
    pub fn descriptors(&self) -> &[FamilyDescriptor] {
        &self.descriptors
    }

    /// End of the record data region.
    #[must_use]
    pub fn logical_size(&self) -> u64 {
        self.logical_size
    }

    /// Next record in sequence, or `None` at the data-region boundary.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        if self.pos >= self.logical_size {
            return Ok(None);
        }
        let blob = self.read_record_at(self.pos)?;
        self.pos += 8 + blob.len() as u64;
        Ok(Some(blob))
    }

    /// Random access: the record a descriptor points at.
    pub fn read_family(&mut self, desc: &FamilyDescriptor) -> Result<Vec<u8>> {
        ensure!(
            desc.data_ptr < self.logical_size,
            "descriptor data pointer {} outside the data region (0..{})",
            desc.data_ptr,
            self.logical_size
        );
        self.read_record_at(desc.data_ptr)
    }

    fn read_record_at(&mut self, offset: u64) -> Result<Vec<u8>> {
        ensure!(
            offset + 8 <= self.logical_size,
            "record header at {offset} overruns the data region"
        );
        self.file
            .seek(SeekFrom::Start(offset))
            .context("seek to record")?;
        let mut size_bytes = [0u8; 8];
        self.file
            .read_exact(&mut size_bytes)
            .context("read record size")?;
        let size = u64::from_le_bytes(size_bytes);
        ensure!(
            offset + 8 + size <= self.logical_size,
            "record of {size} bytes at {offset} overruns the data region"
        );
        let mut blob = vec![0u8; usize::try_from(size)?];
        self.file
            .read_exact(&mut blob)
            .context("short read of record payload")?;
        Ok(blob)
    }
}
