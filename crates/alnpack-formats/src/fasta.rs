// crates/alnpack-formats/src/fasta.rs

//! FASTA reading and writing.
//!
//! Names are stored with the leading `>` so emission is a plain
//! concatenation; wrapped sequence lines are joined on read. Writing
//! supports re-wrapping at a fixed width and a gap-stripping mode that
//! keeps uppercase letters only.

use crate::io::{open_input, read_line_nonempty};
use anyhow::{ensure, Context, Result};
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// A parsed FASTA file: names (with `>`), 1:1 with rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FastaContent {
    /// Header lines, `>` included.
    pub names: Vec<Vec<u8>>,
    /// Sequence rows, wrap joined.
    pub rows: Vec<Vec<u8>>,
}

/// Read `path` (gzip-transparent) as FASTA.
pub fn read_file(path: &Path) -> Result<FastaContent> {
    let mut r = open_input(path)?;
    read_from(&mut *r).with_context(|| format!("parse FASTA {}", path.display()))
}

/// Read FASTA from any buffered source.
pub fn read_from<R: BufRead + ?Sized>(r: &mut R) -> Result<FastaContent> {
    let mut content = FastaContent::default();
    let mut first = true;

    while let Some(line) = read_line_nonempty(r)? {
        if first {
            ensure!(line[0] == b'>', "input does not start with a '>' header");
            first = false;
        }
        if line[0] == b'>' {
            content.names.push(line);
            content.rows.push(Vec::new());
        } else if let Some(row) = content.rows.last_mut() {
            row.extend_from_slice(&line);
        }
    }

    ensure!(!content.names.is_empty(), "no sequences in FASTA input");
    Ok(content)
}

/// Write FASTA to `path`. `wrap = 0` emits each sequence on one line;
/// otherwise lines are wrapped at exactly `wrap` characters with a short
/// remainder line. `seq_only` strips everything but letters and upcases
/// the rest.
pub fn write_file(
    path: &Path,
    names: &[Vec<u8>],
    rows: &[Vec<u8>],
    wrap: usize,
    seq_only: bool,
) -> Result<()> {
    let f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    write_to(&mut w, names, rows, wrap, seq_only)?;
    w.flush().context("flush FASTA output")
}

/// Write FASTA to any sink; see [`write_file`].
pub fn write_to<W: Write>(
    w: &mut W,
    names: &[Vec<u8>],
    rows: &[Vec<u8>],
    wrap: usize,
    seq_only: bool,
) -> Result<()> {
    for (name, row) in names.iter().zip(rows) {
        w.write_all(name)?;
        w.write_all(b"\n")?;

        let stripped;
        let data: &[u8] = if seq_only {
            stripped = strip_gaps(row);
            &stripped
        } else {
            row
        };

        if wrap == 0 {
            w.write_all(data)?;
            w.write_all(b"\n")?;
        } else {
            for chunk in data.chunks(wrap) {
                w.write_all(chunk)?;
                w.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Drop gap and annotation characters, keeping letters only, upcased.
#[must_use]
pub fn strip_gaps(row: &[u8]) -> Vec<u8> {
    row.iter()
        .filter(|c| c.is_ascii_alphabetic())
        .map(u8::to_ascii_uppercase)
        .collect()
}
