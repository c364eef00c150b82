// crates/alnpack-formats/src/stockholm.rs

//! Stockholm family parsing and emission.
//!
//! A family is the run of lines up to the `//` terminator: `#`-prefixed
//! metadata, everything else a `name WS sequence` pair. The name keeps the
//! separating whitespace run, and the offsets vector records how many
//! sequence lines precede each non-leading metadata line — together they
//! make emission byte-exact, interleaving included.

use crate::io::read_line_nonempty;
use anyhow::{ensure, Result};
use std::io::{BufRead, Write};

/// One parsed family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Family {
    /// Raw metadata lines.
    pub meta: Vec<Vec<u8>>,
    /// Sequence-line counts before each non-leading metadata line.
    pub offsets: Vec<u32>,
    /// Names including the trailing whitespace separator.
    pub names: Vec<Vec<u8>>,
    /// Alignment rows.
    pub rows: Vec<Vec<u8>>,
    /// `#=GF ID` value, empty if absent.
    pub id: String,
    /// `#=GF AC` value, empty if absent.
    pub ac: String,
}

/// Value of a `#=GF <key>` metadata line, if this is one.
fn gf_value(line: &[u8], key: &[u8]) -> Option<String> {
    let rest = line.strip_prefix(b"#=GF ")?.strip_prefix(key)?;
    if !rest.first().is_some_and(u8::is_ascii_whitespace) {
        return None;
    }
    Some(String::from_utf8_lossy(rest).trim().to_string())
}

/// Parse the next family from `r`, or `None` at end of input. A truncated
/// final family (end of file before `//`) is returned as-is.
pub fn read_family<R: BufRead + ?Sized>(r: &mut R) -> Result<Option<Family>> {
    let mut fam = Family::default();
    let mut line_no = 0u32;
    let mut last_meta_line = 0u32;

    while let Some(line) = read_line_nonempty(r)? {
        if line == b"//" {
            break;
        }
        line_no += 1;

        if line[0] == b'#' {
            if line_no - last_meta_line > 1 || !fam.rows.is_empty() {
                fam.offsets.push(line_no - last_meta_line - 1);
            }
            last_meta_line = line_no;
            if let Some(v) = gf_value(&line, b"ID") {
                fam.id = v;
            } else if let Some(v) = gf_value(&line, b"AC") {
                fam.ac = v;
            }
            fam.meta.push(line);
        } else {
            let (name, row) = split_sequence_line(&line);
            fam.names.push(name);
            fam.rows.push(row);
        }
    }

    if fam.meta.is_empty() && fam.rows.is_empty() {
        Ok(None)
    } else {
        Ok(Some(fam))
    }
}

/// Split `name WS sequence`; the name keeps the whitespace run.
fn split_sequence_line(line: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut name = Vec::new();
    let mut row = Vec::new();
    let mut mode = 0u8; // 0 name, 1 separator, 2 sequence
    for &c in line {
        match mode {
            0 if c == b' ' || c == b'\t' => {
                mode = 1;
                name.push(c);
            }
            1 if c != b' ' && c != b'\t' => {
                mode = 2;
                row.push(c);
            }
            0 | 1 => name.push(c),
            _ => row.push(c),
        }
    }
    (name, row)
}

/// Emit one family, `//` terminator included. Inverse of [`read_family`]
/// for well-formed inputs.
pub fn write_family<W: Write>(
    w: &mut W,
    meta: &[Vec<u8>],
    offsets: &[u32],
    names: &[Vec<u8>],
    rows: &[Vec<u8>],
) -> Result<()> {
    ensure!(
        offsets.len() <= meta.len(),
        "{} interleaving offsets for {} metadata lines",
        offsets.len(),
        meta.len()
    );
    let leading = meta.len() - offsets.len();
    let mut i_meta = leading;
    for line in &meta[..leading] {
        w.write_all(line)?;
        w.write_all(b"\n")?;
    }

    let mut pending = offsets.iter().copied();
    let mut cur = pending.next();

    for (name, row) in names.iter().zip(rows) {
        while cur == Some(0) {
            w.write_all(&meta[i_meta])?;
            w.write_all(b"\n")?;
            i_meta += 1;
            cur = pending.next();
        }
        w.write_all(name)?;
        w.write_all(row)?;
        w.write_all(b"\n")?;
        if let Some(c) = cur.as_mut() {
            *c -= 1;
        }
    }

    while cur == Some(0) {
        w.write_all(&meta[i_meta])?;
        w.write_all(b"\n")?;
        i_meta += 1;
        cur = pending.next();
    }

    w.write_all(b"//\n")?;
    Ok(())
}

/// Emit only the `name sequence` lines, gaps stripped and upcased — a
/// lossy convenience view, no metadata and no terminator.
pub fn write_family_sequences_only<W: Write>(
    w: &mut W,
    names: &[Vec<u8>],
    rows: &[Vec<u8>],
) -> Result<()> {
    for (name, row) in names.iter().zip(rows) {
        w.write_all(name)?;
        w.write_all(&crate::fasta::strip_gaps(row))?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
