// crates/alnpack-formats/src/io.rs

//! Buffered input plumbing: transparent `.gz` decompression, blank-line
//! skipping reads, and byte-position tracking for raw-size accounting.

use anyhow::{Context, Result};
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Open `path` for buffered reading; a `.gz` suffix selects gzip
/// decompression transparently.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let is_gz = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(
            BufReader::new(f),
        ))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Next non-empty line with the trailing `\r?\n` stripped, or `None` at
/// end of input. Blank lines are skipped, never returned.
pub fn read_line_nonempty<R: BufRead + ?Sized>(r: &mut R) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = r
            .read_until(b'\n', &mut line)
            .context("read input line")?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        if !line.is_empty() {
            return Ok(Some(line));
        }
    }
}

/// `BufRead` adapter counting consumed bytes, so callers can attribute a
/// byte span of the source file to each parsed family.
pub struct CountingReader<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> CountingReader<R> {
    /// Wrap `inner`, starting the count at zero.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl<R: BufRead> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingReader<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.pos += amt as u64;
        self.inner.consume(amt);
    }
}
