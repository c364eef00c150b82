// crates/alnpack-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use alnpack_archive::{ArchiveReader, ArchiveWriter, FamilyDescriptor};
use alnpack_core::{MsaCodec, Variant};
use alnpack_formats::io::CountingReader;
use alnpack_formats::{fasta, stockholm};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "alnpack",
    about = "Multiple-sequence-alignment compressor",
    long_about = "Multiple-sequence-alignment compressor.\n\nCompresses FASTA alignments and multi-family Stockholm files into\nself-contained archives with a random-access family index.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress a FASTA alignment
    #[command(name = "Fc")]
    FastaCompress {
        /// Input FASTA file (`.gz` is read transparently)
        input: PathBuf,
        /// Output compressed file
        output: PathBuf,
        /// Fast variant: MTF-1 in place of WFC
        #[arg(short = 'f')]
        fast: bool,
    },

    /// Decompress a FASTA alignment
    #[command(name = "Fd")]
    FastaDecompress {
        /// Input compressed file
        input: PathBuf,
        /// Output FASTA file
        output: PathBuf,
        /// Wrap sequences to this width (0 = no wrapping)
        #[arg(short = 'w', default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=100_000_000))]
        wrap: u32,
        /// Strip gaps and emit uppercase letters only
        #[arg(long = "es")]
        seq_only: bool,
    },

    /// Compress one or more Stockholm files into an archive
    #[command(name = "Sc")]
    StockholmCompress {
        /// Input Stockholm file, or `@list` with one path per line
        input: String,
        /// Output archive
        output: PathBuf,
        /// Fast variant: MTF-1 in place of WFC
        #[arg(short = 'f')]
        fast: bool,
    },

    /// Decompress an archive back to one Stockholm file
    #[command(name = "Sd")]
    StockholmDecompress {
        /// Input archive
        input: PathBuf,
        /// Output Stockholm file
        output: PathBuf,
        /// Emit gap-stripped sequence lines only
        #[arg(long = "es")]
        seq_only: bool,
    },

    /// Extract families from an archive by identifier
    #[command(name = "Se")]
    StockholmExtract {
        /// Input archive
        input: PathBuf,
        /// Output Stockholm file
        output: PathBuf,
        /// Extract the family with this `#=GF ID`
        #[arg(long = "eID", value_name = "ID")]
        id: Option<String>,
        /// Extract the family with this `#=GF AC`
        #[arg(long = "eAC", value_name = "AC")]
        ac: Option<String>,
        /// Emit gap-stripped sequence lines only
        #[arg(long = "es")]
        seq_only: bool,
    },

    /// List the families of an archive
    #[command(name = "Sl")]
    StockholmList {
        /// Input archive
        input: PathBuf,
        /// Emit the descriptor list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::FastaCompress {
            input,
            output,
            fast,
        } => fasta_compress(&input, &output, fast),

        Cmd::FastaDecompress {
            input,
            output,
            wrap,
            seq_only,
        } => fasta_decompress(&input, &output, wrap as usize, seq_only),

        Cmd::StockholmCompress {
            input,
            output,
            fast,
        } => stockholm_compress(&input, &output, fast),

        Cmd::StockholmDecompress {
            input,
            output,
            seq_only,
        } => stockholm_decompress(&input, &output, seq_only),

        Cmd::StockholmExtract {
            input,
            output,
            id,
            ac,
            seq_only,
        } => stockholm_extract(&input, &output, id.as_deref(), ac.as_deref(), seq_only),

        Cmd::StockholmList { input, json } => stockholm_list(&input, json),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn variant_for(fast: bool) -> Variant {
    if fast {
        Variant::Mtf
    } else {
        Variant::Wfc
    }
}

fn fasta_compress(input: &Path, output: &Path, fast: bool) -> Result<()> {
    info!(input=%input.display(), output=%output.display(), fast, "compressing FASTA");

    let content = fasta::read_file(input)?;
    let codec = MsaCodec::new(variant_for(fast));
    let (blob, stats) = codec
        .compress_fasta(&content.names, &content.rows)
        .with_context(|| format!("compressing {}", input.display()))?;
    std::fs::write(output, &blob).with_context(|| format!("write {}", output.display()))?;

    println!("Sequences compressed to: {} bytes", stats.seq_bytes);
    println!("Names compressed to    : {} bytes", stats.text_bytes);
    println!("Total size             : {} bytes", stats.total());
    Ok(())
}

fn fasta_decompress(input: &Path, output: &Path, wrap: usize, seq_only: bool) -> Result<()> {
    info!(input=%input.display(), output=%output.display(), wrap, "decompressing FASTA");

    let blob = std::fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let codec = MsaCodec::default();
    let (names, rows) = codec
        .decompress_fasta(&blob)
        .with_context(|| format!("decompressing {}", input.display()))?;
    fasta::write_file(output, &names, &rows, wrap, seq_only)?;

    println!("Decompressed {} sequences → {}", rows.len(), output.display());
    Ok(())
}

/// Expand a positional input that may be a `@listfile` of Stockholm paths.
fn expand_inputs(input: &str) -> Result<Vec<PathBuf>> {
    if let Some(list) = input.strip_prefix('@') {
        let content =
            std::fs::read_to_string(list).with_context(|| format!("read input list {list}"))?;
        let paths: Vec<PathBuf> = content.split_whitespace().map(PathBuf::from).collect();
        anyhow::ensure!(!paths.is_empty(), "input list {list} is empty");
        Ok(paths)
    } else {
        Ok(vec![PathBuf::from(input)])
    }
}

fn stockholm_compress(input: &str, output: &Path, fast: bool) -> Result<()> {
    let inputs = expand_inputs(input)?;
    let codec = MsaCodec::new(variant_for(fast));
    let mut writer = ArchiveWriter::create(output)?;

    let mut n_families = 0u64;
    let mut total_text = 0usize;
    let mut total_seq = 0usize;

    for path in &inputs {
        info!(input=%path.display(), "compressing Stockholm file");
        let mut reader = CountingReader::new(alnpack_formats::io::open_input(path)?);

        loop {
            let before = reader.position();
            let Some(fam) = stockholm::read_family(&mut reader)
                .with_context(|| format!("parse {}", path.display()))?
            else {
                break;
            };
            let raw_size = reader.position() - before;

            let (blob, stats) = codec
                .compress_stockholm(&fam.meta, &fam.offsets, &fam.names, &fam.rows)
                .with_context(|| format!("compressing family {} of {}", fam.id, path.display()))?;

            writer.append(
                FamilyDescriptor {
                    n_sequences: fam.rows.len() as u64,
                    n_columns: fam.rows.first().map_or(0, Vec::len) as u64,
                    raw_size,
                    compressed_size: stats.total() as u64,
                    data_ptr: 0,
                    id: fam.id.clone(),
                    ac: fam.ac.clone(),
                },
                &blob,
            )?;

            n_families += 1;
            total_text += stats.text_bytes;
            total_seq += stats.seq_bytes;
            info!(
                family = %fam.id,
                raw = raw_size,
                compressed = stats.total(),
                "family compressed"
            );
        }
    }

    writer.finish()?;

    println!("Families               : {n_families}");
    println!("Total size of metadata : {total_text} B");
    println!("Total size of alignment: {total_seq} B");
    Ok(())
}

fn stockholm_decompress(input: &Path, output: &Path, seq_only: bool) -> Result<()> {
    info!(input=%input.display(), output=%output.display(), "decompressing archive");

    let mut reader = ArchiveReader::open(input)?;
    let codec = MsaCodec::default();
    let f = File::create(output).with_context(|| format!("create {}", output.display()))?;
    let mut w = BufWriter::new(f);

    let mut n_families = 0u64;
    while let Some(blob) = reader.read_next()? {
        let parts = codec.decompress_stockholm(&blob)?;
        emit_family(&mut w, &parts, seq_only)?;
        n_families += 1;
    }
    w.flush().context("flush Stockholm output")?;

    println!("Decompressed {n_families} families → {}", output.display());
    Ok(())
}

fn stockholm_extract(
    input: &Path,
    output: &Path,
    id: Option<&str>,
    ac: Option<&str>,
    seq_only: bool,
) -> Result<()> {
    info!(input=%input.display(), output=%output.display(), ?id, ?ac, "extracting families");

    let mut reader = ArchiveReader::open(input)?;
    let codec = MsaCodec::default();
    let f = File::create(output).with_context(|| format!("create {}", output.display()))?;
    let mut w = BufWriter::new(f);

    let wanted: Vec<FamilyDescriptor> = reader
        .descriptors()
        .iter()
        .filter(|d| id.map_or(true, |x| d.id == x) && ac.map_or(true, |x| d.ac == x))
        .cloned()
        .collect();

    let mut n_families = 0u64;
    for desc in &wanted {
        let blob = reader.read_family(desc)?;
        let parts = codec
            .decompress_stockholm(&blob)
            .with_context(|| format!("decompressing family {}", desc.id))?;
        emit_family(&mut w, &parts, seq_only)?;
        n_families += 1;
    }
    w.flush().context("flush Stockholm output")?;

    println!("Extracted {n_families} families → {}", output.display());
    Ok(())
}

fn emit_family<W: Write>(
    w: &mut W,
    parts: &alnpack_core::StockholmParts,
    seq_only: bool,
) -> Result<()> {
    if seq_only {
        stockholm::write_family_sequences_only(w, &parts.names, &parts.rows)
    } else {
        stockholm::write_family(w, &parts.meta, &parts.offsets, &parts.names, &parts.rows)
    }
}

fn stockholm_list(input: &Path, json: bool) -> Result<()> {
    let reader = ArchiveReader::open(input)?;
    let descriptors = reader.descriptors();

    if json {
        println!("{}", serde_json::to_string_pretty(descriptors)?);
        return Ok(());
    }

    println!("ID\t AC\t no. sequences\t no. columns\t uncompressed size\t compressed size");
    for d in descriptors {
        println!(
            "{}\t {}\t {}\t {}\t {}\t {}",
            d.id, d.ac, d.n_sequences, d.n_columns, d.raw_size, d.compressed_size
        );
    }
    Ok(())
}
