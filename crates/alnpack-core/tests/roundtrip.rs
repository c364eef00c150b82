// crates/alnpack-core/tests/roundtrip.rs

//! End-to-end codec round-trips: every alignment must decompress to the
//! exact bytes it was compressed from, for both second-stage variants and
//! across context-class sizes.

use alnpack_core::{MsaCodec, Row, Variant};

fn names_for(rows: &[Row]) -> Vec<Vec<u8>> {
    (0..rows.len())
        .map(|i| format!(">seq{i}").into_bytes())
        .collect()
}

fn roundtrip_fasta(rows: Vec<Row>, variant: Variant) {
    let names = names_for(&rows);
    let codec = MsaCodec::new(variant);
    let (blob, stats) = codec.compress_fasta(&names, &rows).unwrap();
    assert_eq!(stats.seq_bytes + stats.text_bytes, stats.total());

    let (got_names, got_rows) = codec.decompress_fasta(&blob).unwrap();
    assert_eq!(got_names, names);
    assert_eq!(got_rows, rows);
}

/// Deterministic gappy alignment, protein-flavoured.
fn synthetic_alignment(n_rows: usize, n_cols: usize) -> Vec<Row> {
    const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
    (0..n_rows)
        .map(|j| {
            (0..n_cols)
                .map(|i| {
                    let h = (i * 131 + j * 31 + (i / 7) * 17) % 97;
                    if h < 40 {
                        b'-'
                    } else if h < 45 {
                        b'.'
                    } else if h < 50 {
                        // Columns tend to agree, like a real family.
                        RESIDUES[i % RESIDUES.len()]
                    } else {
                        RESIDUES[h % RESIDUES.len()]
                    }
                })
                .collect()
        })
        .collect()
}

#[test]
fn three_row_toy_alignment_both_variants() {
    let rows: Vec<Row> = vec![b"AAA".to_vec(), b"ACA".to_vec(), b"AAA".to_vec()];
    roundtrip_fasta(rows.clone(), Variant::Wfc);
    roundtrip_fasta(rows, Variant::Mtf);
}

#[test]
fn one_by_one_alignment() {
    roundtrip_fasta(vec![b"A".to_vec()], Variant::Wfc);
    roundtrip_fasta(vec![b"A".to_vec()], Variant::Mtf);
}

#[test]
fn empty_alignment() {
    for variant in [Variant::Wfc, Variant::Mtf] {
        let codec = MsaCodec::new(variant);
        let (blob, stats) = codec.compress_fasta(&[], &[]).unwrap();
        assert_eq!(stats.seq_bytes, 0);
        let (names, rows) = codec.decompress_fasta(&blob).unwrap();
        assert!(names.is_empty());
        assert!(rows.is_empty());
    }
}

#[test]
fn zero_width_rows_keep_their_count() {
    let rows: Vec<Row> = vec![Vec::new(); 3];
    roundtrip_fasta(rows, Variant::Wfc);
}

#[test]
fn tiny_class_alignment() {
    // 20 × 60 = 1200 bytes < 10⁴.
    for variant in [Variant::Wfc, Variant::Mtf] {
        roundtrip_fasta(synthetic_alignment(20, 60), variant);
    }
}

#[test]
fn small_class_alignment() {
    // 60 × 400 = 24 000 bytes ≥ 10⁴.
    for variant in [Variant::Wfc, Variant::Mtf] {
        roundtrip_fasta(synthetic_alignment(60, 400), variant);
    }
}

#[test]
fn medium_class_alignment() {
    // 500 × 500 = 250 000 bytes ≥ 2·10⁵.
    roundtrip_fasta(synthetic_alignment(500, 500), Variant::Mtf);
}

#[test]
fn single_column_and_single_row() {
    roundtrip_fasta(synthetic_alignment(40, 1), Variant::Wfc);
    roundtrip_fasta(synthetic_alignment(1, 40), Variant::Wfc);
}

#[test]
fn tall_column_exercises_wfc_history() {
    // One column taller than the first WFC ramp plateaus.
    roundtrip_fasta(synthetic_alignment(3000, 2), Variant::Wfc);
}

#[test]
fn unusual_but_legal_bytes_roundtrip() {
    // Low control bytes and '*' are legal alignment content.
    let rows: Vec<Row> = vec![
        vec![b'A', 0x01, b'*', b'_', b'-'],
        vec![b'C', 0x02, b'*', b'z', b'.'],
    ];
    roundtrip_fasta(rows, Variant::Wfc);
}

#[test]
fn high_bytes_are_fatal() {
    let rows: Vec<Row> = vec![vec![b'A', 0xC3], vec![b'C', 0xA9]];
    let codec = MsaCodec::new(Variant::Wfc);
    assert!(codec.compress_fasta(&names_for(&rows), &rows).is_err());
}

#[test]
fn ragged_rows_are_fatal() {
    let rows: Vec<Row> = vec![b"ACGT".to_vec(), b"ACG".to_vec()];
    let codec = MsaCodec::new(Variant::Wfc);
    assert!(codec.compress_fasta(&names_for(&rows), &rows).is_err());
}

#[test]
fn stockholm_parts_roundtrip() {
    let meta = vec![
        b"# STOCKHOLM 1.0".to_vec(),
        b"#=GF ID FOO".to_vec(),
        b"#=GF AC BAR.1".to_vec(),
        b"#=GC seq_cons  AAxA".to_vec(),
    ];
    let names = vec![b"seqA ".to_vec(), b"seqB ".to_vec()];
    let rows: Vec<Row> = vec![b"AA-A".to_vec(), b"AAAA".to_vec()];
    let offsets = vec![2u32];

    for variant in [Variant::Wfc, Variant::Mtf] {
        let codec = MsaCodec::new(variant);
        let (blob, _) = codec
            .compress_stockholm(&meta, &offsets, &names, &rows)
            .unwrap();
        let parts = codec.decompress_stockholm(&blob).unwrap();
        assert_eq!(parts.meta, meta);
        assert_eq!(parts.offsets, offsets);
        assert_eq!(parts.names, names);
        assert_eq!(parts.rows, rows);
    }
}

#[test]
fn stockholm_family_without_sequences() {
    let meta = vec![b"#=GF ID EMPTY".to_vec(), b"#=GF AC E.1".to_vec()];
    let codec = MsaCodec::new(Variant::Wfc);
    let (blob, _) = codec.compress_stockholm(&meta, &[], &[], &[]).unwrap();
    let parts = codec.decompress_stockholm(&blob).unwrap();
    assert_eq!(parts.meta, meta);
    assert!(parts.rows.is_empty());
    assert!(parts.names.is_empty());
    assert!(parts.offsets.is_empty());
}

#[test]
fn variants_decode_by_blob_flag_not_codec_config() {
    // A blob written by the fast variant must decompress correctly through
    // a codec constructed for the other variant.
    let rows = synthetic_alignment(10, 50);
    let names = names_for(&rows);
    let (blob, _) = MsaCodec::new(Variant::Mtf)
        .compress_fasta(&names, &rows)
        .unwrap();
    let (_, got_rows) = MsaCodec::new(Variant::Wfc).decompress_fasta(&blob).unwrap();
    assert_eq!(got_rows, rows);
}

#[test]
fn truncated_blob_is_an_error() {
    let rows = synthetic_alignment(8, 30);
    let names = names_for(&rows);
    let codec = MsaCodec::new(Variant::Wfc);
    let (blob, _) = codec.compress_fasta(&names, &rows).unwrap();
    assert!(codec.decompress_fasta(&blob[..blob.len() / 2]).is_err());
}
