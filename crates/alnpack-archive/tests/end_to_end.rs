// crates/alnpack-archive/tests/end_to_end.rs

//! Stockholm → codec → archive → extract, end to end: the archive index
//! must list every family in compression order, and extraction by
//! identifier must reproduce the source family byte for byte.

use alnpack_archive::{ArchiveReader, ArchiveWriter, FamilyDescriptor};
use alnpack_core::{MsaCodec, Variant};
use alnpack_formats::stockholm;

const THREE_FAMILIES: &[u8] = b"# STOCKHOLM 1.0\n\
    #=GF ID FAM_A\n\
    #=GF AC AA.1\n\
    seqA1 AC-GT\n\
    seqA2 ACCGT\n\
    //\n\
    #=GF ID FAM_B\n\
    #=GF AC BB.2\n\
    seqB1 ----\n\
    #=GC RF  xxxx\n\
    //\n\
    #=GF ID FAM_C\n\
    #=GF AC CC.3\n\
    seqC1 MKV\n\
    seqC2 MKI\n\
    seqC3 MRV\n\
    //\n";

fn build_archive(path: &std::path::Path, variant: Variant) {
    let codec = MsaCodec::new(variant);
    let mut writer = ArchiveWriter::create(path).unwrap();

    let mut src = THREE_FAMILIES;
    while let Some(fam) = stockholm::read_family(&mut src).unwrap() {
        let (blob, stats) = codec
            .compress_stockholm(&fam.meta, &fam.offsets, &fam.names, &fam.rows)
            .unwrap();
        writer
            .append(
                FamilyDescriptor {
                    n_sequences: fam.rows.len() as u64,
                    n_columns: fam.rows.first().map_or(0, Vec::len) as u64,
                    raw_size: 0,
                    compressed_size: stats.total() as u64,
                    data_ptr: 0,
                    id: fam.id,
                    ac: fam.ac,
                },
                &blob,
            )
            .unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn archive_lists_families_in_compression_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pfam.apk");
    build_archive(&path, Variant::Wfc);

    let reader = ArchiveReader::open(&path).unwrap();
    let ds = reader.descriptors();
    assert_eq!(ds.len(), 3);
    assert_eq!(
        ds.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
        vec!["FAM_A", "FAM_B", "FAM_C"]
    );
    assert_eq!(
        ds.iter().map(|d| d.ac.as_str()).collect::<Vec<_>>(),
        vec!["AA.1", "BB.2", "CC.3"]
    );
    assert_eq!(ds[0].n_sequences, 2);
    assert_eq!(ds[0].n_columns, 5);
    assert_eq!(ds[2].n_sequences, 3);
    assert_eq!(ds[2].n_columns, 3);
}

#[test]
fn sequential_decompression_reproduces_the_source_file() {
    for variant in [Variant::Wfc, Variant::Mtf] {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pfam.apk");
        build_archive(&path, variant);

        let codec = MsaCodec::default();
        let mut reader = ArchiveReader::open(&path).unwrap();
        let mut out = Vec::new();
        while let Some(blob) = reader.read_next().unwrap() {
            let parts = codec.decompress_stockholm(&blob).unwrap();
            stockholm::write_family(&mut out, &parts.meta, &parts.offsets, &parts.names, &parts.rows)
                .unwrap();
        }
        assert_eq!(out, THREE_FAMILIES.to_vec());
    }
}

#[test]
fn extraction_by_accession_yields_exactly_that_family() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pfam.apk");
    build_archive(&path, Variant::Wfc);

    let codec = MsaCodec::default();
    let mut reader = ArchiveReader::open(&path).unwrap();
    let desc = reader
        .descriptors()
        .iter()
        .find(|d| d.ac == "BB.2")
        .cloned()
        .unwrap();

    let blob = reader.read_family(&desc).unwrap();
    let parts = codec.decompress_stockholm(&blob).unwrap();
    let mut out = Vec::new();
    stockholm::write_family(&mut out, &parts.meta, &parts.offsets, &parts.names, &parts.rows)
        .unwrap();

    let expected = b"#=GF ID FAM_B\n\
        #=GF AC BB.2\n\
        seqB1 ----\n\
        #=GC RF  xxxx\n\
        //\n";
    assert_eq!(out, expected.to_vec());
}
