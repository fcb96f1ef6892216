use std::fs::{File, read_to_string};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::ReferenceSequence;
use noodles::sam::header::record::value::map::header::tag::SORT_ORDER;
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{TempDir, tempdir};

use amulet_counter::consts::{OVERLAP_SUMMARY_FILE, OVERLAPS_FILE, STAT_SUMMARY_FILE};
use amulet_counter::report::{OVERLAP_SUMMARY_HEADER, OVERLAPS_HEADER};
use amulet_counter::{CounterError, CounterInputs, OverlapConfig, count_bam_overlaps};

const READ_LENGTH: usize = 10;

fn header(sort_order: &str) -> sam::Header {
    let hd = Map::<sam::header::record::value::map::Header>::builder()
        .insert(SORT_ORDER, sort_order)
        .build()
        .unwrap();

    sam::Header::builder()
        .set_header(hd)
        .add_reference_sequence(
            "chr1",
            Map::<ReferenceSequence>::new(NonZeroUsize::new(10_000).unwrap()),
        )
        .add_reference_sequence(
            "chrM",
            Map::<ReferenceSequence>::new(NonZeroUsize::new(16_569).unwrap()),
        )
        .build()
}

/// A read pair mate on `reference_id`, with its mate on the same reference.
fn read(
    reference_id: usize,
    start: usize,
    template_length: i32,
    mapq: u8,
    flags: Flags,
    barcode: Option<&str>,
) -> RecordBuf {
    let mut record = RecordBuf::builder()
        .set_flags(flags)
        .set_reference_sequence_id(reference_id)
        .set_alignment_start(Position::try_from(start).unwrap())
        .set_mapping_quality(MappingQuality::new(mapq).unwrap())
        .set_cigar(Cigar::from(vec![Op::new(Kind::Match, READ_LENGTH)]))
        .set_sequence(Sequence::from(b"ACGTACGTAC".to_vec()))
        .set_mate_reference_sequence_id(reference_id)
        .set_mate_alignment_start(Position::try_from(start).unwrap())
        .set_template_length(template_length)
        .build();

    if let Some(barcode) = barcode {
        record
            .data_mut()
            .insert(Tag::from([b'C', b'B']), Value::from(barcode));
    }
    record
}

fn write_bam(path: &Path, header: &sam::Header, records: &[RecordBuf]) {
    let mut writer = bam::io::Writer::new(File::create(path).unwrap());
    writer.write_header(header).unwrap();
    for record in records {
        writer.write_alignment_record(header, record).unwrap();
    }
    writer.into_inner().try_finish().unwrap();
}

fn paired() -> Flags {
    Flags::SEGMENTED | Flags::PROPERLY_SEGMENTED
}

fn records() -> Vec<RecordBuf> {
    vec![
        read(0, 10, 11, 40, paired(), Some("AAAC-1")),
        read(0, 15, 11, 50, paired(), Some("AAAC-1")),
        read(0, 18, 13, 60, paired(), Some("AAAC-1")),
        read(0, 20, -11, 60, paired() | Flags::REVERSE_COMPLEMENTED, Some("AAAC-1")),
        read(0, 40, 50, 10, paired(), Some("AAAT-1")),
        read(0, 60, 50, 60, paired() | Flags::DUPLICATE, Some("AAAT-1")),
        read(0, 80, 50, 60, paired(), None),
        read(1, 100, 50, 60, paired(), Some("AAAT-1")),
    ]
}

fn inputs(dir: &Path) -> CounterInputs {
    let barcodes = dir.join("singlecell.csv");
    let mut file = File::create(&barcodes).unwrap();
    writeln!(file, "AAAC-1,_cell_0,1").unwrap();
    writeln!(file, "AAAT-1,_cell_1,1").unwrap();

    let chromosomes = dir.join("chromosomes.txt");
    let mut file = File::create(&chromosomes).unwrap();
    writeln!(file, "chr1").unwrap();

    CounterInputs {
        barcodes,
        chromosomes,
        outdir: dir.join("out"),
    }
}

#[fixture]
fn config() -> OverlapConfig {
    OverlapConfig {
        barcode_col: 0,
        cellid_col: 1,
        iscell_col: 2,
        ..OverlapConfig::default()
    }
}

#[fixture]
fn workdir() -> TempDir {
    tempdir().unwrap()
}

fn sorted_bam(dir: &Path) -> PathBuf {
    let path = dir.join("possorted.bam");
    write_bam(&path, &header("coordinate"), &records());
    path
}

#[rstest]
fn test_bam_run(workdir: TempDir, config: OverlapConfig) {
    let bam = sorted_bam(workdir.path());
    let inputs = inputs(workdir.path());

    let summary = count_bam_overlaps(&bam, &inputs, &config).unwrap();
    assert_eq!(summary.records, 8);
    assert_eq!(summary.valid, 3);
    assert_eq!(summary.overlaps, 1);

    let overlaps = read_to_string(inputs.outdir.join(OVERLAPS_FILE)).unwrap();
    assert_eq!(
        overlaps,
        format!("{OVERLAPS_HEADER}\nchr1\t18\t20\t_cell_0\t3\t3\t50.0\t40\t60\t10,15,18,\t20,25,30,\n")
    );

    let summary = read_to_string(inputs.outdir.join(OVERLAP_SUMMARY_FILE)).unwrap();
    assert_eq!(
        summary,
        format!("{OVERLAP_SUMMARY_HEADER}\n_cell_0\t3\t1\tAAAC-1\t4\n_cell_1\t0\t0\tAAAT-1\t3\n")
    );

    let stats = read_to_string(inputs.outdir.join(STAT_SUMMARY_FILE)).unwrap();
    let stats: Vec<&str> = stats.lines().collect();
    assert_eq!(stats[0], "Total Reads:\t8");
    assert_eq!(stats[1], "Positive Strand Reads:\t7");
    assert_eq!(stats[2], "Negative Strand Reads:\t1");
    assert!(stats.contains(&"Skipped Negative Strand Reads:\t1"));
    assert!(stats.contains(&"Duplicate Reads:\t1"));
    assert!(stats.contains(&"Low Mapping Quality Reads (<=30):\t1"));
    assert!(stats.contains(&"Missing Barcode Reads:\t1"));
    assert!(stats.contains(&"Excluded Chromosome Reads:\t1"));
    assert!(stats.contains(&"Valid Reads:\t3"));
    assert!(stats.contains(&"Mean Read Length:\t10.0"));
}

#[rstest]
fn test_unsorted_header_is_rejected(workdir: TempDir, config: OverlapConfig) {
    let bam = workdir.path().join("queryname.bam");
    write_bam(&bam, &header("queryname"), &records());
    let inputs = inputs(workdir.path());

    let result = count_bam_overlaps(&bam, &inputs, &config);
    match result {
        Err(CounterError::UnsortedHeader(so)) => assert_eq!(so, "queryname"),
        other => panic!("expected an unsorted header error, got {other:?}"),
    }
}

#[rstest]
fn test_forced_sort_order_trusts_the_file(workdir: TempDir, config: OverlapConfig) {
    let bam = workdir.path().join("unknown.bam");
    write_bam(&bam, &header("unknown"), &records());
    let inputs = inputs(workdir.path());

    let config = OverlapConfig {
        force_sorted: true,
        ..config
    };
    let summary = count_bam_overlaps(&bam, &inputs, &config).unwrap();
    assert_eq!(summary.valid, 3);
    assert_eq!(summary.overlaps, 1);
}

#[rstest]
fn test_custom_barcode_tag(workdir: TempDir, config: OverlapConfig) {
    let bam = sorted_bam(workdir.path());
    let inputs = inputs(workdir.path());

    let config = OverlapConfig {
        barcode_tag: "XC".to_string(),
        ..config
    };
    let summary = count_bam_overlaps(&bam, &inputs, &config).unwrap();
    assert_eq!(summary.valid, 0);

    let stats = read_to_string(inputs.outdir.join(STAT_SUMMARY_FILE)).unwrap();
    assert!(stats.lines().any(|line| line == "Missing Barcode Reads:\t4"));
}
