use std::fs;
use std::path::Path;
use std::sync::Arc;

use courier_codec::DecodeError;
use courier_model::{
    DescriptorProvider, Field, Message, MessageVariant, Requirement, StructDescriptor,
    TypeDescriptor, Value,
};

use crate::error::StoreError;
use crate::reader::{RecordReader, probe};
use crate::writer::RecordWriter;
use crate::FILE_MAGIC;

fn point_struct() -> Arc<StructDescriptor> {
    StructDescriptor::new(
        "test",
        "Point",
        MessageVariant::Struct,
        vec![
            Field::new(
                1,
                "x",
                Requirement::Required,
                DescriptorProvider::fixed(TypeDescriptor::I32),
                None,
            ),
            Field::new(
                2,
                "y",
                Requirement::Required,
                DescriptorProvider::fixed(TypeDescriptor::I32),
                None,
            ),
        ],
    )
    .expect("valid struct")
}

fn point(x: i32, y: i32) -> Message {
    let mut builder = point_struct().builder();
    builder.set(1, Value::I32(x)).unwrap();
    builder.set(2, Value::I32(y)).unwrap();
    builder.build().unwrap()
}

/// Write `count` distinct points, returning the per-record on-disk sizes.
fn write_points(path: &Path, count: i32) -> Vec<usize> {
    let writer = RecordWriter::create(path).unwrap();
    let sizes = (0..count)
        .map(|i| writer.append(&point(i, -i)).unwrap())
        .collect();
    writer.close().unwrap();
    sizes
}

#[test]
fn written_records_read_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    write_points(&path, 5);

    let descriptor = point_struct();
    let reader = RecordReader::open(&path).unwrap();
    for i in 0..5 {
        let message = reader.read_next(&descriptor).unwrap().unwrap();
        assert_eq!(message, point(i, -i));
    }
    assert!(reader.read_next(&descriptor).unwrap().is_none());
    // Clean end is sticky.
    assert!(reader.read_next(&descriptor).unwrap().is_none());
}

#[test]
fn append_reports_on_disk_record_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    let sizes = write_points(&path, 3);

    let expected = FILE_MAGIC.len() + sizes.iter().sum::<usize>();
    assert_eq!(fs::metadata(&path).unwrap().len() as usize, expected);
}

#[test]
fn empty_store_reads_as_end_of_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.crs");
    write_points(&path, 0);

    let reader = RecordReader::open(&path).unwrap();
    assert!(reader.read_next(&point_struct()).unwrap().is_none());
}

#[test]
fn append_after_close_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    let writer = RecordWriter::create(&path).unwrap();
    writer.close().unwrap();
    let err = writer.append(&point(1, 2)).unwrap_err();
    assert!(matches!(err, StoreError::Closed));
    // Closing again stays a no-op.
    writer.close().unwrap();
}

#[test]
fn file_without_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alien.bin");
    fs::write(&path, b"definitely not a record store").unwrap();

    let reader = RecordReader::open(&path).unwrap();
    let err = reader.read_next(&point_struct()).unwrap_err();
    assert!(matches!(err, StoreError::BadFileMagic));
    // The failure closed the reader.
    assert!(reader.read_next(&point_struct()).unwrap().is_none());
}

#[test]
fn flipped_payload_byte_is_a_digest_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    write_points(&path, 1);

    // Flip one bit inside the x value: still decodes, digest disagrees.
    let mut bytes = fs::read(&path).unwrap();
    let value_offset = FILE_MAGIC.len() + 4 + 1 + 2;
    bytes[value_offset] ^= 0x40;
    fs::write(&path, &bytes).unwrap();

    let reader = RecordReader::open(&path).unwrap();
    let err = reader.read_next(&point_struct()).unwrap_err();
    assert!(matches!(err, StoreError::DigestMismatch { .. }));
    assert!(reader.read_next(&point_struct()).unwrap().is_none());
}

#[test]
fn corrupted_start_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    write_points(&path, 1);

    let mut bytes = fs::read(&path).unwrap();
    bytes[FILE_MAGIC.len()] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    let reader = RecordReader::open(&path).unwrap();
    let err = reader.read_next(&point_struct()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::BadRecordMagic { boundary: "start" }
    ));
}

#[test]
fn truncation_inside_a_record_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    let sizes = write_points(&path, 2);

    // Cut in the middle of the second record's message bytes.
    let bytes = fs::read(&path).unwrap();
    let cut = FILE_MAGIC.len() + sizes[0] + 4 + 3;
    fs::write(&path, &bytes[..cut]).unwrap();

    let descriptor = point_struct();
    let reader = RecordReader::open(&path).unwrap();
    assert!(reader.read_next(&descriptor).unwrap().is_some());
    let err = reader.read_next(&descriptor).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Decode(DecodeError::Truncated { .. })
    ));
    assert!(reader.read_next(&descriptor).unwrap().is_none());
}

#[test]
fn truncation_at_a_record_boundary_is_a_clean_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    let sizes = write_points(&path, 3);

    let bytes = fs::read(&path).unwrap();
    let cut = FILE_MAGIC.len() + sizes[0] + sizes[1];
    fs::write(&path, &bytes[..cut]).unwrap();

    let descriptor = point_struct();
    let reader = RecordReader::open(&path).unwrap();
    assert!(reader.read_next(&descriptor).unwrap().is_some());
    assert!(reader.read_next(&descriptor).unwrap().is_some());
    assert!(reader.read_next(&descriptor).unwrap().is_none());
}

#[test]
fn close_stops_further_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.crs");
    write_points(&path, 2);

    let reader = RecordReader::open(&path).unwrap();
    assert!(reader.read_next(&point_struct()).unwrap().is_some());
    reader.close();
    assert!(reader.read_next(&point_struct()).unwrap().is_none());
}

#[test]
fn probe_distinguishes_stores_from_other_files() {
    let dir = tempfile::tempdir().unwrap();

    let store = dir.path().join("points.crs");
    write_points(&store, 1);
    assert!(probe(&store).unwrap());

    let empty = dir.path().join("empty");
    fs::write(&empty, b"").unwrap();
    assert!(!probe(&empty).unwrap());

    let short = dir.path().join("short");
    fs::write(&short, &FILE_MAGIC[..3]).unwrap();
    assert!(!probe(&short).unwrap());

    let alien = dir.path().join("alien");
    fs::write(&alien, b"PK\x03\x04 something else").unwrap();
    assert!(!probe(&alien).unwrap());

    assert!(probe(dir.path().join("missing")).is_err());
}
