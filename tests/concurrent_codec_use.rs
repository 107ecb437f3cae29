//! Concurrent Codec Use Tests
//!
//! The shared codec instances are plain immutable statics. Many threads use
//! them at once, each with its own stream, and every thread sees exactly what
//! it would see alone.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use schema_codec::codec::TypeCodec;
use schema_codec::schema::{Column, ColumnPosition, ColumnWithPosition, DataType};
use schema_codec::serializer::{COLUMN_CODEC, COLUMN_WITH_POSITION_CODEC};

const THREADS: usize = 8;
const ITERATIONS: usize = 500;

fn record_for(thread: usize, i: usize) -> ColumnWithPosition {
    let add = if i % 2 == 0 {
        Column::physical_column(format!("c_{}_{}", thread, i), DataType::decimal(10, (i % 10) as i32))
    } else {
        Column::metadata_column_with_key(format!("m_{}_{}", thread, i), DataType::string(), "op_ts")
    };
    match i % 4 {
        0 => ColumnWithPosition::first(add),
        1 => ColumnWithPosition::last(add),
        2 => ColumnWithPosition::before(add, Column::physical_column("id", DataType::int())),
        _ => ColumnWithPosition::after(add, Column::physical_column("id", DataType::int())),
    }
}

// =============================================================================
// Shared Static Tests
// =============================================================================

#[test]
fn test_static_codecs_shared_across_threads() {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let record = record_for(t, i);
                    let mut buf = Vec::new();
                    COLUMN_WITH_POSITION_CODEC.encode(&record, &mut buf).unwrap();
                    let decoded = COLUMN_WITH_POSITION_CODEC
                        .decode(&mut Cursor::new(buf))
                        .unwrap();
                    assert_eq!(decoded, record);

                    let copy = COLUMN_WITH_POSITION_CODEC.deep_copy(&record);
                    assert_eq!(copy, record);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Bytes produced concurrently match bytes produced by a single thread.
#[test]
fn test_concurrent_encoding_is_deterministic() {
    let expected: Vec<Vec<u8>> = (0..ITERATIONS)
        .map(|i| {
            let mut buf = Vec::new();
            COLUMN_WITH_POSITION_CODEC
                .encode(&record_for(0, i), &mut buf)
                .unwrap();
            buf
        })
        .collect();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for (i, bytes) in expected.iter().enumerate() {
                    let mut buf = Vec::new();
                    COLUMN_WITH_POSITION_CODEC
                        .encode(&record_for(0, i), &mut buf)
                        .unwrap();
                    assert_eq!(&buf, bytes);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Copies made on other threads never alias the shared original.
#[test]
fn test_deep_copies_isolated_across_threads() {
    let original = Arc::new(Column::physical_column_with_comment(
        "id",
        DataType::bigint(),
        "primary key",
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let original = Arc::clone(&original);
            thread::spawn(move || {
                let mut copy = COLUMN_CODEC.deep_copy(&original);
                copy.set_name(format!("renamed_{}", t));
                copy.set_comment(None);
                copy
            })
        })
        .collect();

    for handle in handles {
        let copy = handle.join().unwrap();
        assert!(copy.name().starts_with("renamed_"));
    }
    assert_eq!(original.name(), "id");
    assert_eq!(original.comment(), Some("primary key"));
}

#[test]
fn test_failed_decode_does_not_affect_other_threads() {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let record = ColumnWithPosition::with_position(
                        Column::physical_column("c", DataType::int()),
                        ColumnPosition::Last,
                        None,
                    );
                    let mut buf = Vec::new();
                    COLUMN_WITH_POSITION_CODEC.encode(&record, &mut buf).unwrap();
                    if (t + i) % 3 == 0 {
                        buf[3] = 7;
                        assert!(COLUMN_WITH_POSITION_CODEC
                            .decode(&mut Cursor::new(buf))
                            .is_err());
                    } else {
                        assert_eq!(
                            COLUMN_WITH_POSITION_CODEC
                                .decode(&mut Cursor::new(buf))
                                .unwrap(),
                            record
                        );
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
