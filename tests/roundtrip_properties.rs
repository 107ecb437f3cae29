//! Codec Property Tests
//!
//! Properties checked over generated columns and records:
//! - decode(encode(v)) == v for every variant, with and without anchors
//! - mutating a deep copy never changes the original
//! - transcode produces exactly the bytes of encode(decode(source))
//! - checkpoints restore the values they were written with

use std::io::Cursor;

use proptest::prelude::*;

use schema_codec::checkpoint::{read_checkpoint, write_checkpoint};
use schema_codec::codec::{OrdinalEnum, TypeCodec};
use schema_codec::schema::{Column, ColumnPosition, ColumnWithPosition, DataType, TypeRoot};
use schema_codec::serializer::{COLUMN_CODEC, COLUMN_WITH_POSITION_CODEC};

// =============================================================================
// Generators
// =============================================================================

fn data_types() -> impl Strategy<Value = DataType> {
    (0..TypeRoot::MEMBERS.len(), any::<bool>())
        .prop_flat_map(|(idx, nullable)| {
            let root = TypeRoot::MEMBERS[idx];
            prop::collection::vec(any::<i32>(), root.parameter_count())
                .prop_map(move |params| (root, nullable, params))
        })
        .prop_map(|(root, nullable, params)| {
            DataType::from_parts(root, nullable, params).expect("parameter count matches root")
        })
}

fn text() -> impl Strategy<Value = String> {
    "\\PC{0,24}"
}

fn columns() -> impl Strategy<Value = Column> {
    let physical = (text(), data_types(), prop::option::of(text())).prop_map(
        |(name, data_type, comment)| {
            let mut column = Column::physical_column(name, data_type);
            column.set_comment(comment);
            column
        },
    );
    let metadata = (
        text(),
        data_types(),
        prop::option::of(text()),
        prop::option::of(text()),
    )
        .prop_map(|(name, data_type, key, comment)| {
            let mut column = match key {
                Some(key) => Column::metadata_column_with_key(name, data_type, key),
                None => Column::metadata_column(name, data_type),
            };
            column.set_comment(comment);
            column
        });
    prop_oneof![physical, metadata]
}

fn records() -> impl Strategy<Value = ColumnWithPosition> {
    (
        columns(),
        prop::sample::select(ColumnPosition::MEMBERS.to_vec()),
        prop::option::of(columns()),
    )
        .prop_map(|(add, position, anchor)| ColumnWithPosition::with_position(add, position, anchor))
}

fn encode<C: TypeCodec>(codec: &C, value: &C::Value) -> Vec<u8> {
    let mut buf = Vec::new();
    codec.encode(value, &mut buf).unwrap();
    buf
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_column_round_trip(column in columns()) {
        let bytes = encode(&COLUMN_CODEC, &column);
        let decoded = COLUMN_CODEC.decode(&mut Cursor::new(bytes)).unwrap();
        prop_assert_eq!(decoded, column);
    }

    #[test]
    fn prop_record_round_trip(record in records()) {
        let bytes = encode(&COLUMN_WITH_POSITION_CODEC, &record);
        let mut cursor = Cursor::new(bytes);
        let decoded = COLUMN_WITH_POSITION_CODEC.decode(&mut cursor).unwrap();
        prop_assert_eq!(cursor.position() as usize, cursor.get_ref().len());
        prop_assert_eq!(decoded, record);
    }

    #[test]
    fn prop_column_deep_copy_isolated(column in columns(), new_name in text()) {
        let mut copy = COLUMN_CODEC.deep_copy(&column);
        prop_assert_eq!(&copy, &column);

        let snapshot = column.clone();
        copy.set_name(format!("{}_copy", new_name));
        copy.set_comment(Some("changed".to_string()));
        prop_assert_eq!(column, snapshot);
    }

    #[test]
    fn prop_record_deep_copy_isolated(record in records()) {
        let snapshot = record.clone();
        let mut copy = COLUMN_WITH_POSITION_CODEC.deep_copy(&record);
        prop_assert_eq!(&copy, &record);

        copy.add_column.set_name("mutated");
        copy.existing_column = Some(Column::physical_column("other", DataType::date()));
        copy.position = ColumnPosition::First;
        prop_assert_eq!(record, snapshot);
    }

    #[test]
    fn prop_transcode_matches_encode_of_decode(record in records()) {
        let source = encode(&COLUMN_WITH_POSITION_CODEC, &record);

        let mut transcoded = Vec::new();
        COLUMN_WITH_POSITION_CODEC
            .transcode(&mut Cursor::new(source.clone()), &mut transcoded)
            .unwrap();

        let decoded = COLUMN_WITH_POSITION_CODEC
            .decode(&mut Cursor::new(source))
            .unwrap();
        prop_assert_eq!(transcoded, encode(&COLUMN_WITH_POSITION_CODEC, &decoded));
    }

    #[test]
    fn prop_unknown_discriminator_rejected(column in columns(), tag in 2i32..) {
        let mut bytes = encode(&COLUMN_CODEC, &column);
        bytes[..4].copy_from_slice(&tag.to_be_bytes());
        prop_assert!(COLUMN_CODEC.decode(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn prop_checkpoint_restores_values(values in prop::collection::vec(records(), 0..8)) {
        let mut bytes = Vec::new();
        write_checkpoint(&COLUMN_WITH_POSITION_CODEC, &values, &mut bytes).unwrap();
        let restored = read_checkpoint(&COLUMN_WITH_POSITION_CODEC, &mut Cursor::new(bytes)).unwrap();
        prop_assert!(!restored.migrated);
        prop_assert_eq!(restored.values, values);
    }
}
