use std::sync::Arc;

use courier_model::{
    DescriptorProvider, EnumValue, Field, ListDescriptor, MapValue, MessageVariant, Requirement,
    SetValue, StructDescriptor, TypeDescriptor, TypeKind, Value,
};

use crate::binary::BinaryCodec;
use crate::codec::Codec;
use crate::error::DecodeError;
use crate::test_schemas::{color_enum, point_struct, shape_union, widget_struct};

fn encode(message: &courier_model::Message) -> Vec<u8> {
    let mut out = Vec::new();
    BinaryCodec::new().serialize(&mut out, message).unwrap();
    out
}

fn decode(
    bytes: &[u8],
    descriptor: &Arc<StructDescriptor>,
) -> Result<courier_model::Message, DecodeError> {
    BinaryCodec::new().deserialize(&mut &bytes[..], descriptor)
}

fn full_widget() -> courier_model::Message {
    let widget = widget_struct();
    let color = color_enum();
    let point = point_struct();

    let origin = {
        let mut builder = point.builder();
        builder.set(1, Value::I32(-3)).unwrap();
        builder.set(2, Value::I32(12)).unwrap();
        builder.build().unwrap()
    };

    let mut builder = widget.builder();
    builder.set(1, Value::String("gadget".to_owned())).unwrap();
    builder.set(2, Value::I32(42)).unwrap();
    builder.set(4, Value::Double(2.5)).unwrap();
    builder
        .set(5, Value::Enum(EnumValue::from_value(&color, 2).unwrap()))
        .unwrap();
    builder.add_to(6, Value::I32(1)).unwrap();
    builder.add_to(6, Value::I32(1)).unwrap();
    builder.add_to(6, Value::I32(-9)).unwrap();
    builder.add_to(7, Value::String("beta".to_owned())).unwrap();
    builder.add_to(7, Value::String("alpha".to_owned())).unwrap();
    builder
        .put_in(8, Value::I32(2), Value::String("two".to_owned()))
        .unwrap();
    builder
        .put_in(8, Value::I32(1), Value::String("one".to_owned()))
        .unwrap();
    builder.set(9, Value::Message(origin)).unwrap();
    builder.set(10, Value::Binary(vec![0, 1, 254, 255])).unwrap();
    builder.build().unwrap()
}

#[test]
fn roundtrips_every_value_kind() {
    let original = full_widget();
    let decoded = decode(&encode(&original), &widget_struct()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn reports_written_length() {
    let original = full_widget();
    let mut out = Vec::new();
    let written = BinaryCodec::new().serialize(&mut out, &original).unwrap();
    assert_eq!(written, out.len());
}

#[test]
fn message_with_no_set_optionals_is_one_terminator_past_required() {
    let shape = shape_union();
    let mut builder = shape.builder();
    builder.set(2, Value::Double(1.0)).unwrap();
    let bytes = encode(&builder.build().unwrap());
    // kind + key + 8-byte double + terminator.
    assert_eq!(bytes.len(), 1 + 2 + 8 + 1);
    assert_eq!(bytes[bytes.len() - 1], 0);
}

#[test]
fn unknown_fields_are_skipped_structurally() {
    // Writer's view has an extra list field the reader's view lacks.
    let writer_view = StructDescriptor::new(
        "test",
        "Probe",
        MessageVariant::Struct,
        vec![
            Field::new(
                1,
                "name",
                Requirement::Required,
                DescriptorProvider::fixed(TypeDescriptor::String),
                None,
            ),
            Field::new(
                2,
                "extras",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::List(Arc::new(ListDescriptor::new(
                    DescriptorProvider::fixed(TypeDescriptor::String),
                )))),
                None,
            ),
        ],
    )
    .unwrap();
    let reader_view = StructDescriptor::new(
        "test",
        "Probe",
        MessageVariant::Struct,
        vec![Field::new(
            1,
            "name",
            Requirement::Required,
            DescriptorProvider::fixed(TypeDescriptor::String),
            None,
        )],
    )
    .unwrap();

    let mut builder = writer_view.builder();
    builder.set(1, Value::String("keep".to_owned())).unwrap();
    builder
        .add_to(2, Value::String("dropped".to_owned()))
        .unwrap();
    builder.add_to(2, Value::String("also".to_owned())).unwrap();
    let bytes = encode(&builder.build().unwrap());

    let decoded = decode(&bytes, &reader_view).unwrap();
    assert_eq!(decoded.get(1), Some(Value::String("keep".to_owned())));
    assert!(!decoded.has(2));
}

#[test]
fn unknown_nested_message_field_is_skipped() {
    let writer_view = StructDescriptor::new(
        "test",
        "Wrap",
        MessageVariant::Struct,
        vec![Field::new(
            3,
            "origin",
            Requirement::Optional,
            DescriptorProvider::fixed(point_struct().descriptor()),
            None,
        )],
    )
    .unwrap();
    let reader_view =
        StructDescriptor::new("test", "Wrap", MessageVariant::Struct, vec![]).unwrap();

    let mut builder = writer_view.builder();
    let mut origin = point_struct().builder();
    origin.set(1, Value::I32(1)).unwrap();
    origin.set(2, Value::I32(2)).unwrap();
    builder.set(3, Value::Message(origin.build().unwrap())).unwrap();

    let decoded = decode(&encode(&builder.build().unwrap()), &reader_view).unwrap();
    assert!(!decoded.has(3));
}

#[test]
fn declared_set_and_map_disciplines_survive_decode() {
    let original = full_widget();
    let decoded = decode(&encode(&original), &widget_struct()).unwrap();

    let Some(Value::Set(aliases)) = decoded.get(7) else {
        panic!("aliases is a set");
    };
    let items: Vec<_> = aliases.iter().cloned().collect();
    assert_eq!(
        items,
        vec![
            Value::String("alpha".to_owned()),
            Value::String("beta".to_owned())
        ]
    );

    let Some(Value::Map(notes)) = decoded.get(8) else {
        panic!("notes is a map");
    };
    let keys: Vec<_> = notes.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec![Value::I32(2), Value::I32(1)]);
}

#[test]
fn union_roundtrip_keeps_single_field() {
    let shape = shape_union();
    let mut builder = shape.builder();
    builder.set(2, Value::Double(3.25)).unwrap();
    let original = builder.build().unwrap();

    let decoded = decode(&encode(&original), &shape).unwrap();
    assert!(!decoded.has(1));
    assert_eq!(decoded.get(2), Some(Value::Double(3.25)));
}

#[test]
fn truncated_input_is_a_typed_error() {
    let bytes = encode(&full_widget());
    for cut in [0, 1, 3, bytes.len() / 2, bytes.len() - 1] {
        let err = decode(&bytes[..cut], &widget_struct()).unwrap_err();
        assert!(
            matches!(err, DecodeError::Truncated { .. }),
            "cut at {cut}: {err:?}"
        );
    }
}

#[test]
fn unknown_kind_tag_is_rejected() {
    let err = decode(&[0xff, 0, 1], &point_struct()).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownWireKind { tag: 0xff }));
}

#[test]
fn declared_kind_mismatch_is_rejected() {
    // Field 1 of Point is declared i32; present a string entry for it.
    let mut bytes = vec![7, 0, 1];
    bytes.extend_from_slice(&3u32.to_be_bytes());
    bytes.extend_from_slice(b"abc");
    bytes.push(0);
    let err = decode(&bytes, &point_struct()).unwrap_err();
    assert!(matches!(err, DecodeError::WireKindMismatch { .. }));
}

#[test]
fn populated_container_with_wrong_element_tag_is_rejected() {
    // Field 6 of Widget is list<i32>; claim one string element.
    let mut bytes = vec![10, 0, 6, 7];
    bytes.extend_from_slice(&1u32.to_be_bytes());
    let err = decode(&bytes, &widget_struct()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::WireKindMismatch {
            expected: TypeKind::I32,
            found: TypeKind::String,
            ..
        }
    ));
}

#[test]
fn decoded_message_is_validated() {
    // Empty field list for a struct with two required fields.
    let err = decode(&[0], &point_struct()).unwrap_err();
    assert!(matches!(err, DecodeError::Invalid(_)));
}

#[test]
fn empty_containers_roundtrip() {
    let widget = widget_struct();
    let mut builder = widget.builder();
    builder.set(1, Value::String("w".to_owned())).unwrap();
    builder.set(6, Value::List(vec![])).unwrap();
    builder
        .set(
            7,
            Value::Set(SetValue::new(
                courier_model::CollectionOrder::SortedByNaturalOrder,
            )),
        )
        .unwrap();
    builder
        .set(
            8,
            Value::Map(MapValue::new(
                courier_model::CollectionOrder::InsertionOrderPreserving,
            )),
        )
        .unwrap();
    let original = builder.build().unwrap();

    let decoded = decode(&encode(&original), &widget).unwrap();
    assert_eq!(decoded.num(6), 0);
    assert!(decoded.has(6));
    assert!(decoded.has(7));
    assert!(decoded.has(8));
}
