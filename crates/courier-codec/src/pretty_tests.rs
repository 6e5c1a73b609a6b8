use courier_model::{EnumValue, Message, Value};
use indoc::indoc;

use crate::codec::Codec;
use crate::json::JsonCodec;
use crate::pretty::PrettyCodec;
use crate::test_schemas::{color_enum, point_struct, widget_struct};

fn point(x: i32, y: i32) -> Message {
    let mut builder = point_struct().builder();
    builder.set(1, Value::I32(x)).unwrap();
    builder.set(2, Value::I32(y)).unwrap();
    builder.build().unwrap()
}

fn sample_widget() -> Message {
    let widget = widget_struct();
    let color = color_enum();
    let mut builder = widget.builder();
    builder.set(1, Value::String("gadget".to_owned())).unwrap();
    builder
        .set(5, Value::Enum(EnumValue::from_name(&color, "GREEN").unwrap()))
        .unwrap();
    builder.add_to(6, Value::I32(1)).unwrap();
    builder.add_to(6, Value::I32(2)).unwrap();
    builder
        .put_in(8, Value::I32(1), Value::String("one".to_owned()))
        .unwrap();
    builder.set(9, Value::Message(point(3, 4))).unwrap();
    builder.build().unwrap()
}

#[test]
fn output_is_exact() {
    assert_eq!(
        PrettyCodec::new().to_string(&sample_widget()),
        indoc! {r#"
            {
              name: "gadget",
              count: 7,
              color: GREEN,
              tags: [
                1,
                2
              ],
              notes: {
                1: "one"
              },
              origin: {
                x: 3,
                y: 4
              }
            }"#}
    );
}

#[test]
fn serialize_matches_to_string() {
    let message = sample_widget();
    let mut out = Vec::new();
    let written = PrettyCodec::new().serialize(&mut out, &message).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(written, text.len());
    assert_eq!(text, PrettyCodec::new().to_string(&message));
}

#[test]
fn roundtrips_through_own_output() {
    let message = sample_widget();
    let text = PrettyCodec::new().to_string(&message);
    let decoded = PrettyCodec::new()
        .deserialize(&mut text.as_bytes(), &widget_struct())
        .unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn json_codec_reads_pretty_output() {
    let message = sample_widget();
    let text = PrettyCodec::new().to_string(&message);
    let decoded = JsonCodec::new()
        .deserialize(&mut text.as_bytes(), &widget_struct())
        .unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn pretty_codec_reads_json_output() {
    let message = sample_widget();
    let mut json = Vec::new();
    JsonCodec::new().serialize(&mut json, &message).unwrap();
    let decoded = PrettyCodec::new()
        .deserialize(&mut json.as_slice(), &widget_struct())
        .unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn non_finite_doubles_roundtrip() {
    let widget = widget_struct();
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut builder = widget.builder();
        builder.set(1, Value::String("w".to_owned())).unwrap();
        builder.set(4, Value::Double(value)).unwrap();
        let message = builder.build().unwrap();

        let text = PrettyCodec::new().to_string(&message);
        let decoded = PrettyCodec::new()
            .deserialize(&mut text.as_bytes(), &widget)
            .unwrap();
        assert_eq!(decoded, message);
    }
}

#[test]
fn empty_nested_containers_render_flat() {
    let widget = widget_struct();
    let mut builder = widget.builder();
    builder.set(1, Value::String("w".to_owned())).unwrap();
    builder.set(6, Value::List(vec![])).unwrap();
    assert_eq!(
        PrettyCodec::new().to_string(&builder.build().unwrap()),
        indoc! {r#"
            {
              name: "w",
              count: 7,
              tags: []
            }"#}
    );
}
