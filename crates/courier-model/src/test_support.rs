//! Shared schema fixtures for unit tests.

use std::sync::Arc;

use crate::descriptor::{
    CollectionOrder, EnumDescriptor, Field, ListDescriptor, MapDescriptor, MessageVariant,
    Requirement, SetDescriptor, StructDescriptor, TypeDescriptor,
};
use crate::provider::DescriptorProvider;
use crate::value::Value;

pub(crate) fn color_enum() -> Arc<EnumDescriptor> {
    EnumDescriptor::new("test", "Color", vec![(1, "RED"), (2, "GREEN"), (3, "BLUE")])
        .expect("valid enum")
}

pub(crate) fn point_struct() -> Arc<StructDescriptor> {
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

/// One struct exercising every requirement tier and container kind:
///
/// ```text
/// struct Widget {
///   1: required string name;
///   2: default  i32    count = 7;
///   3: default  string label = "none";
///   4: optional double ratio;
///   5: optional Color  color;
///   6: optional list<i32> tags;
///   7: optional set<string> aliases (sorted);
///   8: optional map<i32, string> notes (insertion order);
///   9: optional Point  origin;
///  10: optional binary payload;
///  11: default  bool   active;       // synthesized false default
/// }
/// ```
pub(crate) fn widget_struct() -> Arc<StructDescriptor> {
    let color = color_enum();
    let point = point_struct();
    StructDescriptor::new(
        "test",
        "Widget",
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
                "count",
                Requirement::Default,
                DescriptorProvider::fixed(TypeDescriptor::I32),
                Some(Value::I32(7)),
            ),
            Field::new(
                3,
                "label",
                Requirement::Default,
                DescriptorProvider::fixed(TypeDescriptor::String),
                Some(Value::String("none".to_owned())),
            ),
            Field::new(
                4,
                "ratio",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::Double),
                None,
            ),
            Field::new(
                5,
                "color",
                Requirement::Optional,
                DescriptorProvider::fixed(color.descriptor()),
                None,
            ),
            Field::new(
                6,
                "tags",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::List(Arc::new(ListDescriptor::new(
                    DescriptorProvider::fixed(TypeDescriptor::I32),
                )))),
                None,
            ),
            Field::new(
                7,
                "aliases",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::Set(Arc::new(SetDescriptor::new(
                    DescriptorProvider::fixed(TypeDescriptor::String),
                    CollectionOrder::SortedByNaturalOrder,
                )))),
                None,
            ),
            Field::new(
                8,
                "notes",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::Map(Arc::new(MapDescriptor::new(
                    DescriptorProvider::fixed(TypeDescriptor::I32),
                    DescriptorProvider::fixed(TypeDescriptor::String),
                    CollectionOrder::InsertionOrderPreserving,
                )))),
                None,
            ),
            Field::new(
                9,
                "origin",
                Requirement::Optional,
                DescriptorProvider::fixed(point.descriptor()),
                None,
            ),
            Field::new(
                10,
                "payload",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::Binary),
                None,
            ),
            Field::new(
                11,
                "active",
                Requirement::Default,
                DescriptorProvider::fixed(TypeDescriptor::Bool),
                None,
            ),
        ],
    )
    .expect("valid struct")
}

/// `union Shape { 1: Point corner; 2: double radius; }`
pub(crate) fn shape_union() -> Arc<StructDescriptor> {
    let point = point_struct();
    StructDescriptor::new(
        "test",
        "Shape",
        MessageVariant::Union,
        vec![
            Field::new(
                1,
                "corner",
                Requirement::Optional,
                DescriptorProvider::fixed(point.descriptor()),
                None,
            ),
            Field::new(
                2,
                "radius",
                Requirement::Optional,
                DescriptorProvider::fixed(TypeDescriptor::Double),
                None,
            ),
        ],
    )
    .expect("valid union")
}
