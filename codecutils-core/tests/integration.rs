//! Integration tests running whole graphs through normalization and
//! marshaling.

use codecutils_core::{
    Action, CodecConfig, Context, ElementType, MarshalError, Marshaller, Node, Number, Segment,
    ToNode, Traversal, TypedArray, buffer_to_object, count_typed_arrays, extract_typed_array,
    flatten_typed_arrays, has_circular_reference, is_valid_string, merge_buffers, normalize,
    object_to_buffer, remove_circular_references, utf8,
};
use proptest::prelude::*;

fn floats(values: &[f64]) -> Node {
    Node::sequence(values.iter().map(|&v| Node::Number(Number::Float(v))))
}

/// A record holding two float arrays, one of them shared, and metadata.
fn jack() -> Node {
    let shared = Node::typed_array(vec![12.0f32, 14.0, 16.0, 2000.0, 2010.0, 2011.0, 23.0]);
    Node::mapping([
        (
            "_data",
            Node::mapping([
                (
                    "array1",
                    Node::typed_array(vec![512.0f32, 514.0, 516.0, 52000.0, 52010.0, 52011.0]),
                ),
                ("array2", shared.clone()),
                ("again", shared),
            ]),
        ),
        (
            "_metadata",
            Node::mapping([
                ("firstname", Node::from("Jack the 🍔")),
                ("lastname", Node::from("Foo")),
                ("date", Node::opaque("Date")),
            ]),
        ),
    ])
}

fn without_opaque(node: &Node) -> Node {
    Traversal::new(node).map(|cx: &Context<'_>| match cx.node() {
        Node::Opaque(_) => Action::Remove,
        _ => Action::Continue,
    })
}

#[test]
fn record_with_cycle_and_typed_arrays() {
    let record = jack();
    assert!(!has_circular_reference(&record));
    assert_eq!(count_typed_arrays(&record), 3);

    let metadata = record.get("_metadata").unwrap();
    metadata.insert("circ", metadata.clone());
    assert!(has_circular_reference(&record));

    let clean = remove_circular_references(&record).unwrap();
    assert!(!has_circular_reference(&clean));
    assert_eq!(clean.get("_metadata").unwrap().get("circ"), None);
    assert!(metadata.get("circ").unwrap().same_node(&metadata));

    let flat = flatten_typed_arrays(&clean).unwrap();
    assert_eq!(count_typed_arrays(&flat), 0);
    assert_eq!(
        flat.get("_data").unwrap().get("array1"),
        Some(floats(&[512.0, 514.0, 516.0, 52000.0, 52010.0, 52011.0]))
    );
    assert_eq!(count_typed_arrays(&record), 3);
}

#[test]
fn marshaling_roundtrip_matches_normalized_graph() {
    let record = without_opaque(&jack());
    let metadata = record.get("_metadata").unwrap();
    metadata.insert("circ", metadata.clone());

    let bytes = object_to_buffer(&record).unwrap();
    let back = buffer_to_object(&bytes).unwrap();

    assert_eq!(back, *normalize(&record));
    assert_eq!(
        back.get("_metadata").unwrap().get("firstname"),
        Some(Node::from("Jack the 🍔"))
    );
    let data = back.get("_data").unwrap();
    assert_eq!(data.get("array2"), data.get("again"));
    assert!(has_circular_reference(&record));
}

#[test]
fn marshaling_refuses_opaque_values() {
    let err = object_to_buffer(&jack()).unwrap_err();
    assert!(matches!(err, MarshalError::Text(_)));
    assert!(err.to_string().contains("Date"));
}

#[test]
fn marshaling_refuses_bad_buffers() {
    let mut bytes = object_to_buffer(&Node::from("ok")).unwrap();
    bytes.push(0x7F);
    assert!(matches!(buffer_to_object(&bytes), Err(MarshalError::Encoding(_))));
    assert!(matches!(buffer_to_object(b"{]"), Err(MarshalError::Text(_))));
}

#[test]
fn configured_marshaller() {
    let config = CodecConfig::from_json(r#"{"pretty": true}"#).unwrap();
    let marshaller = Marshaller::new(config);
    let node = Node::mapping([("a", Node::sequence([Node::Bool(true)]))]);
    let bytes = marshaller.object_to_buffer(&node).unwrap();
    assert!(utf8::decode(&bytes).unwrap().contains("\n  "));
    assert_eq!(marshaller.buffer_to_object(&bytes).unwrap(), node);
}

#[test]
fn paths_reach_every_node() {
    let node = Node::mapping([
        ("list", Node::sequence([Node::Null, Node::from("x")])),
        ("flag", Node::Bool(true)),
    ]);
    let mut paths = Vec::new();
    Traversal::new(&node).for_each(|cx: &Context<'_>| {
        let path: Vec<String> = cx.path().iter().map(Segment::to_string).collect();
        paths.push(path.join("."));
        Action::Continue
    });
    assert_eq!(paths, vec!["", "list", "list.0", "list.1", "flag"]);
}

#[test]
fn buffers_carry_typed_arrays() {
    let header = b"HDR".to_vec();
    let values = TypedArray::from(vec![-3i16, 7, 300]);
    let merged = merge_buffers(&[header, values.to_ne_bytes()]);

    let extracted = extract_typed_array(&merged, 3, ElementType::I16, 3).unwrap();
    assert_eq!(extracted, values);

    let info = extracted.info();
    assert!(info.signed);
    assert_eq!(info.bytes_per_element, 2);
    assert_eq!(info.byte_length, 6);
    assert_eq!(info.length, 3);

    assert!(extract_typed_array(&merged, 3, ElementType::I16, 4).is_err());
}

#[test]
fn decoded_text_is_valid() {
    let config = CodecConfig::default();
    let text = utf8::decode(&utf8::encode("I can has 🍔")).unwrap();
    assert!(is_valid_string(&text, &config));
}

#[derive(ToNode)]
struct Metadata {
    firstname: String,
    lastname: String,
    #[node(skip)]
    #[allow(dead_code)]
    scratch: Vec<u8>,
}

#[derive(ToNode)]
struct Block {
    #[node(rename = "_data")]
    data: Vec<TypedArray>,
    #[node(rename = "_metadata")]
    metadata: Metadata,
    tags: Option<Vec<String>>,
}

#[derive(ToNode)]
struct Pair(u8, #[node(skip)] u8, u8);

#[derive(ToNode)]
struct Marker;

#[derive(ToNode)]
struct Wrapper<T> {
    inner: T,
}

#[derive(ToNode)]
struct Bounded<T>
where
    T: Clone,
{
    inner: T,
}

#[derive(ToNode)]
enum Shape {
    Empty,
    #[node(rename = "disc")]
    Circle(f64),
    Rect {
        w: u32,
        #[node(rename = "height")]
        h: u32,
    },
    Segment(i32, i32),
}

#[test]
fn derived_struct_becomes_mapping() {
    let block = Block {
        data: vec![TypedArray::from(vec![1.0f32, 2.0])],
        metadata: Metadata {
            firstname: "Jack".into(),
            lastname: "Foo".into(),
            scratch: vec![1, 2, 3],
        },
        tags: None,
    };
    let node = block.to_node();

    let keys: Vec<String> = node.as_mapping().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["_data", "_metadata", "tags"]);
    assert_eq!(
        node.get("_metadata"),
        Some(Node::mapping([
            ("firstname", Node::from("Jack")),
            ("lastname", Node::from("Foo")),
        ]))
    );
    assert_eq!(node.get("tags"), Some(Node::Null));
    assert_eq!(count_typed_arrays(&node), 1);

    let back = buffer_to_object(&object_to_buffer(&node).unwrap()).unwrap();
    assert_eq!(back.get("_data"), Some(Node::sequence([floats(&[1.0, 2.0])])));
}

#[test]
fn derived_tuple_and_unit_structs() {
    assert_eq!(
        Pair(1, 2, 3).to_node(),
        Node::sequence([Node::Number(Number::Int(1)), Node::Number(Number::Int(3))])
    );
    assert_eq!(Marker.to_node(), Node::Null);
    assert_eq!(
        Wrapper { inner: true }.to_node(),
        Node::mapping([("inner", Node::Bool(true))])
    );
    assert_eq!(
        Bounded { inner: 2u8 }.to_node(),
        Node::mapping([("inner", Node::Number(Number::Int(2)))])
    );
}

#[test]
fn derived_enum_variants() {
    assert_eq!(Shape::Empty.to_node(), Node::from("Empty"));
    assert_eq!(
        Shape::Circle(0.5).to_node(),
        Node::mapping([("disc", Node::Number(Number::Float(0.5)))])
    );
    assert_eq!(
        Shape::Rect { w: 2, h: 3 }.to_node(),
        Node::mapping([(
            "Rect",
            Node::mapping([
                ("w", Node::Number(Number::Int(2))),
                ("height", Node::Number(Number::Int(3))),
            ])
        )])
    );
    assert_eq!(
        Shape::Segment(-1, 1).to_node(),
        Node::mapping([(
            "Segment",
            Node::sequence([Node::Number(Number::Int(-1)), Node::Number(Number::Int(1))])
        )])
    );
}

/// Floats that survive a trip through JSON text unchanged.
fn exact_float() -> impl Strategy<Value = f64> {
    (-4000i32..4000).prop_map(|n| f64::from(n) / 4.0)
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::Bool),
        any::<i64>().prop_map(|n| Node::Number(Number::Int(n))),
        exact_float().prop_map(|v| Node::Number(Number::Float(v))),
        any::<String>().prop_map(Node::String),
        prop::collection::vec(exact_float(), 0..6).prop_map(|values| {
            let values: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
            Node::typed_array(values)
        }),
        prop::collection::vec(any::<i16>(), 0..6).prop_map(|values| Node::typed_array(values)),
    ]
}

fn graph() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::from_sequence),
            prop::collection::vec((any::<String>(), inner), 0..6)
                .prop_map(|entries| Node::mapping(entries)),
        ]
    })
}

/// Wraps a generated value in a mapping that also refers to itself.
fn looped(value: Node) -> Node {
    let root = Node::mapping([("value", value)]);
    root.insert("self", root.clone());
    root
}

proptest! {
    #[test]
    fn normalize_is_idempotent_on_generated_graphs(value in graph()) {
        let root = looped(value);
        let once = normalize(&root).into_owned();
        prop_assert!(!has_circular_reference(&once));
        prop_assert_eq!(count_typed_arrays(&once), 0);
        let twice = normalize(&once).into_owned();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn marshaling_roundtrips_generated_graphs(value in graph(), pretty in any::<bool>()) {
        let root = looped(value);
        let marshaller = Marshaller::new(CodecConfig { pretty, ..CodecConfig::default() });
        let bytes = marshaller.object_to_buffer(&root).unwrap();
        let back = marshaller.buffer_to_object(&bytes).unwrap();
        prop_assert_eq!(back, normalize(&root).into_owned());
    }
}
