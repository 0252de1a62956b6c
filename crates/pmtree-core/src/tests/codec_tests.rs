use super::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Draft {
    title: String,
    tags: Vec<String>,
    pinned: bool,
}

fn round_trip<T>(value: T) -> T
where
    T: Serialize + DeserializeOwned + 'static,
{
    let codec = JsonStateCodec;
    let ty = TypeDescriptor::of::<T>();
    let encoded = codec.encode(&ty, &value).expect("encode");
    let decoded = codec.decode(&ty, &encoded).expect("decode");
    *decoded.downcast::<T>().expect("decoded type")
}

#[test]
fn json_codec_round_trips_structured_values() {
    let draft = Draft {
        title: "Groceries".into(),
        tags: vec!["home".into(), "weekly".into()],
        pinned: true,
    };
    assert_eq!(round_trip(draft.clone()), draft);

    let mut counts = BTreeMap::new();
    counts.insert("a".to_string(), 1u32);
    assert_eq!(round_trip(counts.clone()), counts);
    assert_eq!(round_trip(Some(-3i64)), Some(-3));
}

#[test]
fn encode_rejects_value_of_wrong_type() {
    let ty = TypeDescriptor::of::<u32>();
    let err = JsonStateCodec.encode(&ty, &"text").unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { expected } if expected == "u32"));
}

#[test]
fn decode_reports_malformed_data() {
    let ty = TypeDescriptor::of::<u32>();
    let err = JsonStateCodec
        .decode(&ty, &SerializedValue::new("\"not a number\""))
        .unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn descriptors_compare_by_type() {
    assert_eq!(TypeDescriptor::of::<String>(), TypeDescriptor::of::<String>());
    assert_ne!(TypeDescriptor::of::<String>(), TypeDescriptor::of::<u8>());
    assert!(TypeDescriptor::of::<Draft>().type_name().ends_with("Draft"));
}
