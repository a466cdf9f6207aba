use rig_core::Value;
use serde_json::json;

#[test]
fn scalar_conversions() {
    assert_eq!(Value::from(7i64).as_i64(), Some(7));
    assert_eq!(Value::from(2.5f64).as_f64(), Some(2.5));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from("epoch").as_str(), Some("epoch"));
}

#[test]
fn array_conversion_keeps_native_representation() {
    let value = Value::from(vec![1.0, 2.0, 3.0]);
    assert_eq!(value.as_array(), Some(&[1.0, 2.0, 3.0][..]));
    assert!(value.as_json().is_none());
}

#[test]
fn json_conversion_carries_structure() {
    let value = Value::from(json!({"trial": 3, "tags": ["warm", "cold"]}));
    let json = value.as_json().expect("opaque payload");
    assert_eq!(json["trial"], 3);
    assert!(value.as_array().is_none());
}

#[test]
fn value_round_trips_through_serde() {
    let values = vec![
        Value::from(vec![0.5, -1.5]),
        Value::from(42i64),
        Value::from(json!({"nested": {"deep": true}})),
    ];
    for value in values {
        let bytes = serde_json::to_vec(&value).expect("encode");
        let back: Value = serde_json::from_slice(&bytes).expect("decode");
        assert_eq!(back, value);
    }
}
