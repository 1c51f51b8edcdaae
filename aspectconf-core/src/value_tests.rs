use super::*;

// ===== Coercion Tests =====

#[test]
fn test_string_to_integer() {
    let v = Value::from("21").coerce(ValueType::Integer).unwrap();
    assert_eq!(v, Value::Integer(21));

    let v = Value::from("  -7 ").coerce(ValueType::Integer).unwrap();
    assert_eq!(v, Value::Integer(-7));
}

#[test]
fn test_string_to_integer_failure() {
    let err = Value::from("twenty").coerce(ValueType::Integer).unwrap_err();
    match err {
        ValueError::Conversion { from, to, .. } => {
            assert_eq!(from, "string");
            assert_eq!(to, "integer");
        }
        other => panic!("Expected conversion error, got {:?}", other),
    }
}

#[test]
fn test_string_to_boolean() {
    for text in ["true", "TRUE", "1", "yes", "On"] {
        assert_eq!(
            Value::from(text).coerce(ValueType::Boolean).unwrap(),
            Value::Boolean(true)
        );
    }
    for text in ["false", "0", "no", "off"] {
        assert_eq!(
            Value::from(text).coerce(ValueType::Boolean).unwrap(),
            Value::Boolean(false)
        );
    }
    assert!(Value::from("maybe").coerce(ValueType::Boolean).is_err());
}

#[test]
fn test_numeric_widening_and_narrowing() {
    assert_eq!(
        Value::Integer(3).coerce(ValueType::Float).unwrap(),
        Value::Float(3.0)
    );
    assert_eq!(
        Value::Float(4.0).coerce(ValueType::Integer).unwrap(),
        Value::Integer(4)
    );
    assert!(Value::Float(4.5).coerce(ValueType::Integer).is_err());
}

#[test]
fn test_float_beyond_integer_range_is_rejected() {
    // 2^63 is the first float above i64::MAX
    assert!(Value::Float(9_223_372_036_854_775_808.0)
        .coerce(ValueType::Integer)
        .is_err());
    assert!(Value::Float(-9_223_372_036_854_775_808.0)
        .coerce(ValueType::Integer)
        .is_ok());
}

#[test]
fn test_scalars_to_string() {
    assert_eq!(
        Value::Integer(30).coerce(ValueType::String).unwrap(),
        Value::from("30")
    );
    assert_eq!(
        Value::Boolean(true).coerce(ValueType::String).unwrap(),
        Value::from("true")
    );
}

#[test]
fn test_nil_handling() {
    assert_eq!(Value::Nil.coerce(ValueType::String).unwrap(), Value::Nil);
    assert_eq!(Value::Nil.coerce(ValueType::Any).unwrap(), Value::Nil);
    assert!(Value::Nil.coerce(ValueType::Integer).is_err());
}

#[test]
fn test_any_is_passthrough() {
    let list = Value::List(vec![Value::Integer(1), Value::from("a")]);
    assert_eq!(list.coerce(ValueType::Any).unwrap(), list);
}

#[test]
fn test_empty_values() {
    assert_eq!(ValueType::Integer.empty(), Value::Integer(0));
    assert_eq!(ValueType::Boolean.empty(), Value::Boolean(false));
    assert_eq!(ValueType::String.empty(), Value::Nil);
}

// ===== Typed Value Tests =====

#[test]
fn test_typed_round_trip() {
    assert_eq!(i64::from_value(Value::from("42")).unwrap(), 42);
    assert_eq!(u16::from_value(Value::Integer(8080)).unwrap(), 8080);
    assert!(u16::from_value(Value::Integer(-1)).is_err());
    assert_eq!(String::from_value(Value::Nil).unwrap(), "");
    assert_eq!(Option::<i64>::from_value(Value::Nil).unwrap(), None);
    assert_eq!(
        Vec::<String>::from_value(Value::List(vec![Value::from("a"), Value::from("b")])).unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_declared_types() {
    assert_eq!(<bool as ConfigValue>::VALUE_TYPE, ValueType::Boolean);
    assert_eq!(<Option<f64> as ConfigValue>::VALUE_TYPE, ValueType::Float);
    assert_eq!(<Vec<String> as ConfigValue>::VALUE_TYPE, ValueType::List);
}

// ===== Converter Tests =====

#[test]
fn test_separated_list_converter() {
    let converter = SeparatedListConverter::default();
    let list = converter
        .convert(&Value::from("a; b;;c"), ValueType::List)
        .unwrap();
    assert_eq!(
        list,
        Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );

    let joined = converter.convert(&list, ValueType::String).unwrap();
    assert_eq!(joined, Value::from("a;b;c"));
}

#[test]
fn test_separated_list_converter_rejects_numbers() {
    let converter = SeparatedListConverter::new(',');
    assert_eq!(converter.name(), "separated-list(,)");
    assert!(converter
        .convert(&Value::from("1"), ValueType::Integer)
        .is_err());
}

// ===== Display / Serde =====

#[test]
fn test_display() {
    assert_eq!(Value::Nil.to_string(), "");
    assert_eq!(Value::Float(1.5).to_string(), "1.5");
    assert_eq!(
        Value::List(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
        "[1, 2]"
    );
}

#[test]
fn test_serde_untagged() {
    let json = serde_json::to_string(&Value::List(vec![
        Value::Integer(1),
        Value::from("x"),
        Value::Nil,
    ]))
    .unwrap();
    assert_eq!(json, r#"[1,"x",null]"#);

    let parsed: Value = serde_json::from_str("null").unwrap();
    assert_eq!(parsed, Value::Nil);
    let parsed: Value = serde_json::from_str("true").unwrap();
    assert_eq!(parsed, Value::Boolean(true));
    let parsed: Value = serde_json::from_str("2.5").unwrap();
    assert_eq!(parsed, Value::Float(2.5));
}
