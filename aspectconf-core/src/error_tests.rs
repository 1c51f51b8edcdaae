use super::*;

#[test]
fn test_unknown_property_error() {
    let err = Error::UnknownProperty("Colour".to_string());
    assert_eq!(err.to_string(), "Unknown property: Colour");
    assert_eq!(err.property(), Some("Colour"));
}

#[test]
fn test_write_protected_error() {
    let err = Error::WriteProtected("Age".to_string());
    assert_eq!(err.to_string(), "Property is write protected: Age");
}

#[test]
fn test_conversion_from_value_error() {
    let err = Error::conversion(
        "Age",
        ValueError::Conversion {
            from: "string",
            to: "integer",
            reason: "invalid digit found in string".to_string(),
        },
    );
    assert_eq!(
        err.to_string(),
        "Cannot convert string to integer for property 'Age': invalid digit found in string"
    );
    assert_eq!(err.property(), Some("Age"));
}

#[test]
fn test_initialization_wraps_source() {
    let err = Error::initialization("Port", Error::NotSupported("no default".to_string()));
    assert_eq!(
        err.to_string(),
        "Failed to initialize property 'Port': Not supported: no default"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_other_from_anyhow() {
    let err: Error = anyhow::anyhow!("disk on fire").into();
    assert_eq!(err.to_string(), "disk on fire");
    assert_eq!(err.property(), None);
}
