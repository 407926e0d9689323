use loadshare::error::LoadshareError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        LoadshareError::config("x"),
        LoadshareError::Config { .. }
    ));
    assert!(matches!(LoadshareError::io("x"), LoadshareError::Io { .. }));
    assert!(matches!(
        LoadshareError::store("x"),
        LoadshareError::Store { .. }
    ));
    assert!(matches!(
        LoadshareError::status("x"),
        LoadshareError::Status { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    let ser = LoadshareError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, LoadshareError::Serialization { .. }));
    assert!(matches!(
        LoadshareError::validation("f", "m"),
        LoadshareError::Validation { .. }
    ));
    assert!(matches!(
        LoadshareError::generic("x"),
        LoadshareError::Generic { .. }
    ));
    assert!(matches!(
        LoadshareError::incomplete_profile(3, 96),
        LoadshareError::IncompleteProfile {
            found: 3,
            expected: 96
        }
    ));
}

#[test]
fn display_messages() {
    let e = LoadshareError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));

    let e = LoadshareError::incomplete_profile(12, 96);
    assert_eq!(e.to_string(), "Incomplete profile: 12 of 96 slots available");
    assert!(e.is_incomplete_profile());
    assert!(!LoadshareError::store("x").is_incomplete_profile());
}

#[test]
fn sqlite_errors_map_to_store() {
    let err: LoadshareError = rusqlite::Error::InvalidQuery.into();
    assert!(matches!(err, LoadshareError::Store { .. }));
}
