use taskdeck::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let config = Error::InvalidConfig("bad".to_string());
    assert_eq!(config.exit_code(), exit_codes::USER_ERROR);

    for missing in [
        Error::TaskNotFound("t".to_string()),
        Error::TagNotFound("g".to_string()),
        Error::FolderNotFound("f".to_string()),
    ] {
        assert_eq!(missing.exit_code(), exit_codes::NOT_FOUND);
        assert!(missing.is_not_found());
    }

    let op = Error::OperationFailed("boom".to_string());
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
    assert!(!op.is_not_found());
}

#[test]
fn json_error_includes_code() {
    let err = Error::TagNotFound("01hx".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::NOT_FOUND);
    assert_eq!(json.kind, "not_found");
    assert!(json.message.contains("Tag not found"));

    let body = serde_json::to_value(JsonError::from(&Error::InvalidArgument("bad".into()))).unwrap();
    assert_eq!(body["kind"], "user_error");
    assert_eq!(body["code"], exit_codes::USER_ERROR);
    assert_eq!(body["message"], "Invalid argument: bad");
}

#[test]
fn error_kinds_follow_exit_codes() {
    assert_eq!(Error::TaskNotFound("x".into()).kind(), "not_found");
    assert_eq!(Error::InvalidConfig("x".into()).kind(), "user_error");
    assert_eq!(Error::OperationFailed("x".into()).kind(), "operation_failed");
}
