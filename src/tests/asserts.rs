use serde_json::json;

use crate::asserts::missing_keys;

#[test]
fn missing_keys_reports_every_absent_key() {
    let body = json!({ "id": "u1", "email": "a@b.c" });
    let missing = missing_keys(&body, &["id", "email", "nickname", "role"]);
    assert_eq!(missing, vec!["nickname", "role"]);
}

#[test]
fn missing_keys_is_empty_when_all_present() {
    let body = json!({ "id": "u1", "name": "kb", "description": "", "chunk_method": "general" });
    assert!(missing_keys(&body, &["id", "name", "description", "chunk_method"]).is_empty());
}

#[test]
fn non_object_bodies_miss_everything() {
    assert_eq!(missing_keys(&json!([1, 2, 3]), &["id"]), vec!["id"]);
    assert_eq!(missing_keys(&json!("text"), &["id"]), vec!["id"]);
    assert_eq!(missing_keys(&json!(null), &["id"]), vec!["id"]);
}

#[test]
fn present_but_null_keys_are_not_missing() {
    let body = json!({ "id": null });
    assert!(missing_keys(&body, &["id"]).is_empty());
}
