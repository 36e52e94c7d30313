//! Unit tests for command construction and shape validation.

use rstest::rstest;
use serde_json::{Map, Value, json};

use super::*;
use crate::error::BulkError;

fn decode(value: Value) -> Result<Command, BulkError> {
    Command::from_value(CorrelationId::new(3), value)
}

fn attributes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(members) => members,
        other => panic!("expected an object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Valid shapes
// ---------------------------------------------------------------------------

#[test]
fn configuration_command_keeps_settings_and_total() {
    let command = decode(json!(["config", {"total_instructions": 2, "view": null}]))
        .expect("valid configuration");

    assert_eq!(command.kind(), CommandKind::Configuration);
    let configuration = command
        .operation()
        .configuration()
        .expect("configuration payload");
    assert_eq!(configuration.total_instructions(), Some(2));
    assert_eq!(configuration.settings().get("view"), Some(&Value::Null));
    assert!(command.operation().resource().is_none());
}

#[test]
fn create_command_splits_reserved_members_from_attributes() {
    let command = decode(json!([
        "create",
        "user",
        {"name": "a", "$anchor": "user-a", "$relationships": {"group": "g1"}}
    ]))
    .expect("valid create");

    let resource = command.operation().resource().expect("resource payload");
    assert_eq!(resource.resource_type(), "user");
    assert_eq!(resource.body().attributes(), &attributes(json!({"name": "a"})));
    assert_eq!(
        resource.body().relationships().get("group"),
        Some(&json!("g1"))
    );
    assert_eq!(command.anchor(), Some("user-a"));
    assert_eq!(command.id(), CorrelationId::new(3));
}

#[rstest]
#[case::create("create", CommandKind::Create)]
#[case::update("update", CommandKind::Update)]
#[case::upsert("upsert", CommandKind::Upsert)]
#[case::delete("delete", CommandKind::Delete)]
fn resource_tags_map_to_kinds(#[case] tag: &str, #[case] expected: CommandKind) {
    let command = decode(json!([tag, "group", {}])).expect("valid command");
    assert_eq!(command.kind(), expected);
    assert_eq!(expected.tag(), tag);
    assert_eq!(CommandKind::from_tag(tag), Some(expected));
}

#[test]
fn raw_value_is_preserved_verbatim() {
    let raw = json!(["upsert", "user", {"name": "b", "$relationships": {}}]);
    let command = decode(raw.clone()).expect("valid command");
    assert_eq!(command.raw(), &raw);
    assert_eq!(
        serde_json::to_value(&command).expect("serialise command"),
        raw
    );
}

#[test]
fn typed_construction_synthesises_decodable_raw() {
    let operation = Operation::Create(Resource::new(
        "user",
        Body::new(attributes(json!({"name": "c"})))
            .with_anchor("c")
            .with_relationship("group", json!("g2")),
    ));
    let command =
        Command::new(CorrelationId::new(1), operation.clone()).expect("valid typed command");

    assert_eq!(
        command.raw(),
        &json!(["create", "user", {"name": "c", "$anchor": "c", "$relationships": {"group": "g2"}}])
    );
    let decoded = Command::from_value(CorrelationId::new(1), command.raw().clone())
        .expect("synthesised raw decodes");
    assert_eq!(decoded.operation(), &operation);
}

#[test]
fn typed_configuration_round_trips() {
    let configuration = Configuration::new()
        .with_total_instructions(4)
        .with_setting("effective_user", json!("acct:admin@example.com"));
    let command = Command::new(
        CorrelationId::new(0),
        Operation::Configure(configuration.clone()),
    )
    .expect("valid typed configuration");

    let decoded = Command::from_value(CorrelationId::new(0), command.raw().clone())
        .expect("synthesised raw decodes");
    assert_eq!(decoded.operation().configuration(), Some(&configuration));
}

#[rstest]
#[case::reserved_attribute(
    Operation::Create(Resource::new("user", Body::new(attributes(json!({"$meta": 1}))))),
    "unknown reserved member '$meta'"
)]
#[case::empty_type(
    Operation::Delete(Resource::new("", Body::default())),
    "non-empty string"
)]
#[case::blank_type(
    Operation::Update(Resource::new(" ", Body::default())),
    "non-empty string"
)]
#[case::textual_total(
    Operation::Configure(Configuration::new().with_setting("total_instructions", json!("x"))),
    "non-negative integer"
)]
#[case::anchor_in_attributes(
    Operation::Create(Resource::new("user", Body::new(attributes(json!({"$anchor": "a"}))))),
    "collide with reserved members"
)]
#[case::total_in_settings(
    Operation::Configure(Configuration::new().with_setting("total_instructions", json!(2))),
    "collide with reserved members"
)]
fn typed_construction_rejects_undecodable_operations(
    #[case] operation: Operation,
    #[case] expected: &str,
) {
    let error = Command::new(CorrelationId::new(5), operation).expect_err("must be rejected");
    match &error {
        BulkError::MalformedCommand { position, message } => {
            assert_eq!(*position, 5);
            assert!(
                message.contains(expected),
                "expected '{expected}' in message: {message}"
            );
        }
        other => panic!("expected MalformedCommand, got {other:?}"),
    }
}

#[test]
fn resource_type_is_kept_as_written() {
    let raw = json!(["create", " user ", {}]);
    let command = decode(raw.clone()).expect("valid command");
    let resource = command.operation().resource().expect("resource payload");
    assert_eq!(resource.resource_type(), " user ");
    assert_eq!(command.raw()[1], raw[1]);
}

// ---------------------------------------------------------------------------
// Malformed shapes
// ---------------------------------------------------------------------------

#[rstest]
#[case::not_an_array(json!({"create": "user"}), "JSON array")]
#[case::empty_array(json!([]), "empty")]
#[case::numeric_tag(json!([1, "user", {}]), "tag must be a string")]
#[case::unknown_tag(json!(["explode", "user", {}]), "unknown command 'explode'")]
#[case::config_without_settings(json!(["config"]), "exactly one settings object")]
#[case::config_with_array(json!(["config", []]), "must be a JSON object")]
#[case::negative_total(json!(["config", {"total_instructions": -1}]), "non-negative integer")]
#[case::missing_body(json!(["create", "user"]), "resource type and a body")]
#[case::extra_member(json!(["create", "user", {}, {}]), "resource type and a body")]
#[case::blank_type(json!(["create", "  ", {}]), "non-empty string")]
#[case::body_not_object(json!(["update", "user", "a"]), "body must be a JSON object")]
#[case::numeric_anchor(json!(["create", "user", {"$anchor": 7}]), "'$anchor' must be a string")]
#[case::relationships_list(json!(["create", "user", {"$relationships": []}]), "'$relationships'")]
#[case::unknown_reserved(json!(["create", "user", {"$meta": {}}]), "unknown reserved member")]
fn malformed_shapes_are_rejected(#[case] value: Value, #[case] expected: &str) {
    let error = decode(value).expect_err("shape must be rejected");
    match &error {
        BulkError::MalformedCommand { position, message } => {
            assert_eq!(*position, 3);
            assert!(
                message.contains(expected),
                "expected '{expected}' in message: {message}"
            );
        }
        other => panic!("expected MalformedCommand, got {other:?}"),
    }
}

#[test]
fn correlation_id_displays_position() {
    assert_eq!(CorrelationId::new(12).to_string(), "#12");
    assert_eq!(CorrelationId::new(12).position(), 12);
}
