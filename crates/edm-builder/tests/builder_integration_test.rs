//! Integration tests for building repositories from event files

use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use edm_builder::{
    BuilderConfig, EventFormat, EventStreamBuilder, ParseEvent, build, load_events, parse_events,
};
use edm_model::{EntityKind, Severity};
use pretty_assertions::assert_eq;

/// Helper to write an event file with the given extension
fn event_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn core_events() -> Vec<ParseEvent> {
    EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .abstract_entity("EducationOrganization")
        .integer_identity("EducationOrganizationId")
        .end_entity()
        .domain_entity_subclass("School", "EducationOrganization")
        .integer_identity_rename("SchoolId", "EducationOrganizationId")
        .end_entity()
        .domain_entity("Student")
        .string_identity("StudentUniqueId")
        .end_entity()
        .association("StudentSchoolAssociation")
        .domain_entity_identity("Student", None)
        .domain_entity_identity("School", None)
        .date_identity("EntryDate")
        .end_entity()
        .end_namespace()
        .build()
}

#[test]
fn test_load_yaml_event_file_and_build() {
    let yaml = r"
events:
  - event: begin_namespace
    name: EdFi
  - event: begin_entity
    kind: domainEntity
    name: Student
    source: { line: 2, column: 0, tokenText: Student }
  - event: begin_property
    kind: string
    name: StudentUniqueId
  - event: identity
  - event: end_property
  - event: end_entity
  - event: end_namespace
";
    let file = event_file(yaml, ".yaml");
    let events = load_events(file.path()).unwrap();
    assert_eq!(events.len(), 7);

    let output = build(&events, BuilderConfig::default()).unwrap();
    assert!(output.diagnostics.is_empty());
    let namespace = output.repository.namespace_named("EdFi").unwrap();
    let student = output
        .repository
        .find_entity(namespace, &[EntityKind::DomainEntity], "Student")
        .unwrap();
    assert_eq!(output.repository.entity(student).source_map.line, 2);
}

#[test]
fn test_directory_loads_files_in_name_order() {
    let dir = TempDir::new().unwrap();
    let stream = EventStreamBuilder::new()
        .begin_extension_namespace("Sample", "Sample")
        .domain_entity("Bus")
        .string_identity("BusId")
        .domain_entity_property("EdFi.School", true, None)
        .end_entity()
        .end_namespace();
    fs::write(dir.path().join("b-sample.json"), stream.to_json().unwrap()).unwrap();

    let core = serde_json::to_string(&core_events()).unwrap();
    fs::write(dir.path().join("a-core.json"), core).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let events = load_events(dir.path()).unwrap();
    let output = build(&events, BuilderConfig::default()).unwrap();
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let names: Vec<&str> = output
        .repository
        .namespaces()
        .map(|namespace| namespace.name.as_str())
        .collect();
    assert_eq!(names, vec!["EdFi", "Sample"]);
    assert_eq!(output.repository.entity_count(), 5);
}

#[test]
fn test_namespace_split_across_files_is_merged() {
    let first = EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .domain_entity("Student")
        .string_identity("StudentUniqueId")
        .end_entity()
        .end_namespace()
        .build();
    let second = EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .domain_entity("Staff")
        .string_identity("StaffUniqueId")
        .end_entity()
        .end_namespace()
        .build();

    let events: Vec<ParseEvent> = first.into_iter().chain(second).collect();
    let output = build(&events, BuilderConfig::default()).unwrap();
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.repository.namespaces().count(), 1);
    let namespace = output.repository.namespaces().next().unwrap();
    assert_eq!(namespace.entities.len(), 2);
}

#[test]
fn test_duplicates_across_kinds_and_namespaces() {
    let events = EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .domain_entity("GradeLevel")
        .integer_identity("GradeLevelId")
        .end_entity()
        .descriptor("GradeLevel")
        .end_entity()
        .descriptor("GradeLevel")
        .end_entity()
        .end_namespace()
        .begin_extension_namespace("Sample", "Sample")
        .descriptor("GradeLevel")
        .end_entity()
        .end_namespace()
        .build();

    let output = build(&events, BuilderConfig::default()).unwrap();
    let messages: Vec<&str> = output
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Descriptor named GradeLevel is a duplicate declaration of that name.",
            "Descriptor named GradeLevel is a duplicate declaration of that name.",
        ]
    );
    assert_eq!(output.repository.entity_count(), 3);
}

#[test]
fn test_invalid_json_reports_origin() {
    let file = event_file("{ not json", ".json");
    let error = load_events(file.path()).unwrap_err();
    assert!(error.to_string().contains("JSON parse error"));
}

#[test]
fn test_unsupported_file_extension() {
    let file = event_file("[]", ".txt");
    assert!(load_events(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let error = load_events(std::path::Path::new("/nonexistent/model.json")).unwrap_err();
    assert!(matches!(error, edm_builder::Error::Io { .. }));
}

#[test]
fn test_custom_naming_patterns() {
    let config = BuilderConfig {
        identifier_pattern: "^[A-Za-z]+$".to_string(),
        ..BuilderConfig::default()
    };
    let events = parse_events(
        r#"[
            {"event": "begin_namespace", "name": "EdFi"},
            {"event": "begin_entity", "kind": "descriptor", "name": "gradeLevel"},
            {"event": "end_entity"},
            {"event": "end_namespace"}
        ]"#,
        EventFormat::Json,
        "<inline>",
    )
    .unwrap();
    let output = build(&events, config).unwrap();
    assert!(output.diagnostics.is_empty());

    let strict = build(&events, BuilderConfig::default()).unwrap();
    assert_eq!(strict.diagnostics.len(), 1);
    assert_eq!(strict.diagnostics[0].category, Severity::Error);
}

#[test]
fn test_invalid_pattern_fails_before_building() {
    let config = BuilderConfig {
        namespace_pattern: "(".to_string(),
        ..BuilderConfig::default()
    };
    assert!(build(&core_events(), config).is_err());
}
