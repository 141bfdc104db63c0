//! End-to-end compilation tests for edm-pipeline

use std::fs;
use tempfile::TempDir;

use anyhow::Result;
use edm_builder::EventStreamBuilder;
use edm_model::Severity;
use edm_pipeline::{AcceptancePolicy, Pipeline, PipelineConfig};
use pretty_assertions::assert_eq;

fn core() -> EventStreamBuilder {
    EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .abstract_entity("EducationOrganization")
        .integer_identity("EducationOrganizationId")
        .string_property("OperationalStatus", false, false)
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
}

/// An extension whose subclass shadows a base property with a different type.
fn shadowing_extension() -> EventStreamBuilder {
    EventStreamBuilder::new()
        .begin_extension_namespace("Sample", "Sample")
        .domain_entity_subclass("Academy", "EdFi.EducationOrganization")
        .integer_identity_rename("AcademyId", "EducationOrganizationId")
        .integer_property("OperationalStatus", false, false)
        .end_entity()
        .end_namespace()
}

/// An extension without the core dependency, so its reference cannot resolve.
fn broken_extension() -> EventStreamBuilder {
    EventStreamBuilder::new()
        .begin_namespace_with_dependencies("Sample", Some("Sample"), &[])
        .domain_entity("Vehicle")
        .string_identity("VehicleId")
        .domain_entity_property("EdFi.School", true, None)
        .end_entity()
        .end_namespace()
}

fn write_model(extension: &EventStreamBuilder) -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("a-core.json"), core().to_json()?)?;
    fs::write(dir.path().join("b-extension.json"), extension.to_json()?)?;
    Ok(dir)
}

fn pipeline(policy: AcceptancePolicy) -> Pipeline {
    Pipeline::new(PipelineConfig {
        acceptance_policy: policy,
        ..PipelineConfig::default()
    })
    .unwrap()
}

#[test]
fn test_compile_directory_of_event_files() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("core.json"), core().to_json()?)?;

    let output = pipeline(AcceptancePolicy::FailOnWarnings).compile_files(&[dir.path()])?;
    assert!(output.accepted);
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.api_schemas.len(), 1);

    let project = &output.api_schemas[0].project_schema;
    assert_eq!(
        project.resource_schemas.keys().collect::<Vec<_>>(),
        vec!["schools", "studentSchoolAssociations", "students"]
    );
    Ok(())
}

#[test]
fn test_warnings_fail_only_the_strictest_policy() -> Result<()> {
    let dir = write_model(&shadowing_extension())?;

    let lenient = pipeline(AcceptancePolicy::FailOnErrors).compile_files(&[dir.path()])?;
    assert!(lenient.accepted);
    assert_eq!(lenient.stats.diagnostics.warnings, 1);
    assert_eq!(lenient.stats.diagnostics.errors, 0);
    assert_eq!(lenient.diagnostics[0].category, Severity::Warning);

    let strict = pipeline(AcceptancePolicy::FailOnWarnings).compile_files(&[dir.path()])?;
    assert!(!strict.accepted);
    Ok(())
}

#[test]
fn test_errors_are_reported_and_processing_continues() -> Result<()> {
    let dir = write_model(&broken_extension())?;

    let output = pipeline(AcceptancePolicy::FailOnErrors).compile_files(&[dir.path()])?;
    assert!(!output.accepted);
    assert_eq!(output.stats.diagnostics.errors, 1);
    assert_eq!(
        output.diagnostics[0].message,
        "Domain Entity property School on Domain Entity Vehicle references EdFi.School, which could not be resolved."
    );
    let failing_stage = output
        .stats
        .stages
        .iter()
        .find(|stage| stage.diagnostics.errors > 0)
        .map(|stage| stage.name);
    assert_eq!(failing_stage, Some("ReferenceResolver"));

    // Later stages still ran for the rest of the model.
    assert_eq!(output.api_schemas.len(), 2);
    assert!(output.api_schemas[1].project_schema.resource_schemas.contains_key("vehicles"));

    let accepting = pipeline(AcceptancePolicy::AcceptAll).compile_files(&[dir.path()])?;
    assert!(accepting.accepted);
    Ok(())
}

#[test]
fn test_files_compile_in_the_order_given() -> Result<()> {
    let dir = TempDir::new()?;
    let core_file = dir.path().join("core.json");
    let extension_file = dir.path().join("extension.json");
    fs::write(&core_file, core().to_json()?)?;
    fs::write(&extension_file, shadowing_extension().to_json()?)?;

    let output = Pipeline::with_defaults().compile_files(&[&core_file, &extension_file])?;
    let json = serde_json::to_value(&output.api_schemas)?;
    assert_eq!(json[1]["projectSchema"]["projectName"], "Sample");
    assert_eq!(
        json[1]["projectSchema"]["resourceSchemas"]["academies"]["superclassResourceName"],
        "EducationOrganization"
    );
    Ok(())
}

#[test]
fn test_missing_file_is_a_load_error() {
    let error = Pipeline::with_defaults()
        .compile_files(&["/path/that/does/not/exist.json"])
        .unwrap_err();
    assert!(error.to_string().starts_with("Loading events failed"));
}
