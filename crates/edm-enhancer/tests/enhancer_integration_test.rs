//! Integration tests running the whole enhancer pipeline over small models

mod common;

use anyhow::Result;
use common::{find, repository, strings};
use edm_builder::EventStreamBuilder;
use edm_enhancer::{EnhancerPipeline, enhance, resolve_references};
use edm_model::{EntityKind, PropertyKind, Severity};
use pretty_assertions::assert_eq;

fn core() -> EventStreamBuilder {
    EventStreamBuilder::new()
        .begin_namespace("EdFi")
        .abstract_entity("EducationOrganization")
        .integer_identity("EducationOrganizationId")
        .string_property("NameOfInstitution", true, false)
        .end_entity()
        .domain_entity_subclass("LocalEducationAgency", "EducationOrganization")
        .integer_identity_rename("LocalEducationAgencyId", "EducationOrganizationId")
        .end_entity()
        .domain_entity_subclass("School", "EducationOrganization")
        .integer_identity_rename("SchoolId", "EducationOrganizationId")
        .domain_entity_property("LocalEducationAgency", false, None)
        .string_property("SchoolType", false, false)
        .end_entity()
        .domain_entity("Student")
        .string_identity("StudentUniqueId")
        .end_entity()
        .domain_entity("Contact")
        .identity_property(PropertyKind::String, "UniqueId", Some("Contact"))
        .end_entity()
        .domain_entity("Section")
        .string_identity("SectionIdentifier")
        .end_entity()
        .domain_entity("ContactAcademicRecord")
        .domain_entity_identity("Contact", None)
        .integer_identity("SchoolYear")
        .end_entity()
        .domain_entity("CourseTranscript")
        .domain_entity_identity("ContactAcademicRecord", None)
        .string_identity("CourseCode")
        .end_entity()
        .association("StudentSchoolAssociation")
        .domain_entity_identity("Student", None)
        .domain_entity_identity("School", None)
        .date_identity("EntryDate")
        .end_entity()
        .association("StudentContactAssociation")
        .domain_entity_identity("Student", None)
        .domain_entity_identity("Contact", None)
        .end_entity()
        .association("StudentSectionAssociation")
        .domain_entity_identity("Student", None)
        .domain_entity_identity("Section", None)
        .end_entity()
        .domain_entity("StudentTransfer")
        .domain_entity_identity("School", Some("Receiving"))
        .string_identity("TransferCode")
        .end_entity()
        .end_namespace()
}

#[test]
fn test_core_model_enhances_cleanly() -> Result<()> {
    let mut repository = repository(core())?;
    let results = enhance(&mut repository);
    assert_eq!(results.len(), EnhancerPipeline::standard().stages().len());
    let diagnostics: Vec<_> = results.iter().flat_map(|result| &result.diagnostics).collect();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    Ok(())
}

#[test]
fn test_authorization_pathway_table() -> Result<()> {
    let mut repository = repository(core())?;
    enhance(&mut repository);
    let pathways = |name: &str| -> Result<Vec<String>> {
        let entity = find(&repository, "EdFi", name)?;
        Ok(repository
            .entity(entity)
            .data
            .authorization_pathways
            .get()
            .cloned()
            .unwrap_or_default())
    };
    assert_eq!(
        pathways("StudentSchoolAssociation")?,
        vec!["StudentSchoolAssociationAuthorization"]
    );
    assert_eq!(
        pathways("StudentContactAssociation")?,
        vec!["ContactStudentSchoolAuthorization"]
    );
    assert!(pathways("StudentSectionAssociation")?.is_empty());
    Ok(())
}

#[test]
fn test_chained_identity_exposes_contact() -> Result<()> {
    let mut repository = repository(core())?;
    enhance(&mut repository);
    let transcript = repository.entity(find(&repository, "EdFi", "CourseTranscript")?);
    assert_eq!(
        strings(transcript.data.contact_securable_elements.get().unwrap()),
        vec!["$.contactAcademicRecordReference.contactUniqueId"]
    );
    Ok(())
}

#[test]
fn test_role_named_school_is_not_an_education_organization_element() -> Result<()> {
    let mut repository = repository(core())?;
    enhance(&mut repository);
    let transfer = repository.entity(find(&repository, "EdFi", "StudentTransfer")?);
    assert!(
        transfer
            .data
            .education_organization_securable_elements
            .get()
            .unwrap()
            .is_empty()
    );

    let association = repository.entity(find(&repository, "EdFi", "StudentSchoolAssociation")?);
    let elements = association
        .data
        .education_organization_securable_elements
        .get()
        .unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].json_path, "$.schoolReference.schoolId");
    assert_eq!(elements[0].property_name, "School");
    Ok(())
}

#[test]
fn test_education_organization_hierarchy() -> Result<()> {
    let mut repository = repository(core())?;
    enhance(&mut repository);
    let namespace = repository.namespace_named("EdFi").unwrap();
    let data = &repository.namespace(namespace).data;

    let hierarchy: Vec<(String, Vec<String>)> = data
        .education_organization_hierarchy
        .get()
        .unwrap()
        .clone()
        .into_iter()
        .collect();
    assert_eq!(
        hierarchy,
        vec![
            ("EducationOrganization".to_string(), vec![]),
            ("LocalEducationAgency".to_string(), vec![]),
            (
                "School".to_string(),
                vec!["LocalEducationAgency".to_string()]
            ),
        ]
    );
    assert_eq!(
        data.education_organization_types.get().unwrap(),
        &vec!["LocalEducationAgency", "School", "EducationOrganization"]
    );
    Ok(())
}

#[test]
fn test_subclass_properties_follow_base_properties() -> Result<()> {
    let mut repository = repository(core())?;
    enhance(&mut repository);
    let school = find(&repository, "EdFi", "School")?;
    let names: Vec<String> = repository
        .entity(school)
        .data
        .collected_properties
        .get()
        .unwrap()
        .iter()
        .map(|collected| repository.property(collected.property).full_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "SchoolId",
            "NameOfInstitution",
            "LocalEducationAgency",
            "SchoolType"
        ]
    );
    assert_eq!(
        strings(repository.entity(school).data.identity_json_paths.get().unwrap()),
        vec!["$.schoolId"]
    );
    Ok(())
}

fn extension(dependencies: Option<&[&str]>) -> EventStreamBuilder {
    let stream = core();
    let stream = match dependencies {
        Some(dependencies) => {
            stream.begin_namespace_with_dependencies("Sample", Some("Sample"), dependencies)
        }
        None => stream.begin_extension_namespace("Sample", "Sample"),
    };
    stream
        .domain_entity("Bus")
        .string_identity("BusId")
        .domain_entity_property("EdFi.School", true, None)
        .end_entity()
        .end_namespace()
}

#[test]
fn test_extension_reference_to_core_school() -> Result<()> {
    let mut repository = repository(extension(None))?;
    let results = enhance(&mut repository);
    assert!(results.iter().all(|result| result.diagnostics.is_empty()));

    let bus = repository.entity(find(&repository, "Sample", "Bus")?);
    let mapping = bus.data.json_paths_mapping.get().unwrap();
    assert_eq!(strings(&mapping["School"].json_paths), vec!["$.schoolReference.schoolId"]);
    Ok(())
}

#[test]
fn test_extension_without_core_dependency_keeps_going() -> Result<()> {
    let mut repository = repository(extension(Some(&[])))?;
    let results = enhance(&mut repository);
    let errors: Vec<&str> = results
        .iter()
        .flat_map(|result| &result.diagnostics)
        .filter(|diagnostic| diagnostic.category == Severity::Error)
        .map(|diagnostic| diagnostic.message.as_str())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Domain Entity property School on Domain Entity Bus references EdFi.School, which could not be resolved."
        ]
    );

    let bus = repository.entity(find(&repository, "Sample", "Bus")?);
    let mapping = bus.data.json_paths_mapping.get().unwrap();
    assert!(!mapping.contains_key("School"));
    assert!(mapping.contains_key("BusId"));
    assert!(bus.data.json_schema_for_insert.is_computed());
    Ok(())
}

#[test]
fn test_resolution_is_repeatable() -> Result<()> {
    let mut once = repository(extension(None))?;
    resolve_references(&mut once);
    let mut twice = once.clone();
    let result = resolve_references(&mut twice);
    assert!(result.diagnostics.is_empty());
    assert_eq!(once, twice);

    let school = find(&once, "EdFi", "School")?;
    assert_eq!(once.entity(school).kind, EntityKind::DomainEntitySubclass);
    Ok(())
}

#[test]
fn test_unresolved_identity_reference_is_left_out_of_every_identity_output() -> Result<()> {
    let stream = core()
        .begin_namespace_with_dependencies("Sample", Some("Sample"), &[])
        .domain_entity("Bus")
        .string_identity("BusId")
        .domain_entity_identity("EdFi.School", None)
        .end_entity()
        .end_namespace();
    let mut repository = repository(stream)?;
    enhance(&mut repository);
    let data = &repository.entity(find(&repository, "Sample", "Bus")?).data;

    assert_eq!(
        data.identity_full_names.get().cloned().unwrap_or_default(),
        vec!["BusId"]
    );
    let leaves: Vec<Vec<String>> = data
        .flattened_identity_properties
        .get()
        .into_iter()
        .flatten()
        .map(|leaf| leaf.property_paths.clone())
        .collect();
    assert_eq!(leaves, vec![vec!["BusId".to_string()]]);
    assert_eq!(
        strings(data.identity_json_paths.get().map_or(&[][..], Vec::as_slice)),
        vec!["$.busId"]
    );
    let schema = data.json_schema_for_insert.get().cloned().unwrap_or_default();
    assert_eq!(schema["required"], serde_json::json!(["busId"]));
    Ok(())
}
