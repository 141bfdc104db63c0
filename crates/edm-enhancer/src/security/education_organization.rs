//! Education organization securable elements

use super::hierarchy::hierarchy_members;
use super::{has_role_name, leaf_json_paths};
use crate::pipeline::EnhancerResult;
use edm_model::{
    EducationOrganizationSecurableElement, EntityId, NamespaceId, Property, Repository,
};
use std::collections::HashSet;

pub const EDUCATION_ORGANIZATION_SECURABLE_ELEMENT: &str =
    "EducationOrganizationSecurableElementEnhancer";

const EDUCATION_ORGANIZATION_ID: &str = "EducationOrganizationId";

fn is_organization_identity(
    repository: &Repository,
    members: &HashSet<(NamespaceId, &str)>,
    property: &Property,
) -> bool {
    let parent = repository.entity(property.parent);
    if !members.contains(&(parent.namespace, parent.name.as_str())) {
        return false;
    }
    property.full_name() == EDUCATION_ORGANIZATION_ID
        || (property.is_identity_rename
            && property.base_key_name.as_deref() == Some(EDUCATION_ORGANIZATION_ID))
}

fn organization_elements(
    repository: &Repository,
    members: &HashSet<(NamespaceId, &str)>,
    entity: EntityId,
) -> Vec<EducationOrganizationSecurableElement> {
    let data = &repository.entity(entity).data;
    let (Some(flattened), Some(mapping)) = (
        data.flattened_identity_properties.get(),
        data.json_paths_mapping.get(),
    ) else {
        return Vec::new();
    };

    let mut elements: Vec<EducationOrganizationSecurableElement> = Vec::new();
    for leaf in flattened {
        let property = repository.property(leaf.identity_property);
        if !is_organization_identity(repository, members, property)
            || has_role_name(repository, &leaf.property_chain)
        {
            continue;
        }
        let Some(first) = leaf.property_chain.first() else {
            continue;
        };
        let property_name = repository.property(*first).full_name();
        for json_path in leaf_json_paths(mapping, leaf) {
            if elements.iter().all(|element| &element.json_path != json_path) {
                elements.push(EducationOrganizationSecurableElement {
                    json_path: json_path.clone(),
                    property_name: property_name.clone(),
                });
            }
        }
    }
    elements
}

/// Record where each resource's identity reaches an education organization.
pub fn education_organization_securable_elements(repository: &mut Repository) -> EnhancerResult {
    let elements: Vec<_> = {
        let members = hierarchy_members(repository);
        repository
            .entities()
            .filter(|entity| entity.kind.is_top_level_entity())
            .map(|entity| (entity.id, organization_elements(repository, &members, entity.id)))
            .collect()
    };

    for (entity, elements) in elements {
        repository
            .entity_mut(entity)
            .data
            .education_organization_securable_elements
            .set(elements);
    }
    EnhancerResult::success(EDUCATION_ORGANIZATION_SECURABLE_ELEMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{enhanced_through, entity_id};
    use edm_builder::EventStreamBuilder;
    use edm_model::JsonPath;
    use pretty_assertions::assert_eq;

    fn organizations() -> EventStreamBuilder {
        EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .abstract_entity("EducationOrganization")
            .integer_identity("EducationOrganizationId")
            .end_entity()
            .domain_entity_subclass("School", "EducationOrganization")
            .integer_identity_rename("SchoolId", "EducationOrganizationId")
            .end_entity()
    }

    fn elements_of(
        repository: &Repository,
        name: &str,
    ) -> Vec<EducationOrganizationSecurableElement> {
        repository
            .entity(entity_id(repository, name))
            .data
            .education_organization_securable_elements
            .get()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_references_to_organizations() {
        let stream = organizations()
            .domain_entity("Session")
            .domain_entity_identity("School", None)
            .string_identity("SessionName")
            .end_entity()
            .domain_entity("Grade")
            .domain_entity_identity("Session", None)
            .domain_entity_identity("EducationOrganization", None)
            .end_entity()
            .end_namespace();
        let (repository, _) =
            enhanced_through(stream, EDUCATION_ORGANIZATION_SECURABLE_ELEMENT);

        assert_eq!(
            elements_of(&repository, "Session"),
            vec![EducationOrganizationSecurableElement {
                json_path: JsonPath::new("$.schoolReference.schoolId"),
                property_name: "School".to_string(),
            }]
        );
        assert_eq!(
            elements_of(&repository, "Grade"),
            vec![
                EducationOrganizationSecurableElement {
                    json_path: JsonPath::new("$.educationOrganizationReference.educationOrganizationId"),
                    property_name: "EducationOrganization".to_string(),
                },
                EducationOrganizationSecurableElement {
                    json_path: JsonPath::new("$.sessionReference.schoolId"),
                    property_name: "Session".to_string(),
                },
            ]
        );
        assert_eq!(
            elements_of(&repository, "School"),
            vec![EducationOrganizationSecurableElement {
                json_path: JsonPath::new("$.schoolId"),
                property_name: "SchoolId".to_string(),
            }]
        );
    }

    #[test]
    fn test_role_named_reference_is_not_securable() {
        let stream = organizations()
            .domain_entity("StudentTransfer")
            .domain_entity_identity("School", Some("Receiving"))
            .string_identity("TransferCode")
            .end_entity()
            .end_namespace();
        let (repository, _) =
            enhanced_through(stream, EDUCATION_ORGANIZATION_SECURABLE_ELEMENT);
        assert!(elements_of(&repository, "StudentTransfer").is_empty());
    }
}
