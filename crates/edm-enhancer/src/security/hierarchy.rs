//! Education organization hierarchy, per namespace

use crate::pipeline::EnhancerResult;
use crate::resolver::base_chain;
use edm_model::{EntityId, EntityKind, NamespaceId, PropertyKind, Repository};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const EDUCATION_ORGANIZATION_HIERARCHY: &str = "EducationOrganizationHierarchyEnhancer";

/// Name of the abstract root of every education organization type.
pub const EDUCATION_ORGANIZATION: &str = "EducationOrganization";

fn is_root(repository: &Repository, entity: EntityId) -> bool {
    let entity = repository.entity(entity);
    entity.kind == EntityKind::DomainEntity && entity.name == EDUCATION_ORGANIZATION
}

/// Whether `entity` is the education organization root or a subclass of it.
#[must_use]
pub fn is_education_organization(repository: &Repository, entity: EntityId) -> bool {
    match repository.entity(entity).kind {
        EntityKind::DomainEntity => is_root(repository, entity),
        EntityKind::DomainEntitySubclass => base_chain(repository, entity)
            .iter()
            .skip(1)
            .any(|base| is_root(repository, *base)),
        _ => false,
    }
}

/// Hierarchy and ordered type names of the education organizations declared in `namespace`.
#[must_use]
pub fn namespace_hierarchy(
    repository: &Repository,
    namespace: NamespaceId,
) -> (BTreeMap<String, Vec<String>>, Vec<String>) {
    let organizations: Vec<EntityId> = repository
        .namespace(namespace)
        .entities
        .iter()
        .copied()
        .filter(|entity| is_education_organization(repository, *entity))
        .collect();

    let mut hierarchy = BTreeMap::new();
    for entity in &organizations {
        let mut composed: Vec<String> = Vec::new();
        for property in repository.properties_of(*entity) {
            if property.kind != PropertyKind::DomainEntity || property.is_part_of_identity {
                continue;
            }
            let Some(target) = property.referenced_entity else {
                continue;
            };
            if target == *entity || !is_education_organization(repository, target) {
                continue;
            }
            let name = &repository.entity(target).name;
            if !composed.contains(name) {
                composed.push(name.clone());
            }
        }
        hierarchy.insert(repository.entity(*entity).name.clone(), composed);
    }

    let (roots, mut subclasses): (Vec<EntityId>, Vec<EntityId>) = organizations
        .into_iter()
        .partition(|entity| is_root(repository, *entity));
    subclasses.sort_by(|a, b| repository.entity(*a).name.cmp(&repository.entity(*b).name));
    let types = subclasses
        .into_iter()
        .chain(roots)
        .map(|entity| repository.entity(entity).name.clone())
        .collect();

    (hierarchy, types)
}

/// Education organization entities named by every namespace hierarchy.
pub(crate) fn hierarchy_members(repository: &Repository) -> HashSet<(NamespaceId, &str)> {
    repository
        .namespace_ids()
        .flat_map(|namespace| {
            repository
                .namespace(namespace)
                .data
                .education_organization_hierarchy
                .get()
                .into_iter()
                .flat_map(BTreeMap::keys)
                .map(move |name| (namespace, name.as_str()))
        })
        .collect()
}

/// Record the education organization hierarchy of every namespace.
pub fn build_hierarchies(repository: &mut Repository) -> EnhancerResult {
    let hierarchies: Vec<_> = repository
        .namespace_ids()
        .map(|namespace| (namespace, namespace_hierarchy(repository, namespace)))
        .collect();

    for (namespace, (hierarchy, types)) in hierarchies {
        debug!(
            namespace = %repository.namespace(namespace).name,
            types = types.len(),
            "education organization hierarchy"
        );
        let data = &mut repository.namespace_mut(namespace).data;
        data.education_organization_hierarchy.set(hierarchy);
        data.education_organization_types.set(types);
    }
    EnhancerResult::success(EDUCATION_ORGANIZATION_HIERARCHY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::enhanced_through;
    use edm_builder::EventStreamBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subclasses_compose_other_organizations() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .abstract_entity("EducationOrganization")
            .integer_identity("EducationOrganizationId")
            .end_entity()
            .domain_entity_subclass("LocalEducationAgency", "EducationOrganization")
            .integer_identity_rename("LocalEducationAgencyId", "EducationOrganizationId")
            .end_entity()
            .domain_entity_subclass("School", "EducationOrganization")
            .integer_identity_rename("SchoolId", "EducationOrganizationId")
            .domain_entity_property("LocalEducationAgency", false, None)
            .end_entity()
            .domain_entity("Program")
            .string_identity("ProgramName")
            .end_entity()
            .end_namespace();
        let (repository, _) = enhanced_through(stream, EDUCATION_ORGANIZATION_HIERARCHY);

        let namespace = repository.namespace_named("EdFi").unwrap();
        let data = &repository.namespace(namespace).data;
        let expected: BTreeMap<String, Vec<String>> = [
            ("EducationOrganization", vec![]),
            ("LocalEducationAgency", vec![]),
            ("School", vec!["LocalEducationAgency".to_string()]),
        ]
        .into_iter()
        .map(|(name, composed)| (name.to_string(), composed))
        .collect();
        assert_eq!(data.education_organization_hierarchy.get(), Some(&expected));
        assert_eq!(
            data.education_organization_types.get().unwrap(),
            &vec!["LocalEducationAgency", "School", "EducationOrganization"]
        );
    }

    #[test]
    fn test_namespace_without_organizations_is_empty() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .domain_entity("Program")
            .string_identity("ProgramName")
            .end_entity()
            .end_namespace();
        let (repository, _) = enhanced_through(stream, EDUCATION_ORGANIZATION_HIERARCHY);
        let namespace = repository.namespace_named("EdFi").unwrap();
        let data = &repository.namespace(namespace).data;
        assert!(data.education_organization_hierarchy.get().unwrap().is_empty());
        assert!(data.education_organization_types.get().unwrap().is_empty());
    }
}
