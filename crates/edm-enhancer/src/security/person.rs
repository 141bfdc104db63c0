//! Student, staff and contact securable elements

use super::{has_role_name, leaf_json_paths};
use crate::pipeline::EnhancerResult;
use edm_model::{Computed, EntityData, EntityId, JsonPath, Repository};

pub const STUDENT_SECURABLE_ELEMENT: &str = "StudentSecurableElementEnhancer";
pub const STAFF_SECURABLE_ELEMENT: &str = "StaffSecurableElementEnhancer";
pub const CONTACT_SECURABLE_ELEMENT: &str = "ContactSecurableElementEnhancer";

/// JSON paths of `concept`'s unique id within the identity of `entity`.
///
/// The leaf must be `<concept>UniqueId` declared on the entity named `concept`, reached without
/// passing a role-named property.
#[must_use]
pub fn person_securable_paths(
    repository: &Repository,
    entity: EntityId,
    concept: &str,
) -> Vec<JsonPath> {
    let data = &repository.entity(entity).data;
    let (Some(flattened), Some(mapping)) = (
        data.flattened_identity_properties.get(),
        data.json_paths_mapping.get(),
    ) else {
        return Vec::new();
    };
    let unique_id = format!("{concept}UniqueId");

    let mut paths: Vec<JsonPath> = flattened
        .iter()
        .filter(|leaf| {
            let property = repository.property(leaf.identity_property);
            property.full_name() == unique_id
                && repository.entity(property.parent).name == concept
                && leaf
                    .property_chain
                    .split_last()
                    .is_some_and(|(_, before)| !has_role_name(repository, before))
        })
        .flat_map(|leaf| leaf_json_paths(mapping, leaf).iter().cloned())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

fn securable_elements(
    repository: &mut Repository,
    enhancer_name: &'static str,
    concept: &str,
    slot: fn(&mut EntityData) -> &mut Computed<Vec<JsonPath>>,
) -> EnhancerResult {
    let elements: Vec<(EntityId, Vec<JsonPath>)> = repository
        .entities()
        .filter(|entity| entity.kind.is_top_level_entity())
        .map(|entity| (entity.id, person_securable_paths(repository, entity.id, concept)))
        .collect();

    for (entity, paths) in elements {
        slot(&mut repository.entity_mut(entity).data).set(paths);
    }
    EnhancerResult::success(enhancer_name)
}

pub fn student_securable_elements(repository: &mut Repository) -> EnhancerResult {
    securable_elements(repository, STUDENT_SECURABLE_ELEMENT, "Student", |data| {
        &mut data.student_securable_elements
    })
}

pub fn staff_securable_elements(repository: &mut Repository) -> EnhancerResult {
    securable_elements(repository, STAFF_SECURABLE_ELEMENT, "Staff", |data| {
        &mut data.staff_securable_elements
    })
}

pub fn contact_securable_elements(repository: &mut Repository) -> EnhancerResult {
    securable_elements(repository, CONTACT_SECURABLE_ELEMENT, "Contact", |data| {
        &mut data.contact_securable_elements
    })
}
