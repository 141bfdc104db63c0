//! Namespace securable elements

use super::has_role_name;
use crate::collecting::collected_ids;
use crate::pipeline::EnhancerResult;
use edm_model::{EntityId, EntityKind, JsonPath, Property, PropertyKind, Repository};

pub const NAMESPACE_SECURABLE_ELEMENT: &str = "NamespaceSecurableElementEnhancer";

const NAMESPACE: &str = "Namespace";
const URI: &str = "URI";

/// A `Namespace` property over the `URI` shared string, without a role name.
fn is_namespace_property(property: &Property) -> bool {
    property.kind == PropertyKind::SharedString
        && property.name == NAMESPACE
        && property.referenced_type.as_deref() == Some(URI)
        && !property.has_role_name()
}

/// Property path, relative to `target`, of a namespace property in its identity.
fn identity_namespace_path(repository: &Repository, target: EntityId) -> Option<String> {
    repository
        .entity(target)
        .data
        .flattened_identity_properties
        .get()?
        .iter()
        .find(|leaf| {
            is_namespace_property(repository.property(leaf.identity_property))
                && !has_role_name(repository, &leaf.property_chain)
        })
        .and_then(|leaf| leaf.leaf_path().map(str::to_string))
}

/// Paths at which a namespace URI appears in the documents of `entity`.
#[must_use]
pub fn namespace_securable_paths(repository: &Repository, entity: EntityId) -> Vec<JsonPath> {
    let entity_ref = repository.entity(entity);
    if entity_ref.kind == EntityKind::Descriptor {
        return vec![JsonPath::root().field("namespace")];
    }
    let Some(mapping) = entity_ref.data.json_paths_mapping.get() else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    for property_id in collected_ids(repository, entity) {
        let property = repository.property(property_id);
        let key = if is_namespace_property(property) {
            if !(property.is_part_of_identity || property.is_required) {
                continue;
            }
            property.full_name()
        } else if property.kind.is_referential() && !property.has_role_name() {
            let Some(path) = property
                .referenced_entity
                .and_then(|target| identity_namespace_path(repository, target))
            else {
                continue;
            };
            format!("{}.{path}", property.full_name())
        } else {
            continue;
        };
        if let Some(info) = mapping.get(&key) {
            paths.extend(info.json_paths.iter().cloned());
        }
    }
    paths.sort();
    paths.dedup();
    paths
}

/// Record namespace securable elements of every resource and descriptor.
pub fn namespace_securable_elements(repository: &mut Repository) -> EnhancerResult {
    let elements: Vec<(EntityId, Vec<JsonPath>)> = repository
        .entities()
        .filter(|entity| {
            entity.kind.is_top_level_entity() || entity.kind == EntityKind::Descriptor
        })
        .map(|entity| (entity.id, namespace_securable_paths(repository, entity.id)))
        .collect();

    for (entity, paths) in elements {
        repository
            .entity_mut(entity)
            .data
            .namespace_securable_elements
            .set(paths);
    }
    EnhancerResult::success(NAMESPACE_SECURABLE_ELEMENT)
}
