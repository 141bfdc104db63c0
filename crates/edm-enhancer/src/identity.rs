//! Identity: reference components, flattened identity and identity full names
//!
//! A referential or common identity property stands for the identity of its target. The
//! components of such a property form a tree whose leaves are the scalar properties that
//! finally make up the natural key; flattening walks that tree and records, for every leaf,
//! the property paths and the chain of properties followed to reach it.

use crate::collecting::collected_ids;
use crate::pipeline::EnhancerResult;
use edm_model::{
    Diagnostic, EntityId, EntityKind, FlattenedIdentityProperty, PropertyId, PropertyKind,
    ReferenceComponent, Repository,
};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const REFERENCE_COMPONENT: &str = "ReferenceComponentEnhancer";
pub const API_ENTITY_MAPPING: &str = "ApiEntityMappingEnhancer";
pub const IDENTITY_FULLNAME: &str = "IdentityFullnameEnhancer";

/// Full names of the implicit descriptor identity.
pub const DESCRIPTOR_IDENTITY_FULL_NAMES: [&str; 2] = ["CodeValue", "Namespace"];

/// Whether the identity of a property of this kind is that of its target.
fn groups_target_identity(kind: PropertyKind) -> bool {
    kind.is_referential() || matches!(kind, PropertyKind::Common | PropertyKind::InlineCommon)
}

/// Identity properties of an entity, sorted by full name.
///
/// A reference whose target could not be resolved has no identity to contribute and is left
/// out, as it is left out of the JSON paths.
fn identity_properties(repository: &Repository, entity: EntityId) -> Vec<PropertyId> {
    let mut identity: Vec<PropertyId> = collected_ids(repository, entity)
        .into_iter()
        .filter(|id| {
            let property = repository.property(*id);
            property.is_part_of_identity
                && !(groups_target_identity(property.kind) && property.referenced_entity.is_none())
        })
        .collect();
    identity.sort_by_cached_key(|id| repository.property(*id).full_name());
    identity
}

struct ComponentBuilder<'a> {
    repository: &'a Repository,
    identities: &'a HashMap<EntityId, Vec<PropertyId>>,
    visiting: Vec<EntityId>,
    diagnostics: Vec<Diagnostic>,
}

impl ComponentBuilder<'_> {
    fn component(&mut self, property_id: PropertyId) -> ReferenceComponent {
        let property = self.repository.property(property_id);
        let target = property
            .referenced_entity
            .filter(|_| groups_target_identity(property.kind));
        let Some(target) = target else {
            return ReferenceComponent::Element {
                source: property_id,
            };
        };

        if self.visiting.contains(&target) {
            let message = format!(
                "Identity of {} refers back to itself through property {}.",
                self.repository.entity(target).name,
                property.full_name()
            );
            warn!("{message}");
            self.diagnostics.push(Diagnostic::error(
                REFERENCE_COMPONENT,
                message,
                property.source_map.clone(),
            ));
            return ReferenceComponent::Element {
                source: property_id,
            };
        }

        self.visiting.push(target);
        let components = self
            .identities
            .get(&target)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|identity| self.component(identity))
            .collect();
        self.visiting.pop();

        ReferenceComponent::Group {
            source: property_id,
            components,
        }
    }
}

/// Compute identity properties of every entity and the reference component of every property.
pub fn build_reference_components(repository: &mut Repository) -> EnhancerResult {
    let identities: HashMap<EntityId, Vec<PropertyId>> = repository
        .entity_ids()
        .map(|entity| (entity, identity_properties(repository, entity)))
        .collect();

    let mut builder = ComponentBuilder {
        repository: &*repository,
        identities: &identities,
        visiting: Vec::new(),
        diagnostics: Vec::new(),
    };
    let components: Vec<(PropertyId, ReferenceComponent)> = repository
        .property_ids()
        .map(|property| {
            builder.visiting.clear();
            builder.visiting.push(repository.property(property).parent);
            (property, builder.component(property))
        })
        .collect();
    let diagnostics = builder.diagnostics;

    for (entity, identity) in identities {
        repository
            .entity_mut(entity)
            .data
            .identity_properties
            .set(identity);
    }
    for (property, component) in components {
        repository
            .property_mut(property)
            .data
            .reference_component
            .set(component);
    }
    EnhancerResult::new(REFERENCE_COMPONENT, diagnostics)
}

fn flatten_component(
    repository: &Repository,
    component: &ReferenceComponent,
    property_paths: Vec<String>,
    property_chain: Vec<PropertyId>,
    flattened: &mut Vec<FlattenedIdentityProperty>,
) {
    match component {
        ReferenceComponent::Element { source } => flattened.push(FlattenedIdentityProperty {
            identity_property: *source,
            property_paths,
            property_chain,
        }),
        ReferenceComponent::Group { components, .. } => {
            let path = property_paths.last().cloned().unwrap_or_default();
            for sub_component in components {
                let sub_property = sub_component.source();
                let mut paths = property_paths.clone();
                paths.push(format!("{path}.{}", repository.property(sub_property).full_name()));
                let mut chain = property_chain.clone();
                chain.push(sub_property);
                flatten_component(repository, sub_component, paths, chain, flattened);
            }
        }
    }
}

/// Flattened identity of one entity, in identity property order.
#[must_use]
pub fn flattened_identity(
    repository: &Repository,
    entity: EntityId,
) -> Vec<FlattenedIdentityProperty> {
    let mut flattened = Vec::new();
    let identity = repository
        .entity(entity)
        .data
        .identity_properties
        .get()
        .cloned()
        .unwrap_or_default();

    for property_id in identity {
        let property = repository.property(property_id);
        let Some(component) = property.data.reference_component.get() else {
            continue;
        };
        flatten_component(
            repository,
            component,
            vec![property.full_name()],
            vec![property_id],
            &mut flattened,
        );
    }
    flattened
}

/// Flatten the identity of every domain entity and association.
pub fn flatten_identities(repository: &mut Repository) -> EnhancerResult {
    let flattened: Vec<_> = repository
        .entities()
        .filter(|entity| entity.kind.is_top_level_entity())
        .map(|entity| (entity.id, flattened_identity(repository, entity.id)))
        .collect();

    debug!(entities = flattened.len(), "flattened identities");
    for (entity, identity) in flattened {
        repository
            .entity_mut(entity)
            .data
            .flattened_identity_properties
            .set(identity);
    }
    EnhancerResult::success(API_ENTITY_MAPPING)
}

/// Record the leaf property paths of each resource identity.
pub fn build_identity_full_names(repository: &mut Repository) -> EnhancerResult {
    let full_names: Vec<(EntityId, Vec<String>)> = repository
        .entities()
        .filter_map(|entity| {
            if entity.kind == EntityKind::Descriptor {
                let names = DESCRIPTOR_IDENTITY_FULL_NAMES.map(str::to_string).to_vec();
                return Some((entity.id, names));
            }
            let flattened = entity.data.flattened_identity_properties.get()?;
            let names = flattened
                .iter()
                .filter_map(|leaf| leaf.leaf_path().map(str::to_string))
                .collect();
            Some((entity.id, names))
        })
        .collect();

    for (entity, names) in full_names {
        repository
            .entity_mut(entity)
            .data
            .identity_full_names
            .set(names);
    }
    EnhancerResult::success(IDENTITY_FULLNAME)
}
