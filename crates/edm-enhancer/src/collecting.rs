//! Property collecting
//!
//! Produces the effective ordered property list of every entity. Subclasses see their base
//! entity's properties first, with identity renames standing in for the base identity
//! property they rename, followed by their own remaining properties.

use crate::pipeline::EnhancerResult;
use edm_model::{
    CollectedProperty, Diagnostic, EntityId, EntityKind, PropertyId, PropertyModifier, Repository,
};
use tracing::{debug, warn};

pub const NAMING_COLLISION: &str = "SubclassPropertyNamingCollisionEnhancer";
pub const PROPERTY_COLLECTING: &str = "PropertyCollectingEnhancer";
pub const SUBCLASS_PROPERTY_COLLECTING: &str = "SubclassPropertyCollectingEnhancer";

/// Declared properties of every base entity above `entity`.
fn inherited_properties(repository: &Repository, entity: EntityId) -> Vec<PropertyId> {
    crate::resolver::base_chain(repository, entity)
        .into_iter()
        .skip(1)
        .flat_map(|base| repository.entity(base).properties.clone())
        .collect()
}

/// Qualify subclass properties that share a name with a differently-kinded base property.
pub fn qualify_colliding_subclass_properties(repository: &mut Repository) -> EnhancerResult {
    let mut diagnostics = Vec::new();
    let mut collisions = Vec::new();

    for entity in repository.entities().filter(|entity| entity.kind.is_subclass()) {
        let inherited = inherited_properties(repository, entity.id);
        let namespace = &repository.namespace(entity.namespace).name;

        for property in repository.properties_of(entity.id) {
            if property.is_identity_rename {
                continue;
            }
            let full_name = property.full_name();
            let Some(base_property) = inherited
                .iter()
                .map(|id| repository.property(*id))
                .find(|base| base.full_name() == full_name && base.kind != property.kind)
            else {
                continue;
            };

            let base = repository.entity(base_property.parent);
            let message = format!(
                "{} property {full_name} on {} {} has the same name as {} property {full_name} on {}. It is prefixed with {namespace} in the API.",
                property.kind.humanized(),
                entity.kind.humanized(),
                entity.name,
                base_property.kind.humanized(),
                base.name
            );
            warn!("{message}");
            diagnostics.push(Diagnostic::warning(
                NAMING_COLLISION,
                message,
                property.source_map.clone(),
            ));
            collisions.push((property.id, namespace.clone()));
        }
    }

    for (property, qualifier) in collisions {
        repository
            .property_mut(property)
            .data
            .collision_qualifier
            .set(qualifier);
    }
    EnhancerResult::new(NAMING_COLLISION, diagnostics)
}

/// Collect the declared properties of every entity that is not a subclass.
pub fn collect_properties(repository: &mut Repository) -> EnhancerResult {
    let collected: Vec<(EntityId, Vec<CollectedProperty>)> = repository
        .entities()
        .filter(|entity| !entity.kind.is_subclass())
        .map(|entity| {
            let modifier = PropertyModifier {
                optional_due_to_parent: entity.kind == EntityKind::Choice,
                parent_prefixes: Vec::new(),
            };
            let properties = entity
                .properties
                .iter()
                .map(|property| CollectedProperty {
                    property: *property,
                    modifier: modifier.clone(),
                })
                .collect();
            (entity.id, properties)
        })
        .collect();

    debug!(entities = collected.len(), "collected declared properties");
    for (entity, properties) in collected {
        repository
            .entity_mut(entity)
            .data
            .collected_properties
            .set(properties);
    }
    EnhancerResult::success(PROPERTY_COLLECTING)
}

/// Collect base properties followed by own properties for every subclass.
///
/// A subclass property repeating an inherited property of the same name and kind is dropped
/// with a warning; the inherited property keeps its place.
pub fn collect_subclass_properties(repository: &mut Repository) -> EnhancerResult {
    let mut diagnostics = Vec::new();
    let collected: Vec<(EntityId, Vec<CollectedProperty>)> = repository
        .entities()
        .filter(|entity| entity.kind.is_subclass())
        .map(|entity| {
            (
                entity.id,
                subclass_properties(repository, entity.id, &mut diagnostics),
            )
        })
        .collect();

    for (entity, properties) in collected {
        repository
            .entity_mut(entity)
            .data
            .collected_properties
            .set(properties);
    }
    EnhancerResult::new(SUBCLASS_PROPERTY_COLLECTING, diagnostics)
}

fn subclass_properties(
    repository: &Repository,
    subclass: EntityId,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CollectedProperty> {
    let entity = repository.entity(subclass);
    let own: Vec<PropertyId> = entity.properties.clone();
    let inherited: Vec<CollectedProperty> = entity
        .base_entity
        .and_then(|base| repository.entity(base).data.collected_properties.get().cloned())
        .unwrap_or_default();

    let mut used = Vec::new();
    let mut collected: Vec<CollectedProperty> = inherited
        .into_iter()
        .map(|base_property| {
            let base_name = repository.property(base_property.property).full_name();
            let rename = own.iter().copied().find(|id| {
                let property = repository.property(*id);
                property.is_identity_rename
                    && property.base_key_name.as_deref() == Some(base_name.as_str())
                    && !used.contains(id)
            });
            match rename {
                Some(rename) => {
                    used.push(rename);
                    CollectedProperty {
                        property: rename,
                        modifier: PropertyModifier::default(),
                    }
                }
                None => base_property,
            }
        })
        .collect();

    for id in &own {
        if used.contains(id) {
            continue;
        }
        let property = repository.property(*id);
        let full_name = property.full_name();
        let repeated = collected.iter().map(|c| repository.property(c.property)).find(|base| {
            base.parent != subclass && base.kind == property.kind && base.full_name() == full_name
        });
        let Some(base_property) = repeated else {
            continue;
        };
        let message = format!(
            "{} property {full_name} on {} {} repeats the inherited property of {}. It is ignored.",
            property.kind.humanized(),
            entity.kind.humanized(),
            entity.name,
            repository.entity(base_property.parent).name
        );
        warn!("{message}");
        diagnostics.push(Diagnostic::warning(
            SUBCLASS_PROPERTY_COLLECTING,
            message,
            property.source_map.clone(),
        ));
        used.push(*id);
    }

    collected.extend(
        own.into_iter()
            .filter(|id| !used.contains(id))
            .map(|property| CollectedProperty {
                property,
                modifier: PropertyModifier::default(),
            }),
    );
    collected
}

/// Collected property ids of an entity, empty until collected.
pub fn collected_ids(repository: &Repository, entity: EntityId) -> Vec<PropertyId> {
    repository
        .entity(entity)
        .data
        .collected_properties
        .get()
        .map(|collected| collected.iter().map(|c| c.property).collect())
        .unwrap_or_default()
}
