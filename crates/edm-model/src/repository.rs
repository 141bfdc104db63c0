//! Arena repository of namespaces, entities and properties

use crate::derived::{EntityData, NamespaceData, PropertyData};
use crate::entity::{Entity, EntityDeclaration, Property};
use crate::ids::{EntityId, NamespaceId, PropertyId};
use crate::kind::EntityKind;
use crate::namespace::{Namespace, NamespaceDeclaration};
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::trace;

/// Registry holding every declared construct, keyed by (namespace, kind, name).
///
/// Entities are append-only: a second declaration of the same key is rejected and the
/// original is retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    namespaces: Vec<Namespace>,
    entities: Vec<Entity>,
    properties: Vec<Property>,
    namespace_index: HashMap<String, NamespaceId>,
    entity_index: HashMap<(NamespaceId, EntityKind, String), EntityId>,
}

impl Repository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            namespaces: Vec::new(),
            entities: Vec::new(),
            properties: Vec::new(),
            namespace_index: HashMap::new(),
            entity_index: HashMap::new(),
        }
    }

    /// Register a namespace, or return the existing one of the same name so that a
    /// namespace may span several sources.
    pub fn add_namespace(&mut self, declaration: NamespaceDeclaration) -> NamespaceId {
        if let Some(existing) = self.namespace_index.get(&declaration.name) {
            return *existing;
        }

        let id = NamespaceId::new(self.namespaces.len());
        let project_name = declaration
            .project_extension
            .clone()
            .unwrap_or_else(|| declaration.name.clone());
        trace!(namespace = %declaration.name, "registering namespace");
        self.namespace_index.insert(declaration.name.clone(), id);
        self.namespaces.push(Namespace {
            id,
            is_extension: declaration.project_extension.is_some(),
            name: declaration.name,
            project_extension: declaration.project_extension,
            project_name,
            dependency_names: declaration.dependency_names,
            dependencies: Vec::new(),
            entities: Vec::new(),
            source_map: declaration.source_map,
            data: NamespaceData::default(),
        });
        id
    }

    /// Insert an entity and its properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntity`] carrying the retained entity when the
    /// (namespace, kind, name) key is already taken.
    pub fn declare(&mut self, declaration: EntityDeclaration) -> Result<EntityId> {
        let key = (
            declaration.namespace,
            declaration.kind,
            declaration.name.clone(),
        );
        if let Some(existing) = self.entity_index.get(&key) {
            return Err(Error::DuplicateEntity {
                kind: declaration.kind,
                name: declaration.name,
                existing: *existing,
            });
        }

        let entity_id = EntityId::new(self.entities.len());
        let mut property_ids = Vec::with_capacity(declaration.properties.len());
        let mut identity_ids = Vec::new();

        for property in declaration.properties {
            let property_id = PropertyId::new(self.properties.len());
            if property.is_part_of_identity {
                identity_ids.push(property_id);
            }
            property_ids.push(property_id);
            self.properties.push(Property {
                id: property_id,
                kind: property.kind,
                name: property.name,
                parent: entity_id,
                namespace: declaration.namespace,
                referenced_type: property.referenced_type,
                referenced_namespace: property.referenced_namespace,
                documentation: property.documentation,
                documentation_inherited: property.documentation_inherited,
                is_required: property.is_required,
                is_collection: property.is_collection,
                is_part_of_identity: property.is_part_of_identity,
                is_identity_rename: property.is_identity_rename,
                base_key_name: property.base_key_name,
                is_weak: property.is_weak,
                role_name: property.role_name,
                shorten_to: property.shorten_to,
                merge_directives: property.merge_directives,
                referenced_entity: None,
                source_map: property.source_map,
                data: PropertyData::default(),
            });
        }

        trace!(entity = %declaration.name, kind = ?declaration.kind, "declaring entity");
        self.entity_index.insert(key, entity_id);
        self.namespaces[declaration.namespace.index()]
            .entities
            .push(entity_id);
        self.entities.push(Entity {
            id: entity_id,
            kind: declaration.kind,
            name: declaration.name,
            namespace: declaration.namespace,
            documentation: declaration.documentation,
            properties: property_ids,
            identity_properties: identity_ids,
            base_entity_name: declaration.base_entity_name,
            base_entity_namespace: declaration.base_entity_namespace,
            base_entity: None,
            is_abstract: declaration.is_abstract,
            source_map: declaration.source_map,
            data: EntityData::default(),
        });
        Ok(entity_id)
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.index()]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        &mut self.namespaces[id.index()]
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    pub fn namespace_ids(&self) -> impl Iterator<Item = NamespaceId> + use<> {
        (0..self.namespaces.len()).map(NamespaceId::new)
    }

    /// Look up a namespace by name
    pub fn namespace_named(&self, name: &str) -> Option<NamespaceId> {
        self.namespace_index.get(name).copied()
    }

    /// Look up a namespace by name, failing when it was never declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NamespaceNotFound`] for an unknown name.
    pub fn require_namespace(&self, name: &str) -> Result<NamespaceId> {
        self.namespace_named(name)
            .ok_or_else(|| Error::namespace_not_found(name))
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + use<> {
        (0..self.entities.len()).map(EntityId::new)
    }

    /// Entities of any of the given kinds, in declaration order.
    pub fn entities_of_kind(&self, kinds: &[EntityKind]) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|entity| kinds.contains(&entity.kind))
            .map(|entity| entity.id)
            .collect()
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.index()]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut Property {
        &mut self.properties[id.index()]
    }

    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + use<> {
        (0..self.properties.len()).map(PropertyId::new)
    }

    /// Declared properties of an entity, in declaration order.
    pub fn properties_of(&self, entity: EntityId) -> impl Iterator<Item = &Property> {
        self.entity(entity)
            .properties
            .iter()
            .map(|id| self.property(*id))
    }

    /// Find an entity of one of `kinds` named `name` in `namespace`.
    pub fn find_entity(
        &self,
        namespace: NamespaceId,
        kinds: &[EntityKind],
        name: &str,
    ) -> Option<EntityId> {
        kinds.iter().find_map(|kind| {
            self.entity_index
                .get(&(namespace, *kind, name.to_string()))
                .copied()
        })
    }

    /// Name of the namespace owning an entity.
    pub fn namespace_name_of(&self, entity: EntityId) -> &str {
        &self.namespace(self.entity(entity).namespace).name
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
