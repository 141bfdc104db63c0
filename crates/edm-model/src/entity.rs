//! Entities and properties of the model graph
#![allow(clippy::struct_excessive_bools)] // Property flags mirror the language's annotation tokens.

use crate::derived::{EntityData, PropertyData};
use crate::ids::{EntityId, NamespaceId, PropertyId};
use crate::kind::{EntityKind, PropertyKind};
use crate::metadata::SourceMap;

/// An equality assertion between two property paths, declared on a property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeDirective {
    pub source_property_path: String,
    pub target_property_path: String,
    pub source_map: SourceMap,
}

/// A top-level declared construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub namespace: NamespaceId,
    pub documentation: String,
    /// Declaration order, which determines output ordering
    pub properties: Vec<PropertyId>,
    /// Declared identity properties, in declaration order
    pub identity_properties: Vec<PropertyId>,
    pub base_entity_name: Option<String>,
    /// Explicit namespace qualification of the base entity name
    pub base_entity_namespace: Option<String>,
    /// Set by the reference resolver
    pub base_entity: Option<EntityId>,
    pub is_abstract: bool,
    pub source_map: SourceMap,
    pub data: EntityData,
}

/// A named, typed member of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub kind: PropertyKind,
    pub name: String,
    /// Owning entity
    pub parent: EntityId,
    pub namespace: NamespaceId,
    /// Name of the referenced declaration; the shared type for shared simple properties
    pub referenced_type: Option<String>,
    /// Explicit namespace qualification of the referenced declaration
    pub referenced_namespace: Option<String>,
    pub documentation: String,
    pub documentation_inherited: bool,
    pub is_required: bool,
    pub is_collection: bool,
    pub is_part_of_identity: bool,
    pub is_identity_rename: bool,
    pub base_key_name: Option<String>,
    pub is_weak: bool,
    pub role_name: Option<String>,
    pub shorten_to: Option<String>,
    pub merge_directives: Vec<MergeDirective>,
    /// Set by the reference resolver
    pub referenced_entity: Option<EntityId>,
    pub source_map: SourceMap,
    pub data: PropertyData,
}

impl Entity {
    /// `Namespace.Name`, used in diagnostics.
    pub fn qualified_name(&self, namespace_name: &str) -> String {
        format!("{namespace_name}.{}", self.name)
    }
}

impl Property {
    /// Role name prefix plus name. A role name equal to the name adds nothing.
    #[must_use]
    pub fn full_name(&self) -> String {
        full_property_name(self.role_name.as_deref(), &self.name)
    }

    /// Whether the property was declared `with context`.
    #[must_use]
    pub fn has_role_name(&self) -> bool {
        self.role_name.is_some()
    }

    /// Whether this property resolves to another declaration.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        !self.kind.is_simple()
    }
}

/// Role name prefix plus name, as the builder computes it for duplicate detection.
#[must_use]
pub fn full_property_name(role_name: Option<&str>, name: &str) -> String {
    match role_name {
        Some(role) if role != name => format!("{role}{name}"),
        _ => name.to_string(),
    }
}

/// A property as assembled by the builder, before it is given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    pub kind: PropertyKind,
    pub name: String,
    pub referenced_type: Option<String>,
    pub referenced_namespace: Option<String>,
    pub documentation: String,
    pub documentation_inherited: bool,
    pub is_required: bool,
    pub is_collection: bool,
    pub is_part_of_identity: bool,
    pub is_identity_rename: bool,
    pub base_key_name: Option<String>,
    pub is_weak: bool,
    pub role_name: Option<String>,
    pub shorten_to: Option<String>,
    pub merge_directives: Vec<MergeDirective>,
    pub source_map: SourceMap,
}

impl PropertyDeclaration {
    /// A new optional, non-identity property.
    #[must_use]
    pub fn new(kind: PropertyKind, name: impl Into<String>, source_map: SourceMap) -> Self {
        Self {
            kind,
            name: name.into(),
            referenced_type: None,
            referenced_namespace: None,
            documentation: String::new(),
            documentation_inherited: false,
            is_required: false,
            is_collection: false,
            is_part_of_identity: false,
            is_identity_rename: false,
            base_key_name: None,
            is_weak: false,
            role_name: None,
            shorten_to: None,
            merge_directives: Vec::new(),
            source_map,
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        full_property_name(self.role_name.as_deref(), &self.name)
    }
}

/// An entity as assembled by the builder, before it is given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDeclaration {
    pub kind: EntityKind,
    pub name: String,
    pub namespace: NamespaceId,
    pub documentation: String,
    pub base_entity_name: Option<String>,
    pub base_entity_namespace: Option<String>,
    pub is_abstract: bool,
    pub source_map: SourceMap,
    pub properties: Vec<PropertyDeclaration>,
}

impl EntityDeclaration {
    #[must_use]
    pub fn new(
        kind: EntityKind,
        name: impl Into<String>,
        namespace: NamespaceId,
        source_map: SourceMap,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace,
            documentation: String::new(),
            base_entity_name: None,
            base_entity_namespace: None,
            is_abstract: false,
            source_map,
            properties: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_prefixes_distinct_role_names_only() {
        assert_eq!(full_property_name(Some("Contact"), "UniqueId"), "ContactUniqueId");
        assert_eq!(full_property_name(Some("Program"), "Program"), "Program");
        assert_eq!(full_property_name(None, "School"), "School");
    }

    #[test]
    fn declarations_default_to_optional_non_identity() {
        let declaration =
            PropertyDeclaration::new(PropertyKind::Integer, "SchoolId", SourceMap::default());
        assert!(!declaration.is_required);
        assert!(!declaration.is_part_of_identity);
        assert_eq!(declaration.full_name(), "SchoolId");
    }
}
