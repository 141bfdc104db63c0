#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edm-model
//!
//! Entity graph for education data model definitions.
//!
//! The graph is a flat arena of namespaces, entities and properties addressed by
//! stable integer handles. Cross references (property to target entity, subclass to
//! base entity) are stored as handles, and everything the enhancer pipeline derives
//! lives in closed per-entity, per-property and per-namespace data structs.

/// Derived-data structs written by the enhancer pipeline.
pub mod derived;
/// Entities, properties and builder declarations.
pub mod entity;
/// Arena handles.
pub mod ids;
/// Entity and property kinds.
pub mod kind;
/// Source maps and diagnostics.
pub mod metadata;
/// Namespaces.
pub mod namespace;
/// The arena repository.
pub mod repository;

pub use derived::{
    ApiPropertyMapping, ApiShape, ArrayUniquenessConstraint, CollectedProperty, Computed,
    DocumentPaths, EducationOrganizationSecurableElement, EntityData, EqualityConstraint,
    FlattenedIdentityProperty, JsonPath, JsonPathsInfo, JsonPathsMapping, NamespaceData,
    NestedUniquenessConstraint, PropertyData, PropertyModifier, PropertyPath, QueryField,
    QueryFieldMapping, ReferenceComponent, ReferenceJsonPaths,
};
pub use entity::{
    Entity, EntityDeclaration, MergeDirective, Property, PropertyDeclaration, full_property_name,
};
pub use ids::{EntityId, NamespaceId, PropertyId};
pub use kind::{EntityKind, PathType, PropertyKind};
pub use metadata::{Diagnostic, DiagnosticCounts, Severity, SourceMap};
pub use namespace::{Namespace, NamespaceDeclaration};
pub use repository::Repository;

use thiserror::Error;

/// Errors that can occur when working with the model
#[derive(Error, Debug)]
pub enum Error {
    #[error("{} named {name} is already declared as {existing}", .kind.humanized())]
    DuplicateEntity {
        kind: EntityKind,
        name: String,
        existing: EntityId,
    },

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),
}

impl Error {
    /// Build a namespace-not-found error.
    pub fn namespace_not_found(name: impl Into<String>) -> Self {
        Self::NamespaceNotFound(name.into())
    }
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
