//! Namespaces: the core data model plus extension projects

use crate::derived::NamespaceData;
use crate::ids::{EntityId, NamespaceId};
use crate::metadata::SourceMap;

/// A namespace and the entities declared in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    /// Label of an extension project; `None` for the core namespace
    pub project_extension: Option<String>,
    pub project_name: String,
    pub is_extension: bool,
    /// Declared dependency names, in declaration order
    pub dependency_names: Vec<String>,
    /// Set by the reference resolver
    pub dependencies: Vec<NamespaceId>,
    /// Entities in declaration order
    pub entities: Vec<EntityId>,
    pub source_map: SourceMap,
    pub data: NamespaceData,
}

/// A namespace as declared by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    pub name: String,
    pub project_extension: Option<String>,
    pub dependency_names: Vec<String>,
    pub source_map: SourceMap,
}

impl Namespace {
    /// Endpoint segment of the project, e.g. `edfi`.
    #[must_use]
    pub fn project_endpoint_name(&self) -> String {
        self.project_name.to_lowercase()
    }

    /// Whether `other` is in this namespace's resolved dependency list.
    #[must_use]
    pub fn depends_on(&self, other: NamespaceId) -> bool {
        self.dependencies.contains(&other)
    }
}

impl NamespaceDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extension(mut self, project_extension: impl Into<String>) -> Self {
        self.project_extension = Some(project_extension.into());
        self
    }

    #[must_use]
    pub fn with_dependencies(mut self, dependency_names: Vec<String>) -> Self {
        self.dependency_names = dependency_names;
        self
    }
}
