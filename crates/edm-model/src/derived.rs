//! Derived data attached to entities, properties and namespaces by the enhancer pipeline.
//!
//! Every attribute is a [`Computed`] slot owned by exactly one enhancer and written once.
#![allow(clippy::must_use_candidate)]

use crate::PathType;
use crate::ids::PropertyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A derived attribute that is absent until its owning enhancer has run.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed<T>(Option<T>);

impl<T> Computed<T> {
    /// Store the value. Writing a slot twice is a phase-ordering bug.
    pub fn set(&mut self, value: T) {
        debug_assert!(self.0.is_none(), "derived attribute computed twice");
        self.0 = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn is_computed(&self) -> bool {
        self.0.is_some()
    }
}

impl<T> Default for Computed<T> {
    fn default() -> Self {
        Self(None)
    }
}

/// Path into the API document, e.g. `$.schoolReference.schoolId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPath(String);

impl JsonPath {
    /// The document root, `$`.
    pub fn root() -> Self {
        Self("$".to_string())
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Append a field segment.
    pub fn field(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    /// Append the array-indexing marker.
    pub fn array(&self) -> Self {
        Self(format!("{}[*]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Re-root this path at `base`, e.g. `$.a[*].b` under `$.a[*]` becomes `$.b`.
    pub fn relative_to(&self, base: &JsonPath) -> Option<Self> {
        self.0
            .strip_prefix(base.as_str())
            .filter(|rest| rest.starts_with('.'))
            .map(|rest| Self(format!("${rest}")))
    }

    /// The last field name, e.g. `schoolId` for `$.schoolReference.schoolId`.
    pub fn last_field(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for JsonPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Dot-separated full property names, e.g. `Session.School.SchoolId`.
pub type PropertyPath = String;

/// Shape of a property in the API document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiShape {
    Scalar,
    ScalarCollection,
    Descriptor,
    DescriptorCollection,
    ScalarReference,
    ReferenceCollection,
    ScalarCommon,
    CommonCollection,
    Choice,
    InlineCommon,
}

impl ApiShape {
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Self::ScalarCollection
                | Self::DescriptorCollection
                | Self::ReferenceCollection
                | Self::CommonCollection
        )
    }

    /// Choice and inline common add no segment of their own.
    pub fn adds_segment(self) -> bool {
        !matches!(self, Self::Choice | Self::InlineCommon)
    }
}

/// API naming of a single property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPropertyMapping {
    pub shape: ApiShape,
    /// `uncapitalize(full property name)`, with `Descriptor` appended for descriptors
    pub full_name: String,
    /// Field name on the containing object
    pub top_level_name: String,
    /// Field name of each array element for collections, otherwise the top level name
    pub inner_name: String,
}

/// Naming adjustments inherited from enclosing choices and inline commons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyModifier {
    pub optional_due_to_parent: bool,
    pub parent_prefixes: Vec<String>,
}

impl PropertyModifier {
    /// Combine an outer modifier with an inner one.
    pub fn concat(&self, inner: &Self) -> Self {
        let mut parent_prefixes = self.parent_prefixes.clone();
        parent_prefixes.extend(inner.parent_prefixes.iter().cloned());
        Self {
            optional_due_to_parent: self.optional_due_to_parent || inner.optional_due_to_parent,
            parent_prefixes,
        }
    }

    /// Apply parent prefixes to a camel-cased JSON name.
    pub fn prefixed(&self, name: &str) -> String {
        if self.parent_prefixes.is_empty() {
            return name.to_string();
        }
        let mut prefixed = self.parent_prefixes.concat();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            prefixed.extend(first.to_uppercase());
            prefixed.push_str(chars.as_str());
        }
        let mut chars = prefixed.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => prefixed,
        }
    }
}

/// A property as it appears in an entity's effective property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedProperty {
    pub property: PropertyId,
    pub modifier: PropertyModifier,
}

/// How a property contributes to identity: a leaf value, or a group of the referenced
/// entity's identity components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceComponent {
    Element {
        source: PropertyId,
    },
    Group {
        source: PropertyId,
        components: Vec<ReferenceComponent>,
    },
}

impl ReferenceComponent {
    pub fn source(&self) -> PropertyId {
        match self {
            Self::Element { source } | Self::Group { source, .. } => *source,
        }
    }
}

/// A leaf non-reference identity property reached from an entity's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedIdentityProperty {
    /// The leaf property
    pub identity_property: PropertyId,
    /// Every property path passed on the way to the leaf, shallowest first
    pub property_paths: Vec<PropertyPath>,
    /// Properties followed from the entity to the leaf, ending with the leaf
    pub property_chain: Vec<PropertyId>,
}

impl FlattenedIdentityProperty {
    /// Full property path of the leaf.
    pub fn leaf_path(&self) -> Option<&str> {
        self.property_paths.last().map(String::as_str)
    }
}

/// JSON paths reached from one property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPathsInfo {
    /// Last property of the property path
    pub terminal_property: PropertyId,
    /// Sorted and de-duplicated
    pub json_paths: Vec<JsonPath>,
    /// False for paths reached through the identity of a referenced entity
    pub is_top_level: bool,
}

/// Property path to JSON paths for one entity.
pub type JsonPathsMapping = BTreeMap<PropertyPath, JsonPathsInfo>;

/// Pairing of a path inside a reference object with the referenced resource's own path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceJsonPaths {
    pub reference_json_path: JsonPath,
    pub identity_json_path: JsonPath,
    #[serde(rename = "type")]
    pub path_type: PathType,
}

/// Where a property's value lives in the document and what type it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DocumentPaths {
    #[serde(rename_all = "camelCase")]
    Scalar {
        path: JsonPath,
        #[serde(rename = "type")]
        path_type: PathType,
    },
    #[serde(rename_all = "camelCase")]
    Descriptor {
        project_name: String,
        resource_name: String,
        path: JsonPath,
        #[serde(rename = "type")]
        path_type: PathType,
    },
    #[serde(rename_all = "camelCase")]
    Reference {
        project_name: String,
        resource_name: String,
        reference_json_paths: Vec<ReferenceJsonPaths>,
    },
}

/// Two document locations that must hold equal values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualityConstraint {
    pub source_json_path: JsonPath,
    pub target_json_path: JsonPath,
}

/// Location of an education organization identity within a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationOrganizationSecurableElement {
    pub json_path: JsonPath,
    /// Full name of the first property on the way to the education organization
    #[serde(rename = "metaEdName")]
    pub property_name: String,
}

/// Paths whose combined values must be unique across the elements of an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayUniquenessConstraint {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<JsonPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_constraints: Vec<NestedUniquenessConstraint>,
}

/// Uniqueness inside each element of an enclosing array, with paths relative to `base_path`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedUniquenessConstraint {
    pub base_path: JsonPath,
    pub paths: Vec<JsonPath>,
}

/// A queryable document location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    pub path: JsonPath,
    #[serde(rename = "type")]
    pub path_type: PathType,
}

/// Query parameter name to the document locations it filters on.
pub type QueryFieldMapping = BTreeMap<String, Vec<QueryField>>;

/// Derived attributes of a property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyData {
    /// Set only on subclass properties that collide with a differently-typed base property
    pub collision_qualifier: Computed<String>,
    pub api_mapping: Computed<ApiPropertyMapping>,
    pub reference_component: Computed<ReferenceComponent>,
}

/// Derived attributes of an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    pub collected_properties: Computed<Vec<CollectedProperty>>,
    pub identity_properties: Computed<Vec<PropertyId>>,
    pub flattened_identity_properties: Computed<Vec<FlattenedIdentityProperty>>,
    pub json_paths_mapping: Computed<JsonPathsMapping>,
    pub document_paths_mapping: Computed<BTreeMap<PropertyPath, DocumentPaths>>,
    pub identity_json_paths: Computed<Vec<JsonPath>>,
    pub equality_constraints: Computed<Vec<EqualityConstraint>>,
    pub equality_sets: Computed<Vec<Vec<JsonPath>>>,
    pub array_uniqueness_constraints: Computed<Vec<ArrayUniquenessConstraint>>,
    pub query_field_mapping: Computed<QueryFieldMapping>,
    pub resource_name: Computed<String>,
    pub endpoint_name: Computed<String>,
    pub identity_full_names: Computed<Vec<String>>,
    pub json_schema_for_insert: Computed<serde_json::Value>,
    pub student_securable_elements: Computed<Vec<JsonPath>>,
    pub staff_securable_elements: Computed<Vec<JsonPath>>,
    pub contact_securable_elements: Computed<Vec<JsonPath>>,
    pub namespace_securable_elements: Computed<Vec<JsonPath>>,
    pub education_organization_securable_elements:
        Computed<Vec<EducationOrganizationSecurableElement>>,
    pub authorization_pathways: Computed<Vec<String>>,
}

/// Derived attributes of a namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceData {
    pub education_organization_hierarchy: Computed<BTreeMap<String, Vec<String>>>,
    pub education_organization_types: Computed<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computed_starts_empty_and_holds_value() {
        let mut slot: Computed<Vec<u8>> = Computed::default();
        assert!(!slot.is_computed());
        assert!(slot.get().is_none());
        slot.set(vec![1, 2]);
        assert_eq!(slot.get(), Some(&vec![1, 2]));
    }

    #[test]
    #[should_panic(expected = "computed twice")]
    #[cfg(debug_assertions)]
    fn computed_rejects_second_write_in_debug_builds() {
        let mut slot = Computed::default();
        slot.set(1);
        slot.set(2);
    }

    #[test]
    fn json_path_segments() {
        let path = JsonPath::root().field("programs").array().field("programReference");
        assert_eq!(path.as_str(), "$.programs[*].programReference");
        assert_eq!(path, "$.programs[*].programReference");
        assert_eq!(path.last_field(), "programReference");
    }

    #[test]
    fn json_path_relative_to_enclosing_array() {
        let base = JsonPath::new("$.addresses[*]");
        let path = JsonPath::new("$.addresses[*].periods[*].beginDate");
        assert_eq!(path.relative_to(&base), Some(JsonPath::new("$.periods[*].beginDate")));
        assert_eq!(JsonPath::new("$.addressesX").relative_to(&base), None);
    }

    #[test]
    fn modifier_prefixes_apply_to_camel_case_names() {
        let modifier = PropertyModifier {
            optional_due_to_parent: false,
            parent_prefixes: vec!["Assessment".to_string()],
        };
        assert_eq!(modifier.prefixed("title"), "assessmentTitle");
        assert_eq!(PropertyModifier::default().prefixed("title"), "title");
    }

    #[test]
    fn modifier_concat_keeps_outer_prefixes_first() {
        let outer = PropertyModifier {
            optional_due_to_parent: true,
            parent_prefixes: vec!["A".to_string()],
        };
        let inner = PropertyModifier {
            optional_due_to_parent: false,
            parent_prefixes: vec!["B".to_string()],
        };
        let combined = outer.concat(&inner);
        assert!(combined.optional_due_to_parent);
        assert_eq!(combined.parent_prefixes, vec!["A", "B"]);
    }
}
