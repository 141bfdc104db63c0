//! Serializable API schema documents

use edm_model::{
    ArrayUniquenessConstraint, DocumentPaths, EducationOrganizationSecurableElement,
    EqualityConstraint, JsonPath, PropertyPath, QueryFieldMapping,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The API schema of one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSchema {
    pub project_schema: ProjectSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSchema {
    pub project_name: String,
    /// Lowercased project name
    pub project_endpoint_name: String,
    pub description: String,
    pub is_extension_project: bool,
    /// Keyed by endpoint name
    pub resource_schemas: BTreeMap<String, ResourceSchema>,
    /// Resource name to endpoint name
    pub resource_name_mapping: BTreeMap<String, String>,
    /// Lowercased endpoint name to endpoint name
    pub case_insensitive_endpoint_name_mapping: BTreeMap<String, String>,
    pub abstract_resources: BTreeMap<String, AbstractResource>,
    pub education_organization_types: Vec<String>,
    pub education_organization_hierarchy: BTreeMap<String, Vec<String>>,
}

/// A domain entity that is never a resource on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractResource {
    pub identity_json_paths: Vec<JsonPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubclassType {
    DomainEntity,
    Association,
}

/// Where each security concept surfaces in a resource document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityElements {
    #[serde(rename = "Student")]
    pub student: Vec<JsonPath>,
    #[serde(rename = "Staff")]
    pub staff: Vec<JsonPath>,
    #[serde(rename = "Contact")]
    pub contact: Vec<JsonPath>,
    #[serde(rename = "Namespace")]
    pub namespace: Vec<JsonPath>,
    #[serde(rename = "EducationOrganization")]
    pub education_organization: Vec<EducationOrganizationSecurableElement>,
}

/// Everything a downstream generator needs to know about one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    pub resource_name: String,
    pub is_descriptor: bool,
    pub is_resource_extension: bool,
    pub is_subclass: bool,
    pub json_schema_for_insert: serde_json::Value,
    pub identity_json_paths: Vec<JsonPath>,
    pub document_paths_mapping: BTreeMap<PropertyPath, DocumentPaths>,
    pub boolean_json_paths: Vec<JsonPath>,
    pub numeric_json_paths: Vec<JsonPath>,
    pub date_time_json_paths: Vec<JsonPath>,
    pub equality_constraints: Vec<EqualityConstraint>,
    pub equality_sets: Vec<Vec<JsonPath>>,
    pub array_uniqueness_constraints: Vec<ArrayUniquenessConstraint>,
    pub query_field_mapping: QueryFieldMapping,
    pub security_elements: SecurityElements,
    pub authorization_pathways: Vec<String>,
    pub identity_fullnames: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass_type: Option<SubclassType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass_project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass_resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass_identity_json_path: Option<JsonPath>,
}
