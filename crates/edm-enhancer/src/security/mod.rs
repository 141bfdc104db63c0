//! Security enhancers
//!
//! Each securable element stage walks the flattened identity of every resource, looking for
//! the identity of a security concept (a person, a namespace or an education organization).
//! A role name anywhere on the way to the concept marks a non-canonical usage and is skipped.

pub mod education_organization;
pub mod hierarchy;
pub mod namespace;
pub mod pathway;
pub mod person;

use edm_model::{FlattenedIdentityProperty, JsonPath, JsonPathsMapping, PropertyId, Repository};

/// Whether any of `chain` carries a role name.
fn has_role_name(repository: &Repository, chain: &[PropertyId]) -> bool {
    chain
        .iter()
        .any(|property| repository.property(*property).has_role_name())
}

/// JSON paths at which a flattened identity leaf lives in the document.
fn leaf_json_paths<'a>(
    mapping: &'a JsonPathsMapping,
    leaf: &FlattenedIdentityProperty,
) -> &'a [JsonPath] {
    leaf.leaf_path()
        .and_then(|path| mapping.get(path))
        .map(|info| info.json_paths.as_slice())
        .unwrap_or_default()
}
