//! Query field mapping
//!
//! Every single-valued scalar of a resource document can be queried by its JSON field
//! name. Identity fields inside reference objects count, anything under an array does not.
//! When one name is reached at several locations, such as a `schoolId` carried by two
//! references, each location is listed.

use crate::pipeline::EnhancerResult;
use edm_model::{EntityId, QueryField, QueryFieldMapping, Repository};

pub const QUERY_FIELD_MAPPING: &str = "QueryFieldMappingEnhancer";

/// Query fields of one mapped entity.
#[must_use]
pub fn query_field_mapping(repository: &Repository, entity: EntityId) -> QueryFieldMapping {
    let Some(mapping) = repository.entity(entity).data.json_paths_mapping.get() else {
        return QueryFieldMapping::new();
    };

    let mut fields = QueryFieldMapping::new();
    for info in mapping.values() {
        let terminal = repository.property(info.terminal_property);
        if !terminal.kind.is_scalar() {
            continue;
        }
        for path in &info.json_paths {
            if path.as_str().contains("[*]") {
                continue;
            }
            fields
                .entry(path.last_field().to_string())
                .or_default()
                .push(QueryField {
                    path: path.clone(),
                    path_type: terminal.kind.path_type(),
                });
        }
    }
    for locations in fields.values_mut() {
        locations.sort();
        locations.dedup_by(|a, b| a.path == b.path);
    }
    fields
}

/// Record query fields of every resource.
pub fn build_query_field_mappings(repository: &mut Repository) -> EnhancerResult {
    let mappings: Vec<_> = repository
        .entities()
        .filter(|entity| entity.kind.is_top_level_entity())
        .map(|entity| (entity.id, query_field_mapping(repository, entity.id)))
        .collect();

    for (entity, fields) in mappings {
        repository
            .entity_mut(entity)
            .data
            .query_field_mapping
            .set(fields);
    }
    EnhancerResult::success(QUERY_FIELD_MAPPING)
}
