//! Document paths: where each top-level property path lives and what it holds

use crate::naming::resource_name;
use crate::pipeline::EnhancerResult;
use edm_model::{
    DocumentPaths, EntityId, JsonPathsMapping, PropertyKind, PropertyPath, ReferenceJsonPaths,
    Repository,
};
use std::collections::BTreeMap;

pub const DOCUMENT_PATHS_MAPPING: &str = "DocumentPathsMappingEnhancer";

/// Pair every scalar inside a reference object with the referenced resource's own path.
fn reference_json_paths(
    repository: &Repository,
    mapping: &JsonPathsMapping,
    key: &str,
    target_mapping: &JsonPathsMapping,
) -> Vec<ReferenceJsonPaths> {
    let prefix = format!("{key}.");
    let mut pairs: Vec<ReferenceJsonPaths> = mapping
        .range(prefix.clone()..)
        .take_while(|(path, _)| path.starts_with(&prefix))
        .filter_map(|(path, info)| {
            let terminal = repository.property(info.terminal_property);
            if info.json_paths.len() != 1 || !terminal.kind.is_scalar() {
                return None;
            }
            let identity = target_mapping.get(&path[prefix.len()..])?;
            Some(ReferenceJsonPaths {
                reference_json_path: info.json_paths[0].clone(),
                identity_json_path: identity.json_paths.first()?.clone(),
                path_type: terminal.kind.path_type(),
            })
        })
        .collect();
    pairs.sort_by(|a, b| a.identity_json_path.cmp(&b.identity_json_path));
    pairs.dedup();
    pairs
}

/// Document paths of one entity, keyed by top-level property path.
#[must_use]
pub fn document_paths(
    repository: &Repository,
    entity: EntityId,
) -> BTreeMap<PropertyPath, DocumentPaths> {
    let Some(mapping) = repository.entity(entity).data.json_paths_mapping.get() else {
        return BTreeMap::new();
    };

    mapping
        .iter()
        .filter(|(_, info)| info.is_top_level)
        .filter_map(|(key, info)| {
            let terminal = repository.property(info.terminal_property);
            let first_path = info.json_paths.first()?.clone();

            let paths = match (terminal.kind, terminal.referenced_entity) {
                (kind, Some(target)) if kind.is_referential() => {
                    let target_entity = repository.entity(target);
                    let target_mapping = target_entity.data.json_paths_mapping.get()?;
                    DocumentPaths::Reference {
                        project_name: repository
                            .namespace(target_entity.namespace)
                            .project_name
                            .clone(),
                        resource_name: resource_name(target_entity),
                        reference_json_paths: reference_json_paths(
                            repository,
                            mapping,
                            key,
                            target_mapping,
                        ),
                    }
                }
                (PropertyKind::Descriptor, Some(target)) => {
                    let target_entity = repository.entity(target);
                    DocumentPaths::Descriptor {
                        project_name: repository
                            .namespace(target_entity.namespace)
                            .project_name
                            .clone(),
                        resource_name: resource_name(target_entity),
                        path: first_path,
                        path_type: PropertyKind::Descriptor.path_type(),
                    }
                }
                (kind, _) if kind.is_scalar() => DocumentPaths::Scalar {
                    path: first_path,
                    path_type: kind.path_type(),
                },
                _ => return None,
            };
            Some((key.clone(), paths))
        })
        .collect()
}

/// Record document paths of every mapped entity.
pub fn build_document_paths(repository: &mut Repository) -> EnhancerResult {
    let documents: Vec<_> = repository
        .entities()
        .filter(|entity| entity.data.json_paths_mapping.is_computed())
        .map(|entity| (entity.id, document_paths(repository, entity.id)))
        .collect();

    for (entity, paths) in documents {
        repository
            .entity_mut(entity)
            .data
            .document_paths_mapping
            .set(paths);
    }
    EnhancerResult::success(DOCUMENT_PATHS_MAPPING)
}
