//! Reference resolution
//!
//! Resolves namespace dependencies, base entities and property targets to arena handles.
//! Unqualified names are looked up in the declaring namespace only; a qualified
//! `Namespace.Name` is looked up in that namespace, which must be the declaring namespace or
//! one of its dependencies. Resolution overwrites earlier results, so running it twice
//! leaves the graph unchanged.

use crate::pipeline::EnhancerResult;
use edm_model::{
    Diagnostic, EntityId, EntityKind, NamespaceId, PropertyId, Repository, SourceMap,
};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const RESOLVER: &str = "ReferenceResolver";
pub const NAMESPACE_DEPENDENCY_RESOLVER: &str = "NamespaceDependencyResolver";
pub const BASE_ENTITY_RESOLVER: &str = "BaseEntityResolver";
pub const PROPERTY_REFERENCE_RESOLVER: &str = "PropertyReferenceResolver";

/// Resolve every cross reference in the repository.
pub fn resolve_references(repository: &mut Repository) -> EnhancerResult {
    let mut diagnostics = Vec::new();
    resolve_namespace_dependencies(repository, &mut diagnostics);
    resolve_base_entities(repository, &mut diagnostics);
    resolve_properties(repository, &mut diagnostics);
    debug!(diagnostics = diagnostics.len(), "references resolved");
    EnhancerResult::new(RESOLVER, diagnostics)
}

fn report(diagnostics: &mut Vec<Diagnostic>, validator: &str, message: String, source: &SourceMap) {
    warn!(validator, line = source.line, "{message}");
    diagnostics.push(Diagnostic::error(validator, message, source.clone()));
}

/// Whether `to` is reachable from `from` through resolved dependency lists.
fn depends_transitively(repository: &Repository, from: NamespaceId, to: NamespaceId) -> bool {
    let mut pending = vec![from];
    let mut seen = HashSet::new();
    while let Some(current) = pending.pop() {
        if current == to {
            return true;
        }
        if seen.insert(current) {
            pending.extend(repository.namespace(current).dependencies.iter().copied());
        }
    }
    false
}

/// Resolve dependency names in namespace order.
///
/// A dependency that would close a cycle through the dependencies resolved so far is reported
/// and dropped.
fn resolve_namespace_dependencies(repository: &mut Repository, diagnostics: &mut Vec<Diagnostic>) {
    for namespace_id in repository.namespace_ids() {
        let namespace = repository.namespace(namespace_id);
        let mut resolved = Vec::with_capacity(namespace.dependency_names.len());

        for dependency_name in &namespace.dependency_names {
            let dependency = match repository.require_namespace(dependency_name) {
                Ok(id) => id,
                Err(error) => {
                    report(
                        diagnostics,
                        NAMESPACE_DEPENDENCY_RESOLVER,
                        format!(
                            "Namespace {} has an unresolvable dependency. {error}.",
                            namespace.name
                        ),
                        &namespace.source_map,
                    );
                    continue;
                }
            };
            if depends_transitively(repository, dependency, namespace_id) {
                report(
                    diagnostics,
                    NAMESPACE_DEPENDENCY_RESOLVER,
                    format!(
                        "Namespace {} cannot depend on {dependency_name} because it would create a dependency cycle.",
                        namespace.name
                    ),
                    &namespace.source_map,
                );
                continue;
            }
            if !resolved.contains(&dependency) {
                resolved.push(dependency);
            }
        }

        repository.namespace_mut(namespace_id).dependencies = resolved;
    }
}

/// Namespace to search for a possibly qualified name referenced from `from`.
fn lookup_namespace(
    repository: &Repository,
    from: NamespaceId,
    qualifier: Option<&str>,
) -> Option<NamespaceId> {
    let Some(qualifier) = qualifier else {
        return Some(from);
    };
    let target = repository.namespace_named(qualifier)?;
    (target == from || repository.namespace(from).depends_on(target)).then_some(target)
}

fn qualified(qualifier: Option<&str>, name: &str) -> String {
    match qualifier {
        Some(namespace) => format!("{namespace}.{name}"),
        None => name.to_string(),
    }
}

fn resolve_base_entities(repository: &mut Repository, diagnostics: &mut Vec<Diagnostic>) {
    for entity_id in repository.entity_ids() {
        let entity = repository.entity(entity_id);
        let Some(base_name) = entity.base_entity_name.as_deref() else {
            continue;
        };

        let base = lookup_namespace(
            repository,
            entity.namespace,
            entity.base_entity_namespace.as_deref(),
        )
        .and_then(|namespace| {
            repository.find_entity(namespace, entity.kind.compatible_base_kinds(), base_name)
        });

        if base.is_none() {
            report(
                diagnostics,
                BASE_ENTITY_RESOLVER,
                format!(
                    "{} {} is based on {}, which could not be resolved.",
                    entity.kind.humanized(),
                    entity.name,
                    qualified(entity.base_entity_namespace.as_deref(), base_name)
                ),
                &entity.source_map,
            );
        }
        repository.entity_mut(entity_id).base_entity = base;
    }
}

fn resolve_properties(repository: &mut Repository, diagnostics: &mut Vec<Diagnostic>) {
    let resolutions: Vec<(PropertyId, Option<EntityId>)> = repository
        .property_ids()
        .filter_map(|property_id| {
            let property = repository.property(property_id);
            let referenced_type = property.referenced_type.as_deref()?;

            let target = lookup_namespace(
                repository,
                property.namespace,
                property.referenced_namespace.as_deref(),
            )
            .and_then(|namespace| {
                repository.find_entity(namespace, property.kind.target_kinds(), referenced_type)
            });

            if target.is_none() {
                let parent = repository.entity(property.parent);
                report(
                    diagnostics,
                    PROPERTY_REFERENCE_RESOLVER,
                    format!(
                        "{} property {} on {} {} references {}, which could not be resolved.",
                        property.kind.humanized(),
                        property.full_name(),
                        parent.kind.humanized(),
                        parent.name,
                        qualified(property.referenced_namespace.as_deref(), referenced_type)
                    ),
                    &property.source_map,
                );
            }
            Some((property_id, target))
        })
        .collect();

    for (property_id, target) in resolutions {
        repository.property_mut(property_id).referenced_entity = target;
    }
}

/// Resolved base entity, followed transitively: the entity itself first.
pub fn base_chain(repository: &Repository, entity: EntityId) -> Vec<EntityId> {
    let mut chain = vec![entity];
    let mut current = entity;
    while let Some(base) = repository.entity(current).base_entity {
        if chain.contains(&base) {
            break;
        }
        chain.push(base);
        current = base;
    }
    chain
}

/// Whether an entity of this kind takes part in the reference graph as a document.
pub(crate) fn is_document_kind(kind: EntityKind) -> bool {
    kind.is_top_level_entity()
        || matches!(
            kind,
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension
        )
}
