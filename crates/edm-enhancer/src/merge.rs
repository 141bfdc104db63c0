//! Merge directive equality constraints
//!
//! A merge directive asserts that two property paths of an entity hold the same value. Both
//! paths are resolved against the entity's collected properties, mapped to JSON paths and
//! paired up. Constraints that share a path are grouped into equality sets.

use crate::collecting::collected_ids;
use crate::pipeline::EnhancerResult;
use edm_model::{
    Diagnostic, Entity, EntityId, EqualityConstraint, JsonPath, JsonPathsMapping, MergeDirective,
    Property, PropertyId, Repository, SourceMap,
};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const MERGE_DIRECTIVE_EQUALITY_CONSTRAINT: &str = "MergeDirectiveEqualityConstraintEnhancer";

/// Whether every dot-separated segment of `path` names a property reachable from `entity`.
#[must_use]
pub fn resolves(repository: &Repository, entity: EntityId, path: &str) -> bool {
    let mut candidates: Vec<PropertyId> = collected_ids(repository, entity);
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(property) = candidates
            .iter()
            .map(|id| repository.property(*id))
            .find(|property| property.full_name() == segment)
        else {
            return false;
        };
        if segments.peek().is_none() {
            return true;
        }
        let Some(target) = property.referenced_entity else {
            return false;
        };
        candidates = collected_ids(repository, target);
    }
    false
}

/// Disjoint sets of JSON paths.
#[derive(Debug, Default)]
struct UnionFind {
    index: HashMap<JsonPath, usize>,
    parents: Vec<usize>,
}

impl UnionFind {
    fn find(&mut self, path: &JsonPath) -> usize {
        let mut node = match self.index.get(path) {
            Some(node) => *node,
            None => {
                let node = self.parents.len();
                self.parents.push(node);
                self.index.insert(path.clone(), node);
                node
            }
        };
        while self.parents[node] != node {
            self.parents[node] = self.parents[self.parents[node]];
            node = self.parents[node];
        }
        node
    }

    fn union(&mut self, a: &JsonPath, b: &JsonPath) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parents[b] = a;
        }
    }

    /// Sorted sets, ordered by their first member.
    fn sets(mut self) -> Vec<Vec<JsonPath>> {
        let paths: Vec<JsonPath> = self.index.keys().cloned().collect();
        let mut groups: BTreeMap<usize, Vec<JsonPath>> = BTreeMap::new();
        for path in paths {
            let root = self.find(&path);
            groups.entry(root).or_default().push(path);
        }
        let mut sets: Vec<Vec<JsonPath>> = groups
            .into_values()
            .map(|mut set| {
                set.sort();
                set
            })
            .collect();
        sets.sort();
        sets
    }
}

struct DirectiveContext<'a> {
    repository: &'a Repository,
    entity: &'a Entity,
    mapping: &'a JsonPathsMapping,
    property: &'a Property,
}

impl DirectiveContext<'_> {
    fn error(&self, message: String, source_map: &SourceMap) -> Diagnostic {
        warn!(entity = %self.entity.name, "{message}");
        Diagnostic::error(MERGE_DIRECTIVE_EQUALITY_CONSTRAINT, message, source_map.clone())
    }

    fn json_paths(
        &self,
        path: &str,
        directive: &MergeDirective,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Vec<JsonPath>> {
        if !resolves(self.repository, self.entity.id, path) {
            diagnostics.push(self.error(
                format!(
                    "Merge directive path {path} on property {} of {} does not resolve to a property.",
                    self.property.full_name(),
                    self.entity.name
                ),
                &directive.source_map,
            ));
            return None;
        }
        let paths = self
            .mapping
            .get(path)
            .map(|info| info.json_paths.clone())
            .unwrap_or_default();
        if paths.is_empty() {
            diagnostics.push(self.error(
                format!(
                    "Merge directive path {path} on property {} of {} does not map to any JSON path.",
                    self.property.full_name(),
                    self.entity.name
                ),
                &directive.source_map,
            ));
            return None;
        }
        Some(paths)
    }

    fn constraints(
        &self,
        directive: &MergeDirective,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<EqualityConstraint> {
        let source = self.json_paths(&directive.source_property_path, directive, diagnostics);
        let target = self.json_paths(&directive.target_property_path, directive, diagnostics);
        let (Some(source), Some(target)) = (source, target) else {
            return Vec::new();
        };

        if source.len() != target.len() {
            diagnostics.push(self.error(
                format!(
                    "Merge directive on property {} of {} pairs {} source JSON paths with {} target JSON paths.",
                    self.property.full_name(),
                    self.entity.name,
                    source.len(),
                    target.len()
                ),
                &directive.source_map,
            ));
            return Vec::new();
        }

        source
            .into_iter()
            .zip(target)
            .map(|(source_json_path, target_json_path)| EqualityConstraint {
                source_json_path,
                target_json_path,
            })
            .collect()
    }
}

/// Equality constraints of one entity, in directive order.
fn entity_constraints(
    repository: &Repository,
    entity: &Entity,
    mapping: &JsonPathsMapping,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<EqualityConstraint> {
    let mut constraints = Vec::new();
    for property_id in collected_ids(repository, entity.id) {
        let property = repository.property(property_id);
        let context = DirectiveContext {
            repository,
            entity,
            mapping,
            property,
        };
        for directive in &property.merge_directives {
            for constraint in context.constraints(directive, diagnostics) {
                if !constraints.contains(&constraint) {
                    constraints.push(constraint);
                }
            }
        }
    }
    constraints
}

/// Group constraints that share a path.
#[must_use]
pub fn equality_sets(constraints: &[EqualityConstraint]) -> Vec<Vec<JsonPath>> {
    let mut sets = UnionFind::default();
    for constraint in constraints {
        sets.union(&constraint.source_json_path, &constraint.target_json_path);
    }
    sets.sets()
}

/// Resolve merge directives of every mapped entity into equality constraints.
pub fn build_equality_constraints(repository: &mut Repository) -> EnhancerResult {
    let mut diagnostics = Vec::new();
    let computed: Vec<(EntityId, Vec<EqualityConstraint>)> = repository
        .entities()
        .filter_map(|entity| {
            let mapping = entity.data.json_paths_mapping.get()?;
            Some((
                entity.id,
                entity_constraints(repository, entity, mapping, &mut diagnostics),
            ))
        })
        .collect();

    for (entity, constraints) in computed {
        let sets = equality_sets(&constraints);
        let data = &mut repository.entity_mut(entity).data;
        data.equality_constraints.set(constraints);
        data.equality_sets.set(sets);
    }
    EnhancerResult::new(MERGE_DIRECTIVE_EQUALITY_CONSTRAINT, diagnostics)
}
