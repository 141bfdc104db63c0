//! Shared fixtures for the enhancer unit tests

use crate::pipeline::{EnhancerPipeline, EnhancerResult};
use edm_builder::{BuilderConfig, EventStreamBuilder, build};
use edm_model::{Entity, EntityId, EntityKind, Property, Repository};

/// Build a stream that must be free of builder diagnostics.
pub fn built(stream: EventStreamBuilder) -> Repository {
    let output = build(&stream.build(), BuilderConfig::default()).unwrap();
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    output.repository
}

/// Build the stream and run the pipeline through `last`.
pub fn enhanced_through(stream: EventStreamBuilder, last: &str) -> (Repository, Vec<EnhancerResult>) {
    let mut repository = built(stream);
    let results = EnhancerPipeline::standard()
        .through(last)
        .unwrap()
        .run(&mut repository);
    (repository, results)
}

/// Build the stream and run every stage.
pub fn enhanced(stream: EventStreamBuilder) -> Repository {
    let mut repository = built(stream);
    EnhancerPipeline::standard().run(&mut repository);
    repository
}

/// The single entity named `name` in namespace `namespace`, of any kind.
pub fn entity<'a>(repository: &'a Repository, namespace: &str, name: &str) -> &'a Entity {
    let namespace = repository.namespace_named(namespace).unwrap();
    let id = repository
        .namespace(namespace)
        .entities
        .iter()
        .copied()
        .find(|id| repository.entity(*id).name == name)
        .unwrap_or_else(|| panic!("no entity named {name}"));
    repository.entity(id)
}

pub fn entity_id(repository: &Repository, name: &str) -> EntityId {
    repository
        .entities()
        .find(|entity| entity.name == name && !entity.kind.is_extension())
        .map(|entity| entity.id)
        .unwrap_or_else(|| panic!("no entity named {name}"))
}

pub fn entity_of_kind(repository: &Repository, kind: EntityKind, name: &str) -> EntityId {
    repository
        .entities()
        .find(|entity| entity.name == name && entity.kind == kind)
        .map(|entity| entity.id)
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

/// The declared property of `entity` with full name `full_name`.
pub fn property<'a>(repository: &'a Repository, entity: EntityId, full_name: &str) -> &'a Property {
    repository
        .properties_of(entity)
        .find(|property| property.full_name() == full_name)
        .unwrap_or_else(|| panic!("no property named {full_name}"))
}

/// Strings of a derived path list, for comparisons against literals.
pub fn strings<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
