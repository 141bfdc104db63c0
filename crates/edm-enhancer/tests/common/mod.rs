//! Helpers shared by the enhancer integration tests

#![allow(dead_code)]

use anyhow::{Context, Result, ensure};
use edm_builder::{BuilderConfig, EventStreamBuilder, build};
use edm_model::{EntityId, Repository};

/// Build a stream that must not raise builder diagnostics.
pub fn repository(stream: EventStreamBuilder) -> Result<Repository> {
    let output = build(&stream.build(), BuilderConfig::default())?;
    ensure!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    Ok(output.repository)
}

/// The non-extension entity `name` declared in `namespace`.
pub fn find(repository: &Repository, namespace: &str, name: &str) -> Result<EntityId> {
    let namespace = repository
        .namespace_named(namespace)
        .with_context(|| format!("no namespace named {namespace}"))?;
    repository
        .namespace(namespace)
        .entities
        .iter()
        .copied()
        .find(|entity| {
            let entity = repository.entity(*entity);
            entity.name == name && !entity.kind.is_extension()
        })
        .with_context(|| format!("no entity named {name}"))
}

pub fn strings<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
