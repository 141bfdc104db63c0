//! The ordered enhancer pipeline
//!
//! Stages run in a fixed sequence over the whole repository. Every stage names the stages
//! whose output it reads; debug builds assert that those have already completed.

use crate::{Error, Result};
use crate::{
    api_mapping, array_uniqueness, collecting, document_paths, identity, json_paths, json_schema,
    merge, query_fields, resolver, resource, security,
};
use edm_model::{Diagnostic, Repository};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerResult {
    pub enhancer_name: &'static str,
    pub diagnostics: Vec<Diagnostic>,
    /// Wall time of the stage, filled in by the pipeline
    pub duration: Duration,
}

impl EnhancerResult {
    #[must_use]
    pub fn new(enhancer_name: &'static str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            enhancer_name,
            diagnostics,
            duration: Duration::ZERO,
        }
    }

    /// A stage that found nothing to report.
    #[must_use]
    pub fn success(enhancer_name: &'static str) -> Self {
        Self::new(enhancer_name, Vec::new())
    }
}

/// A stage descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub requires: &'static [&'static str],
    pub run: fn(&mut Repository) -> EnhancerResult,
}

impl Stage {
    const fn new(
        name: &'static str,
        requires: &'static [&'static str],
        run: fn(&mut Repository) -> EnhancerResult,
    ) -> Self {
        Self {
            name,
            requires,
            run,
        }
    }
}

/// An ordered list of stages.
#[derive(Debug, Clone)]
pub struct EnhancerPipeline {
    stages: Vec<Stage>,
}

impl EnhancerPipeline {
    /// The complete pipeline, starting with reference resolution.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Stage::new(resolver::RESOLVER, &[], resolver::resolve_references),
                Stage::new(
                    collecting::NAMING_COLLISION,
                    &[resolver::RESOLVER],
                    collecting::qualify_colliding_subclass_properties,
                ),
                Stage::new(
                    collecting::PROPERTY_COLLECTING,
                    &[resolver::RESOLVER],
                    collecting::collect_properties,
                ),
                Stage::new(
                    collecting::SUBCLASS_PROPERTY_COLLECTING,
                    &[collecting::PROPERTY_COLLECTING],
                    collecting::collect_subclass_properties,
                ),
                Stage::new(
                    api_mapping::API_PROPERTY_MAPPING,
                    &[collecting::NAMING_COLLISION],
                    api_mapping::map_properties,
                ),
                Stage::new(
                    identity::REFERENCE_COMPONENT,
                    &[collecting::SUBCLASS_PROPERTY_COLLECTING],
                    identity::build_reference_components,
                ),
                Stage::new(
                    identity::API_ENTITY_MAPPING,
                    &[identity::REFERENCE_COMPONENT],
                    identity::flatten_identities,
                ),
                Stage::new(
                    json_paths::ALL_JSON_PATHS_MAPPING,
                    &[api_mapping::API_PROPERTY_MAPPING, identity::API_ENTITY_MAPPING],
                    json_paths::build_json_paths_mappings,
                ),
                Stage::new(
                    document_paths::DOCUMENT_PATHS_MAPPING,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    document_paths::build_document_paths,
                ),
                Stage::new(
                    json_paths::IDENTITY_JSON_PATHS,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    json_paths::build_identity_json_paths,
                ),
                Stage::new(
                    merge::MERGE_DIRECTIVE_EQUALITY_CONSTRAINT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    merge::build_equality_constraints,
                ),
                Stage::new(
                    array_uniqueness::ARRAY_UNIQUENESS_CONSTRAINT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    array_uniqueness::build_array_uniqueness_constraints,
                ),
                Stage::new(
                    query_fields::QUERY_FIELD_MAPPING,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    query_fields::build_query_field_mappings,
                ),
                Stage::new(resource::RESOURCE_NAME, &[], resource::name_resources),
                Stage::new(
                    identity::IDENTITY_FULLNAME,
                    &[identity::API_ENTITY_MAPPING],
                    identity::build_identity_full_names,
                ),
                Stage::new(
                    json_schema::JSON_SCHEMA_FOR_INSERT,
                    &[api_mapping::API_PROPERTY_MAPPING, identity::API_ENTITY_MAPPING],
                    json_schema::build_insert_schemas,
                ),
                Stage::new(
                    security::hierarchy::EDUCATION_ORGANIZATION_HIERARCHY,
                    &[collecting::SUBCLASS_PROPERTY_COLLECTING],
                    security::hierarchy::build_hierarchies,
                ),
                Stage::new(
                    security::person::STUDENT_SECURABLE_ELEMENT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    security::person::student_securable_elements,
                ),
                Stage::new(
                    security::person::STAFF_SECURABLE_ELEMENT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    security::person::staff_securable_elements,
                ),
                Stage::new(
                    security::person::CONTACT_SECURABLE_ELEMENT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    security::person::contact_securable_elements,
                ),
                Stage::new(
                    security::namespace::NAMESPACE_SECURABLE_ELEMENT,
                    &[json_paths::ALL_JSON_PATHS_MAPPING],
                    security::namespace::namespace_securable_elements,
                ),
                Stage::new(
                    security::education_organization::EDUCATION_ORGANIZATION_SECURABLE_ELEMENT,
                    &[
                        json_paths::ALL_JSON_PATHS_MAPPING,
                        security::hierarchy::EDUCATION_ORGANIZATION_HIERARCHY,
                    ],
                    security::education_organization::education_organization_securable_elements,
                ),
                Stage::new(
                    security::pathway::AUTHORIZATION_PATHWAY,
                    &[collecting::SUBCLASS_PROPERTY_COLLECTING],
                    security::pathway::build_authorization_pathways,
                ),
            ],
        }
    }

    /// Stage descriptors in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Keep the stages up to and including `last`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStage`] when no stage is named `last`.
    pub fn through(mut self, last: &str) -> Result<Self> {
        let position = self
            .stages
            .iter()
            .position(|stage| stage.name == last)
            .ok_or_else(|| Error::UnknownStage(last.to_string()))?;
        self.stages.truncate(position + 1);
        Ok(self)
    }

    /// Run every stage in order over the repository.
    pub fn run(&self, repository: &mut Repository) -> Vec<EnhancerResult> {
        let mut completed: HashSet<&'static str> = HashSet::new();
        let mut results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            debug_assert!(
                stage.requires.iter().all(|name| completed.contains(name)),
                "stage {} ran before its prerequisites {:?}",
                stage.name,
                stage.requires
            );

            let started = Instant::now();
            let mut result = (stage.run)(repository);
            result.duration = started.elapsed();
            debug!(
                stage = stage.name,
                diagnostics = result.diagnostics.len(),
                elapsed_us = result.duration.as_micros(),
                "stage complete"
            );

            completed.insert(stage.name);
            results.push(result);
        }

        info!(
            stages = results.len(),
            diagnostics = results.iter().map(|r| r.diagnostics.len()).sum::<usize>(),
            "enhancer pipeline complete"
        );
        results
    }
}

impl Default for EnhancerPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Resolve references and run every enhancer over the repository.
pub fn enhance(repository: &mut Repository) -> Vec<EnhancerResult> {
    EnhancerPipeline::standard().run(repository)
}
