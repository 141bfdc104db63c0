//! Compilation driver
//!
//! A compilation runs the builder over the parse events, runs the enhancer pipeline over the
//! resulting repository and assembles API schemas, collecting diagnostics and timings along
//! the way.

use std::path::Path;
use std::time::{Duration, Instant};

use edm_api_schema::{ApiSchema, assemble};
use edm_builder::{BuilderConfig, ParseEvent, build, load_events};
use edm_enhancer::EnhancerPipeline;
use edm_model::{Diagnostic, DiagnosticCounts, Repository};
use tracing::{debug, info, warn};

use crate::{AcceptancePolicy, Error, Result};

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Builder settings, including the core namespace name
    pub builder: BuilderConfig,
    /// Policy turning diagnostics into an accept/reject decision
    pub acceptance_policy: AcceptancePolicy,
    /// Stop the enhancer pipeline after the named stage
    pub stop_after: Option<String>,
}

/// Diagnostics and timing of one enhancer stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStats {
    pub name: &'static str,
    pub diagnostics: DiagnosticCounts,
    pub duration: Duration,
}

/// Statistics for one compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub namespaces: usize,
    pub entities: usize,
    pub properties: usize,
    /// Diagnostics raised while building
    pub builder_diagnostics: DiagnosticCounts,
    /// One entry per enhancer stage, in run order
    pub stages: Vec<StageStats>,
    /// All diagnostics, builder and enhancers together
    pub diagnostics: DiagnosticCounts,
    pub build_duration: Duration,
    pub total_duration: Duration,
}

/// Result of compiling a model
#[derive(Debug)]
pub struct CompileOutput {
    pub repository: Repository,
    /// One schema per namespace
    pub api_schemas: Vec<ApiSchema>,
    /// Builder diagnostics first, then enhancer diagnostics in stage order
    pub diagnostics: Vec<Diagnostic>,
    pub stats: PipelineStats,
    /// Decision of the acceptance policy
    pub accepted: bool,
}

/// Compiles parse events into API schemas
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    enhancers: EnhancerPipeline,
}

impl Pipeline {
    /// Create a pipeline, checking that a configured stop stage exists.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let enhancers = match &config.stop_after {
            Some(stage) => EnhancerPipeline::standard().through(stage)?,
            None => EnhancerPipeline::standard(),
        };
        Ok(Self { config, enhancers })
    }

    /// Create a pipeline with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: PipelineConfig::default(),
            enhancers: EnhancerPipeline::standard(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compile an in-memory event stream.
    pub fn compile(&self, events: &[ParseEvent]) -> Result<CompileOutput> {
        let start = Instant::now();
        let built = build(events, self.config.builder.clone())?;
        let build_duration = start.elapsed();
        let mut repository = built.repository;
        let mut diagnostics = built.diagnostics;

        let mut stats = PipelineStats {
            namespaces: repository.namespace_ids().count(),
            entities: repository.entity_ids().count(),
            properties: repository.property_ids().count(),
            builder_diagnostics: DiagnosticCounts::of(&diagnostics),
            build_duration,
            ..PipelineStats::default()
        };
        debug!(
            namespaces = stats.namespaces,
            entities = stats.entities,
            properties = stats.properties,
            "built repository"
        );

        for result in self.enhancers.run(&mut repository) {
            stats.stages.push(StageStats {
                name: result.enhancer_name,
                diagnostics: DiagnosticCounts::of(&result.diagnostics),
                duration: result.duration,
            });
            diagnostics.extend(result.diagnostics);
        }

        let api_schemas = assemble(&repository);
        stats.diagnostics = DiagnosticCounts::of(&diagnostics);
        stats.total_duration = start.elapsed();

        let accepted = self.config.acceptance_policy.accepts(stats.diagnostics);
        if accepted {
            info!(
                errors = stats.diagnostics.errors,
                warnings = stats.diagnostics.warnings,
                schemas = api_schemas.len(),
                "model compiled"
            );
        } else {
            warn!(
                errors = stats.diagnostics.errors,
                warnings = stats.diagnostics.warnings,
                policy = ?self.config.acceptance_policy,
                "model rejected"
            );
        }

        Ok(CompileOutput {
            repository,
            api_schemas,
            diagnostics,
            stats,
            accepted,
        })
    }

    /// Load event files or directories, in the order given, and compile them together.
    pub fn compile_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CompileOutput> {
        if paths.is_empty() {
            return Err(Error::NoInput);
        }
        let mut events = Vec::new();
        for path in paths {
            events.extend(load_events(path.as_ref())?);
        }
        debug!(files = paths.len(), events = events.len(), "loaded events");
        self.compile(&events)
    }
}
