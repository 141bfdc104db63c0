//! Stack-based model builder
//!
//! The builder consumes parse events in order. Begin events push a frame, end events pop
//! and finalize it, and token events annotate the frame on top of the stack. Completed
//! entities are written into the [`Repository`] together with their properties.
//!
//! Malformed input never aborts the build: every problem becomes a [`Diagnostic`] and the
//! builder carries on with the rest of the stream. A construct begun in the wrong place is
//! skipped together with everything nested in it.

use crate::events::{Event, ParseEvent, split_qualified_name};
use crate::identity_rename::check_identity_renames;
use crate::naming::{DEFAULT_IDENTIFIER_PATTERN, DEFAULT_NAMESPACE_PATTERN, NamingRules};
use crate::Result;
use edm_model::{
    Diagnostic, EntityDeclaration, EntityId, EntityKind, MergeDirective, NamespaceDeclaration,
    NamespaceId, PropertyDeclaration, PropertyKind, Repository, SourceMap,
};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

pub const NAMESPACE_BUILDER: &str = "NamespaceBuilder";
pub const TOP_LEVEL_ENTITY_BUILDER: &str = "TopLevelEntityBuilder";
pub const NAMING_CONVENTION: &str = "NamingConventionValidator";

/// Configuration for the builder
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Namespace every extension depends on unless it lists its dependencies
    pub core_namespace: String,
    /// Pattern for entity, property and role names
    pub identifier_pattern: String,
    /// Pattern for namespace names
    pub namespace_pattern: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            core_namespace: "EdFi".to_string(),
            identifier_pattern: DEFAULT_IDENTIFIER_PATTERN.to_string(),
            namespace_pattern: DEFAULT_NAMESPACE_PATTERN.to_string(),
        }
    }
}

/// Populated repository plus the structural diagnostics found while building it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub repository: Repository,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Namespace,
    Entity,
    Property,
    MergeDirective,
}

impl Construct {
    fn describe(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Entity => "entity",
            Self::Property => "property",
            Self::MergeDirective => "merge directive",
        }
    }
}

#[derive(Debug)]
struct EntityFrame {
    declaration: EntityDeclaration,
    /// Property full names already reported as duplicates
    reported_duplicates: HashSet<String>,
}

#[derive(Debug)]
enum Frame {
    Namespace(NamespaceId),
    Entity(EntityFrame),
    Property(PropertyDeclaration),
    MergeDirective(MergeDirective),
    /// A construct begun in the wrong place, swallowed until its matching end
    Skipped(Construct),
}

impl Frame {
    fn construct(&self) -> Construct {
        match self {
            Self::Namespace(_) => Construct::Namespace,
            Self::Entity(_) => Construct::Entity,
            Self::Property(_) => Construct::Property,
            Self::MergeDirective(_) => Construct::MergeDirective,
            Self::Skipped(construct) => *construct,
        }
    }
}

/// Incremental model builder over a parse-event stream.
#[derive(Debug)]
pub struct Builder {
    config: BuilderConfig,
    naming: NamingRules,
    repository: Repository,
    diagnostics: Vec<Diagnostic>,
    stack: Vec<Frame>,
    /// Retained entities already reported as the original of a duplicate
    reported_originals: HashSet<EntityId>,
}

impl Builder {
    /// Create a builder.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured naming patterns do not compile.
    pub fn new(config: BuilderConfig) -> Result<Self> {
        let naming = NamingRules::new(&config.identifier_pattern, &config.namespace_pattern)?;
        Ok(Self {
            config,
            naming,
            repository: Repository::new(),
            diagnostics: Vec::new(),
            stack: Vec::new(),
            reported_originals: HashSet::new(),
        })
    }

    /// Consume an entire event stream.
    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a ParseEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Consume one event.
    pub fn apply(&mut self, event: &ParseEvent) {
        trace!(event = event.event.keyword(), line = event.source.line, "builder event");
        if let Some(Frame::Skipped(_)) = self.stack.last() {
            self.apply_skipped(&event.event);
            return;
        }

        let source = &event.source;
        match &event.event {
            Event::BeginNamespace {
                name,
                project_extension,
                dependencies,
            } => self.begin_namespace(
                name,
                project_extension.as_deref(),
                dependencies.as_deref(),
                source,
            ),
            Event::BeginEntity {
                kind,
                name,
                is_abstract,
            } => self.begin_entity(*kind, name, *is_abstract, source),
            Event::BaseEntity { name } => self.base_entity(name, source),
            Event::Documentation { text } => self.documentation(text, source),
            Event::InheritedDocumentation => self.inherited_documentation(source),
            Event::BeginProperty {
                kind,
                name,
                shared_type,
            } => self.begin_property(*kind, name, shared_type.as_deref(), source),
            Event::BeginMergeDirective => self.begin_merge_directive(source),
            Event::SourcePropertyPath { path } | Event::TargetPropertyPath { path } => {
                self.merge_path(&event.event, path, source);
            }
            Event::EndNamespace => self.end(Construct::Namespace, source),
            Event::EndEntity => self.end(Construct::Entity, source),
            Event::EndProperty => self.end(Construct::Property, source),
            Event::EndMergeDirective => self.end(Construct::MergeDirective, source),
            token => self.property_token(token, source),
        }
    }

    /// Close anything left open, run consistency checks and hand back the repository.
    #[must_use]
    pub fn finish(mut self) -> BuildOutput {
        while let Some(frame) = self.stack.last() {
            let construct = frame.construct();
            if !matches!(frame, Frame::Skipped(_)) {
                self.error(
                    TOP_LEVEL_ENTITY_BUILDER,
                    format!("The {} was not closed before the end of input.", construct.describe()),
                    &SourceMap::default(),
                );
            }
            self.pop_and_finalize(&SourceMap::default());
        }

        let mut diagnostics = self.diagnostics;
        diagnostics.extend(check_identity_renames(&self.repository));
        debug!(
            entities = self.repository.entity_count(),
            properties = self.repository.property_count(),
            diagnostics = diagnostics.len(),
            "build finished"
        );
        BuildOutput {
            repository: self.repository,
            diagnostics,
        }
    }

    fn apply_skipped(&mut self, event: &Event) {
        let begun = match event {
            Event::BeginNamespace { .. } => Some(Construct::Namespace),
            Event::BeginEntity { .. } => Some(Construct::Entity),
            Event::BeginProperty { .. } => Some(Construct::Property),
            Event::BeginMergeDirective => Some(Construct::MergeDirective),
            _ => None,
        };
        let ended = match event {
            Event::EndNamespace => Some(Construct::Namespace),
            Event::EndEntity => Some(Construct::Entity),
            Event::EndProperty => Some(Construct::Property),
            Event::EndMergeDirective => Some(Construct::MergeDirective),
            _ => None,
        };
        if let Some(construct) = begun {
            self.stack.push(Frame::Skipped(construct));
        } else if let Some(construct) = ended {
            if matches!(self.stack.last(), Some(Frame::Skipped(top)) if *top == construct) {
                self.stack.pop();
            }
        }
    }

    fn begin_namespace(
        &mut self,
        name: &str,
        project_extension: Option<&str>,
        dependencies: Option<&[String]>,
        source: &SourceMap,
    ) {
        if !self.stack.is_empty() {
            self.error(
                NAMESPACE_BUILDER,
                format!("Namespace {name} cannot be declared inside another construct."),
                source,
            );
            self.stack.push(Frame::Skipped(Construct::Namespace));
            return;
        }
        if !self.naming.is_valid_namespace(name) {
            self.error(
                NAMING_CONVENTION,
                format!("Namespace name {name} must start with a letter and contain only letters and digits."),
                source,
            );
        }

        let dependency_names = match dependencies {
            Some(listed) => listed.to_vec(),
            None if project_extension.is_some() && name != self.config.core_namespace => {
                vec![self.config.core_namespace.clone()]
            }
            None => Vec::new(),
        };
        let mut declaration = NamespaceDeclaration::new(name).with_dependencies(dependency_names);
        if let Some(extension) = project_extension {
            declaration = declaration.with_extension(extension);
        }
        declaration.source_map = source.clone();

        let id = self.repository.add_namespace(declaration);
        self.stack.push(Frame::Namespace(id));
    }

    fn begin_entity(&mut self, kind: EntityKind, name: &str, is_abstract: bool, source: &SourceMap) {
        let Some(Frame::Namespace(namespace)) = self.stack.last() else {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("{} {name} must be declared directly inside a namespace.", kind.humanized()),
                source,
            );
            self.stack.push(Frame::Skipped(Construct::Entity));
            return;
        };
        let namespace = *namespace;

        self.check_identifier(name, kind.humanized(), source);
        let mut declaration = EntityDeclaration::new(kind, name, namespace, source.clone());
        if is_abstract {
            if kind == EntityKind::DomainEntity {
                declaration.is_abstract = true;
            } else {
                self.error(
                    TOP_LEVEL_ENTITY_BUILDER,
                    format!("{} {name} cannot be abstract. Only domain entities may be abstract.", kind.humanized()),
                    source,
                );
            }
        }
        self.stack.push(Frame::Entity(EntityFrame {
            declaration,
            reported_duplicates: HashSet::new(),
        }));
    }

    fn base_entity(&mut self, name: &str, source: &SourceMap) {
        let (namespace, local) = split_qualified_name(name);
        let message = match self.stack.last_mut() {
            Some(Frame::Entity(frame)) if frame.declaration.kind.requires_base() => {
                frame.declaration.base_entity_name = Some(local.to_string());
                frame.declaration.base_entity_namespace = namespace.map(str::to_string);
                return;
            }
            Some(Frame::Entity(frame)) => format!(
                "{} {} cannot be based on {name}.",
                frame.declaration.kind.humanized(),
                frame.declaration.name
            ),
            _ => format!("Base entity {name} is only allowed on a subclass or extension."),
        };
        self.error(TOP_LEVEL_ENTITY_BUILDER, message, source);
    }

    fn documentation(&mut self, text: &str, source: &SourceMap) {
        let target = match self.stack.last_mut() {
            Some(Frame::Entity(frame)) => &mut frame.declaration.documentation,
            Some(Frame::Property(property)) => &mut property.documentation,
            _ => {
                self.error(
                    TOP_LEVEL_ENTITY_BUILDER,
                    "Documentation is only allowed on an entity or a property.",
                    source,
                );
                return;
            }
        };
        text.trim().clone_into(target);
        if text.trim().is_empty() {
            self.error(TOP_LEVEL_ENTITY_BUILDER, "Documentation must not be empty.", source);
        }
    }

    fn inherited_documentation(&mut self, source: &SourceMap) {
        let message = match self.stack.last_mut() {
            Some(Frame::Property(property)) if !property.kind.is_simple() => {
                property.documentation_inherited = true;
                return;
            }
            Some(Frame::Property(property)) => format!(
                "{} property {} cannot inherit documentation because it does not reference another declaration.",
                property.kind.humanized(),
                property.name
            ),
            _ => "Inherited documentation is only allowed on a property.".to_string(),
        };
        self.error(TOP_LEVEL_ENTITY_BUILDER, message, source);
    }

    fn begin_property(
        &mut self,
        kind: PropertyKind,
        name: &str,
        shared_type: Option<&str>,
        source: &SourceMap,
    ) {
        let entity_kind = match self.stack.last() {
            Some(Frame::Entity(frame)) => frame.declaration.kind,
            _ => {
                self.error(
                    TOP_LEVEL_ENTITY_BUILDER,
                    format!("Property {name} must be declared directly inside an entity."),
                    source,
                );
                self.stack.push(Frame::Skipped(Construct::Property));
                return;
            }
        };
        if !entity_kind.has_properties() {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("{} cannot declare property {name}.", entity_kind.humanized()),
                source,
            );
            self.stack.push(Frame::Skipped(Construct::Property));
            return;
        }

        let (namespace, local) = split_qualified_name(name);
        let mut property = PropertyDeclaration::new(kind, local, source.clone());
        if kind.is_shared() {
            let (type_namespace, type_name) = split_qualified_name(shared_type.unwrap_or(name));
            property.referenced_type = Some(type_name.to_string());
            property.referenced_namespace = type_namespace.map(str::to_string);
        } else if !kind.is_simple() {
            property.referenced_type = Some(local.to_string());
            property.referenced_namespace = namespace.map(str::to_string);
        }
        self.check_identifier(local, "Property", source);
        self.stack.push(Frame::Property(property));
    }

    fn property_token(&mut self, token: &Event, source: &SourceMap) {
        let entity_kind = self.enclosing_entity_kind();
        let Some(Frame::Property(property)) = self.stack.last_mut() else {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("'{}' is only allowed on a property.", token.keyword()),
                source,
            );
            return;
        };

        let mut problem = None;
        match token {
            Event::RoleName { name } => property.role_name = Some(name.clone()),
            Event::ShortenTo { name } => property.shorten_to = Some(name.clone()),
            Event::Identity => {
                if entity_kind.is_some_and(EntityKind::allows_identity) {
                    property.is_part_of_identity = true;
                    property.is_required = true;
                } else {
                    problem = Some(format!(
                        "Property {} cannot be part of the identity of a {}.",
                        property.name,
                        entity_kind.map_or("construct", EntityKind::humanized)
                    ));
                }
            }
            Event::IdentityRename { base_key_name } => {
                if entity_kind.is_some_and(|kind| {
                    matches!(
                        kind,
                        EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass
                    )
                }) {
                    property.is_identity_rename = true;
                    property.is_part_of_identity = true;
                    property.is_required = true;
                    property.base_key_name = Some(base_key_name.clone());
                } else {
                    problem = Some(format!(
                        "Property {} renames identity property {base_key_name}, which is only allowed on a subclass.",
                        property.name
                    ));
                }
            }
            Event::Required => property.is_required = true,
            Event::Optional => property.is_required = false,
            Event::RequiredCollection => {
                property.is_required = true;
                property.is_collection = true;
            }
            Event::OptionalCollection => {
                property.is_required = false;
                property.is_collection = true;
            }
            Event::WeakReference => {
                if property.kind.is_referential() {
                    property.is_weak = true;
                } else {
                    problem = Some(format!(
                        "{} property {} cannot be a weak reference.",
                        property.kind.humanized(),
                        property.name
                    ));
                }
            }
            other => {
                problem = Some(format!("Unexpected '{}' inside a property.", other.keyword()));
            }
        }

        let declared_name = match token {
            Event::RoleName { name } => Some(("Role name", name.clone())),
            Event::ShortenTo { name } => Some(("Shorten to", name.clone())),
            _ => None,
        };
        if let Some(message) = problem {
            self.error(TOP_LEVEL_ENTITY_BUILDER, message, source);
        }
        if let Some((what, name)) = declared_name {
            self.check_identifier(&name, what, source);
        }
    }

    fn begin_merge_directive(&mut self, source: &SourceMap) {
        if matches!(self.stack.last(), Some(Frame::Property(_))) {
            self.stack.push(Frame::MergeDirective(MergeDirective {
                source_map: source.clone(),
                ..MergeDirective::default()
            }));
        } else {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                "A merge directive is only allowed on a property.",
                source,
            );
            self.stack.push(Frame::Skipped(Construct::MergeDirective));
        }
    }

    fn merge_path(&mut self, event: &Event, path: &str, source: &SourceMap) {
        let Some(Frame::MergeDirective(directive)) = self.stack.last_mut() else {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("'{}' is only allowed inside a merge directive.", event.keyword()),
                source,
            );
            return;
        };
        if matches!(event, Event::SourcePropertyPath { .. }) {
            path.clone_into(&mut directive.source_property_path);
        } else {
            path.clone_into(&mut directive.target_property_path);
        }
    }

    fn end(&mut self, construct: Construct, source: &SourceMap) {
        match self.stack.last() {
            Some(frame) if frame.construct() == construct => self.pop_and_finalize(source),
            Some(frame) => {
                let open = frame.construct();
                self.error(
                    TOP_LEVEL_ENTITY_BUILDER,
                    format!(
                        "Unexpected end of {} while a {} is open.",
                        construct.describe(),
                        open.describe()
                    ),
                    source,
                );
            }
            None => self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("Unexpected end of {} outside of any construct.", construct.describe()),
                source,
            ),
        }
    }

    fn pop_and_finalize(&mut self, source: &SourceMap) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Namespace(_) | Frame::Skipped(_) => {}
            Frame::Entity(frame) => self.finish_entity(frame.declaration),
            Frame::Property(property) => self.finish_property(property),
            Frame::MergeDirective(directive) => self.finish_merge_directive(directive, source),
        }
    }

    fn finish_merge_directive(&mut self, directive: MergeDirective, source: &SourceMap) {
        if directive.source_property_path.is_empty() || directive.target_property_path.is_empty() {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                "A merge directive must name both a source and a target property path.",
                source,
            );
            return;
        }
        if let Some(Frame::Property(property)) = self.stack.last_mut() {
            property.merge_directives.push(directive);
        }
    }

    fn finish_property(&mut self, mut property: PropertyDeclaration) {
        if property.is_part_of_identity && property.is_collection {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!("Identity property {} cannot be a collection.", property.name),
                &property.source_map,
            );
            property.is_collection = false;
        }

        let Some(Frame::Entity(frame)) = self.stack.last_mut() else {
            return;
        };
        let full_name = property.full_name();
        let original = frame
            .declaration
            .properties
            .iter()
            .find(|existing| existing.full_name() == full_name)
            .map(|existing| existing.source_map.clone());
        let Some(original_source) = original else {
            frame.declaration.properties.push(property);
            return;
        };

        let report_original = frame.reported_duplicates.insert(full_name.clone());
        let message = format!(
            "Property named {full_name} is a duplicate declaration of that name. Use 'role name' keyword to avoid naming collisions."
        );
        if report_original {
            self.error(TOP_LEVEL_ENTITY_BUILDER, message.clone(), &original_source);
        }
        self.error(TOP_LEVEL_ENTITY_BUILDER, message, &property.source_map);
    }

    fn finish_entity(&mut self, declaration: EntityDeclaration) {
        if declaration.kind.requires_base() && declaration.base_entity_name.is_none() {
            self.error(
                TOP_LEVEL_ENTITY_BUILDER,
                format!(
                    "{} {} must name the entity it is based on.",
                    declaration.kind.humanized(),
                    declaration.name
                ),
                &declaration.source_map,
            );
        }

        let source = declaration.source_map.clone();
        let kind = declaration.kind;
        let name = declaration.name.clone();
        match self.repository.declare(declaration) {
            Ok(id) => trace!(entity = %name, %id, "entity committed"),
            Err(edm_model::Error::DuplicateEntity { existing, .. }) => {
                let message = format!(
                    "{} named {name} is a duplicate declaration of that name.",
                    kind.humanized()
                );
                if self.reported_originals.insert(existing) {
                    let original_source = self.repository.entity(existing).source_map.clone();
                    self.error(TOP_LEVEL_ENTITY_BUILDER, message.clone(), &original_source);
                }
                self.error(TOP_LEVEL_ENTITY_BUILDER, message, &source);
            }
            Err(error) => self.error(TOP_LEVEL_ENTITY_BUILDER, error.to_string(), &source),
        }
    }

    fn enclosing_entity_kind(&self) -> Option<EntityKind> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Entity(entity) => Some(entity.declaration.kind),
            _ => None,
        })
    }

    fn check_identifier(&mut self, name: &str, what: &str, source: &SourceMap) {
        if !self.naming.is_valid_identifier(name) {
            self.error(
                NAMING_CONVENTION,
                format!("{what} name {name} must begin with an uppercase letter and contain only letters and digits."),
                source,
            );
        }
    }

    fn error(&mut self, validator: &str, message: impl Into<String>, source: &SourceMap) {
        let diagnostic = Diagnostic::error(validator, message, source.clone());
        warn!(validator, message = %diagnostic.message, line = source.line, "build diagnostic");
        self.diagnostics.push(diagnostic);
    }
}

/// Build a repository from a complete event stream.
///
/// # Errors
///
/// Returns an error only when the configuration is invalid; problems in the stream are
/// reported as diagnostics.
pub fn build(events: &[ParseEvent], config: BuilderConfig) -> Result<BuildOutput> {
    let mut builder = Builder::new(config)?;
    builder.apply_all(events);
    Ok(builder.finish())
}
