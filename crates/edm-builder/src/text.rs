//! Fluent construction of event streams
//!
//! [`EventStreamBuilder`] writes the events a parser would emit for a model, assigning each
//! event its own source line. It is used by tests throughout the workspace and by tooling
//! that generates event files.

use crate::events::{Event, ParseEvent};
use edm_model::{EntityKind, PropertyKind, SourceMap};

/// Builder for parse-event streams with automatic source positions.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct EventStreamBuilder {
    events: Vec<ParseEvent>,
    line: usize,
}

impl EventStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw event on the next line.
    pub fn push(mut self, event: Event) -> Self {
        self.line += 1;
        let token = token_text(&event);
        self.events
            .push(ParseEvent::new(event, SourceMap::new(self.line, 0, token)));
        self
    }

    /// The finished stream.
    #[must_use]
    pub fn build(self) -> Vec<ParseEvent> {
        self.events
    }

    /// The stream serialized as an event file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    // Namespaces

    pub fn begin_namespace(self, name: &str) -> Self {
        self.push(Event::BeginNamespace {
            name: name.to_string(),
            project_extension: None,
            dependencies: None,
        })
    }

    /// An extension namespace depending on the core namespace.
    pub fn begin_extension_namespace(self, name: &str, project_extension: &str) -> Self {
        self.push(Event::BeginNamespace {
            name: name.to_string(),
            project_extension: Some(project_extension.to_string()),
            dependencies: None,
        })
    }

    pub fn begin_namespace_with_dependencies(
        self,
        name: &str,
        project_extension: Option<&str>,
        dependencies: &[&str],
    ) -> Self {
        self.push(Event::BeginNamespace {
            name: name.to_string(),
            project_extension: project_extension.map(str::to_string),
            dependencies: Some(dependencies.iter().map(|d| (*d).to_string()).collect()),
        })
    }

    pub fn end_namespace(self) -> Self {
        self.push(Event::EndNamespace)
    }

    // Entities

    pub fn begin_entity(self, kind: EntityKind, name: &str) -> Self {
        self.push(Event::BeginEntity {
            kind,
            name: name.to_string(),
            is_abstract: false,
        })
    }

    pub fn end_entity(self) -> Self {
        self.push(Event::EndEntity)
    }

    pub fn base_entity(self, name: &str) -> Self {
        self.push(Event::BaseEntity {
            name: name.to_string(),
        })
    }

    pub fn documentation(self, text: &str) -> Self {
        self.push(Event::Documentation {
            text: text.to_string(),
        })
    }

    pub fn inherited_documentation(self) -> Self {
        self.push(Event::InheritedDocumentation)
    }

    pub fn domain_entity(self, name: &str) -> Self {
        self.begin_entity(EntityKind::DomainEntity, name)
    }

    pub fn abstract_entity(self, name: &str) -> Self {
        self.push(Event::BeginEntity {
            kind: EntityKind::DomainEntity,
            name: name.to_string(),
            is_abstract: true,
        })
    }

    pub fn domain_entity_subclass(self, name: &str, base: &str) -> Self {
        self.begin_entity(EntityKind::DomainEntitySubclass, name)
            .base_entity(base)
    }

    /// Extensions are named after the entity they extend.
    pub fn domain_entity_extension(self, base: &str) -> Self {
        let (_, name) = crate::events::split_qualified_name(base);
        self.begin_entity(EntityKind::DomainEntityExtension, name)
            .base_entity(base)
    }

    pub fn association(self, name: &str) -> Self {
        self.begin_entity(EntityKind::Association, name)
    }

    pub fn association_subclass(self, name: &str, base: &str) -> Self {
        self.begin_entity(EntityKind::AssociationSubclass, name)
            .base_entity(base)
    }

    pub fn association_extension(self, base: &str) -> Self {
        let (_, name) = crate::events::split_qualified_name(base);
        self.begin_entity(EntityKind::AssociationExtension, name)
            .base_entity(base)
    }

    pub fn common(self, name: &str) -> Self {
        self.begin_entity(EntityKind::Common, name)
    }

    pub fn inline_common(self, name: &str) -> Self {
        self.begin_entity(EntityKind::InlineCommon, name)
    }

    pub fn choice(self, name: &str) -> Self {
        self.begin_entity(EntityKind::Choice, name)
    }

    pub fn descriptor(self, name: &str) -> Self {
        self.begin_entity(EntityKind::Descriptor, name)
    }

    pub fn enumeration(self, name: &str) -> Self {
        self.begin_entity(EntityKind::Enumeration, name)
    }

    pub fn shared_string(self, name: &str) -> Self {
        self.begin_entity(EntityKind::SharedString, name)
    }

    pub fn shared_integer(self, name: &str) -> Self {
        self.begin_entity(EntityKind::SharedInteger, name)
    }

    // Property tokens

    pub fn begin_property(self, kind: PropertyKind, name: &str) -> Self {
        self.push(Event::BeginProperty {
            kind,
            name: name.to_string(),
            shared_type: None,
        })
    }

    pub fn end_property(self) -> Self {
        self.push(Event::EndProperty)
    }

    pub fn role_name(self, name: &str) -> Self {
        self.push(Event::RoleName {
            name: name.to_string(),
        })
    }

    pub fn shorten_to(self, name: &str) -> Self {
        self.push(Event::ShortenTo {
            name: name.to_string(),
        })
    }

    pub fn identity(self) -> Self {
        self.push(Event::Identity)
    }

    pub fn required(self) -> Self {
        self.push(Event::Required)
    }

    pub fn optional(self) -> Self {
        self.push(Event::Optional)
    }

    pub fn required_collection(self) -> Self {
        self.push(Event::RequiredCollection)
    }

    pub fn optional_collection(self) -> Self {
        self.push(Event::OptionalCollection)
    }

    pub fn weak_reference(self) -> Self {
        self.push(Event::WeakReference)
    }

    fn cardinality(self, is_required: bool, is_collection: bool) -> Self {
        match (is_required, is_collection) {
            (true, false) => self.required(),
            (false, false) => self.optional(),
            (true, true) => self.required_collection(),
            (false, true) => self.optional_collection(),
        }
    }

    fn with_role(self, role_name: Option<&str>) -> Self {
        match role_name {
            Some(role) => self.role_name(role),
            None => self,
        }
    }

    // Whole properties

    /// A complete identity property of any kind.
    pub fn identity_property(self, kind: PropertyKind, name: &str, role_name: Option<&str>) -> Self {
        self.begin_property(kind, name)
            .with_role(role_name)
            .identity()
            .end_property()
    }

    /// A complete non-identity property of any kind.
    pub fn property(
        self,
        kind: PropertyKind,
        name: &str,
        is_required: bool,
        is_collection: bool,
        role_name: Option<&str>,
    ) -> Self {
        self.begin_property(kind, name)
            .with_role(role_name)
            .cardinality(is_required, is_collection)
            .end_property()
    }

    pub fn integer_identity(self, name: &str) -> Self {
        self.identity_property(PropertyKind::Integer, name, None)
    }

    pub fn string_identity(self, name: &str) -> Self {
        self.identity_property(PropertyKind::String, name, None)
    }

    pub fn date_identity(self, name: &str) -> Self {
        self.identity_property(PropertyKind::Date, name, None)
    }

    pub fn integer_property(self, name: &str, is_required: bool, is_collection: bool) -> Self {
        self.property(PropertyKind::Integer, name, is_required, is_collection, None)
    }

    pub fn string_property(self, name: &str, is_required: bool, is_collection: bool) -> Self {
        self.property(PropertyKind::String, name, is_required, is_collection, None)
    }

    pub fn date_property(self, name: &str, is_required: bool, is_collection: bool) -> Self {
        self.property(PropertyKind::Date, name, is_required, is_collection, None)
    }

    pub fn boolean_property(self, name: &str, is_required: bool) -> Self {
        self.property(PropertyKind::Boolean, name, is_required, false, None)
    }

    pub fn decimal_property(self, name: &str, is_required: bool) -> Self {
        self.property(PropertyKind::Decimal, name, is_required, false, None)
    }

    /// An integer identity property renaming `base_key_name` of the superclass.
    pub fn integer_identity_rename(self, name: &str, base_key_name: &str) -> Self {
        self.begin_property(PropertyKind::Integer, name)
            .push(Event::IdentityRename {
                base_key_name: base_key_name.to_string(),
            })
            .end_property()
    }

    pub fn domain_entity_identity(self, name: &str, role_name: Option<&str>) -> Self {
        self.identity_property(PropertyKind::DomainEntity, name, role_name)
    }

    pub fn domain_entity_property(
        self,
        name: &str,
        is_required: bool,
        role_name: Option<&str>,
    ) -> Self {
        self.property(PropertyKind::DomainEntity, name, is_required, false, role_name)
    }

    pub fn domain_entity_collection(self, name: &str, role_name: Option<&str>) -> Self {
        self.property(PropertyKind::DomainEntity, name, false, true, role_name)
    }

    pub fn association_identity(self, name: &str, role_name: Option<&str>) -> Self {
        self.identity_property(PropertyKind::Association, name, role_name)
    }

    pub fn association_property(self, name: &str, is_required: bool, role_name: Option<&str>) -> Self {
        self.property(PropertyKind::Association, name, is_required, false, role_name)
    }

    pub fn descriptor_identity(self, name: &str) -> Self {
        self.identity_property(PropertyKind::Descriptor, name, None)
    }

    pub fn descriptor_property(self, name: &str, is_required: bool, is_collection: bool) -> Self {
        self.property(PropertyKind::Descriptor, name, is_required, is_collection, None)
    }

    pub fn enumeration_property(self, name: &str, is_required: bool) -> Self {
        self.property(PropertyKind::Enumeration, name, is_required, false, None)
    }

    pub fn common_property(self, name: &str, is_required: bool, is_collection: bool) -> Self {
        self.property(PropertyKind::Common, name, is_required, is_collection, None)
    }

    pub fn inline_common_property(self, name: &str, role_name: Option<&str>) -> Self {
        self.property(PropertyKind::InlineCommon, name, false, false, role_name)
    }

    pub fn inline_common_identity(self, name: &str) -> Self {
        self.identity_property(PropertyKind::InlineCommon, name, None)
    }

    pub fn choice_property(self, name: &str, is_required: bool) -> Self {
        self.property(PropertyKind::Choice, name, is_required, false, None)
    }

    fn begin_shared_string(
        self,
        name: &str,
        shared_type: Option<&str>,
        role_name: Option<&str>,
    ) -> Self {
        self.push(Event::BeginProperty {
            kind: PropertyKind::SharedString,
            name: name.to_string(),
            shared_type: shared_type.map(str::to_string),
        })
        .with_role(role_name)
    }

    /// A shared string identity property named `name`, typed `shared_type` or its own name.
    pub fn shared_string_identity(self, name: &str, shared_type: Option<&str>) -> Self {
        self.begin_shared_string(name, shared_type, None)
            .identity()
            .end_property()
    }

    pub fn shared_string_property(
        self,
        name: &str,
        shared_type: Option<&str>,
        is_required: bool,
        role_name: Option<&str>,
    ) -> Self {
        self.begin_shared_string(name, shared_type, role_name)
            .cardinality(is_required, false)
            .end_property()
    }

    /// Attach a merge directive to the most recently completed property.
    pub fn with_merge_directive(mut self, source_path: &str, target_path: &str) -> Self {
        let directive = [
            Event::BeginMergeDirective,
            Event::SourcePropertyPath {
                path: source_path.to_string(),
            },
            Event::TargetPropertyPath {
                path: target_path.to_string(),
            },
            Event::EndMergeDirective,
        ];
        let at = self
            .events
            .iter()
            .rposition(|event| event.event == Event::EndProperty)
            .unwrap_or(self.events.len());
        for (offset, event) in directive.into_iter().enumerate() {
            self.line += 1;
            let token = token_text(&event);
            self.events.insert(
                at + offset,
                ParseEvent::new(event, SourceMap::new(self.line, 4, token)),
            );
        }
        self
    }
}

fn token_text(event: &Event) -> String {
    match event {
        Event::BeginNamespace { name, .. }
        | Event::BeginEntity { name, .. }
        | Event::BaseEntity { name }
        | Event::BeginProperty { name, .. }
        | Event::RoleName { name }
        | Event::ShortenTo { name } => name.clone(),
        Event::IdentityRename { base_key_name } => base_key_name.clone(),
        Event::SourcePropertyPath { path } | Event::TargetPropertyPath { path } => path.clone(),
        other => other.keyword().to_string(),
    }
}
