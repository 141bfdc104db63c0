//! Parse-event vocabulary consumed by the builder
//!
//! A parser emits one event per construct boundary or annotation token, in source order.
//! Events serialize as flat objects tagged by `event`, e.g.
//! `{"event": "begin_entity", "kind": "domainEntity", "name": "Student"}`.

use edm_model::{EntityKind, PropertyKind, SourceMap};
use serde::{Deserialize, Serialize};

/// One construct-boundary or token notification with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseEvent {
    #[serde(flatten)]
    pub event: Event,

    #[serde(default, skip_serializing_if = "source_is_unknown")]
    pub source: SourceMap,
}

fn source_is_unknown(source: &SourceMap) -> bool {
    !source.is_known()
}

/// The event vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    BeginNamespace {
        name: String,
        #[serde(default)]
        project_extension: Option<String>,
        /// Absent means "the default": the core namespace for extensions
        #[serde(default)]
        dependencies: Option<Vec<String>>,
    },
    EndNamespace,
    BeginEntity {
        kind: EntityKind,
        name: String,
        #[serde(default)]
        is_abstract: bool,
    },
    EndEntity,
    /// Superclass or extendee, optionally `Namespace.Name`
    BaseEntity {
        name: String,
    },
    Documentation {
        text: String,
    },
    InheritedDocumentation,
    BeginProperty {
        kind: PropertyKind,
        /// Referenced name for references, optionally `Namespace.Name`
        name: String,
        /// Shared simple type, when the property is named differently from it
        #[serde(default)]
        shared_type: Option<String>,
    },
    EndProperty,
    RoleName {
        name: String,
    },
    ShortenTo {
        name: String,
    },
    Identity,
    IdentityRename {
        base_key_name: String,
    },
    Required,
    Optional,
    RequiredCollection,
    OptionalCollection,
    WeakReference,
    BeginMergeDirective,
    SourcePropertyPath {
        path: String,
    },
    TargetPropertyPath {
        path: String,
    },
    EndMergeDirective,
}

impl ParseEvent {
    #[must_use]
    pub fn new(event: Event, source: SourceMap) -> Self {
        Self { event, source }
    }
}

impl From<Event> for ParseEvent {
    fn from(event: Event) -> Self {
        Self::new(event, SourceMap::default())
    }
}

impl Event {
    /// Keyword used in diagnostics about a misplaced token.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::BeginNamespace { .. } => "Begin Namespace",
            Self::EndNamespace => "End Namespace",
            Self::BeginEntity { .. } => "Begin entity",
            Self::EndEntity => "End entity",
            Self::BaseEntity { .. } => "based on",
            Self::Documentation { .. } => "documentation",
            Self::InheritedDocumentation => "inherited",
            Self::BeginProperty { .. } => "property",
            Self::EndProperty => "end of property",
            Self::RoleName { .. } => "role name",
            Self::ShortenTo { .. } => "shorten to",
            Self::Identity => "is part of identity",
            Self::IdentityRename { .. } => "renames identity property",
            Self::Required => "is required",
            Self::Optional => "is optional",
            Self::RequiredCollection => "is required collection",
            Self::OptionalCollection => "is optional collection",
            Self::WeakReference => "is weak",
            Self::BeginMergeDirective => "merge",
            Self::SourcePropertyPath { .. } => "merge source",
            Self::TargetPropertyPath { .. } => "merge target",
            Self::EndMergeDirective => "end of merge",
        }
    }
}

/// Split `Namespace.Name` into its parts; unqualified names have no namespace.
#[must_use]
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((namespace, local)) => (Some(namespace), local),
        None => (None, name),
    }
}
