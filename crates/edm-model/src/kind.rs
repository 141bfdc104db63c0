//! Entity and property kinds

use serde::{Deserialize, Serialize};

/// Kind of a top-level declared construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    DomainEntity,
    DomainEntitySubclass,
    DomainEntityExtension,
    Association,
    AssociationSubclass,
    AssociationExtension,
    Common,
    CommonSubclass,
    CommonExtension,
    InlineCommon,
    Choice,
    Descriptor,
    Enumeration,
    SharedString,
    SharedInteger,
    SharedDecimal,
    SharedShort,
}

impl EntityKind {
    /// Human readable name used in diagnostics, e.g. "Domain Entity Subclass".
    #[must_use]
    pub fn humanized(self) -> &'static str {
        match self {
            Self::DomainEntity => "Domain Entity",
            Self::DomainEntitySubclass => "Domain Entity Subclass",
            Self::DomainEntityExtension => "Domain Entity Extension",
            Self::Association => "Association",
            Self::AssociationSubclass => "Association Subclass",
            Self::AssociationExtension => "Association Extension",
            Self::Common => "Common",
            Self::CommonSubclass => "Common Subclass",
            Self::CommonExtension => "Common Extension",
            Self::InlineCommon => "Inline Common",
            Self::Choice => "Choice",
            Self::Descriptor => "Descriptor",
            Self::Enumeration => "Enumeration",
            Self::SharedString => "Shared String",
            Self::SharedInteger => "Shared Integer",
            Self::SharedDecimal => "Shared Decimal",
            Self::SharedShort => "Shared Short",
        }
    }

    #[must_use]
    pub fn is_subclass(self) -> bool {
        matches!(
            self,
            Self::DomainEntitySubclass | Self::AssociationSubclass | Self::CommonSubclass
        )
    }

    #[must_use]
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Self::DomainEntityExtension | Self::AssociationExtension | Self::CommonExtension
        )
    }

    /// Subclasses and extensions must name a base entity.
    #[must_use]
    pub fn requires_base(self) -> bool {
        self.is_subclass() || self.is_extension()
    }

    /// Kinds a `base_entity` declaration of this kind may resolve to.
    #[must_use]
    pub fn compatible_base_kinds(self) -> &'static [EntityKind] {
        match self {
            Self::DomainEntitySubclass => &[Self::DomainEntity],
            Self::DomainEntityExtension => &[Self::DomainEntity, Self::DomainEntitySubclass],
            Self::AssociationSubclass => &[Self::Association],
            Self::AssociationExtension => &[Self::Association, Self::AssociationSubclass],
            Self::CommonSubclass | Self::CommonExtension => &[Self::Common],
            _ => &[],
        }
    }

    /// Whether declarations of this kind may contain properties.
    #[must_use]
    pub fn has_properties(self) -> bool {
        !matches!(
            self,
            Self::Enumeration
                | Self::SharedString
                | Self::SharedInteger
                | Self::SharedDecimal
                | Self::SharedShort
        )
    }

    /// Whether properties of this kind of entity may be marked as identity.
    #[must_use]
    pub fn allows_identity(self) -> bool {
        self.has_properties() && !self.is_extension() && self != Self::Choice
    }

    /// Kinds that are exposed as API resources.
    #[must_use]
    pub fn is_resource(self) -> bool {
        matches!(
            self,
            Self::DomainEntity
                | Self::DomainEntitySubclass
                | Self::Association
                | Self::AssociationSubclass
                | Self::Descriptor
        )
    }

    /// Kinds that carry identity properties and can be referenced by domain entity or
    /// association properties.
    #[must_use]
    pub fn is_top_level_entity(self) -> bool {
        matches!(
            self,
            Self::DomainEntity
                | Self::DomainEntitySubclass
                | Self::Association
                | Self::AssociationSubclass
        )
    }
}

/// Kind of a property, covering scalars, shared simple types and references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    Boolean,
    Currency,
    Date,
    Datetime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
    SharedDecimal,
    SharedInteger,
    SharedShort,
    SharedString,
    Descriptor,
    Enumeration,
    DomainEntity,
    Association,
    Common,
    InlineCommon,
    Choice,
}

/// JSON value category of a path in the API document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathType {
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "time")]
    Time,
}

impl PropertyKind {
    /// Human readable name used in diagnostics.
    #[must_use]
    pub fn humanized(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Currency => "Currency",
            Self::Date => "Date",
            Self::Datetime => "Datetime",
            Self::Decimal => "Decimal",
            Self::Duration => "Duration",
            Self::Integer => "Integer",
            Self::Percent => "Percent",
            Self::Short => "Short",
            Self::String => "String",
            Self::Time => "Time",
            Self::Year => "Year",
            Self::SharedDecimal => "Shared Decimal",
            Self::SharedInteger => "Shared Integer",
            Self::SharedShort => "Shared Short",
            Self::SharedString => "Shared String",
            Self::Descriptor => "Descriptor",
            Self::Enumeration => "Enumeration",
            Self::DomainEntity => "Domain Entity",
            Self::Association => "Association",
            Self::Common => "Common",
            Self::InlineCommon => "Inline Common",
            Self::Choice => "Choice",
        }
    }

    /// Plain scalars that never reference another declaration.
    #[must_use]
    pub fn is_simple(self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Currency
                | Self::Date
                | Self::Datetime
                | Self::Decimal
                | Self::Duration
                | Self::Integer
                | Self::Percent
                | Self::Short
                | Self::String
                | Self::Time
                | Self::Year
        )
    }

    #[must_use]
    pub fn is_shared(self) -> bool {
        matches!(
            self,
            Self::SharedDecimal | Self::SharedInteger | Self::SharedShort | Self::SharedString
        )
    }

    /// Foreign-key style references to domain entities and associations.
    #[must_use]
    pub fn is_referential(self) -> bool {
        matches!(self, Self::DomainEntity | Self::Association)
    }

    /// Properties whose value ends in a single JSON scalar.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        self.is_simple() || self.is_shared() || matches!(self, Self::Descriptor | Self::Enumeration)
    }

    /// Containers flattened into their parent document.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Common | Self::InlineCommon | Self::Choice)
    }

    /// Entity kinds a property of this kind may resolve to; empty for simple scalars.
    #[must_use]
    pub fn target_kinds(self) -> &'static [EntityKind] {
        match self {
            Self::DomainEntity => &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass],
            Self::Association => &[EntityKind::Association, EntityKind::AssociationSubclass],
            Self::Common => &[EntityKind::Common, EntityKind::CommonSubclass],
            Self::InlineCommon => &[EntityKind::InlineCommon],
            Self::Choice => &[EntityKind::Choice],
            Self::Descriptor => &[EntityKind::Descriptor],
            Self::Enumeration => &[EntityKind::Enumeration],
            Self::SharedString => &[EntityKind::SharedString],
            Self::SharedInteger => &[EntityKind::SharedInteger],
            Self::SharedDecimal => &[EntityKind::SharedDecimal],
            Self::SharedShort => &[EntityKind::SharedShort],
            _ => &[],
        }
    }

    /// Type of the JSON value this property produces.
    #[must_use]
    pub fn path_type(self) -> PathType {
        match self {
            Self::Boolean => PathType::Boolean,
            Self::Currency
            | Self::Decimal
            | Self::Duration
            | Self::Percent
            | Self::SharedDecimal
            | Self::Integer
            | Self::SharedInteger
            | Self::Short
            | Self::SharedShort
            | Self::Year => PathType::Number,
            Self::Date => PathType::Date,
            Self::Datetime => PathType::DateTime,
            Self::Time => PathType::Time,
            _ => PathType::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclass_and_extension_kinds_require_a_base() {
        assert!(EntityKind::DomainEntitySubclass.requires_base());
        assert!(EntityKind::AssociationExtension.requires_base());
        assert!(!EntityKind::Descriptor.requires_base());
        assert_eq!(
            EntityKind::DomainEntityExtension.compatible_base_kinds(),
            &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass]
        );
    }

    #[test]
    fn path_types_follow_property_kinds() {
        assert_eq!(PropertyKind::Boolean.path_type(), PathType::Boolean);
        assert_eq!(PropertyKind::Year.path_type(), PathType::Number);
        assert_eq!(PropertyKind::SharedDecimal.path_type(), PathType::Number);
        assert_eq!(PropertyKind::Datetime.path_type(), PathType::DateTime);
        assert_eq!(PropertyKind::Descriptor.path_type(), PathType::String);
        assert_eq!(PropertyKind::Choice.path_type(), PathType::String);
    }

    #[test]
    fn kinds_serialize_in_camel_case() {
        let json = serde_json::to_string(&EntityKind::DomainEntitySubclass).unwrap();
        assert_eq!(json, "\"domainEntitySubclass\"");
        let json = serde_json::to_string(&PathType::DateTime).unwrap();
        assert_eq!(json, "\"date-time\"");
    }

    #[test]
    fn choice_and_extensions_disallow_identity() {
        assert!(!EntityKind::Choice.allows_identity());
        assert!(!EntityKind::DomainEntityExtension.allows_identity());
        assert!(EntityKind::Common.allows_identity());
    }
}
