//! JSON schema of the document accepted on insert
//!
//! The schema mirrors the JSON path mapping: references become objects holding the
//! referenced identity leaves, collections become arrays of single-field objects, commons
//! nest and choices and inline commons merge their members into the enclosing object.

use crate::api_mapping::mapping_of;
use crate::pipeline::EnhancerResult;
use edm_model::{
    ApiShape, CollectedProperty, EntityId, EntityKind, Property, PropertyKind, PropertyModifier,
    Repository,
};
use serde_json::{Map, Value, json};

pub const JSON_SCHEMA_FOR_INSERT: &str = "JsonSchemaForInsertEnhancer";

const SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Schema shared by every descriptor document.
#[must_use]
pub fn descriptor_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "type": "object",
        "title": "EdFi.Descriptor",
        "description": "An Ed-Fi Descriptor",
        "properties": {
            "namespace": { "type": "string", "description": "The descriptor namespace as a URI" },
            "codeValue": { "type": "string", "description": "The descriptor code value" },
            "shortDescription": { "type": "string", "description": "The descriptor short description" },
            "description": { "type": "string", "description": "The descriptor description" },
            "effectiveBeginDate": {
                "type": "string",
                "format": "date",
                "description": "The descriptor effective begin date"
            },
            "effectiveEndDate": {
                "type": "string",
                "format": "date",
                "description": "The descriptor effective end date"
            }
        },
        "additionalProperties": false,
        "required": ["namespace", "codeValue", "shortDescription"]
    })
}

fn object_schema(properties: Map<String, Value>, required: Vec<String>) -> Value {
    let mut object = Map::new();
    object.insert("type".to_string(), json!("object"));
    object.insert("properties".to_string(), Value::Object(properties));
    object.insert("additionalProperties".to_string(), json!(false));
    if !required.is_empty() {
        object.insert("required".to_string(), json!(required));
    }
    Value::Object(object)
}

fn array_schema(items: Value, is_required: bool) -> Value {
    json!({
        "type": "array",
        "items": items,
        "minItems": usize::from(is_required),
        "uniqueItems": false
    })
}

fn is_required(property: &Property, modifier: &PropertyModifier) -> bool {
    (property.is_required || property.is_part_of_identity) && !modifier.optional_due_to_parent
}

/// Schema of a single scalar value.
fn scalar_schema(property: &Property) -> Value {
    let description = property.documentation.as_str();
    match property.kind {
        PropertyKind::Boolean => json!({ "type": "boolean", "description": description }),
        PropertyKind::Currency
        | PropertyKind::Decimal
        | PropertyKind::Duration
        | PropertyKind::Percent
        | PropertyKind::SharedDecimal => json!({ "type": "number", "description": description }),
        PropertyKind::Integer
        | PropertyKind::SharedInteger
        | PropertyKind::Short
        | PropertyKind::SharedShort
        | PropertyKind::Year => json!({ "type": "integer", "description": description }),
        PropertyKind::Date => {
            json!({ "type": "string", "format": "date", "description": description })
        }
        PropertyKind::Datetime => {
            json!({ "type": "string", "format": "date-time", "description": description })
        }
        PropertyKind::Time => {
            json!({ "type": "string", "format": "time", "description": description })
        }
        _ => json!({ "type": "string", "description": description }),
    }
}

struct SchemaBuilder<'a> {
    repository: &'a Repository,
    visiting: Vec<EntityId>,
}

impl SchemaBuilder<'_> {
    fn add_properties(
        &mut self,
        collected: &[CollectedProperty],
        outer: &PropertyModifier,
        properties: &mut Map<String, Value>,
        required: &mut Vec<String>,
    ) {
        for collected_property in collected {
            let property = self.repository.property(collected_property.property);
            let modifier = outer.concat(&collected_property.modifier);
            let mapping = mapping_of(property);

            if matches!(mapping.shape, ApiShape::Choice | ApiShape::InlineCommon) {
                let Some(target) = property.referenced_entity else {
                    continue;
                };
                let parent_prefixes = match property.role_name.as_deref() {
                    Some(role) if role != property.name => vec![role.to_string()],
                    _ => Vec::new(),
                };
                let inner = modifier.concat(&PropertyModifier {
                    optional_due_to_parent: property.kind == PropertyKind::Choice,
                    parent_prefixes,
                });
                self.nested(target, &inner, properties, required);
                continue;
            }

            let Some(schema) = self.property_schema(property, &modifier) else {
                continue;
            };
            let name = modifier.prefixed(&mapping.top_level_name);
            if is_required(property, &modifier) && !required.contains(&name) {
                required.push(name.clone());
            }
            properties.insert(name, schema);
        }
    }

    fn nested(
        &mut self,
        target: EntityId,
        modifier: &PropertyModifier,
        properties: &mut Map<String, Value>,
        required: &mut Vec<String>,
    ) {
        if self.visiting.contains(&target) {
            return;
        }
        let repository = self.repository;
        let Some(collected) = repository.entity(target).data.collected_properties.get() else {
            return;
        };
        self.visiting.push(target);
        self.add_properties(collected, modifier, properties, required);
        self.visiting.pop();
    }

    fn property_schema(&mut self, property: &Property, modifier: &PropertyModifier) -> Option<Value> {
        let mapping = mapping_of(property);
        let required = is_required(property, modifier);
        let schema = match mapping.shape {
            ApiShape::ScalarReference => self.reference_object(property, modifier)?,
            ApiShape::ReferenceCollection => {
                let reference = self.reference_object(property, modifier)?;
                let mut element = Map::new();
                element.insert(mapping.inner_name.clone(), reference);
                array_schema(object_schema(element, vec![mapping.inner_name]), required)
            }
            ApiShape::ScalarCommon => self.common_object(property, modifier)?,
            ApiShape::CommonCollection => {
                array_schema(self.common_object(property, modifier)?, required)
            }
            ApiShape::DescriptorCollection => {
                let mut element = Map::new();
                element.insert(
                    mapping.inner_name.clone(),
                    json!({ "type": "string", "description": "An Ed-Fi Descriptor" }),
                );
                array_schema(object_schema(element, vec![mapping.inner_name]), required)
            }
            ApiShape::ScalarCollection => {
                let mut element = Map::new();
                element.insert(mapping.inner_name.clone(), scalar_schema(property));
                array_schema(object_schema(element, vec![mapping.inner_name]), required)
            }
            ApiShape::Scalar | ApiShape::Descriptor => scalar_schema(property),
            ApiShape::Choice | ApiShape::InlineCommon => return None,
        };
        Some(schema)
    }

    /// An object holding the identity leaves of the referenced entity.
    fn reference_object(&self, property: &Property, modifier: &PropertyModifier) -> Option<Value> {
        let target = property.referenced_entity?;
        let flattened = self
            .repository
            .entity(target)
            .data
            .flattened_identity_properties
            .get()?;

        let mut properties = Map::new();
        let mut required = Vec::new();
        for leaf in flattened {
            let leaf_property = self.repository.property(leaf.identity_property);
            let name = mapping_of(leaf_property).full_name;
            if is_required(leaf_property, modifier) && !required.contains(&name) {
                required.push(name.clone());
            }
            properties.insert(name, scalar_schema(leaf_property));
        }
        Some(object_schema(properties, required))
    }

    fn common_object(&mut self, property: &Property, modifier: &PropertyModifier) -> Option<Value> {
        let target = property.referenced_entity?;
        let inner = PropertyModifier {
            optional_due_to_parent: modifier.optional_due_to_parent,
            parent_prefixes: Vec::new(),
        };
        let mut properties = Map::new();
        let mut required = Vec::new();
        self.nested(target, &inner, &mut properties, &mut required);
        Some(object_schema(properties, required))
    }
}

/// Insert schema of one domain entity or association.
#[must_use]
pub fn insert_schema(repository: &Repository, entity: EntityId) -> Value {
    let entity_ref = repository.entity(entity);
    let mut builder = SchemaBuilder {
        repository,
        visiting: vec![entity],
    };
    let mut properties = Map::new();
    let mut required = Vec::new();
    if let Some(collected) = entity_ref.data.collected_properties.get() {
        builder.add_properties(
            collected,
            &PropertyModifier::default(),
            &mut properties,
            &mut required,
        );
    }
    properties.insert(
        "_ext".to_string(),
        json!({
            "description": "optional extension collection",
            "type": "object",
            "properties": {},
            "additionalProperties": true
        }),
    );

    let mut schema = match object_schema(properties, required) {
        Value::Object(schema) => schema,
        _ => Map::new(),
    };
    schema.insert("$schema".to_string(), json!(SCHEMA_DRAFT));
    schema.insert(
        "title".to_string(),
        json!(format!(
            "{}.{}",
            repository.namespace(entity_ref.namespace).project_name,
            entity_ref.name
        )),
    );
    schema.insert("description".to_string(), json!(entity_ref.documentation));
    Value::Object(schema)
}

/// Build insert schemas for domain entities, associations and descriptors.
pub fn build_insert_schemas(repository: &mut Repository) -> EnhancerResult {
    let schemas: Vec<(EntityId, Value)> = repository
        .entities()
        .filter_map(|entity| {
            if entity.kind == EntityKind::Descriptor {
                Some((entity.id, descriptor_schema()))
            } else if entity.kind.is_top_level_entity() {
                Some((entity.id, insert_schema(repository, entity.id)))
            } else {
                None
            }
        })
        .collect();

    for (entity, schema) in schemas {
        repository
            .entity_mut(entity)
            .data
            .json_schema_for_insert
            .set(schema);
    }
    EnhancerResult::success(JSON_SCHEMA_FOR_INSERT)
}
