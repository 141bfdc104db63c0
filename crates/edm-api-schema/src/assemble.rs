//! Assembling API schemas from an enhanced repository

use crate::schema::{
    AbstractResource, ApiSchema, ProjectSchema, ResourceSchema, SecurityElements, SubclassType,
};
use edm_enhancer::naming::{resource_name, uncapitalize};
use edm_model::{
    Computed, DocumentPaths, Entity, EntityKind, JsonPath, NamespaceId, PathType,
    QueryFieldMapping, Repository,
};
use std::collections::BTreeMap;
use tracing::debug;

fn cloned<T: Clone + Default>(slot: &Computed<T>) -> T {
    slot.get().cloned().unwrap_or_default()
}

/// Every JSON path of the document whose value has type `path_type`, sorted.
fn typed_json_paths(entity: &Entity, path_type: PathType) -> Vec<JsonPath> {
    let Some(mapping) = entity.data.document_paths_mapping.get() else {
        return Vec::new();
    };
    let mut paths: Vec<JsonPath> = mapping
        .values()
        .flat_map(|paths| match paths {
            DocumentPaths::Scalar {
                path,
                path_type: found,
            } if *found == path_type => vec![path.clone()],
            DocumentPaths::Reference {
                reference_json_paths,
                ..
            } => reference_json_paths
                .iter()
                .filter(|pair| pair.path_type == path_type)
                .map(|pair| pair.reference_json_path.clone())
                .collect(),
            _ => Vec::new(),
        })
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

fn resource_schema(entity: &Entity) -> ResourceSchema {
    let data = &entity.data;
    ResourceSchema {
        resource_name: data
            .resource_name
            .get()
            .cloned()
            .unwrap_or_else(|| resource_name(entity)),
        is_descriptor: entity.kind == EntityKind::Descriptor,
        is_resource_extension: false,
        is_subclass: entity.kind.is_subclass(),
        json_schema_for_insert: cloned(&data.json_schema_for_insert),
        identity_json_paths: cloned(&data.identity_json_paths),
        document_paths_mapping: cloned(&data.document_paths_mapping),
        boolean_json_paths: typed_json_paths(entity, PathType::Boolean),
        numeric_json_paths: typed_json_paths(entity, PathType::Number),
        date_time_json_paths: typed_json_paths(entity, PathType::DateTime),
        equality_constraints: cloned(&data.equality_constraints),
        equality_sets: cloned(&data.equality_sets),
        array_uniqueness_constraints: cloned(&data.array_uniqueness_constraints),
        query_field_mapping: cloned(&data.query_field_mapping),
        security_elements: SecurityElements {
            student: cloned(&data.student_securable_elements),
            staff: cloned(&data.staff_securable_elements),
            contact: cloned(&data.contact_securable_elements),
            namespace: cloned(&data.namespace_securable_elements),
            education_organization: cloned(&data.education_organization_securable_elements),
        },
        authorization_pathways: cloned(&data.authorization_pathways),
        identity_fullnames: cloned(&data.identity_full_names),
        subclass_type: None,
        superclass_project_name: None,
        superclass_resource_name: None,
        superclass_identity_json_path: None,
    }
}

/// Resource extensions carry their own document shape but no identity or security.
fn resource_extension_schema(entity: &Entity) -> ResourceSchema {
    ResourceSchema {
        is_resource_extension: true,
        is_subclass: false,
        identity_json_paths: Vec::new(),
        query_field_mapping: QueryFieldMapping::new(),
        security_elements: SecurityElements::default(),
        authorization_pathways: Vec::new(),
        identity_fullnames: Vec::new(),
        ..resource_schema(entity)
    }
}

fn subclass_schema(repository: &Repository, entity: &Entity) -> ResourceSchema {
    let mut schema = resource_schema(entity);
    schema.subclass_type = Some(match entity.kind {
        EntityKind::AssociationSubclass => SubclassType::Association,
        _ => SubclassType::DomainEntity,
    });

    if let Some(base) = entity.base_entity.map(|base| repository.entity(base)) {
        schema.superclass_project_name =
            Some(repository.namespace(base.namespace).project_name.clone());
        schema.superclass_resource_name = Some(
            base.data
                .resource_name
                .get()
                .cloned()
                .unwrap_or_else(|| resource_name(base)),
        );
    }
    if entity.kind == EntityKind::DomainEntitySubclass {
        schema.superclass_identity_json_path = repository
            .properties_of(entity.id)
            .find(|property| property.is_identity_rename)
            .and_then(|property| property.base_key_name.as_deref())
            .map(|base_key| JsonPath::root().field(&uncapitalize(base_key)));
    }
    schema
}

/// The API schema of one namespace.
#[must_use]
pub fn assemble_namespace(repository: &Repository, namespace: NamespaceId) -> ApiSchema {
    let namespace_ref = repository.namespace(namespace);
    let mut resource_schemas = BTreeMap::new();
    let mut resource_name_mapping = BTreeMap::new();
    let mut case_insensitive_endpoint_name_mapping = BTreeMap::new();
    let mut abstract_resources = BTreeMap::new();

    for entity in namespace_ref.entities.iter().map(|id| repository.entity(*id)) {
        if entity.kind == EntityKind::DomainEntity && entity.is_abstract {
            abstract_resources.insert(
                entity.name.clone(),
                AbstractResource {
                    identity_json_paths: cloned(&entity.data.identity_json_paths),
                },
            );
            continue;
        }

        let schema = match entity.kind {
            EntityKind::DomainEntity | EntityKind::Association | EntityKind::Descriptor => {
                resource_schema(entity)
            }
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass => {
                subclass_schema(repository, entity)
            }
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                resource_extension_schema(entity)
            }
            _ => continue,
        };
        let Some(endpoint_name) = entity.data.endpoint_name.get().cloned() else {
            continue;
        };
        if !schema.is_resource_extension {
            resource_name_mapping.insert(schema.resource_name.clone(), endpoint_name.clone());
            case_insensitive_endpoint_name_mapping
                .insert(endpoint_name.to_lowercase(), endpoint_name.clone());
        }
        resource_schemas.insert(endpoint_name, schema);
    }

    debug!(
        namespace = %namespace_ref.name,
        resources = resource_schemas.len(),
        abstract_resources = abstract_resources.len(),
        "assembled api schema"
    );

    ApiSchema {
        project_schema: ProjectSchema {
            project_name: namespace_ref.project_name.clone(),
            project_endpoint_name: namespace_ref.project_endpoint_name(),
            description: format!("{} data model", namespace_ref.project_name),
            is_extension_project: namespace_ref.is_extension,
            resource_schemas,
            resource_name_mapping,
            case_insensitive_endpoint_name_mapping,
            abstract_resources,
            education_organization_types: cloned(
                &namespace_ref.data.education_organization_types,
            ),
            education_organization_hierarchy: cloned(
                &namespace_ref.data.education_organization_hierarchy,
            ),
        },
    }
}

/// One API schema per namespace, in namespace order.
#[must_use]
pub fn assemble(repository: &Repository) -> Vec<ApiSchema> {
    repository
        .namespace_ids()
        .map(|namespace| assemble_namespace(repository, namespace))
        .collect()
}
