//! Property path to JSON path mapping
//!
//! Every property reachable from an entity document is keyed by its dot-separated property
//! path. Reference objects are flat: each identity leaf of the referenced entity becomes a
//! field of the `...Reference` object, whatever the depth at which it sits in the referenced
//! entity's identity. Commons open a nested object; choices and inline commons add no
//! segment and pass their role name down as a prefix.

use crate::api_mapping::mapping_of;
use crate::pipeline::EnhancerResult;
use crate::resolver::is_document_kind;
use edm_model::{
    ApiShape, CollectedProperty, EntityId, EntityKind, JsonPath, JsonPathsInfo, JsonPathsMapping,
    PropertyId, PropertyKind, PropertyModifier, Repository,
};
use std::collections::BTreeMap;
use tracing::debug;

pub const ALL_JSON_PATHS_MAPPING: &str = "AllJsonPathsMappingEnhancer";
pub const IDENTITY_JSON_PATHS: &str = "IdentityJsonPathsEnhancer";

/// Identity JSON paths shared by every descriptor document.
pub const DESCRIPTOR_IDENTITY_JSON_PATHS: [&str; 2] = ["$.codeValue", "$.namespace"];

#[derive(Debug)]
struct Entry {
    terminal_property: PropertyId,
    json_paths: Vec<JsonPath>,
    is_top_level: bool,
}

#[derive(Default)]
struct MappingBuilder {
    entries: BTreeMap<String, Entry>,
    visiting: Vec<EntityId>,
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}

impl MappingBuilder {
    fn add(&mut self, key: String, terminal: PropertyId, path: JsonPath, is_top_level: bool) {
        self.entries
            .entry(key)
            .or_insert_with(|| Entry {
                terminal_property: terminal,
                json_paths: Vec::new(),
                is_top_level,
            })
            .json_paths
            .push(path);
    }

    fn collect(
        &mut self,
        repository: &Repository,
        collected: &[CollectedProperty],
        key_prefix: Option<&str>,
        base: &JsonPath,
        outer: &PropertyModifier,
    ) {
        for collected_property in collected {
            let property = repository.property(collected_property.property);
            let mapping = mapping_of(property);
            let modifier = outer.concat(&collected_property.modifier);
            let key = join(key_prefix, &property.full_name());

            match mapping.shape {
                ApiShape::ScalarReference | ApiShape::ReferenceCollection => {
                    let Some(target) = property.referenced_entity else {
                        continue;
                    };
                    let mut object = base.field(&modifier.prefixed(&mapping.top_level_name));
                    if mapping.shape.is_collection() {
                        object = object.array().field(&mapping.inner_name);
                    }
                    self.reference(repository, &key, property.id, target, &object);
                }
                ApiShape::ScalarCommon | ApiShape::CommonCollection => {
                    let Some(target) = property.referenced_entity else {
                        continue;
                    };
                    let mut object = base.field(&modifier.prefixed(&mapping.top_level_name));
                    if mapping.shape.is_collection() {
                        object = object.array();
                    }
                    self.container(
                        repository,
                        target,
                        &key,
                        &object,
                        &PropertyModifier::default(),
                    );
                }
                ApiShape::Choice | ApiShape::InlineCommon => {
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
                    self.container(repository, target, &key, base, &inner);
                }
                ApiShape::ScalarCollection | ApiShape::DescriptorCollection => {
                    let path = base
                        .field(&modifier.prefixed(&mapping.top_level_name))
                        .array()
                        .field(&mapping.inner_name);
                    self.add(key, property.id, path, true);
                }
                ApiShape::Scalar | ApiShape::Descriptor => {
                    let path = base.field(&modifier.prefixed(&mapping.top_level_name));
                    self.add(key, property.id, path, true);
                }
            }
        }
    }

    fn container(
        &mut self,
        repository: &Repository,
        target: EntityId,
        key: &str,
        base: &JsonPath,
        modifier: &PropertyModifier,
    ) {
        if self.visiting.contains(&target) {
            return;
        }
        let Some(collected) = repository.entity(target).data.collected_properties.get() else {
            return;
        };
        self.visiting.push(target);
        self.collect(repository, collected, Some(key), base, modifier);
        self.visiting.pop();
    }

    /// Add the flattened identity of `target` under a reference object.
    fn reference(
        &mut self,
        repository: &Repository,
        key: &str,
        reference: PropertyId,
        target: EntityId,
        object: &JsonPath,
    ) {
        let Some(flattened) = repository
            .entity(target)
            .data
            .flattened_identity_properties
            .get()
        else {
            return;
        };

        let mut leaf_paths = Vec::with_capacity(flattened.len());
        for leaf in flattened {
            let leaf_property = repository.property(leaf.identity_property);
            let path = object.field(&mapping_of(leaf_property).full_name);
            for (property_path, chain_property) in
                leaf.property_paths.iter().zip(&leaf.property_chain)
            {
                self.add(
                    format!("{key}.{property_path}"),
                    *chain_property,
                    path.clone(),
                    false,
                );
            }
            leaf_paths.push(path);
        }

        for path in leaf_paths {
            self.add(key.to_string(), reference, path, true);
        }
    }

    fn finish(self) -> JsonPathsMapping {
        self.entries
            .into_iter()
            .map(|(key, mut entry)| {
                entry.json_paths.sort();
                entry.json_paths.dedup();
                (
                    key,
                    JsonPathsInfo {
                        terminal_property: entry.terminal_property,
                        json_paths: entry.json_paths,
                        is_top_level: entry.is_top_level,
                    },
                )
            })
            .collect()
    }
}

/// Property path to JSON path mapping of one document entity.
#[must_use]
pub fn json_paths_mapping(repository: &Repository, entity: EntityId) -> JsonPathsMapping {
    let mut builder = MappingBuilder::default();
    if let Some(collected) = repository.entity(entity).data.collected_properties.get() {
        builder.visiting.push(entity);
        builder.collect(
            repository,
            collected,
            None,
            &JsonPath::root(),
            &PropertyModifier::default(),
        );
    }
    builder.finish()
}

/// Map every document entity. Descriptors get an empty mapping.
pub fn build_json_paths_mappings(repository: &mut Repository) -> EnhancerResult {
    let mappings: Vec<(EntityId, JsonPathsMapping)> = repository
        .entities()
        .filter_map(|entity| {
            if entity.kind == EntityKind::Descriptor {
                Some((entity.id, JsonPathsMapping::new()))
            } else if is_document_kind(entity.kind) {
                Some((entity.id, json_paths_mapping(repository, entity.id)))
            } else {
                None
            }
        })
        .collect();

    debug!(entities = mappings.len(), "mapped json paths");
    for (entity, mapping) in mappings {
        repository
            .entity_mut(entity)
            .data
            .json_paths_mapping
            .set(mapping);
    }
    EnhancerResult::success(ALL_JSON_PATHS_MAPPING)
}

/// JSON paths of the leaves of an entity's flattened identity.
#[must_use]
pub fn identity_json_paths(repository: &Repository, entity: EntityId) -> Vec<JsonPath> {
    let data = &repository.entity(entity).data;
    if repository.entity(entity).kind == EntityKind::Descriptor {
        return DESCRIPTOR_IDENTITY_JSON_PATHS.map(JsonPath::new).to_vec();
    }
    let (Some(flattened), Some(mapping)) = (
        data.flattened_identity_properties.get(),
        data.json_paths_mapping.get(),
    ) else {
        return Vec::new();
    };

    let mut paths: Vec<JsonPath> = flattened
        .iter()
        .filter_map(|leaf| mapping.get(leaf.leaf_path()?))
        .flat_map(|info| info.json_paths.iter().cloned())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

/// Record identity JSON paths of every resource and descriptor.
pub fn build_identity_json_paths(repository: &mut Repository) -> EnhancerResult {
    let identities: Vec<(EntityId, Vec<JsonPath>)> = repository
        .entities()
        .filter(|entity| {
            entity.kind.is_top_level_entity() || entity.kind == EntityKind::Descriptor
        })
        .map(|entity| (entity.id, identity_json_paths(repository, entity.id)))
        .collect();

    for (entity, paths) in identities {
        repository
            .entity_mut(entity)
            .data
            .identity_json_paths
            .set(paths);
    }
    EnhancerResult::success(IDENTITY_JSON_PATHS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{enhanced_through, entity_id, strings};
    use edm_builder::EventStreamBuilder;
    use pretty_assertions::assert_eq;

    fn paths(repository: &Repository, entity: &str, key: &str) -> Vec<String> {
        let entity = entity_id(repository, entity);
        let mapping = repository
            .entity(entity)
            .data
            .json_paths_mapping
            .get()
            .unwrap();
        let info = mapping
            .get(key)
            .unwrap_or_else(|| panic!("no mapping for {key}: {:?}", mapping.keys()));
        strings(&info.json_paths)
    }

    fn section_model() -> EventStreamBuilder {
        EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .domain_entity("School")
            .integer_identity("SchoolId")
            .end_entity()
            .domain_entity("Session")
            .domain_entity_identity("School", None)
            .string_identity("SessionName")
            .end_entity()
            .domain_entity("CourseOffering")
            .string_identity("LocalCourseCode")
            .domain_entity_identity("Session", None)
            .end_entity()
            .descriptor("GradeLevel")
            .end_entity()
            .common("Address")
            .string_property("City", true, false)
            .descriptor_property("GradeLevel", false, false)
            .end_entity()
            .inline_common("Title")
            .string_property("Title", true, false)
            .end_entity()
            .choice("ContentChoice")
            .string_property("ContentIdentifier", false, false)
            .end_entity()
            .domain_entity("Section")
            .string_identity("SectionIdentifier")
            .domain_entity_identity("CourseOffering", None)
            .domain_entity_collection("School", Some("Partner"))
            .common_property("Address", false, true)
            .inline_common_property("Title", Some("Section"))
            .choice_property("ContentChoice", false)
            .descriptor_property("GradeLevel", false, true)
            .end_entity()
            .end_namespace()
    }

    #[test]
    fn test_reference_objects_are_flat() {
        let (repository, results) = enhanced_through(section_model(), IDENTITY_JSON_PATHS);
        assert!(results.iter().all(|result| result.diagnostics.is_empty()));

        assert_eq!(
            paths(&repository, "Section", "CourseOffering"),
            vec![
                "$.courseOfferingReference.localCourseCode",
                "$.courseOfferingReference.schoolId",
                "$.courseOfferingReference.sessionName",
            ]
        );
        assert_eq!(
            paths(&repository, "Section", "CourseOffering.Session.School.SchoolId"),
            vec!["$.courseOfferingReference.schoolId"]
        );
        assert_eq!(
            paths(&repository, "Section", "CourseOffering.Session"),
            vec![
                "$.courseOfferingReference.schoolId",
                "$.courseOfferingReference.sessionName",
            ]
        );
    }

    #[test]
    fn test_collections_commons_and_containers() {
        let (repository, _) = enhanced_through(section_model(), ALL_JSON_PATHS_MAPPING);
        assert_eq!(
            paths(&repository, "Section", "PartnerSchool"),
            vec!["$.partnerSchools[*].partnerSchoolReference.schoolId"]
        );
        assert_eq!(
            paths(&repository, "Section", "Address.City"),
            vec!["$.addresses[*].city"]
        );
        assert_eq!(
            paths(&repository, "Section", "Address.GradeLevel"),
            vec!["$.addresses[*].gradeLevelDescriptor"]
        );
        assert_eq!(
            paths(&repository, "Section", "SectionTitle.Title"),
            vec!["$.sectionTitle"]
        );
        assert_eq!(
            paths(&repository, "Section", "ContentChoice.ContentIdentifier"),
            vec!["$.contentIdentifier"]
        );
        assert_eq!(
            paths(&repository, "Section", "GradeLevel"),
            vec!["$.gradeLevels[*].gradeLevelDescriptor"]
        );
    }

    #[test]
    fn test_top_level_flag_marks_reference_internals() {
        let (repository, _) = enhanced_through(section_model(), ALL_JSON_PATHS_MAPPING);
        let section = entity_id(&repository, "Section");
        let mapping = repository.entity(section).data.json_paths_mapping.get().unwrap();
        assert!(mapping["CourseOffering"].is_top_level);
        assert!(!mapping["CourseOffering.LocalCourseCode"].is_top_level);
        assert!(mapping["Address.City"].is_top_level);
    }

    #[test]
    fn test_identity_json_paths() {
        let (repository, _) = enhanced_through(section_model(), IDENTITY_JSON_PATHS);
        let section = entity_id(&repository, "Section");
        assert_eq!(
            strings(repository.entity(section).data.identity_json_paths.get().unwrap()),
            vec![
                "$.courseOfferingReference.localCourseCode",
                "$.courseOfferingReference.schoolId",
                "$.courseOfferingReference.sessionName",
                "$.sectionIdentifier",
            ]
        );
        let descriptor = entity_id(&repository, "GradeLevel");
        assert_eq!(
            strings(repository.entity(descriptor).data.identity_json_paths.get().unwrap()),
            vec!["$.codeValue", "$.namespace"]
        );
    }
}
