//! Array uniqueness constraints
//!
//! Each top-level property that holds arrays yields one constraint listing the JSON paths
//! whose values must not repeat across array elements. A scalar collection is unique on
//! its values, a reference collection on the reference's identity fields, and a common
//! collection on the common's identity. A common collection without identity pushes the
//! arrays it contains down into nested constraints rooted at each of its elements.

use crate::api_mapping::mapping_of;
use crate::pipeline::EnhancerResult;
use edm_model::{
    ApiShape, ArrayUniquenessConstraint, CollectedProperty, EntityId, JsonPath, JsonPathsMapping,
    NestedUniquenessConstraint, PropertyKind, PropertyModifier, Repository,
};
use tracing::debug;

pub const ARRAY_UNIQUENESS_CONSTRAINT: &str = "ArrayUniquenessConstraintEnhancer";

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}

#[derive(Default)]
struct Gathered {
    paths: Vec<JsonPath>,
    nested: Vec<NestedUniquenessConstraint>,
}

impl Gathered {
    fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.nested.is_empty()
    }
}

struct Walker<'a> {
    repository: &'a Repository,
    mapping: &'a JsonPathsMapping,
    visiting: Vec<EntityId>,
}

impl Walker<'_> {
    fn paths_of(&self, key: &str) -> Vec<JsonPath> {
        self.mapping
            .get(key)
            .map(|info| info.json_paths.clone())
            .unwrap_or_default()
    }

    fn gather(
        &mut self,
        collected: &CollectedProperty,
        key_prefix: Option<&str>,
        base: &JsonPath,
        outer: &PropertyModifier,
        into: &mut Gathered,
    ) {
        let repository = self.repository;
        let property = repository.property(collected.property);
        let mapping = mapping_of(property);
        let modifier = outer.concat(&collected.modifier);
        let key = join(key_prefix, &property.full_name());

        match mapping.shape {
            ApiShape::ScalarCollection
            | ApiShape::DescriptorCollection
            | ApiShape::ReferenceCollection => {
                into.paths.extend(self.paths_of(&key));
            }
            ApiShape::CommonCollection => {
                let Some(target) = property.referenced_entity else {
                    return;
                };
                let array = base
                    .field(&modifier.prefixed(&mapping.top_level_name))
                    .array();
                self.common_collection(target, &key, &array, into);
            }
            ApiShape::ScalarCommon => {
                let Some(target) = property.referenced_entity else {
                    return;
                };
                let object = base.field(&modifier.prefixed(&mapping.top_level_name));
                self.container(target, &key, &object, &PropertyModifier::default(), into);
            }
            ApiShape::Choice | ApiShape::InlineCommon => {
                let Some(target) = property.referenced_entity else {
                    return;
                };
                let parent_prefixes = match property.role_name.as_deref() {
                    Some(role) if role != property.name => vec![role.to_string()],
                    _ => Vec::new(),
                };
                let inner = modifier.concat(&PropertyModifier {
                    optional_due_to_parent: property.kind == PropertyKind::Choice,
                    parent_prefixes,
                });
                self.container(target, &key, base, &inner, into);
            }
            ApiShape::Scalar | ApiShape::Descriptor | ApiShape::ScalarReference => {}
        }
    }

    fn container(
        &mut self,
        target: EntityId,
        key: &str,
        base: &JsonPath,
        modifier: &PropertyModifier,
        into: &mut Gathered,
    ) {
        if self.visiting.contains(&target) {
            return;
        }
        let repository = self.repository;
        let Some(collected) = repository.entity(target).data.collected_properties.get() else {
            return;
        };
        self.visiting.push(target);
        for collected_property in collected {
            self.gather(collected_property, Some(key), base, modifier, into);
        }
        self.visiting.pop();
    }

    fn common_collection(
        &mut self,
        target: EntityId,
        key: &str,
        array: &JsonPath,
        into: &mut Gathered,
    ) {
        if self.visiting.contains(&target) {
            return;
        }
        let repository = self.repository;
        let Some(collected) = repository.entity(target).data.collected_properties.get() else {
            return;
        };

        let identity: Vec<JsonPath> = collected
            .iter()
            .map(|collected_property| repository.property(collected_property.property))
            .filter(|property| property.is_part_of_identity)
            .flat_map(|property| self.paths_of(&join(Some(key), &property.full_name())))
            .collect();
        if !identity.is_empty() {
            into.paths.extend(identity);
            return;
        }

        self.visiting.push(target);
        for collected_property in collected {
            let mut element = Gathered::default();
            self.gather(
                collected_property,
                Some(key),
                array,
                &PropertyModifier::default(),
                &mut element,
            );
            if element.paths.is_empty() {
                into.nested.extend(element.nested);
                continue;
            }
            let mut paths: Vec<JsonPath> = element
                .paths
                .iter()
                .filter_map(|path| path.relative_to(array))
                .collect();
            paths.sort();
            paths.dedup();
            into.nested.push(NestedUniquenessConstraint {
                base_path: array.clone(),
                paths,
            });
            into.nested.extend(element.nested);
        }
        self.visiting.pop();
    }
}

/// Array uniqueness constraints of one mapped entity.
#[must_use]
pub fn array_uniqueness_constraints(
    repository: &Repository,
    entity: EntityId,
) -> Vec<ArrayUniquenessConstraint> {
    let data = &repository.entity(entity).data;
    let (Some(collected), Some(mapping)) =
        (data.collected_properties.get(), data.json_paths_mapping.get())
    else {
        return Vec::new();
    };

    let mut walker = Walker {
        repository,
        mapping,
        visiting: vec![entity],
    };
    let mut constraints: Vec<ArrayUniquenessConstraint> = collected
        .iter()
        .filter_map(|collected_property| {
            let mut gathered = Gathered::default();
            walker.gather(
                collected_property,
                None,
                &JsonPath::root(),
                &PropertyModifier::default(),
                &mut gathered,
            );
            if gathered.is_empty() {
                return None;
            }
            gathered.paths.sort();
            gathered.paths.dedup();
            gathered.nested.sort();
            gathered.nested.dedup();
            Some(ArrayUniquenessConstraint {
                paths: gathered.paths,
                nested_constraints: gathered.nested,
            })
        })
        .collect();
    constraints.sort();
    constraints.dedup();
    constraints
}

/// Record uniqueness constraints of every entity with a JSON paths mapping.
pub fn build_array_uniqueness_constraints(repository: &mut Repository) -> EnhancerResult {
    let constraints: Vec<_> = repository
        .entities()
        .filter(|entity| entity.data.json_paths_mapping.is_computed())
        .map(|entity| (entity.id, array_uniqueness_constraints(repository, entity.id)))
        .collect();

    debug!(
        entities = constraints.iter().filter(|(_, found)| !found.is_empty()).count(),
        "built array uniqueness constraints"
    );
    for (entity, found) in constraints {
        repository
            .entity_mut(entity)
            .data
            .array_uniqueness_constraints
            .set(found);
    }
    EnhancerResult::success(ARRAY_UNIQUENESS_CONSTRAINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{enhanced_through, entity_id, strings};
    use edm_builder::EventStreamBuilder;
    use pretty_assertions::assert_eq;

    fn constraints(stream: EventStreamBuilder, entity: &str) -> Vec<ArrayUniquenessConstraint> {
        let (repository, results) = enhanced_through(stream, ARRAY_UNIQUENESS_CONSTRAINT);
        assert!(results.iter().all(|result| result.diagnostics.is_empty()));
        let id = entity_id(&repository, entity);
        repository
            .entity(id)
            .data
            .array_uniqueness_constraints
            .get()
            .cloned()
            .unwrap()
    }

    fn flat(paths: &[&str]) -> ArrayUniquenessConstraint {
        ArrayUniquenessConstraint {
            paths: paths.iter().map(|path| JsonPath::new(*path)).collect(),
            nested_constraints: Vec::new(),
        }
    }

    #[test]
    fn test_scalar_collection_is_unique_on_its_values() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .domain_entity("Assessment")
            .integer_identity("AssessmentIdentifier")
            .string_property("Title", false, true)
            .string_property("Version", false, false)
            .end_entity()
            .end_namespace();
        assert_eq!(
            constraints(stream, "Assessment"),
            vec![flat(&["$.titles[*].title"])]
        );
    }

    #[test]
    fn test_each_top_level_collection_is_its_own_constraint() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .descriptor("GradeLevel")
            .end_entity()
            .descriptor("AcademicSubject")
            .end_entity()
            .domain_entity("Assessment")
            .integer_identity("AssessmentIdentifier")
            .descriptor_property("GradeLevel", false, true)
            .descriptor_property("AcademicSubject", false, true)
            .end_entity()
            .end_namespace();
        assert_eq!(
            constraints(stream, "Assessment"),
            vec![
                flat(&["$.academicSubjects[*].academicSubjectDescriptor"]),
                flat(&["$.gradeLevels[*].gradeLevelDescriptor"]),
            ]
        );
    }

    #[test]
    fn test_reference_collection_is_unique_on_reference_identity() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .domain_entity("ClassPeriod")
            .string_identity("ClassPeriodName")
            .integer_identity("SchoolId")
            .end_entity()
            .domain_entity("Section")
            .string_identity("SectionIdentifier")
            .domain_entity_collection("ClassPeriod", None)
            .end_entity()
            .end_namespace();
        assert_eq!(
            constraints(stream, "Section"),
            vec![flat(&[
                "$.classPeriods[*].classPeriodReference.classPeriodName",
                "$.classPeriods[*].classPeriodReference.schoolId",
            ])]
        );
    }

    #[test]
    fn test_common_collection_is_unique_on_its_identity() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .descriptor("AssessmentIdentificationSystem")
            .end_entity()
            .common("IdentificationCode")
            .descriptor_identity("AssessmentIdentificationSystem")
            .string_property("AssigningOrganizationIdentificationCode", false, false)
            .end_entity()
            .domain_entity("Assessment")
            .integer_identity("AssessmentIdentifier")
            .common_property("IdentificationCode", false, true)
            .end_entity()
            .domain_entity_subclass("ExtendedAssessment", "Assessment")
            .string_property("Sponsor", false, false)
            .end_entity()
            .end_namespace();
        let expected = vec![flat(&[
            "$.identificationCodes[*].assessmentIdentificationSystemDescriptor",
        ])];
        assert_eq!(constraints(stream.clone(), "Assessment"), expected);
        assert_eq!(constraints(stream, "ExtendedAssessment"), expected);
    }

    #[test]
    fn test_common_collection_without_identity_nests_its_arrays() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .descriptor("ContactType")
            .end_entity()
            .common("Period")
            .date_identity("BeginDate")
            .date_property("EndDate", false, false)
            .end_entity()
            .common("Contact")
            .descriptor_identity("ContactType")
            .end_entity()
            .common("Address")
            .string_property("StreetNumberName", true, false)
            .common_property("Period", false, true)
            .common_property("Contact", false, true)
            .end_entity()
            .domain_entity("StudentEducationOrganizationAssociation")
            .integer_identity("StudentId")
            .common_property("Address", false, true)
            .end_entity()
            .end_namespace();
        let found = constraints(stream, "StudentEducationOrganizationAssociation");
        assert_eq!(found.len(), 1);
        assert!(found[0].paths.is_empty());
        let nested: Vec<(String, Vec<String>)> = found[0]
            .nested_constraints
            .iter()
            .map(|nested| (nested.base_path.to_string(), strings(&nested.paths)))
            .collect();
        assert_eq!(
            nested,
            vec![
                (
                    "$.addresses[*]".to_string(),
                    vec!["$.contacts[*].contactTypeDescriptor".to_string()]
                ),
                (
                    "$.addresses[*]".to_string(),
                    vec!["$.periods[*].beginDate".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn test_arrays_inside_a_scalar_common_share_one_constraint() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .descriptor("TravelDayOfWeek")
            .end_entity()
            .descriptor("TravelDirection")
            .end_entity()
            .common("StudentBusDetails")
            .string_property("BusNumber", true, false)
            .descriptor_property("TravelDayOfWeek", true, true)
            .descriptor_property("TravelDirection", false, true)
            .end_entity()
            .domain_entity("StudentTransportation")
            .integer_identity("StudentId")
            .common_property("StudentBusDetails", false, false)
            .end_entity()
            .end_namespace();
        assert_eq!(
            constraints(stream, "StudentTransportation"),
            vec![flat(&[
                "$.studentBusDetails.travelDayOfWeeks[*].travelDayOfWeekDescriptor",
                "$.studentBusDetails.travelDirections[*].travelDirectionDescriptor",
            ])]
        );
    }

    #[test]
    fn test_arrays_inside_a_choice_share_one_constraint() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .descriptor("ContentClass")
            .end_entity()
            .common("LearningResource")
            .descriptor_identity("ContentClass")
            .end_entity()
            .choice("LearningResourceChoice")
            .common_property("LearningResource", false, true)
            .string_property("LearningResourceMetadataURI", false, false)
            .end_entity()
            .domain_entity("LearningObjective")
            .string_identity("Objective")
            .choice_property("LearningResourceChoice", true)
            .end_entity()
            .end_namespace();
        assert_eq!(
            constraints(stream, "LearningObjective"),
            vec![flat(&["$.learningResources[*].contentClassDescriptor"])]
        );
    }

    #[test]
    fn test_entity_without_arrays_has_no_constraints() {
        let stream = EventStreamBuilder::new()
            .begin_namespace("EdFi")
            .domain_entity("Student")
            .string_identity("StudentUniqueId")
            .date_property("BirthDate", true, false)
            .end_entity()
            .end_namespace();
        assert!(constraints(stream, "Student").is_empty());
    }
}
