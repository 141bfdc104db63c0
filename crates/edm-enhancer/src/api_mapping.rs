//! API naming of properties

use crate::naming::{plural, uncapitalize};
use crate::pipeline::EnhancerResult;
use edm_model::{ApiPropertyMapping, ApiShape, Property, PropertyKind, Repository};

pub const API_PROPERTY_MAPPING: &str = "ApiPropertyMappingEnhancer";

/// Compute the document shape and JSON names of a property.
#[must_use]
pub fn property_mapping(property: &Property) -> ApiPropertyMapping {
    let qualified = match property.data.collision_qualifier.get() {
        Some(qualifier) => format!("{qualifier}{}", property.full_name()),
        None => property.full_name(),
    };
    let name = uncapitalize(&qualified);
    let collection = property.is_collection;

    let (shape, full_name, top_level_name, inner_name) = match property.kind {
        PropertyKind::Descriptor => {
            let descriptor = format!("{name}Descriptor");
            if collection {
                (ApiShape::DescriptorCollection, descriptor.clone(), plural(&name), descriptor)
            } else {
                (ApiShape::Descriptor, descriptor.clone(), descriptor.clone(), descriptor)
            }
        }
        PropertyKind::DomainEntity | PropertyKind::Association => {
            let reference = format!("{name}Reference");
            if collection {
                (ApiShape::ReferenceCollection, name.clone(), plural(&name), reference)
            } else {
                (ApiShape::ScalarReference, name.clone(), reference.clone(), reference)
            }
        }
        PropertyKind::Common if collection => {
            (ApiShape::CommonCollection, name.clone(), plural(&name), name)
        }
        PropertyKind::Common => (ApiShape::ScalarCommon, name.clone(), name.clone(), name),
        PropertyKind::Choice => (ApiShape::Choice, name.clone(), name.clone(), name),
        PropertyKind::InlineCommon => (ApiShape::InlineCommon, name.clone(), name.clone(), name),
        _ if collection => (ApiShape::ScalarCollection, name.clone(), plural(&name), name),
        _ => (ApiShape::Scalar, name.clone(), name.clone(), name),
    };

    ApiPropertyMapping {
        shape,
        full_name,
        top_level_name,
        inner_name,
    }
}

/// Attach an API mapping to every property.
pub fn map_properties(repository: &mut Repository) -> EnhancerResult {
    let mappings: Vec<_> = repository
        .property_ids()
        .map(|id| (id, property_mapping(repository.property(id))))
        .collect();
    for (id, mapping) in mappings {
        repository.property_mut(id).data.api_mapping.set(mapping);
    }
    EnhancerResult::success(API_PROPERTY_MAPPING)
}

/// API mapping of a property, computing it on the fly before the stage has run.
pub(crate) fn mapping_of(property: &Property) -> ApiPropertyMapping {
    property
        .data
        .api_mapping
        .get()
        .cloned()
        .unwrap_or_else(|| property_mapping(property))
}
