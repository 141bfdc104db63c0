//! Authorization pathways of associations

use crate::pipeline::EnhancerResult;
use edm_model::{EntityId, EntityKind, Repository};

pub const AUTHORIZATION_PATHWAY: &str = "AuthorizationPathwayEnhancer";

/// Recognized pairs of associated entities and the pathways they enable.
const PATHWAYS: [(&str, &str, &str); 2] = [
    ("Student", "School", "StudentSchoolAssociationAuthorization"),
    ("Student", "Contact", "ContactStudentSchoolAuthorization"),
];

/// Pathway names for one association, empty when its identity relates no known pair.
#[must_use]
pub fn authorization_pathways(repository: &Repository, association: EntityId) -> Vec<String> {
    let mut related: Vec<&str> = repository
        .properties_of(association)
        .filter(|property| {
            property.kind.is_referential()
                && property.is_part_of_identity
                && !property.has_role_name()
        })
        .filter_map(|property| property.referenced_entity)
        .map(|target| repository.entity(target).name.as_str())
        .collect();
    related.sort_unstable();
    related.dedup();

    PATHWAYS
        .iter()
        .filter(|(first, second, _)| {
            let mut pair = [*first, *second];
            pair.sort_unstable();
            related == pair
        })
        .map(|(_, _, pathway)| (*pathway).to_string())
        .collect()
}

/// Tag every association with its authorization pathways.
pub fn build_authorization_pathways(repository: &mut Repository) -> EnhancerResult {
    let pathways: Vec<(EntityId, Vec<String>)> = repository
        .entities()
        .filter(|entity| entity.kind == EntityKind::Association)
        .map(|entity| (entity.id, authorization_pathways(repository, entity.id)))
        .collect();

    for (entity, names) in pathways {
        repository
            .entity_mut(entity)
            .data
            .authorization_pathways
            .set(names);
    }
    EnhancerResult::success(AUTHORIZATION_PATHWAY)
}
