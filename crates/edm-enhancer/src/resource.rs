//! Resource and endpoint names

use crate::naming::{endpoint_name, resource_name};
use crate::pipeline::EnhancerResult;
use edm_model::{EntityKind, Repository};

pub const RESOURCE_NAME: &str = "ResourceNameEnhancer";

/// Name every resource and resource extension.
pub fn name_resources(repository: &mut Repository) -> EnhancerResult {
    let names: Vec<_> = repository
        .entities()
        .filter(|entity| {
            entity.kind.is_resource()
                || matches!(
                    entity.kind,
                    EntityKind::DomainEntityExtension | EntityKind::AssociationExtension
                )
        })
        .map(|entity| {
            let resource = resource_name(entity);
            let endpoint = endpoint_name(&resource);
            (entity.id, resource, endpoint)
        })
        .collect();

    for (entity, resource, endpoint) in names {
        let data = &mut repository.entity_mut(entity).data;
        data.resource_name.set(resource);
        data.endpoint_name.set(endpoint);
    }
    EnhancerResult::success(RESOURCE_NAME)
}
