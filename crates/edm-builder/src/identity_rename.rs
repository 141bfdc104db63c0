//! Checks on `renames identity property` declarations
//!
//! A subclass may rename an identity property of its base entity. The renamed property must
//! exist in the base identity, and a subclass may rename at most one property.

use edm_model::{Diagnostic, Entity, EntityId, Repository};

pub const IDENTITY_RENAME: &str = "IdentityRenameMustMatchBaseIdentity";

/// Report identity renames that do not match the base entity's identity.
///
/// Renames on subclasses whose base cannot be found are left to the reference resolver.
#[must_use]
pub fn check_identity_renames(repository: &Repository) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for entity in repository.entities() {
        let renames: Vec<_> = repository
            .properties_of(entity.id)
            .filter(|property| property.is_identity_rename)
            .collect();
        if renames.is_empty() {
            continue;
        }

        if renames.len() > 1 {
            for property in &renames[1..] {
                diagnostics.push(Diagnostic::error(
                    IDENTITY_RENAME,
                    format!(
                        "{} {} renames more than one identity property. Only one rename is allowed.",
                        entity.kind.humanized(),
                        entity.name
                    ),
                    property.source_map.clone(),
                ));
            }
        }

        let Some(base) = find_base(repository, entity) else {
            continue;
        };
        for property in renames {
            let Some(base_key) = property.base_key_name.as_deref() else {
                continue;
            };
            let matches_base_identity = repository
                .entity(base)
                .identity_properties
                .iter()
                .any(|id| repository.property(*id).full_name() == base_key);
            if !matches_base_identity {
                diagnostics.push(Diagnostic::error(
                    IDENTITY_RENAME,
                    format!(
                        "Property {} tries to rename {base_key} which is not part of the identity of {}.",
                        property.full_name(),
                        repository.entity(base).name
                    ),
                    property.source_map.clone(),
                ));
            }
        }
    }

    diagnostics
}

fn find_base(repository: &Repository, entity: &Entity) -> Option<EntityId> {
    let base_name = entity.base_entity_name.as_deref()?;
    let namespace = match entity.base_entity_namespace.as_deref() {
        Some(name) => repository.namespace_named(name)?,
        None => entity.namespace,
    };
    repository.find_entity(namespace, entity.kind.compatible_base_kinds(), base_name)
}
