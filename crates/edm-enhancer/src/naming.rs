//! API naming helpers

use edm_model::{Entity, EntityKind};

/// Lowercase the first character: `StudentUniqueId` becomes `studentUniqueId`.
#[must_use]
pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural of a camel-cased name, as used for collection and endpoint names.
#[must_use]
pub fn plural(name: &str) -> String {
    if name.ends_with('s') && !name.ends_with("ss") {
        return name.to_string();
    }
    if let Some(stem) = name.strip_suffix('y') {
        let after_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if !after_vowel {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "ch", "sh"].iter().any(|suffix| name.ends_with(suffix)) {
        return format!("{name}es");
    }
    format!("{name}s")
}

/// Resource name of an entity. Descriptors carry the `Descriptor` suffix.
#[must_use]
pub fn resource_name(entity: &Entity) -> String {
    if entity.kind == EntityKind::Descriptor && !entity.name.ends_with("Descriptor") {
        format!("{}Descriptor", entity.name)
    } else {
        entity.name.clone()
    }
}

/// Endpoint name of a resource: `StudentSchoolAssociation` becomes `studentSchoolAssociations`.
#[must_use]
pub fn endpoint_name(resource_name: &str) -> String {
    plural(&uncapitalize(resource_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncapitalize() {
        assert_eq!(uncapitalize("StudentUniqueId"), "studentUniqueId");
        assert_eq!(uncapitalize("x"), "x");
        assert_eq!(uncapitalize(""), "");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural("school"), "schools");
        assert_eq!(plural("category"), "categories");
        assert_eq!(plural("survey"), "surveys");
        assert_eq!(plural("address"), "addresses");
        assert_eq!(plural("box"), "boxes");
        assert_eq!(plural("approach"), "approaches");
        assert_eq!(plural("programs"), "programs");
    }

    #[test]
    fn test_endpoint_name() {
        assert_eq!(endpoint_name("StudentSchoolAssociation"), "studentSchoolAssociations");
        assert_eq!(endpoint_name("GradeLevelDescriptor"), "gradeLevelDescriptors");
    }
}
