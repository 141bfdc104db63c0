//! Stable integer handles into the repository arenas

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position of the handle in its arena.
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Handle of a namespace in the repository.
    NamespaceId,
    "namespace"
);
arena_id!(
    /// Handle of a top-level entity in the repository.
    EntityId,
    "entity"
);
arena_id!(
    /// Handle of a property in the repository.
    PropertyId,
    "property"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_arena_prefix() {
        assert_eq!(EntityId::new(3).to_string(), "entity#3");
        assert_eq!(PropertyId::new(0).to_string(), "property#0");
        assert_eq!(NamespaceId::new(1).index(), 1);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&EntityId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
