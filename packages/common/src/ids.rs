//! Identifier newtypes.
//!
//! Structural ids and expanded ids share a string representation but never a
//! type. A structural node that lives inside a component template is named
//! `componentId::templateLocalId`; an expanded node that was materialized
//! inside one or more instances is named by the chain of enclosing instance
//! ids joined with `/`, followed by its local id.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between a component id and a template-local id.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Separator between instance ids in an expanded id chain.
pub const EXPANDED_ID_SEPARATOR: &str = "/";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Structural id of a node stored in the document. The only kind of id
    /// a patch may target.
    NodeId
);

string_id!(
    /// Id of a frame (a named canvas placement).
    FrameId
);

string_id!(
    /// Id of a reusable component definition.
    ComponentId
);

string_id!(
    /// Instance-path-qualified id of a node in an expanded scene.
    ExpandedId
);

impl NodeId {
    /// Builds the namespaced id of a template node: `componentId::localId`.
    pub fn namespaced(component: &ComponentId, local_id: &str) -> Self {
        Self(format!("{}{}{}", component, NAMESPACE_SEPARATOR, local_id))
    }

    /// Splits a namespaced template id into `(componentId, localId)`.
    pub fn split_namespace(&self) -> Option<(&str, &str)> {
        self.0.split_once(NAMESPACE_SEPARATOR)
    }
}

impl ExpandedId {
    /// Joins an instance chain and a local id into an expanded id.
    ///
    /// An empty chain yields the local id unchanged, so nodes placed directly
    /// in a frame keep their structural id as their expanded id.
    pub fn from_chain(chain: &[NodeId], local_id: &str) -> Self {
        if chain.is_empty() {
            return Self(local_id.to_string());
        }

        let mut id = String::new();
        for instance in chain {
            id.push_str(instance.as_str());
            id.push_str(EXPANDED_ID_SEPARATOR);
        }
        id.push_str(local_id);
        Self(id)
    }

    /// Expanded id of a node that was not reached through any instance.
    pub fn from_structural(id: &NodeId) -> Self {
        Self(id.as_str().to_string())
    }
}
